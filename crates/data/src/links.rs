use roster_core::DocumentHandle;
use serde::Deserialize;

/// How new links name their target, as in the vault's "New link format".
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum NewLinkFormat {
    #[default]
    Shortest,
    Relative,
    Absolute,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct LinkSettings {
    pub use_markdown_links: bool,
    pub new_link_format: NewLinkFormat,
}

/// Build the link text for `file` as seen from `source_path`.
///
/// `unique_basename` tells whether no other note shares the file's
/// basename, which lets the shortest format drop the folder.
pub fn generate_link(
    settings: LinkSettings,
    file: &DocumentHandle,
    source_path: &str,
    subpath: Option<&str>,
    alias: Option<&str>,
    unique_basename: bool,
) -> String {
    let subpath = subpath.unwrap_or("");
    let target = match settings.new_link_format {
        NewLinkFormat::Absolute => file.path.clone(),
        NewLinkFormat::Relative => relative_path(source_path, &file.path),
        NewLinkFormat::Shortest if unique_basename => match file.path.rsplit_once('/') {
            Some((_, name)) => name.to_string(),
            None => file.path.clone(),
        },
        NewLinkFormat::Shortest => file.path.clone(),
    };

    if settings.use_markdown_links {
        let label = alias.unwrap_or(&file.basename);
        return format!("[{label}]({}{})", encode_url(&target), encode_url(subpath));
    }

    let linktext = if file.is_markdown() {
        target
            .strip_suffix(&format!(".{}", file.extension))
            .map(str::to_string)
            .unwrap_or(target)
    } else {
        target
    };
    match alias {
        Some(alias) => format!("[[{linktext}{subpath}|{alias}]]"),
        None => format!("[[{linktext}{subpath}]]"),
    }
}

/// Path of `to` relative to the folder containing `from`.
pub fn relative_path(from: &str, to: &str) -> String {
    let from_dir: Vec<&str> = match from.rsplit_once('/') {
        Some((dir, _)) => dir.split('/').collect(),
        None => Vec::new(),
    };
    let to_parts: Vec<&str> = to.split('/').collect();
    let (to_dir, name) = to_parts.split_at(to_parts.len() - 1);
    let common = from_dir
        .iter()
        .zip(to_dir.iter())
        .take_while(|(a, b)| a == b)
        .count();
    let mut parts: Vec<&str> = vec![".."; from_dir.len() - common];
    parts.extend_from_slice(&to_dir[common..]);
    parts.extend_from_slice(name);
    parts.join("/")
}

fn encode_url(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    for ch in text.chars() {
        match ch {
            ' ' => out.push_str("%20"),
            '<' => out.push_str("%3C"),
            '>' => out.push_str("%3E"),
            '^' => out.push_str("%5E"),
            '|' => out.push_str("%7C"),
            other => out.push(other),
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ann() -> DocumentHandle {
        DocumentHandle::from_path("People/Ann Lee.md", 0)
    }

    fn wiki(format: NewLinkFormat) -> LinkSettings {
        LinkSettings {
            use_markdown_links: false,
            new_link_format: format,
        }
    }

    #[test]
    fn shortest_wiki_link_uses_basename_when_unique() {
        let settings = wiki(NewLinkFormat::Shortest);
        assert_eq!(
            generate_link(settings, &ann(), "Games/Catan.md", None, None, true),
            "[[Ann Lee]]"
        );
        assert_eq!(
            generate_link(settings, &ann(), "Games/Catan.md", None, None, false),
            "[[People/Ann Lee]]"
        );
    }

    #[test]
    fn alias_becomes_the_display_text() {
        assert_eq!(
            generate_link(
                wiki(NewLinkFormat::Absolute),
                &ann(),
                "Games/Catan.md",
                None,
                Some("Annie"),
                true
            ),
            "[[People/Ann Lee|Annie]]"
        );
    }

    #[test]
    fn relative_links_walk_up_from_the_source_folder() {
        assert_eq!(
            generate_link(
                wiki(NewLinkFormat::Relative),
                &ann(),
                "Games/2024/Catan.md",
                None,
                None,
                true
            ),
            "[[../../People/Ann Lee]]"
        );
        assert_eq!(relative_path("People/Bob.md", "People/Ann.md"), "Ann.md");
        assert_eq!(relative_path("Index.md", "People/Ann.md"), "People/Ann.md");
    }

    #[test]
    fn markdown_links_keep_extension_and_encode_spaces() {
        let settings = LinkSettings {
            use_markdown_links: true,
            new_link_format: NewLinkFormat::Absolute,
        };
        assert_eq!(
            generate_link(settings, &ann(), "Games/Catan.md", None, None, true),
            "[Ann Lee](People/Ann%20Lee.md)"
        );
        assert_eq!(
            generate_link(settings, &ann(), "Games/Catan.md", Some("#Bio"), Some("Annie"), true),
            "[Annie](People/Ann%20Lee.md#Bio)"
        );
    }
}
