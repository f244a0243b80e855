use roster_core::HostError;
use serde_yaml::{Mapping, Value};

/// A Markdown note split into its front-matter block and the rest.
#[derive(Debug, Clone, PartialEq)]
pub struct Document {
    pub frontmatter: Option<Mapping>,
    pub body: String,
}

struct Block<'a> {
    yaml: &'a str,
    body_start: usize,
}

fn locate_block(text: &str) -> Option<Block<'_>> {
    let mut lines = text.split_inclusive('\n');
    let first = lines.next()?;
    if first.trim_end() != "---" {
        return None;
    }
    let yaml_start = first.len();
    let mut offset = yaml_start;
    for line in lines {
        let trimmed = line.trim_end();
        if trimmed == "---" || trimmed == "..." {
            return Some(Block {
                yaml: &text[yaml_start..offset],
                body_start: offset + line.len(),
            });
        }
        offset += line.len();
    }
    None
}

/// An unterminated block is treated as body text. A block that is not a
/// mapping is an error so the note is never rewritten from a bad parse.
pub fn split_document(text: &str) -> Result<Document, HostError> {
    let Some(block) = locate_block(text) else {
        return Ok(Document {
            frontmatter: None,
            body: text.to_string(),
        });
    };
    let value: Value = if block.yaml.trim().is_empty() {
        Value::Null
    } else {
        serde_yaml::from_str(block.yaml)?
    };
    let frontmatter = match value {
        Value::Null => Mapping::new(),
        Value::Mapping(map) => map,
        _ => {
            return Err(HostError::FrontMatter(
                "front-matter is not a mapping".to_string(),
            ))
        }
    };
    Ok(Document {
        frontmatter: Some(frontmatter),
        body: text[block.body_start..].to_string(),
    })
}

pub fn join_document(document: &Document) -> Result<String, HostError> {
    let mut out = String::new();
    if let Some(frontmatter) = &document.frontmatter {
        out.push_str("---\n");
        if !frontmatter.is_empty() {
            out.push_str(&serde_yaml::to_string(frontmatter)?);
        }
        out.push_str("---\n");
    }
    out.push_str(&document.body);
    Ok(out)
}

/// Apply `update` to the note's front-matter, creating the block when the
/// note has none, and return the new note text.
pub fn update_frontmatter(
    text: &str,
    update: &mut dyn FnMut(&mut Mapping),
) -> Result<String, HostError> {
    let mut document = split_document(text)?;
    update(document.frontmatter.get_or_insert_with(Mapping::new));
    join_document(&document)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn splits_block_and_body() {
        let doc = split_document("---\ntitle: Catan\n---\n# Notes\n").expect("split");
        let fm = doc.frontmatter.expect("frontmatter");
        assert_eq!(fm.get("title"), Some(&Value::String("Catan".into())));
        assert_eq!(doc.body, "# Notes\n");
    }

    #[test]
    fn text_without_block_is_all_body() {
        let doc = split_document("# Notes\n---\n").expect("split");
        assert_eq!(doc.frontmatter, None);
        assert_eq!(doc.body, "# Notes\n---\n");
    }

    #[test]
    fn unterminated_block_is_body() {
        let doc = split_document("---\ntitle: x\n").expect("split");
        assert_eq!(doc.frontmatter, None);
    }

    #[test]
    fn dots_close_the_block() {
        let doc = split_document("---\na: 1\n...\nbody").expect("split");
        assert!(doc.frontmatter.is_some());
        assert_eq!(doc.body, "body");
    }

    #[test]
    fn empty_block_is_an_empty_mapping() {
        let doc = split_document("---\n---\nbody").expect("split");
        assert_eq!(doc.frontmatter, Some(Mapping::new()));
    }

    #[test]
    fn scalar_block_is_rejected() {
        assert!(split_document("---\njust text\n---\n").is_err());
    }

    #[test]
    fn update_adds_a_block_when_missing() {
        let out = update_frontmatter("body\n", &mut |fm: &mut Mapping| {
            fm.insert("players".into(), Value::Sequence(Vec::new()));
        })
        .expect("update");
        assert_eq!(out, "---\nplayers: []\n---\nbody\n");
    }

    #[test]
    fn update_keeps_other_keys_and_body() {
        let src = "---\nplayed: friday night\nplayers: old\ntags:\n- boardgame\n---\nText\n";
        let out = update_frontmatter(src, &mut |fm: &mut Mapping| {
            fm.insert("players".into(), Value::String("new".into()));
        })
        .expect("update");
        assert_eq!(
            out,
            "---\nplayed: friday night\nplayers: new\ntags:\n- boardgame\n---\nText\n"
        );
    }
}
