//! Capabilities the editor host provides. The vault host in `roster-data`
//! implements them over plain files; tests use in-memory fakes.

use crate::error::HostError;
use serde_yaml::Mapping;

/// A document known to the host, addressed by its vault-relative path.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct DocumentHandle {
    pub path: String,
    pub basename: String,
    pub extension: String,
    /// Folder path of the parent, `None` for documents at the vault root.
    pub parent: Option<String>,
    /// Last modification time in milliseconds since the Unix epoch.
    pub mtime: i64,
}

impl DocumentHandle {
    pub fn from_path(path: impl Into<String>, mtime: i64) -> Self {
        let path = path.into();
        let (parent, name) = match path.rsplit_once('/') {
            Some((parent, name)) => (Some(parent.to_string()), name.to_string()),
            None => (None, path.clone()),
        };
        let (basename, extension) = match name.rsplit_once('.') {
            Some((stem, ext)) if !stem.is_empty() => (stem.to_string(), ext.to_string()),
            _ => (name, String::new()),
        };
        Self {
            path,
            basename,
            extension,
            parent,
            mtime,
        }
    }

    pub fn is_markdown(&self) -> bool {
        self.extension.eq_ignore_ascii_case("md")
    }

    /// Parent folder rendered the way suggestion notes show it: `"People/"`,
    /// or `"/"` at the root.
    pub fn folder_display(&self) -> String {
        match &self.parent {
            Some(parent) => format!("{parent}/"),
            None => "/".to_string(),
        }
    }
}

/// One entry of the host's link index.
#[derive(Debug, Clone, PartialEq)]
pub struct LinkCandidate {
    pub path: String,
    pub file: Option<DocumentHandle>,
    pub alias: Option<String>,
}

/// Half-open range of char positions inside the matched text.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MatchSpan {
    pub start: usize,
    pub end: usize,
}

#[derive(Debug, Clone, PartialEq)]
pub struct FuzzyMatch {
    pub score: i64,
    pub matches: Vec<MatchSpan>,
}

pub type PreparedSearch<'a> = Box<dyn Fn(&str) -> Option<FuzzyMatch> + 'a>;

pub trait FuzzyMatcher {
    /// Prepare a query once and return a matcher applied to each candidate.
    fn prepare<'a>(&'a self, query: &str) -> PreparedSearch<'a>;
}

pub trait LinkIndex {
    fn link_suggestions(&self) -> Vec<LinkCandidate>;
}

pub trait LinkFormatter {
    fn generate_markdown_link(
        &self,
        file: &DocumentHandle,
        source_path: &str,
        subpath: Option<&str>,
        alias: Option<&str>,
    ) -> String;
}

pub trait MetadataStore {
    /// Current front-matter of the document, `None` when it has none.
    fn frontmatter(&self, file: &DocumentHandle) -> Result<Option<Mapping>, HostError>;

    /// Read-modify-write of the front-matter block. Keys the callback does
    /// not touch are kept.
    fn process_frontmatter(
        &mut self,
        file: &DocumentHandle,
        update: &mut dyn FnMut(&mut Mapping),
    ) -> Result<(), HostError>;
}

pub trait Workspace {
    fn active_document(&self) -> Option<DocumentHandle>;
}

/// The text input an autocomplete popup is attached to.
pub trait SuggestInput {
    fn set_value(&mut self, value: String);
    /// Notify listeners that the value changed.
    fn trigger_input(&mut self);
    fn close_suggestions(&mut self);
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn handle_splits_path_parts() {
        let handle = DocumentHandle::from_path("People/Ann Lee.md", 5);
        assert_eq!(handle.basename, "Ann Lee");
        assert_eq!(handle.extension, "md");
        assert_eq!(handle.parent.as_deref(), Some("People"));
        assert_eq!(handle.folder_display(), "People/");
        assert!(handle.is_markdown());
    }

    #[test]
    fn handle_at_root_has_no_parent() {
        let handle = DocumentHandle::from_path("Game night.md", 0);
        assert_eq!(handle.parent, None);
        assert_eq!(handle.folder_display(), "/");
    }

    #[test]
    fn dotfile_keeps_its_name_as_basename() {
        let handle = DocumentHandle::from_path("notes/.hidden", 0);
        assert_eq!(handle.basename, ".hidden");
        assert_eq!(handle.extension, "");
        assert!(!handle.is_markdown());
    }
}
