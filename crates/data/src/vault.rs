use crate::frontmatter::{split_document, update_frontmatter};
use crate::links::generate_link;
use crate::settings::Settings;
use anyhow::Context;
use log::{debug, warn};
use regex::Regex;
use roster_core::{
    DocumentHandle, HostError, LinkCandidate, LinkFormatter, LinkIndex, MetadataStore,
};
use serde_yaml::{Mapping, Value};
use std::collections::HashSet;
use std::fs;
use std::path::{Component, Path, PathBuf};
use std::sync::OnceLock;
use std::time::UNIX_EPOCH;

const ALIASES_KEY: &str = "aliases";

#[derive(Debug, Clone)]
struct Note {
    handle: DocumentHandle,
    aliases: Vec<String>,
    /// Wiki link targets found in the body, without subpath or label.
    links: Vec<String>,
}

/// A folder of Markdown notes acting as the editor host.
pub struct Vault {
    root: PathBuf,
    settings: Settings,
    notes: Vec<Note>,
}

impl Vault {
    pub fn open(root: impl Into<PathBuf>, settings: Settings) -> anyhow::Result<Self> {
        let root = root.into();
        anyhow::ensure!(root.is_dir(), "vault {} is not a directory", root.display());
        let mut vault = Self {
            root,
            settings,
            notes: Vec::new(),
        };
        vault.refresh()?;
        Ok(vault)
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    pub fn settings(&self) -> &Settings {
        &self.settings
    }

    /// Rescan every note under the root.
    pub fn refresh(&mut self) -> anyhow::Result<()> {
        let mut paths = Vec::new();
        collect_markdown(&self.root, Path::new(""), &mut paths)
            .with_context(|| format!("scan vault {}", self.root.display()))?;
        self.notes = paths
            .into_iter()
            .filter_map(|rel| match self.load_note(&rel) {
                Ok(note) => Some(note),
                Err(err) => {
                    warn!("skipping {rel}: {err}");
                    None
                }
            })
            .collect();
        debug!("indexed {} notes in {}", self.notes.len(), self.root.display());
        Ok(())
    }

    pub fn documents(&self) -> impl Iterator<Item = &DocumentHandle> {
        self.notes.iter().map(|note| &note.handle)
    }

    /// Handle for a vault-relative or absolute path, `None` if no such file
    /// exists inside the vault.
    pub fn lookup(&self, path: &str) -> Option<DocumentHandle> {
        let rel = self.relative_path(Path::new(path))?;
        let full = self.root.join(&rel);
        if !full.is_file() {
            return None;
        }
        Some(DocumentHandle::from_path(rel, modified_millis(&full)))
    }

    fn relative_path(&self, path: &Path) -> Option<String> {
        let rel = if path.is_absolute() {
            let root = self.root.canonicalize().ok()?;
            let full = path.canonicalize().ok()?;
            full.strip_prefix(&root).ok()?.to_path_buf()
        } else {
            path.to_path_buf()
        };
        let mut parts = Vec::new();
        for component in rel.components() {
            match component {
                Component::Normal(part) => parts.push(part.to_string_lossy().into_owned()),
                Component::CurDir => {}
                _ => return None,
            }
        }
        (!parts.is_empty()).then(|| parts.join("/"))
    }

    fn load_note(&self, rel: &str) -> Result<Note, HostError> {
        let full = self.root.join(rel);
        let text = fs::read_to_string(&full)?;
        let document = split_document(&text)?;
        let aliases = document
            .frontmatter
            .as_ref()
            .map(aliases_of)
            .unwrap_or_default();
        Ok(Note {
            handle: DocumentHandle::from_path(rel, modified_millis(&full)),
            aliases,
            links: wiki_links(&document.body),
        })
    }

    fn reload_note(&mut self, rel: &str) {
        match self.load_note(rel) {
            Ok(note) => match self.notes.iter_mut().find(|n| n.handle.path == rel) {
                Some(slot) => *slot = note,
                None => self.notes.push(note),
            },
            Err(err) => warn!("reindexing {rel} failed: {err}"),
        }
    }

    fn resolve(&self, linktext: &str) -> Option<&Note> {
        let target = linktext.trim().trim_start_matches('/');
        if target.is_empty() {
            return None;
        }
        let with_ext = format!("{target}.md");
        let suffix = format!("/{with_ext}");
        self.notes
            .iter()
            .find(|note| note.handle.path == target || note.handle.path == with_ext)
            .or_else(|| {
                self.notes
                    .iter()
                    .find(|note| note.handle.path.ends_with(&suffix))
            })
    }

    fn full_path(&self, file: &DocumentHandle) -> Result<PathBuf, HostError> {
        let full = self.root.join(&file.path);
        if !full.is_file() {
            return Err(HostError::NotFound(file.path.clone()));
        }
        Ok(full)
    }
}

impl MetadataStore for Vault {
    fn frontmatter(&self, file: &DocumentHandle) -> Result<Option<Mapping>, HostError> {
        if !file.is_markdown() {
            return Err(HostError::NotMarkdown(file.path.clone()));
        }
        let text = fs::read_to_string(self.full_path(file)?)?;
        Ok(split_document(&text)?.frontmatter)
    }

    fn process_frontmatter(
        &mut self,
        file: &DocumentHandle,
        update: &mut dyn FnMut(&mut Mapping),
    ) -> Result<(), HostError> {
        if !file.is_markdown() {
            return Err(HostError::NotMarkdown(file.path.clone()));
        }
        let full = self.full_path(file)?;
        let text = fs::read_to_string(&full)?;
        let updated = update_frontmatter(&text, update)?;
        fs::write(&full, updated)?;
        self.reload_note(&file.path);
        Ok(())
    }
}

impl LinkIndex for Vault {
    fn link_suggestions(&self) -> Vec<LinkCandidate> {
        let mut out = Vec::new();
        for note in &self.notes {
            out.push(LinkCandidate {
                path: note.handle.path.clone(),
                file: Some(note.handle.clone()),
                alias: None,
            });
            for alias in &note.aliases {
                out.push(LinkCandidate {
                    path: note.handle.path.clone(),
                    file: Some(note.handle.clone()),
                    alias: Some(alias.clone()),
                });
            }
        }
        let mut seen = HashSet::new();
        for note in &self.notes {
            for link in &note.links {
                if self.resolve(link).is_none() && seen.insert(link.as_str()) {
                    out.push(LinkCandidate {
                        path: link.clone(),
                        file: None,
                        alias: None,
                    });
                }
            }
        }
        out
    }
}

impl LinkFormatter for Vault {
    fn generate_markdown_link(
        &self,
        file: &DocumentHandle,
        source_path: &str,
        subpath: Option<&str>,
        alias: Option<&str>,
    ) -> String {
        let unique = self
            .notes
            .iter()
            .filter(|note| note.handle.basename == file.basename)
            .count()
            <= 1;
        generate_link(
            self.settings.links,
            file,
            source_path,
            subpath,
            alias,
            unique,
        )
    }
}

fn collect_markdown(base: &Path, rel: &Path, out: &mut Vec<String>) -> std::io::Result<()> {
    let mut entries: Vec<_> = fs::read_dir(base.join(rel))?
        .filter_map(Result::ok)
        .collect();
    entries.sort_by_key(|entry| entry.file_name());
    for entry in entries {
        let file_name = entry.file_name();
        if file_name.to_string_lossy().starts_with('.') {
            continue;
        }
        let rel_path = rel.join(&file_name);
        let entry_path = entry.path();
        if entry_path.is_dir() {
            collect_markdown(base, &rel_path, out)?;
        } else if entry_path
            .extension()
            .is_some_and(|ext| ext.eq_ignore_ascii_case("md"))
        {
            out.push(rel_path.to_string_lossy().replace('\\', "/"));
        }
    }
    Ok(())
}

fn modified_millis(path: &Path) -> i64 {
    fs::metadata(path)
        .and_then(|meta| meta.modified())
        .ok()
        .and_then(|time| time.duration_since(UNIX_EPOCH).ok())
        .map(|elapsed| elapsed.as_millis() as i64)
        .unwrap_or(0)
}

fn aliases_of(frontmatter: &Mapping) -> Vec<String> {
    match frontmatter.get(ALIASES_KEY) {
        Some(Value::String(alias)) => vec![alias.clone()],
        Some(Value::Sequence(items)) => items
            .iter()
            .filter_map(|item| item.as_str().map(str::to_string))
            .filter(|alias| !alias.trim().is_empty())
            .collect(),
        _ => Vec::new(),
    }
}

fn wiki_link_regex() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| {
        Regex::new(r"\[\[([^\[\]|#^]+)(?:[#^][^\[\]|]*)?(?:\|[^\[\]]*)?\]\]")
            .expect("wiki link pattern")
    })
}

fn wiki_links(body: &str) -> Vec<String> {
    wiki_link_regex()
        .captures_iter(body)
        .filter_map(|caps| caps.get(1))
        .map(|target| target.as_str().trim().to_string())
        .filter(|target| !target.is_empty())
        .collect()
}
