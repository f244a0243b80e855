//! Vault host: a folder of Markdown notes providing front-matter storage,
//! the link index, link formatting and fuzzy matching.

pub mod frontmatter;
pub mod fuzzy;
pub mod links;
pub mod settings;
pub mod vault;

pub use frontmatter::{join_document, split_document, update_frontmatter, Document};
pub use fuzzy::SkimFuzzy;
pub use links::{generate_link, relative_path, LinkSettings, NewLinkFormat};
pub use settings::{resolve_vault_root, Settings, APP_CONFIG_FILE, SETTINGS_FILE, VAULT_ENV};
pub use vault::Vault;

use std::path::Path;

/// Load the vault's settings and index its notes.
pub fn open_vault(root: &Path) -> anyhow::Result<Vault> {
    let settings = Settings::load(root)?;
    Vault::open(root, settings)
}
