//! `roster`: edit the players list kept in a note's front-matter.

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use log::LevelFilter;
use roster_core::{parse_players, MetadataStore, PersonSuggest, Player};
use roster_cui::LaunchOptions;
use roster_data::{open_vault, resolve_vault_root, SkimFuzzy, Vault};
use std::fs::OpenOptions;
use std::path::PathBuf;

const LOG_ENV: &str = "ROSTER_LOG";
const LOG_FILE: &str = "roster.log";

#[derive(Parser)]
#[command(name = "roster", about = "Players front-matter editor for Markdown vaults")]
struct Cli {
    /// Vault root (defaults to $ROSTER_VAULT, then the current directory)
    #[arg(short = 'v', long = "vault", global = true)]
    vault: Option<PathBuf>,

    #[command(subcommand)]
    command: Cmd,
}

#[derive(Subcommand)]
enum Cmd {
    /// Browse the vault and edit players interactively
    Tui {
        /// Document to open first
        file: Option<String>,
    },
    /// Show the players form for FILE and print the saved list as JSON
    /// (`null` when closed without saving). The note is not written.
    Prompt { file: String },
    /// Print the players stored in FILE as JSON
    Show { file: String },
    /// Rank people matching QUERY and print their links
    Suggest {
        /// Note the links are inserted into
        #[arg(short = 's', long = "source")]
        source: Option<String>,
        query: String,
    },
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    init_logging(matches!(cli.command, Cmd::Tui { .. } | Cmd::Prompt { .. }));
    match cli.command {
        Cmd::Tui { file } => roster_cui::run(LaunchOptions {
            vault: cli.vault,
            file,
        }),
        Cmd::Prompt { file } => {
            let players = roster_cui::prompt_players(LaunchOptions {
                vault: cli.vault,
                file: Some(file),
            })?;
            print_json(&players)
        }
        Cmd::Show { file } => {
            let vault = load_vault(cli.vault)?;
            let players = stored_players(&vault, &file)?;
            print_json(&players)
        }
        Cmd::Suggest { source, query } => {
            let vault = load_vault(cli.vault)?;
            suggest(&vault, source.as_deref().unwrap_or(""), &query);
            Ok(())
        }
    }
}

/// Terminal modes log to a file so the alternate screen stays clean.
fn init_logging(terminal_ui: bool) {
    let default = if terminal_ui { "info" } else { "warn" };
    let env = env_logger::Env::new().filter_or(LOG_ENV, default);
    let mut builder = env_logger::Builder::from_env(env);
    if terminal_ui {
        let path = std::env::temp_dir().join(LOG_FILE);
        match OpenOptions::new().create(true).append(true).open(&path) {
            Ok(file) => {
                builder.target(env_logger::Target::Pipe(Box::new(file)));
            }
            Err(_) => {
                builder.filter_level(LevelFilter::Off);
            }
        }
    }
    builder.init();
}

fn load_vault(explicit: Option<PathBuf>) -> Result<Vault> {
    let root = resolve_vault_root(explicit.as_deref())?;
    open_vault(&root).with_context(|| format!("open vault {}", root.display()))
}

fn stored_players(vault: &Vault, file: &str) -> Result<Vec<Player>> {
    let handle = vault
        .lookup(file)
        .with_context(|| format!("{file} is not a file in the vault"))?;
    let frontmatter = vault
        .frontmatter(&handle)
        .with_context(|| format!("read front-matter of {}", handle.path))?
        .unwrap_or_default();
    Ok(frontmatter
        .get(vault.settings().property_key.as_str())
        .map(parse_players)
        .unwrap_or_default())
}

fn suggest(vault: &Vault, source: &str, query: &str) {
    let provider = PersonSuggest::new(vault.settings().people_prefix.clone(), source);
    let fuzzy = SkimFuzzy::new();
    for suggestion in provider.get_suggestions(vault, &fuzzy, query) {
        println!(
            "{}\t{}",
            provider.link_for(&suggestion, vault),
            suggestion.path()
        );
    }
}

fn print_json<T: serde::Serialize>(value: &T) -> Result<()> {
    let text = serde_json::to_string_pretty(value).context("encode json")?;
    println!("{text}");
    Ok(())
}
