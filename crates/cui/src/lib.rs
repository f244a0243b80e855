mod actions;
mod app;
mod form;
mod input;
mod view;

use anyhow::{Context, Result};
use app::App;
use crossterm::event::{
    self, DisableMouseCapture, EnableMouseCapture, Event as CEvent, KeyEventKind,
};
use crossterm::terminal::{
    disable_raw_mode, enable_raw_mode, EnterAlternateScreen, LeaveAlternateScreen,
};
use crossterm::execute;
use log::{info, warn};
use ratatui::backend::CrosstermBackend;
use ratatui::Terminal;
use roster_core::{Player, PlayersPlugin};
use roster_data::{open_vault, resolve_vault_root, Vault};
use std::io::{self, stdout, IsTerminal};
use std::path::{Path, PathBuf};
use std::time::Duration;

#[derive(Debug, Clone, Default)]
pub struct LaunchOptions {
    pub vault: Option<PathBuf>,
    /// Vault-relative or absolute path of the document to open.
    pub file: Option<String>,
}

pub fn run(options: LaunchOptions) -> Result<()> {
    let vault = load_vault(options.vault.as_deref())?;
    let app = App::bootstrap(vault, options.file.as_deref())?;
    run_app(app)
}

/// Show the players form for `options.file` on behalf of a caller and
/// return the saved list, or `None` when the form was closed without saving
/// or the file is not a Markdown note in the vault.
pub fn prompt_players(options: LaunchOptions) -> Result<Option<Vec<Player>>> {
    let vault = load_vault(options.vault.as_deref())?;
    let plugin = PlayersPlugin::new(vault.settings().property_key.clone());
    let file = options.file.as_deref().and_then(|path| vault.lookup(path));
    if file.is_none() {
        warn!(
            "no document {:?} in {}",
            options.file.as_deref().unwrap_or(""),
            vault.root().display()
        );
    }
    let (modal, pending) = plugin.open_modal(&vault, file.as_ref());
    if let Some(modal) = modal {
        run_app(App::for_modal(vault, modal)?)?;
    }
    Ok(pending.wait())
}

pub fn run_with_args(args: &[String]) -> Result<()> {
    run(parse_options(args))
}

fn parse_options(args: &[String]) -> LaunchOptions {
    let mut vault = None;
    let mut file = None;
    let mut idx = 0usize;
    while idx < args.len() {
        match args[idx].as_str() {
            "--vault" | "-v" => {
                if let Some(value) = args.get(idx + 1) {
                    vault = Some(PathBuf::from(value));
                    idx += 1;
                }
            }
            value if file.is_none() && !value.starts_with('-') => {
                file = Some(value.to_string());
            }
            _ => {}
        }
        idx += 1;
    }
    LaunchOptions { vault, file }
}

fn load_vault(explicit: Option<&Path>) -> Result<Vault> {
    let root = resolve_vault_root(explicit)?;
    let vault = open_vault(&root).with_context(|| format!("open vault {}", root.display()))?;
    info!("opened vault {}", root.display());
    Ok(vault)
}

fn run_app(mut app: App) -> Result<()> {
    ensure_interactive_terminal()?;

    enable_raw_mode().map_err(|err| {
        anyhow::anyhow!(
            "failed to enable raw mode; ensure the process owns an interactive terminal: {err}"
        )
    })?;
    let mut stdout = stdout();
    execute!(stdout, EnterAlternateScreen, EnableMouseCapture)
        .context("enter alternate screen")?;
    let backend = CrosstermBackend::new(stdout);
    let mut terminal = Terminal::new(backend).context("create terminal")?;

    let run_result = run_loop(&mut terminal, &mut app);
    restore_terminal(&mut terminal)?;
    run_result
}

fn run_loop(terminal: &mut Terminal<CrosstermBackend<io::Stdout>>, app: &mut App) -> Result<()> {
    let tick_rate = Duration::from_millis(120);
    while !app.should_quit {
        terminal.draw(|frame| view::draw(frame, app))?;
        if event::poll(tick_rate)? {
            match event::read()? {
                CEvent::Key(key) => {
                    if key.kind != KeyEventKind::Press {
                        continue;
                    }
                    if app.handle_palette_key(key) || app.handle_form_key(key) {
                        continue;
                    }
                    let action = input::map_key(key);
                    actions::dispatch(app, action);
                }
                CEvent::Mouse(mouse) => app.handle_mouse(mouse),
                _ => {}
            }
        } else {
            app.on_tick();
        }
    }
    Ok(())
}

fn restore_terminal(terminal: &mut Terminal<CrosstermBackend<io::Stdout>>) -> Result<()> {
    disable_raw_mode().context("disable raw mode")?;
    execute!(
        terminal.backend_mut(),
        LeaveAlternateScreen,
        DisableMouseCapture
    )
    .context("leave alternate screen")?;
    terminal.show_cursor().context("show cursor")?;
    Ok(())
}

fn ensure_interactive_terminal() -> Result<()> {
    if io::stdin().is_terminal() && io::stdout().is_terminal() {
        return Ok(());
    }
    anyhow::bail!(
        "roster needs an interactive TTY (run directly in a terminal, not a piped/headless shell)"
    );
}
