use crate::form::{FormCommand, FormState};
use crate::input::{map_form_key, FormAction};
use crate::view;
use anyhow::{Context, Result};
use crossterm::event::{KeyCode, KeyEvent, MouseButton, MouseEvent, MouseEventKind};
use log::{info, warn};
use ratatui::layout::Rect;
use roster_core::{
    parse_players, ClickTarget, Command, CommandOutcome, DocumentHandle, MetadataStore,
    PlayersModal, PlayersPlugin, Workspace, COMMANDS, OPEN_PLAYERS_MODAL,
};
use roster_data::{SkimFuzzy, Vault};
use serde_yaml::Value;
use std::cell::Cell;
use std::collections::VecDeque;

const MAX_EVENT_LOG: usize = 200;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FocusPane {
    Documents,
    Properties,
    Events,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PropertyRow {
    pub key: String,
    pub value: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PaletteRow {
    pub command: Command,
    pub enabled: bool,
}

pub struct App {
    pub vault: Vault,
    pub plugin: PlayersPlugin,
    pub fuzzy: SkimFuzzy,
    pub documents: Vec<DocumentHandle>,
    pub doc_cursor: usize,
    pub active: Option<DocumentHandle>,
    pub properties: Vec<PropertyRow>,
    pub property_cursor: usize,
    pub focus: FocusPane,
    pub palette_cursor: Option<usize>,
    pub form: Option<FormState>,
    pub event_log: VecDeque<String>,
    pub status_line: String,
    pub show_help: bool,
    /// Quit as soon as the form closes; set when the form was opened on
    /// behalf of a caller waiting for its result.
    pub quit_on_close: bool,
    pub should_quit: bool,
    /// Terminal area of the last frame, for mouse hit testing.
    pub screen: Cell<Rect>,
    /// First visible row of each list in the last frame.
    pub doc_offset: Cell<usize>,
    pub property_offset: Cell<usize>,
}

impl Workspace for App {
    fn active_document(&self) -> Option<DocumentHandle> {
        self.active.clone()
    }
}

impl App {
    pub fn bootstrap(vault: Vault, file: Option<&str>) -> Result<Self> {
        let plugin = PlayersPlugin::new(vault.settings().property_key.clone());
        let documents: Vec<DocumentHandle> = vault.documents().cloned().collect();
        let mut app = Self {
            vault,
            plugin,
            fuzzy: SkimFuzzy::new(),
            documents,
            doc_cursor: 0,
            active: None,
            properties: Vec::new(),
            property_cursor: 0,
            focus: FocusPane::Documents,
            palette_cursor: None,
            form: None,
            event_log: VecDeque::new(),
            status_line: "ready".to_string(),
            show_help: false,
            quit_on_close: false,
            should_quit: false,
            screen: Cell::new(Rect::default()),
            doc_offset: Cell::new(0),
            property_offset: Cell::new(0),
        };
        app.push_event_line(format!(
            "vault {}: {} notes",
            app.vault.root().display(),
            app.documents.len()
        ));
        if let Some(file) = file {
            let handle = app
                .vault
                .lookup(file)
                .with_context(|| format!("{file} is not a file in the vault"))?;
            app.activate_document(handle);
        }
        Ok(app)
    }

    /// App showing `modal` straight away and quitting once it closes.
    pub fn for_modal(vault: Vault, modal: PlayersModal) -> Result<Self> {
        let path = modal.file().path.clone();
        let mut app = Self::bootstrap(vault, Some(&path))?;
        app.quit_on_close = true;
        app.open_form(modal);
        Ok(app)
    }

    pub fn on_tick(&mut self) {}

    pub fn focus_label(&self, pane: FocusPane) -> &'static str {
        match pane {
            FocusPane::Documents => "Documents",
            FocusPane::Properties => "Properties",
            FocusPane::Events => "Events",
        }
    }

    pub fn next_hint(&self) -> String {
        if self.form.is_some() {
            return "tab move | ctrl+n add player | ctrl+s save | esc cancel".to_string();
        }
        match &self.active {
            None => "enter open a document".to_string(),
            Some(_) => format!(
                "click {} or press o to edit players",
                self.plugin.property_key()
            ),
        }
    }

    pub fn cycle_focus(&mut self, forward: bool) {
        self.focus = match (self.focus, forward) {
            (FocusPane::Documents, true) => FocusPane::Properties,
            (FocusPane::Properties, true) => FocusPane::Events,
            (FocusPane::Events, true) => FocusPane::Documents,
            (FocusPane::Documents, false) => FocusPane::Events,
            (FocusPane::Properties, false) => FocusPane::Documents,
            (FocusPane::Events, false) => FocusPane::Properties,
        };
    }

    pub fn move_cursor(&mut self, down: bool) {
        match self.focus {
            FocusPane::Documents => move_index(&mut self.doc_cursor, self.documents.len(), down),
            FocusPane::Properties => {
                move_index(&mut self.property_cursor, self.properties.len(), down)
            }
            FocusPane::Events => {}
        }
    }

    pub fn activate_primary(&mut self) {
        match self.focus {
            FocusPane::Documents => {
                if let Some(handle) = self.documents.get(self.doc_cursor).cloned() {
                    self.activate_document(handle);
                    self.focus = FocusPane::Properties;
                }
            }
            FocusPane::Properties => self.click_property(self.property_cursor, true),
            FocusPane::Events => {}
        }
    }

    pub fn dismiss(&mut self) {
        if self.show_help {
            self.show_help = false;
        } else {
            self.push_status("ready");
        }
    }

    pub fn activate_document(&mut self, handle: DocumentHandle) {
        if let Some(idx) = self.documents.iter().position(|doc| doc.path == handle.path) {
            self.doc_cursor = idx;
        }
        self.push_status(format!("opened {}", handle.path));
        self.active = Some(handle);
        self.property_cursor = 0;
        self.property_offset.set(0);
        self.load_properties();
    }

    pub fn load_properties(&mut self) {
        let Some(active) = self.active.as_ref() else {
            self.properties.clear();
            return;
        };
        match self.vault.frontmatter(active) {
            Ok(frontmatter) => {
                let property_key = self.plugin.property_key();
                self.properties = frontmatter
                    .unwrap_or_default()
                    .iter()
                    .map(|(key, value)| {
                        let key = scalar_text(key);
                        let value = if key == property_key {
                            players_summary(value)
                        } else {
                            scalar_text(value)
                        };
                        PropertyRow { key, value }
                    })
                    .collect();
            }
            Err(err) => {
                warn!("reading properties of {} failed: {err}", active.path);
                self.properties.clear();
                self.push_status(format!("cannot read properties: {err}"));
            }
        }
        clamp_index(&mut self.property_cursor, self.properties.len());
    }

    pub fn refresh(&mut self) {
        if let Err(err) = self.vault.refresh() {
            self.push_status(format!("refresh failed: {err:#}"));
            return;
        }
        self.documents = self.vault.documents().cloned().collect();
        clamp_index(&mut self.doc_cursor, self.documents.len());
        self.load_properties();
        self.push_status(format!("{} notes", self.documents.len()));
    }

    /// A click on a property row, on its value cell or its key cell.
    pub fn click_property(&mut self, idx: usize, on_value: bool) {
        let Some(row) = self.properties.get(idx) else {
            return;
        };
        let key = row.key.clone();
        let target = if on_value {
            ClickTarget::PropertyValue { key }
        } else {
            ClickTarget::PropertyKey { key }
        };
        if let Some(modal) = self.plugin.handle_click(&target, &*self, &self.vault) {
            self.open_form(modal);
        }
    }

    pub fn handle_mouse(&mut self, mouse: MouseEvent) {
        if self.form.is_some() || self.palette_cursor.is_some() {
            return;
        }
        if mouse.kind != MouseEventKind::Down(MouseButton::Left) {
            return;
        }
        let screen = self.screen.get();
        if let Some(idx) =
            view::documents_hit(
                screen,
                mouse.column,
                mouse.row,
                self.doc_offset.get(),
                self.documents.len(),
            )
        {
            self.focus = FocusPane::Documents;
            self.doc_cursor = idx;
            self.activate_document(self.documents[idx].clone());
            return;
        }
        if let Some((idx, on_value)) =
            view::properties_hit(
                screen,
                mouse.column,
                mouse.row,
                self.property_offset.get(),
                self.properties.len(),
            )
        {
            self.focus = FocusPane::Properties;
            self.property_cursor = idx;
            self.click_property(idx, on_value);
        }
    }

    pub fn open_palette(&mut self) {
        self.palette_cursor = Some(0);
    }

    pub fn palette_rows(&self) -> Vec<PaletteRow> {
        COMMANDS
            .iter()
            .map(|command| PaletteRow {
                command: *command,
                enabled: self.command_enabled(command),
            })
            .collect()
    }

    fn command_enabled(&self, command: &Command) -> bool {
        command.id == OPEN_PLAYERS_MODAL.id
            && matches!(
                self.plugin.check_command(self, &self.vault, true),
                CommandOutcome::Enabled
            )
    }

    pub fn handle_palette_key(&mut self, key: KeyEvent) -> bool {
        let Some(cursor) = self.palette_cursor else {
            return false;
        };
        let len = COMMANDS.len();
        match key.code {
            KeyCode::Esc => self.palette_cursor = None,
            KeyCode::Up => self.palette_cursor = Some((cursor + len - 1) % len),
            KeyCode::Down | KeyCode::Tab => self.palette_cursor = Some((cursor + 1) % len),
            KeyCode::Enter => {
                self.palette_cursor = None;
                if let Some(command) = COMMANDS.get(cursor) {
                    self.run_command(command);
                }
            }
            _ => {}
        }
        true
    }

    pub fn run_command(&mut self, command: &Command) {
        if command.id != OPEN_PLAYERS_MODAL.id {
            return;
        }
        match self.plugin.check_command(&*self, &self.vault, false) {
            CommandOutcome::Opened(modal) => self.open_form(modal),
            CommandOutcome::Disabled => {
                self.push_status(format!("{}: no Markdown document is open", command.name))
            }
            CommandOutcome::Enabled => {}
        }
    }

    pub fn open_form(&mut self, modal: PlayersModal) {
        let line = format!(
            "editing {} players of {}",
            modal.len(),
            modal.file().path
        );
        info!("{line}");
        self.push_event_line(line);
        self.form = Some(FormState::new(modal, &self.vault.settings().people_prefix));
    }

    pub fn handle_form_key(&mut self, key: KeyEvent) -> bool {
        let Some(form) = self.form.as_mut() else {
            return false;
        };
        match map_form_key(key, form.editing_text(), form.popup.is_some()) {
            FormAction::None => {}
            FormAction::Save => self.save_form(),
            FormAction::AppendPlayer => form.append_player(),
            FormAction::Escape => {
                if form.popup.is_some() {
                    form.popup = None;
                } else {
                    self.cancel_form();
                }
            }
            FormAction::NextField => form.move_focus(true),
            FormAction::PrevField => form.move_focus(false),
            FormAction::PopupUp => form.move_popup(false),
            FormAction::PopupDown => form.move_popup(true),
            FormAction::Enter if form.popup.is_some() => {
                form.accept_suggestion(&self.vault);
            }
            FormAction::Enter | FormAction::Toggle => match form.activate() {
                Some(FormCommand::Save) => self.save_form(),
                Some(FormCommand::Cancel) => self.cancel_form(),
                None => {}
            },
            FormAction::ShowSuggestions => form.refresh_suggestions(&self.vault, &self.fuzzy),
            FormAction::Type(ch) => {
                form.type_char(ch);
                form.refresh_suggestions(&self.vault, &self.fuzzy);
            }
            FormAction::Backspace => {
                form.backspace();
                form.refresh_suggestions(&self.vault, &self.fuzzy);
            }
        }
        true
    }

    fn save_form(&mut self) {
        let Some(form) = self.form.as_mut() else {
            return;
        };
        let to_caller = form.modal.has_callback();
        match form.modal.save(&mut self.vault) {
            Ok(()) => {
                let count = form.modal.cleaned_players().len();
                let line = if to_caller {
                    let line = format!("returned {count} players");
                    info!("{line}");
                    line
                } else {
                    format!("saved {count} players to {}", form.modal.file().path)
                };
                self.push_event_line(line.clone());
                self.push_status(line);
                self.close_form();
            }
            Err(err) => {
                warn!("saving players failed: {err}");
                form.error = Some(err.to_string());
                self.push_status(format!("save failed: {err}"));
            }
        }
    }

    fn cancel_form(&mut self) {
        if let Some(form) = self.form.as_mut() {
            form.modal.close();
        }
        self.push_status("players form closed without saving");
        self.close_form();
    }

    fn close_form(&mut self) {
        self.form = None;
        if self.quit_on_close {
            self.should_quit = true;
        }
        self.documents = self.vault.documents().cloned().collect();
        self.load_properties();
    }

    pub fn push_status(&mut self, value: impl Into<String>) {
        self.status_line = value.into();
    }

    fn push_event_line(&mut self, line: String) {
        if self.event_log.len() >= MAX_EVENT_LOG {
            let _ = self.event_log.pop_front();
        }
        self.event_log.push_back(line);
    }
}

fn move_index(value: &mut usize, len: usize, down: bool) {
    if len == 0 {
        *value = 0;
        return;
    }
    if down {
        *value = (*value + 1) % len;
    } else if *value == 0 {
        *value = len - 1;
    } else {
        *value -= 1;
    }
}

fn clamp_index(value: &mut usize, len: usize) {
    if len == 0 {
        *value = 0;
    } else if *value >= len {
        *value = len - 1;
    }
}

fn scalar_text(value: &Value) -> String {
    match value {
        Value::Null => String::new(),
        Value::Bool(flag) => flag.to_string(),
        Value::Number(number) => number.to_string(),
        Value::String(text) => text.clone(),
        Value::Sequence(items) => items
            .iter()
            .map(scalar_text)
            .collect::<Vec<_>>()
            .join(", "),
        Value::Mapping(map) => format!("{{{} keys}}", map.len()),
        Value::Tagged(tagged) => scalar_text(&tagged.value),
    }
}

fn players_summary(value: &Value) -> String {
    let players = parse_players(value);
    if players.is_empty() {
        return "(no players)".to_string();
    }
    players
        .iter()
        .map(|player| {
            let name = if player.name.is_empty() {
                "?"
            } else {
                player.name.as_str()
            };
            if player.won == Some(true) {
                format!("{name} *")
            } else {
                name.to_string()
            }
        })
        .collect::<Vec<_>>()
        .join(", ")
}

#[cfg(test)]
mod tests {
    use super::*;
    use crossterm::event::KeyModifiers;
    use ratatui::backend::TestBackend;
    use ratatui::Terminal;
    use std::fs;

    fn render(app: &App, width: u16, height: u16) {
        let mut terminal = Terminal::new(TestBackend::new(width, height)).expect("terminal");
        terminal
            .draw(|frame| view::draw(frame, app))
            .expect("draw");
    }

    fn left_click(column: u16, row: u16) -> MouseEvent {
        MouseEvent {
            kind: MouseEventKind::Down(MouseButton::Left),
            column,
            row,
            modifiers: KeyModifiers::NONE,
        }
    }

    fn vault() -> (tempfile::TempDir, Vault) {
        let dir = tempfile::tempdir().expect("tempdir");
        fs::create_dir_all(dir.path().join("People")).expect("mkdir");
        fs::create_dir_all(dir.path().join("Games")).expect("mkdir");
        fs::write(dir.path().join("People/Bob.md"), "Bob.\n").expect("write");
        fs::write(
            dir.path().join("Games/Catan.md"),
            "---\nplayed: friday night\nplayers:\n  - name: Ann\n    won: true\n---\nGame.\n",
        )
        .expect("write");
        let vault = roster_data::open_vault(dir.path()).expect("vault");
        (dir, vault)
    }

    fn press(app: &mut App, code: KeyCode) {
        assert!(app.handle_form_key(KeyEvent::new(code, KeyModifiers::NONE)));
    }

    #[test]
    fn properties_summarise_players() {
        let (_dir, vault) = vault();
        let app = App::bootstrap(vault, Some("Games/Catan.md")).expect("app");
        assert_eq!(
            app.properties,
            vec![
                PropertyRow {
                    key: "played".to_string(),
                    value: "friday night".to_string()
                },
                PropertyRow {
                    key: "players".to_string(),
                    value: "Ann *".to_string()
                },
            ]
        );
    }

    #[test]
    fn only_the_players_value_opens_the_form() {
        let (_dir, vault) = vault();
        let mut app = App::bootstrap(vault, Some("Games/Catan.md")).expect("app");
        app.click_property(0, true);
        assert!(app.form.is_none());
        app.click_property(1, false);
        assert!(app.form.is_none());
        app.click_property(1, true);
        assert_eq!(app.form.as_ref().map(|form| form.modal.len()), Some(1));
    }

    #[test]
    fn palette_command_needs_an_open_document() {
        let (_dir, vault) = vault();
        let mut app = App::bootstrap(vault, None).expect("app");
        assert!(!app.palette_rows()[0].enabled);
        app.run_command(&OPEN_PLAYERS_MODAL);
        assert!(app.form.is_none());
        app.activate_primary();
        assert_eq!(app.active.as_ref().map(|doc| doc.path.as_str()), Some("Games/Catan.md"));
        assert!(app.palette_rows()[0].enabled);
        app.run_command(&OPEN_PLAYERS_MODAL);
        assert!(app.form.is_some());
    }

    #[test]
    fn ctrl_s_writes_the_players_back() {
        let (dir, vault) = vault();
        let mut app = App::bootstrap(vault, Some("Games/Catan.md")).expect("app");
        app.click_property(1, true);
        assert!(app.handle_form_key(KeyEvent::new(KeyCode::Char('n'), KeyModifiers::CONTROL)));
        for ch in "Bob".chars() {
            press(&mut app, KeyCode::Char(ch));
        }
        press(&mut app, KeyCode::Esc);
        assert!(app.form.as_ref().is_some_and(|form| form.popup.is_none()));
        assert!(app.handle_form_key(KeyEvent::new(KeyCode::Char('s'), KeyModifiers::CONTROL)));
        assert!(app.form.is_none());
        let text = fs::read_to_string(dir.path().join("Games/Catan.md")).expect("read");
        assert_eq!(
            text,
            "---\nplayed: friday night\nplayers:\n- name: Ann\n  won: true\n- name: Bob\n---\nGame.\n"
        );
        assert_eq!(app.properties[1].value, "Ann *, Bob");
    }

    #[test]
    fn escape_discards_edits() {
        let (dir, vault) = vault();
        let mut app = App::bootstrap(vault, Some("Games/Catan.md")).expect("app");
        let before = fs::read_to_string(dir.path().join("Games/Catan.md")).expect("read");
        app.click_property(1, true);
        press(&mut app, KeyCode::Char('x'));
        press(&mut app, KeyCode::Esc);
        if app.form.is_some() {
            press(&mut app, KeyCode::Esc);
        }
        assert!(app.form.is_none());
        let after = fs::read_to_string(dir.path().join("Games/Catan.md")).expect("read");
        assert_eq!(before, after);
    }

    #[test]
    fn modal_app_quits_when_the_form_closes() {
        let (_dir, vault) = vault();
        let handle = vault.lookup("Games/Catan.md").expect("handle");
        let (modal, pending) = PlayersPlugin::default().open_modal(&vault, Some(&handle));
        let mut app = App::for_modal(vault, modal.expect("modal")).expect("app");
        assert!(app.quit_on_close);
        assert!(app.handle_form_key(KeyEvent::new(KeyCode::Char('s'), KeyModifiers::CONTROL)));
        assert!(app.should_quit);
        drop(app);
        let players = pending.wait().expect("saved");
        assert_eq!(players.len(), 1);
        assert_eq!(players[0].name, "Ann");
    }

    #[test]
    fn clicks_follow_the_scrolled_document_list() {
        let dir = tempfile::tempdir().expect("tempdir");
        for idx in 0..40 {
            fs::write(dir.path().join(format!("n{idx:02}.md")), "Note.\n").expect("write");
        }
        let vault = roster_data::open_vault(dir.path()).expect("vault");
        let mut app = App::bootstrap(vault, None).expect("app");
        app.doc_cursor = 35;
        render(&app, 100, 30);
        assert!(app.doc_offset.get() > 0);

        // header takes four rows, plus the pane border
        app.handle_mouse(left_click(2, 5));
        let expected = format!("n{:02}.md", app.doc_offset.get());
        assert_eq!(
            app.active.as_ref().map(|doc| doc.path.as_str()),
            Some(expected.as_str())
        );
        assert_eq!(expected, "n20.md");
    }

    #[test]
    fn clicking_the_players_value_opens_the_form() {
        let (_dir, vault) = vault();
        let mut app = App::bootstrap(vault, Some("Games/Catan.md")).expect("app");
        render(&app, 100, 30);
        // properties pane starts at 40% of the width; second row is players
        app.handle_mouse(left_click(41 + 20, 6));
        assert!(app.form.is_some());
    }

    #[test]
    fn suggestion_popup_fits_a_narrow_terminal() {
        let (_dir, vault) = vault();
        let mut app = App::bootstrap(vault, Some("Games/Catan.md")).expect("app");
        app.click_property(1, true);
        assert!(app.handle_form_key(KeyEvent::new(KeyCode::Char('n'), KeyModifiers::CONTROL)));
        press(&mut app, KeyCode::Char('b'));
        assert!(app.form.as_ref().is_some_and(|form| form.popup.is_some()));
        render(&app, 16, 12);
        render(&app, 30, 20);
    }

    #[test]
    fn returning_players_to_a_caller_is_reported_as_such() {
        let (_dir, vault) = vault();
        let handle = vault.lookup("Games/Catan.md").expect("handle");
        let (modal, _pending) = PlayersPlugin::default().open_modal(&vault, Some(&handle));
        let mut app = App::for_modal(vault, modal.expect("modal")).expect("app");
        assert!(app.handle_form_key(KeyEvent::new(KeyCode::Char('s'), KeyModifiers::CONTROL)));
        assert_eq!(app.status_line, "returned 1 players");
        assert_eq!(app.event_log.back().map(String::as_str), Some("returned 1 players"));
    }
}
