use crossterm::event::{KeyCode, KeyEvent, KeyModifiers};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InputAction {
    None,
    Quit,
    ToggleHelp,
    NextFocus,
    PrevFocus,
    MoveUp,
    MoveDown,
    Activate,
    Dismiss,
    OpenPalette,
    OpenPlayers,
    Refresh,
}

/// Keys while the players form is open.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FormAction {
    None,
    Save,
    AppendPlayer,
    Escape,
    NextField,
    PrevField,
    PopupUp,
    PopupDown,
    Enter,
    Toggle,
    ShowSuggestions,
    Type(char),
    Backspace,
}

pub fn map_key(key: KeyEvent) -> InputAction {
    match key.code {
        KeyCode::Char('p') if key.modifiers.contains(KeyModifiers::CONTROL) => {
            InputAction::OpenPalette
        }
        KeyCode::Esc => InputAction::Dismiss,
        KeyCode::Tab => InputAction::NextFocus,
        KeyCode::BackTab => InputAction::PrevFocus,
        KeyCode::Up | KeyCode::Char('k') => InputAction::MoveUp,
        KeyCode::Down | KeyCode::Char('j') => InputAction::MoveDown,
        KeyCode::Enter => InputAction::Activate,
        KeyCode::Char('q') => InputAction::Quit,
        KeyCode::Char('?') => InputAction::ToggleHelp,
        KeyCode::Char('o') => InputAction::OpenPlayers,
        KeyCode::Char('r') => InputAction::Refresh,
        _ => InputAction::None,
    }
}

/// `text_field` is true when the focused control takes typed characters,
/// `popup_open` when the suggestion list is showing.
pub fn map_form_key(key: KeyEvent, text_field: bool, popup_open: bool) -> FormAction {
    let ctrl = key.modifiers.contains(KeyModifiers::CONTROL);
    match key.code {
        KeyCode::Char('s') if ctrl => FormAction::Save,
        KeyCode::Char('n') if ctrl => FormAction::AppendPlayer,
        KeyCode::Char(' ') if ctrl => FormAction::ShowSuggestions,
        KeyCode::Esc => FormAction::Escape,
        KeyCode::Tab => FormAction::NextField,
        KeyCode::BackTab => FormAction::PrevField,
        KeyCode::Up if popup_open => FormAction::PopupUp,
        KeyCode::Down if popup_open => FormAction::PopupDown,
        KeyCode::Up => FormAction::PrevField,
        KeyCode::Down => FormAction::NextField,
        KeyCode::Enter => FormAction::Enter,
        KeyCode::Backspace if text_field => FormAction::Backspace,
        KeyCode::Char(_) if ctrl || key.modifiers.contains(KeyModifiers::ALT) => FormAction::None,
        KeyCode::Char(ch) if text_field => FormAction::Type(ch),
        KeyCode::Char(' ') => FormAction::Toggle,
        _ => FormAction::None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn key(code: KeyCode) -> KeyEvent {
        KeyEvent::new(code, KeyModifiers::NONE)
    }

    fn ctrl(ch: char) -> KeyEvent {
        KeyEvent::new(KeyCode::Char(ch), KeyModifiers::CONTROL)
    }

    #[test]
    fn maps_browse_actions() {
        assert_eq!(map_key(key(KeyCode::Char('q'))), InputAction::Quit);
        assert_eq!(map_key(key(KeyCode::Char('o'))), InputAction::OpenPlayers);
        assert_eq!(map_key(ctrl('p')), InputAction::OpenPalette);
        assert_eq!(map_key(key(KeyCode::Char('j'))), InputAction::MoveDown);
    }

    #[test]
    fn form_shortcuts_win_over_typing() {
        assert_eq!(map_form_key(ctrl('s'), true, false), FormAction::Save);
        assert_eq!(map_form_key(ctrl('n'), true, false), FormAction::AppendPlayer);
        assert_eq!(map_form_key(ctrl('x'), true, false), FormAction::None);
    }

    #[test]
    fn characters_type_only_into_text_fields() {
        assert_eq!(
            map_form_key(key(KeyCode::Char('q')), true, false),
            FormAction::Type('q')
        );
        assert_eq!(
            map_form_key(key(KeyCode::Char(' ')), true, false),
            FormAction::Type(' ')
        );
        assert_eq!(
            map_form_key(key(KeyCode::Char(' ')), false, false),
            FormAction::Toggle
        );
        assert_eq!(
            map_form_key(key(KeyCode::Char('q')), false, false),
            FormAction::None
        );
    }

    #[test]
    fn arrows_drive_the_popup_when_it_is_open() {
        assert_eq!(map_form_key(key(KeyCode::Down), true, true), FormAction::PopupDown);
        assert_eq!(map_form_key(key(KeyCode::Down), true, false), FormAction::NextField);
        assert_eq!(map_form_key(key(KeyCode::Up), true, true), FormAction::PopupUp);
    }
}
