use crate::app::App;
use crate::input::InputAction;
use roster_core::OPEN_PLAYERS_MODAL;

pub fn dispatch(app: &mut App, action: InputAction) {
    match action {
        InputAction::None => {}
        InputAction::Quit => app.should_quit = true,
        InputAction::ToggleHelp => app.show_help = !app.show_help,
        InputAction::NextFocus => app.cycle_focus(true),
        InputAction::PrevFocus => app.cycle_focus(false),
        InputAction::MoveUp => app.move_cursor(false),
        InputAction::MoveDown => app.move_cursor(true),
        InputAction::Activate => app.activate_primary(),
        InputAction::Dismiss => app.dismiss(),
        InputAction::OpenPalette => app.open_palette(),
        InputAction::OpenPlayers => app.run_command(&OPEN_PLAYERS_MODAL),
        InputAction::Refresh => app.refresh(),
    }
}
