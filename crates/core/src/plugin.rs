use crate::host::{DocumentHandle, MetadataStore, Workspace};
use crate::modal::{PlayersModal, PLAYERS_KEY};
use crate::player::Player;
use std::sync::mpsc::{self, Receiver, TryRecvError};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Command {
    pub id: &'static str,
    pub name: &'static str,
}

pub const OPEN_PLAYERS_MODAL: Command = Command {
    id: "open-players-modal",
    name: "Open players modal",
};

pub const COMMANDS: &[Command] = &[OPEN_PLAYERS_MODAL];

/// Where a click landed in the document chrome.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ClickTarget {
    /// The value cell of a front-matter property.
    PropertyValue { key: String },
    /// The key cell of a front-matter property.
    PropertyKey { key: String },
    Other,
}

pub enum CommandOutcome {
    Disabled,
    Enabled,
    Opened(PlayersModal),
}

/// Deferred answer of [`PlayersPlugin::open_modal`]: the cleaned players on
/// save, `None` when the form was dismissed or could not be opened.
#[derive(Debug)]
pub struct PendingPlayers {
    rx: Receiver<Option<Vec<Player>>>,
    settled: Option<Option<Vec<Player>>>,
}

impl PendingPlayers {
    fn resolved(value: Option<Vec<Player>>) -> Self {
        let (tx, rx) = mpsc::channel();
        let _ = tx.send(value);
        Self { rx, settled: None }
    }

    /// Result if the modal has finished, without blocking.
    pub fn try_result(&mut self) -> Option<&Option<Vec<Player>>> {
        if self.settled.is_none() {
            match self.rx.try_recv() {
                Ok(value) => self.settled = Some(value),
                Err(TryRecvError::Disconnected) => self.settled = Some(None),
                Err(TryRecvError::Empty) => {}
            }
        }
        self.settled.as_ref()
    }

    /// Block until the modal resolves. A modal dropped without resolving
    /// counts as dismissed.
    pub fn wait(self) -> Option<Vec<Player>> {
        if let Some(value) = self.settled {
            return value;
        }
        self.rx.recv().unwrap_or(None)
    }
}

#[derive(Debug, Clone)]
pub struct PlayersPlugin {
    property_key: String,
}

impl Default for PlayersPlugin {
    fn default() -> Self {
        Self::new(PLAYERS_KEY)
    }
}

impl PlayersPlugin {
    pub fn new(property_key: impl Into<String>) -> Self {
        Self {
            property_key: property_key.into(),
        }
    }

    pub fn property_key(&self) -> &str {
        &self.property_key
    }

    /// `checking` only asks whether the command is available; otherwise the
    /// modal is opened against the active document.
    pub fn check_command(
        &self,
        workspace: &dyn Workspace,
        store: &dyn MetadataStore,
        checking: bool,
    ) -> CommandOutcome {
        let Some(file) = active_markdown(workspace) else {
            return CommandOutcome::Disabled;
        };
        if checking {
            return CommandOutcome::Enabled;
        }
        CommandOutcome::Opened(PlayersModal::open(
            store,
            file,
            self.property_key.clone(),
            None,
        ))
    }

    pub fn handle_click(
        &self,
        target: &ClickTarget,
        workspace: &dyn Workspace,
        store: &dyn MetadataStore,
    ) -> Option<PlayersModal> {
        let ClickTarget::PropertyValue { key } = target else {
            return None;
        };
        if *key != self.property_key {
            return None;
        }
        let file = active_markdown(workspace)?;
        Some(PlayersModal::open(
            store,
            file,
            self.property_key.clone(),
            None,
        ))
    }

    /// Open the form for another component and hand back the deferred
    /// result. A missing or non-markdown file resolves to `None` at once.
    pub fn open_modal(
        &self,
        store: &dyn MetadataStore,
        file: Option<&DocumentHandle>,
    ) -> (Option<PlayersModal>, PendingPlayers) {
        let Some(file) = file.filter(|file| file.is_markdown()) else {
            return (None, PendingPlayers::resolved(None));
        };
        let (tx, rx) = mpsc::channel();
        let modal = PlayersModal::open(
            store,
            file.clone(),
            self.property_key.clone(),
            Some(Box::new(move |players| {
                let _ = tx.send(players);
            })),
        );
        (
            Some(modal),
            PendingPlayers {
                rx,
                settled: None,
            },
        )
    }
}

fn active_markdown(workspace: &dyn Workspace) -> Option<DocumentHandle> {
    workspace
        .active_document()
        .filter(DocumentHandle::is_markdown)
}
