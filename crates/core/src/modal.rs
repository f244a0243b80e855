use crate::error::HostError;
use crate::host::{DocumentHandle, MetadataStore};
use crate::player::{clean_players, parse_int, parse_players, players_to_value, Player, Score};
use log::{info, warn};
use serde_yaml::{Mapping, Value};

pub const PLAYERS_KEY: &str = "players";
const NOT_A_NUMBER: &str = "not a number";

/// Receives the cleaned list on save, or `None` when the user backed out.
pub type Completion = Box<dyn FnOnce(Option<Vec<Player>>)>;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct EntryId(u64);

#[derive(Debug, Clone, PartialEq)]
pub struct Entry {
    pub id: EntryId,
    pub player: Player,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ModalPhase {
    Editing,
    Saved,
    Cancelled,
}

/// One "Player N" block of the form.
#[derive(Debug, Clone, PartialEq)]
pub struct SectionView {
    pub id: EntryId,
    pub title: String,
    pub removable: bool,
    pub name: String,
    pub won: bool,
    pub score: String,
    pub score_hint: Option<&'static str>,
    pub team: String,
    pub position: String,
    pub position_hint: Option<&'static str>,
    pub first_time_player: bool,
}

/// Working copy of a document's players while the form is open.
pub struct PlayersModal {
    file: DocumentHandle,
    property_key: String,
    entries: Vec<Entry>,
    next_id: u64,
    saved: bool,
    phase: ModalPhase,
    on_complete: Option<Completion>,
}

impl PlayersModal {
    pub fn open(
        store: &dyn MetadataStore,
        file: DocumentHandle,
        property_key: impl Into<String>,
        on_complete: Option<Completion>,
    ) -> Self {
        let property_key = property_key.into();
        let frontmatter = match store.frontmatter(&file) {
            Ok(frontmatter) => frontmatter.unwrap_or_default(),
            Err(err) => {
                warn!("reading front-matter of {} failed: {err}", file.path);
                Mapping::new()
            }
        };
        let players = frontmatter
            .get(property_key.as_str())
            .map(parse_players)
            .unwrap_or_default();
        Self::with_players(file, property_key, players, on_complete)
    }

    pub fn with_players(
        file: DocumentHandle,
        property_key: impl Into<String>,
        players: Vec<Player>,
        on_complete: Option<Completion>,
    ) -> Self {
        let mut modal = Self {
            file,
            property_key: property_key.into(),
            entries: Vec::new(),
            next_id: 0,
            saved: false,
            phase: ModalPhase::Editing,
            on_complete,
        };
        for player in players {
            let entry = modal.new_entry(player);
            modal.entries.push(entry);
        }
        if modal.entries.is_empty() {
            modal.append();
        }
        modal
    }

    pub fn file(&self) -> &DocumentHandle {
        &self.file
    }

    pub fn phase(&self) -> ModalPhase {
        self.phase
    }

    pub fn is_saved(&self) -> bool {
        self.saved
    }

    pub fn has_callback(&self) -> bool {
        self.on_complete.is_some()
    }

    pub fn entries(&self) -> &[Entry] {
        &self.entries
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn position_of(&self, id: EntryId) -> Option<usize> {
        self.entries.iter().position(|entry| entry.id == id)
    }

    pub fn player(&self, id: EntryId) -> Option<&Player> {
        self.entries
            .iter()
            .find(|entry| entry.id == id)
            .map(|entry| &entry.player)
    }

    pub fn sections(&self) -> Vec<SectionView> {
        let removable = self.entries.len() > 1;
        self.entries
            .iter()
            .enumerate()
            .map(|(idx, entry)| {
                let player = &entry.player;
                SectionView {
                    id: entry.id,
                    title: format!("Player {}", idx + 1),
                    removable,
                    name: player.name.clone(),
                    won: player.won.unwrap_or(false),
                    score: player
                        .score
                        .as_ref()
                        .map(ToString::to_string)
                        .unwrap_or_default(),
                    score_hint: player
                        .score
                        .as_ref()
                        .filter(|score| matches!(score, Score::Number(number) if number.is_nan()))
                        .map(|_| NOT_A_NUMBER),
                    team: player.team.clone().unwrap_or_default(),
                    position: player
                        .position
                        .map(|position| position.to_string())
                        .unwrap_or_default(),
                    position_hint: player
                        .position
                        .filter(|position| position.is_nan())
                        .map(|_| NOT_A_NUMBER),
                    first_time_player: player.first_time_player.unwrap_or(false),
                }
            })
            .collect()
    }

    pub fn set_name(&mut self, id: EntryId, value: &str) -> bool {
        self.edit(id, |player| player.name = value.to_string())
    }

    pub fn set_won(&mut self, id: EntryId, won: bool) -> bool {
        self.edit(id, |player| player.set_won(won))
    }

    pub fn set_score_input(&mut self, id: EntryId, text: &str) -> bool {
        let parsed = parse_int(text).map(Score::Number);
        self.edit(id, |player| player.score = parsed)
    }

    pub fn set_team(&mut self, id: EntryId, value: &str) -> bool {
        self.edit(id, |player| player.team = Some(value.to_string()))
    }

    pub fn set_position_input(&mut self, id: EntryId, text: &str) -> bool {
        let parsed = parse_int(text);
        self.edit(id, |player| player.position = parsed)
    }

    pub fn set_first_time_player(&mut self, id: EntryId, first: bool) -> bool {
        self.edit(id, |player| player.set_first_time_player(first))
    }

    /// Remove a record. The last remaining record cannot be removed.
    pub fn remove(&mut self, id: EntryId) -> bool {
        if self.entries.len() <= 1 {
            return false;
        }
        let Some(idx) = self.position_of(id) else {
            return false;
        };
        self.entries.remove(idx);
        true
    }

    /// Insert a blank record right after `id` and return the new id.
    pub fn insert_below(&mut self, id: EntryId) -> Option<EntryId> {
        let idx = self.position_of(id)?;
        let entry = self.new_entry(Player::default());
        let new_id = entry.id;
        self.entries.insert(idx + 1, entry);
        Some(new_id)
    }

    pub fn append(&mut self) -> EntryId {
        let entry = self.new_entry(Player::default());
        let id = entry.id;
        self.entries.push(entry);
        id
    }

    pub fn cleaned_players(&self) -> Vec<Player> {
        clean_players(self.entries.iter().map(|entry| entry.player.clone()))
    }

    /// Clean the list and hand it to the callback, or write it into the
    /// document's front-matter. On a store error the form stays open.
    pub fn save(&mut self, store: &mut dyn MetadataStore) -> Result<(), HostError> {
        if self.phase != ModalPhase::Editing {
            return Ok(());
        }
        let players = self.cleaned_players();
        if let Some(done) = self.on_complete.take() {
            done(Some(players));
        } else {
            let value = players_to_value(&players);
            let key = Value::String(self.property_key.clone());
            store.process_frontmatter(&self.file, &mut |frontmatter: &mut Mapping| {
                frontmatter.insert(key.clone(), value.clone());
            })?;
            info!("saved {} players to {}", players.len(), self.file.path);
        }
        self.saved = true;
        self.phase = ModalPhase::Saved;
        Ok(())
    }

    /// Dismiss the form. A pending callback learns that the user aborted.
    pub fn close(&mut self) {
        if self.phase != ModalPhase::Editing {
            return;
        }
        self.phase = ModalPhase::Cancelled;
        if !self.saved {
            if let Some(done) = self.on_complete.take() {
                done(None);
            }
        }
    }

    fn edit(&mut self, id: EntryId, apply: impl FnOnce(&mut Player)) -> bool {
        match self.entries.iter_mut().find(|entry| entry.id == id) {
            Some(entry) => {
                apply(&mut entry.player);
                true
            }
            None => false,
        }
    }

    fn new_entry(&mut self, player: Player) -> Entry {
        let id = EntryId(self.next_id);
        self.next_id += 1;
        Entry { id, player }
    }
}

impl Drop for PlayersModal {
    fn drop(&mut self) {
        self.close();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn modal_with(names: &[&str]) -> PlayersModal {
        PlayersModal::with_players(
            DocumentHandle::from_path("Games/Catan.md", 0),
            PLAYERS_KEY,
            names.iter().map(|name| Player::named(*name)).collect(),
            None,
        )
    }

    fn names(modal: &PlayersModal) -> Vec<String> {
        modal
            .entries()
            .iter()
            .map(|entry| entry.player.name.clone())
            .collect()
    }

    #[test]
    fn empty_list_is_seeded_with_one_blank_record() {
        let modal = modal_with(&[]);
        assert_eq!(modal.len(), 1);
        assert_eq!(modal.entries()[0].player, Player::default());
        assert!(!modal.sections()[0].removable);
    }

    #[test]
    fn insert_below_targets_the_record_not_the_slot() {
        let mut modal = modal_with(&["A", "B", "C"]);
        let b = modal.entries()[1].id;
        let a = modal.entries()[0].id;
        assert!(modal.remove(a));
        let new_id = modal.insert_below(b).expect("inserted");
        modal.set_name(new_id, "D");
        assert_eq!(names(&modal), vec!["B", "D", "C"]);
        let titles: Vec<String> = modal.sections().into_iter().map(|s| s.title).collect();
        assert_eq!(titles, vec!["Player 1", "Player 2", "Player 3"]);
    }

    #[test]
    fn last_record_cannot_be_removed() {
        let mut modal = modal_with(&["A"]);
        let id = modal.entries()[0].id;
        assert!(!modal.remove(id));
        assert_eq!(modal.len(), 1);
    }

    #[test]
    fn non_numeric_score_is_kept_as_nan_with_hint() {
        let mut modal = modal_with(&["A"]);
        let id = modal.entries()[0].id;
        modal.set_score_input(id, "lots");
        modal.set_position_input(id, "2nd");
        let section = &modal.sections()[0];
        assert_eq!(section.score, "NaN");
        assert_eq!(section.score_hint, Some(NOT_A_NUMBER));
        assert_eq!(section.position, "2");
        assert_eq!(section.position_hint, None);
    }
}
