use roster_core::{
    EntryId, FuzzyMatcher, LinkFormatter, LinkIndex, PersonSuggest, PlayersModal, SectionView,
    SuggestInput, Suggestion,
};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Field {
    Remove,
    Name,
    Won,
    Score,
    Team,
    Position,
    FirstTime,
    AddBelow,
}

impl Field {
    pub fn is_text(self) -> bool {
        matches!(self, Self::Name | Self::Score | Self::Team | Self::Position)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FormFocus {
    Field(EntryId, Field),
    Save,
    Cancel,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FormCommand {
    Save,
    Cancel,
}

#[derive(Debug, Clone)]
pub struct SuggestPopup {
    pub items: Vec<Suggestion>,
    pub cursor: usize,
}

/// The open players modal plus the terminal-side editing state: which
/// control has focus, the text being typed and the suggestion popup.
pub struct FormState {
    pub modal: PlayersModal,
    pub suggest: PersonSuggest,
    pub focus: FormFocus,
    pub buffer: String,
    pub popup: Option<SuggestPopup>,
    pub error: Option<String>,
}

/// The name field as seen by the suggestion provider.
struct NameInput<'a> {
    modal: &'a mut PlayersModal,
    id: EntryId,
    buffer: &'a mut String,
    popup: &'a mut Option<SuggestPopup>,
}

impl SuggestInput for NameInput<'_> {
    fn set_value(&mut self, value: String) {
        *self.buffer = value;
    }

    fn trigger_input(&mut self) {
        self.modal.set_name(self.id, self.buffer);
    }

    fn close_suggestions(&mut self) {
        *self.popup = None;
    }
}

impl FormState {
    pub fn new(modal: PlayersModal, people_prefix: &str) -> Self {
        let suggest = PersonSuggest::new(people_prefix, modal.file().path.clone());
        let focus = modal
            .entries()
            .first()
            .map(|entry| FormFocus::Field(entry.id, Field::Name))
            .unwrap_or(FormFocus::Save);
        let mut state = Self {
            modal,
            suggest,
            focus,
            buffer: String::new(),
            popup: None,
            error: None,
        };
        state.load_buffer();
        state
    }

    pub fn focus_order(&self) -> Vec<FormFocus> {
        let mut order = Vec::new();
        for section in self.modal.sections() {
            if section.removable {
                order.push(FormFocus::Field(section.id, Field::Remove));
            }
            for field in [
                Field::Name,
                Field::Won,
                Field::Score,
                Field::Team,
                Field::Position,
                Field::FirstTime,
                Field::AddBelow,
            ] {
                order.push(FormFocus::Field(section.id, field));
            }
        }
        order.push(FormFocus::Save);
        order.push(FormFocus::Cancel);
        order
    }

    pub fn move_focus(&mut self, forward: bool) {
        let order = self.focus_order();
        let len = order.len();
        let current = order
            .iter()
            .position(|focus| *focus == self.focus)
            .unwrap_or(0);
        let next = if forward {
            (current + 1) % len
        } else {
            (current + len - 1) % len
        };
        self.set_focus(order[next]);
    }

    pub fn set_focus(&mut self, focus: FormFocus) {
        self.focus = focus;
        self.popup = None;
        self.load_buffer();
    }

    pub fn focused_field(&self) -> Option<(EntryId, Field)> {
        match self.focus {
            FormFocus::Field(id, field) => Some((id, field)),
            FormFocus::Save | FormFocus::Cancel => None,
        }
    }

    pub fn editing_text(&self) -> bool {
        self.focused_field()
            .is_some_and(|(_, field)| field.is_text())
    }

    pub fn editing_name(&self) -> bool {
        matches!(self.focused_field(), Some((_, Field::Name)))
    }

    fn section(&self, id: EntryId) -> Option<SectionView> {
        self.modal
            .sections()
            .into_iter()
            .find(|section| section.id == id)
    }

    fn load_buffer(&mut self) {
        self.buffer = match self.focused_field() {
            Some((id, field)) if field.is_text() => self
                .section(id)
                .map(|section| match field {
                    Field::Name => section.name,
                    Field::Score => section.score,
                    Field::Team => section.team,
                    _ => section.position,
                })
                .unwrap_or_default(),
            _ => String::new(),
        };
    }

    fn commit_buffer(&mut self) {
        let Some((id, field)) = self.focused_field() else {
            return;
        };
        match field {
            Field::Name => self.modal.set_name(id, &self.buffer),
            Field::Score => self.modal.set_score_input(id, &self.buffer),
            Field::Team => self.modal.set_team(id, &self.buffer),
            Field::Position => self.modal.set_position_input(id, &self.buffer),
            _ => false,
        };
    }

    pub fn type_char(&mut self, ch: char) {
        if !self.editing_text() {
            return;
        }
        self.buffer.push(ch);
        self.commit_buffer();
    }

    pub fn backspace(&mut self) {
        if !self.editing_text() {
            return;
        }
        self.buffer.pop();
        self.commit_buffer();
    }

    /// Recompute the popup for the name being typed. The popup hides when
    /// nothing matches.
    pub fn refresh_suggestions(&mut self, index: &dyn LinkIndex, matcher: &dyn FuzzyMatcher) {
        if !self.editing_name() {
            self.popup = None;
            return;
        }
        let items = self.suggest.get_suggestions(index, matcher, &self.buffer);
        self.popup = (!items.is_empty()).then_some(SuggestPopup { items, cursor: 0 });
    }

    pub fn move_popup(&mut self, down: bool) {
        let Some(popup) = self.popup.as_mut() else {
            return;
        };
        let len = popup.items.len();
        if len == 0 {
            return;
        }
        popup.cursor = if down {
            (popup.cursor + 1) % len
        } else {
            (popup.cursor + len - 1) % len
        };
    }

    pub fn accept_suggestion(&mut self, formatter: &dyn LinkFormatter) -> bool {
        let Some((id, Field::Name)) = self.focused_field() else {
            return false;
        };
        let Some(item) = self
            .popup
            .as_ref()
            .and_then(|popup| popup.items.get(popup.cursor).cloned())
        else {
            return false;
        };
        let mut input = NameInput {
            modal: &mut self.modal,
            id,
            buffer: &mut self.buffer,
            popup: &mut self.popup,
        };
        self.suggest.select_suggestion(&item, formatter, &mut input);
        true
    }

    pub fn append_player(&mut self) {
        let id = self.modal.append();
        self.set_focus(FormFocus::Field(id, Field::Name));
    }

    /// Enter/space on the focused control. Save and Cancel are handed back
    /// to the caller, which owns the store.
    pub fn activate(&mut self) -> Option<FormCommand> {
        match self.focus {
            FormFocus::Save => return Some(FormCommand::Save),
            FormFocus::Cancel => return Some(FormCommand::Cancel),
            FormFocus::Field(id, field) => match field {
                Field::Won => {
                    let won = self.section(id).is_some_and(|section| section.won);
                    self.modal.set_won(id, !won);
                }
                Field::FirstTime => {
                    let first = self
                        .section(id)
                        .is_some_and(|section| section.first_time_player);
                    self.modal.set_first_time_player(id, !first);
                }
                Field::AddBelow => {
                    if let Some(new_id) = self.modal.insert_below(id) {
                        self.set_focus(FormFocus::Field(new_id, Field::Name));
                    }
                }
                Field::Remove => self.remove(id),
                Field::Name | Field::Score | Field::Team | Field::Position => {
                    self.move_focus(true)
                }
            },
        }
        None
    }

    fn remove(&mut self, id: EntryId) {
        let Some(idx) = self.modal.position_of(id) else {
            return;
        };
        if !self.modal.remove(id) {
            return;
        }
        let entries = self.modal.entries();
        let neighbour = entries[idx.min(entries.len() - 1)].id;
        self.set_focus(FormFocus::Field(neighbour, Field::Name));
    }
}
