use serde::{Serialize, Serializer};
use serde_yaml::{Mapping, Value};
use std::fmt;

pub const NAME_KEY: &str = "name";
pub const WON_KEY: &str = "won";
pub const SCORE_KEY: &str = "score";
pub const TEAM_KEY: &str = "team";
pub const POSITION_KEY: &str = "position";
pub const FIRST_TIME_KEY: &str = "firstTimePlayer";

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Number {
    Int(i64),
    Float(f64),
}

impl Number {
    pub fn from_value(value: &Value) -> Option<Self> {
        let Value::Number(number) = value else {
            return None;
        };
        match number.as_i64() {
            Some(int) => Some(Self::Int(int)),
            None => Some(Self::Float(number.as_f64().unwrap_or(f64::NAN))),
        }
    }

    pub fn to_value(self) -> Value {
        match self {
            Self::Int(int) => Value::Number(int.into()),
            Self::Float(float) => Value::Number(float.into()),
        }
    }

    pub fn is_nan(self) -> bool {
        matches!(self, Self::Float(float) if float.is_nan())
    }
}

impl fmt::Display for Number {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Int(int) => write!(f, "{int}"),
            Self::Float(float) if float.is_nan() => f.write_str("NaN"),
            Self::Float(float) => write!(f, "{float}"),
        }
    }
}

/// A numeric score (`34`) or a symbolic one (`Gold`).
#[derive(Debug, Clone, PartialEq)]
pub enum Score {
    Number(Number),
    Text(String),
}

impl Score {
    pub fn from_value(value: &Value) -> Option<Self> {
        match value {
            Value::String(text) => Some(Self::Text(text.clone())),
            other => Number::from_value(other).map(Self::Number),
        }
    }

    pub fn to_value(&self) -> Value {
        match self {
            Self::Number(number) => number.to_value(),
            Self::Text(text) => Value::String(text.clone()),
        }
    }
}

impl fmt::Display for Score {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Number(number) => number.fmt(f),
            Self::Text(text) => f.write_str(text),
        }
    }
}

/// One participant of a played game, as stored in the `players` list.
///
/// An empty `name` stands for an absent name; it is never written out.
/// Keys other than the known ones are kept in `extra` in their original
/// order, and so are `won`/`firstTimePlayer` values that are not booleans.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct Player {
    pub name: String,
    pub won: Option<bool>,
    pub score: Option<Score>,
    pub team: Option<String>,
    pub position: Option<Number>,
    pub first_time_player: Option<bool>,
    pub extra: Mapping,
}

impl Player {
    pub fn named(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            ..Self::default()
        }
    }

    /// Typed view of a front-matter value, `None` when the value does not
    /// have the shape of a player.
    pub fn from_value(value: &Value) -> Option<Self> {
        let map = value.as_mapping()?;
        let name = map.get(NAME_KEY)?.as_str()?.to_string();
        let mut player = Self::named(name);
        for (key, value) in map {
            match key.as_str() {
                Some(NAME_KEY) => {}
                Some(SCORE_KEY) => player.score = Some(Score::from_value(value)?),
                Some(TEAM_KEY) => player.team = Some(value.as_str()?.to_string()),
                Some(POSITION_KEY) => player.position = Some(Number::from_value(value)?),
                Some(WON_KEY) => match value {
                    Value::Bool(flag) => player.won = Some(*flag),
                    other => {
                        player.extra.insert(key.clone(), other.clone());
                    }
                },
                Some(FIRST_TIME_KEY) => match value {
                    Value::Bool(flag) => player.first_time_player = Some(*flag),
                    other => {
                        player.extra.insert(key.clone(), other.clone());
                    }
                },
                _ => {
                    player.extra.insert(key.clone(), value.clone());
                }
            }
        }
        Some(player)
    }

    pub fn to_value(&self) -> Value {
        let mut map = Mapping::new();
        if !self.name.is_empty() {
            map.insert(NAME_KEY.into(), Value::String(self.name.clone()));
        }
        if let Some(won) = self.won {
            map.insert(WON_KEY.into(), Value::Bool(won));
        }
        if let Some(score) = &self.score {
            map.insert(SCORE_KEY.into(), score.to_value());
        }
        if let Some(team) = &self.team {
            map.insert(TEAM_KEY.into(), Value::String(team.clone()));
        }
        if let Some(position) = self.position {
            map.insert(POSITION_KEY.into(), position.to_value());
        }
        if let Some(first) = self.first_time_player {
            map.insert(FIRST_TIME_KEY.into(), Value::Bool(first));
        }
        for (key, value) in &self.extra {
            if !map.contains_key(key) {
                map.insert(key.clone(), value.clone());
            }
        }
        Value::Mapping(map)
    }

    pub fn set_won(&mut self, won: bool) {
        self.won = Some(won);
        self.extra.shift_remove(WON_KEY);
    }

    pub fn set_first_time_player(&mut self, first: bool) {
        self.first_time_player = Some(first);
        self.extra.shift_remove(FIRST_TIME_KEY);
    }

    /// Drop every field holding null, an empty string or `false`.
    ///
    /// `false` flags are stripped too, so on reload they read as unset.
    pub fn clean(&mut self) {
        if self.won == Some(false) {
            self.won = None;
        }
        if self.first_time_player == Some(false) {
            self.first_time_player = None;
        }
        if matches!(&self.score, Some(Score::Text(text)) if text.is_empty()) {
            self.score = None;
        }
        if self.team.as_deref() == Some("") {
            self.team = None;
        }
        self.extra = std::mem::take(&mut self.extra)
            .into_iter()
            .filter(|(_, value)| !is_unset(value))
            .collect();
    }

    /// True when no field would be written out.
    pub fn is_blank(&self) -> bool {
        self.name.is_empty()
            && self.won.is_none()
            && self.score.is_none()
            && self.team.is_none()
            && self.position.is_none()
            && self.first_time_player.is_none()
            && self.extra.is_empty()
    }
}

impl Serialize for Player {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        self.to_value().serialize(serializer)
    }
}

fn is_unset(value: &Value) -> bool {
    match value {
        Value::Null => true,
        Value::Bool(flag) => !flag,
        Value::String(text) => text.is_empty(),
        _ => false,
    }
}

pub fn is_player(value: &Value) -> bool {
    Player::from_value(value).is_some()
}

/// Best-effort extraction of the players list from an untyped value.
/// Elements that are not players are skipped; anything that is not a
/// sequence yields an empty list.
pub fn parse_players(value: &Value) -> Vec<Player> {
    let Some(items) = value.as_sequence() else {
        return Vec::new();
    };
    items.iter().filter_map(Player::from_value).collect()
}

/// Remove unset fields from every player and drop the ones left empty.
pub fn clean_players(players: impl IntoIterator<Item = Player>) -> Vec<Player> {
    players
        .into_iter()
        .map(|mut player| {
            player.clean();
            player
        })
        .filter(|player| !player.is_blank())
        .collect()
}

pub fn players_to_value(players: &[Player]) -> Value {
    Value::Sequence(players.iter().map(Player::to_value).collect())
}

/// Integer entry for numeric form fields.
///
/// Leading whitespace and a sign are accepted, then as many digits as
/// follow; the rest of the text is ignored. Text without leading digits is
/// NaN. Blank text means the field is unset.
pub fn parse_int(text: &str) -> Option<Number> {
    let trimmed = text.trim_start();
    if trimmed.trim_end().is_empty() {
        return None;
    }
    let (negative, rest) = match trimmed.as_bytes().first() {
        Some(b'-') => (true, &trimmed[1..]),
        Some(b'+') => (false, &trimmed[1..]),
        _ => (false, trimmed),
    };
    let digits: &str = {
        let end = rest
            .char_indices()
            .find(|(_, ch)| !ch.is_ascii_digit())
            .map(|(idx, _)| idx)
            .unwrap_or(rest.len());
        &rest[..end]
    };
    if digits.is_empty() {
        return Some(Number::Float(f64::NAN));
    }
    let parsed = match digits.parse::<i64>() {
        Ok(value) => Number::Int(if negative { -value } else { value }),
        Err(_) => {
            let value: f64 = digits.parse().unwrap_or(f64::NAN);
            Number::Float(if negative { -value } else { value })
        }
    };
    Some(parsed)
}
