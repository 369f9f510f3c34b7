//! Domain events produced by the tagging engine
//!
//! A [`LoggedEvent`] is built by the dispatch layer, optionally completed by a
//! selector (player or zone) and then handed to the sink. The engine never
//! touches an event again after delivery.

use chrono::{DateTime, Local};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::sync::atomic::{AtomicU64, Ordering};

static EVENT_SEQUENCE: AtomicU64 = AtomicU64::new(0);

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Team {
    #[default]
    Home,
    Away,
}

impl Team {
    pub fn other(self) -> Self {
        match self {
            Team::Home => Team::Away,
            Team::Away => Team::Home,
        }
    }
}

impl fmt::Display for Team {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Team::Home => f.write_str("home"),
            Team::Away => f.write_str("away"),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Player {
    pub id: String,
    pub name: String,
    #[serde(default)]
    pub number: Option<u8>,
}

/// Player reference attached to a logged event.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PlayerRef {
    pub id: String,
    pub name: String,
}

impl From<&Player> for PlayerRef {
    fn from(player: &Player) -> Self {
        Self {
            id: player.id.clone(),
            name: player.name.clone(),
        }
    }
}

/// Squad list of one team plus an optional starting lineup filter.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Roster {
    /// Player ids of the starting lineup. `None` means "everyone".
    #[serde(default)]
    pub lineup: Option<Vec<String>>,
    #[serde(default)]
    pub players: Vec<Player>,
}

impl Roster {
    /// Players offered by the player selector.
    ///
    /// Falls back to the full squad when the lineup filter leaves nobody.
    pub fn selectable(&self) -> Vec<Player> {
        if let Some(lineup) = &self.lineup {
            let filtered: Vec<Player> = self
                .players
                .iter()
                .filter(|p| lineup.iter().any(|id| *id == p.id))
                .cloned()
                .collect();
            if !filtered.is_empty() {
                return filtered;
            }
        }
        self.players.clone()
    }
}

/// Optional metadata copied from the event definition.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct EventMetadata {
    pub category: Option<String>,
    /// Press or hold duration that produced the event.
    pub duration_hint_ms: Option<u64>,
    pub tags: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LoggedEvent {
    pub id: String,
    pub timestamp: DateTime<Local>,
    pub event_name: String,
    pub team: Team,
    pub source_label: String,
    pub player: Option<PlayerRef>,
    /// Pitch zone 1..=18.
    pub zone: Option<u8>,
    pub metadata: Option<EventMetadata>,
}

impl LoggedEvent {
    pub fn new(event_name: impl Into<String>, team: Team, source_label: impl Into<String>) -> Self {
        let timestamp = Local::now();
        let sequence = EVENT_SEQUENCE.fetch_add(1, Ordering::Relaxed);
        Self {
            id: format!("{}-{}", timestamp.timestamp_millis(), sequence),
            timestamp,
            event_name: event_name.into(),
            team,
            source_label: source_label.into(),
            player: None,
            zone: None,
            metadata: None,
        }
    }
}

/// Session-wide match state.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct GameState {
    pub current_team: Team,
    pub last_action: Option<String>,
}

impl GameState {
    pub fn toggle_team(&mut self) -> Team {
        self.current_team = self.current_team.other();
        self.current_team
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn player(id: &str) -> Player {
        Player {
            id: id.to_string(),
            name: format!("Player {}", id),
            number: None,
        }
    }

    #[test]
    fn lineup_filters_selectable_players() {
        let roster = Roster {
            players: vec![player("1"), player("2"), player("3")],
            lineup: Some(vec!["3".to_string(), "1".to_string()]),
        };
        let ids: Vec<String> = roster.selectable().into_iter().map(|p| p.id).collect();
        assert_eq!(ids, vec!["1", "3"]);
    }

    #[test]
    fn empty_lineup_match_falls_back_to_full_squad() {
        let roster = Roster {
            players: vec![player("1"), player("2")],
            lineup: Some(vec!["99".to_string()]),
        };
        assert_eq!(roster.selectable().len(), 2);
    }

    #[test]
    fn event_ids_are_unique() {
        let a = LoggedEvent::new("shot", Team::Home, "A");
        let b = LoggedEvent::new("shot", Team::Home, "A");
        assert_ne!(a.id, b.id);
    }

    #[test]
    fn toggling_team_flips_between_sides() {
        let mut state = GameState::default();
        assert_eq!(state.toggle_team(), Team::Away);
        assert_eq!(state.toggle_team(), Team::Home);
    }
}
