//! Secondary selection: player picker and zone picker
//!
//! While a selector is open it owns the D-pad, A and B:
//!
//! ```text
//!            ┌──── D-pad: move cursor (clamped) ────┐
//!            ▼                                      │
//! closed ──open──► open ──A──► confirm: attach selection, deliver ──► closed
//!                       └─B──► cancel:  deliver without selection ──► closed
//! ```
//!
//! The pending event travels inside the modal, so there is never a pending
//! event without an open selector or vice versa.

use super::thirds::{GRID_COLUMNS, ZONE_COUNT};
use crate::controller::buttons::{A, B, DPAD_DOWN, DPAD_LEFT, DPAD_RIGHT, DPAD_UP};
use crate::event::{LoggedEvent, Player, PlayerRef};
use tracing::{debug, info};

/// Default start cell of the zone selector (centre of midfield).
pub const DEFAULT_ZONE: u8 = 8;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Direction {
    Up,
    Down,
    Left,
    Right,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SelectorInput {
    Navigate(Direction),
    Confirm,
    Cancel,
}

impl SelectorInput {
    /// Selector meaning of a rising edge, if any.
    pub fn from_button(index: usize) -> Option<Self> {
        match index {
            A => Some(SelectorInput::Confirm),
            B => Some(SelectorInput::Cancel),
            DPAD_UP => Some(SelectorInput::Navigate(Direction::Up)),
            DPAD_DOWN => Some(SelectorInput::Navigate(Direction::Down)),
            DPAD_LEFT => Some(SelectorInput::Navigate(Direction::Left)),
            DPAD_RIGHT => Some(SelectorInput::Navigate(Direction::Right)),
            _ => None,
        }
    }
}

/// Moves a cursor over a row-major grid of `len` cells, clamping at the edges.
fn step(selected: usize, len: usize, columns: usize, direction: Direction) -> usize {
    if len == 0 || columns == 0 {
        return 0;
    }
    let column = selected % columns;
    match direction {
        Direction::Left if column > 0 => selected - 1,
        Direction::Right if column + 1 < columns && selected + 1 < len => selected + 1,
        Direction::Up if selected >= columns => selected - columns,
        Direction::Down if selected + columns < len => selected + columns,
        _ => selected,
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct PlayerSelector {
    players: Vec<Player>,
    columns: usize,
    selected: usize,
}

impl PlayerSelector {
    pub fn new(players: Vec<Player>, columns: usize) -> Self {
        Self {
            players,
            columns: columns.max(1),
            selected: 0,
        }
    }

    pub fn navigate(&mut self, direction: Direction) {
        self.selected = step(self.selected, self.players.len(), self.columns, direction);
        debug!("Player cursor at {}", self.selected);
    }

    pub fn selected_index(&self) -> usize {
        self.selected
    }

    pub fn selected_player(&self) -> Option<&Player> {
        self.players.get(self.selected)
    }

    pub fn players(&self) -> &[Player] {
        &self.players
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ZoneSelector {
    selected: u8,
}

impl ZoneSelector {
    pub fn new(start: Option<u8>) -> Self {
        let selected = start
            .filter(|z| (1..=ZONE_COUNT).contains(z))
            .unwrap_or(DEFAULT_ZONE);
        Self { selected }
    }

    pub fn navigate(&mut self, direction: Direction) {
        let index = step(
            usize::from(self.selected - 1),
            usize::from(ZONE_COUNT),
            usize::from(GRID_COLUMNS),
            direction,
        );
        // step never leaves 0..ZONE_COUNT
        self.selected = index as u8 + 1;
        debug!("Zone cursor at {}", self.selected);
    }

    pub fn selected_zone(&self) -> u8 {
        self.selected
    }
}

/// The modal currently intercepting input, together with its pending event.
#[derive(Debug, Clone, Default)]
pub enum ActiveModal {
    #[default]
    None,
    PlayerSelect {
        selector: PlayerSelector,
        pending: LoggedEvent,
    },
    ZoneSelect {
        selector: ZoneSelector,
        pending: LoggedEvent,
    },
}

impl ActiveModal {
    pub fn is_open(&self) -> bool {
        !matches!(self, ActiveModal::None)
    }

    pub fn pending(&self) -> Option<&LoggedEvent> {
        match self {
            ActiveModal::None => None,
            ActiveModal::PlayerSelect { pending, .. } | ActiveModal::ZoneSelect { pending, .. } => {
                Some(pending)
            }
        }
    }

    /// Feeds one input into the open selector.
    ///
    /// Returns the finished event when the input closed the selector.
    pub fn handle(&mut self, input: SelectorInput) -> Option<LoggedEvent> {
        match input {
            SelectorInput::Navigate(direction) => {
                match self {
                    ActiveModal::PlayerSelect { selector, .. } => selector.navigate(direction),
                    ActiveModal::ZoneSelect { selector, .. } => selector.navigate(direction),
                    ActiveModal::None => {}
                }
                None
            }
            SelectorInput::Confirm => match std::mem::take(self) {
                ActiveModal::PlayerSelect {
                    selector,
                    mut pending,
                } => {
                    pending.player = selector.selected_player().map(PlayerRef::from);
                    info!(
                        "Player selected for '{}': {:?}",
                        pending.event_name,
                        pending.player.as_ref().map(|p| p.name.as_str())
                    );
                    Some(pending)
                }
                ActiveModal::ZoneSelect {
                    selector,
                    mut pending,
                } => {
                    pending.zone = Some(selector.selected_zone());
                    info!(
                        "Zone {} selected for '{}'",
                        selector.selected_zone(),
                        pending.event_name
                    );
                    Some(pending)
                }
                ActiveModal::None => None,
            },
            SelectorInput::Cancel => match std::mem::take(self) {
                ActiveModal::PlayerSelect { pending, .. }
                | ActiveModal::ZoneSelect { pending, .. } => {
                    info!("Selection skipped for '{}'", pending.event_name);
                    Some(pending)
                }
                ActiveModal::None => None,
            },
        }
    }
}
