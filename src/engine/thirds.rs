//! Thirds preview: triggers pick the third, the right stick picks the cell
//!
//! The pitch grid has 3 columns and 6 rows, numbered row by row from 1 to 18.
//! Each third is a band of two rows:
//!
//! ```text
//!            col 0  col 1  col 2
//! DEFENSE      1      2      3
//!              4      5      6
//! MIDFIELD     7      8      9
//!             10     11     12
//! ATTACK      13     14     15
//!             16     17     18
//! ```
//!
//! The preview follows the stick continuously; only an explicit confirm
//! copies it into `confirmed_zone`.

use crate::controller::buttons::{AXIS_RIGHT_X, AXIS_RIGHT_Y, LT, RT};
use crate::controller::sampler::Sample;
use tracing::{debug, info};

pub const GRID_COLUMNS: u8 = 3;
pub const GRID_ROWS: u8 = 6;
pub const ZONE_COUNT: u8 = GRID_COLUMNS * GRID_ROWS;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Third {
    Defense,
    #[default]
    Midfield,
    Attack,
}

impl Third {
    fn row_offset(self) -> u8 {
        match self {
            Third::Defense => 0,
            Third::Midfield => 2,
            Third::Attack => 4,
        }
    }

    /// LT alone selects defense, RT alone attack, anything else midfield.
    pub fn from_triggers(left: bool, right: bool) -> Self {
        match (left, right) {
            (true, false) => Third::Defense,
            (false, true) => Third::Attack,
            _ => Third::Midfield,
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct ThirdsZoneState {
    pub active_third: Third,
    pub preview_zone: Option<u8>,
    pub confirmed_zone: Option<u8>,
    deadzone: f32,
}

impl ThirdsZoneState {
    pub fn new(deadzone: f32) -> Self {
        Self {
            deadzone,
            ..Default::default()
        }
    }

    pub fn set_deadzone(&mut self, deadzone: f32) {
        self.deadzone = deadzone;
    }

    /// Recomputes third and preview from the current sample.
    pub fn update(&mut self, sample: &Sample) {
        self.active_third = Third::from_triggers(sample.pressed(LT), sample.pressed(RT));
        let preview = preview_zone(
            self.active_third,
            sample.axis(AXIS_RIGHT_X),
            sample.axis(AXIS_RIGHT_Y),
            self.deadzone,
        );
        if preview != self.preview_zone {
            debug!("Zone preview {:?} -> {:?}", self.preview_zone, preview);
            self.preview_zone = preview;
        }
    }

    /// Confirms the current preview. Returns the confirmed zone, if any.
    pub fn confirm(&mut self) -> Option<u8> {
        let zone = self.preview_zone?;
        info!("Confirmed zone {} ({:?})", zone, self.active_third);
        self.confirmed_zone = Some(zone);
        Some(zone)
    }

    /// Hands the confirmed zone to the next logged event.
    pub fn take_confirmed(&mut self) -> Option<u8> {
        self.confirmed_zone.take()
    }
}

/// Candidate zone for a stick position, `None` while the stick rests inside
/// the deadzone on both axes.
pub fn preview_zone(third: Third, rx: f32, ry: f32, deadzone: f32) -> Option<u8> {
    if rx.abs() <= deadzone && ry.abs() <= deadzone {
        return None;
    }
    let column = if rx < -deadzone {
        0
    } else if rx > deadzone {
        2
    } else {
        1
    };
    let row = if ry > deadzone { 1 } else { 0 };
    Some((third.row_offset() + row) * GRID_COLUMNS + column + 1)
}
