//! Standard gamepad button layout
//!
//! Indices follow the standard (W3C) gamepad order, which is also the order
//! the event configuration refers to:
//!
//! ```text
//!  0 A        4 LB      8 View     12 D-Pad Up
//!  1 B        5 RB      9 Menu     13 D-Pad Down
//!  2 X        6 LT     10 LS       14 D-Pad Left
//!  3 Y        7 RT     11 RS       15 D-Pad Right
//! ```
//!
//! Axes are `0 = left x`, `1 = left y`, `2 = right x`, `3 = right y`, with
//! negative y pointing up.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

pub const BUTTON_COUNT: usize = 16;
pub const AXIS_COUNT: usize = 4;

pub const A: usize = 0;
pub const B: usize = 1;
pub const X: usize = 2;
pub const Y: usize = 3;
pub const LB: usize = 4;
pub const RB: usize = 5;
pub const LT: usize = 6;
pub const RT: usize = 7;
pub const VIEW: usize = 8;
pub const MENU: usize = 9;
pub const LEFT_STICK: usize = 10;
pub const RIGHT_STICK: usize = 11;
pub const DPAD_UP: usize = 12;
pub const DPAD_DOWN: usize = 13;
pub const DPAD_LEFT: usize = 14;
pub const DPAD_RIGHT: usize = 15;

pub const AXIS_LEFT_X: usize = 0;
pub const AXIS_LEFT_Y: usize = 1;
pub const AXIS_RIGHT_X: usize = 2;
pub const AXIS_RIGHT_Y: usize = 3;

/// Buttons that can act as the held half of a combo.
///
/// Each of them may still fire its own standalone mapping when pressed and
/// released alone, except the analog triggers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Modifier {
    Lb,
    Rb,
    Lt,
    Rt,
    View,
    Menu,
    DpadUp,
    DpadDown,
    DpadLeft,
    DpadRight,
}

impl Modifier {
    /// Evaluation order for combos when several modifiers are held.
    pub const ALL: [Modifier; 10] = [
        Modifier::Lb,
        Modifier::Rb,
        Modifier::Lt,
        Modifier::Rt,
        Modifier::View,
        Modifier::Menu,
        Modifier::DpadUp,
        Modifier::DpadDown,
        Modifier::DpadLeft,
        Modifier::DpadRight,
    ];

    pub const fn button_index(self) -> usize {
        match self {
            Modifier::Lb => LB,
            Modifier::Rb => RB,
            Modifier::Lt => LT,
            Modifier::Rt => RT,
            Modifier::View => VIEW,
            Modifier::Menu => MENU,
            Modifier::DpadUp => DPAD_UP,
            Modifier::DpadDown => DPAD_DOWN,
            Modifier::DpadLeft => DPAD_LEFT,
            Modifier::DpadRight => DPAD_RIGHT,
        }
    }

    pub fn from_button_index(index: usize) -> Option<Self> {
        Self::ALL.into_iter().find(|m| m.button_index() == index)
    }
}

impl fmt::Display for Modifier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Modifier::Lb => "LB",
            Modifier::Rb => "RB",
            Modifier::Lt => "LT",
            Modifier::Rt => "RT",
            Modifier::View => "View",
            Modifier::Menu => "Menu",
            Modifier::DpadUp => "Up",
            Modifier::DpadDown => "Down",
            Modifier::DpadLeft => "Left",
            Modifier::DpadRight => "Right",
        };
        f.write_str(name)
    }
}

impl FromStr for Modifier {
    type Err = String;

    /// Accepts the config spelling (`dpad_up`) as well as the short button
    /// names shown on controller overlays (`LB`, `up`).
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "lb" => Ok(Modifier::Lb),
            "rb" => Ok(Modifier::Rb),
            "lt" => Ok(Modifier::Lt),
            "rt" => Ok(Modifier::Rt),
            "view" | "select" | "back" => Ok(Modifier::View),
            "menu" | "start" => Ok(Modifier::Menu),
            "dpad_up" | "up" => Ok(Modifier::DpadUp),
            "dpad_down" | "down" => Ok(Modifier::DpadDown),
            "dpad_left" | "left" => Ok(Modifier::DpadLeft),
            "dpad_right" | "right" => Ok(Modifier::DpadRight),
            other => Err(format!("unknown modifier '{}'", other)),
        }
    }
}

/// True for the buttons in the modifier set.
pub fn is_modifier(index: usize) -> bool {
    Modifier::from_button_index(index).is_some()
}

/// Analog triggers only ever act as modifiers.
pub fn is_trigger(index: usize) -> bool {
    index == LT || index == RT
}

/// Human readable button name for log lines and default labels.
pub fn button_name(index: usize) -> &'static str {
    const NAMES: [&str; BUTTON_COUNT] = [
        "A", "B", "X", "Y", "LB", "RB", "LT", "RT", "View", "Menu", "LS", "RS", "Up", "Down",
        "Left", "Right",
    ];
    NAMES.get(index).copied().unwrap_or("?")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn modifier_indices_round_trip_through_lookup() {
        for modifier in Modifier::ALL {
            assert_eq!(
                Modifier::from_button_index(modifier.button_index()),
                Some(modifier)
            );
        }
        assert_eq!(Modifier::from_button_index(A), None);
        assert_eq!(Modifier::from_button_index(RIGHT_STICK), None);
    }

    #[test]
    fn parses_config_and_overlay_spellings() {
        assert_eq!("LB".parse::<Modifier>(), Ok(Modifier::Lb));
        assert_eq!("dpad_left".parse::<Modifier>(), Ok(Modifier::DpadLeft));
        assert_eq!(" start ".parse::<Modifier>(), Ok(Modifier::Menu));
        assert!("turbo".parse::<Modifier>().is_err());
    }

    #[test]
    fn triggers_are_modifiers() {
        assert!(is_modifier(LT) && is_trigger(LT));
        assert!(is_modifier(DPAD_RIGHT) && !is_trigger(DPAD_RIGHT));
        assert!(!is_modifier(X));
    }
}
