//! Event definitions and the button lookup tables derived from them.
//!
//! The configuration describes domain events (`shot_end`, `pass_start`, ...)
//! with any number of raw bindings. The [`resolver`] buckets the bindings
//! that apply to the current [`AnalysisMode`] into three tables:
//!
//! ```text
//! EventDefinition[] ──► resolve(mode) ──┬──► ButtonMapping  (tap release)
//!                                       ├──► ModifierCombo  (modifier held + rising edge)
//!                                       └──► HoldMapping    (held past threshold)
//! ```

pub mod resolver;

pub use resolver::resolve;

use crate::controller::buttons::{self, Modifier};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fmt;
use std::str::FromStr;

/// Event kinds that ask for a player in post-match analysis.
pub const PLAYER_EVENTS: [&str; 9] = [
    "pass_end",
    "shot",
    "shot_end",
    "goal",
    "foul",
    "tackle",
    "interception",
    "dribble",
    "save",
];

/// Event kinds that ask for a pitch zone in post-match analysis.
pub const ZONE_EVENTS: [&str; 3] = ["free_kick", "corner", "throw_in"];

pub const PASS_START: &str = "pass_start";
pub const PASS_END: &str = "pass_end";
pub const CANCEL: &str = "cancel";
pub const TURNOVER: &str = "turnover";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AnalysisMode {
    #[default]
    Live,
    PostMatch,
}

impl fmt::Display for AnalysisMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AnalysisMode::Live => f.write_str("live"),
            AnalysisMode::PostMatch => f.write_str("post_match"),
        }
    }
}

impl FromStr for AnalysisMode {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().replace('-', "_").as_str() {
            "live" => Ok(AnalysisMode::Live),
            "post_match" | "postmatch" => Ok(AnalysisMode::PostMatch),
            other => Err(format!("unknown analysis mode '{}'", other)),
        }
    }
}

/// Binding exactly as it appears in the configuration.
///
/// Fields are kept loose so a single bad entry can be skipped by the
/// resolver instead of rejecting the whole file.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct RawBinding {
    #[serde(default)]
    pub button_index: Option<i64>,
    #[serde(default)]
    pub modifier: Option<String>,
    #[serde(default)]
    pub hold: bool,
    #[serde(default)]
    pub mode: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct EventDefinition {
    pub name: String,
    #[serde(default)]
    pub label: Option<String>,
    #[serde(default)]
    pub category: Option<String>,
    #[serde(default)]
    pub tags: Vec<String>,
    #[serde(default)]
    pub needs_player: Option<bool>,
    #[serde(default)]
    pub needs_zone: Option<bool>,
    #[serde(default)]
    pub bindings: Vec<RawBinding>,
}

impl EventDefinition {
    pub fn display_label(&self) -> &str {
        self.label.as_deref().unwrap_or(&self.name)
    }

    /// Player attribution only happens during post-match analysis.
    pub fn requires_player(&self, mode: AnalysisMode) -> bool {
        mode == AnalysisMode::PostMatch
            && self
                .needs_player
                .unwrap_or_else(|| PLAYER_EVENTS.contains(&self.name.as_str()))
    }

    pub fn requires_zone(&self, mode: AnalysisMode) -> bool {
        mode == AnalysisMode::PostMatch
            && self
                .needs_zone
                .unwrap_or_else(|| ZONE_EVENTS.contains(&self.name.as_str()))
    }
}

/// Fires on tap release.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ButtonMapping {
    pub button_index: usize,
    pub event_name: String,
    pub label: String,
}

/// Fires on the rising edge of `button_index` while `modifier` is held.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ModifierCombo {
    pub modifier: Modifier,
    pub button_index: usize,
    pub event_name: String,
    pub label: String,
}

impl ModifierCombo {
    pub fn source_label(&self) -> String {
        format!("{} + {}", self.modifier, buttons::button_name(self.button_index))
    }
}

/// Fires once per press when the press outlasts the hold threshold.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HoldMapping {
    pub button_index: usize,
    pub event_name: String,
}

/// Lookup tables valid for one mode.
///
/// Built in one go by [`resolve`] and swapped whole by the engine, so readers
/// never see a partially updated table.
#[derive(Debug, Clone, Default)]
pub struct MappingTables {
    pub mode: AnalysisMode,
    pub buttons: HashMap<usize, ButtonMapping>,
    pub combos: HashMap<(Modifier, usize), ModifierCombo>,
    pub holds: HashMap<usize, HoldMapping>,
    pub definitions: HashMap<String, EventDefinition>,
}

impl MappingTables {
    pub fn button(&self, index: usize) -> Option<&ButtonMapping> {
        self.buttons.get(&index)
    }

    pub fn combo(&self, modifier: Modifier, index: usize) -> Option<&ModifierCombo> {
        self.combos.get(&(modifier, index))
    }

    pub fn hold(&self, index: usize) -> Option<&HoldMapping> {
        self.holds.get(&index)
    }

    pub fn definition(&self, event_name: &str) -> Option<&EventDefinition> {
        self.definitions.get(event_name)
    }

    pub fn is_empty(&self) -> bool {
        self.buttons.is_empty() && self.combos.is_empty() && self.holds.is_empty()
    }
}
