//! Configuration file
//!
//! Everything the engine takes from outside lives in one TOML file under the
//! user's config directory (`<config_dir>/tagpad/config.toml`). A commented
//! default is written on first start so the application always has a usable
//! mapping.

use crate::controller::keyboard::Shortcut;
use crate::event::Roster;
use crate::mapping::{AnalysisMode, EventDefinition, RawBinding};
use egui::Key;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use tracing::{debug, info};

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("No user config directory available")]
    NoConfigDir,

    #[error("Failed to access {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Invalid config: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("Failed to serialize config: {0}")]
    Serialize(#[from] toml::ser::Error),
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct TimingConfig {
    /// Engine ticks per second.
    pub tick_hz: u32,
    pub hold_threshold_ms: u64,
    /// Grace period during which a logged event can still be cancelled.
    pub commit_delay_ms: u64,
    pub trigger_threshold: f32,
    pub stick_deadzone: f32,
    pub player_grid_columns: usize,
}

impl Default for TimingConfig {
    fn default() -> Self {
        Self {
            tick_hz: 60,
            hold_threshold_ms: 500,
            commit_delay_ms: 600,
            trigger_threshold: 0.2,
            stick_deadzone: 0.4,
            player_grid_columns: 4,
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RosterConfig {
    pub home: Roster,
    pub away: Roster,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    pub mode: AnalysisMode,
    pub keyboard_emulation: bool,
    pub timing: TimingConfig,
    pub events: Vec<EventDefinition>,
    pub shortcuts: Vec<Shortcut>,
    pub rosters: RosterConfig,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            mode: AnalysisMode::Live,
            keyboard_emulation: false,
            timing: TimingConfig::default(),
            events: default_events(),
            shortcuts: vec![
                Shortcut {
                    key: Key::S,
                    event: "shot_end".to_string(),
                },
                Shortcut {
                    key: Key::P,
                    event: "pass_start".to_string(),
                },
                Shortcut {
                    key: Key::Backspace,
                    event: "cancel".to_string(),
                },
            ],
            rosters: RosterConfig::default(),
        }
    }
}

impl AppConfig {
    pub fn default_path() -> Result<PathBuf, ConfigError> {
        let dir = dirs::config_dir().ok_or(ConfigError::NoConfigDir)?;
        Ok(dir.join("tagpad").join("config.toml"))
    }

    pub fn from_toml_str(content: &str) -> Result<Self, ConfigError> {
        Ok(toml::from_str(content)?)
    }

    pub fn to_toml_string(&self) -> Result<String, ConfigError> {
        Ok(toml::to_string_pretty(self)?)
    }

    pub async fn load(path: &Path) -> Result<Self, ConfigError> {
        debug!("Loading config from {}", path.display());
        let content = tokio::fs::read_to_string(path)
            .await
            .map_err(|source| ConfigError::Io {
                path: path.to_path_buf(),
                source,
            })?;
        let config = Self::from_toml_str(&content)?;
        info!(
            "Loaded config: {} mode, {} event definitions, {} shortcuts",
            config.mode,
            config.events.len(),
            config.shortcuts.len()
        );
        Ok(config)
    }

    pub async fn save(&self, path: &Path) -> Result<(), ConfigError> {
        let io_error = |source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        };
        if let Some(parent) = path.parent() {
            tokio::fs::create_dir_all(parent).await.map_err(io_error)?;
        }
        tokio::fs::write(path, self.to_toml_string()?)
            .await
            .map_err(io_error)?;
        info!("Saved config to {}", path.display());
        Ok(())
    }

    /// Writes the default config if `path` does not exist yet.
    pub async fn ensure_default(path: &Path) -> Result<(), ConfigError> {
        if tokio::fs::try_exists(path).await.unwrap_or(false) {
            return Ok(());
        }
        info!("No config at {}, writing defaults", path.display());
        Self::default().save(path).await
    }
}

fn bind(button_index: i64, modifier: Option<&str>, hold: bool, mode: AnalysisMode) -> RawBinding {
    RawBinding {
        button_index: Some(button_index),
        modifier: modifier.map(str::to_string),
        hold,
        mode: Some(mode.to_string()),
    }
}

fn event(name: &str, label: &str, category: &str, bindings: Vec<RawBinding>) -> EventDefinition {
    EventDefinition {
        name: name.to_string(),
        label: Some(label.to_string()),
        category: Some(category.to_string()),
        bindings,
        ..Default::default()
    }
}

/// Default pad layout, identical in both modes except for the pressing hold.
fn default_events() -> Vec<EventDefinition> {
    use AnalysisMode::{Live, PostMatch};

    let both = |index: i64, modifier: Option<&str>| {
        vec![bind(index, modifier, false, Live), bind(index, modifier, false, PostMatch)]
    };

    vec![
        event("shot_end", "Shot", "shooting", both(0, None)),
        event("cancel", "Cancel last", "control", both(1, None)),
        event("pass_start", "Pass", "passing", both(2, None)),
        event("pressing", "Pressing", "defending", vec![bind(2, None, true, Live)]),
        event("foul", "Foul", "discipline", both(3, None)),
        event("turnover", "Turnover", "possession", both(9, None)),
        event("corner", "Corner", "set_piece", both(0, Some("lb"))),
        event("free_kick", "Free kick", "set_piece", both(2, Some("lb"))),
        event("throw_in", "Throw-in", "set_piece", both(3, Some("lb"))),
        event("goal", "Goal", "shooting", both(3, Some("rb"))),
        event("tackle", "Tackle", "defending", both(0, Some("rt"))),
        event("interception", "Interception", "defending", both(2, Some("rt"))),
        event("dribble", "Dribble", "attacking", both(0, Some("dpad_up"))),
        event("save", "Save", "goalkeeping", both(0, Some("view"))),
    ]
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::mapping::resolve;

    #[test]
    fn default_config_survives_toml() {
        let config = AppConfig::default();
        let text = config.to_toml_string().unwrap();
        assert_eq!(AppConfig::from_toml_str(&text).unwrap(), config);
    }

    #[test]
    fn default_events_resolve_without_conflicts() {
        let config = AppConfig::default();
        let live = resolve(&config.events, AnalysisMode::Live);
        let post = resolve(&config.events, AnalysisMode::PostMatch);

        assert_eq!(live.buttons.len(), 5);
        assert_eq!(live.holds.len(), 1);
        assert_eq!(live.combos.len(), 8);
        assert!(post.holds.is_empty());
        assert!(live.button(5).is_none(), "RB stays free for the team toggle");
    }

    #[test]
    fn partial_file_uses_defaults_and_keeps_bad_bindings_parseable() {
        let config = AppConfig::from_toml_str(
            r#"
            mode = "post_match"

            [timing]
            commit_delay_ms = 250

            [[events]]
            name = "shot_end"

            [[events.bindings]]
            button_index = 0
            mode = "post_match"

            [[events.bindings]]
            button_index = 99
            modifier = "turbo"
            mode = "sometimes"

            [rosters.home]
            lineup = ["7"]
            players = [{ id = "7", name = "Silva" }]
            "#,
        )
        .unwrap();

        assert_eq!(config.mode, AnalysisMode::PostMatch);
        assert_eq!(config.timing.commit_delay_ms, 250);
        assert_eq!(config.timing.hold_threshold_ms, 500);
        assert_eq!(config.events[0].bindings.len(), 2);
        assert_eq!(config.rosters.home.selectable().len(), 1);
        assert!(config.rosters.away.players.is_empty());

        let tables = resolve(&config.events, config.mode);
        assert_eq!(tables.buttons.len(), 1);
    }

    #[test]
    fn shortcuts_use_key_names() {
        let config = AppConfig::from_toml_str(
            r#"
            [[shortcuts]]
            key = "G"
            event = "goal"
            "#,
        )
        .unwrap();
        assert_eq!(config.shortcuts[0].key, Key::G);
    }

    #[tokio::test]
    async fn ensure_default_writes_once() {
        let dir = std::env::temp_dir().join(format!(
            "tagpad-config-test-{}-{}",
            std::process::id(),
            chrono::Local::now().timestamp_nanos_opt().unwrap_or_default()
        ));
        let path = dir.join("config.toml");

        AppConfig::ensure_default(&path).await.unwrap();
        let mut loaded = AppConfig::load(&path).await.unwrap();
        assert_eq!(loaded, AppConfig::default());

        loaded.mode = AnalysisMode::PostMatch;
        loaded.save(&path).await.unwrap();
        AppConfig::ensure_default(&path).await.unwrap();
        assert_eq!(AppConfig::load(&path).await.unwrap().mode, AnalysisMode::PostMatch);

        let _ = tokio::fs::remove_dir_all(&dir).await;
    }
}
