//! The tagging engine
//!
//! [`TagEngine`] owns every piece of mutable input state and is driven by a
//! single periodic tick (see [`handle`]). One tick runs the whole pipeline:
//!
//! ```text
//!  commit buffer ──► due events delivered
//!  sample ──► thirds preview ──► edges ──┬─► open selector?  ──► selector input
//!                                        └─► combo engine ──► intents ──► dispatch
//!
//!  dispatch:  cancel? ─► commit buffer retract
//!             pass workflow (post-match) ─► needs player / zone? ─► open selector
//!                                                              └─► commit buffer
//! ```
//!
//! All mutation happens inside `tick`, `key_down`/`key_up` and the setters,
//! which the handle serialises on one task.

pub mod combo;
pub mod commit;
pub mod handle;
pub mod pass;
pub mod selector;
pub mod thirds;

pub use combo::{EventIntent, Intent, IntentKind};
pub use commit::CommitBuffer;
pub use handle::{EngineCommand, EngineError, EngineHandle};
pub use pass::{PassState, PassWorkflow};
pub use selector::{ActiveModal, Direction, PlayerSelector, SelectorInput, ZoneSelector};
pub use thirds::{Third, ThirdsZoneState};

use crate::config::{AppConfig, TimingConfig};
use crate::controller::buttons::A;
use crate::controller::edges::{EdgeKind, TickState};
use crate::controller::keyboard::{self, Shortcut, ShortcutTable};
use crate::controller::sampler::{self, DeviceSnapshot, VirtualController};
use crate::event::{EventMetadata, GameState, LoggedEvent, Roster, Team};
use crate::mapping::{self, AnalysisMode, EventDefinition, MappingTables};
use egui::Key;
use pass::PassRouting;
use std::collections::{HashMap, HashSet};
use std::sync::Arc;
use std::time::{Duration, Instant};
use tokio::sync::mpsc;
use tracing::{debug, error, info, warn};

#[derive(Clone, Debug)]
pub struct EngineSettings {
    pub hold_threshold: Duration,
    pub commit_delay: Duration,
    /// Analog value above which LT/RT count as pressed.
    pub trigger_threshold: f32,
    /// Right stick deflection needed for a zone preview.
    pub stick_deadzone: f32,
    pub player_grid_columns: usize,
}

impl Default for EngineSettings {
    fn default() -> Self {
        Self::from(&TimingConfig::default())
    }
}

impl From<&TimingConfig> for EngineSettings {
    fn from(timing: &TimingConfig) -> Self {
        Self {
            hold_threshold: Duration::from_millis(timing.hold_threshold_ms),
            commit_delay: Duration::from_millis(timing.commit_delay_ms),
            trigger_threshold: timing.trigger_threshold,
            stick_deadzone: timing.stick_deadzone,
            player_grid_columns: timing.player_grid_columns,
        }
    }
}

/// Request to the external video transport.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PlaybackRequest {
    Pause,
    Resume,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ConnectionStatus {
    Disconnected,
    /// Only the keyboard overlay is feeding input.
    Virtual,
    Connected(String),
}

pub struct TagEngine {
    settings: EngineSettings,
    mode: AnalysisMode,
    definitions: Vec<EventDefinition>,
    tables: Arc<MappingTables>,

    keyboard_emulation: bool,
    overlay: VirtualController,
    shortcuts: ShortcutTable,
    held_shortcuts: HashSet<Key>,

    ticks: TickState,
    /// Whether the previous tick produced a sample.
    sampling: bool,
    thirds: ThirdsZoneState,
    modal: ActiveModal,
    pass: PassWorkflow,
    commits: CommitBuffer,

    game: GameState,
    /// `last_action` before the most recent event was built.
    previous_action: Option<String>,
    rosters: HashMap<Team, Roster>,
    status: ConnectionStatus,

    sink: mpsc::Sender<LoggedEvent>,
    playback: mpsc::Sender<PlaybackRequest>,
}

impl std::fmt::Debug for TagEngine {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TagEngine")
            .field("mode", &self.mode)
            .field("status", &self.status)
            .field("keyboard_emulation", &self.keyboard_emulation)
            .field("modal_open", &self.modal.is_open())
            .field("pass", &self.pass.state())
            .field("pending_commits", &self.commits.len())
            .field("game", &self.game)
            .finish()
    }
}

impl TagEngine {
    pub fn new(
        settings: EngineSettings,
        mode: AnalysisMode,
        definitions: Vec<EventDefinition>,
        sink: mpsc::Sender<LoggedEvent>,
        playback: mpsc::Sender<PlaybackRequest>,
    ) -> Self {
        info!("Creating tag engine in {} mode with {:?}", mode, settings);
        let tables = Arc::new(mapping::resolve(&definitions, mode));
        Self {
            thirds: ThirdsZoneState::new(settings.stick_deadzone),
            commits: CommitBuffer::new(settings.commit_delay),
            settings,
            mode,
            definitions,
            tables,
            keyboard_emulation: false,
            overlay: VirtualController::default(),
            shortcuts: ShortcutTable::default(),
            held_shortcuts: HashSet::new(),
            ticks: TickState::new(),
            sampling: false,
            modal: ActiveModal::None,
            pass: PassWorkflow::default(),
            game: GameState::default(),
            previous_action: None,
            rosters: HashMap::new(),
            status: ConnectionStatus::Disconnected,
            sink,
            playback,
        }
    }

    pub fn from_config(
        config: &AppConfig,
        sink: mpsc::Sender<LoggedEvent>,
        playback: mpsc::Sender<PlaybackRequest>,
    ) -> Self {
        let mut engine = Self::new(
            EngineSettings::from(&config.timing),
            config.mode,
            config.events.clone(),
            sink,
            playback,
        );
        engine.set_keyboard_emulation(config.keyboard_emulation);
        engine.set_shortcuts(&config.shortcuts);
        engine.set_roster(Team::Home, config.rosters.home.clone());
        engine.set_roster(Team::Away, config.rosters.away.clone());
        engine
    }

    // Accessors

    pub fn mode(&self) -> AnalysisMode {
        self.mode
    }

    pub fn tables(&self) -> Arc<MappingTables> {
        Arc::clone(&self.tables)
    }

    pub fn game_state(&self) -> &GameState {
        &self.game
    }

    pub fn thirds(&self) -> &ThirdsZoneState {
        &self.thirds
    }

    pub fn modal(&self) -> &ActiveModal {
        &self.modal
    }

    pub fn pass_state(&self) -> PassState {
        self.pass.state()
    }

    pub fn status(&self) -> &ConnectionStatus {
        &self.status
    }

    pub fn pending_commits(&self) -> usize {
        self.commits.len()
    }

    pub fn keyboard_emulation(&self) -> bool {
        self.keyboard_emulation
    }

    // Configuration

    /// Replaces the event definitions and swaps in freshly resolved tables.
    pub fn set_definitions(&mut self, definitions: Vec<EventDefinition>) {
        info!("Received {} event definitions", definitions.len());
        self.definitions = definitions;
        self.tables = Arc::new(mapping::resolve(&self.definitions, self.mode));
    }

    pub fn set_mode(&mut self, mode: AnalysisMode) {
        if mode == self.mode {
            return;
        }
        info!("Switching analysis mode {} -> {}", self.mode, mode);
        self.mode = mode;
        self.tables = Arc::new(mapping::resolve(&self.definitions, mode));
        self.pass.reset();
    }

    pub fn set_keyboard_emulation(&mut self, enabled: bool) {
        if enabled != self.keyboard_emulation {
            info!(
                "Keyboard controller emulation {}",
                if enabled { "enabled" } else { "disabled" }
            );
            // Overlay buttons vanish without a release edge.
            self.ticks.reset();
        }
        self.keyboard_emulation = enabled;
        self.overlay.clear();
        self.held_shortcuts.clear();
    }

    pub fn set_shortcuts(&mut self, shortcuts: &[Shortcut]) {
        self.shortcuts = ShortcutTable::new(shortcuts);
        debug!("Loaded {} keyboard shortcuts", self.shortcuts.len());
    }

    pub fn set_roster(&mut self, team: Team, roster: Roster) {
        debug!("Roster for {}: {} players", team, roster.players.len());
        self.rosters.insert(team, roster);
    }

    pub fn set_settings(&mut self, settings: EngineSettings) {
        self.thirds.set_deadzone(settings.stick_deadzone);
        self.commits.set_delay(settings.commit_delay);
        self.settings = settings;
    }

    pub fn apply(&mut self, command: EngineCommand, now: Instant) {
        debug!("Applying {:?}", command);
        match command {
            EngineCommand::KeyDown(key) => self.key_down(key, now),
            EngineCommand::KeyUp(key) => self.key_up(key),
            EngineCommand::FocusLost => self.focus_lost(),
            EngineCommand::SetMode(mode) => self.set_mode(mode),
            EngineCommand::SetKeyboardEmulation(enabled) => self.set_keyboard_emulation(enabled),
            EngineCommand::SetRoster(team, roster) => self.set_roster(team, roster),
        }
    }

    // Input

    pub fn key_down(&mut self, key: Key, now: Instant) {
        if self.keyboard_emulation {
            if let Some(index) = keyboard::virtual_button(key) {
                self.overlay.set_button(index, true);
            } else if let Some((axis, value)) = keyboard::virtual_stick(key) {
                self.overlay.set_axis(axis, value);
            }
            return;
        }

        // Key repeat would otherwise log the same shortcut many times.
        if !self.held_shortcuts.insert(key) {
            return;
        }
        if let Some(event_name) = self.shortcuts.event_for(key).map(str::to_string) {
            self.dispatch(
                EventIntent {
                    event_name,
                    source_label: format!("key {:?}", key),
                    kind: IntentKind::Shortcut,
                    duration: None,
                },
                now,
            );
        }
    }

    pub fn key_up(&mut self, key: Key) {
        if self.keyboard_emulation {
            if let Some(index) = keyboard::virtual_button(key) {
                self.overlay.set_button(index, false);
            } else if let Some((axis, _)) = keyboard::virtual_stick(key) {
                self.overlay.set_axis(axis, 0.0);
            }
            return;
        }
        self.held_shortcuts.remove(&key);
    }

    /// Window focus lost: no release edge will arrive for buttons held now.
    pub fn focus_lost(&mut self) {
        info!("Focus lost, releasing all buttons");
        self.ticks.reset();
        self.overlay.clear();
        self.held_shortcuts.clear();
    }

    /// Runs one engine cycle.
    pub fn tick(&mut self, now: Instant, physical: Option<&DeviceSnapshot>) {
        for event in self.commits.take_due(now) {
            self.deliver(event);
        }

        self.update_status(physical);
        let overlay = self.keyboard_emulation.then_some(&self.overlay);
        let Some(sample) = sampler::merge(physical, overlay, self.settings.trigger_threshold)
        else {
            if self.sampling {
                debug!("Input lost, releasing all buttons");
                self.ticks.reset();
                self.sampling = false;
            }
            return;
        };
        self.sampling = true;

        self.thirds.update(&sample);
        let edges = self.ticks.observe(&sample, now);

        if edges
            .iter()
            .any(|e| e.index == A && e.kind == EdgeKind::Rising)
        {
            self.thirds.confirm();
        }

        if self.modal.is_open() {
            for edge in edges.iter().filter(|e| e.kind == EdgeKind::Rising) {
                let Some(input) = SelectorInput::from_button(edge.index) else {
                    continue;
                };
                if let Some(mut event) = self.modal.handle(input) {
                    // A zone picked in the selector beats the thirds preview.
                    let confirmed = self.thirds.take_confirmed();
                    if event.zone.is_none() {
                        event.zone = confirmed;
                    }
                    self.deliver(event);
                    self.request_playback(PlaybackRequest::Resume);
                    break;
                }
            }
            // Whatever is held now belongs to the selector, not to a later tap.
            self.ticks.consume_all_pressed();
            return;
        }

        let tables = Arc::clone(&self.tables);
        let intents = combo::detect_intents(
            &edges,
            &sample,
            &tables,
            &mut self.ticks,
            self.settings.hold_threshold,
        );
        for intent in intents {
            match intent {
                Intent::Event(intent) => self.dispatch(intent, now),
                Intent::ToggleTeam => {
                    let team = self.game.toggle_team();
                    info!("Team toggled to {}", team);
                }
            }
        }
    }

    /// Routes one intent: cancel, pass workflow, selectors, commit buffer.
    pub fn dispatch(&mut self, intent: EventIntent, now: Instant) {
        if self.modal.is_open() {
            debug!("Selector open, ignoring '{}'", intent.event_name);
            return;
        }

        if intent.event_name == mapping::CANCEL {
            match self.commits.cancel_last() {
                Some(cancelled) => self.retract(&cancelled),
                None => debug!("Nothing pending to cancel"),
            }
            return;
        }

        let mut event_name = intent.event_name.clone();
        if self.mode == AnalysisMode::PostMatch {
            match self.pass.route(&event_name) {
                PassRouting::Unchanged => {}
                PassRouting::LogStart => {
                    let event = self.build_event(&event_name, &intent);
                    self.commits.schedule(event, now);
                    return;
                }
                PassRouting::Reinterpreted(name) => event_name = name.to_string(),
            }
        }

        let definition = self
            .tables
            .definition(&event_name)
            .cloned()
            .unwrap_or_else(|| EventDefinition {
                name: event_name.clone(),
                ..Default::default()
            });
        let event = self.build_event(&event_name, &intent);

        if event_name == mapping::TURNOVER {
            let team = self.game.toggle_team();
            info!("Turnover, possession now {}", team);
        }

        if definition.requires_player(self.mode) {
            let players = self
                .rosters
                .get(&event.team)
                .map(Roster::selectable)
                .unwrap_or_default();
            if players.is_empty() {
                warn!("No roster for {}, logging '{}' without player", event.team, event_name);
            } else {
                info!("Opening player selector for '{}'", event_name);
                self.open_modal(ActiveModal::PlayerSelect {
                    selector: PlayerSelector::new(players, self.settings.player_grid_columns),
                    pending: event,
                });
                return;
            }
        } else if definition.requires_zone(self.mode) && event.zone.is_none() {
            info!("Opening zone selector for '{}'", event_name);
            self.open_modal(ActiveModal::ZoneSelect {
                selector: ZoneSelector::new(self.thirds.preview_zone),
                pending: event,
            });
            return;
        }

        self.commits.schedule(event, now);
    }

    /// Undoes the session state changed by dispatching `cancelled`.
    fn retract(&mut self, cancelled: &LoggedEvent) {
        match cancelled.event_name.as_str() {
            mapping::PASS_START => self.pass.reset(),
            mapping::TURNOVER => {
                let team = self.game.toggle_team();
                info!("Turnover cancelled, possession back to {}", team);
            }
            _ => {}
        }
        if self.game.last_action.as_deref() == Some(cancelled.event_name.as_str()) {
            self.game.last_action = self.previous_action.take();
        }
    }

    fn build_event(&mut self, event_name: &str, intent: &EventIntent) -> LoggedEvent {
        let mut event =
            LoggedEvent::new(event_name, self.game.current_team, intent.source_label.clone());
        event.zone = self.thirds.take_confirmed();

        let definition = self
            .tables
            .definition(event_name)
            .or_else(|| self.tables.definition(&intent.event_name));
        let duration_hint_ms = intent.duration.map(|d| d.as_millis() as u64);
        if definition.is_some() || duration_hint_ms.is_some() {
            event.metadata = Some(EventMetadata {
                category: definition.and_then(|d| d.category.clone()),
                duration_hint_ms,
                tags: definition.map(|d| d.tags.clone()).unwrap_or_default(),
            });
        }

        self.previous_action = self.game.last_action.replace(event_name.to_string());
        event
    }

    fn open_modal(&mut self, modal: ActiveModal) {
        self.modal = modal;
        self.ticks.consume_all_pressed();
        self.request_playback(PlaybackRequest::Pause);
    }

    fn deliver(&self, event: LoggedEvent) {
        info!(
            "Delivering '{}' ({}) team={} player={:?} zone={:?}",
            event.event_name,
            event.id,
            event.team,
            event.player.as_ref().map(|p| p.name.as_str()),
            event.zone
        );
        if let Err(e) = self.sink.try_send(event) {
            error!("Failed to deliver event: {}", e);
        }
    }

    fn request_playback(&self, request: PlaybackRequest) {
        if let Err(e) = self.playback.try_send(request) {
            warn!("Failed to send playback request {:?}: {}", request, e);
        }
    }

    fn update_status(&mut self, physical: Option<&DeviceSnapshot>) {
        let status = match physical {
            Some(device) => ConnectionStatus::Connected(device.name.clone()),
            None if self.keyboard_emulation => ConnectionStatus::Virtual,
            None => ConnectionStatus::Disconnected,
        };
        if status != self.status {
            match &status {
                ConnectionStatus::Connected(name) => info!("Controller connected: {}", name),
                ConnectionStatus::Virtual => info!("Using keyboard as controller"),
                ConnectionStatus::Disconnected => warn!("No controller connected"),
            }
            self.status = status;
        }
    }
}
