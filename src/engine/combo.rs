//! Modifier–combo engine
//!
//! Turns the edges of one tick into intents. Evaluation order inside a tick:
//!
//! 1. holds that crossed the threshold,
//! 2. rising edges completing a combo with a held modifier,
//! 3. falling edges firing tap mappings (or the team toggle fallback).
//!
//! Order alone is not enough: a combo fired on an earlier tick must still
//! suppress a later hold or tap of the same press, so every step also checks
//! the flags kept in [`TickState`].

use crate::controller::buttons::{self, is_modifier, is_trigger, Modifier, RB};
use crate::controller::edges::{ButtonEdge, EdgeKind, TickState};
use crate::controller::sampler::Sample;
use crate::mapping::MappingTables;
use std::time::Duration;
use tracing::debug;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum IntentKind {
    Tap,
    Hold,
    Combo,
    Shortcut,
}

/// An event requested by the operator, before dispatch.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EventIntent {
    pub event_name: String,
    pub source_label: String,
    pub kind: IntentKind,
    pub duration: Option<Duration>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Intent {
    Event(EventIntent),
    /// Unbound RB released on its own.
    ToggleTeam,
}

pub fn detect_intents(
    edges: &[ButtonEdge],
    sample: &Sample,
    tables: &MappingTables,
    state: &mut TickState,
    hold_threshold: Duration,
) -> Vec<Intent> {
    let mut intents = Vec::new();

    for edge in edges {
        let EdgeKind::Held { elapsed } = edge.kind else {
            continue;
        };
        let index = edge.index;
        if elapsed < hold_threshold
            || state.hold_fired(index)
            || state.is_consumed(index)
            || state.combo_fired(index)
        {
            continue;
        }
        if let Some(hold) = tables.hold(index) {
            debug!("Hold on {} after {:?}", buttons::button_name(index), elapsed);
            state.mark_hold_fired(index);
            intents.push(Intent::Event(EventIntent {
                event_name: hold.event_name.clone(),
                source_label: format!("hold {}", buttons::button_name(index)),
                kind: IntentKind::Hold,
                duration: Some(elapsed),
            }));
        }
    }

    for edge in edges.iter().filter(|e| e.kind == EdgeKind::Rising) {
        let index = edge.index;
        let combo = Modifier::ALL
            .into_iter()
            .filter(|m| m.button_index() != index && sample.pressed(m.button_index()))
            .find_map(|m| tables.combo(m, index));
        if let Some(combo) = combo {
            debug!("Combo {} -> '{}'", combo.source_label(), combo.event_name);
            state.mark_combo_fired(combo.modifier.button_index());
            state.consume(index);
            intents.push(Intent::Event(EventIntent {
                event_name: combo.event_name.clone(),
                source_label: combo.source_label(),
                kind: IntentKind::Combo,
                duration: None,
            }));
        }
    }

    for edge in edges {
        let EdgeKind::Falling { duration } = edge.kind else {
            continue;
        };
        let index = edge.index;
        if state.is_consumed(index) || (is_modifier(index) && state.combo_fired(index)) {
            continue;
        }
        if is_trigger(index) {
            continue;
        }
        match tables.button(index) {
            Some(mapping) => intents.push(Intent::Event(EventIntent {
                event_name: mapping.event_name.clone(),
                source_label: buttons::button_name(index).to_string(),
                kind: IntentKind::Tap,
                duration: Some(duration),
            })),
            None if index == RB => intents.push(Intent::ToggleTeam),
            None => debug!("No mapping for {} release", buttons::button_name(index)),
        }
    }

    intents
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::controller::buttons::{A, LB, LT, X, Y};
    use crate::mapping::{resolve, AnalysisMode, EventDefinition, RawBinding};
    use std::time::Instant;

    fn binding(index: usize, modifier: Option<&str>, hold: bool) -> RawBinding {
        RawBinding {
            button_index: Some(index as i64),
            modifier: modifier.map(str::to_string),
            hold,
            mode: Some("live".to_string()),
        }
    }

    fn tables() -> MappingTables {
        let defs = vec![
            EventDefinition {
                name: "shot_end".into(),
                bindings: vec![binding(A, None, false)],
                ..Default::default()
            },
            EventDefinition {
                name: "pressing".into(),
                bindings: vec![binding(A, None, true), binding(X, None, true)],
                ..Default::default()
            },
            EventDefinition {
                name: "corner".into(),
                bindings: vec![binding(A, Some("lb"), false)],
                ..Default::default()
            },
            EventDefinition {
                name: "lb_tap".into(),
                bindings: vec![binding(LB, None, false)],
                ..Default::default()
            },
            EventDefinition {
                name: "lt_tap".into(),
                bindings: vec![binding(LT, None, false)],
                ..Default::default()
            },
        ];
        resolve(&defs, AnalysisMode::Live)
    }

    struct Script {
        state: TickState,
        tables: MappingTables,
        t0: Instant,
    }

    impl Script {
        fn new() -> Self {
            Self {
                state: TickState::new(),
                tables: tables(),
                t0: Instant::now(),
            }
        }

        fn tick(&mut self, at_ms: u64, pressed: &[usize]) -> Vec<Intent> {
            let sample = Sample::with_pressed(pressed);
            let edges = self
                .state
                .observe(&sample, self.t0 + Duration::from_millis(at_ms));
            detect_intents(
                &edges,
                &sample,
                &self.tables,
                &mut self.state,
                Duration::from_millis(500),
            )
        }
    }

    fn names(intents: &[Intent]) -> Vec<String> {
        intents
            .iter()
            .map(|i| match i {
                Intent::Event(e) => e.event_name.clone(),
                Intent::ToggleTeam => "<toggle>".to_string(),
            })
            .collect()
    }

    #[test]
    fn short_press_fires_tap_on_release() {
        let mut script = Script::new();
        assert!(script.tick(0, &[A]).is_empty());
        assert!(script.tick(100, &[A]).is_empty());
        assert_eq!(names(&script.tick(200, &[])), vec!["shot_end"]);
    }

    #[test]
    fn long_press_fires_hold_only() {
        let mut script = Script::new();
        script.tick(0, &[A]);
        assert!(script.tick(499, &[A]).is_empty());
        assert_eq!(names(&script.tick(500, &[A])), vec!["pressing"]);
        assert!(script.tick(800, &[A]).is_empty(), "hold fires once per press");
        assert!(script.tick(900, &[]).is_empty(), "no tap after hold");
    }

    #[test]
    fn combo_suppresses_modifier_tap_and_primary_hold() {
        let mut script = Script::new();
        script.tick(0, &[LB]);
        assert_eq!(names(&script.tick(50, &[LB, A])), vec!["corner"]);
        assert!(script.tick(700, &[LB, A]).is_empty(), "no hold for combo press");
        assert!(script.tick(750, &[LB]).is_empty());
        assert!(script.tick(800, &[]).is_empty(), "no standalone LB after combo");
    }

    #[test]
    fn modifier_alone_fires_its_own_mapping() {
        let mut script = Script::new();
        script.tick(0, &[LB]);
        assert_eq!(names(&script.tick(100, &[])), vec!["lb_tap"]);
    }

    #[test]
    fn triggers_never_fire_standalone() {
        let mut script = Script::new();
        script.tick(0, &[LT]);
        assert!(script.tick(100, &[]).is_empty());
    }

    #[test]
    fn unbound_rb_release_toggles_team() {
        let mut script = Script::new();
        script.tick(0, &[RB]);
        assert_eq!(script.tick(100, &[]), vec![Intent::ToggleTeam]);
    }

    #[test]
    fn unmapped_buttons_are_ignored() {
        let mut script = Script::new();
        script.tick(0, &[Y]);
        assert!(script.tick(100, &[]).is_empty());
    }
}
