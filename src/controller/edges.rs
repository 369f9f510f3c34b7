//! Edge and hold detection
//!
//! [`TickState`] owns all per-button bookkeeping between ticks: previous
//! pressed state, press start, and the flags that record whether the current
//! press has already been used up by a hold, a combo or a selector. The
//! combo engine reads these flags to decide between tap, hold and combo.

use super::buttons::{is_modifier, BUTTON_COUNT};
use super::sampler::Sample;
use std::time::{Duration, Instant};
use tracing::debug;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EdgeKind {
    Rising,
    Held { elapsed: Duration },
    Falling { duration: Duration },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ButtonEdge {
    pub index: usize,
    pub kind: EdgeKind,
}

#[derive(Debug, Clone, Copy, Default)]
struct PressState {
    pressed: bool,
    since: Option<Instant>,
    /// Press already produced an event (hold, combo, selector input).
    consumed: bool,
    hold_fired: bool,
    /// Modifier press that triggered at least one combo.
    combo_fired: bool,
}

#[derive(Debug, Clone, Default)]
pub struct TickState {
    buttons: [PressState; BUTTON_COUNT],
}

impl TickState {
    pub fn new() -> Self {
        Self::default()
    }

    /// Compares `sample` with the previous tick and reports per-button edges
    /// in index order.
    pub fn observe(&mut self, sample: &Sample, now: Instant) -> Vec<ButtonEdge> {
        let mut edges = Vec::new();

        for (index, state) in self.buttons.iter_mut().enumerate() {
            let is_pressed = sample.pressed(index);
            match (state.pressed, is_pressed) {
                (false, true) => {
                    *state = PressState {
                        pressed: true,
                        since: Some(now),
                        ..PressState::default()
                    };
                    if is_modifier(index) {
                        debug!("Modifier {} armed", index);
                    }
                    edges.push(ButtonEdge {
                        index,
                        kind: EdgeKind::Rising,
                    });
                }
                (true, true) => {
                    let elapsed = state
                        .since
                        .map(|since| now.saturating_duration_since(since))
                        .unwrap_or_default();
                    edges.push(ButtonEdge {
                        index,
                        kind: EdgeKind::Held { elapsed },
                    });
                }
                (true, false) => {
                    let duration = state
                        .since
                        .take()
                        .map(|since| now.saturating_duration_since(since))
                        .unwrap_or_default();
                    state.pressed = false;
                    edges.push(ButtonEdge {
                        index,
                        kind: EdgeKind::Falling { duration },
                    });
                }
                (false, false) => {}
            }
        }

        edges
    }

    pub fn is_pressed(&self, index: usize) -> bool {
        self.buttons.get(index).is_some_and(|s| s.pressed)
    }

    pub fn consume(&mut self, index: usize) {
        if let Some(state) = self.buttons.get_mut(index) {
            state.consumed = true;
        }
    }

    pub fn is_consumed(&self, index: usize) -> bool {
        self.buttons.get(index).is_some_and(|s| s.consumed)
    }

    pub fn mark_hold_fired(&mut self, index: usize) {
        if let Some(state) = self.buttons.get_mut(index) {
            state.hold_fired = true;
            state.consumed = true;
        }
    }

    pub fn hold_fired(&self, index: usize) -> bool {
        self.buttons.get(index).is_some_and(|s| s.hold_fired)
    }

    pub fn mark_combo_fired(&mut self, modifier_index: usize) {
        if let Some(state) = self.buttons.get_mut(modifier_index) {
            state.combo_fired = true;
        }
    }

    pub fn combo_fired(&self, modifier_index: usize) -> bool {
        self.buttons.get(modifier_index).is_some_and(|s| s.combo_fired)
    }

    /// Marks every currently pressed button as used, so none of them fires
    /// on release.
    pub fn consume_all_pressed(&mut self) {
        for state in self.buttons.iter_mut().filter(|s| s.pressed) {
            state.consumed = true;
        }
    }

    /// Forces everything back to "released", e.g. after focus loss where the
    /// release edge would never be observed.
    pub fn reset(&mut self) {
        debug!("Resetting press bookkeeping");
        self.buttons = [PressState::default(); BUTTON_COUNT];
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::controller::buttons::{A, LB};

    fn ms(n: u64) -> Duration {
        Duration::from_millis(n)
    }

    #[test]
    fn reports_rising_held_and_falling_with_duration() {
        let t0 = Instant::now();
        let mut state = TickState::new();

        let edges = state.observe(&Sample::with_pressed(&[A]), t0);
        assert_eq!(
            edges,
            vec![ButtonEdge {
                index: A,
                kind: EdgeKind::Rising
            }]
        );

        let edges = state.observe(&Sample::with_pressed(&[A]), t0 + ms(100));
        assert_eq!(edges[0].kind, EdgeKind::Held { elapsed: ms(100) });

        let edges = state.observe(&Sample::released(), t0 + ms(250));
        assert_eq!(edges[0].kind, EdgeKind::Falling { duration: ms(250) });
        assert!(!state.is_pressed(A));
    }

    #[test]
    fn flags_are_cleared_on_next_press() {
        let t0 = Instant::now();
        let mut state = TickState::new();

        state.observe(&Sample::with_pressed(&[A, LB]), t0);
        state.mark_hold_fired(A);
        state.mark_combo_fired(LB);
        assert!(state.is_consumed(A) && state.hold_fired(A) && state.combo_fired(LB));

        state.observe(&Sample::released(), t0 + ms(10));
        // Flags survive the falling edge so release handling can read them.
        assert!(state.is_consumed(A) && state.combo_fired(LB));

        state.observe(&Sample::with_pressed(&[A, LB]), t0 + ms(20));
        assert!(!state.is_consumed(A) && !state.hold_fired(A) && !state.combo_fired(LB));
    }

    #[test]
    fn reset_releases_everything_without_edges() {
        let t0 = Instant::now();
        let mut state = TickState::new();
        state.observe(&Sample::with_pressed(&[A]), t0);

        state.reset();
        assert!(!state.is_pressed(A));
        assert!(state.observe(&Sample::released(), t0 + ms(5)).is_empty());
    }
}
