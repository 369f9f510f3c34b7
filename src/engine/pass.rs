//! Two-step pass workflow (post-match only)
//!
//! The first `pass_start` is logged as is; the next one is read as
//! `pass_end` and goes through the normal player attribution.

use crate::mapping::{PASS_END, PASS_START};
use tracing::info;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum PassState {
    #[default]
    Idle,
    AwaitingReceiver,
}

/// What the dispatcher should do with an intent after the pass filter.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PassRouting {
    /// Not a pass intent, dispatch unchanged.
    Unchanged,
    /// Log the pass start directly, skipping selectors.
    LogStart,
    /// Dispatch under a new name through the normal flow.
    Reinterpreted(&'static str),
}

#[derive(Debug, Clone, Default)]
pub struct PassWorkflow {
    state: PassState,
}

impl PassWorkflow {
    pub fn state(&self) -> PassState {
        self.state
    }

    pub fn route(&mut self, event_name: &str) -> PassRouting {
        if event_name != PASS_START {
            return PassRouting::Unchanged;
        }
        match self.state {
            PassState::Idle => {
                self.state = PassState::AwaitingReceiver;
                info!("Pass started, waiting for receiver");
                PassRouting::LogStart
            }
            PassState::AwaitingReceiver => {
                self.state = PassState::Idle;
                info!("Second pass_start read as {}", PASS_END);
                PassRouting::Reinterpreted(PASS_END)
            }
        }
    }

    pub fn reset(&mut self) {
        self.state = PassState::Idle;
    }
}
