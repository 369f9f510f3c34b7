//! tagpad - controller-driven event tagging for football analysis
//!
//! Turns a polled gamepad (and optionally the keyboard acting as one) into a
//! stream of [`event::LoggedEvent`]s: taps, holds, modifier combos, player
//! and zone selection, and the two-step pass workflow, with a short grace
//! period in which the last event can still be cancelled.
//!
//! ```text
//! config ──► mapping::resolve ──► engine::TagEngine ◄── controller (gilrs / keyboard)
//!                                      │
//!                                      ├──► LoggedEvent sink
//!                                      └──► playback pause / resume
//! ```

pub mod config;
pub mod controller;
pub mod engine;
pub mod event;
pub mod mapping;
