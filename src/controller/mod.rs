//! Controller input: sampling and edge detection
//!
//! ```text
//! gilrs / keyboard ──► sampler::merge ──► edges::TickState ──► ButtonEdge[]
//!   (DeviceSnapshot,     (Sample)          (rising / held /
//!    VirtualController)                      falling)
//! ```
//!
//! Everything here is synchronous and driven by the engine tick.

pub mod buttons;
pub mod edges;
pub mod gilrs_source;
pub mod keyboard;
pub mod sampler;

pub use edges::{ButtonEdge, EdgeKind, TickState};
pub use gilrs_source::{GilrsSampler, SamplerError, SamplerSettings};
pub use sampler::{DeviceSnapshot, InputSource, NoDevice, Sample, VirtualController};
