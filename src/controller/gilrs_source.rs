//! Physical gamepad backend built on gilrs
//!
//! Lifecycle is a two-state statum machine:
//!
//! ```text
//! Initializing ──initialize()──► Sampling
//! ```
//!
//! In `Sampling` the machine implements [`InputSource`]: every call drains
//! the gilrs event queue (so gilrs keeps its cached state current) and then
//! reads the cached state of the first connected gamepad.

use super::buttons::{AXIS_LEFT_X, AXIS_LEFT_Y, AXIS_RIGHT_X, AXIS_RIGHT_Y, BUTTON_COUNT};
use super::sampler::{ButtonSample, DeviceSnapshot, InputSource};
use gilrs::{Axis, Button, EventType, Gamepad, GamepadId, Gilrs};
use statum::{machine, state};
use tracing::{debug, error, info, warn};

/// gilrs buttons in standard gamepad index order.
const STANDARD_LAYOUT: [Button; BUTTON_COUNT] = [
    Button::South,
    Button::East,
    Button::West,
    Button::North,
    Button::LeftTrigger,
    Button::RightTrigger,
    Button::LeftTrigger2,
    Button::RightTrigger2,
    Button::Select,
    Button::Start,
    Button::LeftThumb,
    Button::RightThumb,
    Button::DPadUp,
    Button::DPadDown,
    Button::DPadLeft,
    Button::DPadRight,
];

#[derive(Clone, Debug)]
pub struct SamplerSettings {
    /// Small radial deadzone against stick drift, applied before the engine
    /// sees the axes.
    pub joystick_deadzone: f32,
}

impl Default for SamplerSettings {
    fn default() -> Self {
        Self {
            joystick_deadzone: 0.05,
        }
    }
}

#[derive(Debug, thiserror::Error)]
pub enum SamplerError {
    #[error("Failed to initialize gamepad backend: {0}")]
    InitializationError(String),
}

#[state]
#[derive(Debug, Clone)]
pub enum SamplerState {
    Initializing,
    Sampling,
}

#[machine]
#[derive(Debug)]
pub struct GilrsSampler<S: SamplerState> {
    gilrs: Gilrs,

    // Gamepad currently read from
    active_gamepad: Option<GamepadId>,

    settings: SamplerSettings,
}

impl<S: SamplerState> GilrsSampler<S> {
    pub fn settings(&self) -> &SamplerSettings {
        &self.settings
    }
}

impl GilrsSampler<Initializing> {
    pub fn create(settings: Option<SamplerSettings>) -> Result<Self, SamplerError> {
        let settings = settings.unwrap_or_default();
        info!("Initializing gilrs gamepad backend with {:?}", settings);

        let gilrs = match Gilrs::new() {
            Ok(g) => g,
            Err(e) => {
                error!("Failed to initialize gilrs: {}", e);
                return Err(SamplerError::InitializationError(e.to_string()));
            }
        };

        Ok(Self::new(gilrs, None, settings))
    }

    pub fn initialize(mut self) -> GilrsSampler<Sampling> {
        let gamepads: Vec<(GamepadId, Gamepad<'_>)> = self.gilrs.gamepads().collect();

        if gamepads.is_empty() {
            warn!("No gamepad connected, waiting for one");
        } else {
            info!("Found {} gamepads:", gamepads.len());
            for (idx, (id, gamepad)) in gamepads.iter().enumerate() {
                info!("  [{}] ID: {}, Name: {}", idx, id, gamepad.name());
            }
            let (id, gamepad) = &gamepads[0];
            info!("Selected gamepad: {} ({})", gamepad.name(), id);
            self.active_gamepad = Some(*id);
        }

        self.transition()
    }
}

impl GilrsSampler<Sampling> {
    fn drain_events(&mut self) {
        while let Some(event) = self.gilrs.next_event() {
            match event.event {
                EventType::Connected => {
                    info!("Gamepad {} connected", event.id);
                }
                EventType::Disconnected => {
                    warn!("Gamepad {} disconnected", event.id);
                    if self.active_gamepad == Some(event.id) {
                        self.active_gamepad = None;
                    }
                }
                _ => {}
            }
        }
    }

    fn select_gamepad(&mut self) -> Option<GamepadId> {
        if let Some(id) = self.active_gamepad {
            if self.gilrs.connected_gamepad(id).is_some() {
                return Some(id);
            }
        }

        let next = self
            .gilrs
            .gamepads()
            .find(|(_, gamepad)| gamepad.is_connected())
            .map(|(id, gamepad)| {
                info!("Selected gamepad: {} ({})", gamepad.name(), id);
                id
            });
        self.active_gamepad = next;
        next
    }
}

impl InputSource for GilrsSampler<Sampling> {
    fn sample(&mut self) -> Option<DeviceSnapshot> {
        self.drain_events();
        let id = self.select_gamepad()?;
        let gamepad = self.gilrs.connected_gamepad(id)?;
        let deadzone = self.settings.joystick_deadzone;

        let mut snapshot = DeviceSnapshot::idle(gamepad.name());
        for (index, button) in STANDARD_LAYOUT.iter().enumerate() {
            let (pressed, value) = gamepad
                .button_data(*button)
                .map(|data| (data.is_pressed(), data.value()))
                .unwrap_or((false, 0.0));
            snapshot.buttons[index] = ButtonSample { pressed, value };
        }

        // Some drivers expose the triggers only as Z axes.
        let left_z = gamepad.value(Axis::LeftZ).max(0.0);
        let right_z = gamepad.value(Axis::RightZ).max(0.0);
        snapshot.buttons[6].value = snapshot.buttons[6].value.max(left_z);
        snapshot.buttons[7].value = snapshot.buttons[7].value.max(right_z);

        // gilrs reports up as positive y; the engine expects up negative.
        snapshot.set_axis(
            AXIS_LEFT_X,
            apply_deadzone(gamepad.value(Axis::LeftStickX), deadzone),
        );
        snapshot.set_axis(
            AXIS_LEFT_Y,
            -apply_deadzone(gamepad.value(Axis::LeftStickY), deadzone),
        );
        snapshot.set_axis(
            AXIS_RIGHT_X,
            apply_deadzone(gamepad.value(Axis::RightStickX), deadzone),
        );
        snapshot.set_axis(
            AXIS_RIGHT_Y,
            -apply_deadzone(gamepad.value(Axis::RightStickY), deadzone),
        );

        debug!("Sampled {}: axes {:?}", snapshot.name, snapshot.axes);
        Some(snapshot)
    }
}

// Rescales the value to the range outside the deadzone
fn apply_deadzone(value: f32, deadzone: f32) -> f32 {
    if value.abs() < deadzone {
        0.0
    } else {
        let sign = if value < 0.0 { -1.0 } else { 1.0 };
        sign * (value.abs() - deadzone) / (1.0 - deadzone)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn deadzone_zeroes_drift_and_rescales_the_rest() {
        assert_eq!(apply_deadzone(0.03, 0.05), 0.0);
        assert_eq!(apply_deadzone(1.0, 0.05), 1.0);
        assert_eq!(apply_deadzone(-1.0, 0.05), -1.0);
        let half = apply_deadzone(-0.6, 0.05);
        assert!(half < -0.5 && half > -0.6);
    }

    #[test]
    fn layout_covers_every_button_once() {
        for (i, a) in STANDARD_LAYOUT.iter().enumerate() {
            for b in STANDARD_LAYOUT.iter().skip(i + 1) {
                assert_ne!(a, b);
            }
        }
    }
}
