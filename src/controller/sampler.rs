//! Input sampler: merges the physical gamepad with the keyboard overlay
//!
//! Every tick the engine asks its [`InputSource`] for a [`DeviceSnapshot`] of
//! the first connected gamepad and ORs it with the [`VirtualController`]
//! bitmap maintained from keyboard events. The result is a [`Sample`]:
//! one `pressed` flag per button and the four axis values.

use super::buttons::{is_trigger, AXIS_COUNT, BUTTON_COUNT};

/// Raw state of one button as reported by the device.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct ButtonSample {
    pub pressed: bool,
    pub value: f32,
}

/// One reading of a physical gamepad.
#[derive(Debug, Clone, PartialEq)]
pub struct DeviceSnapshot {
    pub name: String,
    pub buttons: [ButtonSample; BUTTON_COUNT],
    pub axes: [f32; AXIS_COUNT],
}

impl DeviceSnapshot {
    pub fn idle(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            buttons: [ButtonSample::default(); BUTTON_COUNT],
            axes: [0.0; AXIS_COUNT],
        }
    }

    /// Snapshot with the given buttons fully pressed.
    pub fn with_pressed(name: impl Into<String>, pressed: &[usize]) -> Self {
        let mut snapshot = Self::idle(name);
        for &index in pressed {
            snapshot.set_button(index, true);
        }
        snapshot
    }

    pub fn set_button(&mut self, index: usize, pressed: bool) {
        if let Some(button) = self.buttons.get_mut(index) {
            button.pressed = pressed;
            button.value = if pressed { 1.0 } else { 0.0 };
        }
    }

    pub fn set_axis(&mut self, axis: usize, value: f32) {
        if let Some(slot) = self.axes.get_mut(axis) {
            *slot = value.clamp(-1.0, 1.0);
        }
    }
}

/// Source of physical gamepad readings.
///
/// Implemented by the gilrs backend and by scripted sources in tests.
pub trait InputSource: Send + 'static {
    /// State of the first available gamepad, `None` when nothing is connected.
    fn sample(&mut self) -> Option<DeviceSnapshot>;
}

/// Source used when no gamepad backend could be initialised.
#[derive(Debug, Default)]
pub struct NoDevice;

impl InputSource for NoDevice {
    fn sample(&mut self) -> Option<DeviceSnapshot> {
        None
    }
}

/// Keyboard-driven button bitmap and right stick.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct VirtualController {
    buttons: u16,
    axes: [f32; AXIS_COUNT],
}

impl VirtualController {
    pub fn set_button(&mut self, index: usize, pressed: bool) {
        if index >= BUTTON_COUNT {
            return;
        }
        if pressed {
            self.buttons |= 1 << index;
        } else {
            self.buttons &= !(1 << index);
        }
    }

    pub fn is_pressed(&self, index: usize) -> bool {
        index < BUTTON_COUNT && self.buttons & (1 << index) != 0
    }

    pub fn set_axis(&mut self, axis: usize, value: f32) {
        if let Some(slot) = self.axes.get_mut(axis) {
            *slot = value.clamp(-1.0, 1.0);
        }
    }

    pub fn clear(&mut self) {
        *self = Self::default();
    }
}

/// Merged per-tick input.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct Sample {
    pressed: [bool; BUTTON_COUNT],
    pub axes: [f32; AXIS_COUNT],
}

impl Sample {
    pub fn pressed(&self, index: usize) -> bool {
        self.pressed.get(index).copied().unwrap_or(false)
    }

    pub fn axis(&self, axis: usize) -> f32 {
        self.axes.get(axis).copied().unwrap_or(0.0)
    }

    /// Every button released, sticks centred.
    pub fn released() -> Self {
        Self::default()
    }

    pub fn with_pressed(pressed: &[usize]) -> Self {
        let mut sample = Self::default();
        for &index in pressed {
            if let Some(slot) = sample.pressed.get_mut(index) {
                *slot = true;
            }
        }
        sample
    }
}

/// Merges the physical and virtual readings.
///
/// Returns `None` when there is no device and the keyboard overlay is off;
/// the engine treats that tick as a no-op.
pub fn merge(
    physical: Option<&DeviceSnapshot>,
    overlay: Option<&VirtualController>,
    trigger_threshold: f32,
) -> Option<Sample> {
    if physical.is_none() && overlay.is_none() {
        return None;
    }

    let mut sample = Sample::default();
    if let Some(device) = physical {
        for (index, button) in device.buttons.iter().enumerate() {
            // Trigger hardware rarely reports a clean boolean.
            sample.pressed[index] = if is_trigger(index) {
                button.value > trigger_threshold
            } else {
                button.pressed
            };
        }
        sample.axes = device.axes;
    }

    if let Some(virtual_pad) = overlay {
        for index in 0..BUTTON_COUNT {
            sample.pressed[index] |= virtual_pad.is_pressed(index);
        }
        for (axis, value) in virtual_pad.axes.iter().enumerate() {
            if *value != 0.0 {
                sample.axes[axis] = *value;
            }
        }
    }

    Some(sample)
}
