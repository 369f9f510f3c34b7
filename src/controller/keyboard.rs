//! Keyboard surfaces
//!
//! Two independent layers share the keyboard:
//!
//! * with controller emulation on, [`virtual_button`] / [`virtual_stick`]
//!   translate keys into the [`VirtualController`](super::sampler::VirtualController)
//!   overlay, so the keyboard behaves exactly like a gamepad;
//! * with emulation off, [`ShortcutTable`] maps keys straight to events for
//!   quick tagging without going through the controller model.

use super::buttons::{self, AXIS_RIGHT_X, AXIS_RIGHT_Y};
use egui::Key;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use tracing::warn;

/// Fixed key -> virtual button table.
pub fn virtual_button(key: Key) -> Option<usize> {
    let index = match key {
        Key::Space => buttons::A,
        Key::Escape => buttons::B,
        Key::F => buttons::X,
        Key::R => buttons::Y,
        Key::Q => buttons::LB,
        Key::E => buttons::RB,
        Key::Z => buttons::LT,
        Key::C => buttons::RT,
        Key::Tab => buttons::VIEW,
        Key::Enter => buttons::MENU,
        Key::V => buttons::LEFT_STICK,
        Key::B => buttons::RIGHT_STICK,
        Key::ArrowUp => buttons::DPAD_UP,
        Key::ArrowDown => buttons::DPAD_DOWN,
        Key::ArrowLeft => buttons::DPAD_LEFT,
        Key::ArrowRight => buttons::DPAD_RIGHT,
        _ => return None,
    };
    Some(index)
}

/// I/J/K/L push the virtual right stick to full deflection.
pub fn virtual_stick(key: Key) -> Option<(usize, f32)> {
    match key {
        Key::I => Some((AXIS_RIGHT_Y, -1.0)),
        Key::K => Some((AXIS_RIGHT_Y, 1.0)),
        Key::J => Some((AXIS_RIGHT_X, -1.0)),
        Key::L => Some((AXIS_RIGHT_X, 1.0)),
        _ => None,
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Shortcut {
    pub key: Key,
    pub event: String,
}

/// Direct key -> event shortcuts used while emulation is off.
#[derive(Debug, Clone, Default)]
pub struct ShortcutTable {
    shortcuts: HashMap<Key, String>,
}

impl ShortcutTable {
    pub fn new(shortcuts: &[Shortcut]) -> Self {
        let mut table = HashMap::new();
        for shortcut in shortcuts {
            if shortcut.event.trim().is_empty() {
                warn!("Ignoring shortcut {:?} without an event", shortcut.key);
                continue;
            }
            if table.contains_key(&shortcut.key) {
                warn!(
                    "Shortcut {:?} bound twice, keeping the first binding",
                    shortcut.key
                );
                continue;
            }
            table.insert(shortcut.key, shortcut.event.clone());
        }
        Self { shortcuts: table }
    }

    pub fn event_for(&self, key: Key) -> Option<&str> {
        self.shortcuts.get(&key).map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.shortcuts.len()
    }

    pub fn is_empty(&self) -> bool {
        self.shortcuts.is_empty()
    }
}
