// Device layer seam and in-memory devices

use super::binding::GamepadElement;
use super::state::Side;
use std::collections::HashSet;
use winit::event::{ElementState, KeyEvent};
use winit::keyboard::{KeyCode, PhysicalKey};

/// Press state of an input's four binding slots on one device instance
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct DeviceSample {
    pressed: [bool; Side::COUNT],
}

impl DeviceSample {
    pub fn new(
        positive_main: bool,
        negative_main: bool,
        positive_alt: bool,
        negative_alt: bool,
    ) -> Self {
        Self {
            pressed: [positive_main, negative_main, positive_alt, negative_alt],
        }
    }

    /// Sample every bound slot with `is_pressed`; unbound slots read as released
    pub fn from_bindings<B: Copy>(
        bindings: &[Option<B>; Side::COUNT],
        mut is_pressed: impl FnMut(B) -> bool,
    ) -> Self {
        Self {
            pressed: bindings.map(|binding| binding.map_or(false, &mut is_pressed)),
        }
    }

    pub fn pressed(&self, side: Side) -> bool {
        self.pressed[side.index()]
    }
}

/// Platform input reached by the input system once per frame
///
/// Gamepads are addressed by their position `0..gamepad_count()`. Queries for
/// gamepads that are not connected report "not pressed".
pub trait DeviceLayer {
    /// Whether a keyboard key is currently held
    fn key_pressed(&self, key: KeyCode) -> bool;

    /// Number of connected gamepads
    fn gamepad_count(&self) -> usize;

    /// Whether a gamepad element is currently held
    fn gamepad_pressed(&self, gamepad: usize, element: GamepadElement) -> bool;

    /// Set motor amplitudes in `[0, 1]`; fire-and-forget
    fn set_vibration(&mut self, _gamepad: usize, _low_frequency: f32, _high_frequency: f32) {}

    /// Analog press threshold for triggers and stick half-axes
    fn set_gamepad_threshold(&mut self, _threshold: f32) {}
}

/// Keyboard state fed by window events
#[derive(Debug, Clone, Default)]
pub struct KeyboardState {
    pressed: HashSet<KeyCode>,
}

impl KeyboardState {
    pub fn new() -> Self {
        Self::default()
    }

    /// Process a keyboard event from winit
    pub fn process_keyboard_event(&mut self, event: &KeyEvent) {
        // Only process physical key presses
        if let PhysicalKey::Code(key_code) = event.physical_key {
            match event.state {
                ElementState::Pressed => {
                    if !event.repeat {
                        self.set_key(key_code, true);
                    }
                }
                ElementState::Released => self.set_key(key_code, false),
            }
        }
    }

    pub fn set_key(&mut self, key: KeyCode, pressed: bool) {
        if pressed {
            self.pressed.insert(key);
        } else {
            self.pressed.remove(&key);
        }
    }

    pub fn is_pressed(&self, key: KeyCode) -> bool {
        self.pressed.contains(&key)
    }

    /// Release everything, e.g. when the window loses focus
    pub fn release_all(&mut self) {
        self.pressed.clear();
    }
}

/// Vibration request recorded by [`SimulatedDevices`]
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct VibrationRequest {
    pub gamepad: usize,
    pub low_frequency: f32,
    pub high_frequency: f32,
}

/// In-memory keyboard and gamepads for headless hosts and tests
#[derive(Debug, Clone, Default)]
pub struct SimulatedDevices {
    pub keyboard: KeyboardState,
    gamepads: Vec<HashSet<GamepadElement>>,
    vibrations: Vec<VibrationRequest>,
    gamepad_threshold: Option<f32>,
}

impl SimulatedDevices {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_gamepads(count: usize) -> Self {
        let mut devices = Self::new();
        devices.set_gamepad_count(count);
        devices
    }

    /// Connect or disconnect gamepads until `count` remain
    pub fn set_gamepad_count(&mut self, count: usize) {
        self.gamepads.resize_with(count, HashSet::new);
    }

    pub fn set_key(&mut self, key: KeyCode, pressed: bool) {
        self.keyboard.set_key(key, pressed);
    }

    /// Press or release a gamepad element; ignored for unknown gamepads
    pub fn set_element(&mut self, gamepad: usize, element: GamepadElement, pressed: bool) {
        if let Some(elements) = self.gamepads.get_mut(gamepad) {
            if pressed {
                elements.insert(element);
            } else {
                elements.remove(&element);
            }
        }
    }

    pub fn release_all(&mut self) {
        self.keyboard.release_all();
        for elements in &mut self.gamepads {
            elements.clear();
        }
    }

    /// Vibration requests received so far, oldest first
    pub fn vibrations(&self) -> &[VibrationRequest] {
        &self.vibrations
    }

    /// Threshold last applied by the input system, if any
    pub fn gamepad_threshold(&self) -> Option<f32> {
        self.gamepad_threshold
    }
}

impl DeviceLayer for SimulatedDevices {
    fn key_pressed(&self, key: KeyCode) -> bool {
        self.keyboard.is_pressed(key)
    }

    fn gamepad_count(&self) -> usize {
        self.gamepads.len()
    }

    fn gamepad_pressed(&self, gamepad: usize, element: GamepadElement) -> bool {
        self.gamepads
            .get(gamepad)
            .is_some_and(|elements| elements.contains(&element))
    }

    fn set_vibration(&mut self, gamepad: usize, low_frequency: f32, high_frequency: f32) {
        if gamepad < self.gamepads.len() {
            self.vibrations.push(VibrationRequest {
                gamepad,
                low_frequency,
                high_frequency,
            });
        }
    }

    fn set_gamepad_threshold(&mut self, threshold: f32) {
        self.gamepad_threshold = Some(threshold);
    }
}
