// Gamepad backend on gilrs and the platform device layer

use super::binding::GamepadElement;
use super::device::{DeviceLayer, KeyboardState};
use super::settings::InputSettings;
use gilrs::ff::{BaseEffect, BaseEffectType, Effect, EffectBuilder, Repeat, Replay, Ticks};
use gilrs::{Axis, Button, EventType, GamepadId, Gilrs};
use log::{debug, info, warn};
use std::collections::HashMap;
use winit::keyboard::KeyCode;

/// Where a [`GamepadElement`] is read from on a gilrs gamepad
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ElementSource {
    /// Digital button
    Button(Button),
    /// Analog button, pressed past the threshold
    Trigger(Button),
    /// Positive half of an axis, pressed past the threshold
    AxisPositive(Axis),
    /// Negative half of an axis, pressed past the threshold
    AxisNegative(Axis),
}

/// Element lookup table, indexed by [`GamepadElement::index`]
///
/// gilrs reports stick Y with up as positive.
pub const ELEMENT_SOURCES: [ElementSource; GamepadElement::COUNT] = [
    ElementSource::Button(Button::South),
    ElementSource::Button(Button::East),
    ElementSource::Button(Button::West),
    ElementSource::Button(Button::North),
    ElementSource::Button(Button::LeftTrigger),
    ElementSource::Button(Button::RightTrigger),
    ElementSource::Trigger(Button::LeftTrigger2),
    ElementSource::Trigger(Button::RightTrigger2),
    ElementSource::Button(Button::Select),
    ElementSource::Button(Button::Start),
    ElementSource::Button(Button::Mode),
    ElementSource::Button(Button::LeftThumb),
    ElementSource::Button(Button::RightThumb),
    ElementSource::Button(Button::DPadUp),
    ElementSource::Button(Button::DPadDown),
    ElementSource::Button(Button::DPadLeft),
    ElementSource::Button(Button::DPadRight),
    ElementSource::AxisPositive(Axis::LeftStickY),
    ElementSource::AxisNegative(Axis::LeftStickY),
    ElementSource::AxisNegative(Axis::LeftStickX),
    ElementSource::AxisPositive(Axis::LeftStickX),
    ElementSource::AxisPositive(Axis::RightStickY),
    ElementSource::AxisNegative(Axis::RightStickY),
    ElementSource::AxisNegative(Axis::RightStickX),
    ElementSource::AxisPositive(Axis::RightStickX),
];

impl ElementSource {
    pub fn of(element: GamepadElement) -> Self {
        ELEMENT_SOURCES[element.index()]
    }

    /// Whether the source reads an analog value
    pub fn is_analog(self) -> bool {
        !matches!(self, Self::Button(_))
    }

    /// Turn a raw reading into a pressed state
    ///
    /// `value` is the button value for triggers and the axis value for
    /// half-axes; digital buttons report their own pressed state.
    pub fn pressed(self, value: f32, threshold: f32) -> bool {
        match self {
            Self::Button(_) => value > 0.0,
            Self::Trigger(_) | Self::AxisPositive(_) => value >= threshold,
            Self::AxisNegative(_) => -value >= threshold,
        }
    }
}

/// Motor amplitude in `[0, 1]` to a force-feedback magnitude
fn magnitude(amplitude: f32) -> u16 {
    let amplitude = if amplitude.is_nan() { 0.0 } else { amplitude.clamp(0.0, 1.0) };
    (amplitude * f32::from(u16::MAX)).round() as u16
}

/// Connected gamepads, in connection order
///
/// The position of a gamepad in the connection order is its index for the
/// input system. Indices shift down when an earlier gamepad disconnects.
pub struct GilrsGamepads {
    /// Gilrs context (None if initialization failed)
    gilrs: Option<Gilrs>,

    connected: Vec<GamepadId>,

    /// Analog press threshold
    threshold: f32,

    /// Running rumble effect per gamepad
    effects: HashMap<GamepadId, Effect>,
}

impl GilrsGamepads {
    /// Open gilrs; without it every query reports no gamepads
    pub fn new(threshold: f32) -> Self {
        let gilrs = match Gilrs::new() {
            Ok(gilrs) => Some(gilrs),
            Err(e) => {
                warn!(
                    "Failed to initialize gamepad support: {}. Gamepads will not be available.",
                    e
                );
                None
            }
        };

        let connected: Vec<GamepadId> = gilrs
            .iter()
            .flat_map(|gilrs| gilrs.gamepads().map(|(id, _)| id))
            .collect();
        if !connected.is_empty() {
            info!("{} gamepads connected at startup", connected.len());
        }

        Self {
            gilrs,
            connected,
            threshold,
            effects: HashMap::new(),
        }
    }

    /// Whether the gilrs backend is available
    pub fn is_available(&self) -> bool {
        self.gilrs.is_some()
    }

    pub fn set_threshold(&mut self, threshold: f32) {
        self.threshold = threshold;
    }

    /// Drain pending gilrs events; call once per frame before ticking
    pub fn poll(&mut self) {
        let Some(gilrs) = self.gilrs.as_mut() else {
            return;
        };

        while let Some(gilrs::Event { id, event, .. }) = gilrs.next_event() {
            match event {
                EventType::Connected => {
                    if !self.connected.contains(&id) {
                        self.connected.push(id);
                        info!(
                            "Gamepad {} connected: {} (index {})",
                            id,
                            gilrs.gamepad(id).name(),
                            self.connected.len() - 1
                        );
                    }
                }
                EventType::Disconnected => {
                    if let Some(index) = self.connected.iter().position(|&known| known == id) {
                        self.connected.remove(index);
                        self.effects.remove(&id);
                        info!("Gamepad {} (index {}) disconnected", id, index);
                    }
                }
                _ => {}
            }
        }
    }

    pub fn count(&self) -> usize {
        self.connected.len()
    }

    /// Whether `element` is held on the gamepad at `index`
    pub fn is_pressed(&self, index: usize, element: GamepadElement) -> bool {
        let (Some(gilrs), Some(&id)) = (self.gilrs.as_ref(), self.connected.get(index)) else {
            return false;
        };
        let Some(gamepad) = gilrs.connected_gamepad(id) else {
            return false;
        };

        let source = ElementSource::of(element);
        let value = match source {
            ElementSource::Button(button) => {
                if gamepad.is_pressed(button) {
                    1.0
                } else {
                    0.0
                }
            }
            ElementSource::Trigger(button) => gamepad
                .button_data(button)
                .map_or(0.0, |data| data.value()),
            ElementSource::AxisPositive(axis) | ElementSource::AxisNegative(axis) => {
                gamepad.value(axis)
            }
        };
        source.pressed(value, self.threshold)
    }

    /// Start, change or stop rumble on the gamepad at `index`
    ///
    /// Failures are logged and otherwise ignored.
    pub fn set_vibration(&mut self, index: usize, low_frequency: f32, high_frequency: f32) {
        let (Some(gilrs), Some(&id)) = (self.gilrs.as_mut(), self.connected.get(index)) else {
            return;
        };

        let strong = magnitude(low_frequency);
        let weak = magnitude(high_frequency);
        if strong == 0 && weak == 0 {
            if self.effects.remove(&id).is_some() {
                debug!("Stopped rumble on gamepad {}", id);
            }
            return;
        }

        if !gilrs.gamepad(id).is_ff_supported() {
            debug!("Gamepad {} has no force feedback", id);
            return;
        }

        let scheduling = Replay {
            play_for: Ticks::from_ms(100),
            ..Default::default()
        };
        let effect = EffectBuilder::new()
            .add_effect(BaseEffect {
                kind: BaseEffectType::Strong { magnitude: strong },
                scheduling,
                ..Default::default()
            })
            .add_effect(BaseEffect {
                kind: BaseEffectType::Weak { magnitude: weak },
                scheduling,
                ..Default::default()
            })
            .gamepads(&[id])
            .repeat(Repeat::Infinitely)
            .finish(gilrs);

        match effect.and_then(|effect| effect.play().map(|_| effect)) {
            Ok(effect) => {
                // Dropping the previous effect stops it
                self.effects.insert(id, effect);
            }
            Err(e) => warn!("Failed to start rumble on gamepad {}: {}", id, e),
        }
    }
}

impl std::fmt::Debug for GilrsGamepads {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("GilrsGamepads")
            .field("available", &self.gilrs.is_some())
            .field("connected", &self.connected)
            .field("threshold", &self.threshold)
            .finish()
    }
}

/// Keyboard fed by winit plus gamepads from gilrs
#[derive(Debug)]
pub struct PlatformDevices {
    pub keyboard: KeyboardState,
    pub gamepads: GilrsGamepads,
}

impl PlatformDevices {
    pub fn new(settings: &InputSettings) -> Self {
        Self {
            keyboard: KeyboardState::new(),
            gamepads: GilrsGamepads::new(settings.gamepad_threshold),
        }
    }

    /// Pull gamepad events; call once per frame before ticking
    pub fn poll(&mut self) {
        self.gamepads.poll();
    }
}

impl DeviceLayer for PlatformDevices {
    fn key_pressed(&self, key: KeyCode) -> bool {
        self.keyboard.is_pressed(key)
    }

    fn gamepad_count(&self) -> usize {
        self.gamepads.count()
    }

    fn gamepad_pressed(&self, gamepad: usize, element: GamepadElement) -> bool {
        self.gamepads.is_pressed(gamepad, element)
    }

    fn set_vibration(&mut self, gamepad: usize, low_frequency: f32, high_frequency: f32) {
        self.gamepads.set_vibration(gamepad, low_frequency, high_frequency);
    }

    fn set_gamepad_threshold(&mut self, threshold: f32) {
        self.gamepads.set_threshold(threshold);
    }
}
