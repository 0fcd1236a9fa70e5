// Logical input definitions and their normalization

use super::binding::{Axis, GamepadAxis, GamepadElement, KeyAxis, StrongSide};
use super::state::{Bindable, Side};
use super::{InputError, Result};
use crate::core::math::lerp;
use winit::keyboard::KeyCode;

/// Whether an input is a two-sided axis or a one-sided button
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum InputType {
    #[default]
    Axis,
    Button,
}

/// How the stored value moves towards its target each frame
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum Interpolation {
    /// Linear step of `delta_time / interpolation_time` per frame
    #[default]
    Smooth,
    /// Like `Smooth`, but recentres on direction reversal
    Jump,
    /// Snap to the target
    Instant,
}

/// Output range of an input's value
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ValueInterval {
    pub min: f32,
    pub max: f32,
}

impl ValueInterval {
    pub fn new(min: f32, max: f32) -> Self {
        Self { min, max }
    }

    /// Endpoints in output order: `(low, high)`, swapped when inverted
    pub fn endpoints(&self, invert: bool) -> (f32, f32) {
        if invert {
            (self.max, self.min)
        } else {
            (self.min, self.max)
        }
    }

    /// Check `min <= max` with finite endpoints
    pub fn is_valid(&self) -> bool {
        self.min.is_finite() && self.max.is_finite() && self.min <= self.max
    }
}

impl Default for ValueInterval {
    fn default() -> Self {
        Self::new(-1.0, 1.0)
    }
}

/// One binding layer (Main or Alt) across both device families
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct AxisLayer {
    pub keyboard: KeyAxis,
    pub gamepad: GamepadAxis,
}

/// A named logical input
#[derive(Debug, Clone, PartialEq)]
pub struct InputDefinition {
    pub name: String,
    pub input_type: InputType,
    pub interpolation: Interpolation,
    pub interval: ValueInterval,
    pub invert: bool,
    pub main: AxisLayer,
    pub alt: AxisLayer,
}

impl InputDefinition {
    /// Create an axis input ranging over `[-1, 1]`
    pub fn axis(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            input_type: InputType::Axis,
            interpolation: Interpolation::Smooth,
            interval: ValueInterval::default(),
            invert: false,
            main: AxisLayer::default(),
            alt: AxisLayer::default(),
        }
    }

    /// Create a button input ranging over `[0, 1]`
    pub fn button(name: impl Into<String>) -> Self {
        Self {
            input_type: InputType::Button,
            interval: ValueInterval::new(0.0, 1.0),
            ..Self::axis(name)
        }
    }

    pub fn with_interpolation(mut self, interpolation: Interpolation) -> Self {
        self.interpolation = interpolation;
        self
    }

    pub fn with_interval(mut self, min: f32, max: f32) -> Self {
        self.interval = ValueInterval::new(min, max);
        self
    }

    pub fn inverted(mut self, invert: bool) -> Self {
        self.invert = invert;
        self
    }

    pub fn with_main_keys(mut self, axis: KeyAxis) -> Self {
        self.main.keyboard = axis;
        self
    }

    pub fn with_alt_keys(mut self, axis: KeyAxis) -> Self {
        self.alt.keyboard = axis;
        self
    }

    pub fn with_main_gamepad(mut self, axis: GamepadAxis) -> Self {
        self.main.gamepad = axis;
        self
    }

    pub fn with_alt_gamepad(mut self, axis: GamepadAxis) -> Self {
        self.alt.gamepad = axis;
        self
    }

    /// Check the invariants authoring must uphold
    pub fn validate(&self) -> Result<()> {
        if !self.interval.is_valid() {
            return Err(InputError::InvalidInterval {
                name: self.name.clone(),
                min: self.interval.min,
                max: self.interval.max,
            });
        }
        Ok(())
    }

    /// Normalize bindings before the input becomes active
    ///
    /// Alt bindings are promoted into empty Main slots, and buttons lose every
    /// negative binding and get a zero interval minimum. Idempotent. Returns
    /// whether anything changed.
    pub fn trim(&mut self) -> bool {
        let before = self.clone();

        promote_alt(&mut self.main.keyboard, &mut self.alt.keyboard);
        promote_alt(&mut self.main.gamepad, &mut self.alt.gamepad);

        if self.input_type == InputType::Button {
            self.main.keyboard.negative = None;
            self.main.gamepad.negative = None;
            self.alt.keyboard.negative = None;
            self.alt.gamepad.negative = None;
            self.interval.min = 0.0;
            // Keep min <= max when a button interval was authored below zero
            if self.interval.max < self.interval.min {
                self.interval.max = self.interval.min;
            }
        }

        *self != before
    }

    /// Snapshot of everything the evaluator and sampler need for this input
    pub fn compile(&self) -> CompiledInput {
        CompiledInput {
            keyboard: self.profile(&self.main.keyboard, &self.alt.keyboard),
            gamepad: self.profile(&self.main.gamepad, &self.alt.gamepad),
            keys: bindings_of(&self.main.keyboard, &self.alt.keyboard),
            elements: bindings_of(&self.main.gamepad, &self.alt.gamepad),
        }
    }

    fn profile<B: Copy>(&self, main: &Axis<B>, alt: &Axis<B>) -> SourceProfile {
        let bindings = bindings_of(main, alt);
        SourceProfile {
            input_type: self.input_type,
            interpolation: self.interpolation,
            interval: self.interval,
            invert: self.invert,
            main_strong_side: main.strong_side,
            alt_strong_side: alt.strong_side,
            bindable: Bindable::from_sides(bindings.map(|b| b.is_some())),
        }
    }
}

fn promote_alt<B: Copy>(main: &mut Axis<B>, alt: &mut Axis<B>) {
    if main.positive.is_none() && alt.positive.is_some() {
        main.positive = alt.positive.take();
    }
    if main.negative.is_none() && alt.negative.is_some() {
        main.negative = alt.negative.take();
    }
}

/// Bindings in [`Side`] order
fn bindings_of<B: Copy>(main: &Axis<B>, alt: &Axis<B>) -> [Option<B>; Side::COUNT] {
    let mut bindings = [None; Side::COUNT];
    bindings[Side::PositiveMain.index()] = main.positive;
    bindings[Side::NegativeMain.index()] = main.negative;
    bindings[Side::PositiveAlt.index()] = alt.positive;
    bindings[Side::NegativeAlt.index()] = alt.negative;
    bindings
}

/// Static configuration of one input as seen by one device family
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SourceProfile {
    pub input_type: InputType,
    pub interpolation: Interpolation,
    pub interval: ValueInterval,
    pub invert: bool,
    pub main_strong_side: StrongSide,
    pub alt_strong_side: StrongSide,
    pub bindable: Bindable,
}

impl SourceProfile {
    /// Value the input settles at with nothing pressed
    pub fn rest_value(&self) -> f32 {
        let (low, high) = self.interval.endpoints(self.invert);
        let factor = match self.input_type {
            InputType::Axis => 0.5,
            InputType::Button => 0.0,
        };
        lerp(low, high, factor)
    }
}

/// A trimmed definition flattened for per-frame work
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CompiledInput {
    pub keyboard: SourceProfile,
    pub gamepad: SourceProfile,
    pub keys: [Option<KeyCode>; Side::COUNT],
    pub elements: [Option<GamepadElement>; Side::COUNT],
}
