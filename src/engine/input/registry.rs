// Source state storage and the per-frame update loop

use super::definition::CompiledInput;
use super::device::{DeviceLayer, DeviceSample};
use super::evaluator::evaluate;
use super::settings::Timing;
use super::state::SourceState;
use rayon::prelude::*;

/// Slots handed to one rayon task at minimum; tiny frames stay on one thread
const MIN_SLOTS_PER_TASK: usize = 64;

/// Owns every [`SourceState`]: one per input for the keyboard and one per
/// (input, gamepad) pair
///
/// Gamepad states live in a flat arena indexed `gamepad * input_count + input`.
/// The arena is rebuilt whenever the connected gamepad count changes and the
/// generation is bumped, so no timers survive a topology change.
#[derive(Debug)]
pub struct SourceRegistry {
    inputs: Vec<CompiledInput>,
    keyboard: Vec<SourceState>,
    gamepads: Vec<SourceState>,
    gamepad_count: usize,
    generation: u64,
}

impl SourceRegistry {
    /// Allocate fresh states for trimmed, compiled inputs
    ///
    /// `generation` is the tag of the initial gamepad storage. Callers that
    /// replace a registry pass a value past the old one so tags never repeat.
    pub fn new(
        inputs: Vec<CompiledInput>,
        gamepad_count: usize,
        timing: &Timing,
        generation: u64,
    ) -> Self {
        let keyboard = inputs
            .iter()
            .map(|input| SourceState::new(&input.keyboard, timing))
            .collect();
        let mut registry = Self {
            inputs,
            keyboard,
            gamepads: Vec::new(),
            gamepad_count: 0,
            generation,
        };
        registry.rebuild_gamepads(gamepad_count, timing);
        registry
    }

    pub fn input_count(&self) -> usize {
        self.inputs.len()
    }

    pub fn gamepad_count(&self) -> usize {
        self.gamepad_count
    }

    /// Incremented on every gamepad topology change
    pub fn generation(&self) -> u64 {
        self.generation
    }

    /// Recreate every gamepad state for a new connected count
    pub fn resize_gamepads(&mut self, gamepad_count: usize, timing: &Timing) {
        if gamepad_count != self.gamepad_count {
            self.rebuild_gamepads(gamepad_count, timing);
            self.generation += 1;
        }
    }

    fn rebuild_gamepads(&mut self, gamepad_count: usize, timing: &Timing) {
        self.gamepads = (0..gamepad_count)
            .flat_map(|_| self.inputs.iter())
            .map(|input| SourceState::new(&input.gamepad, timing))
            .collect();
        self.gamepad_count = gamepad_count;
    }

    /// Swap in a new compiled form of one input and reset all of its states
    pub fn reinitialize(&mut self, index: usize, input: CompiledInput, timing: &Timing) {
        let input_count = self.inputs.len();
        let Some(slot) = self.inputs.get_mut(index) else {
            return;
        };
        *slot = input;

        self.keyboard[index] = SourceState::new(&input.keyboard, timing);
        for gamepad in 0..self.gamepad_count {
            self.gamepads[gamepad * input_count + index] = SourceState::new(&input.gamepad, timing);
        }
    }

    /// Sample every slot from the device layer, then evaluate them all
    ///
    /// Sampling runs on the calling thread. Evaluation fans out over the rayon
    /// pool: keyboard and gamepad slots in two joined halves, each split
    /// further across workers. Returns once every slot is done.
    pub fn update(&mut self, devices: &dyn DeviceLayer, timing: &Timing, delta_time: f32) {
        self.refresh_samples(devices);

        let Self {
            inputs,
            keyboard,
            gamepads,
            ..
        } = self;
        let inputs: &[CompiledInput] = inputs;
        let input_count = inputs.len();
        if input_count == 0 {
            return;
        }

        rayon::join(
            || {
                keyboard
                    .par_iter_mut()
                    .enumerate()
                    .with_min_len(MIN_SLOTS_PER_TASK)
                    .for_each(|(index, state)| {
                        let sample = state.sample;
                        evaluate(&inputs[index].keyboard, state, sample, timing, delta_time);
                    })
            },
            || {
                gamepads
                    .par_iter_mut()
                    .enumerate()
                    .with_min_len(MIN_SLOTS_PER_TASK)
                    .for_each(|(slot, state)| {
                        let sample = state.sample;
                        let input = &inputs[slot % input_count];
                        evaluate(&input.gamepad, state, sample, timing, delta_time);
                    })
            },
        );
    }

    fn refresh_samples(&mut self, devices: &dyn DeviceLayer) {
        for (input, state) in self.inputs.iter().zip(&mut self.keyboard) {
            state.sample = DeviceSample::from_bindings(&input.keys, |key| devices.key_pressed(key));
        }

        let input_count = self.inputs.len();
        for (slot, state) in self.gamepads.iter_mut().enumerate() {
            let gamepad = slot / input_count;
            let input = &self.inputs[slot % input_count];
            state.sample = DeviceSample::from_bindings(&input.elements, |element| {
                devices.gamepad_pressed(gamepad, element)
            });
        }
    }

    pub fn keyboard_state(&self, input: usize) -> Option<&SourceState> {
        self.keyboard.get(input)
    }

    /// State of an input on a gamepad; `None` for an out-of-range gamepad
    pub fn gamepad_state(&self, input: usize, gamepad: usize) -> Option<&SourceState> {
        if input >= self.inputs.len() || gamepad >= self.gamepad_count {
            return None;
        }
        self.gamepads.get(gamepad * self.inputs.len() + input)
    }

    /// States of an input on every connected gamepad, in gamepad order
    pub fn gamepad_states(&self, input: usize) -> impl Iterator<Item = &SourceState> + '_ {
        (0..self.gamepad_count).filter_map(move |gamepad| self.gamepad_state(input, gamepad))
    }
}
