// Merging keyboard and gamepad state into one reading

use super::registry::SourceRegistry;
use super::settings::SourcePriority;
use super::state::{EventKind, Family, SourceState};

/// OR a keyboard flag with an optional gamepad flag
pub fn merge_flag(keyboard: bool, gamepad: Option<bool>) -> bool {
    keyboard || gamepad.unwrap_or(false)
}

/// Pick between keyboard and gamepad values
///
/// The gamepad wins when it is non-zero and either has priority or the
/// keyboard is at zero; otherwise the keyboard value stands.
pub fn merge_value(keyboard: f32, gamepad: Option<f32>, priority: SourcePriority) -> f32 {
    match gamepad {
        Some(value)
            if value != 0.0 && (priority == SourcePriority::Gamepad || keyboard == 0.0) =>
        {
            value
        }
        _ => keyboard,
    }
}

/// Read access to one input across its sources
///
/// `gamepad: Some(i)` with a connected gamepad `i` reads that gamepad alone.
/// `None` merges the keyboard with every connected gamepad. A `Some(i)` that
/// is not connected contributes nothing and leaves the keyboard reading.
#[derive(Debug, Clone, Copy)]
pub struct MergedInput<'a> {
    registry: &'a SourceRegistry,
    input: usize,
    gamepad: Option<usize>,
    priority: SourcePriority,
}

impl<'a> MergedInput<'a> {
    pub fn new(
        registry: &'a SourceRegistry,
        input: usize,
        gamepad: Option<usize>,
        priority: SourcePriority,
    ) -> Self {
        Self {
            registry,
            input,
            gamepad,
            priority,
        }
    }

    fn explicit_gamepad(&self) -> Option<&'a SourceState> {
        self.gamepad
            .and_then(|gamepad| self.registry.gamepad_state(self.input, gamepad))
    }

    fn keyboard(&self) -> Option<&'a SourceState> {
        self.registry.keyboard_state(self.input)
    }

    /// Merge a value read from each source
    pub fn value_with(&self, read: impl Fn(&SourceState) -> f32) -> f32 {
        if let Some(state) = self.explicit_gamepad() {
            return read(state);
        }

        let keyboard = self.keyboard().map_or(0.0, &read);
        let gamepad = match self.gamepad {
            Some(_) => None,
            None => self
                .registry
                .gamepad_states(self.input)
                .map(&read)
                .find(|value| *value != 0.0),
        };
        merge_value(keyboard, gamepad, self.priority)
    }

    pub fn value(&self) -> f32 {
        self.value_with(SourceState::value)
    }

    pub fn main_value(&self) -> f32 {
        self.value_with(SourceState::main_value)
    }

    pub fn alt_value(&self) -> f32 {
        self.value_with(SourceState::alt_value)
    }

    /// Merge one event flag from each source
    pub fn event(&self, kind: EventKind, family: Family) -> bool {
        if let Some(state) = self.explicit_gamepad() {
            return state.event(kind, family);
        }

        let keyboard = self
            .keyboard()
            .is_some_and(|state| state.event(kind, family));
        let gamepad = match self.gamepad {
            Some(_) => None,
            None => Some(
                self.registry
                    .gamepad_states(self.input)
                    .any(|state| state.event(kind, family)),
            ),
        };
        merge_flag(keyboard, gamepad)
    }
}
