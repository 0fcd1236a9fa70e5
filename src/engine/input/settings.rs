// Process-wide input settings

use super::{InputError, Result};

/// Durations driving interpolation and the temporal events, in seconds
///
/// `f32::INFINITY` is allowed and means "never".
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Timing {
    /// Time for a smooth value to travel one unit
    pub interpolation_time: f32,
    /// Press duration before the first `Held` event
    pub hold_trigger_time: f32,
    /// Interval between repeated `Held` events
    pub hold_wait_time: f32,
    /// Window in which a second release counts as a double press
    pub double_press_timeout: f32,
}

impl Default for Timing {
    fn default() -> Self {
        Self {
            interpolation_time: 0.25,
            hold_trigger_time: 0.3,
            hold_wait_time: 0.1,
            double_press_timeout: 0.2,
        }
    }
}

/// Source favoured when keyboard and gamepad both report a value
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum SourcePriority {
    #[default]
    Keyboard,
    Gamepad,
}

/// Settings shared by every input
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct InputSettings {
    pub timing: Timing,
    /// Analog magnitude at which a trigger or stick half-axis counts as pressed
    pub gamepad_threshold: f32,
    pub source_priority: SourcePriority,
}

impl Default for InputSettings {
    fn default() -> Self {
        Self {
            timing: Timing::default(),
            gamepad_threshold: 0.5,
            source_priority: SourcePriority::Keyboard,
        }
    }
}

impl InputSettings {
    pub fn with_timing(mut self, timing: Timing) -> Self {
        self.timing = timing;
        self
    }

    pub fn with_source_priority(mut self, priority: SourcePriority) -> Self {
        self.source_priority = priority;
        self
    }

    pub fn with_gamepad_threshold(mut self, threshold: f32) -> Self {
        self.gamepad_threshold = threshold;
        self
    }

    /// Reject negative or NaN durations and thresholds outside `(0, 1]`
    pub fn validate(&self) -> Result<()> {
        let durations = [
            ("interpolation_time", self.timing.interpolation_time),
            ("hold_trigger_time", self.timing.hold_trigger_time),
            ("hold_wait_time", self.timing.hold_wait_time),
            ("double_press_timeout", self.timing.double_press_timeout),
        ];
        for (name, value) in durations {
            if value.is_nan() || value < 0.0 {
                return Err(InputError::InvalidSetting { name, value });
            }
        }

        let threshold = self.gamepad_threshold;
        if threshold.is_nan() || threshold <= 0.0 || threshold > 1.0 {
            return Err(InputError::InvalidSetting {
                name: "gamepad_threshold",
                value: threshold,
            });
        }

        Ok(())
    }
}
