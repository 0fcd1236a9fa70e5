// Input abstraction layer
//
// Named inputs are defined once and bound to keyboard keys and gamepad
// elements. Each frame the system samples the devices, runs every binding
// through a value shaper and a temporal event engine, and exposes merged
// readings per input.
//
// ## Architecture
//
// - `binding`: Keyboard and gamepad binding pairs and strong-side policy
// - `definition`: Authored input definitions, trimming and compilation
// - `config`: The authored set of inputs and its editing operations
// - `settings`: Global timing, gamepad threshold and source priority
// - `device`: The device layer seam, keyboard state and a simulated backend
// - `gamepad`: gilrs-backed gamepads and the platform device layer
// - `state`: Per-source runtime state and event flags
// - `evaluator`: Value shaping, interpolation and temporal events
// - `registry`: Storage of all source states and the parallel update
// - `merge`: Combining keyboard and gamepad readings
// - `system`: The input context hosts construct and drive
//
// ## Usage Example
//
// ```rust
// use rusted_inputs::engine::input::{InputConfig, InputSettings, InputSystem, PlatformDevices};
//
// let mut devices = PlatformDevices::new(&InputSettings::default());
// let mut input = InputSystem::new(InputConfig::with_defaults(), InputSettings::default())?;
// input.start(&mut devices);
//
// // Once per frame, after forwarding window events to `devices.keyboard`
// devices.poll();
// input.tick(&mut devices, delta_time);
//
// if input.down("Jump", None)? {
//     // Jump was just pressed on the keyboard or any gamepad
// }
// let movement = input.vector("Horizontal", "Vertical", None)?;
// ```

pub mod binding;
pub mod config;
pub mod definition;
pub mod device;
pub mod evaluator;
pub mod gamepad;
pub mod merge;
pub mod registry;
pub mod settings;
pub mod state;
pub mod system;

// Re-export commonly used types
pub use binding::{Axis, GamepadAxis, GamepadElement, KeyAxis, StrongSide};
pub use config::InputConfig;
pub use definition::{InputDefinition, InputType, Interpolation, ValueInterval};
pub use device::{DeviceLayer, KeyboardState, SimulatedDevices};
pub use gamepad::{GilrsGamepads, PlatformDevices};
pub use settings::{InputSettings, SourcePriority, Timing};
pub use state::{EventKind, Family};
pub use system::{InputRef, InputSystem};

/// Errors from the input API
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum InputError {
    #[error("Input not found: {0}")]
    NotFound(String),

    #[error("Input index {index} out of range ({len} inputs)")]
    OutOfRange { index: usize, len: usize },

    #[error("Input name already in use: {0}")]
    DuplicateName(String),

    #[error("Invalid interval for input {name}: min {min} > max {max}")]
    InvalidInterval { name: String, min: f32, max: f32 },

    #[error("Invalid setting {name}: {value}")]
    InvalidSetting { name: &'static str, value: f32 },
}

pub type Result<T> = std::result::Result<T, InputError>;
