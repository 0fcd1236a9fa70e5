// Polled input abstraction: named inputs bound to keyboard and gamepads

pub mod core;
pub mod engine;

pub use engine::frame_clock::FrameClock;
pub use engine::input::{
    DeviceLayer, EventKind, Family, InputConfig, InputDefinition, InputError, InputSettings,
    InputSystem, PlatformDevices,
};
