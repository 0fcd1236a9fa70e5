// Engine modules: input and frame timing

pub mod frame_clock;
pub mod input;
