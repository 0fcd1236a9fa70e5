use anyhow::Result;
use log::{debug, info, warn};
use rusted_inputs::{
    DeviceLayer, FrameClock, InputConfig, InputSettings, InputSystem, PlatformDevices,
};
use winit::{
    event::{Event, WindowEvent},
    event_loop::{ControlFlow, EventLoop},
    window::WindowBuilder,
};

/// Rumble amplitudes while Fire is held
const FIRE_RUMBLE: (f32, f32) = (0.6, 0.3);

fn main() -> Result<()> {
    // Initialize logger
    env_logger::Builder::from_default_env()
        .filter_level(log::LevelFilter::Info)
        .init();

    info!("Starting Rusted Inputs demo...");

    let settings = InputSettings::default();
    let mut devices = PlatformDevices::new(&settings);
    let mut input = InputSystem::new(InputConfig::with_defaults(), settings)?;
    input.start(&mut devices);

    // Create event loop and window
    let event_loop = EventLoop::new()?;
    event_loop.set_control_flow(ControlFlow::Poll);
    let window = WindowBuilder::new()
        .with_title("Rusted Inputs")
        .with_inner_size(winit::dpi::LogicalSize::new(640, 360))
        .with_resizable(true)
        .build(&event_loop)?;

    info!("Window created successfully");

    let mut clock = FrameClock::new();
    let mut last_movement = glam::Vec2::ZERO;

    // Main event loop
    event_loop
        .run(move |event, elwt| match event {
            Event::WindowEvent {
                event: WindowEvent::CloseRequested,
                ..
            } => {
                info!("Close requested, shutting down...");
                elwt.exit();
            }
            Event::WindowEvent {
                event: WindowEvent::KeyboardInput { event, .. },
                ..
            } => {
                devices.keyboard.process_keyboard_event(&event);
            }
            Event::WindowEvent {
                event: WindowEvent::Focused(false),
                ..
            } => {
                // Key releases are not delivered while unfocused
                devices.keyboard.release_all();
            }
            Event::AboutToWait => {
                devices.poll();
                let delta_time = clock.begin_frame();
                input.tick(&mut devices, delta_time);

                if let Err(e) = report_frame(&input, &mut devices, &mut clock, &mut last_movement) {
                    warn!("Input read failed: {}", e);
                }
                window.request_redraw();
            }
            _ => {}
        })
        .map_err(|e| anyhow::anyhow!("Event loop error: {}", e))?;

    Ok(())
}

/// React to this frame's input: log it, toggle pause, drive rumble
fn report_frame(
    input: &InputSystem,
    devices: &mut PlatformDevices,
    clock: &mut FrameClock,
    last_movement: &mut glam::Vec2,
) -> rusted_inputs::engine::input::Result<()> {
    if input.down("Pause", None)? {
        clock.toggle_pause();
    }

    let movement = input.vector("Horizontal", "Vertical", None)?;
    if movement != *last_movement {
        debug!("Movement {:?}", movement);
        *last_movement = movement;
    }

    if input.down("Jump", None)? {
        info!("Jump");
    }
    if input.double_press("Jump", None)? {
        info!("Double jump");
    }
    if input.held("Fire", None)? {
        info!("Fire (held)");
    }

    for gamepad in 0..devices.gamepad_count() {
        if input.down("Fire", Some(gamepad))? {
            devices.set_vibration(gamepad, FIRE_RUMBLE.0, FIRE_RUMBLE.1);
        } else if input.up("Fire", Some(gamepad))? {
            devices.set_vibration(gamepad, 0.0, 0.0);
        }
    }

    Ok(())
}
