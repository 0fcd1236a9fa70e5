// Input system - owns configuration, settings and the running registry

use super::config::InputConfig;
use super::definition::CompiledInput;
use super::device::DeviceLayer;
use super::merge::MergedInput;
use super::registry::SourceRegistry;
use super::settings::InputSettings;
use super::state::{EventKind, Family};
use super::Result;
use glam::Vec2;
use log::{debug, info, warn};

/// Reference to an input by name or by position
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum InputRef<'a> {
    Name(&'a str),
    Index(usize),
}

impl<'a> From<&'a str> for InputRef<'a> {
    fn from(name: &'a str) -> Self {
        Self::Name(name)
    }
}

impl<'a> From<&'a String> for InputRef<'a> {
    fn from(name: &'a String) -> Self {
        Self::Name(name.as_str())
    }
}

impl From<usize> for InputRef<'_> {
    fn from(index: usize) -> Self {
        Self::Index(index)
    }
}

/// Registry plus the config revisions it was built from
#[derive(Debug)]
struct Running {
    registry: SourceRegistry,
    layout_revision: u64,
    revisions: Vec<Option<u64>>,
}

/// The input context a host constructs and drives
///
/// Lifecycle is explicit: [`start`](Self::start) allocates states,
/// [`tick`](Self::tick) advances one frame, [`stop`](Self::stop) frees
/// everything. Definitions may be edited or replaced wholesale through
/// [`config_mut`](Self::config_mut) between ticks; the next tick rebuilds
/// whatever changed.
///
/// Reads before `start`, or after a structural edit that has not been ticked
/// yet, resolve the input and report it at rest: the value it settles at with
/// nothing pressed, and no events.
#[derive(Debug)]
pub struct InputSystem {
    config: InputConfig,
    settings: InputSettings,
    running: Option<Running>,

    /// Generation tag for the next registry built
    next_generation: u64,

    /// Threshold last pushed to the device layer
    applied_threshold: Option<f32>,
}

impl InputSystem {
    /// Create a stopped input system
    pub fn new(config: InputConfig, settings: InputSettings) -> Result<Self> {
        settings.validate()?;
        Ok(Self {
            config,
            settings,
            running: None,
            next_generation: 0,
            applied_threshold: None,
        })
    }

    /// Trim every definition and allocate states for the current gamepads
    ///
    /// Starting a running system restarts it from rest.
    pub fn start(&mut self, devices: &mut dyn DeviceLayer) {
        self.sync_threshold(devices);
        let gamepad_count = devices.gamepad_count();
        self.running = Some(self.build(gamepad_count));
        info!(
            "Input system started: {} inputs, {} gamepads",
            self.config.len(),
            gamepad_count
        );
    }

    /// Release all per-source state
    pub fn stop(&mut self) {
        self.retire_registry();
        if self.running.take().is_some() {
            info!("Input system stopped");
        }
    }

    pub fn is_running(&self) -> bool {
        self.running.is_some()
    }

    /// Move the generation counter past the current registry before it goes
    fn retire_registry(&mut self) {
        if let Some(running) = self.running.as_ref() {
            self.next_generation = running.registry.generation() + 1;
        }
    }

    fn build(&mut self, gamepad_count: usize) -> Running {
        self.retire_registry();
        let inputs: Vec<CompiledInput> = (0..self.config.len())
            .map(|index| self.activate(index))
            .collect();
        let revisions = (0..self.config.len())
            .map(|index| self.config.revision(index))
            .collect();

        Running {
            registry: SourceRegistry::new(
                inputs,
                gamepad_count,
                &self.settings.timing,
                self.next_generation,
            ),
            layout_revision: self.config.layout_revision(),
            revisions,
        }
    }

    /// Trim a definition and compile it for evaluation
    fn activate(&mut self, index: usize) -> CompiledInput {
        if self.config.trim_at(index) {
            debug!("Normalized bindings of input {}", index);
        }
        self.config.definitions()[index].compile()
    }

    /// Push the analog threshold to the devices when it changed
    fn sync_threshold(&mut self, devices: &mut dyn DeviceLayer) {
        let threshold = self.settings.gamepad_threshold;
        if self.applied_threshold != Some(threshold) {
            devices.set_gamepad_threshold(threshold);
            self.applied_threshold = Some(threshold);
            debug!("Gamepad threshold set to {}", threshold);
        }
    }

    /// Advance every input by one frame
    ///
    /// Picks up authoring edits, settings changes and gamepad count changes,
    /// samples the devices, then evaluates all sources. Every source has
    /// finished when this returns. Negative or non-finite `delta_time` counts
    /// as zero.
    pub fn tick(&mut self, devices: &mut dyn DeviceLayer, delta_time: f32) {
        if self.running.is_none() {
            warn!("Input system ticked before start; ignoring");
            return;
        }
        let delta_time = if delta_time.is_finite() && delta_time > 0.0 {
            delta_time
        } else {
            0.0
        };
        self.sync_threshold(devices);
        let timing = self.settings.timing;
        let gamepad_count = devices.gamepad_count();

        let layout_changed = self
            .running
            .as_ref()
            .is_some_and(|running| running.layout_revision != self.config.layout_revision());
        if layout_changed {
            debug!(
                "Input definitions replaced; rebuilding {} inputs",
                self.config.len()
            );
            self.running = Some(self.build(gamepad_count));
        } else {
            self.reinitialize_edited();
        }

        let Some(running) = self.running.as_mut() else {
            return;
        };

        let previous_count = running.registry.gamepad_count();
        running.registry.resize_gamepads(gamepad_count, &timing);
        if previous_count != gamepad_count {
            info!(
                "Gamepad count changed {} -> {} (generation {})",
                previous_count,
                gamepad_count,
                running.registry.generation()
            );
        }

        running.registry.update(&*devices, &timing, delta_time);
    }

    fn reinitialize_edited(&mut self) {
        let edited: Vec<usize> = match self.running.as_ref() {
            Some(running) => (0..self.config.len())
                .filter(|&index| {
                    running.revisions.get(index).copied().flatten()
                        != self.config.revision(index)
                })
                .collect(),
            None => return,
        };

        for index in edited {
            let input = self.activate(index);
            let revision = self.config.revision(index);
            if let Some(running) = self.running.as_mut() {
                running
                    .registry
                    .reinitialize(index, input, &self.settings.timing);
                if let Some(slot) = running.revisions.get_mut(index) {
                    *slot = revision;
                }
            }
            debug!("Reinitialized input {}", index);
        }
    }

    /// Authored definitions
    pub fn config(&self) -> &InputConfig {
        &self.config
    }

    /// Authoring access; edits take effect on the next tick
    pub fn config_mut(&mut self) -> &mut InputConfig {
        &mut self.config
    }

    pub fn settings(&self) -> &InputSettings {
        &self.settings
    }

    /// Replace the settings between ticks
    ///
    /// A new gamepad threshold reaches the devices on the next tick.
    pub fn set_settings(&mut self, settings: InputSettings) -> Result<()> {
        settings.validate()?;
        self.settings = settings;
        Ok(())
    }

    /// Gamepads the running system holds states for
    pub fn gamepad_count(&self) -> usize {
        self.running
            .as_ref()
            .map_or(0, |running| running.registry.gamepad_count())
    }

    /// Generation of the gamepad storage
    ///
    /// Changes on every gamepad count change and every rebuild, and never
    /// repeats within one system.
    pub fn gamepad_generation(&self) -> u64 {
        self.running
            .as_ref()
            .map_or(self.next_generation, |running| running.registry.generation())
    }

    /// Resolve a reference to an index in the current configuration
    pub fn resolve<'a>(&self, input: impl Into<InputRef<'a>>) -> Result<usize> {
        match input.into() {
            InputRef::Name(name) => self.config.index_of(name),
            InputRef::Index(index) => self.config.check_index(index),
        }
    }

    /// Merged view of one input, or its rest value while no frame matches
    /// the config
    fn merged<'a>(
        &self,
        input: impl Into<InputRef<'a>>,
        gamepad: Option<usize>,
    ) -> Result<std::result::Result<MergedInput<'_>, f32>> {
        let index = self.resolve(input)?;
        let running = self
            .running
            .as_ref()
            .filter(|running| running.layout_revision == self.config.layout_revision());
        Ok(match running {
            Some(running) => Ok(MergedInput::new(
                &running.registry,
                index,
                gamepad,
                self.settings.source_priority,
            )),
            None => Err(self.rest_value(index)),
        })
    }

    /// Value a definition settles at once trimmed and released
    fn rest_value(&self, index: usize) -> f32 {
        let mut definition = self.config.definitions()[index].clone();
        definition.trim();
        definition.compile().keyboard.rest_value()
    }

    /// Current value, Main layer first, merged across sources
    pub fn value<'a>(
        &self,
        input: impl Into<InputRef<'a>>,
        gamepad: Option<usize>,
    ) -> Result<f32> {
        Ok(self
            .merged(input, gamepad)?
            .map_or_else(|rest| rest, |merged| merged.value()))
    }

    /// Value of the Main layer alone
    pub fn main_value<'a>(
        &self,
        input: impl Into<InputRef<'a>>,
        gamepad: Option<usize>,
    ) -> Result<f32> {
        Ok(self
            .merged(input, gamepad)?
            .map_or_else(|rest| rest, |merged| merged.main_value()))
    }

    /// Value of the Alt layer alone
    pub fn alt_value<'a>(
        &self,
        input: impl Into<InputRef<'a>>,
        gamepad: Option<usize>,
    ) -> Result<f32> {
        Ok(self
            .merged(input, gamepad)?
            .map_or_else(|rest| rest, |merged| merged.alt_value()))
    }

    /// Two inputs read as the x and y of a vector
    pub fn vector<'a, 'b>(
        &self,
        x: impl Into<InputRef<'a>>,
        y: impl Into<InputRef<'b>>,
        gamepad: Option<usize>,
    ) -> Result<Vec2> {
        Ok(Vec2::new(self.value(x, gamepad)?, self.value(y, gamepad)?))
    }

    /// Any event of any binding family
    pub fn event<'a>(
        &self,
        input: impl Into<InputRef<'a>>,
        kind: EventKind,
        family: Family,
        gamepad: Option<usize>,
    ) -> Result<bool> {
        Ok(self
            .merged(input, gamepad)?
            .is_ok_and(|merged| merged.event(kind, family)))
    }

    /// Any binding is held
    pub fn press<'a>(
        &self,
        input: impl Into<InputRef<'a>>,
        gamepad: Option<usize>,
    ) -> Result<bool> {
        self.event(input, EventKind::Press, Family::Combined, gamepad)
    }

    /// Any binding went down this frame
    pub fn down<'a>(
        &self,
        input: impl Into<InputRef<'a>>,
        gamepad: Option<usize>,
    ) -> Result<bool> {
        self.event(input, EventKind::Down, Family::Combined, gamepad)
    }

    /// Any binding was released this frame
    pub fn up<'a>(&self, input: impl Into<InputRef<'a>>, gamepad: Option<usize>) -> Result<bool> {
        self.event(input, EventKind::Up, Family::Combined, gamepad)
    }

    /// Any binding's hold timer elapsed this frame
    pub fn held<'a>(
        &self,
        input: impl Into<InputRef<'a>>,
        gamepad: Option<usize>,
    ) -> Result<bool> {
        self.event(input, EventKind::Held, Family::Combined, gamepad)
    }

    /// Any binding was double-pressed this frame
    pub fn double_press<'a>(
        &self,
        input: impl Into<InputRef<'a>>,
        gamepad: Option<usize>,
    ) -> Result<bool> {
        self.event(input, EventKind::DoublePress, Family::Combined, gamepad)
    }
}
