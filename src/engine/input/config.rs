// Input definitions and the authoring operations on them

use super::binding::{GamepadAxis, GamepadElement, KeyAxis};
use super::definition::{InputDefinition, Interpolation};
use super::{InputError, Result};
use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};
use winit::keyboard::KeyCode;

/// Source of every revision stamp; no two configurations share one
static NEXT_REVISION: AtomicU64 = AtomicU64::new(1);

fn next_revision() -> u64 {
    NEXT_REVISION.fetch_add(1, Ordering::Relaxed)
}

/// The authored set of inputs
///
/// Every definition carries a revision that changes on each edit; the running
/// input system compares revisions between ticks to find inputs that need
/// their states rebuilt. Structural changes (add, remove, replace) change the
/// layout revision instead, which rebuilds everything.
///
/// Stamps are unique across all configurations in the process, so swapping in
/// a different configuration wholesale is seen as a layout change.
#[derive(Debug, Clone)]
pub struct InputConfig {
    definitions: Vec<InputDefinition>,

    /// Per-definition revision, parallel to `definitions`
    revisions: Vec<u64>,

    /// Name -> index lookup
    by_name: HashMap<String, usize>,

    layout_revision: u64,
}

impl InputConfig {
    /// Create an empty configuration
    pub fn new() -> Self {
        Self {
            definitions: Vec::new(),
            revisions: Vec::new(),
            by_name: HashMap::new(),
            layout_revision: next_revision(),
        }
    }

    /// Create a configuration from a list of definitions
    pub fn from_definitions(definitions: Vec<InputDefinition>) -> Result<Self> {
        let mut config = Self::new();
        config.replace_all(definitions)?;
        Ok(config)
    }

    /// Default preset: movement axes, jump, fire and pause
    pub fn with_defaults() -> Self {
        let mut config = Self::new();
        for definition in default_definitions() {
            config.push_unchecked(definition);
        }
        config.layout_revision = next_revision();
        config
    }

    fn push_unchecked(&mut self, definition: InputDefinition) -> usize {
        let index = self.definitions.len();
        let revision = next_revision();
        self.by_name.insert(definition.name.clone(), index);
        self.definitions.push(definition);
        self.revisions.push(revision);
        index
    }

    fn rebuild_name_index(&mut self) {
        self.by_name = self
            .definitions
            .iter()
            .enumerate()
            .map(|(index, definition)| (definition.name.clone(), index))
            .collect();
    }

    /// Add a definition, returning its index
    pub fn add(&mut self, definition: InputDefinition) -> Result<usize> {
        definition.validate()?;
        if self.by_name.contains_key(&definition.name) {
            return Err(InputError::DuplicateName(definition.name));
        }
        let index = self.push_unchecked(definition);
        self.layout_revision = next_revision();
        Ok(index)
    }

    /// Copy a definition under a fresh name, returning the copy's index
    pub fn duplicate(&mut self, name: &str) -> Result<usize> {
        let mut copy = self.get(name)?.clone();
        copy.name = self.unused_name(&format!("{} (copy)", name));
        self.add(copy)
    }

    fn unused_name(&self, base: &str) -> String {
        if !self.by_name.contains_key(base) {
            return base.to_string();
        }
        (2..)
            .map(|n| format!("{} {}", base, n))
            .find(|candidate| !self.by_name.contains_key(candidate))
            .unwrap_or_else(|| base.to_string())
    }

    /// Remove a definition by name
    pub fn remove(&mut self, name: &str) -> Result<InputDefinition> {
        let index = self.index_of(name)?;
        self.revisions.remove(index);
        let removed = self.definitions.remove(index);
        self.rebuild_name_index();
        self.layout_revision = next_revision();
        Ok(removed)
    }

    /// Rename a definition
    pub fn rename(&mut self, name: &str, new_name: &str) -> Result<()> {
        self.edit(name, |definition| definition.name = new_name.to_string())
    }

    /// Modify a definition in place
    ///
    /// The edit is validated before it is committed; on error the definition
    /// is left unchanged.
    pub fn edit(&mut self, name: &str, edit: impl FnOnce(&mut InputDefinition)) -> Result<()> {
        let index = self.index_of(name)?;
        self.edit_index(index, edit)
    }

    /// Modify a definition in place by index
    pub fn edit_index(
        &mut self,
        index: usize,
        edit: impl FnOnce(&mut InputDefinition),
    ) -> Result<()> {
        let mut edited = self.get_index(index)?.clone();
        edit(&mut edited);
        edited.validate()?;

        let old_name = &self.definitions[index].name;
        if edited.name != *old_name {
            if self.by_name.contains_key(&edited.name) {
                return Err(InputError::DuplicateName(edited.name));
            }
            self.by_name.remove(old_name);
            self.by_name.insert(edited.name.clone(), index);
        }

        self.definitions[index] = edited;
        self.revisions[index] = next_revision();
        Ok(())
    }

    /// Replace every definition at once
    pub fn replace_all(&mut self, definitions: Vec<InputDefinition>) -> Result<()> {
        let mut seen = HashMap::with_capacity(definitions.len());
        for (index, definition) in definitions.iter().enumerate() {
            definition.validate()?;
            if seen.insert(definition.name.as_str(), index).is_some() {
                return Err(InputError::DuplicateName(definition.name.clone()));
            }
        }

        self.definitions.clear();
        self.revisions.clear();
        self.by_name.clear();
        for definition in definitions {
            self.push_unchecked(definition);
        }
        self.layout_revision = next_revision();
        Ok(())
    }

    /// Index of a definition by name
    pub fn index_of(&self, name: &str) -> Result<usize> {
        self.by_name
            .get(name)
            .copied()
            .ok_or_else(|| InputError::NotFound(name.to_string()))
    }

    /// Get a definition by name
    pub fn get(&self, name: &str) -> Result<&InputDefinition> {
        let index = self.index_of(name)?;
        Ok(&self.definitions[index])
    }

    /// Get a definition by index
    pub fn get_index(&self, index: usize) -> Result<&InputDefinition> {
        self.definitions.get(index).ok_or(InputError::OutOfRange {
            index,
            len: self.definitions.len(),
        })
    }

    /// Check that an index refers to a definition
    pub fn check_index(&self, index: usize) -> Result<usize> {
        self.get_index(index).map(|_| index)
    }

    pub fn definitions(&self) -> &[InputDefinition] {
        &self.definitions
    }

    pub fn len(&self) -> usize {
        self.definitions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.definitions.is_empty()
    }

    /// Current revision of the definition at `index`
    pub fn revision(&self, index: usize) -> Option<u64> {
        self.revisions.get(index).copied()
    }

    /// Revision of the list's shape; changes on add, duplicate, remove and replace
    pub fn layout_revision(&self) -> u64 {
        self.layout_revision
    }

    /// Trim one definition without counting it as an edit
    pub(crate) fn trim_at(&mut self, index: usize) -> bool {
        self.definitions
            .get_mut(index)
            .is_some_and(|definition| definition.trim())
    }
}

impl Default for InputConfig {
    fn default() -> Self {
        Self::new()
    }
}

fn default_definitions() -> Vec<InputDefinition> {
    vec![
        // Movement (WASD with arrow keys as alternates)
        InputDefinition::axis("Horizontal")
            .with_main_keys(KeyAxis::pair(KeyCode::KeyD, KeyCode::KeyA))
            .with_alt_keys(KeyAxis::pair(KeyCode::ArrowRight, KeyCode::ArrowLeft))
            .with_main_gamepad(GamepadAxis::pair(
                GamepadElement::LeftStickRight,
                GamepadElement::LeftStickLeft,
            ))
            .with_alt_gamepad(GamepadAxis::pair(
                GamepadElement::DPadRight,
                GamepadElement::DPadLeft,
            )),
        InputDefinition::axis("Vertical")
            .with_main_keys(KeyAxis::pair(KeyCode::KeyW, KeyCode::KeyS))
            .with_alt_keys(KeyAxis::pair(KeyCode::ArrowUp, KeyCode::ArrowDown))
            .with_main_gamepad(GamepadAxis::pair(
                GamepadElement::LeftStickUp,
                GamepadElement::LeftStickDown,
            ))
            .with_alt_gamepad(GamepadAxis::pair(
                GamepadElement::DPadUp,
                GamepadElement::DPadDown,
            )),
        InputDefinition::button("Jump")
            .with_interpolation(Interpolation::Instant)
            .with_main_keys(KeyAxis::positive(KeyCode::Space))
            .with_main_gamepad(GamepadAxis::positive(GamepadElement::South)),
        InputDefinition::button("Fire")
            .with_main_keys(KeyAxis::positive(KeyCode::KeyJ))
            .with_main_gamepad(GamepadAxis::positive(GamepadElement::RightTrigger))
            .with_alt_gamepad(GamepadAxis::positive(GamepadElement::West)),
        InputDefinition::button("Pause")
            .with_interpolation(Interpolation::Instant)
            .with_main_keys(KeyAxis::positive(KeyCode::Escape))
            .with_main_gamepad(GamepadAxis::positive(GamepadElement::Start)),
    ]
}
