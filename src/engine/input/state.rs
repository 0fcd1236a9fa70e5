// Per-(input, device) derived state

use super::definition::SourceProfile;
use super::device::DeviceSample;
use super::settings::Timing;

/// A discrete event an input can report
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum EventKind {
    /// Currently held
    Press,
    /// Became held this frame
    Down,
    /// Was released this frame
    Up,
    /// Hold timer elapsed this frame
    Held,
    /// Second release inside the double-press window
    DoublePress,
}

impl EventKind {
    pub const COUNT: usize = 5;

    pub const ALL: [EventKind; Self::COUNT] = [
        Self::Press,
        Self::Down,
        Self::Up,
        Self::Held,
        Self::DoublePress,
    ];

    pub fn index(self) -> usize {
        self as usize
    }
}

/// Which bindings an event is aggregated over
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Family {
    Combined,
    Main,
    Alt,
    Positive,
    Negative,
    PositiveMain,
    NegativeMain,
    PositiveAlt,
    NegativeAlt,
}

impl Family {
    pub const COUNT: usize = 9;

    pub const ALL: [Family; Self::COUNT] = [
        Self::Combined,
        Self::Main,
        Self::Alt,
        Self::Positive,
        Self::Negative,
        Self::PositiveMain,
        Self::NegativeMain,
        Self::PositiveAlt,
        Self::NegativeAlt,
    ];

    pub fn index(self) -> usize {
        self as usize
    }

    /// Leaf sides this family ORs together
    pub fn sides(self) -> &'static [Side] {
        match self {
            Self::Combined => &Side::ALL,
            Self::Main => &[Side::PositiveMain, Side::NegativeMain],
            Self::Alt => &[Side::PositiveAlt, Side::NegativeAlt],
            Self::Positive => &[Side::PositiveMain, Side::PositiveAlt],
            Self::Negative => &[Side::NegativeMain, Side::NegativeAlt],
            Self::PositiveMain => &[Side::PositiveMain],
            Self::NegativeMain => &[Side::NegativeMain],
            Self::PositiveAlt => &[Side::PositiveAlt],
            Self::NegativeAlt => &[Side::NegativeAlt],
        }
    }
}

/// One physical binding slot of an input
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Side {
    PositiveMain,
    NegativeMain,
    PositiveAlt,
    NegativeAlt,
}

impl Side {
    pub const COUNT: usize = 4;

    pub const ALL: [Side; Self::COUNT] = [
        Self::PositiveMain,
        Self::NegativeMain,
        Self::PositiveAlt,
        Self::NegativeAlt,
    ];

    pub fn index(self) -> usize {
        self as usize
    }

    /// The leaf family reporting this side's events
    pub fn family(self) -> Family {
        match self {
            Self::PositiveMain => Family::PositiveMain,
            Self::NegativeMain => Family::NegativeMain,
            Self::PositiveAlt => Family::PositiveAlt,
            Self::NegativeAlt => Family::NegativeAlt,
        }
    }
}

/// Which sides of an input have a physical binding for one device family
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct Bindable {
    sides: [bool; Side::COUNT],
}

impl Bindable {
    pub fn from_sides(sides: [bool; Side::COUNT]) -> Self {
        Self { sides }
    }

    pub fn side(&self, side: Side) -> bool {
        self.sides[side.index()]
    }

    /// A family is bindable when any of its sides is
    pub fn family(&self, family: Family) -> bool {
        family.sides().iter().any(|side| self.side(*side))
    }
}

/// `[EventKind x Family]` table of event flags
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct EventFlags {
    table: [[bool; Family::COUNT]; EventKind::COUNT],
}

impl EventFlags {
    pub fn get(&self, kind: EventKind, family: Family) -> bool {
        self.table[kind.index()][family.index()]
    }

    pub fn set(&mut self, kind: EventKind, family: Family, value: bool) {
        self.table[kind.index()][family.index()] = value;
    }

    /// All flags of one family, in [`EventKind`] order
    pub fn family(&self, family: Family) -> [bool; EventKind::COUNT] {
        EventKind::ALL.map(|kind| self.get(kind, family))
    }
}

/// Timers and edge memory of a single side
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SideState {
    /// Press sample from the previous frame
    pub(crate) was_pressed: bool,
    /// Counts down while pressed; fires `Held` at zero
    pub(crate) hold_timer: f32,
    /// Counts down after a release; a second release before zero fires `DoublePress`
    pub(crate) double_press_timer: f32,
    pub(crate) double_press_initiated: bool,
}

impl SideState {
    pub fn new(timing: &Timing) -> Self {
        Self {
            was_pressed: false,
            hold_timer: timing.hold_trigger_time,
            double_press_timer: 0.0,
            double_press_initiated: false,
        }
    }
}

/// Full derived state of one input on one device instance
#[derive(Debug, Clone, PartialEq)]
pub struct SourceState {
    pub(crate) sample: DeviceSample,
    pub(crate) events: EventFlags,
    pub(crate) sides: [SideState; Side::COUNT],
    pub(crate) main_value: f32,
    pub(crate) alt_value: f32,
    pub(crate) value: f32,
}

impl SourceState {
    /// Fresh state resting at the profile's neutral value
    pub fn new(profile: &SourceProfile, timing: &Timing) -> Self {
        let rest = profile.rest_value();
        Self {
            sample: DeviceSample::default(),
            events: EventFlags::default(),
            sides: [SideState::new(timing); Side::COUNT],
            main_value: rest,
            alt_value: rest,
            value: rest,
        }
    }

    pub fn value(&self) -> f32 {
        self.value
    }

    pub fn main_value(&self) -> f32 {
        self.main_value
    }

    pub fn alt_value(&self) -> f32 {
        self.alt_value
    }

    pub fn event(&self, kind: EventKind, family: Family) -> bool {
        self.events.get(kind, family)
    }

    pub fn events(&self) -> &EventFlags {
        &self.events
    }

    /// Raw sample used by the most recent evaluation
    pub fn sample(&self) -> DeviceSample {
        self.sample
    }

    pub fn side(&self, side: Side) -> &SideState {
        &self.sides[side.index()]
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::engine::input::definition::InputDefinition;

    #[test]
    fn test_family_sides() {
        assert_eq!(Family::Combined.sides().len(), 4);
        assert_eq!(
            Family::Positive.sides(),
            &[Side::PositiveMain, Side::PositiveAlt]
        );
        for side in Side::ALL {
            assert_eq!(side.family().sides(), &[side]);
        }
    }

    #[test]
    fn test_indices_match_all_order() {
        for (index, kind) in EventKind::ALL.iter().enumerate() {
            assert_eq!(kind.index(), index);
        }
        for (index, family) in Family::ALL.iter().enumerate() {
            assert_eq!(family.index(), index);
        }
        for (index, side) in Side::ALL.iter().enumerate() {
            assert_eq!(side.index(), index);
        }
    }

    #[test]
    fn test_bindable_families() {
        let bindable = Bindable::from_sides([true, false, false, true]);
        assert!(bindable.family(Family::Main));
        assert!(bindable.family(Family::Alt));
        assert!(bindable.family(Family::Positive));
        assert!(bindable.family(Family::Negative));
        assert!(!bindable.family(Family::NegativeMain));
        assert!(!bindable.family(Family::PositiveAlt));

        let none = Bindable::default();
        assert!(!none.family(Family::Combined));
    }

    #[test]
    fn test_event_flags_table() {
        let mut flags = EventFlags::default();
        flags.set(EventKind::Held, Family::NegativeAlt, true);

        assert!(flags.get(EventKind::Held, Family::NegativeAlt));
        assert!(!flags.get(EventKind::Held, Family::Combined));
        assert!(!flags.get(EventKind::Press, Family::NegativeAlt));
        assert_eq!(
            flags.family(Family::NegativeAlt),
            [false, false, false, true, false]
        );
    }

    #[test]
    fn test_new_state_rests_at_neutral_value() {
        let timing = Timing::default();
        let profile = InputDefinition::axis("Axis")
            .with_interval(0.0, 10.0)
            .compile()
            .keyboard;
        let state = SourceState::new(&profile, &timing);

        assert_eq!(state.value(), 5.0);
        assert_eq!(state.main_value(), 5.0);
        assert_eq!(state.alt_value(), 5.0);
        assert_eq!(state.side(Side::PositiveMain).hold_timer, timing.hold_trigger_time);
        assert!(!state.event(EventKind::Press, Family::Combined));
    }
}
