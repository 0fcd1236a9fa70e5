// Physical bindings and axis pairs

use winit::keyboard::KeyCode;

/// A physical control on a gamepad
///
/// Stick directions are half-axes: `LeftStickLeft` is the negative half of the
/// horizontal left stick. The discriminant doubles as the index into the
/// platform lookup table built by the gamepad backend.
#[repr(u8)]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum GamepadElement {
    // Face buttons (South=A, East=B, West=X, North=Y in Xbox layout)
    South,
    East,
    West,
    North,

    // Shoulders
    LeftBumper,
    RightBumper,
    LeftTrigger,
    RightTrigger,

    // Meta buttons
    Select,
    Start,
    Mode,

    // Stick clicks
    LeftThumb,
    RightThumb,

    // D-pad
    DPadUp,
    DPadDown,
    DPadLeft,
    DPadRight,

    // Stick half-axes
    LeftStickUp,
    LeftStickDown,
    LeftStickLeft,
    LeftStickRight,
    RightStickUp,
    RightStickDown,
    RightStickLeft,
    RightStickRight,
}

impl GamepadElement {
    /// Number of elements, i.e. the size of any table indexed by element
    pub const COUNT: usize = 25;

    /// Every element in discriminant order
    pub const ALL: [GamepadElement; Self::COUNT] = [
        Self::South,
        Self::East,
        Self::West,
        Self::North,
        Self::LeftBumper,
        Self::RightBumper,
        Self::LeftTrigger,
        Self::RightTrigger,
        Self::Select,
        Self::Start,
        Self::Mode,
        Self::LeftThumb,
        Self::RightThumb,
        Self::DPadUp,
        Self::DPadDown,
        Self::DPadLeft,
        Self::DPadRight,
        Self::LeftStickUp,
        Self::LeftStickDown,
        Self::LeftStickLeft,
        Self::LeftStickRight,
        Self::RightStickUp,
        Self::RightStickDown,
        Self::RightStickLeft,
        Self::RightStickRight,
    ];

    /// Index of this element in lookup tables
    pub fn index(self) -> usize {
        self as usize
    }

    /// Whether the element is read from an analog source and thresholded
    pub fn is_analog(self) -> bool {
        matches!(
            self,
            Self::LeftTrigger
                | Self::RightTrigger
                | Self::LeftStickUp
                | Self::LeftStickDown
                | Self::LeftStickLeft
                | Self::LeftStickRight
                | Self::RightStickUp
                | Self::RightStickDown
                | Self::RightStickLeft
                | Self::RightStickRight
        )
    }
}

/// Which side wins when both halves of an axis are held at once
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum StrongSide {
    /// Both sides cancel out
    #[default]
    None,
    Positive,
    Negative,
    /// The side matching the sign of the axis' current value wins
    FirstPressing,
}

/// A positive/negative pair of bindings for one device family
///
/// `B` is the binding space: [`KeyCode`] for the keyboard,
/// [`GamepadElement`] for gamepads. `None` means unbound.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Axis<B> {
    pub strong_side: StrongSide,
    pub positive: Option<B>,
    pub negative: Option<B>,
}

/// Keyboard axis
pub type KeyAxis = Axis<KeyCode>;

/// Gamepad axis
pub type GamepadAxis = Axis<GamepadElement>;

impl<B: Copy> Axis<B> {
    /// An axis with nothing bound
    pub fn unbound() -> Self {
        Self {
            strong_side: StrongSide::None,
            positive: None,
            negative: None,
        }
    }

    /// An axis with both sides bound
    pub fn pair(positive: B, negative: B) -> Self {
        Self {
            strong_side: StrongSide::None,
            positive: Some(positive),
            negative: Some(negative),
        }
    }

    /// An axis with only the positive side bound (buttons)
    pub fn positive(positive: B) -> Self {
        Self {
            strong_side: StrongSide::None,
            positive: Some(positive),
            negative: None,
        }
    }

    /// Set the strong side policy
    pub fn with_strong_side(mut self, strong_side: StrongSide) -> Self {
        self.strong_side = strong_side;
        self
    }

    /// Whether either side has a binding
    pub fn is_bound(&self) -> bool {
        self.positive.is_some() || self.negative.is_some()
    }
}

impl<B: Copy> Default for Axis<B> {
    fn default() -> Self {
        Self::unbound()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_element_table_is_in_discriminant_order() {
        for (index, element) in GamepadElement::ALL.iter().enumerate() {
            assert_eq!(element.index(), index);
        }
    }

    #[test]
    fn test_element_count_matches_last_discriminant() {
        assert_eq!(
            GamepadElement::RightStickRight.index() + 1,
            GamepadElement::COUNT
        );
    }

    #[test]
    fn test_analog_elements() {
        assert!(GamepadElement::LeftStickLeft.is_analog());
        assert!(GamepadElement::RightTrigger.is_analog());
        assert!(!GamepadElement::South.is_analog());
        assert!(!GamepadElement::DPadUp.is_analog());
    }

    #[test]
    fn test_axis_pair() {
        let axis = KeyAxis::pair(KeyCode::KeyD, KeyCode::KeyA);
        assert_eq!(axis.positive, Some(KeyCode::KeyD));
        assert_eq!(axis.negative, Some(KeyCode::KeyA));
        assert_eq!(axis.strong_side, StrongSide::None);
        assert!(axis.is_bound());
    }

    #[test]
    fn test_axis_unbound_default() {
        let axis = GamepadAxis::default();
        assert_eq!(axis, GamepadAxis::unbound());
        assert!(!axis.is_bound());
    }

    #[test]
    fn test_axis_positive_only() {
        let axis = GamepadAxis::positive(GamepadElement::South)
            .with_strong_side(StrongSide::Positive);
        assert_eq!(axis.positive, Some(GamepadElement::South));
        assert_eq!(axis.negative, None);
        assert_eq!(axis.strong_side, StrongSide::Positive);
    }
}
