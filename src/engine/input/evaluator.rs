// Per-frame evaluation of one input on one device instance
//
// Two halves: value shaping (strong side weighting, target selection and
// interpolation, run once for the Main layer and once for Alt) and event
// derivation (edges, hold and double-press timers per bound side, then the
// composite families OR'ed bottom-up).

use super::binding::StrongSide;
use super::definition::{InputType, Interpolation, SourceProfile};
use super::device::DeviceSample;
use super::settings::Timing;
use super::state::{Bindable, EventFlags, EventKind, Family, Side, SideState, SourceState};
use crate::core::math::{clamp, lerp, move_towards, opposite_signs};

/// Advance `state` by one frame of `delta_time` seconds using a fresh sample
pub fn evaluate(
    profile: &SourceProfile,
    state: &mut SourceState,
    sample: DeviceSample,
    timing: &Timing,
    delta_time: f32,
) {
    state.sample = sample;

    state.main_value = shape_layer(
        profile,
        profile.main_strong_side,
        state.main_value,
        sample.pressed(Side::PositiveMain),
        sample.pressed(Side::NegativeMain),
        timing.interpolation_time,
        delta_time,
    );
    state.alt_value = shape_layer(
        profile,
        profile.alt_strong_side,
        state.alt_value,
        sample.pressed(Side::PositiveAlt),
        sample.pressed(Side::NegativeAlt),
        timing.interpolation_time,
        delta_time,
    );
    // Main wins whenever it is non-zero, whatever the magnitudes
    state.value = if state.main_value != 0.0 {
        state.main_value
    } else {
        state.alt_value
    };

    for side in Side::ALL {
        if !profile.bindable.side(side) {
            continue;
        }
        let events = advance_side(
            &mut state.sides[side.index()],
            sample.pressed(side),
            timing,
            delta_time,
        );
        for kind in EventKind::ALL {
            state.events.set(kind, side.family(), events[kind.index()]);
        }
    }

    compose_families(&mut state.events, &profile.bindable);
}

/// Target of one layer for the current press state
pub fn layer_target(
    profile: &SourceProfile,
    strong_side: StrongSide,
    current: f32,
    positive_pressed: bool,
    negative_pressed: bool,
) -> f32 {
    let mut positive = if positive_pressed { 1.0 } else { 0.0 };
    let mut negative = if negative_pressed { 1.0 } else { 0.0 };

    match strong_side {
        StrongSide::None => {}
        StrongSide::Positive => positive *= 2.0,
        StrongSide::Negative => negative *= 2.0,
        // Keyed off the stored value's sign, not press order
        StrongSide::FirstPressing => {
            if current > 0.0 {
                positive *= 2.0;
            } else if current < 0.0 {
                negative *= 2.0;
            }
        }
    }

    let factor = clamp(positive - negative, -1.0, 1.0);
    let factor = match profile.input_type {
        InputType::Axis => (factor + 1.0) * 0.5,
        InputType::Button => clamp(factor, 0.0, 1.0),
    };

    let (low, high) = profile.interval.endpoints(profile.invert);
    lerp(low, high, factor)
}

/// Move `current` towards `target` according to the interpolation mode
pub fn interpolate(
    mode: Interpolation,
    current: f32,
    target: f32,
    interpolation_time: f32,
    delta_time: f32,
) -> f32 {
    if mode == Interpolation::Instant || interpolation_time <= 0.0 {
        return target;
    }

    let max_step = delta_time / interpolation_time;
    match mode {
        Interpolation::Jump if target != 0.0 && opposite_signs(target, current) => 0.0,
        _ => move_towards(current, target, max_step),
    }
}

fn shape_layer(
    profile: &SourceProfile,
    strong_side: StrongSide,
    current: f32,
    positive_pressed: bool,
    negative_pressed: bool,
    interpolation_time: f32,
    delta_time: f32,
) -> f32 {
    let target = layer_target(profile, strong_side, current, positive_pressed, negative_pressed);
    interpolate(
        profile.interpolation,
        current,
        target,
        interpolation_time,
        delta_time,
    )
}

/// Run one side's edge detection and timers; returns flags in [`EventKind`] order
fn advance_side(
    side: &mut SideState,
    pressed: bool,
    timing: &Timing,
    delta_time: f32,
) -> [bool; EventKind::COUNT] {
    let down = pressed && !side.was_pressed;
    let up = !pressed && side.was_pressed;
    side.was_pressed = pressed;

    let held = if pressed {
        side.hold_timer -= delta_time;
        if side.hold_timer <= 0.0 {
            side.hold_timer = timing.hold_wait_time;
            true
        } else {
            false
        }
    } else {
        if side.hold_timer != timing.hold_trigger_time {
            side.hold_timer = timing.hold_trigger_time;
        }
        false
    };

    // The window only ticks while open
    if side.double_press_timer > 0.0 {
        side.double_press_timer = (side.double_press_timer - delta_time).max(0.0);
        if side.double_press_timer <= 0.0 {
            side.double_press_initiated = false;
        }
    }

    let mut double_press = false;
    if up {
        side.double_press_timer = timing.double_press_timeout;
        if side.double_press_initiated {
            double_press = true;
            side.double_press_initiated = false;
        } else {
            side.double_press_initiated = side.double_press_timer > 0.0;
        }
    }

    let mut events = [false; EventKind::COUNT];
    events[EventKind::Press.index()] = pressed;
    events[EventKind::Down.index()] = down;
    events[EventKind::Up.index()] = up;
    events[EventKind::Held.index()] = held;
    events[EventKind::DoublePress.index()] = double_press;
    events
}

/// OR leaf flags into Main/Alt/Positive/Negative, then those into Combined
///
/// Families without a bindable side are left untouched.
fn compose_families(events: &mut EventFlags, bindable: &Bindable) {
    let composites = [
        (Family::Main, [Family::PositiveMain, Family::NegativeMain]),
        (Family::Alt, [Family::PositiveAlt, Family::NegativeAlt]),
        (Family::Positive, [Family::PositiveMain, Family::PositiveAlt]),
        (Family::Negative, [Family::NegativeMain, Family::NegativeAlt]),
        (Family::Combined, [Family::Main, Family::Alt]),
    ];

    for (family, [first, second]) in composites {
        if !bindable.family(family) {
            continue;
        }
        for kind in EventKind::ALL {
            let value = events.get(kind, first) || events.get(kind, second);
            events.set(kind, family, value);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::engine::input::binding::KeyAxis;
    use crate::engine::input::definition::InputDefinition;
    use approx::assert_relative_eq;
    use proptest::prelude::*;
    use winit::keyboard::KeyCode;

    const DT: f32 = 0.125;

    fn timing() -> Timing {
        Timing {
            interpolation_time: 0.5,
            hold_trigger_time: 0.5,
            hold_wait_time: 0.25,
            double_press_timeout: 0.5,
        }
    }

    fn horizontal(interpolation: Interpolation) -> SourceProfile {
        InputDefinition::axis("Horizontal")
            .with_interpolation(interpolation)
            .with_main_keys(KeyAxis::pair(KeyCode::KeyD, KeyCode::KeyA))
            .compile()
            .keyboard
    }

    fn fire(interpolation: Interpolation) -> SourceProfile {
        let mut definition = InputDefinition::button("Fire")
            .with_interpolation(interpolation)
            .with_main_keys(KeyAxis::positive(KeyCode::Space));
        definition.trim();
        definition.compile().keyboard
    }

    fn positive() -> DeviceSample {
        DeviceSample::new(true, false, false, false)
    }

    fn negative() -> DeviceSample {
        DeviceSample::new(false, true, false, false)
    }

    fn released() -> DeviceSample {
        DeviceSample::default()
    }

    /// Run the samples and return which frames (1-based) raised `kind` on `family`
    fn frames_with(
        profile: &SourceProfile,
        timing: &Timing,
        samples: &[DeviceSample],
        kind: EventKind,
        family: Family,
    ) -> Vec<usize> {
        let mut state = SourceState::new(profile, timing);
        let mut frames = Vec::new();
        for (frame, sample) in samples.iter().enumerate() {
            evaluate(profile, &mut state, *sample, timing, DT);
            if state.event(kind, family) {
                frames.push(frame + 1);
            }
        }
        frames
    }

    #[test]
    fn test_instant_axis_follows_keys() {
        let profile = horizontal(Interpolation::Instant);
        let timing = timing();
        let mut state = SourceState::new(&profile, &timing);

        evaluate(&profile, &mut state, negative(), &timing, DT);
        assert_eq!(state.value(), -1.0);

        evaluate(&profile, &mut state, released(), &timing, DT);
        assert_eq!(state.value(), 0.0);

        evaluate(&profile, &mut state, positive(), &timing, DT);
        assert_eq!(state.value(), 1.0);
    }

    #[test]
    fn test_smooth_button_steps_linearly() {
        let profile = fire(Interpolation::Smooth);
        let timing = Timing {
            interpolation_time: 0.25,
            ..timing()
        };
        let mut state = SourceState::new(&profile, &timing);

        evaluate(&profile, &mut state, positive(), &timing, 0.1);
        assert_relative_eq!(state.value(), 0.4);
    }

    #[test]
    fn test_instant_matches_lerp_for_any_delta() {
        let profile = InputDefinition::axis("Throttle")
            .with_interval(2.0, 6.0)
            .inverted(true)
            .with_interpolation(Interpolation::Instant)
            .with_main_keys(KeyAxis::pair(KeyCode::KeyW, KeyCode::KeyS))
            .compile()
            .keyboard;
        let timing = timing();

        for delta_time in [0.0, 0.001, 1.0, 100.0] {
            let mut state = SourceState::new(&profile, &timing);
            evaluate(&profile, &mut state, positive(), &timing, delta_time);
            assert_eq!(state.main_value(), lerp(6.0, 2.0, 1.0));
        }
    }

    #[test]
    fn test_smooth_reaches_target_in_expected_ticks() {
        let profile = horizontal(Interpolation::Smooth);
        let timing = timing();
        let mut state = SourceState::new(&profile, &timing);

        // |delta| * interpolation_time / dt = 1 * 0.5 / 0.125 = 4 ticks
        let mut distances = Vec::new();
        for _ in 0..4 {
            evaluate(&profile, &mut state, positive(), &timing, DT);
            distances.push(1.0 - state.value());
        }
        assert_eq!(distances, vec![0.75, 0.5, 0.25, 0.0]);
    }

    #[test]
    fn test_zero_interpolation_time_snaps() {
        let profile = horizontal(Interpolation::Smooth);
        let timing = Timing {
            interpolation_time: 0.0,
            ..timing()
        };
        let mut state = SourceState::new(&profile, &timing);

        evaluate(&profile, &mut state, negative(), &timing, DT);
        assert_eq!(state.value(), -1.0);
    }

    #[test]
    fn test_infinite_interpolation_time_never_moves() {
        let profile = horizontal(Interpolation::Smooth);
        let timing = Timing {
            interpolation_time: f32::INFINITY,
            ..timing()
        };
        let mut state = SourceState::new(&profile, &timing);

        evaluate(&profile, &mut state, positive(), &timing, DT);
        assert_eq!(state.value(), 0.0);
    }

    #[test]
    fn test_jump_recentres_on_reversal() {
        let profile = horizontal(Interpolation::Jump);
        let timing = timing();
        let mut state = SourceState::new(&profile, &timing);

        evaluate(&profile, &mut state, positive(), &timing, DT);
        evaluate(&profile, &mut state, positive(), &timing, DT);
        assert_eq!(state.value(), 0.5);

        evaluate(&profile, &mut state, negative(), &timing, DT);
        assert_eq!(state.value(), 0.0);

        // From rest the value steps normally in either direction
        evaluate(&profile, &mut state, negative(), &timing, DT);
        assert_eq!(state.value(), -0.25);
    }

    #[test]
    fn test_smooth_does_not_recentre_on_reversal() {
        let profile = horizontal(Interpolation::Smooth);
        let timing = timing();
        let mut state = SourceState::new(&profile, &timing);

        evaluate(&profile, &mut state, positive(), &timing, DT);
        evaluate(&profile, &mut state, positive(), &timing, DT);
        evaluate(&profile, &mut state, negative(), &timing, DT);
        assert_eq!(state.value(), 0.25);
    }

    #[test]
    fn test_both_sides_cancel_without_strong_side() {
        let profile = horizontal(Interpolation::Instant);
        let target = layer_target(&profile, StrongSide::None, 0.0, true, true);
        assert_eq!(target, 0.0);
    }

    #[test]
    fn test_strong_side_wins() {
        let profile = horizontal(Interpolation::Instant);
        assert_eq!(
            layer_target(&profile, StrongSide::Positive, 0.0, true, true),
            1.0
        );
        assert_eq!(
            layer_target(&profile, StrongSide::Negative, 0.0, true, true),
            -1.0
        );
    }

    #[test]
    fn test_first_pressing_follows_current_sign() {
        let profile = horizontal(Interpolation::Instant);
        assert_eq!(
            layer_target(&profile, StrongSide::FirstPressing, 0.3, true, true),
            1.0
        );
        assert_eq!(
            layer_target(&profile, StrongSide::FirstPressing, -0.3, true, true),
            -1.0
        );
        assert_eq!(
            layer_target(&profile, StrongSide::FirstPressing, 0.0, true, true),
            0.0
        );
    }

    #[test]
    fn test_main_takes_precedence_over_alt() {
        let profile = InputDefinition::axis("Horizontal")
            .with_interpolation(Interpolation::Instant)
            .with_main_keys(KeyAxis::pair(KeyCode::KeyD, KeyCode::KeyA))
            .with_alt_keys(KeyAxis::pair(KeyCode::ArrowRight, KeyCode::ArrowLeft))
            .compile()
            .keyboard;
        let timing = timing();
        let mut state = SourceState::new(&profile, &timing);

        evaluate(
            &profile,
            &mut state,
            DeviceSample::new(false, true, true, false),
            &timing,
            DT,
        );
        assert_eq!(state.main_value(), -1.0);
        assert_eq!(state.alt_value(), 1.0);
        assert_eq!(state.value(), -1.0);

        evaluate(
            &profile,
            &mut state,
            DeviceSample::new(false, false, true, false),
            &timing,
            DT,
        );
        assert_eq!(state.value(), 1.0);
    }

    #[test]
    fn test_edges() {
        let profile = fire(Interpolation::Instant);
        let samples = [positive(), positive(), released(), released()];
        let timing = timing();

        assert_eq!(
            frames_with(&profile, &timing, &samples, EventKind::Down, Family::Combined),
            vec![1]
        );
        assert_eq!(
            frames_with(&profile, &timing, &samples, EventKind::Press, Family::Combined),
            vec![1, 2]
        );
        assert_eq!(
            frames_with(&profile, &timing, &samples, EventKind::Up, Family::Combined),
            vec![3]
        );
    }

    #[test]
    fn test_hold_fires_at_trigger_then_repeats() {
        let profile = fire(Interpolation::Instant);
        let samples = [positive(); 10];

        assert_eq!(
            frames_with(&profile, &timing(), &samples, EventKind::Held, Family::PositiveMain),
            vec![4, 6, 8, 10]
        );
    }

    #[test]
    fn test_hold_resets_on_release() {
        let profile = fire(Interpolation::Instant);
        let mut samples = vec![positive(); 3];
        samples.push(released());
        samples.extend([positive(); 4]);

        assert_eq!(
            frames_with(&profile, &timing(), &samples, EventKind::Held, Family::Combined),
            vec![8]
        );
    }

    #[test]
    fn test_zero_hold_times_fire_every_frame() {
        let profile = fire(Interpolation::Instant);
        let timing = Timing {
            hold_trigger_time: 0.0,
            hold_wait_time: 0.0,
            ..timing()
        };
        let samples = [positive(), positive(), positive(), released()];

        assert_eq!(
            frames_with(&profile, &timing, &samples, EventKind::Held, Family::Combined),
            vec![1, 2, 3]
        );
    }

    #[test]
    fn test_double_press_inside_window() {
        let profile = fire(Interpolation::Instant);
        let samples = [positive(), released(), positive(), released()];

        assert_eq!(
            frames_with(&profile, &timing(), &samples, EventKind::DoublePress, Family::Combined),
            vec![4]
        );
    }

    #[test]
    fn test_double_press_window_expires() {
        let profile = fire(Interpolation::Instant);
        // Releases on frames 2 and 6: 0.5s apart, equal to the timeout
        let samples = [
            positive(),
            released(),
            positive(),
            positive(),
            positive(),
            released(),
        ];

        assert!(frames_with(
            &profile,
            &timing(),
            &samples,
            EventKind::DoublePress,
            Family::Combined
        )
        .is_empty());
    }

    #[test]
    fn test_third_release_starts_fresh_window() {
        let profile = fire(Interpolation::Instant);
        let samples = [
            positive(),
            released(),
            positive(),
            released(),
            positive(),
            released(),
            positive(),
            released(),
        ];

        assert_eq!(
            frames_with(&profile, &timing(), &samples, EventKind::DoublePress, Family::Combined),
            vec![4, 8]
        );
    }

    #[test]
    fn test_zero_double_press_timeout_never_fires() {
        let profile = fire(Interpolation::Instant);
        let timing = Timing {
            double_press_timeout: 0.0,
            ..timing()
        };
        let samples = [positive(), released(), positive(), released()];

        assert!(frames_with(
            &profile,
            &timing,
            &samples,
            EventKind::DoublePress,
            Family::Combined
        )
        .is_empty());
    }

    #[test]
    fn test_composite_families() {
        let profile = InputDefinition::axis("Horizontal")
            .with_interpolation(Interpolation::Instant)
            .with_main_keys(KeyAxis::pair(KeyCode::KeyD, KeyCode::KeyA))
            .with_alt_keys(KeyAxis::pair(KeyCode::ArrowRight, KeyCode::ArrowLeft))
            .compile()
            .keyboard;
        let timing = timing();
        let mut state = SourceState::new(&profile, &timing);

        evaluate(
            &profile,
            &mut state,
            DeviceSample::new(false, false, false, true),
            &timing,
            DT,
        );

        assert!(state.event(EventKind::Press, Family::NegativeAlt));
        assert!(state.event(EventKind::Press, Family::Alt));
        assert!(state.event(EventKind::Press, Family::Negative));
        assert!(state.event(EventKind::Press, Family::Combined));
        assert!(state.event(EventKind::Down, Family::Combined));
        assert!(!state.event(EventKind::Press, Family::Main));
        assert!(!state.event(EventKind::Press, Family::Positive));
    }

    #[test]
    fn test_unbound_sides_stay_silent() {
        let profile = fire(Interpolation::Instant);
        let timing = timing();
        let mut state = SourceState::new(&profile, &timing);

        // A stray sample on an unbound slot must not produce events
        evaluate(
            &profile,
            &mut state,
            DeviceSample::new(false, true, true, false),
            &timing,
            DT,
        );
        assert_eq!(state.events(), &EventFlags::default());
    }

    fn profile_strategy() -> impl Strategy<Value = SourceProfile> {
        (
            prop::bool::ANY,
            prop::bool::ANY,
            prop::sample::select(vec![
                Interpolation::Smooth,
                Interpolation::Jump,
                Interpolation::Instant,
            ]),
            prop::sample::select(vec![
                StrongSide::None,
                StrongSide::Positive,
                StrongSide::Negative,
                StrongSide::FirstPressing,
            ]),
            -5.0f32..5.0,
            0.0f32..5.0,
        )
            .prop_map(|(is_button, invert, interpolation, strong_side, min, span)| {
                let base = if is_button {
                    InputDefinition::button("Generated")
                } else {
                    InputDefinition::axis("Generated")
                };
                let mut definition = base
                    .with_interval(min, min + span)
                    .inverted(invert)
                    .with_interpolation(interpolation)
                    .with_main_keys(
                        KeyAxis::pair(KeyCode::KeyD, KeyCode::KeyA).with_strong_side(strong_side),
                    )
                    .with_alt_keys(
                        KeyAxis::pair(KeyCode::ArrowRight, KeyCode::ArrowLeft)
                            .with_strong_side(strong_side),
                    );
                definition.trim();
                definition.compile().keyboard
            })
    }

    proptest! {
        #[test]
        fn prop_values_stay_inside_interval(
            profile in profile_strategy(),
            interpolation_time in prop::sample::select(vec![0.0f32, 0.1, 0.25, 1.0]),
            frames in prop::collection::vec(
                ((prop::bool::ANY, prop::bool::ANY, prop::bool::ANY, prop::bool::ANY), 0.0f32..1.0),
                1..40,
            ),
        ) {
            let timing = Timing { interpolation_time, ..timing() };
            let mut state = SourceState::new(&profile, &timing);
            let (min, max) = (profile.interval.min, profile.interval.max);

            for ((pm, nm, pa, na), delta_time) in frames {
                let sample = DeviceSample::new(pm, nm, pa, na);
                evaluate(&profile, &mut state, sample, &timing, delta_time);
                for value in [state.main_value(), state.alt_value(), state.value()] {
                    prop_assert!(
                        value >= min && value <= max,
                        "{} outside [{}, {}]",
                        value,
                        min,
                        max
                    );
                }
            }
        }

        #[test]
        fn prop_smooth_distance_never_grows(
            steps in prop::collection::vec(0.0f32..0.3, 1..30),
        ) {
            let profile = horizontal(Interpolation::Smooth);
            let timing = timing();
            let mut state = SourceState::new(&profile, &timing);
            let mut last = (1.0 - state.value()).abs();

            for delta_time in steps {
                evaluate(&profile, &mut state, positive(), &timing, delta_time);
                let distance = (1.0 - state.value()).abs();
                prop_assert!(distance <= last);
                last = distance;
            }
        }

        #[test]
        fn prop_held_never_fires_while_released(
            presses in prop::collection::vec(prop::bool::ANY, 1..60),
        ) {
            let profile = fire(Interpolation::Instant);
            let timing = timing();
            let mut state = SourceState::new(&profile, &timing);

            for pressed in presses {
                let sample = DeviceSample::new(pressed, false, false, false);
                evaluate(&profile, &mut state, sample, &timing, DT);
                if !pressed {
                    prop_assert!(!state.event(EventKind::Held, Family::Combined));
                }
            }
        }
    }
}
