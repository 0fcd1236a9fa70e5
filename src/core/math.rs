// Math utilities and helper functions

/// Clamp a value between min and max
pub fn clamp<T: PartialOrd>(value: T, min: T, max: T) -> T {
    if value < min {
        min
    } else if value > max {
        max
    } else {
        value
    }
}

/// Linear interpolation
///
/// Written as a weighted sum so that `t == 0.0` and `t == 1.0` return the
/// endpoints exactly.
pub fn lerp(a: f32, b: f32, t: f32) -> f32 {
    a * (1.0 - t) + b * t
}

/// Move `current` towards `target` by at most `max_delta`, never overshooting
pub fn move_towards(current: f32, target: f32, max_delta: f32) -> f32 {
    let distance = target - current;
    if distance.abs() <= max_delta {
        target
    } else {
        current + distance.signum() * max_delta
    }
}

/// True when both values are non-zero and lie on opposite sides of zero
pub fn opposite_signs(a: f32, b: f32) -> bool {
    (a > 0.0 && b < 0.0) || (a < 0.0 && b > 0.0)
}
