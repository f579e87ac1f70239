//! Mathematical helpers for score activation and angle handling.

use std::f32::consts::PI;

/// Logistic sigmoid.
pub(crate) fn sigmoid(x: f32) -> f32 {
    1.0 / (1.0 + (-x).exp())
}

/// Wraps an angle in radians to the range [-pi, pi).
pub(crate) fn normalize_radians(angle: f32) -> f32 {
    angle - 2.0 * PI * ((angle + PI) / (2.0 * PI)).floor()
}
