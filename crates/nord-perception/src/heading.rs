//! Heading (yaw) extraction.

use nord_types::Quaternion;

/// Rotation about the vertical axis, in radians.
///
/// Returns the principal value of `atan2`, so the result lies in `[−π, π]`.
/// For finite inputs a 180° yaw gives `+π`; `−π` only appears when the sine
/// term is a negative zero (`atan2(−0.0, −1.0)`), which is the same
/// direction, so in practice the range is `(−π, π]`. A turn through ±180° jumps from near `+π` to near `−π` in one step; the
/// discontinuity is part of the output contract and is not unwrapped.
pub fn heading(q: &Quaternion) -> f64 {
    let siny_cosp = 2.0 * (q.w * q.z + q.x * q.y);
    let cosy_cosp = 1.0 - 2.0 * (q.y * q.y + q.z * q.z);
    siny_cosp.atan2(cosy_cosp)
}
