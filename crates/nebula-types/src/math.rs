//! Float/integer conversion helpers.
//!
//! Production curves and travel times are computed in `f64` and stored as
//! whole units. All lossy casts in the workspace funnel through these
//! functions so the cast lints only need relaxing in one place.

/// Convert a count to `f64`.
///
/// Counts in the simulation stay far below 2^52, so no precision is lost
/// in practice.
#[allow(clippy::cast_precision_loss)]
pub const fn to_f64(value: u64) -> f64 {
    value as f64
}

/// Convert a signed amount to `f64`.
#[allow(clippy::cast_precision_loss)]
pub const fn signed_to_f64(value: i64) -> f64 {
    value as f64
}

/// Floor a float into a `u64`. Negative and NaN inputs become 0; values
/// above `u64::MAX` saturate.
#[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
pub fn floor_u64(value: f64) -> u64 {
    if value.is_nan() || value <= 0.0 {
        return 0;
    }
    // `as` saturates on overflow for float-to-int casts.
    value.floor() as u64
}

/// Ceil a float into a `u64` with the same clamping as [`floor_u64`].
#[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
pub fn ceil_u64(value: f64) -> u64 {
    if value.is_nan() || value <= 0.0 {
        return 0;
    }
    value.ceil() as u64
}

/// Round a float to the nearest `u64` with the same clamping as
/// [`floor_u64`].
#[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
pub fn round_u64(value: f64) -> u64 {
    if value.is_nan() || value <= 0.0 {
        return 0;
    }
    value.round() as u64
}

/// Floor a float into an `i64`, saturating at the type bounds. NaN
/// becomes 0.
#[allow(clippy::cast_possible_truncation)]
pub fn floor_i64(value: f64) -> i64 {
    if value.is_nan() {
        return 0;
    }
    value.floor() as i64
}
