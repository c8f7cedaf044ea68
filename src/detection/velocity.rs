//! Implied travel speed between two access events

/// Speed in miles per hour at or above which travel is considered impossible
pub const SUSPICIOUS_SPEED_MPH: i64 = 500;

/// Absolute difference between two unix timestamps in seconds
pub fn time_delta(t1: i64, t2: i64) -> i64 {
    t1.abs_diff(t2).min(i64::MAX as u64) as i64
}

/// Implied speed in miles per hour for a distance in miles covered in
/// `delta_seconds`.
///
/// The distance is rounded to the nearest mile first and the result is
/// truncated. Simultaneous events have no finite speed and yield `i64::MAX`,
/// so they always classify as suspicious, even from the same location.
pub fn speed_mph(distance_miles: f64, delta_seconds: i64) -> i64 {
    if delta_seconds == 0 {
        return i64::MAX;
    }

    let miles_per_second = distance_miles.round() / delta_seconds as f64;
    (miles_per_second * 3600.0) as i64
}

pub fn is_suspicious_speed(speed_mph: i64) -> bool {
    speed_mph >= SUSPICIOUS_SPEED_MPH
}
