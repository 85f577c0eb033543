// crates/kinoplay-core/src/helpers/time.rs
//
// Time-unit conversions and the float compare used by change-detecting
// setters. The public API speaks milliseconds, the engine seconds; every
// crossing goes through here so rounding is consistent.

/// Convert seconds to whole milliseconds, rounding half away from zero.
///
/// ```
/// use kinoplay_core::helpers::time::secs_to_ms;
/// assert_eq!(secs_to_ms(0.999), 999);
/// assert_eq!(secs_to_ms(0.0004), 0);
/// ```
pub fn secs_to_ms(secs: f64) -> i64 {
    (secs * 1000.0).round() as i64
}

/// Convert milliseconds to seconds.
///
/// ```
/// use kinoplay_core::helpers::time::ms_to_secs;
/// assert_eq!(ms_to_secs(1500), 1.5);
/// ```
pub fn ms_to_secs(ms: i64) -> f64 {
    ms as f64 / 1000.0
}

/// Equality for seconds and speed factors. Values this close are the same
/// instant or rate for playback purposes, so setters treat them as no-ops.
pub fn fuzzy_eq(a: f64, b: f64) -> bool {
    (a - b).abs() < 1e-9
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn round_trips_whole_milliseconds() {
        for ms in [0i64, 1, 40, 999, 15_019] {
            assert_eq!(secs_to_ms(ms_to_secs(ms)), ms);
        }
    }

    #[test]
    fn fuzzy_eq_tolerates_float_noise() {
        assert!(fuzzy_eq(0.1 + 0.2, 0.3));
        assert!(!fuzzy_eq(1.0, 1.001));
    }
}
