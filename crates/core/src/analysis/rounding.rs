/// Rounds the exact binary value at `places` decimal places, ties to even.
///
/// Goes through fixed-precision formatting so values such as 1.545 (stored as 1.54499...) round
/// down instead of being scaled up past the tie first.
pub fn round_to(value: f64, places: usize) -> f64 {
    format!("{value:.places$}").parse::<f64>().unwrap_or(value)
}

/// Offset of `derived` from `current`, in percent, rounded to one decimal.
///
/// Callers guard `current > 0` first.
pub fn pct_change(derived: f64, current: f64) -> f64 {
    round_to(((derived - current) / current) * 100.0, 1)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rounds_to_requested_places() {
        assert_eq!(round_to(103.004, 2), 103.0);
        assert_eq!(round_to(1.26, 1), 1.3);
        assert_eq!(round_to(-2.04, 1), -2.0);
        assert_eq!(round_to(42.0, 0), 42.0);
    }

    #[test]
    fn rounds_the_stored_value_not_the_scaled_one() {
        // 1.5 * 1.03 is stored as 1.54499999999999992895...
        assert_eq!(round_to(1.5 * 1.03, 2), 1.54);
        // 0.25 * 0.98 is stored as 0.24499999999999999556...
        assert_eq!(round_to(0.25 * 0.98, 2), 0.24);
        assert_eq!(round_to(1.75 * 1.06, 2), 1.85);
    }

    #[test]
    fn pct_change_is_relative_to_current() {
        assert_eq!(pct_change(103.0, 100.0), 3.0);
        assert_eq!(pct_change(98.0, 100.0), -2.0);
        assert_eq!(pct_change(150.0, 120.0), 25.0);
    }
}
