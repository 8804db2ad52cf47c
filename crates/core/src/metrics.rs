//! Valuation metrics. Pure numeric functions, no I/O.
//!
//! All returns are expressed in percent. The target-price math assumes a 15%
//! compound annual return over a fixed 5-year horizon.

const ANNUAL_RATE: f64 = 0.15;
const HORIZON_YEARS: f64 = 5.0;

fn compounding_factor() -> f64 {
    (1.0 + ANNUAL_RATE).powf(HORIZON_YEARS)
}

/// Entry price at which today's target represents a 15% CAGR over 5 years.
pub fn price_for_15_annual(target_price: f64) -> f64 {
    target_price / compounding_factor()
}

/// Forward price implied by 15% annual compounding from the current price.
pub fn five_year_target_price(current_price: f64) -> f64 {
    current_price * compounding_factor()
}

/// CAGR implied by moving from current to target over the horizon.
/// A non-positive current price has no defined growth rate; returns 0.
pub fn annual_return_pct(current_price: f64, target_price: f64) -> f64 {
    if current_price <= 0.0 {
        return 0.0;
    }
    ((target_price / current_price).powf(1.0 / HORIZON_YEARS) - 1.0) * 100.0
}

/// Total return from current to target. Same non-positive guard.
pub fn five_year_return_pct(current_price: f64, target_price: f64) -> f64 {
    if current_price <= 0.0 {
        return 0.0;
    }
    ((target_price - current_price) / current_price) * 100.0
}

/// Position of the current price within its 52-week range, in percent.
/// A degenerate range (high == low, e.g. a single data point) maps to the
/// midpoint 50 rather than dividing by zero.
pub fn week52_position_pct(current_price: f64, low: f64, high: f64) -> f64 {
    if high == low {
        return 50.0;
    }
    ((current_price - low) / (high - low)) * 100.0
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn degenerate_range_maps_to_midpoint() {
        assert_eq!(week52_position_pct(123.0, 40.0, 40.0), 50.0);
        assert_eq!(week52_position_pct(0.0, 0.0, 0.0), 50.0);
        assert_eq!(week52_position_pct(-5.0, 10.0, 10.0), 50.0);
    }

    #[test]
    fn returns_are_zero_for_non_positive_current_price() {
        assert_eq!(annual_return_pct(0.0, 100.0), 0.0);
        assert_eq!(annual_return_pct(-1.0, 100.0), 0.0);
        assert_eq!(five_year_return_pct(0.0, 100.0), 0.0);
        assert_eq!(five_year_return_pct(-1.0, 100.0), 0.0);
    }

    #[test]
    fn entry_price_and_forward_target_are_inverses() {
        for target in [1.0, 72.0, 210.0, 450.0, 12345.67] {
            let entry = price_for_15_annual(target);
            let roundtrip = five_year_target_price(entry);
            assert!(
                (roundtrip - target).abs() < 1e-9,
                "target {target}: roundtrip {roundtrip}"
            );
        }
    }

    #[test]
    fn worked_example_matches_expected_values() {
        // current=50, target=100, 52w range 40..60
        assert_eq!(week52_position_pct(50.0, 40.0, 60.0), 50.0);
        assert_eq!(five_year_return_pct(50.0, 100.0), 100.0);

        let annual = annual_return_pct(50.0, 100.0);
        assert!((annual - 14.87).abs() < 0.01, "annual {annual}");

        let entry = price_for_15_annual(100.0);
        assert!((entry - 49.72).abs() < 0.01, "entry {entry}");
    }

    #[test]
    fn forward_target_compounds_from_current() {
        let fwd = five_year_target_price(100.0);
        assert!((fwd - 201.135).abs() < 0.01, "fwd {fwd}");
    }
}
