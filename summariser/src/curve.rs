//! The bonding curve price function, used as an oracle to cross-check reported prices and to
//! produce chart data for a family of curves.

use polars::prelude::*;

/// Exponents compared by default when sampling curves
pub const DEFAULT_EXPONENTS: [f64; 5] = [1.0, 1.5, 2.0, 2.5, 3.0];

pub const SUPPLY: &str = "supply";

/// Price at a given supply: `(supply / max_supply)^exponent * max_price`.
pub fn price_at(supply: f64, exponent: f64, max_supply: f64, max_price: f64) -> f64 {
    (supply / max_supply).powf(exponent) * max_price
}

/// Whether a price reported by the harness matches the oracle within a relative tolerance.
///
/// The harness works in integer wei, so an exact match is not expected.
pub fn check_final_price(reported_wei: u128, expected_wei: f64, tolerance: f64) -> bool {
    let reported = reported_wei as f64;
    let scale = expected_wei.abs().max(1.0);
    (reported - expected_wei).abs() / scale <= tolerance
}

/// Column name for the curve with the given exponent
pub fn curve_column(exponent: f64) -> String {
    format!("n = {exponent}")
}

/// Sample the price curve for each exponent at `points` evenly spaced supplies in
/// `[0, max_supply]`.
pub fn sample_curves(
    exponents: &[f64],
    max_supply: f64,
    max_price: f64,
    points: usize,
) -> PolarsResult<DataFrame> {
    let steps = points.max(2);
    let supply = (0..steps)
        .map(|i| max_supply * i as f64 / (steps - 1) as f64)
        .collect::<Vec<_>>();

    let mut columns = Vec::with_capacity(exponents.len() + 1);
    for &exponent in exponents {
        let prices = supply
            .iter()
            .map(|s| price_at(*s, exponent, max_supply, max_price))
            .collect::<Vec<_>>();
        columns.push(Column::new(curve_column(exponent).into(), prices));
    }
    columns.insert(0, Column::new(SUPPLY.into(), supply));

    DataFrame::new(columns)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn price_is_power_of_normalised_supply() {
        assert_eq!(0.0, price_at(0.0, 2.0, 100.0, 0.1));
        assert!((price_at(100.0, 2.0, 100.0, 0.1) - 0.1).abs() < 1e-12);
        assert!((price_at(50.0, 2.0, 100.0, 0.1) - 0.025).abs() < 1e-12);
        assert!((price_at(50.0, 1.0, 100.0, 0.1) - 0.05).abs() < 1e-12);
    }

    #[test]
    fn reported_final_price_matches_oracle() {
        // 700 of 1000 tokens sold on a quadratic curve capped at 0.1 ETH
        let expected = price_at(700.0, 2.0, 1000.0, 1e17);
        assert!(check_final_price(49_000_000_000_000_000, expected, 1e-9));
        assert!(check_final_price(48_999_999_999_999_990, expected, 1e-9));
        assert!(!check_final_price(50_000_000_000_000_000, expected, 1e-9));
    }

    #[test]
    fn sample_curves_shape() -> anyhow::Result<()> {
        let frame = sample_curves(&DEFAULT_EXPONENTS, 100_000_000.0, 0.1, 11)?;

        assert_eq!((11, 6), frame.shape());
        let supply = frame.column(SUPPLY)?.f64()?;
        assert_eq!(Some(0.0), supply.get(0));
        assert_eq!(Some(100_000_000.0), supply.get(10));

        let quadratic = frame.column(&curve_column(2.0))?.f64()?;
        assert!((quadratic.get(5).unwrap() - 0.025).abs() < 1e-12);
        assert!((quadratic.get(10).unwrap() - 0.1).abs() < 1e-12);
        Ok(())
    }
}
