//! Temporal roll-forward of production bounds.
//!
//! After a year is solved, each fuel's realized production bounds what it may produce the
//! following year: output can ramp up or down by at most the default percentage. Minima
//! below a materiality threshold are zeroed so negligible volumes do not over-constrain the
//! next year. The bounds feed back into the next `solve_equilibrium` call and are dropped
//! whenever a year is solved from a cold start instead.
use super::optimisation::Solution;
use crate::fuel::FuelID;
use crate::model::Model;
use indexmap::IndexMap;

/// Per-fuel (minimum, maximum) production bounds carried into the next year
pub type ProductionLimits = IndexMap<FuelID, (f64, f64)>;

/// Derive production bounds for the following year from this year's solution.
///
/// # Arguments
///
/// * `model` - The scenario model
/// * `year` - The year that was just solved
/// * `solution` - The year's solution
///
/// # Returns
///
/// Production bounds for year + 1, keyed by fuel.
pub fn derive_production_limits(
    model: &Model,
    year: u32,
    solution: &Solution,
) -> ProductionLimits {
    incremental_limits(
        &solution.fuel_supply(model, year),
        model.parameters.default_production_change,
        model.parameters.rollforward_threshold,
    )
}

/// Bracket each realized production quantity with the allowed percentage change.
fn incremental_limits(
    supply: &IndexMap<FuelID, f64>,
    pct_change: f64,
    threshold: f64,
) -> ProductionLimits {
    supply
        .iter()
        .map(|(fuel, quantity)| {
            let mut minimum = (1.0 - pct_change) * quantity;
            let maximum = (1.0 + pct_change) * quantity;

            if minimum < threshold {
                minimum = 0.0;
            }

            (fuel.clone(), (minimum, maximum))
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use float_cmp::assert_approx_eq;

    #[test]
    fn test_incremental_limits() {
        let supply = IndexMap::from_iter([(FuelID::from("ethanol"), 10e9)]);

        let limits = incremental_limits(&supply, 0.4, 1e9);
        let (minimum, maximum) = limits[&FuelID::from("ethanol")];
        assert_approx_eq!(f64, minimum, 6e9);
        assert_approx_eq!(f64, maximum, 14e9);
    }

    #[test]
    fn test_incremental_limits_threshold_zeroes_minimum() {
        let supply = IndexMap::from_iter([(FuelID::from("ethanol"), 1000.0)]);

        let limits = incremental_limits(&supply, 0.4, 1e9);
        let (minimum, maximum) = limits[&FuelID::from("ethanol")];
        assert_approx_eq!(f64, minimum, 0.0);
        assert_approx_eq!(f64, maximum, 1400.0);
    }

    #[test]
    fn test_incremental_limits_empty() {
        assert!(incremental_limits(&IndexMap::new(), 0.4, 1e9).is_empty());
    }
}
