//! Fuels and the demand pools they serve.
//!
//! A fuel pool aggregates demand which one or more fuels jointly supply (e.g. every fuel
//! blended into the gasoline pool). Fuels carry the per-year supply floors and production
//! limits used by the supply/growth constraint family.
use crate::id::define_id_type;
use crate::year::closest_entry;
use indexmap::IndexMap;
use std::collections::BTreeMap;

define_id_type! {FuelID}
define_id_type! {FuelPoolID}

/// A map of [`Fuel`]s, keyed by fuel ID
pub type FuelMap = IndexMap<FuelID, Fuel>;

/// A map of [`FuelPool`]s, keyed by pool ID
pub type FuelPoolMap = IndexMap<FuelPoolID, FuelPool>;

/// An externally supplied minimum quantity of a fuel, with its policy attribution
#[derive(PartialEq, Debug, Clone)]
pub struct FuelSupply {
    /// Minimum quantity of fuel which must be produced (MJ)
    pub quantity: f64,
    /// The policy responsible for the requirement, if any
    pub attribution: Option<String>,
}

/// A per-year production limit for a fuel
#[derive(PartialEq, Debug, Clone, Copy)]
pub struct FuelLimit {
    /// Maximum production quantity (MJ)
    pub maximum: f64,
    /// Maximum year-over-year fractional change in production.
    ///
    /// Overrides the model-wide default when non-zero.
    pub pct_change: f64,
}

/// A fuel which serves exactly one fuel pool
#[derive(PartialEq, Debug, Clone)]
pub struct Fuel {
    /// A unique identifier for the fuel (e.g. "ethanol")
    pub id: FuelID,
    /// The demand pool this fuel supplies
    pub pool: FuelPoolID,
    /// Externally supplied minimum production quantities, by year
    pub supply: BTreeMap<u32, FuelSupply>,
    /// Production limits, by year
    pub limits: BTreeMap<u32, FuelLimit>,
}

impl Fuel {
    /// Create a new [`Fuel`] serving the given pool
    pub fn new(id: FuelID, pool: FuelPoolID) -> Self {
        Self {
            id,
            pool,
            supply: BTreeMap::new(),
            limits: BTreeMap::new(),
        }
    }

    /// Record a minimum supply requirement for a year
    pub fn add_supply(&mut self, year: u32, quantity: f64, attribution: Option<String>) {
        self.supply.insert(
            year,
            FuelSupply {
                quantity,
                attribution,
            },
        );
    }

    /// Record a production limit for a year
    pub fn add_limit(&mut self, year: u32, maximum: f64, pct_change: f64) {
        self.limits.insert(
            year,
            FuelLimit {
                maximum,
                pct_change,
            },
        );
    }
}

/// A demand aggregation bucket jointly supplied by one or more fuels
#[derive(PartialEq, Debug, Clone)]
pub struct FuelPool {
    /// A unique identifier for the pool (e.g. "gasoline")
    pub id: FuelPoolID,
    /// Energy demand for the pool, by year (MJ)
    pub demand: BTreeMap<u32, f64>,
    /// Whether supply may exceed demand (demand is a floor rather than an equality)
    pub exceed: bool,
}

impl FuelPool {
    /// Create a new [`FuelPool`] with no demand
    pub fn new(id: FuelPoolID) -> Self {
        Self {
            id,
            demand: BTreeMap::new(),
            exceed: false,
        }
    }

    /// The pool's demand for the year defined nearest to `year`
    pub fn demand(&self, year: u32) -> Option<f64> {
        closest_entry(&self.demand, year).copied()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use float_cmp::assert_approx_eq;

    #[test]
    fn test_pool_demand_resolves_nearest_year() {
        let mut pool = FuelPool::new("gasoline".into());
        pool.demand.insert(2020, 100.0);
        pool.demand.insert(2030, 50.0);

        assert_approx_eq!(f64, pool.demand(2019).unwrap(), 100.0);
        assert_approx_eq!(f64, pool.demand(2026).unwrap(), 50.0);
        assert_approx_eq!(f64, pool.demand(2050).unwrap(), 50.0);
    }

    #[test]
    fn test_pool_demand_empty() {
        let pool = FuelPool::new("gasoline".into());
        assert!(pool.demand(2020).is_none());
    }
}
