//! Compliance-credit programs.
//!
//! Each credit program is a tradable market with per-year trading limits and, optionally, an
//! externally supplied quantity of additional credits. A positive additional quantity is a
//! bank which the model may draw down; a negative quantity is a deficit obligation which must
//! be covered by credit generation.
use crate::id::define_id_type;
use indexmap::IndexMap;
use std::collections::BTreeMap;

define_id_type! {CreditID}

/// A map of [`Credit`]s, keyed by credit program ID
pub type CreditMap = IndexMap<CreditID, Credit>;

/// A tradable compliance-credit program
#[derive(PartialEq, Debug, Clone)]
pub struct Credit {
    /// A unique identifier for the credit program (e.g. "LCFS")
    pub id: CreditID,
    /// Per-year (minimum, maximum) bounds on net credits traded in the program
    pub limits: BTreeMap<u32, (f64, f64)>,
    /// Per-year externally supplied credit quantity (positive = bank, negative = obligation)
    pub supply: BTreeMap<u32, f64>,
}

impl Credit {
    /// Create a new [`Credit`] program with no limits or supply
    pub fn new(id: CreditID) -> Self {
        Self {
            id,
            limits: BTreeMap::new(),
            supply: BTreeMap::new(),
        }
    }

    /// Record trading limits for a year
    pub fn add_limit(&mut self, year: u32, minimum: f64, maximum: f64) {
        self.limits.insert(year, (minimum, maximum));
    }

    /// Record an additional credit quantity for a year
    pub fn add_supply(&mut self, year: u32, quantity: f64) {
        self.supply.insert(year, quantity);
    }

    /// Trading limits for the given year, unbounded if none are defined
    pub fn limits_for(&self, year: u32) -> (f64, f64) {
        self.limits
            .get(&year)
            .copied()
            .unwrap_or((f64::NEG_INFINITY, f64::INFINITY))
    }

    /// The externally supplied credit quantity for the given year, if any is non-zero
    pub fn supply_for(&self, year: u32) -> Option<f64> {
        self.supply.get(&year).copied().filter(|q| *q != 0.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_limits_for() {
        let mut credit = Credit::new("LCFS".into());
        credit.add_limit(2020, -100.0, 100.0);

        assert_eq!(credit.limits_for(2020), (-100.0, 100.0));
        assert_eq!(
            credit.limits_for(2021),
            (f64::NEG_INFINITY, f64::INFINITY)
        );
    }

    #[test]
    fn test_supply_for_skips_zero() {
        let mut credit = Credit::new("LCFS".into());
        credit.add_supply(2020, 0.0);
        credit.add_supply(2021, -50.0);

        assert_eq!(credit.supply_for(2020), None);
        assert_eq!(credit.supply_for(2021), Some(-50.0));
        assert_eq!(credit.supply_for(2022), None);
    }
}
