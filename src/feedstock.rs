//! Feedstocks are the raw inputs to fuel production (e.g. corn, tallow, crude).
//!
//! Each feedstock carries a step supply curve: a mapping from price to the quantity which
//! becomes available at that price. The curve is the source of both the per-tier decision
//! variables and the feedstock availability constraints in the equilibrium problem.
use crate::id::define_id_type;
use crate::year::closest_value;
use anyhow::{Result, bail, ensure};
use indexmap::IndexMap;
use std::collections::BTreeMap;

define_id_type! {FeedstockID}

/// A map of [`Feedstock`]s, keyed by feedstock ID
pub type FeedstockMap = IndexMap<FeedstockID, Feedstock>;

/// A raw production input with a step supply curve
#[derive(PartialEq, Debug, Clone)]
pub struct Feedstock {
    /// A unique identifier for the feedstock (e.g. "corn")
    pub id: FeedstockID,
    /// Quantity of feedstock which becomes available at each price point
    pub supply: BTreeMap<i64, f64>,
}

impl Feedstock {
    /// Create a new [`Feedstock`] with an empty supply curve
    pub fn new(id: FeedstockID) -> Self {
        Self {
            id,
            supply: BTreeMap::new(),
        }
    }

    /// Add a supply point to the feedstock's supply curve.
    ///
    /// Adding the same price twice replaces the earlier quantity.
    pub fn add_supply(&mut self, price: i64, quantity: f64) {
        self.supply.insert(price, quantity);
    }

    /// The total quantity available at price points up to the one nearest `price`
    pub fn cumulative(&self, price: i64) -> f64 {
        let Some(end_point) = closest_value(price, self.supply.keys().copied()) else {
            return 0.0;
        };

        self.supply
            .range(..=end_point)
            .map(|(_, quantity)| quantity)
            .sum()
    }

    /// The maximum quantity of feedstock available at any price
    pub fn upper_bound(&self) -> f64 {
        match self.supply.keys().next_back() {
            Some(max_price) => self.cumulative(*max_price),
            None => 0.0,
        }
    }

    /// The marginal cost of supplying the given quantity of feedstock.
    ///
    /// Returns the lowest price at which cumulative supply covers `quantity`, or an error
    /// when no supply curve is defined or the curve cannot cover the quantity.
    pub fn marginal_cost(&self, quantity: f64) -> Result<i64> {
        ensure!(
            !self.supply.is_empty(),
            "No cost data could be found. Please add supply curve data for '{}'",
            self.id
        );

        let mut cumulative = 0.0;
        for (price, tier_quantity) in self.iter_supply() {
            cumulative += tier_quantity;
            if cumulative >= quantity {
                return Ok(price);
            }
        }

        bail!(
            "The supply curve for '{}' is only established to {cumulative}. This is less \
             than the {quantity} you entered.",
            self.id
        )
    }

    /// Iterate over the supply curve in ascending price order
    pub fn iter_supply(&self) -> impl Iterator<Item = (i64, f64)> + '_ {
        self.supply.iter().map(|(price, quantity)| (*price, *quantity))
    }
}
