//! Production pathways convert feedstocks into fuels.
//!
//! A pathway is the conversion route from one feedstock to one fuel in one year, with its
//! cost, yield and carbon intensity. Pathways are registered per (fuel, feedstock, year);
//! lookups for a model year resolve to the pathway whose year is nearest, falling back to
//! the latest registered year when no target year is given.
use crate::benchmark::BenchmarkID;
use crate::blend::BlendID;
use crate::credit::CreditID;
use crate::feedstock::{Feedstock, FeedstockID};
use crate::fuel::FuelID;
use crate::year::{closest_entry, closest_year};
use indexmap::IndexMap;
use itertools::Itertools;
use std::collections::BTreeMap;

/// How a pathway's production should be labelled when aggregating results
#[derive(PartialEq, Debug, Clone)]
pub struct ResultsMeta {
    /// Display name results are aggregated under (defaults to the fuel name)
    pub name: String,
    /// Display units for the aggregated quantity
    pub units: String,
    /// Factor applied to energy to produce the displayed quantity
    pub multiplier: f64,
}

/// A conversion route from one feedstock to one fuel in one year
#[derive(PartialEq, Debug, Clone)]
pub struct Pathway {
    /// The year this pathway's parameters describe
    pub year: u32,
    /// The fuel produced
    pub fuel: FuelID,
    /// The feedstock consumed
    pub feedstock: FeedstockID,
    /// Cost of converting one unit of feedstock ($/unit)
    pub conversion_cost: i64,
    /// Carbon intensity of the produced fuel (gCO2e/MJ)
    pub carbon_intensity: f64,
    /// Energy produced per unit of feedstock (MJ/unit)
    pub fuel_yield: f64,
    /// Energy-economy ratio applied when crediting against a benchmark
    pub eer: f64,
    /// Cumulative exogenous subsidy ($/MJ)
    pub subsidy: f64,
    /// The credit program this pathway's credits and deficits accrue to
    pub credit: CreditID,
    /// The carbon-intensity benchmark the pathway is measured against, if any
    pub benchmark: Option<BenchmarkID>,
    /// The blend requirement the pathway's fuel counts toward, if any
    pub blend: Option<BlendID>,
    /// Result-aggregation metadata
    pub results: ResultsMeta,
}

impl Pathway {
    /// Add to the pathway's cumulative exogenous subsidy
    pub fn add_subsidy(&mut self, amount: f64) {
        self.subsidy += amount;
    }

    /// Derive the pathway's supply curve from its feedstock's supply curve.
    ///
    /// Each feedstock price tier becomes a cost per MJ of fuel, truncated to whole dollars,
    /// mapped to the energy available from that tier.
    pub fn supply_curve(&self, feedstock: &Feedstock) -> BTreeMap<i64, f64> {
        feedstock
            .iter_supply()
            .map(|(price, quantity)| {
                let cost = ((self.conversion_cost + price) as f64 / self.fuel_yield) as i64;
                (cost, self.fuel_yield * quantity)
            })
            .collect()
    }
}

/// All production pathways for a scenario, keyed by (fuel, feedstock) and then year
#[derive(PartialEq, Debug, Clone, Default)]
pub struct PathwayMap {
    pathways: IndexMap<(FuelID, FeedstockID), BTreeMap<u32, Pathway>>,
}

impl PathwayMap {
    /// Create an empty [`PathwayMap`]
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a pathway.
    ///
    /// If a pathway already exists for the same (fuel, feedstock, year), the existing entry
    /// is kept and only the new entry's subsidy is added to it; repeated registrations
    /// accumulate subsidies rather than redefining the route.
    pub fn add(&mut self, pathway: Pathway) {
        let years = self
            .pathways
            .entry((pathway.fuel.clone(), pathway.feedstock.clone()))
            .or_default();
        match years.get_mut(&pathway.year) {
            Some(existing) => existing.add_subsidy(pathway.subsidy),
            None => {
                years.insert(pathway.year, pathway);
            }
        }
    }

    /// Resolve the pathway for a (feedstock, fuel) pair.
    ///
    /// With a target year, the pathway registered for the nearest year wins; without one,
    /// the latest registered year is used.
    pub fn resolve(
        &self,
        feedstock: &FeedstockID,
        fuel: &FuelID,
        year: Option<u32>,
    ) -> Option<&Pathway> {
        let years = self.pathways.get(&(fuel.clone(), feedstock.clone()))?;
        match year {
            Some(year) => closest_entry(years, year),
            None => years.values().next_back(),
        }
    }

    /// The fuels producible from `feedstock`, in registration order
    pub fn fuels_for_feedstock<'a>(
        &'a self,
        feedstock: &'a FeedstockID,
    ) -> impl Iterator<Item = &'a FuelID> {
        self.pathways
            .keys()
            .filter(move |(_, fs)| fs == feedstock)
            .map(|(fuel, _)| fuel)
            .unique()
    }

    /// The feedstocks that `fuel` can be produced from, in registration order
    pub fn feedstocks_for_fuel<'a>(
        &'a self,
        fuel: &'a FuelID,
    ) -> impl Iterator<Item = &'a FeedstockID> {
        self.pathways
            .keys()
            .filter(move |(f, _)| f == fuel)
            .map(|(_, feedstock)| feedstock)
            .unique()
    }

    /// Iterate over every (fuel, feedstock) pair with at least one registered pathway
    pub fn iter_pairs(&self) -> impl Iterator<Item = (&FuelID, &FeedstockID)> {
        self.pathways.keys().map(|(fuel, feedstock)| (fuel, feedstock))
    }

    /// The pathways measured against `benchmark` when resolved for `year`
    pub fn for_benchmark(&self, benchmark: &BenchmarkID, year: u32) -> Vec<&Pathway> {
        self.pathways
            .values()
            .filter_map(|years| {
                let resolved = closest_year(year, years.keys().copied())?;
                let pathway = &years[&resolved];
                (pathway.benchmark.as_ref() == Some(benchmark)).then_some(pathway)
            })
            .collect()
    }

    /// Every registered pathway across all years
    pub fn iter_all(&self) -> impl Iterator<Item = &Pathway> {
        self.pathways.values().flat_map(BTreeMap::values)
    }

    /// Whether no pathways are registered
    pub fn is_empty(&self) -> bool {
        self.pathways.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use float_cmp::assert_approx_eq;

    fn pathway(year: u32, fuel_yield: f64) -> Pathway {
        Pathway {
            year,
            fuel: "ethanol".into(),
            feedstock: "corn".into(),
            conversion_cost: 100,
            carbon_intensity: 1.0,
            fuel_yield,
            eer: 1.0,
            subsidy: 0.0,
            credit: "Default".into(),
            benchmark: None,
            blend: None,
            results: ResultsMeta {
                name: "ethanol".into(),
                units: "MJ".into(),
                multiplier: 1.0,
            },
        }
    }

    #[test]
    fn test_supply_curve() {
        let mut feedstock = Feedstock::new("corn".into());
        feedstock.add_supply(10, 100.0);

        let curve = pathway(2019, 10.0).supply_curve(&feedstock);

        // cost = (100 + 10) / 10 = 11, quantity = 10 * 100
        assert_eq!(curve.len(), 1);
        assert_approx_eq!(f64, curve[&11], 1000.0);
    }

    #[test]
    fn test_resolve_nearest_year() {
        let mut pathways = PathwayMap::new();
        pathways.add(pathway(2020, 1.0));
        pathways.add(pathway(2021, 10.0));

        let feedstock = "corn".into();
        let fuel = "ethanol".into();

        let resolve = |year| pathways.resolve(&feedstock, &fuel, year).unwrap();
        assert_approx_eq!(f64, resolve(Some(2020)).fuel_yield, 1.0);
        assert_approx_eq!(f64, resolve(Some(2021)).fuel_yield, 10.0);
        // Beyond every registered year falls back to the latest
        assert_approx_eq!(f64, resolve(Some(2031)).fuel_yield, 10.0);
        // No target year resolves to the latest
        assert_approx_eq!(f64, resolve(None).fuel_yield, 10.0);
    }

    #[test]
    fn test_resolve_unknown_pair() {
        let pathways = PathwayMap::new();
        assert!(
            pathways
                .resolve(&"corn".into(), &"ethanol".into(), Some(2020))
                .is_none()
        );
    }

    #[test]
    fn test_add_accumulates_subsidy() {
        let mut pathways = PathwayMap::new();
        let mut first = pathway(2020, 10.0);
        first.subsidy = 0.5;
        let mut second = pathway(2020, 99.0); // parameters other than subsidy are ignored
        second.subsidy = 0.25;

        pathways.add(first);
        pathways.add(second);

        let resolved = pathways
            .resolve(&"corn".into(), &"ethanol".into(), Some(2020))
            .unwrap();
        assert_approx_eq!(f64, resolved.subsidy, 0.75);
        assert_approx_eq!(f64, resolved.fuel_yield, 10.0);
    }

    #[test]
    fn test_for_benchmark() {
        let mut pathways = PathwayMap::new();
        let mut with_benchmark = pathway(2020, 10.0);
        with_benchmark.benchmark = Some("gasoline_lcfs".into());
        pathways.add(with_benchmark);

        let mut other_fuel = pathway(2020, 5.0);
        other_fuel.fuel = "bio-naphtha".into();
        pathways.add(other_fuel);

        let matched = pathways.for_benchmark(&"gasoline_lcfs".into(), 2020);
        assert_eq!(matched.len(), 1);
        assert_eq!(matched[0].fuel, "ethanol".into());

        assert!(pathways.for_benchmark(&"unknown".into(), 2020).is_empty());
    }

    #[test]
    fn test_fuels_for_feedstock() {
        let mut pathways = PathwayMap::new();
        pathways.add(pathway(2020, 1.0));
        pathways.add(pathway(2021, 2.0));
        let mut other = pathway(2020, 3.0);
        other.fuel = "bio-naphtha".into();
        pathways.add(other);

        let feedstock = "corn".into();
        let fuels: Vec<_> = pathways.fuels_for_feedstock(&feedstock).collect();
        assert_eq!(fuels, [&FuelID::from("ethanol"), &FuelID::from("bio-naphtha")]);
    }
}
