//! Code for reading production pathways from CSV files.
//!
//! The pathways table is the backbone of a scenario: reading it also creates the fuel and
//! credit-program entities it references, in the same pass.
use crate::credit::{Credit, CreditMap};
use crate::feedstock::FeedstockMap;
use crate::fuel::{Fuel, FuelMap, FuelPoolMap};
use crate::input::read_csv;
use crate::pathway::{Pathway, PathwayMap, ResultsMeta};
use anyhow::{Result, ensure};
use serde::Deserialize;
use std::path::Path;

const PATHWAYS_FILE_NAME: &str = "pathways.csv";

/// One production pathway row
#[derive(Debug, Deserialize, PartialEq)]
struct PathwayRaw {
    year: u32,
    fuel: String,
    fuel_pool: String,
    feedstock: String,
    /// Cost of converting one unit of feedstock ($/unit)
    conversion_cost: i64,
    /// Energy produced per unit of feedstock (MJ/unit)
    #[serde(rename = "yield")]
    fuel_yield: f64,
    /// Carbon intensity of the produced fuel (gCO2e/MJ)
    carbon_intensity: f64,
    /// Energy-economy ratio; blank means no adjustment
    eer: Option<f64>,
    /// Exogenous subsidy ($/MJ); blank means none
    subsidy: Option<f64>,
    /// The credit program credits accrue to
    credit: String,
    /// The carbon-intensity benchmark the pathway is measured against
    benchmark: Option<String>,
    /// The blend requirement the fuel counts toward
    blend: Option<String>,
    /// Display name for results (defaults to the fuel name)
    results_name: Option<String>,
    /// Display units for results
    results_units: Option<String>,
    /// Factor applied to energy for display
    results_multiplier: Option<f64>,
}

/// Read production pathways from the specified model directory.
///
/// Fuels and credit programs are created as pathways reference them. Feedstocks and fuel
/// pools must already exist; a pathway naming an unknown one is a configuration error.
///
/// # Arguments
///
/// * `model_dir` - Folder containing scenario configuration files
/// * `pools` - All demand pools
/// * `feedstocks` - All feedstocks
///
/// # Returns
///
/// The fuels, pathways and credit programs for the scenario, or an error.
pub fn read_pathways(
    model_dir: &Path,
    pools: &FuelPoolMap,
    feedstocks: &FeedstockMap,
) -> Result<(FuelMap, PathwayMap, CreditMap)> {
    let records = read_csv(&model_dir.join(PATHWAYS_FILE_NAME))?;
    read_pathways_iter(records.into_iter(), pools, feedstocks)
}

fn read_pathways_iter<I>(
    iter: I,
    pools: &FuelPoolMap,
    feedstocks: &FeedstockMap,
) -> Result<(FuelMap, PathwayMap, CreditMap)>
where
    I: Iterator<Item = PathwayRaw>,
{
    let mut fuels = FuelMap::new();
    let mut pathways = PathwayMap::new();
    let mut credits = CreditMap::new();

    for record in iter {
        ensure!(
            feedstocks.contains_key(record.feedstock.as_str()),
            "{} has not been defined as a feedstock. Please ensure that this feedstock is \
             defined in the model inputs",
            record.feedstock
        );
        ensure!(
            pools.contains_key(record.fuel_pool.as_str()),
            "Specified fuel pool '{}' has not been defined",
            record.fuel_pool
        );
        ensure!(
            record.fuel_yield > 0.0,
            "Pathway {} ({}) must have a positive yield",
            record.fuel,
            record.feedstock
        );
        let eer = record.eer.unwrap_or(1.0);
        ensure!(
            eer > 0.0,
            "Pathway {} ({}) must have a positive EER",
            record.fuel,
            record.feedstock
        );

        let fuel = fuels
            .entry(record.fuel.as_str().into())
            .or_insert_with(|| Fuel::new(record.fuel.as_str().into(), record.fuel_pool.as_str().into()));
        ensure!(
            fuel.pool == record.fuel_pool.as_str().into(),
            "Fuel {} cannot belong to both the {} and {} pools",
            record.fuel,
            fuel.pool,
            record.fuel_pool
        );

        credits
            .entry(record.credit.as_str().into())
            .or_insert_with(|| Credit::new(record.credit.as_str().into()));

        let results = ResultsMeta {
            name: record.results_name.unwrap_or_else(|| record.fuel.clone()),
            units: record.results_units.unwrap_or_else(|| "MJ".into()),
            multiplier: record.results_multiplier.unwrap_or(1.0),
        };

        pathways.add(Pathway {
            year: record.year,
            fuel: record.fuel.as_str().into(),
            feedstock: record.feedstock.as_str().into(),
            conversion_cost: record.conversion_cost,
            carbon_intensity: record.carbon_intensity,
            fuel_yield: record.fuel_yield,
            eer,
            subsidy: record.subsidy.unwrap_or(0.0),
            credit: record.credit.as_str().into(),
            benchmark: record.benchmark.map(|b| b.as_str().into()),
            blend: record.blend.map(|b| b.as_str().into()),
            results,
        });
    }

    Ok((fuels, pathways, credits))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::feedstock::Feedstock;
    use crate::fuel::FuelPool;
    use float_cmp::assert_approx_eq;
    use rstest::{fixture, rstest};

    fn record(year: u32, fuel: &str, feedstock: &str) -> PathwayRaw {
        PathwayRaw {
            year,
            fuel: fuel.into(),
            fuel_pool: "gasoline".into(),
            feedstock: feedstock.into(),
            conversion_cost: 100,
            fuel_yield: 10.0,
            carbon_intensity: 1.0,
            eer: None,
            subsidy: None,
            credit: "Default".into(),
            benchmark: None,
            blend: None,
            results_name: None,
            results_units: None,
            results_multiplier: None,
        }
    }

    #[fixture]
    fn pools() -> FuelPoolMap {
        FuelPoolMap::from_iter([("gasoline".into(), FuelPool::new("gasoline".into()))])
    }

    #[fixture]
    fn feedstocks() -> FeedstockMap {
        FeedstockMap::from_iter([("corn".into(), Feedstock::new("corn".into()))])
    }

    #[rstest]
    fn test_read_pathways_iter(pools: FuelPoolMap, feedstocks: FeedstockMap) {
        let records = [record(2020, "ethanol", "corn"), record(2021, "ethanol", "corn")];

        let (fuels, pathways, credits) =
            read_pathways_iter(records.into_iter(), &pools, &feedstocks).unwrap();

        assert_eq!(fuels.len(), 1);
        assert_eq!(credits.len(), 1);
        let pathway = pathways
            .resolve(&"corn".into(), &"ethanol".into(), Some(2020))
            .unwrap();
        assert_approx_eq!(f64, pathway.eer, 1.0);
        assert_eq!(pathway.results.name, "ethanol");
        assert_eq!(pathway.results.units, "MJ");
    }

    #[rstest]
    fn test_read_pathways_iter_unknown_feedstock(pools: FuelPoolMap, feedstocks: FeedstockMap) {
        let records = [record(2020, "ethanol", "switchgrass")];
        assert!(read_pathways_iter(records.into_iter(), &pools, &feedstocks).is_err());
    }

    #[rstest]
    fn test_read_pathways_iter_unknown_pool(pools: FuelPoolMap, feedstocks: FeedstockMap) {
        let mut bad = record(2020, "ethanol", "corn");
        bad.fuel_pool = "diesel".into();
        assert!(read_pathways_iter([bad].into_iter(), &pools, &feedstocks).is_err());
    }

    #[rstest]
    fn test_read_pathways_iter_conflicting_pool(feedstocks: FeedstockMap) {
        let pools = FuelPoolMap::from_iter([
            ("gasoline".into(), FuelPool::new("gasoline".into())),
            ("diesel".into(), FuelPool::new("diesel".into())),
        ]);

        let mut second = record(2021, "ethanol", "corn");
        second.fuel_pool = "diesel".into();
        let records = [record(2020, "ethanol", "corn"), second];

        assert!(read_pathways_iter(records.into_iter(), &pools, &feedstocks).is_err());
    }

    #[rstest]
    fn test_read_pathways_iter_duplicate_accumulates_subsidy(
        pools: FuelPoolMap,
        feedstocks: FeedstockMap,
    ) {
        let mut first = record(2020, "ethanol", "corn");
        first.subsidy = Some(0.5);
        let mut second = record(2020, "ethanol", "corn");
        second.subsidy = Some(0.25);

        let (_, pathways, _) =
            read_pathways_iter([first, second].into_iter(), &pools, &feedstocks).unwrap();
        let pathway = pathways
            .resolve(&"corn".into(), &"ethanol".into(), Some(2020))
            .unwrap();
        assert_approx_eq!(f64, pathway.subsidy, 0.75);
    }
}
