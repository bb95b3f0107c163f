//! Fixtures for tests
use crate::benchmark::BenchmarkMap;
use crate::blend::BlendMap;
use crate::coproduct::CoproductMap;
use crate::credit::{Credit, CreditMap};
use crate::feedstock::{Feedstock, FeedstockMap};
use crate::fuel::{Fuel, FuelMap, FuelPool, FuelPoolMap};
use crate::model::{Model, ScenarioParameters};
use crate::pathway::{Pathway, PathwayMap, ResultsMeta};
use rstest::fixture;

/// Assert that an error with the given message occurs
macro_rules! assert_error {
    ($result:expr, $msg:expr) => {
        assert_eq!(
            $result.unwrap_err().chain().next().unwrap().to_string(),
            $msg
        );
    };
}
pub(crate) use assert_error;

/// A corn-to-ethanol pathway with the given year and yield
pub fn pathway(year: u32, fuel_yield: f64) -> Pathway {
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

#[fixture]
pub fn parameters() -> ScenarioParameters {
    ScenarioParameters {
        years: vec![2020, 2021],
        default_production_change: 0.40,
        slack_penalty: 1e5,
        feasibility_tolerance: 1e-6,
        tolerance_ceiling: 10.0,
        rollforward_threshold: 1e9,
        facility_floor: 50e6 * crate::model::parameters::MJ_PER_GGE,
    }
}

/// A single-pool scenario: 900 MJ of gasoline-pool demand served by corn ethanol, with
/// 100 tons of corn available at $10/ton and a 10 MJ/ton pathway.
#[fixture]
pub fn model(parameters: ScenarioParameters) -> Model {
    let mut feedstock = Feedstock::new("corn".into());
    feedstock.add_supply(10, 100.0);
    let feedstocks = FeedstockMap::from_iter([(feedstock.id.clone(), feedstock)]);

    let mut pool = FuelPool::new("gasoline".into());
    pool.demand.insert(2020, 900.0);
    let pools = FuelPoolMap::from_iter([(pool.id.clone(), pool)]);

    let fuel = Fuel::new("ethanol".into(), "gasoline".into());
    let fuels = FuelMap::from_iter([(fuel.id.clone(), fuel)]);

    let mut pathways = PathwayMap::new();
    pathways.add(pathway(2020, 10.0));

    let credit = Credit::new("Default".into());
    let credits = CreditMap::from_iter([(credit.id.clone(), credit)]);

    Model {
        parameters,
        feedstocks,
        fuels,
        pools,
        pathways,
        credits,
        benchmarks: BenchmarkMap::new(),
        blends: BlendMap::new(),
        coproducts: CoproductMap::new(),
    }
}
