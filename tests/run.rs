//! Integration tests driving the bundled demo scenario end to end.
use fueleq::model::Model;
use fueleq::simulation;
use std::path::{Path, PathBuf};

/// Get the path to the demo scenario directory
fn demo_model_dir() -> PathBuf {
    Path::new(env!("CARGO_MANIFEST_DIR"))
        .join("demos")
        .join("simple")
}

#[test]
fn test_load_model() {
    let model = Model::from_path(demo_model_dir()).unwrap();

    assert_eq!(model.parameters.years, vec![2020, 2021]);
    assert_eq!(model.feedstocks.len(), 1);
    assert_eq!(model.fuels.len(), 1);
    assert_eq!(model.pools.len(), 1);
    assert_eq!(model.credits.len(), 1);
    assert_eq!(model.benchmarks.len(), 1);
    assert!(model.blends.is_empty());
    assert!(model.coproducts.is_empty());
}

#[test]
fn test_run_simulation() {
    let model = Model::from_path(demo_model_dir()).unwrap();
    let results = simulation::run(&model).unwrap();

    // Demand of 900 MJ is met exactly in the cold-start year and the rolled-forward one
    for year in [2020, 2021] {
        let quantity = results.value(year, "ethanol").unwrap();
        assert!(
            (quantity - 900.0).abs() < 1e-3,
            "unexpected ethanol quantity for {year}: {quantity}"
        );
    }

    // Dual-derived rows are present for every year
    for year in [2020, 2021] {
        assert!(results.value(year, "gasoline Cost").is_some());
        assert!(results.value(year, "total").is_some());
        assert!(results.value(year, "lcfs").is_some());
        assert!(results.value(year, "lcfs credit quantity").is_some());
    }

    // The single pathway's CI carries through to the average
    assert_eq!(results.value(2020, "ethanol Avg CI").unwrap(), 50.0);
}
