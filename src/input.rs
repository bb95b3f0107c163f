//! Common routines for loading scenario input files.
//!
//! A scenario lives in a directory of CSV files plus a `scenario.toml`. Each entity has its
//! own reader module; this module provides the shared file helpers and the top-level
//! [`load_model`] entry point which assembles a [`Model`] from a scenario directory.
use crate::model::{Model, ScenarioParameters};
use anyhow::{Context, Result, ensure};
use itertools::Itertools;
use serde::de::DeserializeOwned;
use std::fs;
use std::path::Path;

pub mod benchmark;
pub mod blend;
pub mod coproduct;
pub mod credit;
pub mod feedstock;
pub mod fuel;
pub mod pathway;

use benchmark::read_benchmarks;
use blend::read_blend_requirements;
use coproduct::read_coproducts;
use credit::{read_credit_limits, read_credit_supply};
use feedstock::read_feedstocks;
use fuel::{read_fuel_pools, read_fuel_supply, read_production_limits};
use pathway::read_pathways;

/// A standard error message for a problem reading a file
pub fn input_err_msg<P: AsRef<Path>>(file_path: P) -> String {
    format!("Error reading {}", file_path.as_ref().to_string_lossy())
}

/// Read a series of type `T`s from the specified CSV file.
///
/// The file must exist and contain at least one record.
pub fn read_csv<T: DeserializeOwned>(file_path: &Path) -> Result<Vec<T>> {
    let records = read_csv_inner(file_path).with_context(|| input_err_msg(file_path))?;
    ensure!(
        !records.is_empty(),
        "{}: CSV file cannot be empty",
        file_path.to_string_lossy()
    );

    Ok(records)
}

/// Read a series of type `T`s from the specified CSV file, if it exists.
///
/// Missing optional input files are treated as empty.
pub fn read_csv_optional<T: DeserializeOwned>(file_path: &Path) -> Result<Vec<T>> {
    if !file_path.is_file() {
        return Ok(Vec::new());
    }

    read_csv_inner(file_path).with_context(|| input_err_msg(file_path))
}

fn read_csv_inner<T: DeserializeOwned>(file_path: &Path) -> Result<Vec<T>> {
    let mut reader = csv::Reader::from_path(file_path)?;
    let records = reader.deserialize().try_collect()?;

    Ok(records)
}

/// Parse a TOML file at the specified path
pub fn read_toml<T: DeserializeOwned>(file_path: &Path) -> Result<T> {
    let contents = fs::read_to_string(file_path)?;
    let parsed = toml::from_str(&contents)?;

    Ok(parsed)
}

/// Check that the elements of `slice` are in order and unique
pub fn is_sorted_and_unique<T: PartialOrd>(slice: &[T]) -> bool {
    slice.windows(2).all(|pair| pair[0] < pair[1])
}

/// Read a model from the specified directory.
///
/// Entities are loaded leaf first: pools and feedstocks, then the pathways which reference
/// them (creating fuels and credit programs as they go), then the per-year tables which
/// annotate fuels and credits. Cross-entity references are validated as each table loads;
/// benchmark and blend references on pathways are validated once everything is in place.
///
/// # Arguments
///
/// * `model_dir` - Folder containing scenario configuration files
///
/// # Returns
///
/// The scenario as a [`Model`] or an error if any file is missing, malformed or refers to
/// an undefined entity.
pub fn load_model(model_dir: &Path) -> Result<Model> {
    let parameters = ScenarioParameters::from_path(model_dir)?;

    let pools = read_fuel_pools(model_dir)?;
    let feedstocks = read_feedstocks(model_dir)?;
    let (mut fuels, pathways, mut credits) = read_pathways(model_dir, &pools, &feedstocks)?;

    read_fuel_supply(model_dir, &mut fuels)?;
    read_production_limits(model_dir, &mut fuels)?;
    read_credit_limits(model_dir, &mut credits)?;
    read_credit_supply(model_dir, &mut credits)?;

    let benchmarks = read_benchmarks(model_dir)?;
    let blends = read_blend_requirements(model_dir, &pools)?;
    let coproducts = read_coproducts(model_dir, &fuels)?;

    let model = Model {
        parameters,
        feedstocks,
        fuels,
        pools,
        pathways,
        credits,
        benchmarks,
        blends,
        coproducts,
    };
    model.validate()?;

    Ok(model)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde::Deserialize;
    use std::fs::File;
    use std::io::Write;
    use tempfile::tempdir;

    #[derive(Debug, Deserialize, PartialEq)]
    struct Record {
        id: String,
        value: u32,
    }

    #[test]
    fn test_read_csv() {
        let dir = tempdir().unwrap();
        let file_path = dir.path().join("data.csv");
        {
            let mut file = File::create(&file_path).unwrap();
            writeln!(file, "id,value\na,1\nb,2").unwrap();
        }

        let records: Vec<Record> = read_csv(&file_path).unwrap();
        assert_eq!(records.len(), 2);
        assert_eq!(records[0].id, "a");
    }

    #[test]
    fn test_read_csv_empty() {
        let dir = tempdir().unwrap();
        let file_path = dir.path().join("data.csv");
        {
            let mut file = File::create(&file_path).unwrap();
            writeln!(file, "id,value").unwrap();
        }

        assert!(read_csv::<Record>(&file_path).is_err());
    }

    #[test]
    fn test_read_csv_optional_missing() {
        let dir = tempdir().unwrap();
        let records: Vec<Record> = read_csv_optional(&dir.path().join("missing.csv")).unwrap();
        assert!(records.is_empty());
    }

    #[test]
    fn test_is_sorted_and_unique() {
        assert!(is_sorted_and_unique::<u32>(&[]));
        assert!(is_sorted_and_unique(&[1, 2, 3]));
        assert!(!is_sorted_and_unique(&[1, 1]));
        assert!(!is_sorted_and_unique(&[2, 1]));
    }
}
