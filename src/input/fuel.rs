//! Code for reading fuel-pool demand and per-fuel supply/limit tables from CSV files.
use crate::fuel::{FuelMap, FuelPool, FuelPoolMap};
use crate::input::{read_csv, read_csv_optional};
use anyhow::{Context, Result};
use serde::Deserialize;
use std::path::Path;

const FUEL_POOLS_FILE_NAME: &str = "fuel_pools.csv";
const FUEL_SUPPLY_FILE_NAME: &str = "fuel_supply.csv";
const PRODUCTION_LIMITS_FILE_NAME: &str = "production_limits.csv";

/// Energy demand for one pool in one year
#[derive(Debug, Deserialize, PartialEq)]
struct FuelPoolRaw {
    fuel_pool: String,
    year: u32,
    /// Energy demand (MJ)
    demand: f64,
    /// Whether supply may exceed demand for this pool
    exceed: bool,
}

/// An externally defined minimum supply for one fuel in one year
#[derive(Debug, Deserialize, PartialEq)]
struct FuelSupplyRaw {
    year: u32,
    fuel: String,
    /// Minimum energy which must be produced (MJ)
    energy: f64,
    /// The policy responsible for the requirement
    attribution: Option<String>,
}

/// A production limit for one fuel in one year
#[derive(Debug, Deserialize, PartialEq)]
struct ProductionLimitRaw {
    year: u32,
    fuel: String,
    /// Maximum production (MJ); `inf` for unlimited
    maximum: f64,
    /// Maximum year-over-year fractional change; overrides the model default when non-zero
    #[serde(default)]
    pct_change: f64,
}

/// Read fuel-pool demand from the specified model directory.
///
/// # Arguments
///
/// * `model_dir` - Folder containing scenario configuration files
///
/// # Returns
///
/// A map of demand pools or an error.
pub fn read_fuel_pools(model_dir: &Path) -> Result<FuelPoolMap> {
    let records = read_csv(&model_dir.join(FUEL_POOLS_FILE_NAME))?;
    Ok(read_fuel_pools_iter(records.into_iter()))
}

fn read_fuel_pools_iter<I>(iter: I) -> FuelPoolMap
where
    I: Iterator<Item = FuelPoolRaw>,
{
    let mut pools = FuelPoolMap::new();
    for record in iter {
        let pool = pools
            .entry(record.fuel_pool.as_str().into())
            .or_insert_with(|| FuelPool::new(record.fuel_pool.as_str().into()));
        pool.demand.insert(record.year, record.demand);
        pool.exceed |= record.exceed;
    }

    pools
}

/// Read externally defined fuel supply minima and attach them to `fuels`.
///
/// The file is optional; fuels named in it must already exist.
pub fn read_fuel_supply(model_dir: &Path, fuels: &mut FuelMap) -> Result<()> {
    let records = read_csv_optional(&model_dir.join(FUEL_SUPPLY_FILE_NAME))?;
    read_fuel_supply_iter(records.into_iter(), fuels)
}

fn read_fuel_supply_iter<I>(iter: I, fuels: &mut FuelMap) -> Result<()>
where
    I: Iterator<Item = FuelSupplyRaw>,
{
    for record in iter {
        let fuel = fuels.get_mut(record.fuel.as_str()).with_context(|| {
            format!(
                "Unable to add supply. Please add '{}' as a fuel to the model first",
                record.fuel
            )
        })?;
        fuel.add_supply(record.year, record.energy, record.attribution);
    }

    Ok(())
}

/// Read per-fuel production limits and attach them to `fuels`.
///
/// The file is optional; fuels named in it must already exist.
pub fn read_production_limits(model_dir: &Path, fuels: &mut FuelMap) -> Result<()> {
    let records = read_csv_optional(&model_dir.join(PRODUCTION_LIMITS_FILE_NAME))?;
    read_production_limits_iter(records.into_iter(), fuels)
}

fn read_production_limits_iter<I>(iter: I, fuels: &mut FuelMap) -> Result<()>
where
    I: Iterator<Item = ProductionLimitRaw>,
{
    for record in iter {
        let fuel = fuels.get_mut(record.fuel.as_str()).with_context(|| {
            format!(
                "{} does not appear to be a valid fuel. Cannot set production limits.",
                record.fuel
            )
        })?;
        fuel.add_limit(record.year, record.maximum, record.pct_change);
    }

    Ok(())
}
