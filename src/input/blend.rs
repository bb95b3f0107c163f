//! Code for reading blend requirements from CSV files.
use crate::blend::{BlendMap, BlendRequirement};
use crate::fuel::FuelPoolMap;
use crate::input::read_csv_optional;
use anyhow::{Result, ensure};
use serde::Deserialize;
use std::path::Path;

const BLEND_REQUIREMENTS_FILE_NAME: &str = "blend_requirements.csv";

/// A share-of-pool-energy requirement for one year
#[derive(Debug, Deserialize, PartialEq)]
struct BlendRaw {
    year: u32,
    requirement: String,
    fuel_pool: String,
    /// Minimum share of pool energy (fraction)
    minimum: f64,
    /// Maximum share of pool energy (fraction)
    maximum: f64,
}

/// Read blend requirements from the specified model directory.
///
/// The file is optional; pools named in it must already exist.
pub fn read_blend_requirements(model_dir: &Path, pools: &FuelPoolMap) -> Result<BlendMap> {
    let records = read_csv_optional(&model_dir.join(BLEND_REQUIREMENTS_FILE_NAME))?;
    read_blend_requirements_iter(records.into_iter(), pools)
}

fn read_blend_requirements_iter<I>(iter: I, pools: &FuelPoolMap) -> Result<BlendMap>
where
    I: Iterator<Item = BlendRaw>,
{
    let mut blends = BlendMap::new();
    for record in iter {
        ensure!(
            pools.contains_key(record.fuel_pool.as_str()),
            "Unable to add blend requirement for '{}': fuel pool {} is not defined",
            record.requirement,
            record.fuel_pool
        );
        ensure!(
            0.0 <= record.minimum && record.minimum <= record.maximum && record.maximum <= 1.0,
            "Blend requirement '{}' must satisfy 0 <= minimum <= maximum <= 1",
            record.requirement
        );

        blends.add(BlendRequirement {
            id: record.requirement.as_str().into(),
            pool: record.fuel_pool.as_str().into(),
            year: record.year,
            minimum: record.minimum,
            maximum: record.maximum,
        });
    }

    Ok(blends)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fuel::FuelPool;

    fn pools() -> FuelPoolMap {
        FuelPoolMap::from_iter([("gasoline".into(), FuelPool::new("gasoline".into()))])
    }

    fn record(minimum: f64, maximum: f64) -> BlendRaw {
        BlendRaw {
            year: 2020,
            requirement: "E10".into(),
            fuel_pool: "gasoline".into(),
            minimum,
            maximum,
        }
    }

    #[test]
    fn test_read_blend_requirements_iter() {
        let blends = read_blend_requirements_iter([record(0.05, 0.1)].into_iter(), &pools()).unwrap();
        assert_eq!(blends.for_year(2020).len(), 1);
    }

    #[test]
    fn test_read_blend_requirements_iter_unknown_pool() {
        let mut bad = record(0.05, 0.1);
        bad.fuel_pool = "diesel".into();
        assert!(read_blend_requirements_iter([bad].into_iter(), &pools()).is_err());
    }

    #[test]
    fn test_read_blend_requirements_iter_bad_bounds() {
        assert!(read_blend_requirements_iter([record(0.2, 0.1)].into_iter(), &pools()).is_err());
        assert!(read_blend_requirements_iter([record(-0.1, 0.1)].into_iter(), &pools()).is_err());
        assert!(read_blend_requirements_iter([record(0.5, 1.5)].into_iter(), &pools()).is_err());
    }
}
