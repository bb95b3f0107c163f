//! Code for reading co-product ratio rules from CSV files.
use crate::coproduct::CoproductMap;
use crate::fuel::FuelMap;
use crate::input::read_csv_optional;
use anyhow::{Result, ensure};
use serde::Deserialize;
use std::path::Path;

const COPRODUCTS_FILE_NAME: &str = "coproducts.csv";

/// One co-product rule: `fuel` output = `multiplier` x `base_fuel` output
#[derive(Debug, Deserialize, PartialEq)]
struct CoproductRaw {
    fuel: String,
    base_fuel: String,
    multiplier: f64,
}

/// Read co-product rules from the specified model directory.
///
/// The file is optional; both fuels in each rule must already exist.
pub fn read_coproducts(model_dir: &Path, fuels: &FuelMap) -> Result<CoproductMap> {
    let records = read_csv_optional(&model_dir.join(COPRODUCTS_FILE_NAME))?;
    read_coproducts_iter(records.into_iter(), fuels)
}

fn read_coproducts_iter<I>(iter: I, fuels: &FuelMap) -> Result<CoproductMap>
where
    I: Iterator<Item = CoproductRaw>,
{
    let mut coproducts = CoproductMap::new();
    for record in iter {
        ensure!(
            fuels.contains_key(record.fuel.as_str()),
            "{} is not a valid fuel. Cannot be defined as a coproduct of {}",
            record.fuel,
            record.base_fuel
        );
        ensure!(
            fuels.contains_key(record.base_fuel.as_str()),
            "{} is not a valid base fuel. {} cannot be defined as a coproduct.",
            record.base_fuel,
            record.fuel
        );
        ensure!(
            record.multiplier > 0.0,
            "Coproduct multiplier for {} must be positive",
            record.fuel
        );

        coproducts.add(
            record.fuel.as_str().into(),
            record.base_fuel.as_str().into(),
            record.multiplier,
        );
    }

    Ok(coproducts)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fuel::Fuel;
    use float_cmp::assert_approx_eq;

    fn fuels() -> FuelMap {
        ["rd", "ajf"]
            .into_iter()
            .map(|id| (id.into(), Fuel::new(id.into(), "diesel".into())))
            .collect()
    }

    #[test]
    fn test_read_coproducts_iter() {
        let records = [CoproductRaw {
            fuel: "ajf".into(),
            base_fuel: "rd".into(),
            multiplier: 1.02,
        }];

        let coproducts = read_coproducts_iter(records.into_iter(), &fuels()).unwrap();
        assert_approx_eq!(
            f64,
            coproducts.multiplier(&"ajf".into(), &"rd".into()).unwrap(),
            1.02
        );
    }

    #[test]
    fn test_read_coproducts_iter_unknown_fuel() {
        let records = [CoproductRaw {
            fuel: "naphtha".into(),
            base_fuel: "rd".into(),
            multiplier: 1.0,
        }];

        assert!(read_coproducts_iter(records.into_iter(), &fuels()).is_err());
    }
}
