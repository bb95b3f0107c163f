//! Defines the `ScenarioParameters` struct, which represents the contents of `scenario.toml`.
use crate::input::{input_err_msg, is_sorted_and_unique, read_toml};
use anyhow::{Context, Result, ensure};
use serde::Deserialize;
use std::path::Path;

const SCENARIO_FILE_NAME: &str = "scenario.toml";

/// Energy content of a gallon of gasoline equivalent (MJ/GGE)
pub const MJ_PER_GGE: f64 = 115.83;

macro_rules! define_param_default {
    ($name:ident, $type: ty, $value: expr) => {
        fn $name() -> $type {
            $value
        }
    };
}

define_param_default!(default_production_change, f64, 0.40);
define_param_default!(default_slack_penalty, f64, 1e5);
define_param_default!(default_feasibility_tolerance, f64, 1e-6);
define_param_default!(default_tolerance_ceiling, f64, 10.0);
define_param_default!(default_rollforward_threshold, f64, 1e9);
// The roll-forward ceiling never squeezes a fuel below one 50 million GGE/yr facility
define_param_default!(default_facility_floor, f64, 50e6 * MJ_PER_GGE);

/// Represents the contents of the entire scenario file.
#[derive(Debug, Deserialize, PartialEq, Clone)]
pub struct ScenarioParameters {
    /// The years to solve, in order
    pub years: Vec<u32>,
    /// The fraction by which a fuel's production may grow or shrink year over year when no
    /// fuel-specific limit is given
    #[serde(default = "default_production_change")]
    pub default_production_change: f64,
    /// Objective penalty applied to slack variables.
    ///
    /// Must dwarf every real conversion cost so slack is only used when the problem would
    /// otherwise be infeasible.
    #[serde(default = "default_slack_penalty")]
    pub slack_penalty: f64,
    /// The solver's initial feasibility tolerance
    #[serde(default = "default_feasibility_tolerance")]
    pub feasibility_tolerance: f64,
    /// The largest feasibility tolerance to retry with before giving up
    #[serde(default = "default_tolerance_ceiling")]
    pub tolerance_ceiling: f64,
    /// Realized production below this level (MJ) does not set a roll-forward minimum
    #[serde(default = "default_rollforward_threshold")]
    pub rollforward_threshold: f64,
    /// The smallest roll-forward production ceiling (MJ)
    #[serde(default = "default_facility_floor")]
    pub facility_floor: f64,
}

/// Check that the `years` parameter is valid
fn check_years(years: &[u32]) -> Result<()> {
    ensure!(!years.is_empty(), "`years` is empty");

    ensure!(
        is_sorted_and_unique(years),
        "`years` must be composed of unique values in order"
    );

    Ok(())
}

/// Check that the `default_production_change` parameter is valid
fn check_production_change(value: f64) -> Result<()> {
    ensure!(
        (0.0..1.0).contains(&value),
        "default_production_change must be in the range [0, 1)"
    );

    Ok(())
}

/// Check the tolerance parameters are valid
fn check_tolerances(tolerance: f64, ceiling: f64) -> Result<()> {
    ensure!(
        tolerance.is_finite() && tolerance > 0.0,
        "feasibility_tolerance must be a finite number greater than zero"
    );
    ensure!(
        ceiling >= tolerance,
        "tolerance_ceiling must not be smaller than feasibility_tolerance"
    );

    Ok(())
}

/// Check that a parameter which must be a non-negative quantity is valid
fn check_non_negative(name: &str, value: f64) -> Result<()> {
    ensure!(
        value.is_finite() && value >= 0.0,
        "{name} must be a finite non-negative number"
    );

    Ok(())
}

impl ScenarioParameters {
    /// Read scenario parameters from the specified directory.
    ///
    /// # Arguments
    ///
    /// * `model_dir` - Folder containing scenario configuration files
    ///
    /// # Returns
    ///
    /// The scenario file contents as a [`ScenarioParameters`] struct or an error if the file
    /// is missing or invalid.
    pub fn from_path<P: AsRef<Path>>(model_dir: P) -> Result<ScenarioParameters> {
        let file_path = model_dir.as_ref().join(SCENARIO_FILE_NAME);
        let params: ScenarioParameters =
            read_toml(&file_path).with_context(|| input_err_msg(&file_path))?;
        params.validate()?;

        Ok(params)
    }

    /// Check every parameter is in range
    pub fn validate(&self) -> Result<()> {
        check_years(&self.years)?;
        check_production_change(self.default_production_change)?;
        check_tolerances(self.feasibility_tolerance, self.tolerance_ceiling)?;
        check_non_negative("slack_penalty", self.slack_penalty)?;
        check_non_negative("rollforward_threshold", self.rollforward_threshold)?;
        check_non_negative("facility_floor", self.facility_floor)?;

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs::File;
    use std::io::Write;
    use tempfile::tempdir;

    #[test]
    fn test_check_years() {
        assert!(check_years(&[]).is_err());
        assert!(check_years(&[2020]).is_ok());
        assert!(check_years(&[2020, 2021]).is_ok());
        assert!(check_years(&[2020, 2020]).is_err());
        assert!(check_years(&[2021, 2020]).is_err());
    }

    #[test]
    fn test_check_production_change() {
        assert!(check_production_change(0.0).is_ok());
        assert!(check_production_change(0.4).is_ok());
        assert!(check_production_change(1.0).is_err());
        assert!(check_production_change(-0.1).is_err());
    }

    #[test]
    fn test_from_path() {
        let dir = tempdir().unwrap();
        {
            let mut file = File::create(dir.path().join(SCENARIO_FILE_NAME)).unwrap();
            writeln!(file, "years = [2020, 2021]").unwrap();
        }

        let params = ScenarioParameters::from_path(dir.path()).unwrap();
        assert_eq!(params.years, vec![2020, 2021]);
        assert_eq!(params.default_production_change, 0.40);
        assert_eq!(params.slack_penalty, 1e5);
    }

    #[test]
    fn test_from_path_override() {
        let dir = tempdir().unwrap();
        {
            let mut file = File::create(dir.path().join(SCENARIO_FILE_NAME)).unwrap();
            writeln!(
                file,
                "years = [2020]\ndefault_production_change = 0.25\nslack_penalty = 1e6"
            )
            .unwrap();
        }

        let params = ScenarioParameters::from_path(dir.path()).unwrap();
        assert_eq!(params.default_production_change, 0.25);
        assert_eq!(params.slack_penalty, 1e6);
    }
}
