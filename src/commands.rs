//! The command line interface for the model.
use crate::model::Model;
use crate::output::{create_output_directory, get_output_dir, write_results};
use crate::settings::Settings;
use crate::{log, simulation};
use ::log::info;
use anyhow::{Context, Result, ensure};
use clap::{Parser, Subcommand};
use std::fs;
use std::path::{Path, PathBuf};

#[derive(Parser)]
#[command(version, about)]
/// The command line interface for the model.
pub struct Cli {
    #[command(subcommand)]
    /// The available commands.
    pub command: Commands,
}

#[derive(Subcommand)]
/// The available commands.
pub enum Commands {
    /// Run a scenario model.
    Run {
        /// Path to the model directory.
        model_dir: PathBuf,
    },
    /// Write a skeleton scenario directory to start from.
    Template {
        /// Path of the directory to create.
        directory: PathBuf,
    },
}

/// Handle the `run` command.
pub fn handle_run_command(model_dir: &Path) -> Result<()> {
    let settings = Settings::from_path(model_dir)?;
    log::init(settings.log_level.as_deref()).context("Failed to initialise logging.")?;

    let model = Model::from_path(model_dir).context("Failed to load model.")?;
    info!("Model loaded successfully.");

    let results = simulation::run(&model)?;

    let output_dir = get_output_dir(model_dir)?;
    create_output_directory(&output_dir).context("Failed to create output directory.")?;
    let file_path = write_results(&output_dir, &results)?;
    info!("Results written to {}", file_path.display());

    Ok(())
}

/// The contents of the skeleton scenario files, keyed by file name
const TEMPLATE_FILES: [(&str, &str); 11] = [
    (
        "scenario.toml",
        "# Years to solve, in order\nyears = [2020]\n\n\
         # Fraction by which production may change year over year by default\n\
         # default_production_change = 0.4\n",
    ),
    ("fuel_pools.csv", "fuel_pool,year,demand,exceed\n"),
    ("feedstocks.csv", "feedstock,price,quantity\n"),
    (
        "pathways.csv",
        "year,fuel,fuel_pool,feedstock,conversion_cost,yield,carbon_intensity,eer,subsidy,\
         credit,benchmark,blend,results_name,results_units,results_multiplier\n",
    ),
    ("fuel_supply.csv", "year,fuel,energy,attribution\n"),
    ("production_limits.csv", "year,fuel,maximum,pct_change\n"),
    ("credit_limits.csv", "year,credit,minimum,maximum\n"),
    ("additional_credits.csv", "year,credit,quantity\n"),
    ("benchmarks.csv", "year,benchmark,standard\n"),
    (
        "blend_requirements.csv",
        "year,requirement,fuel_pool,minimum,maximum\n",
    ),
    ("coproducts.csv", "fuel,base_fuel,multiplier\n"),
];

/// Handle the `template` command.
pub fn handle_template_command(directory: &Path) -> Result<()> {
    ensure!(
        !directory.join("scenario.toml").is_file(),
        "'{}' already contains a scenario. The template will not overwrite it.",
        directory.display()
    );
    fs::create_dir_all(directory)
        .with_context(|| format!("Failed to create '{}'", directory.display()))?;

    for (file_name, contents) in TEMPLATE_FILES {
        fs::write(directory.join(file_name), contents)?;
    }
    println!("Scenario template written to '{}'", directory.display());

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[test]
    fn test_handle_template_command() {
        let dir = tempdir().unwrap();
        let target = dir.path().join("new_scenario");

        handle_template_command(&target).unwrap();
        for (file_name, _) in TEMPLATE_FILES {
            assert!(target.join(file_name).is_file());
        }

        // A second invocation must not clobber the scenario
        assert!(handle_template_command(&target).is_err());
    }
}
