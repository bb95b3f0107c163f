//! The module responsible for writing output data to disk.
use crate::simulation::RunResults;
use anyhow::{Context, Result};
use itertools::Itertools;
use std::fs;
use std::path::{Path, PathBuf};

/// The root folder in which model-specific output folders will be created
const OUTPUT_DIRECTORY_ROOT: &str = "fueleq_results";

/// The output file name for the results table
const RESULTS_FILE_NAME: &str = "results.csv";

/// Get the output directory for the model specified at `model_dir`
pub fn get_output_dir(model_dir: &Path) -> Result<PathBuf> {
    // Canonicalise in case the user has specified "."
    let model_dir = model_dir
        .canonicalize()
        .context("Could not resolve path to model")?;

    let model_name = model_dir
        .file_name()
        .context("Model cannot be in root folder")?
        .to_str()
        .context("Invalid chars in model dir name")?;

    Ok([OUTPUT_DIRECTORY_ROOT, model_name].iter().collect())
}

/// Create a new output directory for a model, if it does not already exist
pub fn create_output_directory(output_dir: &Path) -> Result<()> {
    if output_dir.is_dir() {
        return Ok(());
    }

    fs::create_dir_all(output_dir)?;

    Ok(())
}

/// Write the results table to a CSV file in `output_dir`.
///
/// Rows are result names with their category and units; one value column per solved year.
///
/// # Returns
///
/// The path of the file written.
pub fn write_results(output_dir: &Path, results: &RunResults) -> Result<PathBuf> {
    let file_path = output_dir.join(RESULTS_FILE_NAME);
    let mut writer = csv::Writer::from_path(&file_path)?;

    let years: Vec<u32> = results.iter_years().collect();
    let header = ["name", "category", "units"]
        .into_iter()
        .map(String::from)
        .chain(years.iter().map(u32::to_string))
        .collect_vec();
    writer.write_record(&header)?;

    for (name, category, units) in results.iter_rows() {
        let record = [name, category, units]
            .into_iter()
            .cloned()
            .chain(years.iter().map(|year| {
                results
                    .value(*year, name)
                    .map(|value| value.to_string())
                    .unwrap_or_default()
            }))
            .collect_vec();
        writer.write_record(&record)?;
    }

    writer.flush()?;
    Ok(file_path)
}
