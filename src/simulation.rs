//! Functionality for running a scenario simulation.
//!
//! Years are solved strictly in sequence: when the next requested year immediately follows
//! the one just solved, the solved quantities roll forward as production bounds; otherwise
//! the year is solved from a cold start with no carried bounds. A solver-reported
//! infeasibility aborts the scenario rather than skipping the year.
use crate::model::Model;
use anyhow::Result;
use log::info;

pub mod optimisation;
use optimisation::solve_equilibrium;
pub mod results;
pub use results::RunResults;
pub mod roll_forward;
use roll_forward::{ProductionLimits, derive_production_limits};

/// Run the simulation.
///
/// # Arguments
///
/// * `model` - The scenario model to run
///
/// # Returns
///
/// The results table for every solved year, or an error on the first year that fails.
pub fn run(model: &Model) -> Result<RunResults> {
    let mut results = RunResults::new();
    let mut rollforward: Option<(u32, ProductionLimits)> = None;

    for year in model.iter_years() {
        let limits = match &rollforward {
            Some((solved, limits)) if solved + 1 == year => {
                info!("Year {year}: rolling forward production bounds from {solved}");
                Some(limits)
            }
            _ => {
                info!("Year {year}: solving from a cold start");
                None
            }
        };

        let solution = solve_equilibrium(model, year, limits)?;
        results.record(model, year, &solution);
        rollforward = Some((year, derive_production_limits(model, year, &solution)));
    }

    Ok(results)
}
