//! Extraction of solved model output into a reporting table.
//!
//! Solved variable values and constraint duals are translated into named rows: fuel
//! quantities aggregated by display name, energy-weighted average carbon intensities,
//! marginal costs from demand-constraint duals and credit prices from the credit balance
//! duals. Active slack variables are surfaced loudly, since they mean a production or
//! demand requirement was only met by the escape valve.
use super::optimisation::constraints::ConstraintKey;
use super::optimisation::{Solution, VariableKey, iter_groups};
use crate::model::Model;
use crate::model::parameters::MJ_PER_GGE;
use indexmap::IndexMap;
use log::warn;
use std::collections::BTreeMap;

/// Round to two decimal places for display
fn round2(value: f64) -> f64 {
    (value * 100.0).round() / 100.0
}

/// A year-indexed table of named result rows with display metadata
#[derive(Default)]
pub struct RunResults {
    categories: IndexMap<String, String>,
    units: IndexMap<String, String>,
    values: BTreeMap<u32, IndexMap<String, f64>>,
}

impl RunResults {
    /// Create an empty results table
    pub fn new() -> Self {
        Self::default()
    }

    /// The value of a named row for a year, if present
    pub fn value(&self, year: u32, name: &str) -> Option<f64> {
        self.values.get(&year)?.get(name).copied()
    }

    /// Iterate over the years with recorded results, in order
    pub fn iter_years(&self) -> impl Iterator<Item = u32> + '_ {
        self.values.keys().copied()
    }

    /// Iterate over (name, category, units) for every row, in recording order
    pub fn iter_rows(&self) -> impl Iterator<Item = (&String, &String, &String)> {
        self.categories
            .iter()
            .map(|(name, category)| (name, category, &self.units[name]))
    }

    /// Whether any results have been recorded
    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    /// Set a named row's value for a year, replacing any earlier value
    fn set_row(&mut self, year: u32, name: String, category: &str, units: String, value: f64) {
        self.categories.insert(name.clone(), category.into());
        self.units.insert(name.clone(), units);
        self.values.entry(year).or_default().insert(name, value);
    }

    /// Add to a named row's value for a year, starting from zero
    fn add_to_row(&mut self, year: u32, name: String, category: &str, units: String, delta: f64) {
        self.categories.insert(name.clone(), category.into());
        self.units.insert(name.clone(), units);
        *self
            .values
            .entry(year)
            .or_default()
            .entry(name)
            .or_insert(0.0) += delta;
    }

    /// Record the solved results for one year.
    ///
    /// # Arguments
    ///
    /// * `model` - The scenario model
    /// * `year` - The year that was solved
    /// * `solution` - The year's solution
    pub fn record(&mut self, model: &Model, year: u32, solution: &Solution) {
        // Carbon and energy accumulated per display name, for average CI
        let mut emissions: IndexMap<String, (f64, f64)> = IndexMap::new();

        // Fuel quantities, aggregated by display name across feedstocks
        for (fuel, feedstock, pathway) in iter_groups(model, year) {
            let meta = &pathway.results;

            let mut energy = 0.0;
            for (price, _) in feedstock.iter_supply() {
                let key = VariableKey::Production {
                    fuel: fuel.id.clone(),
                    feedstock: feedstock.id.clone(),
                    price,
                };
                energy += solution.value(&key) * pathway.fuel_yield;
            }

            self.add_to_row(
                year,
                meta.name.clone(),
                "Fuel",
                meta.units.clone(),
                energy * meta.multiplier,
            );

            let entry = emissions.entry(meta.name.clone()).or_insert((0.0, 0.0));
            entry.0 += pathway.carbon_intensity * energy;
            entry.1 += energy;
        }

        // Active slack means the constraints were only satisfiable via the escape valve
        for (fuel, value) in solution.iter_slack().filter(|(_, value)| *value > 0.0) {
            warn!(
                "Fuel production volumes are constrained. The model is adding a slack \
                 variable for {fuel} to relax this constraint. Price estimates are unreliable."
            );
            self.set_row(
                year,
                fuel.to_string(),
                "RelaxedConstraint",
                format!("{fuel} slack"),
                value,
            );
        }

        // Marginal costs and credit prices come from the dual values
        for key in solution.constraints().iter() {
            match key {
                ConstraintKey::Demand { pool } => {
                    let dual = solution.dual(key).expect("Missing demand dual");
                    self.set_row(
                        year,
                        format!("{pool} Cost"),
                        "Marginal Cost",
                        "$/GGE".into(),
                        round2(dual * MJ_PER_GGE),
                    );
                }
                ConstraintKey::CreditTotal => {
                    let dual = solution.dual(key).expect("Missing credit dual");
                    self.set_row(year, "total".into(), "Credit Price", "$/ton".into(), dual.trunc());
                    self.record_credit_quantity(year, "total", solution, key);
                }
                ConstraintKey::Credit { credit } => {
                    let dual = solution.dual(key).expect("Missing credit dual");
                    self.set_row(
                        year,
                        credit.to_string(),
                        "Credit Differential",
                        "$/ton".into(),
                        dual.trunc(),
                    );
                    self.record_credit_quantity(year, &credit.to_string(), solution, key);
                }
                _ => {}
            }
        }

        // Energy-weighted average carbon intensity per aggregate
        for (name, (carbon, energy)) in emissions {
            if energy == 0.0 {
                continue;
            }

            self.set_row(
                year,
                format!("{name} Avg CI"),
                "Carbon Intensity",
                "gCO2e/MJ".into(),
                round2(carbon / energy),
            );
        }
    }

    /// Record the credit quantity (constraint activity) row for a credit balance constraint
    fn record_credit_quantity(
        &mut self,
        year: u32,
        name: &str,
        solution: &Solution,
        key: &ConstraintKey,
    ) {
        let activity = solution.activity(key).expect("Missing credit activity");
        self.set_row(
            year,
            format!("{name} credit quantity"),
            "Credits",
            "tons".into(),
            activity.trunc(),
        );
    }
}
