//! Code for performing the equilibrium optimisation.
//!
//! Each model year is translated into a fresh linear program: one decision variable per
//! feedstock price tier per production pathway (plus slack and credit-trading variables), an
//! objective minimising total delivered cost net of subsidy, and the constraint families
//! described in [`constraints`]. The program is handed to the HiGHS solver and the solved
//! variable values, dual values and activity levels are wrapped up in a [`Solution`].
use crate::credit::CreditID;
use crate::feedstock::{Feedstock, FeedstockID};
use crate::fuel::{Fuel, FuelID};
use crate::model::Model;
use crate::pathway::Pathway;
use anyhow::{Result, bail, ensure};
use highs::{HighsModelStatus, RowProblem as Problem, Sense};
use indexmap::IndexMap;
use log::{info, warn};

pub mod constraints;
use constraints::{ConstraintKey, ConstraintKeys, add_constraints};

use super::roll_forward::ProductionLimits;

/// A decision variable in the optimisation
///
/// Note that this type does **not** include the value of the variable; it just refers to a
/// particular column of the problem.
type Variable = highs::Col;

/// Identifies what a decision variable represents
#[derive(Clone, PartialEq, Eq, Hash, Debug)]
pub enum VariableKey {
    /// Feedstock processed for one fuel at one supply-curve price tier (feedstock units)
    Production {
        /// The fuel produced
        fuel: FuelID,
        /// The feedstock consumed
        feedstock: FeedstockID,
        /// The supply-curve price tier ($/unit)
        price: i64,
    },
    /// High-penalty escape valve absorbing otherwise-infeasible production requirements
    Slack {
        /// The fuel whose production constraint the slack relaxes
        fuel: FuelID,
    },
    /// Credits drawn from a program's bank, or owed against its deficit obligation
    Credit {
        /// The credit program
        credit: CreditID,
    },
}

/// A map for easy lookup of variables in the problem.
///
/// The entries are ordered (see [`IndexMap`]), which is what lets us match keys up with the
/// solver's column-ordered output when reading the solution back.
#[derive(Default)]
pub struct VariableMap(IndexMap<VariableKey, Variable>);

impl VariableMap {
    /// Get the [`Variable`] corresponding to the given key
    fn get(&self, key: &VariableKey) -> Variable {
        *self.0.get(key).expect("No variable found for given params")
    }

    fn insert(&mut self, key: VariableKey, var: Variable) {
        let existing = self.0.insert(key, var).is_some();
        assert!(!existing, "Duplicate entry for var");
    }

    fn contains(&self, key: &VariableKey) -> bool {
        self.0.contains_key(key)
    }
}

/// The solution to the equilibrium optimisation problem for one year
pub struct Solution {
    solution: highs::Solution,
    variables: VariableMap,
    keys: ConstraintKeys,
    deficit_fuels: Vec<VariableKey>,
}

impl Solution {
    /// The solved value of a decision variable
    pub fn value(&self, key: &VariableKey) -> f64 {
        let index = self
            .variables
            .0
            .get_index_of(key)
            .expect("No variable found for given params");
        self.solution.columns()[index]
    }

    /// Iterate over production variables and their solved values
    pub fn iter_production(&self) -> impl Iterator<Item = (&FuelID, &FeedstockID, i64, f64)> {
        self.variables
            .0
            .keys()
            .zip(self.solution.columns().iter().copied())
            .filter_map(|(key, value)| match key {
                VariableKey::Production {
                    fuel,
                    feedstock,
                    price,
                } => Some((fuel, feedstock, *price, value)),
                _ => None,
            })
    }

    /// Iterate over slack variables and their solved values
    pub fn iter_slack(&self) -> impl Iterator<Item = (&FuelID, f64)> {
        self.variables
            .0
            .keys()
            .zip(self.solution.columns().iter().copied())
            .filter_map(|(key, value)| match key {
                VariableKey::Slack { fuel } => Some((fuel, value)),
                _ => None,
            })
    }

    /// The dual value of a constraint, if the constraint is part of the problem
    pub fn dual(&self, key: &ConstraintKey) -> Option<f64> {
        Some(self.solution.dual_rows()[self.keys.index_of(key)?])
    }

    /// The activity level of a constraint, if the constraint is part of the problem
    pub fn activity(&self, key: &ConstraintKey) -> Option<f64> {
        Some(self.solution.rows()[self.keys.index_of(key)?])
    }

    /// The constraints of the solved problem, in row order
    pub fn constraints(&self) -> &ConstraintKeys {
        &self.keys
    }

    /// Realized production per fuel (MJ), summed across feedstocks.
    ///
    /// Fuels with no production are omitted.
    pub fn fuel_supply(&self, model: &Model, year: u32) -> IndexMap<FuelID, f64> {
        let mut supply: IndexMap<FuelID, f64> = IndexMap::new();
        for (fuel, feedstock, _, value) in self.iter_production() {
            let pathway = model
                .pathways
                .resolve(feedstock, fuel, Some(year))
                .expect("No pathway for production variable");
            *supply.entry(fuel.clone()).or_insert(0.0) += value * pathway.fuel_yield;
        }

        supply.retain(|_, quantity| *quantity > 0.0);
        supply
    }

    /// The production variables which generate credit deficits under a benchmark
    pub fn deficit_fuels(&self) -> &[VariableKey] {
        &self.deficit_fuels
    }
}

/// Build and solve the equilibrium problem for one year.
///
/// The program is rebuilt from scratch on every call; `limits` carries any roll-forward
/// production bounds derived from the previous year's solution.
///
/// If the solver reports a numerical-precision failure, the feasibility tolerance is raised
/// by a factor of ten and the whole build-and-solve cycle is retried, up to a fixed ceiling.
/// Solver-reported infeasibility is a terminal error for the scenario.
///
/// # Arguments
///
/// * `model` - The scenario model
/// * `year` - The year to solve
/// * `limits` - Roll-forward production bounds from the prior year, if solving incrementally
///
/// # Returns
///
/// A [`Solution`] with variable values and constraint duals, or an error.
pub fn solve_equilibrium(
    model: &Model,
    year: u32,
    limits: Option<&ProductionLimits>,
) -> Result<Solution> {
    model.verify(year)?;

    let mut tolerance = model.parameters.feasibility_tolerance;
    loop {
        let mut problem = Problem::default();
        let variables = add_variables(&mut problem, model, year);
        let (keys, deficit_fuels) = add_constraints(&mut problem, &variables, model, year, limits)?;

        let mut solver = problem.optimise(Sense::Minimise);
        solver.set_option("output_flag", false);
        solver.set_option("primal_feasibility_tolerance", tolerance);

        let solved = solver.solve();
        match solved.status() {
            HighsModelStatus::Optimal => {
                info!("Model solved for {year}");
                return Ok(Solution {
                    solution: solved.get_solution(),
                    variables,
                    keys,
                    deficit_fuels,
                });
            }
            HighsModelStatus::Infeasible | HighsModelStatus::UnboundedOrInfeasible => {
                bail!("No feasible production mix satisfies the constraints for {year}")
            }
            status if is_numerical_failure(&status) => {
                ensure!(
                    tolerance <= model.parameters.tolerance_ceiling,
                    "The model could not be resolved. There is likely an issue with the \
                     magnitude of units being analysed. Try aggregating inputs or changing \
                     units to reduce the range of magnitude (e.g. fewer zeroes)"
                );
                tolerance *= 10.0;
                warn!(
                    "The model precision requirements could not be met for {year}. Raising \
                     the feasibility tolerance to {tolerance} and trying again"
                );
            }
            status => bail!("Could not solve: {status:?}"),
        }
    }
}

/// Whether a solver status indicates a numerical-precision failure worth retrying
fn is_numerical_failure(status: &HighsModelStatus) -> bool {
    matches!(
        status,
        HighsModelStatus::NotSet
            | HighsModelStatus::SolveError
            | HighsModelStatus::PostsolveError
            | HighsModelStatus::Unknown
    )
}

/// Iterate over every (fuel, feedstock) pair backed by a pathway, resolved for `year`.
///
/// This is the iteration order in which production variables are created, and the one every
/// constraint family uses to find them.
pub(crate) fn iter_groups(
    model: &Model,
    year: u32,
) -> impl Iterator<Item = (&Fuel, &Feedstock, &Pathway)> {
    model.feedstocks.values().flat_map(move |feedstock| {
        model
            .pathways
            .fuels_for_feedstock(&feedstock.id)
            .map(move |fuel_id| {
                let pathway = model
                    .pathways
                    .resolve(&feedstock.id, fuel_id, Some(year))
                    .expect("No pathway for fuel/feedstock pair");
                (&model.fuels[fuel_id], feedstock, pathway)
            })
    })
}

/// Add variables to the optimisation problem.
///
/// # Arguments
///
/// * `problem` - The optimisation problem
/// * `model` - The scenario model
/// * `year` - The year being solved
///
/// # Returns
///
/// A [`VariableMap`] with the problem's variables as values.
fn add_variables(problem: &mut Problem, model: &Model, year: u32) -> VariableMap {
    let mut variables = VariableMap::default();

    // Credit bank/obligation variables for programs with external supply this year
    for credit in model.credits.values() {
        if let Some(supply) = credit.supply_for(year) {
            let (min, max) = credit_variable_bounds(supply);
            let var = problem.add_column(0.0, min..=max);
            variables.insert(
                VariableKey::Credit {
                    credit: credit.id.clone(),
                },
                var,
            );
        }
    }

    // One variable per feedstock price tier per pathway, plus one slack variable per fuel
    for (fuel, feedstock, pathway) in iter_groups(model, year) {
        let slack_key = VariableKey::Slack {
            fuel: fuel.id.clone(),
        };
        if !variables.contains(&slack_key) {
            let var = problem.add_column(model.parameters.slack_penalty, 0.0..);
            variables.insert(slack_key, var);
        }

        for (price, quantity) in feedstock.iter_supply() {
            let var = problem.add_column(cost_coefficient(pathway, price), 0.0..=quantity);
            variables.insert(
                VariableKey::Production {
                    fuel: fuel.id.clone(),
                    feedstock: feedstock.id.clone(),
                    price,
                },
                var,
            );
        }
    }

    variables
}

/// Calculate the objective cost coefficient for a production variable.
///
/// Cost ($/unit feedstock) = conversion cost ($/unit) + feedstock price ($/unit)
///                           - subsidy ($/MJ) x yield (MJ/unit)
fn cost_coefficient(pathway: &Pathway, price: i64) -> f64 {
    (pathway.conversion_cost + price) as f64 - pathway.subsidy * pathway.fuel_yield
}

/// Bounds for a credit variable given the program's external supply.
///
/// A positive supply is a bank the model may draw down; a negative supply is an obligation
/// which must be covered in full, with no upper bound on how much is generated to cover it.
fn credit_variable_bounds(supply: f64) -> (f64, f64) {
    if supply > 0.0 {
        (0.0, supply)
    } else {
        (-supply, f64::INFINITY)
    }
}

/// The sign with which a credit variable enters the credit balance constraints.
///
/// Banked credits add to the balance; obligations subtract from it. This convention must
/// match [`credit_variable_bounds`] exactly.
pub(crate) fn credit_coefficient(supply: f64) -> f64 {
    if supply > 0.0 { 1.0 } else { -1.0 }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fixture::{model, pathway};
    use float_cmp::assert_approx_eq;
    use rstest::rstest;

    #[test]
    fn test_cost_coefficient() {
        let mut pw = pathway(2020, 10.0);
        assert_approx_eq!(f64, cost_coefficient(&pw, 10), 110.0);

        pw.add_subsidy(0.5);
        assert_approx_eq!(f64, cost_coefficient(&pw, 10), 105.0);
    }

    #[test]
    fn test_credit_variable_bounds() {
        // Positive supply is a bank
        assert_eq!(credit_variable_bounds(100.0), (0.0, 100.0));
        // Negative supply is an obligation which must be covered
        assert_eq!(credit_variable_bounds(-100.0), (100.0, f64::INFINITY));
    }

    #[test]
    fn test_credit_coefficient() {
        assert_eq!(credit_coefficient(100.0), 1.0);
        assert_eq!(credit_coefficient(-100.0), -1.0);
    }

    #[rstest]
    fn test_iter_groups(model: crate::model::Model) {
        let groups: Vec<_> = iter_groups(&model, 2020).collect();
        assert_eq!(groups.len(), 1);
        let (fuel, feedstock, pathway) = groups[0];
        assert_eq!(fuel.id, "ethanol".into());
        assert_eq!(feedstock.id, "corn".into());
        assert_approx_eq!(f64, pathway.fuel_yield, 10.0);
    }

    #[rstest]
    fn test_solve_equilibrium(model: crate::model::Model) {
        let solution = solve_equilibrium(&model, 2020, None).unwrap();

        // All 90 tons of corn needed to meet 900 MJ of demand at 10 MJ/ton
        let key = VariableKey::Production {
            fuel: "ethanol".into(),
            feedstock: "corn".into(),
            price: 10,
        };
        assert_approx_eq!(f64, solution.value(&key), 90.0, epsilon = 1e-6);

        // No slack should be needed
        let slack: f64 = solution.iter_slack().map(|(_, value)| value).sum();
        assert_approx_eq!(f64, slack, 0.0, epsilon = 1e-6);

        let supply = solution.fuel_supply(&model, 2020);
        assert_approx_eq!(f64, supply[&FuelID::from("ethanol")], 900.0, epsilon = 1e-3);
    }

    #[rstest]
    fn test_solve_equilibrium_coproduct_ratio(mut model: crate::model::Model) {
        // Tie AJF output to half of ethanol's energy and share the corn supply
        model
            .feedstocks
            .get_mut("corn")
            .unwrap()
            .add_supply(10, 200.0);

        let mut pw = pathway(2020, 5.0);
        pw.fuel = "ajf".into();
        model.pathways.add(pw);
        model
            .fuels
            .insert("ajf".into(), Fuel::new("ajf".into(), "gasoline".into()));
        model.coproducts.add("ajf".into(), "ethanol".into(), 0.5);

        let solution = solve_equilibrium(&model, 2020, None).unwrap();
        let supply = solution.fuel_supply(&model, 2020);
        let ethanol = supply[&FuelID::from("ethanol")];
        let ajf = supply[&FuelID::from("ajf")];

        // The ratio holds exactly and the pool demand is still met
        assert_approx_eq!(f64, ajf, 0.5 * ethanol, epsilon = 1e-6);
        assert_approx_eq!(f64, ethanol + ajf, 900.0, epsilon = 1e-6);
    }

    #[rstest]
    fn test_solve_equilibrium_infeasible(mut model: crate::model::Model) {
        // A production ceiling below the externally required minimum must fail fast
        let fuel = model.fuels.get_mut("ethanol").unwrap();
        fuel.add_supply(2020, 100.0, None);
        fuel.add_limit(2020, 50.0, 0.0);

        assert!(solve_equilibrium(&model, 2020, None).is_err());
    }
}
