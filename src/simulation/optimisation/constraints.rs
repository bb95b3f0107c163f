//! Code for adding constraints to the equilibrium optimisation problem.
//!
//! Five constraint families are built, in a fixed order so that dual values can be read back
//! by row position: feedstock availability, demand satisfaction, supply/growth limits, the
//! credit/CI balance and blending, then co-product ratios. Families with no applicable input
//! (no credit limits, no blends, no co-products, no production limits) are simply omitted.
use super::{VariableKey, VariableMap, credit_coefficient, iter_groups};
use crate::blend::BlendID;
use crate::credit::CreditID;
use crate::feedstock::{Feedstock, FeedstockID};
use crate::fuel::{Fuel, FuelID, FuelPoolID};
use crate::model::Model;
use crate::simulation::roll_forward::ProductionLimits;
use anyhow::{Context, Result, ensure};
use highs::RowProblem as Problem;
use indexmap::{IndexMap, IndexSet};
use log::{debug, info};

/// Identifies what a constraint row represents
#[derive(Clone, PartialEq, Eq, Hash, Debug)]
pub enum ConstraintKey {
    /// Availability of one feedstock at one supply-curve price tier
    Feedstock {
        /// The feedstock
        feedstock: FeedstockID,
        /// The supply-curve price tier ($/unit)
        price: i64,
    },
    /// Demand satisfaction for one fuel pool
    Demand {
        /// The demand pool
        pool: FuelPoolID,
    },
    /// Supply floor and growth ceiling for one fuel
    Supply {
        /// The fuel
        fuel: FuelID,
    },
    /// The aggregate credit balance across every program
    CreditTotal,
    /// The credit balance for one program
    Credit {
        /// The credit program
        credit: CreditID,
    },
    /// Minimum share-of-pool-energy for a blend requirement
    BlendMinimum {
        /// The blend requirement
        requirement: BlendID,
        /// The pool the share is measured against
        pool: FuelPoolID,
    },
    /// Maximum share-of-pool-energy for a blend requirement
    BlendMaximum {
        /// The blend requirement
        requirement: BlendID,
        /// The pool the share is measured against
        pool: FuelPoolID,
    },
    /// Exact output ratio between a base fuel and one of its co-products
    Coproduct {
        /// The base fuel
        base: FuelID,
        /// The co-product fuel
        coproduct: FuelID,
    },
}

/// The constraints of a problem, in the order their rows were added.
///
/// Row position is what links a constraint to its dual value and activity level in the
/// solver's output.
#[derive(Default)]
pub struct ConstraintKeys(IndexSet<ConstraintKey>);

impl ConstraintKeys {
    /// The row index of a constraint, if it is part of the problem
    pub fn index_of(&self, key: &ConstraintKey) -> Option<usize> {
        self.0.get_index_of(key)
    }

    /// Iterate over the constraints in row order
    pub fn iter(&self) -> impl Iterator<Item = &ConstraintKey> {
        self.0.iter()
    }
}

/// A constraint row still being assembled: bounds plus a sparse coefficient map.
///
/// Coefficients are keyed by variable, so setting a coefficient twice keeps only the last
/// value.
struct PendingRow {
    key: ConstraintKey,
    min: f64,
    max: f64,
    coeffs: IndexMap<VariableKey, f64>,
}

impl PendingRow {
    fn new(key: ConstraintKey, min: f64, max: f64) -> Self {
        Self {
            key,
            min,
            max,
            coeffs: IndexMap::new(),
        }
    }

    fn set(&mut self, variable: VariableKey, coeff: f64) {
        self.coeffs.insert(variable, coeff);
    }
}

/// Add all constraint families to the optimisation problem.
///
/// # Arguments
///
/// * `problem` - The optimisation problem
/// * `variables` - The variables in the problem
/// * `model` - The scenario model
/// * `year` - The year being solved
/// * `limits` - Roll-forward production bounds from the prior year, if any
///
/// # Returns
///
/// The constraint keys in row order, along with the production variables flagged as
/// deficit-generating under a benchmark.
pub fn add_constraints(
    problem: &mut Problem,
    variables: &VariableMap,
    model: &Model,
    year: u32,
    limits: Option<&ProductionLimits>,
) -> Result<(ConstraintKeys, Vec<VariableKey>)> {
    let (rows, deficit_fuels) = build_rows(model, year, limits)?;

    let mut keys = ConstraintKeys::default();
    for row in rows {
        problem.add_row(
            row.min..=row.max,
            row.coeffs
                .iter()
                .map(|(key, coeff)| (variables.get(key), *coeff)),
        );
        keys.0.insert(row.key);
    }

    Ok((keys, deficit_fuels))
}

/// Assemble every pending constraint row for the year, in emission order
fn build_rows(
    model: &Model,
    year: u32,
    limits: Option<&ProductionLimits>,
) -> Result<(Vec<PendingRow>, Vec<VariableKey>)> {
    let mut rows = feedstock_rows(model);
    rows.extend(demand_rows(model, year)?);
    rows.extend(supply_rows(model, year, limits)?);

    let (credit_rows, deficit_fuels) = credit_balance_rows(model, year)?;
    rows.extend(credit_rows);
    rows.extend(blend_rows(model, year));
    rows.extend(coproduct_rows(model, year));

    Ok((rows, deficit_fuels))
}

/// Shorthand for a production variable key
fn production_key(fuel: &Fuel, feedstock: &Feedstock, price: i64) -> VariableKey {
    VariableKey::Production {
        fuel: fuel.id.clone(),
        feedstock: feedstock.id.clone(),
        price,
    }
}

/// Feedstock availability: at each price tier, total use across fuels is capped by the
/// quantity available at that tier.
fn feedstock_rows(model: &Model) -> Vec<PendingRow> {
    let mut rows = Vec::new();
    for feedstock in model.feedstocks.values() {
        let fuels: Vec<_> = model.pathways.fuels_for_feedstock(&feedstock.id).collect();
        if fuels.is_empty() {
            continue;
        }

        for (price, quantity) in feedstock.iter_supply() {
            let key = ConstraintKey::Feedstock {
                feedstock: feedstock.id.clone(),
                price,
            };
            let mut row = PendingRow::new(key, 0.0, quantity);
            for fuel in &fuels {
                row.set(
                    VariableKey::Production {
                        fuel: (*fuel).clone(),
                        feedstock: feedstock.id.clone(),
                        price,
                    },
                    1.0,
                );
            }
            rows.push(row);
        }
    }

    rows
}

/// Demand satisfaction: the energy delivered to each pool must meet its demand, exactly
/// unless the pool's exceed flag allows oversupply.
fn demand_rows(model: &Model, year: u32) -> Result<Vec<PendingRow>> {
    let mut rows: IndexMap<FuelPoolID, PendingRow> = IndexMap::new();
    for pool in model.pools.values() {
        let demand = pool
            .demand(year)
            .with_context(|| format!("No demand is defined for the {} fuel pool", pool.id))?;
        let maximum = if pool.exceed { f64::INFINITY } else { demand };

        let key = ConstraintKey::Demand {
            pool: pool.id.clone(),
        };
        rows.insert(pool.id.clone(), PendingRow::new(key, demand, maximum));
    }

    for (fuel, feedstock, pathway) in iter_groups(model, year) {
        let row = rows
            .get_mut(&fuel.pool)
            .expect("Fuel belongs to an undefined pool");
        for (price, _) in feedstock.iter_supply() {
            row.set(production_key(fuel, feedstock, price), pathway.fuel_yield);
        }
    }

    Ok(rows.into_values().collect())
}

/// Intersect externally configured production bounds with roll-forward bounds.
///
/// When a fuel-specific percent change is in force (any non-zero value), the prior year's
/// realized production is reconstructed from the stored roll-forward minimum (which was
/// derived with the default percentage) and the bounds are retaken around it, flooring the
/// ceiling at the minimum facility size so a new entrant is never squeezed to nothing.
fn effective_bounds(
    min_value: f64,
    max_value: f64,
    prior: Option<(f64, f64)>,
    pct_change: f64,
    default_pct: f64,
    facility_floor: f64,
) -> (f64, f64) {
    let Some((mut prior_min, mut prior_max)) = prior else {
        return (min_value, max_value);
    };

    if pct_change != 0.0 {
        let realized = prior_min / (1.0 - default_pct);
        prior_min = (1.0 - pct_change) * realized;
        prior_max = ((1.0 + pct_change) * realized).max(facility_floor);
    }

    (min_value.max(prior_min), max_value.min(prior_max))
}

/// Supply/growth limits: each fuel with a supply floor, a production ceiling or a
/// roll-forward bound gets a row bracketing its total production. Fuels with none of the
/// three are skipped entirely.
fn supply_rows(
    model: &Model,
    year: u32,
    limits: Option<&ProductionLimits>,
) -> Result<Vec<PendingRow>> {
    let params = &model.parameters;
    let mut rows: IndexMap<FuelID, PendingRow> = IndexMap::new();

    for fuel in model.fuels.values() {
        let supply = fuel.supply.get(&year);
        let limit = fuel.limits.get(&year);

        let min_value = supply.map_or(0.0, |s| s.quantity);
        let max_value = limit.map_or(f64::INFINITY, |l| l.maximum);
        let pct_change = limit.map_or(params.default_production_change, |l| l.pct_change);
        let prior = limits.and_then(|l| l.get(&fuel.id)).copied();

        if min_value == 0.0 && max_value == f64::INFINITY && prior.is_none() {
            continue;
        }

        let (minimum, maximum) = effective_bounds(
            min_value,
            max_value,
            prior,
            pct_change,
            params.default_production_change,
            params.facility_floor,
        );
        ensure!(
            minimum <= maximum,
            "The model will be unable to converge, because {} has a minimum fuel requirement \
             that exceeds the maximum fuel of that type allowed",
            fuel.id
        );

        if minimum == 0.0 && maximum == 0.0 {
            debug!("Avoiding production constraint for {}", fuel.id);
            continue;
        }

        let attribution = supply
            .and_then(|s| s.attribution.as_deref())
            .unwrap_or(if limit.is_some() {
                "ProductionLimit"
            } else {
                "RollForward"
            });
        info!(
            "Setting production constraint ({attribution}) for {}: {minimum}, {maximum}",
            fuel.id
        );

        let key = ConstraintKey::Supply {
            fuel: fuel.id.clone(),
        };
        rows.insert(fuel.id.clone(), PendingRow::new(key, minimum, maximum));
    }

    for (fuel, feedstock, pathway) in iter_groups(model, year) {
        let Some(row) = rows.get_mut(&fuel.id) else {
            continue;
        };

        // The slack variable relaxes the floor if it cannot otherwise be met
        row.set(
            VariableKey::Slack {
                fuel: fuel.id.clone(),
            },
            -pathway.fuel_yield,
        );
        for (price, _) in feedstock.iter_supply() {
            row.set(production_key(fuel, feedstock, price), pathway.fuel_yield);
        }
    }

    Ok(rows.into_values().collect())
}

/// The credit/CI balance: an aggregate row over every program plus one row per program.
///
/// Credits generated (or debited) by a pathway per unit of feedstock processed:
///
/// allowed = benchmark (gCO2e/MJ) x yield (MJ/unit) x EER
/// actual  = (pathway CI / EER) (gCO2e/MJ) x yield (MJ/unit) x EER
/// credits = (allowed - actual) x 1e-6 tons/g
///
/// Variables with a negative coefficient are deficit generators and are reported as such.
fn credit_balance_rows(
    model: &Model,
    year: u32,
) -> Result<(Vec<PendingRow>, Vec<VariableKey>)> {
    let mut total = PendingRow::new(ConstraintKey::CreditTotal, 0.0, f64::INFINITY);
    let mut programs: IndexMap<CreditID, PendingRow> = IndexMap::new();
    let mut deficit_fuels = Vec::new();

    for credit in model.credits.values() {
        let (minimum, maximum) = credit.limits_for(year);
        let key = ConstraintKey::Credit {
            credit: credit.id.clone(),
        };
        let mut row = PendingRow::new(key, minimum, maximum);

        // Additional credits (tons CO2e) from the program's bank or obligation
        if let Some(supply) = credit.supply_for(year) {
            let variable = VariableKey::Credit {
                credit: credit.id.clone(),
            };
            let coeff = credit_coefficient(supply);
            row.set(variable.clone(), coeff);
            total.set(variable, coeff);
        }

        programs.insert(credit.id.clone(), row);
    }

    for benchmark in model.benchmarks.values() {
        let Some(standard) = benchmark.standard(year) else {
            continue;
        };

        for pathway in model.pathways.for_benchmark(&benchmark.id, year) {
            let row = programs
                .get_mut(&pathway.credit)
                .with_context(|| format!("{} is not a valid credit type", pathway.credit))?;
            let coeff = (standard - pathway.carbon_intensity / pathway.eer)
                * pathway.fuel_yield
                * pathway.eer
                * 1e-6;

            let feedstock = &model.feedstocks[&pathway.feedstock];
            for (price, _) in feedstock.iter_supply() {
                let variable = VariableKey::Production {
                    fuel: pathway.fuel.clone(),
                    feedstock: pathway.feedstock.clone(),
                    price,
                };
                if coeff < 0.0 {
                    deficit_fuels.push(variable.clone());
                }
                row.set(variable.clone(), coeff);
                total.set(variable, coeff);
            }
        }
    }

    let mut rows = vec![total];
    rows.extend(programs.into_values());
    Ok((rows, deficit_fuels))
}

/// Blending: for each active requirement, a minimum- and a maximum-share row.
///
/// `target >= min x pool` becomes `min x pool - target <= 0` and `target <= max x pool`
/// becomes `target - max x pool <= 0`, both against a zero bound.
fn blend_rows(model: &Model, year: u32) -> Vec<PendingRow> {
    let mut rows = Vec::new();
    for requirement in model.blends.for_year(year) {
        let mut min_row = PendingRow::new(
            ConstraintKey::BlendMinimum {
                requirement: requirement.id.clone(),
                pool: requirement.pool.clone(),
            },
            f64::NEG_INFINITY,
            0.0,
        );
        let mut max_row = PendingRow::new(
            ConstraintKey::BlendMaximum {
                requirement: requirement.id.clone(),
                pool: requirement.pool.clone(),
            },
            f64::NEG_INFINITY,
            0.0,
        );

        for (fuel, feedstock, pathway) in iter_groups(model, year) {
            if fuel.pool != requirement.pool {
                continue;
            }

            let is_target = pathway.blend.as_ref() == Some(&requirement.id);
            let min_coeff = if is_target {
                requirement.minimum - 1.0
            } else {
                requirement.minimum
            };
            let max_coeff = if is_target {
                1.0 - requirement.maximum
            } else {
                -requirement.maximum
            };

            for (price, _) in feedstock.iter_supply() {
                let variable = production_key(fuel, feedstock, price);
                min_row.set(variable.clone(), pathway.fuel_yield * min_coeff);
                max_row.set(variable, pathway.fuel_yield * max_coeff);
            }
        }

        rows.push(min_row);
        rows.push(max_row);
    }

    rows
}

/// Co-products: `multiplier x base energy - coproduct energy = 0` for every pair.
///
/// A fuel which is itself a co-product only ever takes the co-product side, even if other
/// fuels are tied to it as a base.
fn coproduct_rows(model: &Model, year: u32) -> Vec<PendingRow> {
    let mut rows: IndexMap<(FuelID, FuelID), PendingRow> = model
        .coproducts
        .iter_pairs()
        .map(|(base, coproduct, _)| {
            let key = ConstraintKey::Coproduct {
                base: base.clone(),
                coproduct: coproduct.clone(),
            };
            (
                (base.clone(), coproduct.clone()),
                PendingRow::new(key, 0.0, 0.0),
            )
        })
        .collect();

    for (fuel, feedstock, pathway) in iter_groups(model, year) {
        let bases = model.coproducts.base_fuels_of(&fuel.id);
        if !bases.is_empty() {
            for base in bases {
                let row = rows
                    .get_mut(&(base.clone(), fuel.id.clone()))
                    .expect("Missing co-product row");
                for (price, _) in feedstock.iter_supply() {
                    row.set(production_key(fuel, feedstock, price), -pathway.fuel_yield);
                }
            }
        } else if let Some(coproducts) = model.coproducts.coproducts_of(&fuel.id) {
            for (coproduct, multiplier) in coproducts {
                let row = rows
                    .get_mut(&(fuel.id.clone(), coproduct.clone()))
                    .expect("Missing co-product row");
                for (price, _) in feedstock.iter_supply() {
                    row.set(
                        production_key(fuel, feedstock, price),
                        pathway.fuel_yield * multiplier,
                    );
                }
            }
        }
    }

    rows.into_values().collect()
}
