//! Code for scenario models.
//!
//! A [`Model`] owns every domain entity for one scenario. Loading a new scenario constructs a
//! new `Model` rather than mutating shared state, so scenarios can never leak data into one
//! another. The equilibrium builder only ever reads from the model.
use crate::benchmark::BenchmarkMap;
use crate::blend::BlendMap;
use crate::coproduct::CoproductMap;
use crate::credit::CreditMap;
use crate::feedstock::FeedstockMap;
use crate::fuel::{FuelMap, FuelPoolID, FuelPoolMap};
use crate::id::IDTable;
use crate::input::load_model;
use crate::pathway::{Pathway, PathwayMap};
use anyhow::{Context, Result, bail, ensure};
use std::path::Path;

pub mod parameters;
pub use parameters::ScenarioParameters;

/// The complete domain model for one scenario
pub struct Model {
    /// Run years and tuning parameters from `scenario.toml`
    pub parameters: ScenarioParameters,
    /// Every feedstock, with its supply curve
    pub feedstocks: FeedstockMap,
    /// Every fuel produced by at least one pathway
    pub fuels: FuelMap,
    /// Every demand pool
    pub pools: FuelPoolMap,
    /// Every production pathway
    pub pathways: PathwayMap,
    /// Every credit program referenced by a pathway
    pub credits: CreditMap,
    /// Carbon-intensity benchmarks
    pub benchmarks: BenchmarkMap,
    /// Blend requirements, by year
    pub blends: BlendMap,
    /// Co-product ratio rules
    pub coproducts: CoproductMap,
}

impl Model {
    /// Read a model from the specified directory.
    ///
    /// # Arguments
    ///
    /// * `model_dir` - Folder containing scenario configuration files
    pub fn from_path<P: AsRef<Path>>(model_dir: P) -> Result<Model> {
        load_model(model_dir.as_ref())
    }

    /// Iterate over the years the scenario should be solved for, in order
    pub fn iter_years(&self) -> impl Iterator<Item = u32> + '_ {
        self.parameters.years.iter().copied()
    }

    /// The pathways serving `pool` when resolved for `year`
    pub fn pathways_for_pool(&self, pool: &FuelPoolID, year: u32) -> Vec<&Pathway> {
        self.pathways
            .iter_pairs()
            .filter_map(|(fuel, feedstock)| {
                let pathway = self.pathways.resolve(feedstock, fuel, Some(year))?;
                (self.fuels.get(fuel)?.pool == *pool).then_some(pathway)
            })
            .collect()
    }

    /// Check cross-entity references are all resolvable.
    ///
    /// The loader guarantees feedstocks, pools and credits referenced by pathways exist;
    /// benchmark and blend names are only resolvable once their own tables have loaded, so
    /// they are checked here. Dangling references are configuration errors, not conditions
    /// to skip over.
    pub fn validate(&self) -> Result<()> {
        for pathway in self.pathways.iter_all() {
            if let Some(benchmark) = &pathway.benchmark {
                self.benchmarks.get_entry(benchmark).with_context(|| {
                    format!(
                        "Pathway {} ({}) refers to an undefined benchmark",
                        pathway.fuel, pathway.feedstock
                    )
                })?;
            }

            if let Some(blend) = &pathway.blend {
                ensure!(
                    self.blends.contains(blend),
                    "Pathway {} ({}) refers to undefined blend requirement {}",
                    pathway.fuel,
                    pathway.feedstock,
                    blend
                );
            }
        }

        for (_, quantity) in self
            .feedstocks
            .values()
            .flat_map(|feedstock| feedstock.iter_supply())
        {
            ensure!(
                quantity >= 0.0,
                "Feedstock supply quantities must be non-negative"
            );
        }

        Ok(())
    }

    /// Check that demand in each pool can be met for `year` with the feedstock available.
    ///
    /// This catches structurally infeasible scenarios before the solver sees them.
    pub fn verify(&self, year: u32) -> Result<()> {
        for pool in self.pools.values() {
            let Some(demand) = pool.demand(year) else {
                continue;
            };

            let valid_paths = self.pathways_for_pool(&pool.id, year);
            if valid_paths.is_empty() {
                bail!(
                    "There are no valid production pathways to satisfy demand for the {} fuel pool",
                    pool.id
                );
            }

            let supply: f64 = valid_paths
                .iter()
                .map(|pathway| {
                    let feedstock = &self.feedstocks[&pathway.feedstock];
                    feedstock.upper_bound() * pathway.fuel_yield
                })
                .sum();

            ensure!(
                supply >= demand,
                "While valid production pathways exist for the {} fuel pool, only {supply} MJ \
                 can be supplied compared to {demand} MJ needed",
                pool.id
            );
        }

        Ok(())
    }
}
