//! Carbon-intensity benchmarks.
//!
//! A benchmark defines the allowed carbon intensity of fuel energy for each year. Pathways
//! assigned to the benchmark generate credits when they beat the standard and deficits when
//! they miss it. Standards may be left undefined for a year, in which case the standard of
//! the nearest prior defined year applies.
use crate::id::define_id_type;
use indexmap::IndexMap;
use std::collections::BTreeMap;

define_id_type! {BenchmarkID}

/// A map of [`Benchmark`]s, keyed by benchmark ID
pub type BenchmarkMap = IndexMap<BenchmarkID, Benchmark>;

/// A yearly allowed-carbon-intensity standard
#[derive(PartialEq, Debug, Clone)]
pub struct Benchmark {
    /// A unique identifier for the benchmark (e.g. "diesel_lcfs")
    pub id: BenchmarkID,
    /// Allowed carbon intensity per year (gCO2e/MJ); `None` marks a year explicitly unset
    pub standards: BTreeMap<u32, Option<f64>>,
}

impl Benchmark {
    /// Create a new [`Benchmark`] with no standards
    pub fn new(id: BenchmarkID) -> Self {
        Self {
            id,
            standards: BTreeMap::new(),
        }
    }

    /// Record the allowed carbon intensity for a year
    pub fn add_standard(&mut self, year: u32, standard: Option<f64>) {
        self.standards.insert(year, standard);
    }

    /// The standard in force for `year`, taken from the nearest prior defined year.
    ///
    /// Returns `None` when the benchmark has no standard on or before `year`, or when the
    /// resolved year is explicitly unset.
    pub fn standard(&self, year: u32) -> Option<f64> {
        self.standards
            .range(..=year)
            .next_back()
            .and_then(|(_, standard)| *standard)
    }
}
