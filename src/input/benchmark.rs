//! Code for reading carbon-intensity benchmarks from CSV files.
use crate::benchmark::{Benchmark, BenchmarkMap};
use crate::input::read_csv_optional;
use anyhow::Result;
use serde::Deserialize;
use std::path::Path;

const BENCHMARKS_FILE_NAME: &str = "benchmarks.csv";

/// The allowed carbon intensity for one benchmark in one year
#[derive(Debug, Deserialize, PartialEq)]
struct BenchmarkRaw {
    year: u32,
    benchmark: String,
    /// Allowed carbon intensity (gCO2e/MJ); blank marks the year explicitly unset
    standard: Option<f64>,
}

/// Read carbon-intensity benchmarks from the specified model directory.
///
/// The file is optional; without it no credit/CI coefficients are generated.
pub fn read_benchmarks(model_dir: &Path) -> Result<BenchmarkMap> {
    let records = read_csv_optional(&model_dir.join(BENCHMARKS_FILE_NAME))?;
    Ok(read_benchmarks_iter(records.into_iter()))
}

fn read_benchmarks_iter<I>(iter: I) -> BenchmarkMap
where
    I: Iterator<Item = BenchmarkRaw>,
{
    let mut benchmarks = BenchmarkMap::new();
    for record in iter {
        benchmarks
            .entry(record.benchmark.as_str().into())
            .or_insert_with(|| Benchmark::new(record.benchmark.as_str().into()))
            .add_standard(record.year, record.standard);
    }

    benchmarks
}

#[cfg(test)]
mod tests {
    use super::*;
    use float_cmp::assert_approx_eq;

    #[test]
    fn test_read_benchmarks_iter() {
        let records = [
            BenchmarkRaw {
                year: 2020,
                benchmark: "gasoline_lcfs".into(),
                standard: Some(95.0),
            },
            BenchmarkRaw {
                year: 2021,
                benchmark: "gasoline_lcfs".into(),
                standard: None,
            },
        ];

        let benchmarks = read_benchmarks_iter(records.into_iter());
        assert_eq!(benchmarks.len(), 1);
        let benchmark = &benchmarks[&"gasoline_lcfs".into()];
        assert_approx_eq!(f64, benchmark.standard(2020).unwrap(), 95.0);
        assert!(benchmark.standard(2021).is_none());
    }
}
