//! Helpers for resolving year- and price-keyed series.
//!
//! Most model inputs are sparse in time: demand, benchmarks and production pathways are defined
//! for a handful of years, and lookups for any other year resolve to the nearest defined one.
use std::collections::BTreeMap;

/// Find the value among `candidates` which is closest to `target`.
///
/// Distances are compared on absolute difference; when two candidates are equidistant, the
/// smaller one wins. Returns `None` if `candidates` is empty.
pub fn closest_value(target: i64, candidates: impl IntoIterator<Item = i64>) -> Option<i64> {
    candidates.into_iter().min_by_key(|c| {
        // Tie-break on the candidate itself so equidistant lookups resolve low
        ((c - target).abs(), *c)
    })
}

/// Find the year among `years` which is closest to `target`
pub fn closest_year(target: u32, years: impl IntoIterator<Item = u32>) -> Option<u32> {
    closest_value(i64::from(target), years.into_iter().map(i64::from))
        .map(|year| u32::try_from(year).expect("Year out of range"))
}

/// Look up the entry of a year-keyed series closest to `year`
pub fn closest_entry<T>(series: &BTreeMap<u32, T>, year: u32) -> Option<&T> {
    let year = closest_year(year, series.keys().copied())?;
    Some(&series[&year])
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    #[rstest]
    #[case(15, &[10, 20, 30], Some(10))] // equidistant resolves low
    #[case(19, &[10, 20, 30], Some(20))]
    #[case(100, &[10, 20, 30], Some(30))]
    #[case(-5, &[10, 20, 30], Some(10))]
    #[case(20, &[10, 20, 30], Some(20))]
    #[case(0, &[], None)]
    fn test_closest_value(
        #[case] target: i64,
        #[case] candidates: &[i64],
        #[case] expected: Option<i64>,
    ) {
        assert_eq!(closest_value(target, candidates.iter().copied()), expected);
    }

    #[test]
    fn test_closest_entry() {
        let series = BTreeMap::from_iter([(2020, "a"), (2025, "b")]);
        assert_eq!(closest_entry(&series, 2019), Some(&"a"));
        assert_eq!(closest_entry(&series, 2024), Some(&"b"));
        assert_eq!(closest_entry(&series, 2100), Some(&"b"));
        assert_eq!(closest_entry(&BTreeMap::<u32, u32>::new(), 2020), None);
    }
}
