//! Code for reading feedstock supply curves from CSV files.
use crate::feedstock::{Feedstock, FeedstockMap};
use crate::input::read_csv;
use anyhow::{Result, ensure};
use serde::Deserialize;
use std::path::Path;

const FEEDSTOCKS_FILE_NAME: &str = "feedstocks.csv";

/// A single supply-curve point for a feedstock
#[derive(Debug, Deserialize, PartialEq)]
struct FeedstockRaw {
    feedstock: String,
    /// Price at which the quantity becomes available ($/unit)
    price: i64,
    /// Quantity available at this price
    quantity: f64,
}

/// Read feedstock supply curves from the specified model directory.
///
/// # Arguments
///
/// * `model_dir` - Folder containing scenario configuration files
///
/// # Returns
///
/// A map of feedstocks with their supply curves, or an error.
pub fn read_feedstocks(model_dir: &Path) -> Result<FeedstockMap> {
    let records = read_csv(&model_dir.join(FEEDSTOCKS_FILE_NAME))?;
    read_feedstocks_iter(records.into_iter())
}

fn read_feedstocks_iter<I>(iter: I) -> Result<FeedstockMap>
where
    I: Iterator<Item = FeedstockRaw>,
{
    let mut feedstocks = FeedstockMap::new();
    for record in iter {
        ensure!(
            record.quantity >= 0.0,
            "Supply quantity for feedstock {} at price {} must be non-negative",
            record.feedstock,
            record.price
        );

        feedstocks
            .entry(record.feedstock.as_str().into())
            .or_insert_with(|| Feedstock::new(record.feedstock.as_str().into()))
            .add_supply(record.price, record.quantity);
    }

    Ok(feedstocks)
}

#[cfg(test)]
mod tests {
    use super::*;
    use float_cmp::assert_approx_eq;

    fn record(feedstock: &str, price: i64, quantity: f64) -> FeedstockRaw {
        FeedstockRaw {
            feedstock: feedstock.into(),
            price,
            quantity,
        }
    }

    #[test]
    fn test_read_feedstocks_iter() {
        let records = [
            record("corn", 10, 100.0),
            record("corn", 20, 50.0),
            record("tallow", 30, 25.0),
        ];

        let feedstocks = read_feedstocks_iter(records.into_iter()).unwrap();
        assert_eq!(feedstocks.len(), 2);
        assert_approx_eq!(f64, feedstocks[&"corn".into()].upper_bound(), 150.0);
        assert_approx_eq!(f64, feedstocks[&"tallow".into()].upper_bound(), 25.0);
    }

    #[test]
    fn test_read_feedstocks_iter_negative_quantity() {
        let records = [record("corn", 10, -1.0)];
        assert!(read_feedstocks_iter(records.into_iter()).is_err());
    }
}
