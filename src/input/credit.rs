//! Code for reading credit-program limits and additional credit supply from CSV files.
use crate::credit::CreditMap;
use crate::input::read_csv_optional;
use anyhow::{Context, Result};
use serde::Deserialize;
use std::path::Path;

const CREDIT_LIMITS_FILE_NAME: &str = "credit_limits.csv";
const ADDITIONAL_CREDITS_FILE_NAME: &str = "additional_credits.csv";

/// Trading limits for one credit program in one year
#[derive(Debug, Deserialize, PartialEq)]
struct CreditLimitRaw {
    year: u32,
    credit: String,
    /// Minimum net credits traded (tons); `-inf` for unbounded
    minimum: f64,
    /// Maximum net credits traded (tons); `inf` for unbounded
    maximum: f64,
}

/// Externally supplied credits for one program in one year
#[derive(Debug, Deserialize, PartialEq)]
struct AdditionalCreditRaw {
    year: u32,
    credit: String,
    /// Credit quantity (tons); positive is a bank, negative an obligation
    quantity: f64,
}

/// Read credit trading limits and attach them to `credits`.
///
/// The file is optional; programs named in it must already be referenced by a pathway.
pub fn read_credit_limits(model_dir: &Path, credits: &mut CreditMap) -> Result<()> {
    let records = read_csv_optional(&model_dir.join(CREDIT_LIMITS_FILE_NAME))?;
    read_credit_limits_iter(records.into_iter(), credits)
}

fn read_credit_limits_iter<I>(iter: I, credits: &mut CreditMap) -> Result<()>
where
    I: Iterator<Item = CreditLimitRaw>,
{
    for record in iter {
        let credit = credits
            .get_mut(record.credit.as_str())
            .with_context(|| format!("{} is not a valid credit type", record.credit))?;
        credit.add_limit(record.year, record.minimum, record.maximum);
    }

    Ok(())
}

/// Read additional credit supply and attach it to `credits`.
///
/// The file is optional; programs named in it must already be referenced by a pathway.
pub fn read_credit_supply(model_dir: &Path, credits: &mut CreditMap) -> Result<()> {
    let records = read_csv_optional(&model_dir.join(ADDITIONAL_CREDITS_FILE_NAME))?;
    read_credit_supply_iter(records.into_iter(), credits)
}

fn read_credit_supply_iter<I>(iter: I, credits: &mut CreditMap) -> Result<()>
where
    I: Iterator<Item = AdditionalCreditRaw>,
{
    for record in iter {
        let credit = credits
            .get_mut(record.credit.as_str())
            .with_context(|| format!("{} is not a valid credit type", record.credit))?;
        credit.add_supply(record.year, record.quantity);
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::credit::Credit;

    fn credits() -> CreditMap {
        CreditMap::from_iter([("LCFS".into(), Credit::new("LCFS".into()))])
    }

    #[test]
    fn test_read_credit_limits_iter() {
        let mut credits = credits();
        let records = [CreditLimitRaw {
            year: 2020,
            credit: "LCFS".into(),
            minimum: f64::NEG_INFINITY,
            maximum: 1000.0,
        }];

        read_credit_limits_iter(records.into_iter(), &mut credits).unwrap();
        let (minimum, maximum) = credits[&"LCFS".into()].limits_for(2020);
        assert!(minimum.is_infinite());
        assert_eq!(maximum, 1000.0);
    }

    #[test]
    fn test_read_credit_supply_iter_unknown_credit() {
        let mut credits = credits();
        let records = [AdditionalCreditRaw {
            year: 2020,
            credit: "RFS".into(),
            quantity: 100.0,
        }];

        assert!(read_credit_supply_iter(records.into_iter(), &mut credits).is_err());
    }
}
