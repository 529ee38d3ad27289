use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use thiserror::Error;
use utoipa::ToSchema;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum PriceError {
    #[error("'{0}' is not a whole number")]
    NotNumeric(String),
    #[error("price cannot be negative")]
    Negative,
}

/// A price in whole rupiah.
///
/// Product prices are stored as text; this is the one place that text is
/// turned into a number.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize, ToSchema)]
#[serde(transparent)]
pub struct Price(i64);

impl Price {
    pub fn amount(self) -> i64 {
        self.0
    }

    /// `price * quantity`, or `None` on overflow.
    pub fn line_total(self, quantity: i64) -> Option<i64> {
        self.0.checked_mul(quantity)
    }
}

impl FromStr for Price {
    type Err = PriceError;

    fn from_str(raw: &str) -> Result<Self, Self::Err> {
        let value: i64 = raw
            .trim()
            .parse()
            .map_err(|_| PriceError::NotNumeric(raw.to_string()))?;
        if value < 0 {
            return Err(PriceError::Negative);
        }
        Ok(Price(value))
    }
}

impl fmt::Display for Price {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}
