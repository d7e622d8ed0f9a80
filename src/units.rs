//! Unit normalization for wrk measurements
//!
//! wrk prints values with whatever suffix keeps them short (2.53k, 693.56KB,
//! 1.71ms). Everything downstream works on one canonical scale per quantity
//! class: milliseconds for time, megabytes for data, raw counts for
//! throughput, 0-100 for percentages.

use std::str::FromStr;
use thiserror::Error;

/// Errors for unit normalization
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum UnitError {
    #[error("unrecognized unit: {token:?}")]
    UnrecognizedUnit { token: String },
}

/// A unit suffix as printed by wrk or dstat
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Unit {
    /// `%` - already on the 0-100 axis
    Percent,
    /// `k` - thousands of a count
    Kilo,
    /// `M` - millions of a count
    Mega,
    /// `GB`
    Gigabytes,
    /// `MB` - canonical data axis
    Megabytes,
    /// `KB`
    Kilobytes,
    /// `B`
    Bytes,
    /// `s`
    Seconds,
    /// `ms` - canonical time axis
    Milliseconds,
    /// `us`
    Microseconds,
}

impl Unit {
    /// Multiplier that rescales a value onto the canonical axis for its
    /// quantity class.
    pub fn multiplier(self) -> f64 {
        match self {
            Unit::Percent => 1.0,
            Unit::Kilo => 1e3,
            Unit::Mega => 1e6,
            Unit::Gigabytes => 1e3,
            Unit::Megabytes => 1.0,
            Unit::Kilobytes => 1e-3,
            Unit::Bytes => 1e-6,
            Unit::Seconds => 1e3,
            Unit::Milliseconds => 1.0,
            Unit::Microseconds => 1e-3,
        }
    }
}

impl FromStr for Unit {
    type Err = UnitError;

    fn from_str(token: &str) -> Result<Self, Self::Err> {
        match token {
            "%" => Ok(Unit::Percent),
            "k" => Ok(Unit::Kilo),
            "M" => Ok(Unit::Mega),
            "GB" => Ok(Unit::Gigabytes),
            "MB" => Ok(Unit::Megabytes),
            "KB" => Ok(Unit::Kilobytes),
            "B" => Ok(Unit::Bytes),
            "s" => Ok(Unit::Seconds),
            "ms" => Ok(Unit::Milliseconds),
            "us" => Ok(Unit::Microseconds),
            _ => Err(UnitError::UnrecognizedUnit {
                token: token.to_string(),
            }),
        }
    }
}

/// Rescale a numeric literal onto its canonical axis.
///
/// With no unit the value is returned unchanged. An unknown unit token is
/// fatal for the enclosing parse, never silently defaulted.
pub fn normalize(value: f64, unit: Option<&str>) -> Result<f64, UnitError> {
    match unit {
        None => Ok(value),
        Some(token) => Ok(value * token.parse::<Unit>()?.multiplier()),
    }
}

/// A numeric literal plus optional unit suffix, as read from text before
/// normalization.
#[derive(Debug, Clone, PartialEq)]
pub struct Measurement {
    pub value: f64,
    pub unit: Option<String>,
}

impl Measurement {
    pub fn new(value: f64, unit: Option<String>) -> Self {
        Self { value, unit }
    }

    /// The value rescaled onto its canonical axis.
    pub fn normalized(&self) -> Result<f64, UnitError> {
        normalize(self.value, self.unit.as_deref())
    }

    /// True when the suffix is the percent sign.
    pub fn is_percent(&self) -> bool {
        self.unit.as_deref() == Some("%")
    }
}
