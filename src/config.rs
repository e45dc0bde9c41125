use std::fmt;
use std::str::FromStr;

use bon::Builder;

use crate::{
    error::GraspError,
    math::{arithmetic_mean, median, minimum},
};

/// How the p-values of observations sharing a locus are reduced to one value
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Mechanism {
    #[default]
    Median,
    Mean,
    Min,
}

impl Mechanism {
    /// Reduce a group of p-values
    ///
    /// The slice may be reordered. Every mechanism returns `NaN` for an empty slice.
    pub fn reduce(&self, pvalues: &mut [f64]) -> f64 {
        match self {
            Mechanism::Median => median(pvalues),
            Mechanism::Mean => arithmetic_mean(pvalues),
            Mechanism::Min => minimum(pvalues),
        }
    }
}

impl FromStr for Mechanism {
    type Err = GraspError;

    fn from_str(name: &str) -> Result<Self, Self::Err> {
        match name.trim().to_ascii_lowercase().as_str() {
            "median" => Ok(Mechanism::Median),
            "mean" => Ok(Mechanism::Mean),
            "min" => Ok(Mechanism::Min),
            _ => Err(GraspError::InvalidMechanism(name.to_string())),
        }
    }
}

impl fmt::Display for Mechanism {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Mechanism::Median => "median",
            Mechanism::Mean => "mean",
            Mechanism::Min => "min",
        };
        f.write_str(name)
    }
}

/// What to do with records that fail validation
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum MalformedPolicy {
    /// Fail the whole call on the first malformed record
    #[default]
    Abort,
    /// Drop malformed records and count them
    Skip,
}

/// Settings for a single collapse call
#[derive(Builder, Debug, Clone, Copy, Default, PartialEq)]
pub struct CollapseConfig {
    #[builder(default)]
    pub mechanism: Mechanism,
    /// Keep only loci whose reduced p-value is at most this value
    pub threshold: Option<f64>,
    #[builder(default)]
    pub policy: MalformedPolicy,
}

impl CollapseConfig {
    pub fn with_mechanism(mechanism: Mechanism) -> Self {
        Self {
            mechanism,
            ..Default::default()
        }
    }
}
