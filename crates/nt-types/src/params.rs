//! Parameter space definitions for hyperparameter search.

use serde::{Deserialize, Serialize};

use crate::config::Configuration;
use crate::errors::{ParameterError, TunerResult};

/// Evenly spaced grid covering `[low, high]` in `step` increments.
///
/// Values are rounded to 10 decimal places so repeated-addition drift does
/// not leak into serialized configurations.
pub fn grid_points(low: f64, high: f64, step: f64) -> Vec<f64> {
    // Epsilon guards against 1.0/0.01 landing just below the integer.
    let count = ((high - low) / step + 1e-9).floor() as usize;
    (0..=count)
        .map(|i| {
            let v = low + i as f64 * step;
            (v * 1e10).round() / 1e10
        })
        .filter(|v| *v <= high)
        .collect()
}

/// Describes how a parameter may take values.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum ParameterDomain {
    /// Discrete set of admissible values.
    Grid { values: Vec<f64> },
    /// Continuous interval [low, high].
    Range { low: f64, high: f64 },
}

impl ParameterDomain {
    /// Membership test: exact for grids, interval inclusion for ranges.
    pub fn contains(&self, value: f64) -> bool {
        match self {
            Self::Grid { values } => values.iter().any(|v| *v == value),
            Self::Range { low, high } => value >= *low && value <= *high,
        }
    }

    /// Continuous relaxation of the domain. A grid relaxes to the interval
    /// spanned by its values; surrogate models only ever see this view.
    pub fn bounds(&self) -> (f64, f64) {
        match self {
            Self::Grid { values } => {
                let low = values.iter().cloned().fold(f64::INFINITY, f64::min);
                let high = values.iter().cloned().fold(f64::NEG_INFINITY, f64::max);
                (low, high)
            }
            Self::Range { low, high } => (*low, *high),
        }
    }

    /// Map a point of the continuous relaxation back into the domain:
    /// nearest grid value for grids, clamp for ranges.
    pub fn project(&self, value: f64) -> f64 {
        match self {
            Self::Grid { values } => values
                .iter()
                .cloned()
                .min_by(|a, b| {
                    (a - value)
                        .abs()
                        .partial_cmp(&(b - value).abs())
                        .unwrap_or(std::cmp::Ordering::Equal)
                })
                .unwrap_or(value),
            Self::Range { low, high } => value.clamp(*low, *high),
        }
    }
}

/// A single tunable parameter.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ParameterSpec {
    /// Hyperparameter name as it appears in the properties file
    /// (e.g. "finishTime").
    pub name: String,
    pub domain: ParameterDomain,
}

/// The full space of tunable parameters: an ordered list of specs.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ParameterSpace {
    pub parameters: Vec<ParameterSpec>,
}

impl ParameterSpace {
    pub fn new() -> Self {
        Self {
            parameters: Vec::new(),
        }
    }

    pub fn add_grid(mut self, name: impl Into<String>, values: Vec<f64>) -> Self {
        self.parameters.push(ParameterSpec {
            name: name.into(),
            domain: ParameterDomain::Grid { values },
        });
        self
    }

    /// Grid of `step` increments spanning `[low, high]`.
    pub fn add_grid_step(self, name: impl Into<String>, low: f64, high: f64, step: f64) -> Self {
        self.add_grid(name, grid_points(low, high, step))
    }

    pub fn add_range(mut self, name: impl Into<String>, low: f64, high: f64) -> Self {
        self.parameters.push(ParameterSpec {
            name: name.into(),
            domain: ParameterDomain::Range { low, high },
        });
        self
    }

    /// Iterate (name, domain) pairs in declaration order.
    pub fn domains(&self) -> impl Iterator<Item = (&str, &ParameterDomain)> {
        self.parameters.iter().map(|p| (p.name.as_str(), &p.domain))
    }

    pub fn spec(&self, name: &str) -> Option<&ParameterSpec> {
        self.parameters.iter().find(|p| p.name == name)
    }

    pub fn len(&self) -> usize {
        self.parameters.len()
    }

    pub fn is_empty(&self) -> bool {
        self.parameters.is_empty()
    }

    /// Structural invariants: unique names, non-empty grids, ordered ranges.
    pub fn check(&self) -> TunerResult<()> {
        for (i, param) in self.parameters.iter().enumerate() {
            if self.parameters[..i].iter().any(|p| p.name == param.name) {
                return Err(ParameterError::DuplicateName {
                    name: param.name.clone(),
                }
                .into());
            }
            match &param.domain {
                ParameterDomain::Grid { values } if values.is_empty() => {
                    return Err(ParameterError::EmptyGrid {
                        name: param.name.clone(),
                    }
                    .into());
                }
                ParameterDomain::Range { low, high } if low > high => {
                    return Err(ParameterError::InvertedRange {
                        name: param.name.clone(),
                        low: *low,
                        high: *high,
                    }
                    .into());
                }
                _ => {}
            }
        }
        Ok(())
    }

    /// Validate a configuration against this space: every declared parameter
    /// present and in-domain, no extras. No side effects.
    pub fn validate(&self, config: &Configuration) -> TunerResult<()> {
        for param in &self.parameters {
            let value = config.get(&param.name).ok_or_else(|| ParameterError::MissingParameter {
                name: param.name.clone(),
            })?;
            if !param.domain.contains(value) {
                return Err(ParameterError::OutOfDomain {
                    name: param.name.clone(),
                    value,
                }
                .into());
            }
        }
        for (name, _) in config.iter() {
            if self.spec(name).is_none() {
                return Err(ParameterError::UnknownParameter {
                    name: name.to_string(),
                }
                .into());
            }
        }
        Ok(())
    }
}

impl Default for ParameterSpace {
    fn default() -> Self {
        Self::new()
    }
}
