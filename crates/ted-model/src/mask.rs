//! Mask definitions used to weight rows during aggregation.
//!
//! Matching lives in the pipeline crate; this module only holds the
//! validated definition.

use serde::{Deserialize, Serialize};

use crate::error::{Result, TedError};

/// Column must match one of the patterns. `*` inside a pattern is a glob.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Condition {
    pub column: String,
    pub patterns: Vec<String>,
}

impl Condition {
    pub fn new(column: impl Into<String>, patterns: Vec<String>) -> Self {
        Self {
            column: column.into(),
            patterns,
        }
    }

    pub fn single(column: impl Into<String>, pattern: impl Into<String>) -> Self {
        Self::new(column, vec![pattern.into()])
    }
}

/// Conjunction of conditions. An empty selector matches every row.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Selector {
    pub conditions: Vec<Condition>,
}

impl Selector {
    pub fn new(conditions: Vec<Condition>) -> Self {
        Self { conditions }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum MaskWeight {
    Single(f64),
    List(Vec<f64>),
}

impl Default for MaskWeight {
    fn default() -> Self {
        MaskWeight::Single(1.0)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Mask {
    pub name: String,
    pub where_: Selector,
    pub use_: Vec<Selector>,
    pub weight: MaskWeight,
    /// Weight for rows matched by `where_` but by no `use_` selector.
    pub other: f64,
}

impl Mask {
    /// Builds a mask, checking that a weight list lines up with `use_`.
    pub fn new(
        name: impl Into<String>,
        where_: Selector,
        use_: Vec<Selector>,
        weight: MaskWeight,
        other: Option<f64>,
    ) -> Result<Self> {
        let name = name.into();
        if let MaskWeight::List(weights) = &weight
            && weights.len() != use_.len()
        {
            return Err(TedError::InvalidMask {
                message: format!(
                    "mask '{name}' has {} use conditions but {} weights",
                    use_.len(),
                    weights.len()
                ),
            });
        }
        Ok(Self {
            name,
            where_,
            use_,
            weight,
            other: other.unwrap_or(f64::NAN),
        })
    }

    /// Weight assigned by the `index`-th use selector (or the scalar weight).
    pub fn weight_at(&self, index: usize) -> f64 {
        match &self.weight {
            MaskWeight::Single(weight) => *weight,
            MaskWeight::List(weights) => weights.get(index).copied().unwrap_or(f64::NAN),
        }
    }
}
