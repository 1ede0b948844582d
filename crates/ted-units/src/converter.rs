use std::collections::BTreeMap;
use std::sync::Arc;

use tracing::warn;

use crate::cache::{FactorLookup, UnitCache};

/// A conversion factor could not be resolved. Callers recover with NaN.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum ConversionError {
    #[error(
        "no conversion factor from '{from}' to '{to}' (flow type: {})",
        .flow_type.as_deref().unwrap_or("none")
    )]
    NotFound {
        from: String,
        to: String,
        flow_type: Option<String>,
    },
}

/// One row's unit conversion request.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord)]
pub struct UnitPair {
    pub from: Option<String>,
    pub to: Option<String>,
    pub flow_type: Option<String>,
}

impl UnitPair {
    pub fn new(from: Option<&str>, to: Option<&str>, flow_type: Option<&str>) -> Self {
        Self {
            from: from.map(str::to_string),
            to: to.map(str::to_string),
            flow_type: flow_type.map(str::to_string),
        }
    }
}

/// Resolves conversion factors between unit strings.
///
/// Cloning is cheap; the factor table is shared.
#[derive(Debug, Clone)]
pub struct UnitConverter {
    lookup: Arc<dyn FactorLookup>,
}

impl UnitConverter {
    pub fn new(lookup: Arc<dyn FactorLookup>) -> Self {
        Self { lookup }
    }

    pub fn from_cache(cache: UnitCache) -> Self {
        Self::new(Arc::new(cache))
    }

    /// Converter that only knows the identity conversion.
    pub fn identity() -> Self {
        Self::from_cache(UnitCache::new())
    }

    /// Factor that turns a quantity in `from` into one in `to`.
    ///
    /// Unset or empty units yield NaN. Equal units yield 1.0 without a
    /// lookup. A flow-typed lookup falls back to the flow-agnostic factor.
    pub fn convert(
        &self,
        from: Option<&str>,
        to: Option<&str>,
        flow_type: Option<&str>,
    ) -> Result<f64, ConversionError> {
        let (Some(from), Some(to)) = (non_empty(from), non_empty(to)) else {
            return Ok(f64::NAN);
        };
        if from == to {
            return Ok(1.0);
        }
        let flow_type = non_empty(flow_type);
        let found = match flow_type {
            Some(ft) => self
                .lookup
                .factor(from, to, Some(ft))
                .or_else(|| self.lookup.factor(from, to, None)),
            None => self.lookup.factor(from, to, None),
        };
        found.ok_or_else(|| ConversionError::NotFound {
            from: from.to_string(),
            to: to.to_string(),
            flow_type: flow_type.map(str::to_string),
        })
    }

    /// Like [`UnitConverter::convert`], warning and returning NaN on failure.
    pub fn factor(&self, from: Option<&str>, to: Option<&str>, flow_type: Option<&str>) -> f64 {
        self.convert(from, to, flow_type).unwrap_or_else(|err| {
            warn!(%err, "unit conversion failed");
            f64::NAN
        })
    }

    /// One factor per row. Each distinct unresolved triple warns once.
    pub fn convert_rows(&self, pairs: &[UnitPair]) -> Vec<f64> {
        let mut memo: BTreeMap<&UnitPair, f64> = BTreeMap::new();
        pairs
            .iter()
            .map(|pair| {
                *memo.entry(pair).or_insert_with(|| {
                    self.factor(
                        pair.from.as_deref(),
                        pair.to.as_deref(),
                        pair.flow_type.as_deref(),
                    )
                })
            })
            .collect()
    }
}

fn non_empty(unit: Option<&str>) -> Option<&str> {
    unit.map(str::trim).filter(|unit| !unit.is_empty())
}
