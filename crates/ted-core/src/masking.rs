//! Mask weights for aggregation.
//!
//! A mask selects rows with its `where` conditions and assigns the weight
//! of the first matching `use` selector, or `other` when none matches.
//! Rows outside `where` keep weight 1. Several masks multiply.

use regex::Regex;
use ted_model::columns::{COL_PARENT_VARIABLE, COL_REFERENCE_VARIABLE, COL_VARIABLE};
use ted_model::{Condition, Entry, Mask, Result, Selector, TedError};
use tracing::debug;

/// Glob `*` matches any run of characters; everything else is literal.
fn compile_glob(pattern: &str) -> std::result::Result<Regex, regex::Error> {
    let escaped = regex::escape(pattern).replace(r"\*", ".*");
    Regex::new(&format!("^{escaped}$"))
}

#[derive(Debug, Clone)]
struct CompiledCondition {
    column: String,
    patterns: Vec<Regex>,
}

impl CompiledCondition {
    fn compile(condition: &Condition, mask: &str) -> Result<Self> {
        let patterns = condition
            .patterns
            .iter()
            .map(|pattern| {
                compile_glob(pattern).map_err(|e| TedError::InvalidMask {
                    message: format!("mask '{mask}': bad pattern '{pattern}': {e}"),
                })
            })
            .collect::<Result<Vec<_>>>()?;
        Ok(Self {
            column: condition.column.clone(),
            patterns,
        })
    }

    fn matches(&self, row: &Entry) -> bool {
        candidates(row, &self.column)
            .iter()
            .any(|value| self.patterns.iter().any(|re| re.is_match(value)))
    }
}

/// Cell texts a condition on `column` is compared against.
///
/// Variables match either as fully qualified or as relative paths.
fn candidates(row: &Entry, column: &str) -> Vec<String> {
    match column {
        COL_VARIABLE => vec![row.full_variable(), row.variable.clone()],
        COL_REFERENCE_VARIABLE => match (row.full_reference(), &row.reference_variable) {
            (Some(full), Some(relative)) => vec![full, relative.clone()],
            _ => vec![String::new()],
        },
        COL_PARENT_VARIABLE => vec![row.parent_variable.clone()],
        other => vec![row.cell(other)],
    }
}

#[derive(Debug, Clone)]
struct CompiledSelector(Vec<CompiledCondition>);

impl CompiledSelector {
    fn compile(selector: &Selector, mask: &str) -> Result<Self> {
        selector
            .conditions
            .iter()
            .map(|condition| CompiledCondition::compile(condition, mask))
            .collect::<Result<Vec<_>>>()
            .map(Self)
    }

    /// Every condition must match; an empty selector matches all rows.
    fn matches(&self, row: &Entry) -> bool {
        self.0.iter().all(|condition| condition.matches(row))
    }
}

#[derive(Debug, Clone)]
struct CompiledMask {
    mask: Mask,
    where_: CompiledSelector,
    use_: Vec<CompiledSelector>,
}

impl CompiledMask {
    fn weight(&self, row: &Entry) -> f64 {
        if !self.where_.matches(row) {
            return 1.0;
        }
        if self.use_.is_empty() {
            return self.mask.weight_at(0);
        }
        self.use_
            .iter()
            .position(|selector| selector.matches(row))
            .map_or(self.mask.other, |index| self.mask.weight_at(index))
    }
}

/// Compiled masks applied in registration order.
#[derive(Debug, Clone, Default)]
pub struct MaskEngine {
    masks: Vec<CompiledMask>,
}

impl MaskEngine {
    pub fn new(masks: &[Mask]) -> Result<Self> {
        let masks = masks
            .iter()
            .map(|mask| {
                Ok(CompiledMask {
                    where_: CompiledSelector::compile(&mask.where_, &mask.name)?,
                    use_: mask
                        .use_
                        .iter()
                        .map(|selector| CompiledSelector::compile(selector, &mask.name))
                        .collect::<Result<Vec<_>>>()?,
                    mask: mask.clone(),
                })
            })
            .collect::<Result<Vec<_>>>()?;
        Ok(Self { masks })
    }

    pub fn len(&self) -> usize {
        self.masks.len()
    }

    pub fn is_empty(&self) -> bool {
        self.masks.is_empty()
    }

    /// Weight of each row: the product of every mask's weight.
    pub fn weights(&self, rows: &[Entry]) -> Vec<f64> {
        let mut weights = vec![1.0; rows.len()];
        for compiled in &self.masks {
            for (weight, row) in weights.iter_mut().zip(rows) {
                *weight *= compiled.weight(row);
            }
            debug!(mask = %compiled.mask.name, "applied mask");
        }
        weights
    }
}
