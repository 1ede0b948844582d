//! Pre-computed conversion factors loaded from CSV.

use std::collections::BTreeMap;
use std::fmt;
use std::path::Path;

use csv::ReaderBuilder;
use serde::Deserialize;
use ted_model::{Result, TedError};
use tracing::debug;

/// Source of conversion factors.
///
/// Implementations only answer exact lookups; the flow-type fallback is the
/// converter's job.
pub trait FactorLookup: Send + Sync + fmt::Debug {
    fn factor(&self, from: &str, to: &str, flow_type: Option<&str>) -> Option<f64>;
}

type FactorKey = (String, String, Option<String>);

#[derive(Debug, Deserialize)]
struct FactorRecord {
    from: String,
    to: String,
    #[serde(default)]
    ft: Option<String>,
    factor: f64,
}

/// In-memory factor table keyed by `(from, to, flow type)`.
#[derive(Debug, Clone, Default)]
pub struct UnitCache {
    factors: BTreeMap<FactorKey, f64>,
}

impl UnitCache {
    pub fn new() -> Self {
        Self::default()
    }

    /// Loads a `from,to,ft,factor` CSV. An empty `ft` means flow-agnostic.
    pub fn load(path: &Path) -> Result<Self> {
        let mut reader = ReaderBuilder::new()
            .has_headers(true)
            .trim(csv::Trim::All)
            .from_path(path)
            .map_err(|e| TedError::parse(path, e))?;

        let mut cache = Self::new();
        for record in reader.deserialize::<FactorRecord>() {
            let record = record.map_err(|e| TedError::parse(path, e))?;
            let flow_type = record.ft.filter(|ft| !ft.is_empty());
            cache.insert(record.from, record.to, flow_type, record.factor);
        }
        debug!(path = %path.display(), factors = cache.len(), "loaded unit cache");
        Ok(cache)
    }

    pub fn insert(
        &mut self,
        from: impl Into<String>,
        to: impl Into<String>,
        flow_type: Option<String>,
        factor: f64,
    ) {
        self.factors
            .insert((from.into(), to.into(), flow_type), factor);
    }

    /// Builder form of [`UnitCache::insert`].
    pub fn with(mut self, from: &str, to: &str, flow_type: Option<&str>, factor: f64) -> Self {
        self.insert(from, to, flow_type.map(str::to_string), factor);
        self
    }

    pub fn len(&self) -> usize {
        self.factors.len()
    }

    pub fn is_empty(&self) -> bool {
        self.factors.is_empty()
    }
}

impl FactorLookup for UnitCache {
    fn factor(&self, from: &str, to: &str, flow_type: Option<&str>) -> Option<f64> {
        let key = (from.to_string(), to.to_string(), flow_type.map(str::to_string));
        self.factors.get(&key).copied()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn loads_nullable_flow_type() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "from,to,ft,factor").unwrap();
        writeln!(file, "MWh,GJ,,3.6").unwrap();
        writeln!(file, "t,MWh,h2,33.33").unwrap();
        file.flush().unwrap();

        let cache = UnitCache::load(file.path()).unwrap();
        assert_eq!(cache.len(), 2);
        assert_eq!(cache.factor("MWh", "GJ", None), Some(3.6));
        assert_eq!(cache.factor("t", "MWh", Some("h2")), Some(33.33));
        assert_eq!(cache.factor("t", "MWh", None), None);
    }

    #[test]
    fn bad_factor_is_parse_error() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "from,to,ft,factor").unwrap();
        writeln!(file, "MWh,GJ,,lots").unwrap();
        file.flush().unwrap();

        let err = UnitCache::load(file.path()).unwrap_err();
        assert!(matches!(err, TedError::Parse { .. }));
    }
}
