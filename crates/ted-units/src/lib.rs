//! Unit conversion for the harmonization pipeline.
//!
//! Conversion factors are never derived here: they come from a pre-computed
//! table behind [`FactorLookup`], normally a [`UnitCache`] loaded from CSV.

pub mod cache;
pub mod combine;
pub mod converter;

pub use cache::{FactorLookup, UnitCache};
pub use combine::combine_units;
pub use converter::{ConversionError, UnitConverter, UnitPair};
