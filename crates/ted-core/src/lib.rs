//! Harmonization pipeline: normalize, select and aggregate a dataset.
//!
//! [`Dataset::load`] gathers the rows of one parent variable from every
//! selected database. [`Dataset::select`] normalizes units and references,
//! expands wildcards, applies variable mappings and returns a presentation
//! table; [`Dataset::aggregate`] additionally collapses component and source
//! fields with mask weights.

pub mod aggregate;
pub mod cleanup;
pub mod dataset;
pub mod expand;
pub mod grouping;
pub mod mappings;
pub mod masking;
pub mod normalize;
pub mod options;
pub mod output;
pub mod units;

pub use aggregate::{aggregate, resolve_agg_fields};
pub use cleanup::cleanup;
pub use dataset::Dataset;
pub use expand::{FieldExpander, interpolate};
pub use mappings::apply_mappings;
pub use masking::MaskEngine;
pub use normalize::normalize;
pub use options::{AggregateOptions, DatasetOptions, SelectOptions, UnitOverrides};
pub use output::{Cell, OutputTable};
pub use units::UnitTargets;
