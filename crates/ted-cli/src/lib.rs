//! Command line front end for the techno-economic data pipeline.

pub mod cli;
pub mod commands;
pub mod logging;
pub mod summary;
