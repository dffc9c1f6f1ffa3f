//! Exploratory analysis of Spanish electricity prices.
//!
//! This crate implements a single-pass batch pipeline which fuses hourly
//! generation-mix data with per-city weather observations into one analysis
//! table, then fits three regression models (Lasso, a CV-pruned decision tree
//! and a bagged tree ensemble) to rank the drivers of the hourly spot price.
pub mod analysis;
pub mod cli;
pub mod error;
pub mod input;
pub mod log;
pub mod model;
pub mod output;
pub mod pipeline;
pub mod settings;
pub mod table;

#[cfg(test)]
pub(crate) mod fixture;
