//! Daily word-count statistics for cloud documents
//!
//! A sweep lists documents at a [`source::DocumentSource`], samples the word
//! count of every revision and folds the deltas into per-day totals kept in
//! a [`store::StatStore`]. [`service::StatService`] answers the queries the
//! CLI and other front ends need.

pub mod app;
pub mod calendar;
pub mod cli;
pub mod config;
pub mod display;
pub mod logging;
pub mod service;
pub mod source;
pub mod stats;
pub mod store;
pub mod sweep;
