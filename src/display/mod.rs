//! Display module for colour management and terminal rendering
//!
//! This module provides colour support and the text views printed by the
//! CLI while maintaining terminal compatibility and accessibility.

pub mod colours;
pub mod config;
pub mod table;
pub mod views;

pub use colours::*;
pub use config::*;
pub use table::*;
