//! Sweep Configuration
//!
//! Parameters for a full sweep: how many documents are processed at once,
//! how fast the document API may be called, what to list, and how revision
//! text is sampled.

use serde::{Deserialize, Serialize};

use crate::calendar::MAX_WINDOW_DAYS;
use crate::source::throttle::DEFAULT_REQUESTS_PER_SECOND;
use crate::stats::WordOptions;

/// Default number of days shown by the calendar series
pub const DEFAULT_WINDOW_DAYS: usize = 100;

/// Sweep configuration parameters
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SweepConfig {
    /// Documents processed concurrently (None = number of CPUs)
    pub max_workers: Option<usize>,
    /// Calls admitted per second against the document API; 0 disables the throttle
    pub requests_per_second: u32,
    /// Listing query handed to the document source
    pub query: String,
    /// Days in the calendar series
    pub window_days: usize,
    #[serde(skip)]
    pub words: WordOptions,
}

impl Default for SweepConfig {
    fn default() -> Self {
        Self {
            max_workers: None,
            requests_per_second: DEFAULT_REQUESTS_PER_SECOND,
            query: crate::source::default_query(),
            window_days: DEFAULT_WINDOW_DAYS,
            words: WordOptions::default(),
        }
    }
}

impl SweepConfig {
    /// Effective worker count
    pub fn workers(&self) -> usize {
        self.max_workers.unwrap_or_else(num_cpus::get).max(1)
    }

    /// Validate the configuration values
    pub fn validate(&self) -> Result<(), String> {
        if self.max_workers == Some(0) {
            return Err("max-workers must be greater than 0".to_string());
        }
        if self.window_days == 0 {
            return Err("window-days must be greater than 0".to_string());
        }
        if self.window_days > MAX_WINDOW_DAYS {
            return Err(format!("window-days must be at most {}", MAX_WINDOW_DAYS));
        }
        if self.query.trim().is_empty() {
            return Err("query must not be empty".to_string());
        }
        self.words.validate()
    }
}
