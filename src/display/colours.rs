//! Core colour management for CLI output
//!
//! Provides colour support with terminal compatibility, NO_COLOR compliance,
//! and graceful degradation for non-colour terminals.

use colored::{ColoredString, Colorize};
use super::config::{ColourConfig, ColourPalette};

/// Manages colour output for the CLI application
#[derive(Debug, Clone)]
pub struct ColourManager {
    config: ColourConfig,
    palette: ColourPalette,
}

impl ColourManager {
    /// Create a ColourManager with a specific configuration
    pub fn with_config(config: ColourConfig) -> Self {
        let palette = config.get_palette();
        Self { config, palette }
    }

    /// Create a ColourManager with explicit colour control
    pub fn with_colours(enabled: bool) -> Self {
        let mut config = ColourConfig::default();
        config.set_enabled(enabled);
        Self::with_config(config)
    }

    /// Create a ColourManager from the --no-color flag and optional configuration
    pub fn from_args_and_config(no_color_flag: bool, config: Option<ColourConfig>) -> Self {
        let mut final_config = config.unwrap_or_default();

        // CLI --no-color flag overrides everything
        if no_color_flag {
            final_config.set_enabled(false);
        }

        Self::with_config(final_config)
    }

    /// Check if colours are enabled
    pub fn colours_enabled(&self) -> bool {
        self.config.should_use_colours()
    }

    pub fn error(&self, text: &str) -> ColoredString {
        self.paint(text, &self.palette.error)
    }

    pub fn warning(&self, text: &str) -> ColoredString {
        self.paint(text, &self.palette.warning)
    }

    pub fn info(&self, text: &str) -> ColoredString {
        self.paint(text, &self.palette.info)
    }

    pub fn success(&self, text: &str) -> ColoredString {
        self.paint(text, &self.palette.success)
    }

    pub fn highlight(&self, text: &str) -> ColoredString {
        self.paint(text, &self.palette.highlight)
    }

    /// Words added, e.g. `+120`
    pub fn added(&self, words: u64) -> ColoredString {
        self.paint(&format!("+{}", words), &self.palette.added)
    }

    /// Words removed, e.g. `-35`
    pub fn removed(&self, words: u64) -> ColoredString {
        self.paint(&format!("-{}", words), &self.palette.removed)
    }

    /// A signed word delta, coloured by its sign
    pub fn delta(&self, delta: i64) -> ColoredString {
        if delta < 0 {
            self.removed(delta.unsigned_abs())
        } else {
            self.added(delta as u64)
        }
    }

    fn paint(&self, text: &str, color_name: &str) -> ColoredString {
        if !self.colours_enabled() {
            return text.normal();
        }
        match ColourPalette::parse_color(color_name) {
            Some(color) => text.color(color),
            None => text.normal(),
        }
    }
}

impl Default for ColourManager {
    fn default() -> Self {
        Self::with_config(ColourConfig::default())
    }
}
