//! Colour configuration and themes
//!
//! Read from the `[display]` config section (`color`, `theme`) and the
//! `NO_COLOR` environment variable.

use colored::Color;
use serde::{Deserialize, Serialize};

/// Colour configuration for the display system
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
pub struct ColourConfig {
    /// Whether colours are enabled globally
    pub enabled: bool,
    pub theme: ColourTheme,
    /// Whether to respect NO_COLOR environment variable
    pub respect_no_color: bool,
}

impl Default for ColourConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            theme: ColourTheme::Auto,
            respect_no_color: true,
        }
    }
}

/// Available colour themes
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
pub enum ColourTheme {
    /// Dark palette until background detection exists
    Auto,
    /// Optimised for light backgrounds
    Light,
    /// Optimised for dark backgrounds
    Dark,
}

impl ColourTheme {
    pub fn from_name(name: &str) -> Option<Self> {
        match name.to_lowercase().as_str() {
            "auto" => Some(ColourTheme::Auto),
            "light" => Some(ColourTheme::Light),
            "dark" => Some(ColourTheme::Dark),
            _ => None,
        }
    }

    /// Get the appropriate colour palette for this theme
    pub fn get_palette(&self) -> ColourPalette {
        match self {
            ColourTheme::Auto | ColourTheme::Dark => ColourPalette::dark(),
            ColourTheme::Light => ColourPalette::light(),
        }
    }
}

/// Colour names per role
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
pub struct ColourPalette {
    pub error: String,
    pub warning: String,
    pub info: String,
    pub success: String,
    pub highlight: String,
    /// Words added
    pub added: String,
    /// Words removed
    pub removed: String,
}

impl ColourPalette {
    /// Palette for light backgrounds
    pub fn light() -> Self {
        Self {
            error: "red".to_string(),
            warning: "yellow".to_string(),
            info: "blue".to_string(),
            success: "green".to_string(),
            highlight: "magenta".to_string(),
            added: "green".to_string(),
            removed: "red".to_string(),
        }
    }

    /// Palette for dark backgrounds
    pub fn dark() -> Self {
        Self {
            error: "bright_red".to_string(),
            warning: "bright_yellow".to_string(),
            info: "bright_blue".to_string(),
            success: "bright_green".to_string(),
            highlight: "bright_cyan".to_string(),
            added: "bright_green".to_string(),
            removed: "bright_red".to_string(),
        }
    }

    /// Parse a colour string into a Color enum
    pub fn parse_color(color_str: &str) -> Option<Color> {
        match color_str.to_lowercase().as_str() {
            "black" => Some(Color::Black),
            "red" => Some(Color::Red),
            "green" => Some(Color::Green),
            "yellow" => Some(Color::Yellow),
            "blue" => Some(Color::Blue),
            "magenta" => Some(Color::Magenta),
            "cyan" => Some(Color::Cyan),
            "white" => Some(Color::White),
            "bright_black" => Some(Color::BrightBlack),
            "bright_red" => Some(Color::BrightRed),
            "bright_green" => Some(Color::BrightGreen),
            "bright_yellow" => Some(Color::BrightYellow),
            "bright_blue" => Some(Color::BrightBlue),
            "bright_magenta" => Some(Color::BrightMagenta),
            "bright_cyan" => Some(Color::BrightCyan),
            "bright_white" => Some(Color::BrightWhite),
            _ => None,
        }
    }
}

impl ColourConfig {
    /// Create a colour configuration with colours disabled
    pub fn disabled() -> Self {
        Self {
            enabled: false,
            ..Self::default()
        }
    }

    pub fn set_enabled(&mut self, enabled: bool) {
        self.enabled = enabled;
    }

    /// Check if colours should be enabled based on configuration and environment
    pub fn should_use_colours(&self) -> bool {
        if !self.enabled {
            return false;
        }

        if self.respect_no_color && std::env::var("NO_COLOR").is_ok() {
            return false;
        }

        if !self.respect_no_color {
            return true;
        }

        use std::io::IsTerminal;
        std::io::stdout().is_terminal()
    }

    pub fn get_palette(&self) -> ColourPalette {
        self.theme.get_palette()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_colour_config() {
        let config = ColourConfig::default();
        assert!(config.enabled);
        assert_eq!(config.theme, ColourTheme::Auto);
        assert!(config.respect_no_color);
    }

    #[test]
    fn test_disabled_colour_config() {
        let config = ColourConfig::disabled();
        assert!(!config.should_use_colours());
    }

    #[test]
    fn test_theme_names() {
        assert_eq!(ColourTheme::from_name("Light"), Some(ColourTheme::Light));
        assert_eq!(ColourTheme::from_name("solarized"), None);
        assert_eq!(ColourTheme::Auto.get_palette(), ColourPalette::dark());
        assert_eq!(ColourTheme::Light.get_palette().highlight, "magenta");
    }

    #[test]
    fn test_parse_color() {
        assert_eq!(ColourPalette::parse_color("red"), Some(Color::Red));
        assert_eq!(ColourPalette::parse_color("Bright_Green"), Some(Color::BrightGreen));
        assert_eq!(ColourPalette::parse_color("invalid"), None);
    }
}
