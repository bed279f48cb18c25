//! Application initialization and configuration

use anyhow::{Context, Result};
use log::{debug, warn, LevelFilter};
use std::path::PathBuf;
use std::str::FromStr;
use std::sync::Arc;
use crate::{cli, config, display, logging};
use crate::service::StatService;
use crate::store::StatStore;

pub fn load_configuration(args: &cli::Args) -> Result<config::ConfigManager> {
    let mut manager = if let Some(config_file) = &args.config_file {
        debug!("Loading configuration from explicit file: {}", config_file.display());
        config::ConfigManager::load_from_file(config_file.clone())?
    } else {
        config::ConfigManager::load()?
    };

    if let Some(section_name) = &args.config_name {
        debug!("Selecting configuration section: {}", section_name);
        manager.select_section(section_name.clone());
    }

    Ok(manager)
}

pub fn configure_logging(args: &cli::Args, config: &config::ConfigManager) -> Result<logging::LogConfig> {
    let console_level = if args.debug {
        LevelFilter::Trace
    } else if args.verbose {
        LevelFilter::Debug
    } else if args.quiet {
        LevelFilter::Error
    } else {
        match config.get_log_level("base", "console-level") {
            Ok(Some(level)) => level,
            Ok(None) => LevelFilter::Info,
            Err(e) => {
                debug!("Invalid console-level in config, using default: {}", e);
                LevelFilter::Info
            }
        }
    };

    let format = if !args.log_format.is_empty() && args.log_format != "text" {
        logging::LogFormat::from_str(&args.log_format).map_err(|e| anyhow::anyhow!(e))?
    } else {
        config
            .get_value("base", "log-format")
            .and_then(|f| logging::LogFormat::from_str(f).ok())
            .unwrap_or(logging::LogFormat::Text)
    };

    let log_file_path = args.log_file.clone().or_else(|| config.get_path("base", "log-file"));

    let file_log_level = match &args.log_file_level {
        Some(level_str) => Some(logging::parse_log_level(level_str)?),
        None => match config.get_log_level("base", "file-log-level") {
            Ok(level) => level,
            Err(e) => {
                debug!("Invalid file-log-level in config, ignoring: {}", e);
                None
            }
        },
    };

    let (destination, file_level) = match (log_file_path, file_log_level) {
        (Some(path), level) => (logging::LogDestination::Both(path), Some(level.unwrap_or(console_level))),
        (None, None) => (logging::LogDestination::Console, None),
        (None, Some(_)) => {
            return Err(anyhow::anyhow!("Log file level specified without log file"));
        }
    };

    Ok(logging::LogConfig {
        console_level,
        file_level,
        format,
        destination,
        ..logging::LogConfig::default()
    })
}

/// Create a ColourManager from CLI arguments and configuration file
pub fn create_colour_manager(args: &cli::Args, config: &config::ConfigManager) -> display::ColourManager {
    let colour_config = match config.get_colour_config() {
        Ok(colour_config) => Some(colour_config),
        Err(e) => {
            warn!("Ignoring [display] settings: {}", e);
            None
        }
    };
    display::ColourManager::from_args_and_config(args.no_color, colour_config)
}

/// Database path from `--database`, else the configuration
pub fn resolve_database_path(args: &cli::Args, config: &config::ConfigManager) -> PathBuf {
    args.database.clone().unwrap_or_else(|| config.get_database_path())
}

/// Open the statistics database and wrap it in a service
pub fn open_service(args: &cli::Args, config: &config::ConfigManager) -> Result<StatService> {
    let path = resolve_database_path(args, config);
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        std::fs::create_dir_all(parent)
            .with_context(|| format!("Failed to create database directory {}", parent.display()))?;
    }

    debug!("Opening statistics database at {}", path.display());
    let store = StatStore::open(&path)
        .with_context(|| format!("Failed to open statistics database {}", path.display()))?;
    let sweep_config = config.get_sweep_config()?;

    Ok(StatService::new(Arc::new(store), sweep_config))
}
