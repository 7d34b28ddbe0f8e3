//! Config command handlers

use std::path::{Path, PathBuf};

use anyhow::{Context, Result};

use bookguide_core::Config;

use crate::output::{Output, OutputFormat};

fn display_opt_path(path: Option<&Path>) -> String {
    path.map(|p| p.display().to_string())
        .unwrap_or_else(|| "(not set)".to_string())
}

fn display_opt_f64(value: Option<f64>) -> String {
    value
        .map(|v| v.to_string())
        .unwrap_or_else(|| "(not set)".to_string())
}

/// Show current configuration
pub fn show(config_path: Option<&PathBuf>, output: &Output) -> Result<()> {
    let config =
        Config::load_with_cli_override(config_path).context("Failed to load configuration")?;

    match output.format {
        OutputFormat::Json => {
            println!("{}", serde_json::to_string_pretty(&config)?);
        }
        OutputFormat::Quiet => {
            println!("{}", config.data_dir.display());
        }
        OutputFormat::Human => {
            let effective_path = config_path
                .cloned()
                .unwrap_or_else(Config::config_file_path);
            println!("Configuration:");
            println!("  data_dir:         {}", config.data_dir.display());
            println!("  storage:          {}", config.storage);
            println!(
                "  catalog_file:     {}",
                display_opt_path(config.catalog_file.as_deref())
            );
            println!(
                "  libraries_file:   {}",
                display_opt_path(config.libraries_file.as_deref())
            );
            println!(
                "  home_latitude:    {}",
                display_opt_f64(config.home_latitude)
            );
            println!(
                "  home_longitude:   {}",
                display_opt_f64(config.home_longitude)
            );
            println!("  search_radius_km: {}", config.search_radius_km);
            println!(
                "  log_file:         {}",
                display_opt_path(config.log_file.as_deref())
            );
            println!();
            println!("Config file: {}", effective_path.display());
        }
    }

    Ok(())
}

/// Set a configuration value
pub fn set(
    key: String,
    value: String,
    config_path: Option<&PathBuf>,
    output: &Output,
) -> Result<()> {
    let mut config =
        Config::load_with_cli_override(config_path).context("Failed to load configuration")?;

    config.set_value(&key, &value)?;

    // Save to the CLI-specified path or default
    let save_path = config_path
        .cloned()
        .unwrap_or_else(Config::config_file_path);
    config
        .save_to_path(&save_path)
        .context("Failed to save configuration")?;

    output.success(&format!("Set {} = {}", key, value));

    Ok(())
}
