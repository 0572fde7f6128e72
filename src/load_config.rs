//! `load_config` module: Loads the static YAML config and applies environment overrides.
//!
//! This module is the only place where user-supplied configuration is parsed and
//! mapped into the strongly-typed [`Config`].
//!
//! # Responsibilities
//! - Parse the YAML file into [`Config`]
//! - Apply `SHOPLIST_FONT_PATH` (if set) over `render.font_path`
//! - Resolve relative fixture and font paths against the config file's directory
//!
//! # Errors
//! All errors use `anyhow::Error` for context-rich diagnostics, surfaced at the CLI boundary.
use anyhow::Result;
use std::fs;
use std::path::{Path, PathBuf};
use tracing::{error, info};

use crate::config::Config;

pub const FONT_PATH_ENV: &str = "SHOPLIST_FONT_PATH";

pub fn load_config<P: AsRef<Path>>(path: P) -> Result<Config> {
    let path_ref = path.as_ref();
    info!(config_path = ?path_ref, "Loading configuration from file");

    let config_content = match fs::read_to_string(path_ref) {
        Ok(content) => {
            info!(config_path = ?path_ref, "Config file read successfully");
            content
        }
        Err(e) => {
            error!(error = ?e, config_path = ?path_ref, "Failed to read config file");
            return Err(anyhow::anyhow!(
                "Failed to read config file {:?}: {}",
                path_ref,
                e
            ));
        }
    };

    let mut config: Config = match serde_yaml::from_str(&config_content) {
        Ok(conf) => {
            info!(config_path = ?path_ref, "Parsed config YAML successfully");
            conf
        }
        Err(e) => {
            error!(error = ?e, config_path = ?path_ref, "Failed to parse config YAML");
            return Err(anyhow::anyhow!("Failed to parse config YAML: {e}"));
        }
    };

    if let Ok(font_path) = std::env::var(FONT_PATH_ENV) {
        if !font_path.is_empty() {
            info!(font_path = %font_path, "{} found in env, overriding render.font_path", FONT_PATH_ENV);
            config.render.font_path = Some(PathBuf::from(font_path));
        }
    }

    let base_dir = path_ref.parent().unwrap_or_else(|| Path::new(""));
    config.store.fixture = resolve(base_dir, &config.store.fixture);
    config.render.font_path = config
        .render
        .font_path
        .as_deref()
        .map(|p| resolve(base_dir, p));

    if config.shopping_list.filename.trim().is_empty() {
        error!("shopping_list.filename is empty");
        anyhow::bail!("shopping_list.filename must not be empty");
    }

    config.trace_loaded();
    Ok(config)
}

fn resolve(base_dir: &Path, path: &Path) -> PathBuf {
    if path.is_absolute() {
        path.to_path_buf()
    } else {
        base_dir.join(path)
    }
}
