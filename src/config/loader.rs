// src/config/loader.rs

use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};

use crate::codec::CodecRegistry;
use crate::config::model::ConfigFile;
use crate::config::validate::validate_config;

/// Load a configuration file from a given path and return the raw
/// `ConfigFile`.
///
/// This only performs TOML deserialization; it does **not** perform
/// semantic validation. Use [`load_and_validate`] for that.
pub fn load_from_path(path: impl AsRef<Path>) -> Result<ConfigFile> {
    let path = path.as_ref();
    let contents = fs::read_to_string(path)
        .with_context(|| format!("reading config file at {:?}", path))?;

    let config: ConfigFile = toml::from_str(&contents)
        .with_context(|| format!("parsing TOML config from {:?}", path))?;

    Ok(config)
}

/// Load a configuration file and run basic validation against the codec
/// registry. This is the entry point the rest of the application uses.
pub fn load_and_validate(path: impl AsRef<Path>, codecs: &CodecRegistry) -> Result<ConfigFile> {
    let config = load_from_path(&path)?;
    validate_config(&config, codecs)?;
    Ok(config)
}

/// Default config path: `Tagflow.toml` in the current working directory.
pub fn default_config_path() -> PathBuf {
    PathBuf::from("Tagflow.toml")
}
