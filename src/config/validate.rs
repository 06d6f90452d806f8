// src/config/validate.rs

use anyhow::{anyhow, Context, Result};

use crate::codec::CodecRegistry;
use crate::config::model::ConfigFile;

/// Run basic semantic validation against a loaded configuration.
///
/// This checks:
/// - the configured serializer exists in the codec registry
/// - `terminal_tag` and `seed_tag` are non-empty
///
/// It does **not** check that the stage/content directories exist; those
/// are resolved relative to the config file later, and discovery gives a
/// better error there.
pub fn validate_config(cfg: &ConfigFile, codecs: &CodecRegistry) -> Result<()> {
    codecs
        .get(&cfg.config.serializer)
        .context("invalid [config].serializer")?;

    if cfg.config.terminal_tag.is_empty() {
        return Err(anyhow!("[config].terminal_tag must be non-empty"));
    }
    if cfg.config.seed_tag.is_empty() {
        return Err(anyhow!("[config].seed_tag must be non-empty"));
    }

    Ok(())
}
