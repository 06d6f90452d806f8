// src/config/model.rs

use std::time::Duration;

use serde::Deserialize;

/// Top-level configuration as read from a TOML file:
///
/// ```toml
/// [config]
/// serializer = "json"
/// terminal_tag = "rendered"
///
/// [pipeline]
/// stages = "stages"
/// content = "content"
/// ```
///
/// All sections are optional and have reasonable defaults.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct ConfigFile {
    /// Wire format and loop behaviour from `[config]`.
    #[serde(default)]
    pub config: ConfigSection,

    /// Directory layout from `[pipeline]`.
    #[serde(default)]
    pub pipeline: PipelineSection,
}

/// `[config]` section.
#[derive(Debug, Clone, Deserialize)]
pub struct ConfigSection {
    /// Codec name looked up in the registry. Default: `json`.
    #[serde(default = "default_serializer")]
    pub serializer: String,

    /// Tag that marks a record as finished. Default: `rendered`.
    #[serde(default = "default_terminal_tag")]
    pub terminal_tag: String,

    /// Tag placed on discovered content files. Default: `filesystem`.
    #[serde(default = "default_seed_tag")]
    pub seed_tag: String,

    /// Fail the run if the working set survives this many rounds.
    /// 0 (the default) means unbounded.
    #[serde(default)]
    pub max_rounds: u64,

    /// Deadline for each stage process, in seconds. 0 (the default) means
    /// wait indefinitely.
    #[serde(default)]
    pub stage_timeout_secs: u64,
}

fn default_serializer() -> String {
    "json".to_string()
}

fn default_terminal_tag() -> String {
    "rendered".to_string()
}

fn default_seed_tag() -> String {
    "filesystem".to_string()
}

impl Default for ConfigSection {
    fn default() -> Self {
        Self {
            serializer: default_serializer(),
            terminal_tag: default_terminal_tag(),
            seed_tag: default_seed_tag(),
            max_rounds: 0,
            stage_timeout_secs: 0,
        }
    }
}

impl ConfigSection {
    /// Effective per-process deadline; `None` when disabled.
    pub fn stage_timeout(&self) -> Option<Duration> {
        (self.stage_timeout_secs > 0).then(|| Duration::from_secs(self.stage_timeout_secs))
    }
}

/// `[pipeline]` section.
#[derive(Debug, Clone, Deserialize)]
pub struct PipelineSection {
    /// Directory of stage executables, relative to the config file.
    #[serde(default = "default_stages_dir")]
    pub stages: String,

    /// Directory of content files to seed from, relative to the config file.
    #[serde(default = "default_content_dir")]
    pub content: String,
}

fn default_stages_dir() -> String {
    "stages".to_string()
}

fn default_content_dir() -> String {
    "content".to_string()
}

impl Default for PipelineSection {
    fn default() -> Self {
        Self {
            stages: default_stages_dir(),
            content: default_content_dir(),
        }
    }
}
