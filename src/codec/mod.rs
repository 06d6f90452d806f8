// src/codec/mod.rs

//! Wire-format codecs.
//!
//! The pipeline's framing is fixed at "one textual record per line,
//! `\n`-joined, UTF-8"; how a single line maps to a [`Record`] is the
//! codec's business. Codecs are selected by name from a [`CodecRegistry`]
//! that is built once at startup and passed into constructors; there is no
//! global mutable registry.

use std::collections::HashMap;
use std::fmt::Debug;
use std::sync::Arc;

use crate::errors::{PipelineError, Result};
use crate::record::Record;

/// One record per line, in and out.
pub trait Codec: Debug + Send + Sync {
    fn decode(&self, line: &str) -> Result<Record>;
    fn encode(&self, record: &Record) -> Result<String>;
}

pub type CodecHandle = Arc<dyn Codec>;

/// Explicit name -> codec mapping.
#[derive(Debug, Clone)]
pub struct CodecRegistry {
    codecs: HashMap<String, CodecHandle>,
}

impl CodecRegistry {
    pub fn empty() -> Self {
        Self {
            codecs: HashMap::new(),
        }
    }

    pub fn register(&mut self, name: impl Into<String>, codec: CodecHandle) {
        self.codecs.insert(name.into(), codec);
    }

    pub fn contains(&self, name: &str) -> bool {
        self.codecs.contains_key(name)
    }

    pub fn get(&self, name: &str) -> Result<CodecHandle> {
        self.codecs
            .get(name)
            .cloned()
            .ok_or_else(|| PipelineError::UnknownSerializer(name.to_string()))
    }
}

impl Default for CodecRegistry {
    /// The stock registry: just `json`.
    fn default() -> Self {
        let mut registry = Self::empty();
        registry.register("json", Arc::new(JsonCodec));
        registry
    }
}

/// JSON, the default wire format.
///
/// Temporal values travel as ISO-8601 strings and decode back to the same
/// strings; nothing is re-hydrated into a native date type.
#[derive(Debug, Clone, Copy)]
pub struct JsonCodec;

impl Codec for JsonCodec {
    fn decode(&self, line: &str) -> Result<Record> {
        serde_json::from_str(line).map_err(|err| PipelineError::Decode {
            line: line.to_string(),
            message: err.to_string(),
        })
    }

    fn encode(&self, record: &Record) -> Result<String> {
        let line = serde_json::to_string(record).map_err(anyhow::Error::from)?;
        Ok(line)
    }
}
