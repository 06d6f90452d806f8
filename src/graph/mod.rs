// src/graph/mod.rs

//! Tag dependency graph over discovered stages.

use std::collections::{BTreeSet, HashMap};
use std::sync::Arc;

use petgraph::algo::toposort;
use petgraph::graphmap::DiGraphMap;
use tracing::debug;

use crate::errors::{PipelineError, Result};
use crate::stage::{Stage, StageDescriptor};

/// Ordered stage list plus a derived `tag -> subscribers` index.
///
/// Subscribers of a tag are the stages whose `input_tags` contain it, kept
/// in stage-list order and deduplicated by path. The index covers every tag
/// any stage mentions (input or output), so looking up a tag with no
/// subscribers yields an empty slice; a tag no stage has ever mentioned
/// does the same. The whole structure is a pure function of the stages'
/// descriptors at build time and is never mutated afterwards.
#[derive(Debug)]
pub struct DependencyGraph {
    stages: Vec<Arc<Stage>>,
    subscribers: HashMap<String, Vec<Arc<Stage>>>,
}

impl DependencyGraph {
    /// Build the index, fetching each stage's descriptor as needed (one
    /// `config` subprocess per stage, memoized on the stage afterwards).
    pub async fn build(stages: Vec<Arc<Stage>>) -> Result<Self> {
        let descriptors = fetch_descriptors(&stages).await?;

        let mut universe: BTreeSet<&str> = BTreeSet::new();
        for descriptor in &descriptors {
            universe.extend(descriptor.input_tags.iter().map(String::as_str));
            universe.extend(descriptor.output_tags.iter().map(String::as_str));
        }

        let mut subscribers: HashMap<String, Vec<Arc<Stage>>> = HashMap::new();
        for tag in universe {
            let mut subs: Vec<Arc<Stage>> = Vec::new();
            for (stage, descriptor) in stages.iter().zip(&descriptors) {
                if descriptor.input_tags.iter().any(|t| t == tag)
                    && !subs.iter().any(|s| s.as_ref() == stage.as_ref())
                {
                    subs.push(Arc::clone(stage));
                }
            }
            subscribers.insert(tag.to_string(), subs);
        }

        debug!(
            stages = stages.len(),
            tags = subscribers.len(),
            "built dependency graph"
        );

        Ok(Self { stages, subscribers })
    }

    pub fn stages(&self) -> &[Arc<Stage>] {
        &self.stages
    }

    /// Every tag the graph knows about, sorted.
    pub fn tags(&self) -> Vec<&str> {
        let mut tags: Vec<&str> = self.subscribers.keys().map(String::as_str).collect();
        tags.sort_unstable();
        tags
    }

    /// Stages subscribed to `tag`, in stage-list order. Unknown tags yield
    /// an empty slice, never an error.
    pub fn subscribers_for(&self, tag: &str) -> &[Arc<Stage>] {
        self.subscribers.get(tag).map(Vec::as_slice).unwrap_or(&[])
    }

    /// Find a stage by its declared configuration name.
    pub async fn lookup_by_name(&self, name: &str) -> Result<&Arc<Stage>> {
        for stage in &self.stages {
            if stage.configuration().await?.name == name {
                return Ok(stage);
            }
        }
        Err(PipelineError::StageNotFound(name.to_string()))
    }

    /// Diagnostic: look for a cycle in the stage graph induced by tags
    /// (edge producer -> consumer wherever a producer's output tag is a
    /// consumer's input tag; a stage consuming its own output counts).
    ///
    /// Returns the declared name of a stage on a cycle. Cycles are not an
    /// error (the round loop simply has no termination guarantee for them),
    /// so this only feeds warnings and dry-run output.
    pub async fn detect_cycle(&self) -> Result<Option<String>> {
        let descriptors = fetch_descriptors(&self.stages).await?;

        let mut graph: DiGraphMap<&str, ()> = DiGraphMap::new();
        for descriptor in &descriptors {
            graph.add_node(descriptor.name.as_str());
        }
        for producer in &descriptors {
            for consumer in &descriptors {
                let feeds = producer
                    .output_tags
                    .iter()
                    .any(|tag| consumer.input_tags.contains(tag));
                if feeds {
                    graph.add_edge(producer.name.as_str(), consumer.name.as_str(), ());
                }
            }
        }

        match toposort(&graph, None) {
            Ok(_) => Ok(None),
            Err(cycle) => Ok(Some(cycle.node_id().to_string())),
        }
    }
}

async fn fetch_descriptors(stages: &[Arc<Stage>]) -> Result<Vec<StageDescriptor>> {
    let mut descriptors = Vec::with_capacity(stages.len());
    for stage in stages {
        descriptors.push(stage.configuration().await?.clone());
    }
    Ok(descriptors)
}
