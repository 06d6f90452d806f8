// src/coordinator/mod.rs

//! The round-based convergence loop.
//!
//! The coordinator drives a working set of records through the tag graph:
//! each round it collects the tags present in the working set, runs every
//! subscribed stage against the whole pre-round working set, and partitions
//! the combined output into finalized records (those carrying the terminal
//! tag) and the next working set. The loop ends when the working set is
//! empty.

use std::collections::BTreeSet;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use tracing::{debug, info};

use crate::discover::files_in_dir;
use crate::errors::{PipelineError, Result};
use crate::graph::DependencyGraph;
use crate::record::Record;
use crate::stage::Stage;

/// Knobs for the round loop.
#[derive(Debug, Clone)]
pub struct CoordinatorOptions {
    /// Tag that finalizes a record and removes it from circulation.
    pub terminal_tag: String,
    /// Tag placed on seed records built from discovered files.
    pub seed_tag: String,
    /// Abort with [`PipelineError::RoundLimitExceeded`] if the working set
    /// is still non-empty after this many rounds; 0 means no cap, matching
    /// the reference behaviour of looping forever on a cyclic tag graph.
    pub max_rounds: u64,
}

impl Default for CoordinatorOptions {
    fn default() -> Self {
        Self {
            terminal_tag: "rendered".to_string(),
            seed_tag: "filesystem".to_string(),
            max_rounds: 0,
        }
    }
}

pub struct Coordinator {
    graph: DependencyGraph,
    options: CoordinatorOptions,
}

impl Coordinator {
    pub fn new(graph: DependencyGraph, options: CoordinatorOptions) -> Self {
        Self { graph, options }
    }

    pub fn graph(&self) -> &DependencyGraph {
        &self.graph
    }

    /// Run every subscriber of `tag` against the whole working set,
    /// strictly in subscriber order, one child process at a time.
    ///
    /// Subscription only gates *whether* a stage runs in a round; each
    /// stage sees every record and picks out the ones it cares about. When
    /// one record carries two tags the same stage subscribes to, that stage
    /// runs once per tag and its output is produced, and counted, twice.
    pub async fn process_tag(
        &self,
        tag: &str,
        working_set: &[Record],
    ) -> Result<Vec<(Arc<Stage>, Vec<Record>)>> {
        let mut results = Vec::new();
        for stage in self.graph.subscribers_for(tag) {
            let records = stage.process(working_set).await?;
            results.push((Arc::clone(stage), records));
        }
        Ok(results)
    }

    /// Seed one record per file and run the loop to completion, returning
    /// the finalized records in production order.
    pub async fn process_files(&self, files: &[PathBuf]) -> Result<Vec<Record>> {
        let seed: Vec<Record> = files
            .iter()
            .map(|file| Record::seed(file, &self.options.seed_tag))
            .collect();
        self.run_rounds(seed).await
    }

    /// [`process_files`](Self::process_files) over a deterministic
    /// enumeration of every file under `directory`.
    pub async fn process_dir(&self, directory: &Path) -> Result<Vec<Record>> {
        self.process_files(&files_in_dir(directory)?).await
    }

    async fn run_rounds(&self, mut working_set: Vec<Record>) -> Result<Vec<Record>> {
        let mut finalized: Vec<Record> = Vec::new();
        let mut rounds: u64 = 0;

        while !working_set.is_empty() {
            rounds += 1;
            if self.options.max_rounds > 0 && rounds > self.options.max_rounds {
                return Err(PipelineError::RoundLimitExceeded {
                    rounds: self.options.max_rounds,
                });
            }

            // Tags present across the pre-round working set, deduplicated
            // and sorted so rounds are deterministic.
            let tags: BTreeSet<String> = working_set
                .iter()
                .flat_map(|record| record.tags().map(str::to_string))
                .collect();

            debug!(round = rounds, records = working_set.len(), ?tags, "starting round");

            // Every stage in this round observes the same pre-round working
            // set; nothing sees another stage's output until the next round.
            let mut current: Vec<Record> = Vec::new();
            for tag in &tags {
                for (_, records) in self.process_tag(tag, &working_set).await? {
                    current.extend(records);
                }
            }

            working_set.clear();
            for record in current {
                if record.has_tag(&self.options.terminal_tag) {
                    finalized.push(record);
                } else {
                    working_set.push(record);
                }
            }
        }

        info!(finalized = finalized.len(), rounds, "working set drained");
        Ok(finalized)
    }
}
