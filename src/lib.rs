// src/lib.rs

pub mod cli;
pub mod codec;
pub mod config;
pub mod coordinator;
pub mod discover;
pub mod errors;
pub mod graph;
pub mod logging;
pub mod record;
pub mod stage;

use std::path::{Path, PathBuf};
use std::sync::Arc;

use anyhow::{Context, Result};
use tracing::{info, warn};

use crate::cli::CliArgs;
use crate::codec::CodecRegistry;
use crate::config::loader::load_and_validate;
use crate::config::model::ConfigFile;
use crate::coordinator::{Coordinator, CoordinatorOptions};
use crate::discover::files_in_dir;
use crate::graph::DependencyGraph;
use crate::stage::Stage;

/// High-level entry point used by `main.rs`.
///
/// This wires together:
/// - config loading
/// - codec selection
/// - stage discovery and graph construction
/// - the coordinator loop (or a dry-run report)
pub async fn run(args: CliArgs) -> Result<()> {
    let codecs = CodecRegistry::default();

    let config_path = PathBuf::from(&args.config);
    let cfg = load_and_validate(&config_path, &codecs)?;

    let root = config_root_dir(&config_path);
    let stages_dir = root.join(args.stages.as_deref().unwrap_or(&cfg.pipeline.stages));
    let content_dir = root.join(args.content.as_deref().unwrap_or(&cfg.pipeline.content));

    let codec = codecs.get(&cfg.config.serializer)?;
    let timeout = cfg.config.stage_timeout();

    let stage_files = files_in_dir(&stages_dir)
        .with_context(|| format!("discovering stages under {:?}", stages_dir))?;
    let stages: Vec<Arc<Stage>> = stage_files
        .into_iter()
        .map(|path| Arc::new(Stage::new(path, Arc::clone(&codec), timeout)))
        .collect();

    info!(
        stages = stages.len(),
        dir = %stages_dir.display(),
        "discovered stage files"
    );

    let graph = DependencyGraph::build(stages).await?;

    if let Some(name) = graph.detect_cycle().await? {
        warn!(
            stage = %name,
            "tag graph contains a cycle; records may never reach the terminal tag"
        );
    }

    if args.dry_run {
        print_dry_run(&cfg, &graph).await?;
        return Ok(());
    }

    let coordinator = Coordinator::new(
        graph,
        CoordinatorOptions {
            terminal_tag: cfg.config.terminal_tag.clone(),
            seed_tag: cfg.config.seed_tag.clone(),
            max_rounds: cfg.config.max_rounds,
        },
    );

    let finalized = coordinator.process_dir(&content_dir).await?;

    for record in &finalized {
        println!("{}", codec.encode(record)?);
    }

    info!(records = finalized.len(), "pipeline finished");
    Ok(())
}

/// Directories in the config are resolved against the directory containing
/// the config file, or `.` when there is none.
fn config_root_dir(config_path: &Path) -> PathBuf {
    match config_path.parent() {
        Some(parent) if parent != Path::new("") => parent.to_path_buf(),
        _ => PathBuf::from("."),
    }
}

/// Dry-run output: stages with their descriptors, then the tag index.
async fn print_dry_run(cfg: &ConfigFile, graph: &DependencyGraph) -> Result<()> {
    println!("tagflow dry-run");
    println!("  config.serializer = {}", cfg.config.serializer);
    println!("  config.terminal_tag = {}", cfg.config.terminal_tag);
    println!("  config.seed_tag = {}", cfg.config.seed_tag);
    if cfg.config.max_rounds > 0 {
        println!("  config.max_rounds = {}", cfg.config.max_rounds);
    }
    println!();

    println!("stages ({}):", graph.stages().len());
    for stage in graph.stages() {
        let descriptor = stage.configuration().await?;
        println!("  - {} ({})", descriptor.name, stage.path().display());
        println!("      input_tags: {:?}", descriptor.input_tags);
        println!("      output_tags: {:?}", descriptor.output_tags);
    }
    println!();

    println!("tag -> subscribers:");
    for tag in graph.tags() {
        let mut names = Vec::new();
        for stage in graph.subscribers_for(tag) {
            names.push(stage.configuration().await?.name.clone());
        }
        println!("  {tag}: {names:?}");
    }

    if let Some(name) = graph.detect_cycle().await? {
        println!();
        println!("warning: cycle involving stage '{name}'");
    }

    Ok(())
}
