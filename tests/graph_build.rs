//! Graph construction over directories of stage scripts.

mod common;

use std::error::Error;
use std::sync::Arc;

use tagflow::errors::PipelineError;
use tagflow::graph::DependencyGraph;
use tagflow::stage::Stage;

use common::{descriptor_stage, stage_at, write_stage};

type TestResult = Result<(), Box<dyn Error>>;

async fn subscriber_names(graph: &DependencyGraph, tag: &str) -> Vec<String> {
    let mut names = Vec::new();
    for stage in graph.subscribers_for(tag) {
        names.push(stage.configuration().await.unwrap().name.clone());
    }
    names
}

#[tokio::test]
async fn index_maps_every_mentioned_tag_to_its_subscribers() -> TestResult {
    let dir = tempfile::tempdir()?;
    let a = stage_at(write_stage(
        dir.path(),
        "a.sh",
        &descriptor_stage("a", &["f"], &["a"]),
    ));
    let b = stage_at(write_stage(
        dir.path(),
        "b.sh",
        &descriptor_stage("b", &["a"], &["b"]),
    ));

    let graph = DependencyGraph::build(vec![a, b]).await?;

    assert_eq!(subscriber_names(&graph, "f").await, vec!["a"]);
    assert_eq!(subscriber_names(&graph, "a").await, vec!["b"]);
    // "b" is only ever produced, but it is still in the index
    assert!(subscriber_names(&graph, "b").await.is_empty());
    assert_eq!(graph.tags(), vec!["a", "b", "f"]);
    Ok(())
}

#[tokio::test]
async fn unknown_tags_resolve_to_an_empty_set() -> TestResult {
    let dir = tempfile::tempdir()?;
    let a = stage_at(write_stage(
        dir.path(),
        "a.sh",
        &descriptor_stage("a", &["f"], &["a"]),
    ));

    let graph = DependencyGraph::build(vec![a]).await?;
    assert!(graph.subscribers_for("never-mentioned").is_empty());
    Ok(())
}

#[tokio::test]
async fn lookup_by_name_scans_declared_names() -> TestResult {
    let dir = tempfile::tempdir()?;
    let path = write_stage(dir.path(), "a.sh", &descriptor_stage("alpha", &["f"], &[]));
    let a = stage_at(&path);

    let graph = DependencyGraph::build(vec![Arc::clone(&a)]).await?;

    let found = graph.lookup_by_name("alpha").await?;
    assert_eq!(found.as_ref(), a.as_ref());

    match graph.lookup_by_name("beta").await {
        Err(PipelineError::StageNotFound(name)) => assert_eq!(name, "beta"),
        other => panic!("expected StageNotFound, got {other:?}"),
    }
    Ok(())
}

#[tokio::test]
async fn duplicate_stage_paths_subscribe_once() -> TestResult {
    let dir = tempfile::tempdir()?;
    let path = write_stage(dir.path(), "a.sh", &descriptor_stage("a", &["f"], &[]));

    let graph =
        DependencyGraph::build(vec![stage_at(&path), stage_at(&path)]).await?;
    assert_eq!(graph.subscribers_for("f").len(), 1);
    Ok(())
}

#[tokio::test]
async fn acyclic_tag_graph_has_no_cycle() -> TestResult {
    let dir = tempfile::tempdir()?;
    let a = stage_at(write_stage(
        dir.path(),
        "a.sh",
        &descriptor_stage("a", &["f"], &["a"]),
    ));
    let b = stage_at(write_stage(
        dir.path(),
        "b.sh",
        &descriptor_stage("b", &["a"], &["rendered"]),
    ));

    let graph = DependencyGraph::build(vec![a, b]).await?;
    assert_eq!(graph.detect_cycle().await?, None);
    Ok(())
}

#[tokio::test]
async fn mutually_feeding_stages_are_reported_as_a_cycle() -> TestResult {
    let dir = tempfile::tempdir()?;
    let ping = stage_at(write_stage(
        dir.path(),
        "ping.sh",
        &descriptor_stage("ping", &["x"], &["y"]),
    ));
    let pong = stage_at(write_stage(
        dir.path(),
        "pong.sh",
        &descriptor_stage("pong", &["y"], &["x"]),
    ));

    let graph = DependencyGraph::build(vec![ping, pong]).await?;
    let on_cycle = graph.detect_cycle().await?.expect("cycle expected");
    assert!(on_cycle == "ping" || on_cycle == "pong");
    Ok(())
}

#[tokio::test]
async fn graph_construction_fails_on_a_broken_stage() -> TestResult {
    let dir = tempfile::tempdir()?;
    let fine = stage_at(write_stage(
        dir.path(),
        "fine.sh",
        &descriptor_stage("fine", &["f"], &[]),
    ));
    let broken: Arc<Stage> = stage_at(write_stage(
        dir.path(),
        "broken.sh",
        "#!/bin/sh\ncase \"$1\" in config) exit 1 ;; esac\n",
    ));

    match DependencyGraph::build(vec![fine, broken]).await {
        Err(PipelineError::BadExit { code, .. }) => assert_eq!(code, 1),
        other => panic!("expected BadExit, got {other:?}"),
    }
    Ok(())
}
