// src/discover.rs

//! Deterministic file discovery.
//!
//! Both stage directories and content directories are enumerated through
//! [`files_in_dir`], so a pipeline run sees the same order on every
//! filesystem.

use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};

/// Enumerate every file under `root`, recursively.
///
/// Entries are sorted by name within each directory and subdirectories are
/// descended depth-first at their sort position, giving a stable total
/// order. Directories themselves are not yielded.
pub fn files_in_dir(root: impl AsRef<Path>) -> Result<Vec<PathBuf>> {
    let mut files = Vec::new();
    walk(root.as_ref(), &mut files)?;
    Ok(files)
}

fn walk(dir: &Path, out: &mut Vec<PathBuf>) -> Result<()> {
    let entries = fs::read_dir(dir).with_context(|| format!("reading directory {:?}", dir))?;

    let mut paths: Vec<PathBuf> = Vec::new();
    for entry in entries {
        let entry = entry.with_context(|| format!("reading entries of {:?}", dir))?;
        paths.push(entry.path());
    }
    paths.sort();

    for path in paths {
        if path.is_dir() {
            walk(&path, out)?;
        } else {
            out.push(path);
        }
    }

    Ok(())
}
