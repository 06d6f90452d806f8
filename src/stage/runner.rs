// src/stage/runner.rs

//! Interpreter resolution for stage executables.

use std::fs;
use std::path::Path;

/// Extension -> interpreter table used when a stage has no shebang.
const RUNNERS: &[(&str, &str)] = &[
    ("py", "python"),
    ("rb", "ruby"),
    ("js", "node"),
    ("sh", "bash"),
    ("pl", "perl"),
];

const FALLBACK_RUNNER: &str = "bash";

/// Resolve the argv prefix used to execute a stage file.
///
/// A `#!` first line wins and is tokenized shell-style, so
/// `#!/usr/bin/env python` becomes `["/usr/bin/env", "python"]` regardless
/// of the file's extension. Otherwise the extension table applies, and
/// anything else (unknown extension, no extension, unreadable or empty
/// file) silently falls back to `bash`. Resolution never fails.
pub fn resolve_runner(path: &Path) -> Vec<String> {
    if let Some(line) = first_line(path) {
        if let Some(rest) = line.strip_prefix("#!") {
            if let Some(tokens) = shlex::split(rest.trim()) {
                if !tokens.is_empty() {
                    return tokens;
                }
            }
        }
    }

    let runner = path
        .extension()
        .and_then(|ext| ext.to_str())
        .and_then(|ext| {
            RUNNERS
                .iter()
                .find(|(known, _)| *known == ext)
                .map(|(_, runner)| *runner)
        })
        .unwrap_or(FALLBACK_RUNNER);

    vec![runner.to_string()]
}

fn first_line(path: &Path) -> Option<String> {
    let contents = fs::read_to_string(path).ok()?;
    contents.lines().next().map(str::to_string)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use std::path::PathBuf;

    fn stage_file(name: &str, contents: &str) -> (tempfile::TempDir, PathBuf) {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join(name);
        fs::write(&path, contents).unwrap();
        (dir, path)
    }

    #[test]
    fn shebang_wins_over_extension() {
        let (_dir, path) = stage_file("stage.rb", "#!/usr/bin/env python\nprint('hi')\n");
        assert_eq!(resolve_runner(&path), vec!["/usr/bin/env", "python"]);
    }

    #[test]
    fn shebang_arguments_are_tokenized() {
        let (_dir, path) = stage_file("stage", "#!/bin/sh -e\necho hi\n");
        assert_eq!(resolve_runner(&path), vec!["/bin/sh", "-e"]);
    }

    #[test]
    fn known_extensions_map_to_interpreters() {
        for (ext, runner) in [
            ("py", "python"),
            ("rb", "ruby"),
            ("js", "node"),
            ("sh", "bash"),
            ("pl", "perl"),
        ] {
            let (_dir, path) = stage_file(&format!("stage.{ext}"), "no shebang here\n");
            assert_eq!(resolve_runner(&path), vec![runner.to_string()]);
        }
    }

    #[test]
    fn unknown_or_missing_extension_falls_back_to_bash() {
        let (_dir, path) = stage_file("stage.xyz", "whatever\n");
        assert_eq!(resolve_runner(&path), vec!["bash"]);

        let (_dir, path) = stage_file("stage", "whatever\n");
        assert_eq!(resolve_runner(&path), vec!["bash"]);
    }

    #[test]
    fn unreadable_file_falls_back_by_extension() {
        // never created on disk
        let path = PathBuf::from("/definitely/not/here/stage.py");
        assert_eq!(resolve_runner(&path), vec!["python"]);
    }

    #[test]
    fn empty_file_falls_back_to_bash() {
        let (_dir, path) = stage_file("stage", "");
        assert_eq!(resolve_runner(&path), vec!["bash"]);
    }
}
