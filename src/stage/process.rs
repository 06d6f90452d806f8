// src/stage/process.rs

//! The subprocess protocol bridge: one executable file as a typed pipeline
//! participant.

use std::hash::{Hash, Hasher};
use std::path::{Path, PathBuf};
use std::process::Stdio;
use std::sync::OnceLock;
use std::time::Duration;

use serde::Deserialize;
use serde_json::Value;
use tokio::io::AsyncWriteExt;
use tokio::process::Command;
use tokio::sync::OnceCell;
use tracing::debug;

use crate::codec::CodecHandle;
use crate::errors::{PipelineError, Result};
use crate::record::Record;
use crate::stage::runner::resolve_runner;

/// A stage's declared place in the tag graph, as emitted by its `config`
/// verb. All three fields are required.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct StageDescriptor {
    pub name: String,
    pub input_tags: Vec<String>,
    pub output_tags: Vec<String>,
}

/// Everything a single verb invocation produced.
#[derive(Debug)]
pub struct RunOutput {
    pub records: Vec<Record>,
    pub stderr: Vec<u8>,
    /// Always 0 here; non-zero exits surface as [`PipelineError::BadExit`].
    pub exit_code: i32,
}

/// One executable file participating in the pipeline.
///
/// Identity is the canonicalized path: two stages are equal iff they point
/// at the same file, and hashing is consistent with that. The runner argv
/// and the descriptor are each resolved once, on first use, and cached for
/// the stage's lifetime; everything else is immutable after construction.
#[derive(Debug)]
pub struct Stage {
    path: PathBuf,
    codec: CodecHandle,
    timeout: Option<Duration>,
    runner: OnceLock<Vec<String>>,
    descriptor: OnceCell<StageDescriptor>,
}

impl Stage {
    pub fn new(path: impl Into<PathBuf>, codec: CodecHandle, timeout: Option<Duration>) -> Self {
        let path = path.into();
        let path = path.canonicalize().unwrap_or(path);
        Self {
            path,
            codec,
            timeout,
            runner: OnceLock::new(),
            descriptor: OnceCell::new(),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Argv prefix used to execute this stage, resolved on first use.
    pub fn runner(&self) -> &[String] {
        self.runner.get_or_init(|| resolve_runner(&self.path))
    }

    /// Run one verb: spawn `runner + [path, verb]`, feed `stdin_payload` (if
    /// any), wait for exit, decode stdout line by line.
    ///
    /// Exactly one child process per call; it is always reaped before this
    /// returns, whether it succeeded, exited non-zero, failed to spawn, or
    /// was killed on timeout.
    pub async fn run(
        &self,
        verb: &str,
        stdin_payload: Option<String>,
        timeout: Option<Duration>,
    ) -> Result<RunOutput> {
        let runner = self.runner();

        let mut cmd = Command::new(&runner[0]);
        cmd.args(&runner[1..])
            .arg(&self.path)
            .arg(verb)
            .stdin(Stdio::piped())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .kill_on_drop(true);

        debug!(stage = %self.path.display(), verb, "spawning stage process");

        let mut child = cmd.spawn().map_err(|source| PipelineError::BadRunner {
            command: attempted_command(runner, &self.path, verb),
            source,
        })?;

        // Feed stdin and collect output concurrently; doing them in sequence
        // deadlocks once both pipe buffers fill up. Dropping the stdin handle
        // closes the pipe so the child sees EOF.
        let stdin = child.stdin.take();
        let write_input = async {
            if let (Some(mut stdin), Some(payload)) = (stdin, &stdin_payload) {
                if let Err(err) = stdin.write_all(payload.as_bytes()).await {
                    // A stage that ignores its stdin may exit before we
                    // finish writing.
                    if err.kind() != std::io::ErrorKind::BrokenPipe {
                        return Err(err);
                    }
                }
            }
            Ok(())
        };

        let io = async { tokio::join!(write_input, child.wait_with_output()) };

        // On timeout the in-flight wait future is dropped, which drops the
        // child handle, and kill_on_drop takes the process down with it.
        let (write_result, output_result) = match timeout {
            Some(limit) => {
                tokio::time::timeout(limit, io)
                    .await
                    .map_err(|_| PipelineError::Timeout {
                        verb: verb.to_string(),
                        elapsed: limit,
                    })?
            }
            None => io.await,
        };
        write_result?;
        let output = output_result?;

        if !output.status.success() {
            return Err(PipelineError::BadExit {
                code: output.status.code().unwrap_or(-1),
                stdout: String::from_utf8_lossy(&output.stdout).into_owned(),
                stderr: String::from_utf8_lossy(&output.stderr).into_owned(),
            });
        }

        if !output.stderr.is_empty() {
            debug!(
                stage = %self.path.display(),
                verb,
                "stderr: {}",
                String::from_utf8_lossy(&output.stderr)
            );
        }

        let stdout = String::from_utf8_lossy(&output.stdout);
        let mut records = Vec::new();
        for line in stdout.split('\n') {
            if line.is_empty() {
                continue;
            }
            records.push(self.codec.decode(line)?);
        }

        Ok(RunOutput {
            records,
            stderr: output.stderr,
            exit_code: 0,
        })
    }

    /// The stage's descriptor, fetched via the `config` verb on first use
    /// and cached for the stage's lifetime. First success wins; the cache is
    /// never refreshed.
    pub async fn configuration(&self) -> Result<&StageDescriptor> {
        self.descriptor
            .get_or_try_init(|| async {
                let output = self.run("config", None, self.timeout).await?;
                let record = output.records.into_iter().next().ok_or_else(|| {
                    PipelineError::BadConfiguration(format!(
                        "stage {:?} returned no configuration record",
                        self.path
                    ))
                })?;
                descriptor_from_record(&self.path, record)
            })
            .await
    }

    /// Hand a working set to the stage's `process` verb and decode whatever
    /// comes back. Spawns exactly one child process; no retries.
    pub async fn process(&self, records: &[Record]) -> Result<Vec<Record>> {
        let lines = records
            .iter()
            .map(|record| self.codec.encode(record))
            .collect::<Result<Vec<_>>>()?;

        let output = self.run("process", Some(lines.join("\n")), self.timeout).await?;
        Ok(output.records)
    }

    /// Invoke the `start` verb with no input; source stages emit their
    /// records here.
    pub async fn start(&self) -> Result<Vec<Record>> {
        let output = self.run("start", None, self.timeout).await?;
        Ok(output.records)
    }
}

impl PartialEq for Stage {
    fn eq(&self, other: &Self) -> bool {
        self.path == other.path
    }
}

impl Eq for Stage {}

impl Hash for Stage {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.path.hash(state);
    }
}

fn descriptor_from_record(path: &Path, record: Record) -> Result<StageDescriptor> {
    serde_json::from_value(Value::Object(record.0)).map_err(|err| {
        PipelineError::BadConfiguration(format!(
            "stage {:?} returned a malformed configuration: {}",
            path, err
        ))
    })
}

fn attempted_command(runner: &[String], path: &Path, verb: &str) -> String {
    let mut parts: Vec<String> = runner.to_vec();
    parts.push(path.display().to_string());
    parts.push(verb.to_string());
    parts.join(" ")
}
