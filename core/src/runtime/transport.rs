//! Subprocess transport to the agent runtime
//!
//! The runtime is the `claude` CLI started in stream-json mode: user
//! messages go in on stdin as JSON lines, runtime messages come back on
//! stdout the same way.

use super::message::{parse_message, Message};
use crate::config::AgentOptions;
use crate::error::{Result, TransportError};
use std::collections::VecDeque;
use std::path::PathBuf;
use std::process::Stdio;
use tokio::io::{AsyncBufRead, AsyncBufReadExt, AsyncRead, AsyncWriteExt, BufReader};
use tokio::process::{Child, ChildStdin, ChildStdout, Command};
use tokio::task::JoinHandle;
use tracing::{debug, warn};

/// Longest stdout line accepted from the runtime
pub const MAX_BUFFER_SIZE: usize = 1024 * 1024;

/// Number of stderr lines kept for error reports
const STDERR_TAIL_LINES: usize = 20;

/// Executable name looked up on `PATH`
const CLI_NAME: &str = "claude";

/// Locate the runtime executable.
///
/// An explicit path wins; otherwise `PATH` is searched, then the usual
/// npm/yarn/local install locations.
pub fn find_cli(explicit: Option<&PathBuf>) -> Result<PathBuf> {
    if let Some(path) = explicit {
        if path.is_file() {
            return Ok(path.clone());
        }
        return Err(TransportError::CliNotFound {
            searched: path.display().to_string(),
        }
        .into());
    }

    if let Ok(path) = which::which(CLI_NAME) {
        return Ok(path);
    }

    let candidates = fallback_locations();
    for candidate in &candidates {
        if candidate.is_file() {
            debug!("Using runtime from fallback location {}", candidate.display());
            return Ok(candidate.clone());
        }
    }

    let mut searched = vec!["PATH".to_string()];
    searched.extend(candidates.iter().map(|p| p.display().to_string()));
    Err(TransportError::CliNotFound {
        searched: searched.join(", "),
    }
    .into())
}

fn fallback_locations() -> Vec<PathBuf> {
    let mut locations = vec![PathBuf::from("/usr/local/bin/claude")];
    if let Some(home) = dirs::home_dir() {
        locations.extend([
            home.join(".npm-global/bin/claude"),
            home.join(".local/bin/claude"),
            home.join("node_modules/.bin/claude"),
            home.join(".yarn/bin/claude"),
            home.join(".claude/local/claude"),
        ]);
    }
    locations
}

/// A running runtime process
pub struct SubprocessTransport {
    options: AgentOptions,
    child: Option<Child>,
    stdin: Option<ChildStdin>,
    stdout: Option<BufReader<ChildStdout>>,
    stderr_task: Option<JoinHandle<String>>,
}

impl SubprocessTransport {
    pub fn new(options: AgentOptions) -> Self {
        Self {
            options,
            child: None,
            stdin: None,
            stdout: None,
            stderr_task: None,
        }
    }

    /// Whether the process has been started and not yet closed
    pub fn is_connected(&self) -> bool {
        self.child.is_some()
    }

    /// Start the runtime process
    pub async fn connect(&mut self) -> Result<()> {
        if self.child.is_some() {
            return Ok(());
        }

        let cli_path = find_cli(self.options.cli_path.as_ref())?;
        let args = self.options.to_cli_args()?;
        debug!("Starting runtime: {} {}", cli_path.display(), args.join(" "));

        let mut cmd = Command::new(&cli_path);
        cmd.args(&args)
            .env("CLAUDE_CODE_ENTRYPOINT", "sdk-rs")
            .stdin(Stdio::piped())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .kill_on_drop(true);

        if let Some(cwd) = &self.options.cwd {
            cmd.current_dir(cwd);
        }

        for (key, value) in &self.options.env {
            cmd.env(key, value);
        }

        let mut child = cmd.spawn().map_err(|source| TransportError::Spawn {
            path: cli_path.clone(),
            source,
        })?;

        self.stdin = child.stdin.take();
        self.stdout = child.stdout.take().map(BufReader::new);
        self.stderr_task = child
            .stderr
            .take()
            .map(|stderr| tokio::spawn(drain_stderr(stderr, STDERR_TAIL_LINES)));
        self.child = Some(child);

        Ok(())
    }

    /// Send one JSON value as a line on the runtime's stdin
    pub async fn write_json(&mut self, value: &serde_json::Value) -> Result<()> {
        let stdin = self.stdin.as_mut().ok_or(TransportError::NotConnected)?;
        let mut line = serde_json::to_string(value)?;
        line.push('\n');
        stdin.write_all(line.as_bytes()).await?;
        stdin.flush().await?;
        Ok(())
    }

    /// Read the next consumable message; `Ok(None)` once stdout is closed
    pub async fn read_message(&mut self) -> Result<Option<Message>> {
        let stdout = self.stdout.as_mut().ok_or(TransportError::NotConnected)?;

        let mut buf = Vec::new();

        while read_bounded_line(stdout, &mut buf, MAX_BUFFER_SIZE).await? {
            let line = std::str::from_utf8(&buf).map_err(|e| TransportError::Decode {
                message: format!("invalid UTF-8 in runtime output: {}", e),
            })?;
            let line = line.trim();
            if line.is_empty() {
                continue;
            }

            let value: serde_json::Value =
                serde_json::from_str(line).map_err(|e| TransportError::Decode {
                    message: format!("{} in line: {}", e, truncate(line, 200)),
                })?;

            if let Some(message) = parse_message(value)? {
                return Ok(Some(message));
            }
        }

        Ok(None)
    }

    /// Close stdin and wait for the process to exit
    pub async fn close(&mut self) -> Result<()> {
        self.stdin.take();
        self.stdout.take();

        let Some(mut child) = self.child.take() else {
            return Ok(());
        };

        let status = child.wait().await?;
        let stderr = match self.stderr_task.take() {
            Some(task) => task.await.unwrap_or_default(),
            None => String::new(),
        };

        if !status.success() {
            let exit_code = status.code().unwrap_or(-1);
            warn!("Runtime exited with code {}", exit_code);
            return Err(TransportError::Process { exit_code, stderr }.into());
        }

        debug!("Runtime exited cleanly");
        Ok(())
    }
}

/// Read one `\n`-terminated line into `buf` (terminator excluded).
///
/// Returns `false` at end of input. Fails as soon as the line grows past
/// `limit` bytes, without buffering the rest of it.
async fn read_bounded_line<R>(reader: &mut R, buf: &mut Vec<u8>, limit: usize) -> Result<bool>
where
    R: AsyncBufRead + Unpin,
{
    buf.clear();
    loop {
        let available = reader.fill_buf().await?;
        if available.is_empty() {
            return Ok(!buf.is_empty());
        }

        let (chunk, found_newline) = match available.iter().position(|b| *b == b'\n') {
            Some(idx) => (&available[..idx], true),
            None => (available, false),
        };
        if buf.len() + chunk.len() > limit {
            return Err(TransportError::BufferOverflow { limit }.into());
        }
        buf.extend_from_slice(chunk);

        let consumed = chunk.len() + usize::from(found_newline);
        reader.consume(consumed);
        if found_newline {
            return Ok(true);
        }
    }
}

/// Log every stderr line at DEBUG and return the last `keep` lines
async fn drain_stderr<R>(stderr: R, keep: usize) -> String
where
    R: AsyncRead + Unpin,
{
    let mut tail = VecDeque::with_capacity(keep);
    let mut lines = BufReader::new(stderr).lines();
    while let Ok(Some(line)) = lines.next_line().await {
        debug!(target: "tda::runtime::stderr", "{}", line);
        if tail.len() == keep {
            tail.pop_front();
        }
        tail.push_back(line);
    }
    Vec::from(tail).join("\n")
}

fn truncate(text: &str, max_chars: usize) -> String {
    match text.char_indices().nth(max_chars) {
        Some((idx, _)) => format!("{}...", &text[..idx]),
        None => text.to_string(),
    }
}
