//! Fake runtime executables for tests

use std::os::unix::fs::PermissionsExt;
use std::path::{Path, PathBuf};

/// Write an executable shell script named `claude` into `dir`
pub fn script(dir: &Path, body: &str) -> PathBuf {
    let path = dir.join("claude");
    std::fs::write(&path, format!("#!/bin/sh\n{}", body)).unwrap();
    std::fs::set_permissions(&path, std::fs::Permissions::from_mode(0o755)).unwrap();
    path
}

/// A runtime that records the first stdin line to `stdin.jsonl` and then
/// prints `lines` as its stream-json output
pub fn fake_runtime(dir: &Path, lines: &[&str]) -> PathBuf {
    runtime_exiting(dir, lines, 0)
}

/// Like [`fake_runtime`], but exits with `code` after printing
pub fn runtime_exiting(dir: &Path, lines: &[&str], code: i32) -> PathBuf {
    let body = format!(
        "read -r line\nprintf '%s\\n' \"$line\" > '{}'\ncat <<'EOF'\n{}\nEOF\nexit {}\n",
        dir.join("stdin.jsonl").display(),
        lines.join("\n"),
        code
    );
    script(dir, &body)
}
