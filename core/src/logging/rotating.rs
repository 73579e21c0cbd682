//! Size-based log file rotation
//!
//! `tda.log` is written until the next record would push it past the size
//! limit; then `tda.log.N` becomes `tda.log.N+1` (the last backup is
//! dropped), `tda.log` becomes `tda.log.1`, and a fresh file is started.

use std::fs::{self, File, OpenOptions};
use std::io::{self, Write};
use std::path::{Path, PathBuf};

/// Default maximum size of the active log file
pub const DEFAULT_MAX_BYTES: u64 = 5 * 1024 * 1024;

/// Default number of rotated files kept
pub const DEFAULT_BACKUP_COUNT: usize = 3;

/// A log file that rotates by size
#[derive(Debug)]
pub struct RotatingFile {
    path: PathBuf,
    max_bytes: u64,
    backup_count: usize,
    file: File,
    written: u64,
}

impl RotatingFile {
    /// Open (or create) `path` for appending
    pub fn open(path: impl Into<PathBuf>, max_bytes: u64, backup_count: usize) -> io::Result<Self> {
        let path = path.into();
        if let Some(parent) = path.parent() {
            if !parent.as_os_str().is_empty() {
                fs::create_dir_all(parent)?;
            }
        }

        let file = open_append(&path)?;
        let written = file.metadata()?.len();

        Ok(Self {
            path,
            max_bytes,
            backup_count,
            file,
            written,
        })
    }

    /// Path of the active log file
    pub fn path(&self) -> &Path {
        &self.path
    }

    fn backup_path(&self, index: usize) -> PathBuf {
        let mut name = self.path.as_os_str().to_owned();
        name.push(format!(".{}", index));
        PathBuf::from(name)
    }

    fn rotate(&mut self) -> io::Result<()> {
        self.file.flush()?;

        if self.backup_count > 0 {
            for index in (1..self.backup_count).rev() {
                let from = self.backup_path(index);
                if from.exists() {
                    fs::rename(&from, self.backup_path(index + 1))?;
                }
            }
            fs::rename(&self.path, self.backup_path(1))?;
            self.file = open_append(&self.path)?;
        } else {
            self.file = OpenOptions::new()
                .write(true)
                .truncate(true)
                .create(true)
                .open(&self.path)?;
        }

        self.written = 0;
        Ok(())
    }
}

fn open_append(path: &Path) -> io::Result<File> {
    OpenOptions::new().create(true).append(true).open(path)
}

impl Write for RotatingFile {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        if self.max_bytes > 0 && self.written > 0 && self.written + buf.len() as u64 > self.max_bytes
        {
            self.rotate()?;
        }

        self.file.write_all(buf)?;
        self.written += buf.len() as u64;
        Ok(buf.len())
    }

    fn flush(&mut self) -> io::Result<()> {
        self.file.flush()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn read(path: &Path) -> String {
        fs::read_to_string(path).unwrap()
    }

    #[test]
    fn test_rotates_when_limit_would_be_exceeded() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("tda.log");
        let mut log = RotatingFile::open(&path, 10, 3).unwrap();

        log.write_all(b"aaaaaa\n").unwrap();
        log.write_all(b"bbbbbb\n").unwrap();

        assert_eq!(read(&path), "bbbbbb\n");
        assert_eq!(read(&dir.path().join("tda.log.1")), "aaaaaa\n");
    }

    #[test]
    fn test_keeps_at_most_backup_count_files() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("tda.log");
        let mut log = RotatingFile::open(&path, 4, 2).unwrap();

        for record in ["one\n", "two\n", "six\n", "ten\n"] {
            log.write_all(record.as_bytes()).unwrap();
        }

        assert_eq!(read(&path), "ten\n");
        assert_eq!(read(&dir.path().join("tda.log.1")), "six\n");
        assert_eq!(read(&dir.path().join("tda.log.2")), "two\n");
        assert!(!dir.path().join("tda.log.3").exists());
    }

    #[test]
    fn test_oversized_record_goes_to_empty_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("tda.log");
        let mut log = RotatingFile::open(&path, 4, 1).unwrap();

        log.write_all(b"a record longer than the limit\n").unwrap();

        assert_eq!(read(&path), "a record longer than the limit\n");
        assert!(!dir.path().join("tda.log.1").exists());
    }

    #[test]
    fn test_existing_size_counts_toward_limit() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("tda.log");
        fs::write(&path, "12345678").unwrap();

        let mut log = RotatingFile::open(&path, 10, 1).unwrap();
        log.write_all(b"abc\n").unwrap();

        assert_eq!(read(&path), "abc\n");
        assert_eq!(read(&dir.path().join("tda.log.1")), "12345678");
    }

    #[test]
    fn test_zero_backups_truncates_in_place() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("tda.log");
        let mut log = RotatingFile::open(&path, 5, 0).unwrap();

        log.write_all(b"old\n").unwrap();
        log.write_all(b"new\n").unwrap();

        assert_eq!(read(&path), "new\n");
        assert!(!dir.path().join("tda.log.1").exists());
    }

    #[test]
    fn test_creates_missing_parent_directory() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested").join("tda.log");

        let log = RotatingFile::open(&path, DEFAULT_MAX_BYTES, DEFAULT_BACKUP_COUNT).unwrap();
        assert_eq!(log.path(), path.as_path());
        assert!(path.exists());
    }
}
