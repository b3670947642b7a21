//! Append-only per-run log sink.
//!
//! Every external invocation's command line and output streams are written here. The sink is
//! owned by the caller and passed explicitly (through [`crate::RunContext`]); there is no
//! process-wide log file.

use crate::{SegError, SegResult};
use chrono::Local;
use std::fs::{File, OpenOptions};
use std::io::Write;
use std::path::{Path, PathBuf};
use std::process::Stdio;

const TIMESTAMP_FORMAT: &str = "%Y-%m-%d %H:%M:%S";

/// Append-only text log for one pipeline run.
#[derive(Debug)]
pub struct LogFile {
    path: PathBuf,
    file: File,
}

impl LogFile {
    /// Opens `path` for appending, creating it if absent.
    ///
    /// # Errors
    ///
    /// Returns `SegError::LogOpen` if the file cannot be opened.
    pub fn open(path: &Path) -> SegResult<Self> {
        let file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(path)
            .map_err(|source| SegError::LogOpen {
                path: path.to_path_buf(),
                source,
            })?;

        Ok(Self {
            path: path.to_path_buf(),
            file,
        })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Writes one timestamped line.
    pub fn log(&self, message: &str) -> SegResult<()> {
        let stamp = Local::now().format(TIMESTAMP_FORMAT);
        let mut file = &self.file;
        writeln!(file, "[{}] {}", stamp, message).map_err(SegError::LogWrite)
    }

    /// A handle on the log file for a child's stdout or stderr.
    ///
    /// The handle shares the append-mode descriptor, so child output lands in the log as it is
    /// written, in the order the child writes it.
    pub fn stdio(&self) -> SegResult<Stdio> {
        self.file
            .try_clone()
            .map(Stdio::from)
            .map_err(SegError::LogWrite)
    }
}
