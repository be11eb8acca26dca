//! Incremental reading of lines appended to a file.

use std::io::SeekFrom;
use std::path::{Path, PathBuf};

use tokio::io::{AsyncReadExt, AsyncSeekExt};

use crate::error::AgentError;

/// Reads complete lines appended to a file since the last call.
///
/// Tracks a byte offset into the file. A trailing line without its newline
/// is held back until the newline arrives. If the file shrinks below the
/// offset (truncation or rotation in place), reading restarts at the top.
#[derive(Debug)]
pub struct LineTailer {
    path: PathBuf,
    offset: u64,
    pending: Vec<u8>,
}

impl LineTailer {
    /// Opens a tailer on `path`.
    ///
    /// With `from_start` unset, existing content is skipped and only lines
    /// written afterwards are reported. A file that does not exist yet is
    /// treated as empty.
    pub async fn open(path: impl Into<PathBuf>, from_start: bool) -> Result<Self, AgentError> {
        let path = path.into();
        let offset = if from_start {
            0
        } else {
            current_len(&path).await?.unwrap_or(0)
        };
        tracing::debug!(path = %path.display(), offset, "opened tailer");
        Ok(Self {
            path,
            offset,
            pending: Vec::new(),
        })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn offset(&self) -> u64 {
        self.offset
    }

    /// Returns every complete line appended since the previous call, without
    /// line terminators. Invalid UTF-8 is replaced rather than rejected.
    pub async fn read_new_lines(&mut self) -> Result<Vec<String>, AgentError> {
        let Some(len) = current_len(&self.path).await? else {
            return Ok(Vec::new());
        };

        if len < self.offset {
            tracing::info!(
                path = %self.path.display(),
                previous_offset = self.offset,
                len,
                "file truncated; restarting from the beginning"
            );
            self.offset = 0;
            self.pending.clear();
        }
        if len == self.offset {
            return Ok(Vec::new());
        }

        let mut file = tokio::fs::File::open(&self.path)
            .await
            .map_err(|e| self.io_error(e))?;
        file.seek(SeekFrom::Start(self.offset))
            .await
            .map_err(|e| self.io_error(e))?;
        let mut buf = Vec::new();
        let read = file
            .read_to_end(&mut buf)
            .await
            .map_err(|e| self.io_error(e))?;
        self.offset += read as u64;
        self.pending.extend_from_slice(&buf);

        Ok(self.take_complete_lines())
    }

    fn take_complete_lines(&mut self) -> Vec<String> {
        let Some(last_newline) = self.pending.iter().rposition(|b| *b == b'\n') else {
            return Vec::new();
        };
        let rest = self.pending.split_off(last_newline + 1);
        let complete = std::mem::replace(&mut self.pending, rest);

        complete[..last_newline]
            .split(|b| *b == b'\n')
            .map(|line| {
                let line = line.strip_suffix(b"\r").unwrap_or(line);
                String::from_utf8_lossy(line).into_owned()
            })
            .collect()
    }

    fn io_error(&self, source: std::io::Error) -> AgentError {
        AgentError::Io {
            path: self.path.clone(),
            source,
        }
    }
}

/// Current length of the file, or `None` if it does not exist.
async fn current_len(path: &Path) -> Result<Option<u64>, AgentError> {
    match tokio::fs::metadata(path).await {
        Ok(meta) => Ok(Some(meta.len())),
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(None),
        Err(source) => Err(AgentError::Io {
            path: path.to_path_buf(),
            source,
        }),
    }
}
