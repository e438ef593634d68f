//! Append-only file destination
//!
//! The file is exclusively locked for as long as the destination is open,
//! so two sinks can never interleave lines in the same file.

use crate::core::{Destination, LoggerError, Result};
use async_trait::async_trait;
use fs2::FileExt;
use std::fs::OpenOptions;
use std::path::{Path, PathBuf};
use tokio::fs::File;
use tokio::io::{AsyncWriteExt, BufWriter};

pub struct FileDestination {
    writer: Option<BufWriter<File>>,
    path: PathBuf,
    name: String,
}

impl FileDestination {
    /// Default buffer size (64 KB)
    pub const DEFAULT_BUFFER_SIZE: usize = 64 * 1024;

    /// Open (creating if needed) and lock `path` for appending
    ///
    /// # Errors
    ///
    /// Returns [`LoggerError::FileLockError`] if another destination holds
    /// the file, or an I/O error if it cannot be opened.
    pub fn open(path: impl AsRef<Path>) -> Result<Self> {
        Self::with_buffer_size(path, Self::DEFAULT_BUFFER_SIZE)
    }

    pub fn with_buffer_size(path: impl AsRef<Path>, buffer_size: usize) -> Result<Self> {
        let path = path.as_ref().to_path_buf();

        if let Some(parent) = path.parent() {
            if !parent.as_os_str().is_empty() {
                std::fs::create_dir_all(parent).map_err(|e| {
                    LoggerError::io_operation("creating log directory", parent.display().to_string(), e)
                })?;
            }
        }

        let file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(&path)
            .map_err(|e| LoggerError::io_operation("opening log file", path.display().to_string(), e))?;

        file.try_lock_exclusive()
            .map_err(|_| LoggerError::file_lock(path.display().to_string()))?;

        Ok(Self {
            writer: Some(BufWriter::with_capacity(buffer_size, File::from_std(file))),
            name: format!("file:{}", path.display()),
            path,
        })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn writer(&mut self) -> Result<&mut BufWriter<File>> {
        self.writer
            .as_mut()
            .ok_or_else(|| LoggerError::sink_closed(self.name.clone()))
    }
}

#[async_trait]
impl Destination for FileDestination {
    async fn write_line(&mut self, line: &str) -> Result<()> {
        let writer = self.writer()?;
        writer.write_all(line.as_bytes()).await?;
        writer.write_all(b"\n").await?;
        Ok(())
    }

    async fn flush(&mut self) -> Result<()> {
        match self.writer.as_mut() {
            Some(writer) => writer.flush().await.map_err(LoggerError::from),
            None => Ok(()),
        }
    }

    async fn close(&mut self) -> Result<()> {
        let Some(mut writer) = self.writer.take() else {
            return Ok(());
        };
        writer.flush().await?;

        let file = writer.into_inner().into_std().await;
        file.sync_all()
            .map_err(|e| LoggerError::io_operation("syncing log file", self.path.display().to_string(), e))?;
        FileExt::unlock(&file)?;
        Ok(())
    }

    fn name(&self) -> &str {
        &self.name
    }
}
