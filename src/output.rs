//! Lazily opened output targets.
//!
//! Both retrievers defer file creation to the first genuine write so that a
//! query with no data leaves no file behind and the before-export hook only
//! observes exports that actually produce output. The lifecycle is a
//! tri-state guarded by a single transition at the first write attempt.

use std::path::{Path, PathBuf};

use tokio::io::AsyncWriteExt;

use crate::config::ExportConfig;
use crate::error::{Error, ErrorKind, Result};

/// Lifecycle of a lazily created output file.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum OutputState {
    NotOpened,
    Opened,
    Closed,
}

/// Lazily created CSV file with a fixed header.
///
/// The header is written once, at open, from the requested field list;
/// every row written afterwards has exactly that many columns.
pub struct CsvOutput<'a> {
    config: &'a ExportConfig,
    object: &'a str,
    path: PathBuf,
    header: Vec<String>,
    state: OutputState,
    writer: Option<csv::Writer<std::fs::File>>,
}

impl<'a> CsvOutput<'a> {
    /// Describe an output target without creating anything on disk.
    pub fn new(
        config: &'a ExportConfig,
        object: &'a str,
        path: impl Into<PathBuf>,
        header: &[String],
    ) -> Self {
        Self {
            config,
            object,
            path: path.into(),
            header: header.to_vec(),
            state: OutputState::NotOpened,
            writer: None,
        }
    }

    /// Hand back the CSV writer, opening the file on the first call.
    ///
    /// The first call creates the parent directory, fires the before-export
    /// hook, creates the file and writes the header row.
    pub fn writer(&mut self) -> Result<&mut csv::Writer<std::fs::File>> {
        if self.state == OutputState::Closed {
            return Err(Error::new(ErrorKind::Io(format!(
                "output {} already closed",
                self.path.display()
            ))));
        }
        if self.state == OutputState::NotOpened {
            if let Some(parent) = self.path.parent() {
                self.config.ensure_dir(parent)?;
            }
            self.config.notify_before_export(self.object, &self.path);
            let file = std::fs::File::create(&self.path)?;
            let mut writer = csv::Writer::from_writer(file);
            writer.write_record(&self.header)?;
            self.writer = Some(writer);
            self.state = OutputState::Opened;
        }
        self.writer
            .as_mut()
            .ok_or_else(|| Error::new(ErrorKind::Io("CSV writer missing".into())))
    }

    /// Flush and close the file if it was opened.
    ///
    /// Closing is one-way regardless of whether anything was written: a
    /// later [`Self::writer`] call fails instead of creating the file.
    pub fn close(&mut self) -> Result<()> {
        self.state = OutputState::Closed;
        if let Some(mut writer) = self.writer.take() {
            writer.flush()?;
        }
        Ok(())
    }
}

/// Lazily created raw byte file, used for streamed bulk result parts.
pub struct ByteOutput<'a> {
    config: &'a ExportConfig,
    object: &'a str,
    path: PathBuf,
    state: OutputState,
    file: Option<tokio::fs::File>,
}

impl<'a> ByteOutput<'a> {
    /// Describe an output target without creating anything on disk.
    pub fn new(config: &'a ExportConfig, object: &'a str, path: impl Into<PathBuf>) -> Self {
        Self {
            config,
            object,
            path: path.into(),
            state: OutputState::NotOpened,
            file: None,
        }
    }

    /// Hand back the file, creating it and firing the hook on the first call.
    pub async fn file(&mut self) -> Result<&mut tokio::fs::File> {
        if self.state == OutputState::Closed {
            return Err(Error::new(ErrorKind::Io(format!(
                "output {} already closed",
                self.path.display()
            ))));
        }
        if self.state == OutputState::NotOpened {
            if let Some(parent) = self.path.parent() {
                self.config.ensure_dir(parent)?;
            }
            self.config.notify_before_export(self.object, &self.path);
            let file = tokio::fs::File::create(&self.path).await?;
            self.file = Some(file);
            self.state = OutputState::Opened;
        }
        self.file
            .as_mut()
            .ok_or_else(|| Error::new(ErrorKind::Io("output file missing".into())))
    }

    /// Flush and close the file if it was opened.
    ///
    /// Closing is one-way regardless of whether anything was written: a
    /// later [`Self::file`] call fails instead of creating the file.
    pub async fn close(&mut self) -> Result<()> {
        self.state = OutputState::Closed;
        if let Some(mut file) = self.file.take() {
            file.flush().await?;
        }
        Ok(())
    }
}
