//! Report sinks.

use std::path::{Path, PathBuf};

use thiserror::Error;

use crate::batch::BatchReport;

#[derive(Error, Debug)]
pub enum ReportError {
    #[error("Failed to write report to {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to serialize report: {0}")]
    Json(#[from] serde_json::Error),
}

/// Accepts the finished batch report.
pub trait ReportSink {
    fn write(&self, report: &BatchReport) -> Result<(), ReportError>;
}

/// Writes the report as pretty-printed JSON, creating parent directories.
#[derive(Debug, Clone)]
pub struct JsonFileSink {
    path: PathBuf,
}

impl JsonFileSink {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn io_error(&self, source: std::io::Error) -> ReportError {
        ReportError::Io {
            path: self.path.clone(),
            source,
        }
    }
}

impl ReportSink for JsonFileSink {
    fn write(&self, report: &BatchReport) -> Result<(), ReportError> {
        let mut json = serde_json::to_string_pretty(report)?;
        json.push('\n');

        if let Some(parent) = self.path.parent().filter(|p| !p.as_os_str().is_empty()) {
            std::fs::create_dir_all(parent).map_err(|e| self.io_error(e))?;
        }
        std::fs::write(&self.path, json).map_err(|e| self.io_error(e))?;

        tracing::info!(path = %self.path.display(), results = report.total, "Report written");
        Ok(())
    }
}
