use std::path::PathBuf;

use serde::Serialize;
use thiserror::Error;

use crate::core::types::Side;

#[derive(Error, Debug)]
pub enum Error {
    #[error("{side} index unavailable ({}): {source}", path.display())]
    IndexUnavailable {
        side: Side,
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Alignment file unavailable ({}): {source}", path.display())]
    AlignmentUnavailable {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Malformed alignment record on line {line}: {reason}")]
    MalformedRecord { line: usize, reason: String },

    #[error("Malformed index {} on line {line}: {reason}", path.display())]
    MalformedIndex {
        path: PathBuf,
        line: usize,
        reason: String,
    },

    #[error("Contig '{0}' has no sequence")]
    EmptyContig(String),

    #[error("Unknown contig '{0}'")]
    UnknownContig(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("FASTA error: {0}")]
    Fasta(String),

    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    #[error("Summary computation failed: {0}")]
    SummaryFailed(String),

    #[error("Summary computation still running after {attempts} polls")]
    SummaryBusy { attempts: u32 },
}

pub type Result<T, E = Error> = std::result::Result<T, E>;

/// Stable, machine-readable error category reported to callers
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ErrorKind {
    IndexUnavailable,
    AlignmentUnavailable,
    MalformedRecord,
    MalformedIndex,
    EmptyContig,
    UnknownContig,
    Io,
    InvalidConfig,
    SummaryFailed,
    SummaryBusy,
}

/// Structured (kind, message) form of an [`Error`]
#[derive(Debug, Clone, Serialize)]
pub struct ErrorReport {
    pub kind: ErrorKind,
    pub message: String,
}

impl Error {
    #[must_use]
    pub fn kind(&self) -> ErrorKind {
        match self {
            Self::IndexUnavailable { .. } => ErrorKind::IndexUnavailable,
            Self::AlignmentUnavailable { .. } => ErrorKind::AlignmentUnavailable,
            Self::MalformedRecord { .. } => ErrorKind::MalformedRecord,
            Self::MalformedIndex { .. } => ErrorKind::MalformedIndex,
            Self::EmptyContig(_) => ErrorKind::EmptyContig,
            Self::UnknownContig(_) => ErrorKind::UnknownContig,
            Self::Io(_) | Self::Json(_) | Self::Fasta(_) => ErrorKind::Io,
            Self::InvalidConfig(_) => ErrorKind::InvalidConfig,
            Self::SummaryFailed(_) => ErrorKind::SummaryFailed,
            Self::SummaryBusy { .. } => ErrorKind::SummaryBusy,
        }
    }

    #[must_use]
    pub fn report(&self) -> ErrorReport {
        ErrorReport {
            kind: self.kind(),
            message: self.to_string(),
        }
    }

    pub(crate) fn malformed(line: usize, reason: impl Into<String>) -> Self {
        Self::MalformedRecord {
            line,
            reason: reason.into(),
        }
    }
}
