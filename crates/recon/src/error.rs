use thiserror::Error;

use crate::model::Source;

/// Broad failure class, used by callers to pick an exit status.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorClass {
    /// A cross-record count or uniqueness invariant failed.
    Integrity,
    /// An expected column is missing from an input table.
    SchemaDrift,
    /// Pipeline config could not be parsed or is inconsistent.
    Config,
    /// Reading, decoding or parsing an input failed.
    Input,
}

#[derive(Debug, Error)]
pub enum ReconError {
    /// TOML parse / deserialization error.
    #[error("config parse error: {0}")]
    ConfigParse(String),

    /// Config validation error (empty file name, bad encoding label, etc.).
    #[error("config validation error: {0}")]
    ConfigValidation(String),

    #[error(
        "partition invariant failed for {dataset}: with_id ({with_id}) + without_id ({without_id}) != total ({total})"
    )]
    PartitionMismatch {
        dataset: Source,
        total: usize,
        with_id: usize,
        without_id: usize,
    },

    #[error(
        "dedup invariant failed for {dataset}: survivors ({survivors}) + without_id ({without_id}) + dropped ({dropped}) != total ({total})"
    )]
    DedupMismatch {
        dataset: Source,
        total: usize,
        survivors: usize,
        without_id: usize,
        dropped: usize,
    },

    /// The audit list must hold every dropped copy plus one survivor per group.
    #[error(
        "duplicate group invariant failed for {dataset}: all members ({dropped_all}) != dropped ({dropped}) + groups ({group_count})"
    )]
    DuplicateGroupMismatch {
        dataset: Source,
        dropped_all: usize,
        dropped: usize,
        group_count: usize,
    },

    /// A join input carried the same key more than once.
    #[error("join invariant failed: {side} input has identifier '{identifier}' {count} times")]
    DuplicateKey {
        side: &'static str,
        identifier: String,
        count: usize,
    },

    /// A record was handed to the wrong side of the pipeline.
    #[error("expected only {expected} records, found {found} {actual} record(s)")]
    SourceMismatch {
        expected: Source,
        actual: Source,
        found: usize,
    },

    /// Missing required column in an input table.
    #[error("table '{table}': missing column '{column}'")]
    MissingColumn { table: String, column: String },

    #[error("unknown source label '{0}'")]
    UnknownLabel(String),

    #[error("unknown text encoding '{0}'")]
    UnknownEncoding(String),

    #[error("CSV error in {path}: {message}")]
    Csv { path: String, message: String },

    #[error("IO error: {0}")]
    Io(String),
}

impl ReconError {
    pub fn class(&self) -> ErrorClass {
        match self {
            Self::PartitionMismatch { .. }
            | Self::DedupMismatch { .. }
            | Self::DuplicateGroupMismatch { .. }
            | Self::DuplicateKey { .. }
            | Self::SourceMismatch { .. } => ErrorClass::Integrity,
            Self::MissingColumn { .. } => ErrorClass::SchemaDrift,
            Self::ConfigParse(_) | Self::ConfigValidation(_) | Self::UnknownEncoding(_) => {
                ErrorClass::Config
            }
            Self::UnknownLabel(_) | Self::Csv { .. } | Self::Io(_) => ErrorClass::Input,
        }
    }
}
