//! Error types for the song build pipeline
//!
//! Each stage owns a small error enum. Parse, concatenation and analysis
//! errors are fatal for the song being processed; `TimingError` is only ever
//! reported as a warning next to degraded timing output. `SongError` wraps
//! all of them together with the file path that caused the failure.

use std::path::PathBuf;

use thiserror::Error;

/// A malformed line in a `.nwctxt` file
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("line {line_number}: {reason}")]
pub struct ParseError {
    /// 1-based line number in the source text
    pub line_number: usize,
    /// What was wrong with the line
    pub reason: String,
}

impl ParseError {
    pub fn new(line_number: usize, reason: impl Into<String>) -> Self {
        Self {
            line_number,
            reason: reason.into(),
        }
    }
}

/// Section concatenation failures
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ConcatError {
    /// The sequence produced no sections at all
    #[error("no sections to concatenate")]
    NoSections,

    /// A section disagrees with the first section on staff order
    #[error(
        "section `{section}` (position {position}) has staves [{}], expected [{}]",
        .found.join(", "),
        .expected.join(", ")
    )]
    StaffOrderMismatch {
        section: String,
        position: usize,
        expected: Vec<String>,
        found: Vec<String>,
    },
}

/// Measure analysis failures
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum AnalysisError {
    /// The lyrics or rhythm staff is not present in the document
    #[error("required staff `{staff}` not found (available: {})", .available.join(", "))]
    MissingRequiredStaff { staff: String, available: Vec<String> },

    /// A staff places the song-start marker in a different measure than the
    /// rhythm staff
    #[error(
        "staff `{staff}` marks the song start in segment {found}, rhythm staff `{rhythm_staff}` {}",
        match .expected {
            Some(segment) => format!("marks it in segment {segment}"),
            None => "has no song-start marker".to_string(),
        }
    )]
    ConflictingSongStart {
        staff: String,
        rhythm_staff: String,
        expected: Option<u32>,
        found: u32,
    },
}

/// Non-fatal timing problems
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum TimingError {
    /// No tempo or no time signature anywhere in the document
    #[error("document has no {missing}; label timestamps degrade to zero")]
    MissingTempoOrTimeSignature { missing: &'static str },
}

/// Solo export failures
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum AudioError {
    /// The requested staff does not exist
    #[error("staff `{staff}` not found (available: {})", .available.join(", "))]
    UnknownStaff { staff: String, available: Vec<String> },

    /// The external renderer reported a failure
    #[error("audio renderer failed for staff `{staff}`: {reason}")]
    Renderer { staff: String, reason: String },
}

/// Structure template and lyrics document substitution failures
#[derive(Debug, Error)]
pub enum TemplateError {
    #[error("template rendering failed: {0}")]
    Mustache(#[from] mustache::Error),

    #[error("tempo must be an integer >= 10, got {0}")]
    InvalidTempo(u32),

    #[error("time signature must look like `int/int`, got `{0}`")]
    InvalidTimeSignature(String),
}

/// Top-level error for one song run
#[derive(Debug, Error)]
pub enum SongError {
    #[error("{}: {source}", .path.display())]
    Parse {
        path: PathBuf,
        #[source]
        source: ParseError,
    },

    #[error("failed to read or write {}: {source}", .path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("invalid sequence file {}: {reason}", .path.display())]
    Sequence { path: PathBuf, reason: String },

    #[error("invalid configuration in {}: {source}", .path.display())]
    Config {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },

    #[error(transparent)]
    Concat(#[from] ConcatError),

    #[error(transparent)]
    Analysis(#[from] AnalysisError),

    #[error(transparent)]
    Audio(#[from] AudioError),

    #[error(transparent)]
    Template(#[from] TemplateError),
}

impl SongError {
    pub(crate) fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        SongError::Io {
            path: path.into(),
            source,
        }
    }

    pub(crate) fn config(path: impl Into<PathBuf>, source: serde_json::Error) -> Self {
        SongError::Config {
            path: path.into(),
            source,
        }
    }
}

pub type Result<T> = std::result::Result<T, SongError>;
