use std::fmt;
use std::path::PathBuf;

use thiserror::Error;

pub type Result<T> = std::result::Result<T, Error>;

/// Where a command came from. `line` is 1-based.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Location {
    pub file: String,
    pub line: usize,
}

impl Location {
    pub fn new(file: impl Into<String>, line: usize) -> Self {
        Location {
            file: file.into(),
            line,
        }
    }
}

impl fmt::Display for Location {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.file.is_empty() {
            write!(f, "line {}", self.line)
        } else {
            write!(f, "{}.vm:{}", self.file, self.line)
        }
    }
}

#[derive(Error, Debug)]
pub enum Error {
    #[error("{at}: syntax error in `{text}`: {reason}")]
    Syntax {
        at: Location,
        text: String,
        reason: String,
    },

    #[error("{at}: `{keyword}` takes {expected} operand(s), found {found} in `{text}`")]
    InvalidArity {
        at: Location,
        keyword: String,
        expected: usize,
        found: usize,
        text: String,
    },

    #[error("{at}: unknown operator `{keyword}` in `{text}`")]
    UnknownOperator {
        at: Location,
        keyword: String,
        text: String,
    },

    #[error("{at}: unknown segment `{segment}` in `{text}`")]
    UnknownSegment {
        at: Location,
        segment: String,
        text: String,
    },

    #[error("{at}: index {index} out of range for segment {segment} (max: {max}) in `{text}`")]
    IndexOutOfRange {
        at: Location,
        segment: &'static str,
        index: u16,
        max: u16,
        text: String,
    },

    #[error("{at}: {what} {count} out of range (max: {max}) in `{text}`")]
    CountOutOfRange {
        at: Location,
        what: &'static str,
        count: u16,
        max: u16,
        text: String,
    },

    #[error("{at}: `{name}` is reserved for generated labels ({reason}) in `{text}`")]
    ReservedName {
        at: Location,
        name: String,
        reason: &'static str,
        text: String,
    },

    #[error("line {line}: no source file bound before translating `{text}`")]
    MissingContext { line: usize, text: String },

    #[error("internal invariant violated: {0}")]
    InvariantViolation(String),

    #[error("{}: {source}", .path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

impl Error {
    /// The input position the error refers to, if any.
    pub fn location(&self) -> Option<&Location> {
        match self {
            Error::Syntax { at, .. }
            | Error::InvalidArity { at, .. }
            | Error::UnknownOperator { at, .. }
            | Error::UnknownSegment { at, .. }
            | Error::IndexOutOfRange { at, .. }
            | Error::CountOutOfRange { at, .. }
            | Error::ReservedName { at, .. } => Some(at),
            _ => None,
        }
    }
}
