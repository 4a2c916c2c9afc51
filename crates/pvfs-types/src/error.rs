//! Errors that can arise purely from manipulating data-model values
//! (parsing, validation) — no I/O.

use thiserror::Error;

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum PvfsTypeError {
    #[error("path segment exceeds the maximum length of {max} bytes")]
    SegmentTooLong { max: usize },

    #[error("path segment contains an embedded slash")]
    SegmentHasSlash,

    #[error("path is empty")]
    EmptyPath,

    #[error("path does not start with a leading slash")]
    NoLeadingSlash,

    #[error("path traverses above root")]
    PathAboveRoot,

    #[error("directory entry name exceeds the maximum length of {max} bytes")]
    NameTooLong { max: usize },

    #[error("invalid distribution parameter: {0}")]
    InvalidDistributionParam(String),

    #[error("invalid tab file line: {0}")]
    InvalidTabLine(String),
}
