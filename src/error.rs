/**
 * Error types for log parsing and value decoding
 */

use thiserror::Error;

/// Everything that can go wrong while turning an export line into typed data.
///
/// `EmptyValue` is not a failure from the caller's point of view: decoders map
/// it to `None`. The wrapper variants (`Frame`, `TimestampFormatHint`, `Line`)
/// only add context; use [`ParseError::root`] to reach the underlying cause.
#[derive(Debug, Error)]
pub enum ParseError {
    #[error("value is not provided")]
    EmptyValue,

    #[error("malformed {field} value `{value}`")]
    MalformedValue { field: &'static str, value: String },

    #[error("unknown {kind} value `{value}`")]
    UnknownValue { kind: &'static str, value: String },

    #[error("{0}")]
    Structural(String),

    #[error("frame line contains no data")]
    EmptyFrame,

    #[error("error parsing timestamp `{value}`: {source}")]
    Timestamp {
        value: String,
        #[source]
        source: chrono::ParseError,
    },

    #[error("timestamp `{0}` does not exist in the configured timezone")]
    NonexistentLocalTime(String),

    #[error("error parsing frame; frameNo={number}")]
    Frame {
        number: i64,
        #[source]
        source: Box<ParseError>,
    },

    #[error("possible solution: consider using `--timestamp-format` to specify proper format for timestamps")]
    TimestampFormatHint {
        #[source]
        source: Box<ParseError>,
    },

    #[error("line {line}")]
    Line {
        line: usize,
        #[source]
        source: Box<ParseError>,
    },

    #[error("error reading input: {0}")]
    Io(#[from] std::io::Error),
}

impl ParseError {
    pub(crate) fn in_frame(self, number: i64) -> Self {
        ParseError::Frame {
            number,
            source: Box::new(self),
        }
    }

    pub(crate) fn at_line(self, line: usize) -> Self {
        ParseError::Line {
            line,
            source: Box::new(self),
        }
    }

    /// Innermost error with all context wrappers removed
    pub fn root(&self) -> &ParseError {
        match self {
            ParseError::Frame { source, .. }
            | ParseError::TimestampFormatHint { source }
            | ParseError::Line { source, .. } => source.root(),
            other => other,
        }
    }

    /// Frame number attached to this error, if it was raised while decoding a frame
    pub fn frame_number(&self) -> Option<i64> {
        match self {
            ParseError::Frame { number, .. } => Some(*number),
            ParseError::TimestampFormatHint { source } | ParseError::Line { source, .. } => {
                source.frame_number()
            }
            _ => None,
        }
    }
}
