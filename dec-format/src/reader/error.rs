use std::io;

#[cfg(doc)]
use crate::BlockFile;
#[cfg(doc)]
use crate::PartitionFile;

/// The errors that can be encountered when parsing a [`BlockFile`] or a [`PartitionFile`].
#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("failed to read from source: {0}")]
    IoError(#[from] io::Error),

    #[error("failed to parse line {line_nr} at '{token}' {span:?}: {reason}")]
    ParseError {
        line_nr: usize,
        token: String,
        reason: String,
        span: (usize, usize),
    },
}

impl Error {
    /// The line on which parsing failed, [`None`] for IO errors.
    pub fn line_nr(&self) -> Option<usize> {
        match self {
            Error::IoError(_) => None,
            Error::ParseError { line_nr, .. } => Some(*line_nr),
        }
    }
}
