use std::fmt::Display;

use blocksplit::decomposition::DecFileError;
use blocksplit::files::reader;
use thiserror::Error;

use crate::model_file::ModelFileError;

pub(crate) type BlocksplitResult<T> = Result<T, BlocksplitError>;

#[derive(Error, Debug)]
pub(crate) enum BlocksplitError {
    #[error("IO error, more details: {0}")]
    IOError(#[from] std::io::Error),
    #[error("The file {0} is not supported.")]
    InvalidInstanceFile(String),
    #[error("The model file was invalid, more details: {0}")]
    ModelFile(#[from] ModelFileError),
    #[error("The block file could not be applied, more details: {0}")]
    DecFile(#[from] DecFileError),
    #[error("The partition file {path} was invalid, more details: {source}")]
    PartitionFile {
        path: String,
        source: reader::Error,
    },
    #[error("The block file {path} was invalid, more details: {source}")]
    BlockFile {
        path: String,
        source: reader::Error,
    },
}

impl BlocksplitError {
    pub(crate) fn invalid_instance(path: impl Display) -> Self {
        Self::InvalidInstanceFile(format!("{path}"))
    }
}
