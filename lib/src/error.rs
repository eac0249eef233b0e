use polars::error::PolarsError;
use std::io::Error as IoError;

#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("Query error: {0}")]
    Query(#[from] PolarsError),

    #[error("IO error: {0}")]
    Io(#[from] IoError),

    #[error("Query has {placeholders} placeholder(s) but {supplied} parameter(s) were supplied")]
    ParameterCount { placeholders: usize, supplied: usize },
}
