use thiserror::Error;

#[derive(Debug, Error)]
pub enum PuzzleError {
    #[error("puzzle document could not be parsed: {0}")]
    Document(String),
    #[error("puzzle catalog unavailable: {0}")]
    Catalog(String),
    #[error("storage unavailable: {0}")]
    Storage(String),
    #[error("stored data is malformed: {0}")]
    Serialization(#[from] serde_json::Error),
}

pub type PuzzleResult<T> = Result<T, PuzzleError>;
