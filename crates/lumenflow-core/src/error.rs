pub type Result<T> = std::result::Result<T, Error>;

#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("Invalid rows document: {message}")]
    InvalidRows { message: String },

    #[error("Row index {index} out of bounds (have {len} rows)")]
    RowIndex { index: usize, len: usize },
}
