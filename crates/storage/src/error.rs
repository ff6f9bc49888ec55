#[derive(Debug, thiserror::Error)]
pub enum ObjectStoreError {
    #[error("Invalid object key '{0}'")]
    InvalidKey(String),

    #[error("Object store I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Object store backend error: {0}")]
    Backend(String),
}
