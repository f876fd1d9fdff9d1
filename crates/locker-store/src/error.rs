use thiserror::Error;

/// Errors produced by the store layer.
#[derive(Error, Debug)]
pub enum StoreError {
    /// MongoDB driver error (connection, command, cursor).
    #[error("Database error: {0}")]
    Mongo(#[from] mongodb::error::Error),

    /// A document could not be converted to BSON.
    #[error("Serialization error: {0}")]
    Serialize(#[from] bson::ser::Error),

    /// A unique index rejected the write.
    #[error("Duplicate key: {0}")]
    DuplicateKey(String),

    /// The server acknowledged an insert but returned a non-ObjectId `_id`.
    #[error("Unexpected inserted id: {0}")]
    UnexpectedId(String),
}

/// Convenience alias used throughout the crate.
pub type Result<T> = std::result::Result<T, StoreError>;
