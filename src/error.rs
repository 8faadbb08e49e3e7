use std::path::PathBuf;

use thiserror::Error;

#[derive(Error, Debug)]
pub enum SeedError {
    #[error("failed to read document {path:?}")]
    DocumentLoad {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to seed section \"{title}\" (id: {id})")]
    StorageWrite {
        title: String,
        id: String,
        #[source]
        source: StoreError,
    },
}

#[derive(Error, Debug)]
pub enum StoreError {
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("Firestore returned {status}: {body}")]
    Status {
        status: reqwest::StatusCode,
        body: String,
    },

    #[error("SQLite error: {0}")]
    Sqlite(#[from] rusqlite::Error),

    #[error("Encoding error: {0}")]
    Encode(#[from] serde_json::Error),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("title {0:?} has no characters usable in a document id")]
    InvalidId(String),
}
