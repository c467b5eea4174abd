//! Error types for dictionary ingestion and lookup

use crate::ingestion::Corpus;

/// Result type for dictionary operations.
pub type Result<T> = std::result::Result<T, DictError>;

/// Errors raised by the store, the loader and the sources feeding it.
///
/// Lookups never surface these to subscribers; the query engine logs them and
/// leaves its state untouched. Loading stops at the first one, keeping every
/// batch committed before it.
#[derive(Debug, thiserror::Error)]
pub enum DictError {
    /// The corpus location could not be opened (bad path, non-2xx response)
    #[error("Corpus unavailable at {location}: {source}")]
    StreamUnavailable {
        location: String,
        #[source]
        source: Box<dyn std::error::Error + Send + Sync>,
    },

    /// The record stream failed partway through a corpus
    #[error("Failed to read {corpus} corpus: {source}")]
    Stream {
        corpus: Corpus,
        #[source]
        source: kamatama_stream::StreamError,
    },

    #[error("Database error: {source}")]
    Database {
        #[from]
        source: sqlx::Error,
    },

    /// A stored record could not be encoded or decoded
    #[error("Serialization error: {source}")]
    Serialization {
        #[from]
        source: serde_json::Error,
    },

    #[error("IO error: {source}")]
    Io {
        #[from]
        source: std::io::Error,
    },

    #[error("Invalid configuration: {message}")]
    InvalidConfig { message: String },
}

impl DictError {
    /// Create a source-unavailable error for `location`.
    pub fn unavailable<L, E>(location: L, source: E) -> Self
    where
        L: Into<String>,
        E: Into<Box<dyn std::error::Error + Send + Sync>>,
    {
        Self::StreamUnavailable {
            location: location.into(),
            source: source.into(),
        }
    }

    pub fn stream(corpus: Corpus, source: kamatama_stream::StreamError) -> Self {
        Self::Stream { corpus, source }
    }

    /// Create an invalid configuration error with a custom message.
    pub fn invalid_config<S: Into<String>>(message: S) -> Self {
        Self::InvalidConfig {
            message: message.into(),
        }
    }
}
