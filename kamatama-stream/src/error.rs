//! Error types for record extraction

/// Result type for extraction operations.
pub type Result<T> = std::result::Result<T, StreamError>;

/// Failures that end a record stream.
///
/// Every variant is terminal: once an error has been yielded the stream
/// produces nothing further. Batches yielded before the error remain valid.
#[derive(Debug, thiserror::Error)]
pub enum StreamError {
    /// A closed top-level object could not be deserialized.
    #[error("Failed to parse record at byte offset {offset}: {source}")]
    Parse {
        /// Offset of the record's opening brace from the start of the stream
        offset: u64,
        #[source]
        source: serde_json::Error,
    },

    /// The underlying byte stream reported an error.
    #[error("Failed to read from stream: {source}")]
    Read {
        #[source]
        source: Box<dyn std::error::Error + Send + Sync>,
    },

    /// The byte stream ended while a top-level object was still open.
    #[error("Stream ended inside a record ({pending_bytes} bytes unterminated)")]
    Truncated { pending_bytes: usize },
}

impl StreamError {
    /// Wrap an error raised by the byte source.
    pub fn read<E>(source: E) -> Self
    where
        E: Into<Box<dyn std::error::Error + Send + Sync>>,
    {
        Self::Read {
            source: source.into(),
        }
    }
}
