//! kamatama-stream: pull top-level JSON records out of an unbounded byte stream.
//!
//! The dictionary corpora are shipped as one huge JSON array each. This crate
//! turns a forward-only stream of byte chunks (an HTTP body, a file read in
//! blocks) into a stream of *batches*: one batch per chunk, holding every
//! record that finished inside that chunk.
//!
//! ```rust,no_run
//! use futures::StreamExt;
//! use kamatama_stream::extract_records;
//!
//! # async fn example() -> Result<(), kamatama_stream::StreamError> {
//! let chunks = futures::stream::iter(vec![
//!     Ok::<_, std::io::Error>(br#"[{"a":1},{"a""#.to_vec()),
//!     Ok(br#":2}]"#.to_vec()),
//! ]);
//! let mut batches = Box::pin(extract_records::<serde_json::Value, _, _, _>(chunks));
//! while let Some(batch) = batches.next().await {
//!     println!("{} records", batch?.len());
//! }
//! # Ok(())
//! # }
//! ```

pub mod error;
pub mod extractor;

pub use error::{Result, StreamError};
pub use extractor::{RecordExtractor, extract_records};
