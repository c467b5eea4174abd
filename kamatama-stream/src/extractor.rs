//! Incremental extraction of top-level JSON objects from a chunked byte stream.
//!
//! The corpus files are single JSON arrays far too large to hold in memory.
//! Rather than parsing the array, the extractor tracks just enough lexical
//! state to notice when a top-level `{ ... }` closes, and hands that exact byte
//! span to `serde_json`.
//!
//! ## Scanner state
//!
//! - **depth**: number of unclosed `{`
//! - **in_string** / **escaped**: whether braces are currently literal text
//! - **carry**: bytes of a record that opened in an earlier chunk
//!
//! Only the ASCII bytes `"`, `\`, `{` and `}` are significant. None of them can
//! appear inside a multi-byte UTF-8 sequence, so a chunk may end anywhere,
//! including in the middle of a character or right after a backslash.

use std::marker::PhantomData;

use futures::{Stream, StreamExt};
use serde::de::DeserializeOwned;
use tracing::{debug, warn};

use crate::error::{Result, StreamError};

/// How much of a failing record is echoed into the log.
const PREVIEW_BYTES: usize = 200;

/// Push-based scanner that turns byte chunks into batches of records.
///
/// Once [`push`](Self::push) or [`finish`](Self::finish) has returned an error
/// the extractor's state is unspecified and it should be dropped.
#[derive(Debug)]
pub struct RecordExtractor<T> {
    depth: usize,
    in_string: bool,
    escaped: bool,
    carry: Vec<u8>,
    /// Bytes consumed before the current chunk
    consumed: u64,
    /// Stream offset of the currently open record's `{`
    record_offset: u64,
    _record: PhantomData<fn() -> T>,
}

impl<T> Default for RecordExtractor<T> {
    fn default() -> Self {
        Self {
            depth: 0,
            in_string: false,
            escaped: false,
            carry: Vec::new(),
            consumed: 0,
            record_offset: 0,
            _record: PhantomData,
        }
    }
}

impl<T: DeserializeOwned> RecordExtractor<T> {
    pub fn new() -> Self {
        Self::default()
    }

    /// Scan one chunk and return every top-level record that closed inside it.
    ///
    /// A record still open at the end of the chunk is kept in the carry buffer
    /// and completed by later calls; it is never part of this batch.
    pub fn push(&mut self, chunk: &[u8]) -> Result<Vec<T>> {
        let mut batch = Vec::new();
        // Start of a record that opened inside this chunk
        let mut start: Option<usize> = None;

        for (i, &byte) in chunk.iter().enumerate() {
            if self.in_string {
                if self.escaped {
                    self.escaped = false;
                } else if byte == b'\\' {
                    self.escaped = true;
                } else if byte == b'"' {
                    self.in_string = false;
                }
                continue;
            }

            match byte {
                b'"' => self.in_string = true,
                b'{' => {
                    if self.depth == 0 {
                        start = Some(i);
                        self.record_offset = self.consumed + i as u64;
                    }
                    self.depth += 1;
                }
                b'}' if self.depth > 0 => {
                    self.depth -= 1;
                    if self.depth == 0 {
                        let record = match start.take() {
                            Some(begin) => self.parse(&chunk[begin..=i]),
                            None => {
                                let mut span = std::mem::take(&mut self.carry);
                                span.extend_from_slice(&chunk[..=i]);
                                self.parse(&span)
                            }
                        };
                        batch.push(record?);
                    }
                }
                _ => {}
            }
        }

        if self.depth > 0 {
            match start {
                Some(begin) => {
                    self.carry.clear();
                    self.carry.extend_from_slice(&chunk[begin..]);
                }
                None => self.carry.extend_from_slice(chunk),
            }
        }

        self.consumed += chunk.len() as u64;
        Ok(batch)
    }

    /// Signal the end of input. Fails if a record is still open.
    pub fn finish(&self) -> Result<()> {
        if self.depth > 0 {
            warn!(
                "Stream ended with an unterminated record at byte {}",
                self.record_offset
            );
            return Err(StreamError::Truncated {
                pending_bytes: self.carry.len(),
            });
        }
        Ok(())
    }

    /// Total bytes scanned so far.
    pub fn bytes_consumed(&self) -> u64 {
        self.consumed
    }

    fn parse(&self, span: &[u8]) -> Result<T> {
        serde_json::from_slice(span).map_err(|source| {
            let preview_len = span.len().min(PREVIEW_BYTES);
            warn!(
                "Unparseable record at byte {}: {} ({})",
                self.record_offset,
                String::from_utf8_lossy(&span[..preview_len]),
                source
            );
            StreamError::Parse {
                offset: self.record_offset,
                source,
            }
        })
    }
}

/// Adapt a byte-chunk stream into a stream of record batches.
///
/// Each non-empty input chunk produces exactly one batch (possibly empty), in
/// order. The first error is yielded as an `Err` item and ends the stream;
/// this includes errors from `chunks` itself and input that stops inside a
/// record.
pub fn extract_records<T, S, B, E>(chunks: S) -> impl Stream<Item = Result<Vec<T>>>
where
    T: DeserializeOwned,
    S: Stream<Item = std::result::Result<B, E>>,
    B: AsRef<[u8]>,
    E: Into<Box<dyn std::error::Error + Send + Sync>>,
{
    let initial = Some((Box::pin(chunks), RecordExtractor::<T>::new()));

    futures::stream::unfold(initial, |state| async move {
        let (mut chunks, mut extractor) = state?;
        loop {
            match chunks.next().await {
                Some(Ok(chunk)) => {
                    let chunk = chunk.as_ref();
                    if chunk.is_empty() {
                        continue;
                    }
                    return match extractor.push(chunk) {
                        Ok(batch) => {
                            debug!(
                                "Extracted {} records ({} bytes scanned)",
                                batch.len(),
                                extractor.bytes_consumed()
                            );
                            Some((Ok(batch), Some((chunks, extractor))))
                        }
                        Err(e) => Some((Err(e), None)),
                    };
                }
                Some(Err(e)) => return Some((Err(StreamError::read(e)), None)),
                None => {
                    return match extractor.finish() {
                        Ok(()) => None,
                        Err(e) => Some((Err(e), None)),
                    };
                }
            }
        }
    })
}
