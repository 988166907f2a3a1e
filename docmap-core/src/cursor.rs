//! Cursor adapter turning raw record streams into typed documents.
//!
//! A [`DocumentCursor`] wraps the backend's server-side cursor and feeds
//! each raw record through the materializer lazily. The sequence is
//! forward-only and non-restartable; transport faults are propagated as-is,
//! never suppressed or retried.

use std::marker::PhantomData;

use futures::StreamExt;

use crate::backend::RecordStream;
use crate::document::Document;
use crate::error::OdmResult;
use crate::materialize::materialize;

/// A lazy stream of materialized documents bound to one document type.
pub struct DocumentCursor<D: Document> {
    stream: RecordStream,
    _marker: PhantomData<D>,
}

impl<D: Document> DocumentCursor<D> {
    /// Wraps a raw record stream (internal use; obtained via
    /// [`QueryManager::raw_cursor`](crate::manager::QueryManager::raw_cursor)).
    pub fn new(stream: RecordStream) -> Self {
        Self {
            stream,
            _marker: PhantomData,
        }
    }

    /// Pulls and materializes the next document, or `None` when the
    /// underlying cursor is exhausted.
    pub async fn next(&mut self) -> OdmResult<Option<D>> {
        match self.stream.next().await {
            Some(record) => Ok(Some(materialize::<D>(&record?)?)),
            None => Ok(None),
        }
    }

    /// Pulls up to `max_count` documents (or all remaining when `None`),
    /// materializing each; equivalent to repeated [`next`](Self::next).
    pub async fn collect(mut self, max_count: Option<usize>) -> OdmResult<Vec<D>> {
        let mut documents = match max_count {
            Some(n) => Vec::with_capacity(n),
            None => Vec::new(),
        };

        while max_count.is_none_or(|n| documents.len() < n) {
            match self.next().await? {
                Some(document) => documents.push(document),
                None => break,
            }
        }

        Ok(documents)
    }
}
