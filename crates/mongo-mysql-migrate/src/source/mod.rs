//! Document sources.
//!
//! A source hands out one named batch at a time:
//!
//! - [`BsonDirSource`]: a `mongodump` directory of `<Batch>.bson` files
//! - [`MemorySource`]: batches held in memory
//!
//! A batch that does not exist is reported as [`BatchLoad::Missing`]; a batch
//! that cannot be decoded is logged and yields no documents. Neither aborts
//! the run.

mod dump;

pub use dump::{decode_batch, BsonDirSource};

use std::collections::HashMap;

use async_trait::async_trait;

use crate::document::Document;
use crate::error::Result;

/// Outcome of loading one batch.
#[derive(Debug, Clone, PartialEq)]
pub enum BatchLoad {
    /// The batch does not exist in the source.
    Missing,
    /// The decoded documents, in source order. Empty for corrupt batches.
    Loaded(Vec<Document>),
}

impl BatchLoad {
    /// Documents in the batch, empty when missing.
    pub fn into_documents(self) -> Vec<Document> {
        match self {
            BatchLoad::Missing => Vec::new(),
            BatchLoad::Loaded(docs) => docs,
        }
    }
}

/// Read named batches of source documents.
#[async_trait]
pub trait DocumentSource: Send + Sync {
    /// Load every document of `batch`.
    ///
    /// Errors are reserved for I/O failures on a batch that exists; a missing
    /// or undecodable batch is not an error.
    async fn load(&self, batch: &str) -> Result<BatchLoad>;

    /// Where the documents come from, for log lines.
    fn describe(&self) -> String;
}

/// In-memory document source.
#[derive(Debug, Clone, Default)]
pub struct MemorySource {
    batches: HashMap<String, Vec<Document>>,
}

impl MemorySource {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add (or replace) a batch.
    pub fn with_batch(mut self, name: impl Into<String>, docs: Vec<Document>) -> Self {
        self.batches.insert(name.into(), docs);
        self
    }

    /// Drop a batch so that it reads as missing.
    pub fn without_batch(mut self, name: &str) -> Self {
        self.batches.remove(name);
        self
    }
}

#[async_trait]
impl DocumentSource for MemorySource {
    async fn load(&self, batch: &str) -> Result<BatchLoad> {
        Ok(match self.batches.get(batch) {
            Some(docs) => BatchLoad::Loaded(docs.clone()),
            None => BatchLoad::Missing,
        })
    }

    fn describe(&self) -> String {
        format!("memory ({} batches)", self.batches.len())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_memory_source_missing_and_loaded() {
        let source = MemorySource::new().with_batch("User", vec![Document::new().with("a", 1)]);

        assert_eq!(source.load("Brand").await.unwrap(), BatchLoad::Missing);
        let docs = source.load("User").await.unwrap().into_documents();
        assert_eq!(docs.len(), 1);
    }

    #[tokio::test]
    async fn test_without_batch() {
        let source = MemorySource::new()
            .with_batch("User", Vec::new())
            .without_batch("User");
        assert_eq!(source.load("User").await.unwrap(), BatchLoad::Missing);
    }
}
