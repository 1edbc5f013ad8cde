//! `mongodump` directory reader.

use std::io::{Cursor, ErrorKind};
use std::path::{Path, PathBuf};

use async_trait::async_trait;
use bson::Bson;
use chrono::{DateTime, Utc};
use tracing::{debug, error};

use super::{BatchLoad, DocumentSource};
use crate::document::{Document, Value};
use crate::error::{MigrateError, Result};

/// Reads `<root>/<batch>.bson` files.
#[derive(Debug, Clone)]
pub struct BsonDirSource {
    root: PathBuf,
}

impl BsonDirSource {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    /// Like [`BsonDirSource::new`], but the backup directory must exist.
    pub fn open(root: impl Into<PathBuf>) -> Result<Self> {
        let root = root.into();
        if !root.is_dir() {
            return Err(MigrateError::Source(format!(
                "backup directory {} does not exist",
                root.display()
            )));
        }
        Ok(Self { root })
    }

    /// Path of the file holding `batch`.
    pub fn batch_path(&self, batch: &str) -> PathBuf {
        self.root.join(format!("{}.bson", batch))
    }

    pub fn root(&self) -> &Path {
        &self.root
    }
}

#[async_trait]
impl DocumentSource for BsonDirSource {
    async fn load(&self, batch: &str) -> Result<BatchLoad> {
        let path = self.batch_path(batch);
        let bytes = match tokio::fs::read(&path).await {
            Ok(bytes) => bytes,
            Err(e) if e.kind() == ErrorKind::NotFound => return Ok(BatchLoad::Missing),
            Err(e) => {
                error!("Error reading {:?}: {}", path, e);
                return Ok(BatchLoad::Loaded(Vec::new()));
            }
        };

        match decode_batch(&bytes) {
            Ok(docs) => {
                debug!("Decoded {} documents from {:?}", docs.len(), path);
                Ok(BatchLoad::Loaded(docs))
            }
            Err(e) => {
                error!("Error reading {:?}: {}", path, e);
                Ok(BatchLoad::Loaded(Vec::new()))
            }
        }
    }

    fn describe(&self) -> String {
        self.root.display().to_string()
    }
}

/// Decode a buffer of concatenated BSON documents.
///
/// All-or-nothing: one malformed document fails the whole buffer.
pub fn decode_batch(bytes: &[u8]) -> std::result::Result<Vec<Document>, bson::de::Error> {
    let mut cursor = Cursor::new(bytes);
    let mut docs = Vec::new();

    while (cursor.position() as usize) < bytes.len() {
        let raw = bson::Document::from_reader(&mut cursor)?;
        docs.push(convert_document(raw));
    }

    Ok(docs)
}

fn convert_document(raw: bson::Document) -> Document {
    let mut doc = Document::new();
    for (key, value) in raw {
        doc.insert(key, convert_value(value));
    }
    doc
}

fn convert_value(value: Bson) -> Value {
    match value {
        Bson::Null | Bson::Undefined => Value::Null,
        Bson::Boolean(b) => Value::Bool(b),
        Bson::Int32(i) => Value::Int(i64::from(i)),
        Bson::Int64(i) => Value::Int(i),
        Bson::Double(f) => Value::Float(f),
        Bson::String(s) => Value::String(s),
        Bson::ObjectId(oid) => Value::ObjectId(oid.to_hex()),
        // Stored as UTC; kept naive like the rest of the destination schema
        Bson::DateTime(dt) => match DateTime::<Utc>::from_timestamp_millis(dt.timestamp_millis()) {
            Some(utc) => Value::DateTime(utc.naive_utc()),
            None => Value::String(dt.to_string()),
        },
        Bson::Array(items) => Value::List(items.into_iter().map(convert_value).collect()),
        Bson::Document(doc) => Value::Map(convert_document(doc)),
        other => Value::String(other.to_string()),
    }
}
