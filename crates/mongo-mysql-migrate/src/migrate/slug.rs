//! Collision-free slugs.

use std::collections::HashSet;

use crate::document::{Document, Value};

/// Base slug of a document: `''` when absent, `None` when explicitly null.
///
/// A NULL slug is stored as-is and never takes part in collision checks.
pub fn source_slug(doc: &Document) -> Option<String> {
    match doc.get("slug") {
        None => Some(String::new()),
        Some(Value::Null) => None,
        Some(v) => Some(v.to_text()),
    }
}

/// Hands out slugs that are unique among everything it has seen.
///
/// A taken slug gets the first free `-1`, `-2`, ... suffix.
#[derive(Debug, Clone, Default)]
pub struct SlugAllocator {
    taken: HashSet<String>,
}

impl SlugAllocator {
    pub fn new() -> Self {
        Self::default()
    }

    /// Start from slugs that already exist.
    pub fn with_taken<I, S>(taken: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            taken: taken.into_iter().map(Into::into).collect(),
        }
    }

    /// First free candidate for `base`, without reserving it.
    pub fn candidate(&self, base: &str) -> String {
        if !self.taken.contains(base) {
            return base.to_string();
        }
        (1..)
            .map(|n| format!("{base}-{n}"))
            .find(|s| !self.taken.contains(s))
            .unwrap_or_default()
    }

    /// Mark a slug as used.
    pub fn reserve(&mut self, slug: impl Into<String>) {
        self.taken.insert(slug.into());
    }

    pub fn contains(&self, slug: &str) -> bool {
        self.taken.contains(slug)
    }
}
