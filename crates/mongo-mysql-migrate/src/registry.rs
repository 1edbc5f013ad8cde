//! Identifier registry: original document id -> new relational key.
//!
//! One mapping per [`EntityKind`]. Mappings are write-once and read by every
//! later stage that rewrites a foreign reference. A kind can be closed once
//! all of its rows exist, which is what self-referential resolution waits for.

use std::collections::{HashMap, HashSet};

use thiserror::Error;

use crate::kind::EntityKind;

/// Reasons a mapping cannot be recorded.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum RegistryError {
    #[error("{kind} id {oid} is already mapped to key {existing}")]
    Duplicate {
        kind: EntityKind,
        oid: String,
        existing: u64,
    },

    #[error("{kind} registry is closed; cannot map {oid}")]
    Closed { kind: EntityKind, oid: String },
}

/// Per-run mapping of original ids to relational keys.
#[derive(Debug, Default)]
pub struct IdentifierRegistry {
    maps: HashMap<EntityKind, HashMap<String, u64>>,
    closed: HashSet<EntityKind>,
}

impl IdentifierRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record `oid -> key` for `kind`. Fails if the oid is already mapped or
    /// the kind has been closed.
    pub fn register(
        &mut self,
        kind: EntityKind,
        oid: impl Into<String>,
        key: u64,
    ) -> Result<(), RegistryError> {
        let oid = oid.into();
        if self.closed.contains(&kind) {
            return Err(RegistryError::Closed { kind, oid });
        }

        let map = self.maps.entry(kind).or_default();
        if let Some(existing) = map.get(&oid) {
            return Err(RegistryError::Duplicate {
                kind,
                oid,
                existing: *existing,
            });
        }
        map.insert(oid, key);
        Ok(())
    }

    /// Look up the key for `oid`. `None` means the document was never
    /// migrated; callers store NULL.
    pub fn resolve(&self, kind: EntityKind, oid: &str) -> Option<u64> {
        self.maps.get(&kind).and_then(|m| m.get(oid)).copied()
    }

    /// Resolve an optional reference.
    pub fn resolve_opt(&self, kind: EntityKind, oid: Option<&str>) -> Option<u64> {
        oid.and_then(|o| self.resolve(kind, o))
    }

    /// Finalize `kind`. Its mapping is complete from here on.
    pub fn close(&mut self, kind: EntityKind) {
        self.closed.insert(kind);
    }

    pub fn is_closed(&self, kind: EntityKind) -> bool {
        self.closed.contains(&kind)
    }

    /// Number of migrated documents for `kind`.
    pub fn count(&self, kind: EntityKind) -> usize {
        self.maps.get(&kind).map_or(0, HashMap::len)
    }

    /// Keys assigned for `kind`, in no particular order.
    pub fn keys(&self, kind: EntityKind) -> impl Iterator<Item = (&str, u64)> {
        self.maps
            .get(&kind)
            .into_iter()
            .flat_map(|m| m.iter().map(|(k, v)| (k.as_str(), *v)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_register_and_resolve() {
        let mut reg = IdentifierRegistry::new();
        reg.register(EntityKind::Users, "a1", 1).unwrap();
        reg.register(EntityKind::Users, "a2", 2).unwrap();

        assert_eq!(reg.resolve(EntityKind::Users, "a1"), Some(1));
        assert_eq!(reg.resolve(EntityKind::Users, "a2"), Some(2));
        assert_eq!(reg.resolve(EntityKind::Users, "zz"), None);
        assert_eq!(reg.resolve(EntityKind::Brands, "a1"), None);
        assert_eq!(reg.count(EntityKind::Users), 2);
    }

    #[test]
    fn test_register_is_write_once() {
        let mut reg = IdentifierRegistry::new();
        reg.register(EntityKind::Brands, "b", 7).unwrap();

        let err = reg.register(EntityKind::Brands, "b", 8).unwrap_err();
        assert_eq!(
            err,
            RegistryError::Duplicate {
                kind: EntityKind::Brands,
                oid: "b".into(),
                existing: 7
            }
        );
        assert_eq!(reg.resolve(EntityKind::Brands, "b"), Some(7));
    }

    #[test]
    fn test_same_oid_in_different_kinds() {
        let mut reg = IdentifierRegistry::new();
        reg.register(EntityKind::Posts, "x", 1).unwrap();
        reg.register(EntityKind::Pages, "x", 5).unwrap();
        assert_eq!(reg.resolve(EntityKind::Posts, "x"), Some(1));
        assert_eq!(reg.resolve(EntityKind::Pages, "x"), Some(5));
    }

    #[test]
    fn test_closed_kind_rejects_registration() {
        let mut reg = IdentifierRegistry::new();
        reg.register(EntityKind::Categories, "c1", 1).unwrap();
        reg.close(EntityKind::Categories);

        assert!(reg.is_closed(EntityKind::Categories));
        assert!(matches!(
            reg.register(EntityKind::Categories, "c2", 2),
            Err(RegistryError::Closed { .. })
        ));
        // Reads still work after closing
        assert_eq!(reg.resolve(EntityKind::Categories, "c1"), Some(1));
    }

    #[test]
    fn test_resolve_opt() {
        let mut reg = IdentifierRegistry::new();
        reg.register(EntityKind::LeadForms, "f", 3).unwrap();
        assert_eq!(reg.resolve_opt(EntityKind::LeadForms, Some("f")), Some(3));
        assert_eq!(reg.resolve_opt(EntityKind::LeadForms, None), None);
    }
}
