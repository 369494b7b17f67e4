//! Symbol registry: bidirectional label ↔ id mapping.
//!
//! The [`SymbolRegistry`] provides O(1) lookups in both directions using two
//! `DashMap`s. Labels are matched exactly: canonical form distinguishes
//! `Sparky` (instance) from `sparky` (would-be type), so no normalization is
//! applied.

use dashmap::DashMap;

use crate::error::{NoemaResult, SymbolError};
use crate::symbol::{AtomicSymbolAllocator, SymbolId, SymbolKind, SymbolMeta};

/// Bidirectional symbol registry mapping ids to metadata and labels to ids.
///
/// Interning is idempotent: the same label always resolves to the same id
/// within a session, which is what makes concept vectors canonical per name.
pub struct SymbolRegistry {
    /// Forward map: SymbolId → SymbolMeta (source of truth).
    id_to_meta: DashMap<SymbolId, SymbolMeta>,
    /// Reverse map: exact label → SymbolId.
    label_to_id: DashMap<String, SymbolId>,
    /// Id allocator.
    allocator: AtomicSymbolAllocator,
}

impl SymbolRegistry {
    /// Create a new empty registry.
    pub fn new() -> Self {
        Self {
            id_to_meta: DashMap::new(),
            label_to_id: DashMap::new(),
            allocator: AtomicSymbolAllocator::new(),
        }
    }

    /// Intern a label, allocating a fresh id on first sight.
    ///
    /// Repeated interning of the same label returns the original id; the
    /// kind recorded on first sight wins.
    pub fn intern(&self, kind: SymbolKind, label: &str) -> NoemaResult<SymbolId> {
        if let Some(existing) = self.label_to_id.get(label) {
            return Ok(*existing.value());
        }
        let id = self.allocator.next_id()?;
        // A racing intern of the same label keeps the first insertion.
        let winner = *self
            .label_to_id
            .entry(label.to_string())
            .or_insert(id)
            .value();
        if winner == id {
            self.id_to_meta
                .insert(id, SymbolMeta::new(id, kind, label));
        }
        Ok(winner)
    }

    /// Look up a symbol id by exact label.
    pub fn lookup(&self, label: &str) -> Option<SymbolId> {
        self.label_to_id.get(label).map(|r| *r.value())
    }

    /// Look up a symbol id by exact label, erroring if absent.
    pub fn require(&self, label: &str) -> NoemaResult<SymbolId> {
        self.lookup(label).ok_or_else(|| {
            SymbolError::Unknown {
                label: label.to_string(),
            }
            .into()
        })
    }

    /// Look up symbol metadata by id.
    pub fn get(&self, id: SymbolId) -> Option<SymbolMeta> {
        self.id_to_meta.get(&id).map(|r| r.value().clone())
    }

    /// Resolve an id to its canonical label, falling back to `sym:{id}`.
    pub fn label_of(&self, id: SymbolId) -> String {
        self.get(id)
            .map(|m| m.label)
            .unwrap_or_else(|| format!("sym:{}", id.get()))
    }

    /// Return all registered symbols.
    pub fn all(&self) -> Vec<SymbolMeta> {
        self.id_to_meta.iter().map(|r| r.value().clone()).collect()
    }

    /// Number of registered symbols.
    pub fn len(&self) -> usize {
        self.id_to_meta.len()
    }

    /// Whether the registry is empty.
    pub fn is_empty(&self) -> bool {
        self.id_to_meta.is_empty()
    }
}

impl Default for SymbolRegistry {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Debug for SymbolRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SymbolRegistry")
            .field("count", &self.len())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn intern_and_lookup() {
        let reg = SymbolRegistry::new();
        let dog = reg.intern(SymbolKind::Entity, "Dog").unwrap();

        assert_eq!(reg.lookup("Dog"), Some(dog));
        let meta = reg.get(dog).unwrap();
        assert_eq!(meta.label, "Dog");
        assert_eq!(meta.kind, SymbolKind::Entity);
    }

    #[test]
    fn intern_is_idempotent() {
        let reg = SymbolRegistry::new();
        let a = reg.intern(SymbolKind::Entity, "Dog").unwrap();
        let b = reg.intern(SymbolKind::Entity, "Dog").unwrap();
        assert_eq!(a, b);
        assert_eq!(reg.len(), 1);
    }

    #[test]
    fn labels_are_case_sensitive() {
        let reg = SymbolRegistry::new();
        let upper = reg.intern(SymbolKind::Entity, "Dog").unwrap();
        let lower = reg.intern(SymbolKind::Entity, "dog").unwrap();
        assert_ne!(upper, lower);
        assert_eq!(reg.len(), 2);
    }

    #[test]
    fn require_unknown_label_errors() {
        let reg = SymbolRegistry::new();
        let err = reg.require("Ghost").unwrap_err();
        assert!(format!("{err}").contains("Ghost"));
    }

    #[test]
    fn label_of_falls_back_to_raw_id() {
        let reg = SymbolRegistry::new();
        let id = SymbolId::new(999).unwrap();
        assert_eq!(reg.label_of(id), "sym:999");
    }
}
