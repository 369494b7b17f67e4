//! Core symbol types for the noema engine.
//!
//! Every concept name — entity, type, or relation — is interned to a
//! [`SymbolId`]. Facts, vectors, and proofs are keyed by ids; the registry
//! recovers the canonical label when rendering. The
//! [`AtomicSymbolAllocator`] provides thread-safe id generation.

use std::num::NonZeroU64;
use std::sync::atomic::{AtomicU64, Ordering};

use serde::{Deserialize, Serialize};

use crate::error::{NoemaResult, SymbolError};

/// Unique, niche-optimized identifier for a symbol.
///
/// Uses `NonZeroU64` so that `Option<SymbolId>` is the same size as
/// `SymbolId` (0 serves as the `None` discriminant).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[repr(transparent)]
pub struct SymbolId(NonZeroU64);

impl SymbolId {
    /// Create a `SymbolId` from a raw `u64`. Returns `None` if `raw` is zero.
    pub fn new(raw: u64) -> Option<Self> {
        NonZeroU64::new(raw).map(SymbolId)
    }

    /// Get the underlying `u64` value.
    pub fn get(self) -> u64 {
        self.0.get()
    }
}

impl std::fmt::Display for SymbolId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "sym:{}", self.0)
    }
}

/// Classification of a symbol in the knowledge system.
///
/// Relations are UPPER_SNAKE tokens in canonical text; entities cover both
/// Capitalized instances and lowercase generic types.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum SymbolKind {
    /// An entity: instance (`Sparky`) or generic type (`bird`).
    Entity,
    /// A relation between entities (`IS_A`, `HAS_PROPERTY`).
    Relation,
    /// A variable inside a rule pattern (`?x`).
    Variable,
}

impl std::fmt::Display for SymbolKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            SymbolKind::Entity => write!(f, "Entity"),
            SymbolKind::Relation => write!(f, "Relation"),
            SymbolKind::Variable => write!(f, "Variable"),
        }
    }
}

/// Metadata describing an interned symbol.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SymbolMeta {
    /// Unique identifier.
    pub id: SymbolId,
    /// What kind of symbol this is.
    pub kind: SymbolKind,
    /// Canonical label, exactly as written in fact lines.
    pub label: String,
}

impl SymbolMeta {
    /// Create a new `SymbolMeta`.
    pub fn new(id: SymbolId, kind: SymbolKind, label: impl Into<String>) -> Self {
        Self {
            id,
            kind,
            label: label.into(),
        }
    }
}

/// Thread-safe symbol id allocator.
///
/// Produces monotonically increasing ids starting from 1. Safe to share
/// across threads via `Arc<AtomicSymbolAllocator>`.
#[derive(Debug)]
pub struct AtomicSymbolAllocator {
    next: AtomicU64,
}

impl AtomicSymbolAllocator {
    /// Create a new allocator that starts from id 1.
    pub fn new() -> Self {
        Self {
            next: AtomicU64::new(1),
        }
    }

    /// Allocate the next symbol id.
    ///
    /// Returns an error if the id space is exhausted.
    pub fn next_id(&self) -> NoemaResult<SymbolId> {
        let raw = self.next.fetch_add(1, Ordering::Relaxed);
        SymbolId::new(raw).ok_or_else(|| SymbolError::AllocatorExhausted.into())
    }

    /// Return the next id that *would* be allocated, without consuming it.
    pub fn peek_next(&self) -> u64 {
        self.next.load(Ordering::Relaxed)
    }
}

impl Default for AtomicSymbolAllocator {
    fn default() -> Self {
        Self::new()
    }
}
