//! Concept memory: the symbol-to-vector cache and cleanup search.
//!
//! Vectors are encoded on first use from the symbol's canonical label, so
//! the same name maps to the same vector under a fixed strategy and
//! geometry. Cleanup (`most_similar`) ranks candidates by similarity with
//! ties broken by insertion order, which keeps results deterministic.

use std::collections::hash_map::DefaultHasher;
use std::hash::{Hash, Hasher};
use std::sync::atomic::{AtomicUsize, Ordering};

use dashmap::DashMap;
use rayon::prelude::*;

use crate::error::HdcError;
use crate::hdc::strategy::{VectorStrategy, strategy_for};
use crate::hdc::{ConceptVector, Geometry, StrategyKind};
use crate::symbol::SymbolId;

/// Symbol-keyed associative memory of concept vectors.
pub struct ConceptMemory {
    strategy: Box<dyn VectorStrategy>,
    geometry: Geometry,
    vectors: DashMap<SymbolId, ConceptVector>,
    /// Insertion rank per symbol, for deterministic tie-breaking.
    ranks: DashMap<SymbolId, usize>,
    next_rank: AtomicUsize,
}

impl ConceptMemory {
    pub fn new(kind: StrategyKind, geometry: Geometry) -> Self {
        Self {
            strategy: strategy_for(kind),
            geometry,
            vectors: DashMap::new(),
            ranks: DashMap::new(),
            next_rank: AtomicUsize::new(0),
        }
    }

    /// The active strategy.
    pub fn strategy(&self) -> &dyn VectorStrategy {
        self.strategy.as_ref()
    }

    pub fn geometry(&self) -> Geometry {
        self.geometry
    }

    /// Deterministic encoding seed for a canonical label.
    fn seed_for(label: &str) -> u64 {
        let mut hasher = DefaultHasher::new();
        label.hash(&mut hasher);
        hasher.finish()
    }

    /// Fetch the vector for a symbol, encoding it from the label on first
    /// sight. Idempotent: repeated calls return byte-identical vectors.
    pub fn get_or_encode(&self, id: SymbolId, label: &str) -> ConceptVector {
        if let Some(existing) = self.vectors.get(&id) {
            return existing.clone();
        }
        let encoded = self.strategy.encode(Self::seed_for(label), self.geometry);
        let mut fresh = false;
        let vector = self
            .vectors
            .entry(id)
            .or_insert_with(|| {
                fresh = true;
                encoded
            })
            .clone();
        if fresh {
            let rank = self.next_rank.fetch_add(1, Ordering::Relaxed);
            self.ranks.insert(id, rank);
        }
        vector
    }

    /// Encode a batch of symbols. Encoding runs in parallel; ranks are
    /// assigned in slice order so cleanup stays deterministic.
    pub fn insert_batch(&self, items: &[(SymbolId, String)]) {
        let encoded: Vec<(SymbolId, ConceptVector)> = items
            .par_iter()
            .map(|(id, label)| {
                (
                    *id,
                    self.strategy.encode(Self::seed_for(label), self.geometry),
                )
            })
            .collect();
        for (id, vector) in encoded {
            if self.vectors.contains_key(&id) {
                continue;
            }
            self.vectors.insert(id, vector);
            let rank = self.next_rank.fetch_add(1, Ordering::Relaxed);
            self.ranks.insert(id, rank);
        }
    }

    /// Look up a stored vector without encoding.
    pub fn get(&self, id: SymbolId) -> Option<ConceptVector> {
        self.vectors.get(&id).map(|r| r.value().clone())
    }

    /// Look up a stored vector, erroring if the symbol was never encoded.
    pub fn require(&self, id: SymbolId) -> Result<ConceptVector, HdcError> {
        self.get(id).ok_or(HdcError::VectorNotFound {
            symbol_id: id.get(),
        })
    }

    pub fn contains(&self, id: SymbolId) -> bool {
        self.vectors.contains_key(&id)
    }

    pub fn len(&self) -> usize {
        self.vectors.len()
    }

    pub fn is_empty(&self) -> bool {
        self.vectors.is_empty()
    }

    /// All stored symbols in insertion order.
    pub fn symbols(&self) -> Vec<SymbolId> {
        let mut with_rank: Vec<(usize, SymbolId)> = self
            .ranks
            .iter()
            .map(|r| (*r.value(), *r.key()))
            .collect();
        with_rank.sort_unstable();
        with_rank.into_iter().map(|(_, id)| id).collect()
    }

    /// Cleanup search: the `k` stored vectors most similar to `query`,
    /// best first. Equal similarities keep insertion order.
    pub fn most_similar(
        &self,
        query: &ConceptVector,
        k: usize,
    ) -> Result<Vec<(SymbolId, f32)>, HdcError> {
        let candidates = self.symbols();
        let mut scored = Vec::with_capacity(candidates.len());
        for id in candidates {
            let vector = self.require(id)?;
            scored.push((id, self.strategy.similarity(query, &vector)?));
        }
        // Stable sort preserves insertion order among ties.
        scored.sort_by(|a, b| b.1.partial_cmp(&a.1).unwrap_or(std::cmp::Ordering::Equal));
        scored.truncate(k);
        Ok(scored)
    }
}

impl std::fmt::Debug for ConceptMemory {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ConceptMemory")
            .field("strategy", &self.strategy.kind())
            .field("geometry", &self.geometry)
            .field("count", &self.len())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sym(n: u64) -> SymbolId {
        SymbolId::new(n).unwrap()
    }

    fn memory() -> ConceptMemory {
        ConceptMemory::new(StrategyKind::BitVector, Geometry::TEST)
    }

    #[test]
    fn get_or_encode_is_idempotent() {
        let mem = memory();
        let a = mem.get_or_encode(sym(1), "Dog");
        let b = mem.get_or_encode(sym(1), "Dog");
        assert_eq!(a, b);
        assert_eq!(mem.len(), 1);
    }

    #[test]
    fn same_label_encodes_identically_across_memories() {
        let a = memory().get_or_encode(sym(1), "Dog");
        // Different interning order, same label.
        let b = memory().get_or_encode(sym(5), "Dog");
        assert_eq!(a.data(), b.data());
    }

    #[test]
    fn require_missing_symbol_errors() {
        let mem = memory();
        let result = mem.require(sym(9));
        assert!(matches!(result, Err(HdcError::VectorNotFound { .. })));
    }

    #[test]
    fn most_similar_finds_the_query_symbol_first() {
        let mem = memory();
        for (n, label) in [(1, "Dog"), (2, "Cat"), (3, "Fish")] {
            mem.get_or_encode(sym(n), label);
        }
        let query = mem.get(sym(2)).unwrap();
        let hits = mem.most_similar(&query, 2).unwrap();
        assert_eq!(hits[0].0, sym(2));
        assert_eq!(hits[0].1, 1.0);
        assert_eq!(hits.len(), 2);
    }

    #[test]
    fn ties_break_by_insertion_order() {
        let mem = ConceptMemory::new(StrategyKind::Exact, Geometry::TEST);
        for (n, label) in [(1, "A"), (2, "B"), (3, "C")] {
            mem.get_or_encode(sym(n), label);
        }
        // Under the exact strategy every non-identical pair scores 0, so a
        // foreign query ties all three candidates.
        let strat = strategy_for(StrategyKind::Exact);
        let query = strat.encode(u64::MAX, Geometry::TEST);
        let hits = mem.most_similar(&query, 3).unwrap();
        let ids: Vec<_> = hits.iter().map(|(id, _)| *id).collect();
        assert_eq!(ids, vec![sym(1), sym(2), sym(3)]);
    }

    #[test]
    fn insert_batch_matches_single_inserts() {
        let mem = memory();
        mem.insert_batch(&[
            (sym(1), "Dog".to_string()),
            (sym(2), "Cat".to_string()),
        ]);
        let single = memory().get_or_encode(sym(1), "Dog");
        assert_eq!(mem.get(sym(1)).unwrap(), single);
        assert_eq!(mem.symbols(), vec![sym(1), sym(2)]);
    }
}
