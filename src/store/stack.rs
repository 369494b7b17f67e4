//! The theory stack: an arena of layers with branch and rollback.
//!
//! The stack always holds at least the base layer. Pushing opens an empty
//! top layer; popping discards the whole top layer in O(1) without touching
//! anything beneath it. Matching walks layers top-to-bottom with shadowing,
//! so a hypothetical layer overrides base knowledge without mutating it.

use std::collections::HashSet;

use serde::{Deserialize, Serialize};

use super::{Fact, Layer, Pattern};
use crate::error::StoreError;
use crate::symbol::SymbolId;

/// Layered fact store with branch/rollback semantics.
///
/// Single-writer by design: `&mut self` for every mutation, no internal
/// locking. Independent sessions own independent stacks.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TheoryStack {
    layers: Vec<Layer>,
    /// Relations where a newer value supersedes an older one in the
    /// current view. Resolved from configuration at session setup.
    single_valued: HashSet<SymbolId>,
    next_layer_id: u64,
    next_provenance: u64,
}

impl TheoryStack {
    /// A stack holding only the base layer.
    pub fn new() -> Self {
        Self {
            layers: vec![Layer::new(0, "base")],
            single_valued: HashSet::new(),
            next_layer_id: 1,
            next_provenance: 1,
        }
    }

    /// Declare which relations are single-valued for shadowing purposes.
    pub fn set_single_valued(&mut self, relations: HashSet<SymbolId>) {
        self.single_valued = relations;
    }

    /// Number of layers, including base.
    pub fn depth(&self) -> usize {
        self.layers.len()
    }

    /// The top (current) layer.
    pub fn current(&self) -> &Layer {
        // The base layer is never popped, so the stack is never empty.
        self.layers.last().expect("stack holds at least base")
    }

    /// All layers, base first.
    pub fn layers(&self) -> &[Layer] {
        &self.layers
    }

    /// Find a layer by name, topmost first.
    pub fn layer_named(&self, name: &str) -> Result<&Layer, StoreError> {
        self.layers
            .iter()
            .rev()
            .find(|l| l.name() == name)
            .ok_or_else(|| StoreError::LayerNotFound {
                name: name.to_string(),
            })
    }

    /// Open a fresh empty layer on top and return its id.
    pub fn push_layer(&mut self, name: impl Into<String>) -> u64 {
        let id = self.next_layer_id;
        self.next_layer_id += 1;
        self.layers.push(Layer::new(id, name));
        id
    }

    /// Discard the entire top layer. Illegal on the base layer.
    pub fn pop_layer(&mut self) -> Result<Layer, StoreError> {
        if self.layers.len() == 1 {
            return Err(StoreError::BaseLayerPop);
        }
        Ok(self.layers.pop().expect("depth checked above"))
    }

    /// Add a fact to the current layer, assigning a provenance id on
    /// first assert. Restating a visible statement is a no-op.
    pub fn assert_fact(&mut self, mut fact: Fact) {
        if fact.provenance_id.is_none() {
            fact.provenance_id = Some(self.next_provenance);
            self.next_provenance += 1;
        }
        let top = self.layers.last_mut().expect("stack holds at least base");
        top.insert(fact);
    }

    /// Remove a fact from whichever layer holds it, topmost first.
    pub fn retract(&mut self, fact: &Fact) -> Result<(), StoreError> {
        for layer in self.layers.iter_mut().rev() {
            if layer.remove(fact) {
                return Ok(());
            }
        }
        Err(StoreError::FactNotFound {
            fact: format!(
                "({}, {}, {}){}",
                fact.subject,
                fact.relation,
                fact.object,
                if fact.negated { " negated" } else { "" }
            ),
        })
    }

    /// Lazy sequence of visible facts matching the pattern, newest first.
    ///
    /// Shadowing: once any polarity of a triple has been seen, older
    /// restatements and the older opposite polarity are hidden; for
    /// single-valued relations, a newer (subject, relation) pair hides
    /// every older object.
    pub fn facts_matching(&self, pattern: Pattern) -> FactsMatching<'_> {
        FactsMatching {
            layers: &self.layers,
            single_valued: &self.single_valued,
            pattern,
            layer_idx: self.layers.len(),
            fact_idx: 0,
            seen_triples: HashSet::new(),
            seen_single: HashSet::new(),
        }
    }

    /// The visible polarity of a triple: `Some(negated)` for the newest
    /// visible statement, `None` when nothing states it.
    pub fn visible_polarity(
        &self,
        subject: SymbolId,
        relation: SymbolId,
        object: SymbolId,
    ) -> Option<&Fact> {
        self.facts_matching(
            Pattern::any()
                .subject(subject)
                .relation(relation)
                .object(object),
        )
        .next()
    }

    /// Whether the statement (triple and polarity) is currently visible.
    pub fn contains(&self, fact: &Fact) -> bool {
        self.visible_polarity(fact.subject, fact.relation, fact.object)
            .is_some_and(|visible| visible.negated == fact.negated)
    }

    /// Commit a validated batch into the current layer.
    ///
    /// Atomicity lives in the staging protocol: the batch is checked as a
    /// whole before this call, and an unvalidated batch is simply dropped.
    pub fn commit_batch(&mut self, batch: StagedBatch) {
        for fact in batch.into_facts() {
            self.assert_fact(fact);
        }
    }

    /// Every visible fact, newest first. Convenience for rendering and
    /// set-equality checks in tests.
    pub fn visible_facts(&self) -> Vec<Fact> {
        self.facts_matching(Pattern::any()).cloned().collect()
    }
}

impl Default for TheoryStack {
    fn default() -> Self {
        Self::new()
    }
}

/// Staged facts awaiting validation.
///
/// The batch lives outside the stack until committed, so discarding it on
/// a failed consistency scan is a drop, and partial application is never
/// observable.
#[derive(Debug, Clone, Default)]
pub struct StagedBatch {
    facts: Vec<Fact>,
}

impl StagedBatch {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add(&mut self, fact: Fact) {
        self.facts.push(fact);
    }

    pub fn facts(&self) -> &[Fact] {
        &self.facts
    }

    pub fn len(&self) -> usize {
        self.facts.len()
    }

    pub fn is_empty(&self) -> bool {
        self.facts.is_empty()
    }

    pub fn into_facts(self) -> Vec<Fact> {
        self.facts
    }
}

/// Lazy iterator over visible facts. See [`TheoryStack::facts_matching`].
pub struct FactsMatching<'a> {
    layers: &'a [Layer],
    single_valued: &'a HashSet<SymbolId>,
    pattern: Pattern,
    /// Walks downward; `layer_idx` is one past the layer being read.
    layer_idx: usize,
    /// Walks downward within the layer; one past the fact being read.
    fact_idx: usize,
    seen_triples: HashSet<(SymbolId, SymbolId, SymbolId)>,
    seen_single: HashSet<(SymbolId, SymbolId)>,
}

impl<'a> Iterator for FactsMatching<'a> {
    type Item = &'a Fact;

    fn next(&mut self) -> Option<&'a Fact> {
        loop {
            if self.fact_idx == 0 {
                if self.layer_idx == 0 {
                    return None;
                }
                self.layer_idx -= 1;
                self.fact_idx = self.layers[self.layer_idx].len();
                continue;
            }
            self.fact_idx -= 1;
            let fact = &self.layers[self.layer_idx].facts()[self.fact_idx];

            let triple = fact.triple();
            let shadowed = self.seen_triples.contains(&triple)
                || (self.single_valued.contains(&fact.relation)
                    && self.seen_single.contains(&(fact.subject, fact.relation)));
            self.seen_triples.insert(triple);
            if self.single_valued.contains(&fact.relation) {
                self.seen_single.insert((fact.subject, fact.relation));
            }

            if !shadowed && self.pattern.matches(fact) {
                return Some(fact);
            }
        }
    }
}
