//! Read-only graph views over the theory stack.
//!
//! Strategies never touch the stack directly; they go through [`FactView`],
//! which layers graph-shaped accessors (edges, closures, bounded search)
//! over the shadow-aware fact iterator.

use std::collections::{HashMap, HashSet, VecDeque};

use crate::config::ReasonerConfig;
use crate::error::NoemaResult;
use crate::registry::SymbolRegistry;
use crate::store::{Fact, Pattern, TheoryStack};
use crate::symbol::{SymbolId, SymbolKind};

/// Relation categories resolved from configuration to symbol ids, once
/// per session.
#[derive(Debug, Clone)]
pub struct RelationSets {
    pub transitive: HashSet<SymbolId>,
    pub inheritable: HashSet<SymbolId>,
    pub types: HashSet<SymbolId>,
    pub causal: HashSet<SymbolId>,
    pub single_valued: HashSet<SymbolId>,
    pub disjoint: SymbolId,
}

impl RelationSets {
    pub fn from_config(config: &ReasonerConfig, registry: &SymbolRegistry) -> NoemaResult<Self> {
        let resolve = |names: &std::collections::BTreeSet<String>| -> NoemaResult<HashSet<SymbolId>> {
            names
                .iter()
                .map(|n| registry.intern(SymbolKind::Relation, n))
                .collect()
        };
        Ok(Self {
            transitive: resolve(&config.transitive_relations)?,
            inheritable: resolve(&config.inheritable_relations)?,
            types: resolve(&config.type_relations)?,
            causal: resolve(&config.causal_relations)?,
            single_valued: resolve(&config.single_valued_relations)?,
            disjoint: registry.intern(SymbolKind::Relation, &config.disjoint_relation)?,
        })
    }
}

/// A read-only, shadow-aware view of the current fact state.
pub struct FactView<'a> {
    stack: &'a TheoryStack,
    relations: &'a RelationSets,
    max_depth: usize,
}

impl<'a> FactView<'a> {
    pub fn new(stack: &'a TheoryStack, relations: &'a RelationSets, max_depth: usize) -> Self {
        Self {
            stack,
            relations,
            max_depth,
        }
    }

    pub fn relations(&self) -> &RelationSets {
        self.relations
    }

    /// Visible facts matching an arbitrary pattern, newest first.
    pub fn matching(&self, pattern: Pattern) -> impl Iterator<Item = &'a Fact> {
        self.stack.facts_matching(pattern)
    }

    /// The newest visible statement of a triple, if any.
    pub fn statement_of(
        &self,
        subject: SymbolId,
        relation: SymbolId,
        object: SymbolId,
    ) -> Option<&'a Fact> {
        self.stack.visible_polarity(subject, relation, object)
    }

    /// Objects of visible positive `(subject, relation, *)` facts,
    /// newest first.
    pub fn objects_of(&self, subject: SymbolId, relation: SymbolId) -> Vec<&'a Fact> {
        self.stack
            .facts_matching(Pattern::any().subject(subject).relation(relation))
            .filter(|f| !f.negated)
            .collect()
    }

    /// Subjects of visible positive `(*, relation, object)` facts.
    pub fn subjects_of(&self, relation: SymbolId, object: SymbolId) -> Vec<&'a Fact> {
        self.stack
            .facts_matching(Pattern::any().relation(relation).object(object))
            .filter(|f| !f.negated)
            .collect()
    }

    /// The newest visible fact stating anything about the subject. Drives
    /// the closed-world/unknown distinction: an entity seen only in object
    /// position is not known.
    pub fn knows(&self, entity: SymbolId) -> Option<&'a Fact> {
        self.stack
            .facts_matching(Pattern::any().subject(entity))
            .next()
    }

    /// Direct positive type facts of an entity.
    pub fn direct_types(&self, entity: SymbolId) -> Vec<&'a Fact> {
        self.relations
            .types
            .iter()
            .flat_map(|r| self.objects_of(entity, *r))
            .collect()
    }

    /// Everything reachable from `start` over positive type edges, with
    /// the supporting facts. Excludes `start` itself. Cycle-safe.
    pub fn type_closure(&self, start: SymbolId) -> Vec<(SymbolId, Vec<&'a Fact>)> {
        let mut out = Vec::new();
        let mut seen = HashSet::new();
        // Each queue entry carries the fact path that reached it.
        let mut queue: VecDeque<(SymbolId, Vec<&'a Fact>)> = VecDeque::new();
        queue.push_back((start, Vec::new()));
        seen.insert(start);
        while let Some((node, path)) = queue.pop_front() {
            if path.len() >= self.max_depth {
                continue;
            }
            for fact in self.direct_types(node) {
                if seen.insert(fact.object) {
                    let mut next = path.clone();
                    next.push(fact);
                    out.push((fact.object, next.clone()));
                    queue.push_back((fact.object, next));
                }
            }
        }
        out
    }

    /// Shortest positive-edge path `from → to` over one relation,
    /// breadth-first and depth-bounded. Returns the facts along the path.
    pub fn shortest_chain(
        &self,
        from: SymbolId,
        to: SymbolId,
        relation: SymbolId,
    ) -> Option<Vec<&'a Fact>> {
        let mut seen = HashSet::new();
        let mut queue: VecDeque<(SymbolId, Vec<&'a Fact>)> = VecDeque::new();
        queue.push_back((from, Vec::new()));
        seen.insert(from);
        while let Some((node, path)) = queue.pop_front() {
            if path.len() >= self.max_depth {
                continue;
            }
            for fact in self.objects_of(node, relation) {
                if fact.object == to {
                    let mut full = path.clone();
                    full.push(fact);
                    return Some(full);
                }
                if seen.insert(fact.object) {
                    let mut next = path.clone();
                    next.push(fact);
                    queue.push_back((fact.object, next));
                }
            }
        }
        None
    }

    /// Backward breadth-first search over causal edges: all causes that
    /// reach `effect`, with their path facts, shortest paths first.
    pub fn causes_of(&self, effect: SymbolId) -> Vec<(SymbolId, Vec<&'a Fact>)> {
        let mut out = Vec::new();
        let mut seen = HashSet::new();
        let mut queue: VecDeque<(SymbolId, Vec<&'a Fact>)> = VecDeque::new();
        queue.push_back((effect, Vec::new()));
        seen.insert(effect);
        while let Some((node, path)) = queue.pop_front() {
            if path.len() >= self.max_depth {
                continue;
            }
            for relation in &self.relations.causal {
                for fact in self.subjects_of(*relation, node) {
                    if seen.insert(fact.subject) {
                        let mut next = path.clone();
                        next.push(fact);
                        out.push((fact.subject, next.clone()));
                        queue.push_back((fact.subject, next));
                    }
                }
            }
        }
        out
    }

    /// Declared disjoint pairs visible in the current view.
    pub fn disjoint_declarations(&self) -> Vec<&'a Fact> {
        self.stack
            .facts_matching(Pattern::any().relation(self.relations.disjoint))
            .filter(|f| !f.negated)
            .collect()
    }

    /// All visible positive `(relation, object)` pairs for a subject.
    pub fn profile_of(&self, subject: SymbolId) -> HashMap<(SymbolId, SymbolId), &'a Fact> {
        self.stack
            .facts_matching(Pattern::any().subject(subject))
            .filter(|f| !f.negated)
            .map(|f| ((f.relation, f.object), f))
            .collect()
    }
}
