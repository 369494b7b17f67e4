//! A single theory layer: an ordered, named collection of facts.

use serde::{Deserialize, Serialize};

use super::Fact;

/// One layer of the theory stack.
///
/// Facts keep insertion order; newer facts shadow older ones during
/// matching. A layer never reaches into the layers beneath it.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Layer {
    id: u64,
    name: String,
    facts: Vec<Fact>,
}

impl Layer {
    pub(crate) fn new(id: u64, name: impl Into<String>) -> Self {
        Self {
            id,
            name: name.into(),
            facts: Vec::new(),
        }
    }

    /// Stable identifier, unique within one stack's lifetime.
    pub fn id(&self) -> u64 {
        self.id
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    /// Append a fact. Exact restatements (same triple and polarity) are
    /// ignored so re-asserting is idempotent within a layer.
    pub(crate) fn insert(&mut self, fact: Fact) -> bool {
        if self.facts.iter().any(|f| f.same_statement(&fact)) {
            return false;
        }
        self.facts.push(fact);
        true
    }

    /// Remove the first fact stating the same thing as `fact`.
    pub(crate) fn remove(&mut self, fact: &Fact) -> bool {
        match self.facts.iter().position(|f| f.same_statement(fact)) {
            Some(i) => {
                self.facts.remove(i);
                true
            }
            None => false,
        }
    }

    /// Facts in insertion order.
    pub fn facts(&self) -> &[Fact] {
        &self.facts
    }

    pub fn len(&self) -> usize {
        self.facts.len()
    }

    pub fn is_empty(&self) -> bool {
        self.facts.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::symbol::SymbolId;

    fn sym(n: u64) -> SymbolId {
        SymbolId::new(n).unwrap()
    }

    #[test]
    fn insert_is_idempotent_per_statement() {
        let mut layer = Layer::new(0, "base");
        let fact = Fact::new(sym(1), sym(2), sym(3));
        assert!(layer.insert(fact.clone()));
        assert!(!layer.insert(fact.clone().with_confidence(0.5)));
        assert_eq!(layer.len(), 1);
        // Opposite polarity is a different statement.
        assert!(layer.insert(fact.negated()));
        assert_eq!(layer.len(), 2);
    }

    #[test]
    fn remove_matches_by_statement() {
        let mut layer = Layer::new(0, "base");
        let fact = Fact::new(sym(1), sym(2), sym(3));
        layer.insert(fact.clone());
        assert!(!layer.remove(&fact.clone().negated()));
        assert!(layer.remove(&fact));
        assert!(layer.is_empty());
    }
}
