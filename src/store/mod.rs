//! Fact store: immutable triples organized into a branchable theory stack.

mod layer;
mod stack;

pub use layer::Layer;
pub use stack::{FactsMatching, StagedBatch, TheoryStack};

use serde::{Deserialize, Serialize};

use crate::symbol::SymbolId;

/// A subject–relation–object statement, optionally negated.
///
/// Facts are immutable once created and belong to exactly one layer.
/// Identity for retraction and shadowing is the statement itself
/// ([`Fact::same_statement`]); confidence and provenance are metadata.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Fact {
    pub subject: SymbolId,
    pub relation: SymbolId,
    pub object: SymbolId,
    /// True for `Subject NOT RELATION Object`.
    pub negated: bool,
    /// Belief strength in `[0, 1]`, clamped at construction.
    pub confidence: f32,
    /// Name of the operation that produced this fact, when it came from a
    /// statement rather than a plain assert.
    pub operator: Option<String>,
    /// Positional arguments of that operation, verbatim.
    pub args: Vec<String>,
    /// Assigned by the store on first assert; stable for the fact's life.
    pub provenance_id: Option<u64>,
}

impl Fact {
    /// A positive fact at full confidence.
    pub fn new(subject: SymbolId, relation: SymbolId, object: SymbolId) -> Self {
        Self {
            subject,
            relation,
            object,
            negated: false,
            confidence: 1.0,
            operator: None,
            args: Vec::new(),
            provenance_id: None,
        }
    }

    /// Flip the statement's polarity.
    pub fn negated(mut self) -> Self {
        self.negated = true;
        self
    }

    pub fn with_confidence(mut self, confidence: f32) -> Self {
        self.confidence = confidence.clamp(0.0, 1.0);
        self
    }

    pub fn with_operator(mut self, operator: impl Into<String>, args: Vec<String>) -> Self {
        self.operator = Some(operator.into());
        self.args = args;
        self
    }

    /// The (subject, relation, object) triple, polarity ignored.
    pub fn triple(&self) -> (SymbolId, SymbolId, SymbolId) {
        (self.subject, self.relation, self.object)
    }

    /// Whether two facts state the same thing: same triple, same polarity.
    /// Metadata (confidence, provenance, operator) is not identity.
    pub fn same_statement(&self, other: &Fact) -> bool {
        self.triple() == other.triple() && self.negated == other.negated
    }

    /// The exact negation of this statement.
    pub fn negation(&self) -> Fact {
        let mut flipped = self.clone();
        flipped.negated = !self.negated;
        flipped.provenance_id = None;
        flipped
    }
}

/// Wildcard pattern over triples. `None` matches anything in that slot.
#[derive(Debug, Clone, Copy, Default)]
pub struct Pattern {
    pub subject: Option<SymbolId>,
    pub relation: Option<SymbolId>,
    pub object: Option<SymbolId>,
}

impl Pattern {
    /// Match every fact.
    pub fn any() -> Self {
        Self::default()
    }

    pub fn subject(mut self, s: SymbolId) -> Self {
        self.subject = Some(s);
        self
    }

    pub fn relation(mut self, r: SymbolId) -> Self {
        self.relation = Some(r);
        self
    }

    pub fn object(mut self, o: SymbolId) -> Self {
        self.object = Some(o);
        self
    }

    pub fn matches(&self, fact: &Fact) -> bool {
        self.subject.is_none_or(|s| s == fact.subject)
            && self.relation.is_none_or(|r| r == fact.relation)
            && self.object.is_none_or(|o| o == fact.object)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sym(n: u64) -> SymbolId {
        SymbolId::new(n).unwrap()
    }

    #[test]
    fn confidence_is_clamped() {
        let fact = Fact::new(sym(1), sym(2), sym(3)).with_confidence(1.5);
        assert_eq!(fact.confidence, 1.0);
        let fact = Fact::new(sym(1), sym(2), sym(3)).with_confidence(-0.5);
        assert_eq!(fact.confidence, 0.0);
    }

    #[test]
    fn same_statement_ignores_metadata() {
        let a = Fact::new(sym(1), sym(2), sym(3)).with_confidence(0.9);
        let b = Fact::new(sym(1), sym(2), sym(3)).with_operator("ASSERT", vec![]);
        assert!(a.same_statement(&b));
        assert!(!a.same_statement(&b.clone().negated()));
    }

    #[test]
    fn negation_flips_polarity_only() {
        let fact = Fact::new(sym(1), sym(2), sym(3));
        let neg = fact.negation();
        assert!(neg.negated);
        assert_eq!(neg.triple(), fact.triple());
        assert!(neg.negation().same_statement(&fact));
    }

    #[test]
    fn pattern_wildcards() {
        let fact = Fact::new(sym(1), sym(2), sym(3));
        assert!(Pattern::any().matches(&fact));
        assert!(Pattern::any().subject(sym(1)).object(sym(3)).matches(&fact));
        assert!(!Pattern::any().relation(sym(9)).matches(&fact));
    }
}
