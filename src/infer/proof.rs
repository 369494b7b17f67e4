//! Auditable proof objects.
//!
//! Proofs are append-only and ownership-passed: every strategy builds its
//! own sub-proof bottom-up and returns it, and callers concatenate. There
//! is no shared mutable trace, so concurrent independent queries stay
//! isolated.

use serde::{Deserialize, Serialize};

use crate::registry::SymbolRegistry;
use crate::store::Fact;

/// Why a step holds.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Justification {
    /// Stated verbatim in the store.
    Given,
    /// One hop of a transitive chain.
    Transitive,
    /// Carried down the type hierarchy.
    Inherited,
    /// Produced by the named rule.
    Rule(String),
    /// A witness entity standing in for its type.
    TypeWitness,
    /// A declared disjointness.
    Disjoint,
    /// Assumed false because the subject is otherwise known.
    ClosedWorld,
    /// Supported by vector similarity at the given score.
    Similarity(f32),
    /// Assumed for the duration of a hypothetical layer.
    Hypothesis,
}

impl std::fmt::Display for Justification {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Justification::Given => write!(f, "given"),
            Justification::Transitive => write!(f, "transitive"),
            Justification::Inherited => write!(f, "inherited"),
            Justification::Rule(name) => write!(f, "rule:{name}"),
            Justification::TypeWitness => write!(f, "type_witness"),
            Justification::Disjoint => write!(f, "disjoint"),
            Justification::ClosedWorld => write!(f, "closed_world"),
            Justification::Similarity(score) => write!(f, "similarity:{score:.3}"),
            Justification::Hypothesis => write!(f, "hypothesis"),
        }
    }
}

/// One line of a proof: a fact and why it holds.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProofStep {
    pub fact: Fact,
    pub justification: Justification,
}

/// An ordered justification chain ending in a conclusion line.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Proof {
    steps: Vec<ProofStep>,
    conclusion: String,
}

impl Proof {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append one step.
    pub fn push(&mut self, fact: Fact, justification: Justification) {
        self.steps.push(ProofStep {
            fact,
            justification,
        });
    }

    /// Concatenate a sub-proof's steps onto this one. The sub-proof's
    /// conclusion is dropped; only the outermost proof concludes.
    pub fn append(&mut self, sub: Proof) {
        self.steps.extend(sub.steps);
    }

    pub fn conclude(mut self, conclusion: impl Into<String>) -> Self {
        self.conclusion = conclusion.into();
        self
    }

    pub fn steps(&self) -> &[ProofStep] {
        &self.steps
    }

    pub fn conclusion(&self) -> &str {
        &self.conclusion
    }

    pub fn len(&self) -> usize {
        self.steps.len()
    }

    pub fn is_empty(&self) -> bool {
        self.steps.is_empty()
    }

    /// Render to canonical text lines, one per step, then the conclusion.
    pub fn render(&self, registry: &SymbolRegistry) -> Vec<String> {
        let mut lines: Vec<String> = self
            .steps
            .iter()
            .map(|step| {
                format!(
                    "{} [{}]",
                    render_fact(&step.fact, registry),
                    step.justification
                )
            })
            .collect();
        if !self.conclusion.is_empty() {
            lines.push(format!("=> {}", self.conclusion));
        }
        lines
    }
}

/// Canonical text for a fact: `Subject RELATION Object`, with `NOT`
/// before the relation when negated.
pub fn render_fact(fact: &Fact, registry: &SymbolRegistry) -> String {
    let not = if fact.negated { "NOT " } else { "" };
    format!(
        "{} {}{} {}",
        registry.label_of(fact.subject),
        not,
        registry.label_of(fact.relation),
        registry.label_of(fact.object),
    )
}
