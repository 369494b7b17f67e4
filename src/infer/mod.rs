//! The inference engine: a priority-ordered waterfall of proof strategies.
//!
//! A truth query walks the configured strategies best-first and stops at
//! the first conclusive verdict. Exact symbolic strategies (direct match,
//! transitive closure, inheritance, rules, disjointness) run before the
//! closed-world and approximate fallbacks, and every verdict carries an
//! auditable [`Proof`].

pub mod proof;
pub mod queries;
pub mod rules;
pub mod strategies;
pub mod view;

pub use proof::{Justification, Proof, ProofStep};
pub use strategies::{InferenceEngine, Query, QueryContext};

use serde::{Deserialize, Serialize};

/// Six-valued verdict taxonomy.
///
/// `FALSE` (closed-world) is weaker than `FALSE_CERTAIN` (proven), and
/// `UNKNOWN` is a first-class answer distinct from both: absence of
/// evidence, not evidence of absence.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum TruthValue {
    TrueCertain,
    True,
    FalseCertain,
    False,
    Unknown,
    Plausible,
}

impl TruthValue {
    /// Whether this verdict stops the strategy waterfall.
    pub fn is_conclusive(self) -> bool {
        self != TruthValue::Unknown
    }

    /// Whether this verdict was proven rather than assumed or estimated.
    pub fn is_certain(self) -> bool {
        matches!(self, TruthValue::TrueCertain | TruthValue::FalseCertain)
    }
}

impl std::fmt::Display for TruthValue {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            TruthValue::TrueCertain => "TRUE_CERTAIN",
            TruthValue::True => "TRUE",
            TruthValue::FalseCertain => "FALSE_CERTAIN",
            TruthValue::False => "FALSE",
            TruthValue::Unknown => "UNKNOWN",
            TruthValue::Plausible => "PLAUSIBLE",
        };
        write!(f, "{s}")
    }
}

/// The structured answer to a truth query.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct InferenceResult {
    pub truth: TruthValue,
    /// Clamped to `[0, 1]`.
    pub confidence: f32,
    /// Name of the strategy that produced the verdict.
    pub method: String,
    pub proof: Proof,
}

impl InferenceResult {
    pub fn new(
        truth: TruthValue,
        confidence: f32,
        method: impl Into<String>,
        proof: Proof,
    ) -> Self {
        Self {
            truth,
            confidence: confidence.clamp(0.0, 1.0),
            method: method.into(),
            proof,
        }
    }

    /// The answer when nothing settles the query.
    pub fn unknown() -> Self {
        Self::new(TruthValue::Unknown, 0.0, "none", Proof::new())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn truth_value_serializes_screaming_snake() {
        let json = serde_json::to_string(&TruthValue::TrueCertain).unwrap();
        assert_eq!(json, "\"TRUE_CERTAIN\"");
        let json = serde_json::to_string(&TruthValue::Plausible).unwrap();
        assert_eq!(json, "\"PLAUSIBLE\"");
    }

    #[test]
    fn conclusiveness_and_certainty() {
        assert!(!TruthValue::Unknown.is_conclusive());
        assert!(TruthValue::Plausible.is_conclusive());
        assert!(TruthValue::FalseCertain.is_certain());
        assert!(!TruthValue::False.is_certain());
    }

    #[test]
    fn result_confidence_is_clamped() {
        let result = InferenceResult::new(TruthValue::True, 1.7, "direct", Proof::new());
        assert_eq!(result.confidence, 1.0);
    }
}
