//! The common vector-strategy contract.
//!
//! Each strategy defines encoding plus the bind/bundle/similarity algebra
//! over its own payload representation. The engine only ever talks to the
//! [`VectorStrategy`] trait, so swapping the approximate backend is a
//! one-line configuration change.

use super::bitvec::BitVectorStrategy;
use super::dense::DenseStrategy;
use super::exact::ExactStrategy;
use super::sparse::SparseStrategy;
use super::{ConceptVector, Geometry, StrategyKind};
use crate::error::HdcError;

/// A hyperdimensional encoding and algebra.
///
/// Implementations must be deterministic: `encode` with the same seed and
/// geometry always produces byte-identical output, and all operations are
/// pure functions of their operands.
pub trait VectorStrategy: Send + Sync {
    /// The discriminant stamped onto every vector this strategy produces.
    fn kind(&self) -> StrategyKind;

    /// Similarity tolerance for approximate equality checks.
    fn tolerance(&self) -> f32;

    /// Minimum similarity for a `PLAUSIBLE` verdict from the approximate
    /// fallback strategy.
    fn plausibility_threshold(&self) -> f32;

    /// Deterministically encode a seed into a fresh concept vector.
    fn encode(&self, seed: u64, geometry: Geometry) -> ConceptVector;

    /// Associate two vectors into one.
    ///
    /// Bind is dissimilar to both inputs and invertible via [`unbind`].
    ///
    /// [`unbind`]: VectorStrategy::unbind
    fn bind(&self, a: &ConceptVector, b: &ConceptVector) -> Result<ConceptVector, HdcError>;

    /// Recover one bind operand given the other.
    ///
    /// Every built-in bind is self-inverse, so the default forwards to
    /// [`bind`](VectorStrategy::bind).
    fn unbind(&self, bound: &ConceptVector, key: &ConceptVector) -> Result<ConceptVector, HdcError> {
        self.bind(bound, key)
    }

    /// Superpose vectors into one that stays similar to each input.
    fn bundle(&self, vectors: &[&ConceptVector]) -> Result<ConceptVector, HdcError>;

    /// Similarity in `[0, 1]`; 1 exactly for identical vectors.
    fn similarity(&self, a: &ConceptVector, b: &ConceptVector) -> Result<f32, HdcError>;
}

/// Instantiate the strategy for a discriminant.
pub fn strategy_for(kind: StrategyKind) -> Box<dyn VectorStrategy> {
    match kind {
        StrategyKind::BitVector => Box::new(BitVectorStrategy),
        StrategyKind::Sparse => Box::new(SparseStrategy),
        StrategyKind::Dense => Box::new(DenseStrategy),
        StrategyKind::Exact => Box::new(ExactStrategy),
    }
}

/// Reject a foreign or differently-sized operand.
pub(crate) fn check_operand(kind: StrategyKind, v: &ConceptVector) -> Result<(), HdcError> {
    if v.strategy() != kind {
        return Err(HdcError::StrategyMismatch {
            left: kind.to_string(),
            right: v.strategy().to_string(),
        });
    }
    Ok(())
}

/// Reject mismatched operand pairs. Strategy tags are checked before
/// geometry so the caller sees the more fundamental problem first.
pub(crate) fn check_pair(
    kind: StrategyKind,
    a: &ConceptVector,
    b: &ConceptVector,
) -> Result<(), HdcError> {
    check_operand(kind, a)?;
    check_operand(kind, b)?;
    if a.geometry() != b.geometry() {
        return Err(HdcError::GeometryMismatch {
            expected: a.geometry().0,
            actual: b.geometry().0,
        });
    }
    Ok(())
}

/// Check a bundle operand list: non-empty and pairwise compatible.
pub(crate) fn check_bundle(
    kind: StrategyKind,
    vectors: &[&ConceptVector],
) -> Result<(), HdcError> {
    let first = vectors.first().ok_or(HdcError::EmptyBundle)?;
    check_operand(kind, first)?;
    for v in &vectors[1..] {
        check_pair(kind, first, v)?;
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn factory_returns_matching_kind() {
        for kind in [
            StrategyKind::BitVector,
            StrategyKind::Sparse,
            StrategyKind::Dense,
            StrategyKind::Exact,
        ] {
            assert_eq!(strategy_for(kind).kind(), kind);
        }
    }

    #[test]
    fn cross_strategy_bind_is_rejected() {
        let bitvec = strategy_for(StrategyKind::BitVector);
        let dense = strategy_for(StrategyKind::Dense);
        let a = bitvec.encode(1, Geometry::TEST);
        let b = dense.encode(1, Geometry::TEST);
        let result = bitvec.bind(&a, &b);
        assert!(matches!(result, Err(HdcError::StrategyMismatch { .. })));
    }

    #[test]
    fn cross_geometry_bind_is_rejected() {
        let strat = strategy_for(StrategyKind::BitVector);
        let a = strat.encode(1, Geometry(1_000));
        let b = strat.encode(1, Geometry(2_000));
        let result = strat.bind(&a, &b);
        assert!(matches!(result, Err(HdcError::GeometryMismatch { .. })));
    }

    #[test]
    fn empty_bundle_is_rejected() {
        let strat = strategy_for(StrategyKind::Sparse);
        let result = strat.bundle(&[]);
        assert!(matches!(result, Err(HdcError::EmptyBundle)));
    }

    #[test]
    fn unbind_recovers_bound_operand() {
        for kind in [
            StrategyKind::BitVector,
            StrategyKind::Sparse,
            StrategyKind::Exact,
        ] {
            let strat = strategy_for(kind);
            let a = strat.encode(11, Geometry::TEST);
            let b = strat.encode(22, Geometry::TEST);
            let bound = strat.bind(&a, &b).unwrap();
            let recovered = strat.unbind(&bound, &a).unwrap();
            assert_eq!(
                strat.similarity(&recovered, &b).unwrap(),
                1.0,
                "{kind} unbind must invert bind exactly"
            );
        }
    }
}
