//! Exact symbolic strategy: a vector is the sorted set of atom codes it
//! was built from. Bind is symmetric difference, bundle is union,
//! similarity is Jaccard — all with zero approximation error.
//!
//! Tests use this mode to assert algebraic identities without tolerance
//! bands. Its tolerance is 0 and nothing below similarity 1 counts as
//! plausible, so the approximate fallback never fires under it.

use super::strategy::{VectorStrategy, check_bundle, check_pair};
use super::{ConceptVector, Geometry, StrategyKind, VectorData};
use crate::error::HdcError;

pub struct ExactStrategy;

impl ExactStrategy {
    fn payload<'a>(v: &'a ConceptVector) -> &'a [u64] {
        match v.data() {
            VectorData::Symbolic(atoms) => atoms,
            _ => unreachable!("exact vector with foreign payload"),
        }
    }
}

impl VectorStrategy for ExactStrategy {
    fn kind(&self) -> StrategyKind {
        StrategyKind::Exact
    }

    fn tolerance(&self) -> f32 {
        0.0
    }

    fn plausibility_threshold(&self) -> f32 {
        1.0
    }

    fn encode(&self, seed: u64, geometry: Geometry) -> ConceptVector {
        // The seed itself is the single atom; geometry is carried only so
        // mixed-geometry checks behave uniformly across strategies.
        ConceptVector::from_parts(self.kind(), geometry, VectorData::Symbolic(vec![seed]))
    }

    fn bind(&self, a: &ConceptVector, b: &ConceptVector) -> Result<ConceptVector, HdcError> {
        check_pair(self.kind(), a, b)?;
        let (left, right) = (Self::payload(a), Self::payload(b));
        let mut out = Vec::with_capacity(left.len() + right.len());
        let (mut i, mut j) = (0, 0);
        while i < left.len() && j < right.len() {
            match left[i].cmp(&right[j]) {
                std::cmp::Ordering::Less => {
                    out.push(left[i]);
                    i += 1;
                }
                std::cmp::Ordering::Greater => {
                    out.push(right[j]);
                    j += 1;
                }
                std::cmp::Ordering::Equal => {
                    i += 1;
                    j += 1;
                }
            }
        }
        out.extend_from_slice(&left[i..]);
        out.extend_from_slice(&right[j..]);
        Ok(ConceptVector::from_parts(
            self.kind(),
            a.geometry(),
            VectorData::Symbolic(out),
        ))
    }

    fn bundle(&self, vectors: &[&ConceptVector]) -> Result<ConceptVector, HdcError> {
        check_bundle(self.kind(), vectors)?;
        let mut union: Vec<u64> = vectors
            .iter()
            .flat_map(|v| Self::payload(v).iter().copied())
            .collect();
        union.sort_unstable();
        union.dedup();
        Ok(ConceptVector::from_parts(
            self.kind(),
            vectors[0].geometry(),
            VectorData::Symbolic(union),
        ))
    }

    fn similarity(&self, a: &ConceptVector, b: &ConceptVector) -> Result<f32, HdcError> {
        check_pair(self.kind(), a, b)?;
        let (left, right) = (Self::payload(a), Self::payload(b));
        let both = {
            let (mut i, mut j, mut count) = (0, 0, 0);
            while i < left.len() && j < right.len() {
                match left[i].cmp(&right[j]) {
                    std::cmp::Ordering::Less => i += 1,
                    std::cmp::Ordering::Greater => j += 1,
                    std::cmp::Ordering::Equal => {
                        count += 1;
                        i += 1;
                        j += 1;
                    }
                }
            }
            count
        };
        let union = left.len() + right.len() - both;
        if union == 0 {
            return Ok(1.0);
        }
        Ok(both as f32 / union as f32)
    }
}
