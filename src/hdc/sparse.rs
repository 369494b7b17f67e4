//! Sparse exponent-set strategy: a vector is the sorted set of its active
//! indices under the geometry modulus. Bind is symmetric difference,
//! bundle is union, similarity is the Jaccard index.
//!
//! Memory scales with the active population (1% of the geometry) rather
//! than the geometry itself, so very large spaces stay cheap.

use std::collections::BTreeSet;

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

use super::strategy::{VectorStrategy, check_bundle, check_pair};
use super::{ConceptVector, Geometry, StrategyKind, VectorData};
use crate::error::HdcError;

pub struct SparseStrategy;

impl SparseStrategy {
    /// Active indices per freshly encoded vector.
    fn population(geometry: Geometry) -> usize {
        (geometry.0 / 100).max(4)
    }

    fn payload<'a>(v: &'a ConceptVector) -> &'a [u32] {
        match v.data() {
            VectorData::Exponents(indices) => indices,
            _ => unreachable!("sparse vector with foreign payload"),
        }
    }

    /// Merge-walk two sorted index sets, counting overlap.
    fn intersection_union(a: &[u32], b: &[u32]) -> (usize, usize) {
        let (mut i, mut j, mut both) = (0, 0, 0);
        while i < a.len() && j < b.len() {
            match a[i].cmp(&b[j]) {
                std::cmp::Ordering::Less => i += 1,
                std::cmp::Ordering::Greater => j += 1,
                std::cmp::Ordering::Equal => {
                    both += 1;
                    i += 1;
                    j += 1;
                }
            }
        }
        (both, a.len() + b.len() - both)
    }
}

impl VectorStrategy for SparseStrategy {
    fn kind(&self) -> StrategyKind {
        StrategyKind::Sparse
    }

    fn tolerance(&self) -> f32 {
        0.05
    }

    fn plausibility_threshold(&self) -> f32 {
        0.15
    }

    fn encode(&self, seed: u64, geometry: Geometry) -> ConceptVector {
        let mut rng = StdRng::seed_from_u64(seed);
        let target = Self::population(geometry).min(geometry.0);
        let mut indices = BTreeSet::new();
        while indices.len() < target {
            indices.insert(rng.gen_range(0..geometry.0 as u32));
        }
        ConceptVector::from_parts(
            self.kind(),
            geometry,
            VectorData::Exponents(indices.into_iter().collect()),
        )
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
                // Shared indices cancel.
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
            VectorData::Exponents(out),
        ))
    }

    fn bundle(&self, vectors: &[&ConceptVector]) -> Result<ConceptVector, HdcError> {
        check_bundle(self.kind(), vectors)?;
        let mut union = BTreeSet::new();
        for v in vectors {
            union.extend(Self::payload(v).iter().copied());
        }
        Ok(ConceptVector::from_parts(
            self.kind(),
            vectors[0].geometry(),
            VectorData::Exponents(union.into_iter().collect()),
        ))
    }

    fn similarity(&self, a: &ConceptVector, b: &ConceptVector) -> Result<f32, HdcError> {
        check_pair(self.kind(), a, b)?;
        let (both, union) = Self::intersection_union(Self::payload(a), Self::payload(b));
        if union == 0 {
            // Two empty sets are identical.
            return Ok(1.0);
        }
        Ok(both as f32 / union as f32)
    }
}
