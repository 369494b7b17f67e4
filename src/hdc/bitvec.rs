//! Bit-population strategy: dense binary vectors packed eight components
//! per byte. Bind is XOR, bundle is per-bit majority, similarity is
//! normalized Hamming agreement.

use rand::rngs::StdRng;
use rand::{RngCore, SeedableRng};

use super::strategy::{VectorStrategy, check_bundle, check_pair};
use super::{ConceptVector, Geometry, StrategyKind, VectorData};
use crate::error::HdcError;

/// Default high-capacity strategy.
///
/// Random pairs of vectors sit near similarity 0.5, identical vectors at
/// exactly 1.0, so the tolerance band is centered well away from chance.
pub struct BitVectorStrategy;

impl BitVectorStrategy {
    fn payload<'a>(v: &'a ConceptVector) -> &'a [u8] {
        match v.data() {
            VectorData::BitPacked(bytes) => bytes,
            // check_* guarantees the strategy tag, and BitVector vectors
            // always carry BitPacked payloads.
            _ => unreachable!("bitvec vector with foreign payload"),
        }
    }

    fn bit(bytes: &[u8], i: usize) -> bool {
        bytes[i / 8] & (1 << (i % 8)) != 0
    }
}

impl VectorStrategy for BitVectorStrategy {
    fn kind(&self) -> StrategyKind {
        StrategyKind::BitVector
    }

    fn tolerance(&self) -> f32 {
        0.05
    }

    fn plausibility_threshold(&self) -> f32 {
        0.62
    }

    fn encode(&self, seed: u64, geometry: Geometry) -> ConceptVector {
        let mut rng = StdRng::seed_from_u64(seed);
        let mut bytes = vec![0u8; geometry.bit_byte_len()];
        rng.fill_bytes(&mut bytes);
        // Zero the trailing bits past the geometry so equality and Hamming
        // distance see only real components.
        let excess = bytes.len() * 8 - geometry.0;
        if excess > 0 {
            if let Some(last) = bytes.last_mut() {
                *last &= 0xFF >> excess;
            }
        }
        ConceptVector::from_parts(self.kind(), geometry, VectorData::BitPacked(bytes))
    }

    fn bind(&self, a: &ConceptVector, b: &ConceptVector) -> Result<ConceptVector, HdcError> {
        check_pair(self.kind(), a, b)?;
        let bytes = Self::payload(a)
            .iter()
            .zip(Self::payload(b))
            .map(|(x, y)| x ^ y)
            .collect();
        Ok(ConceptVector::from_parts(
            self.kind(),
            a.geometry(),
            VectorData::BitPacked(bytes),
        ))
    }

    fn bundle(&self, vectors: &[&ConceptVector]) -> Result<ConceptVector, HdcError> {
        check_bundle(self.kind(), vectors)?;
        if vectors.len() == 1 {
            return Ok(vectors[0].clone());
        }
        let geometry = vectors[0].geometry();
        let mut counts = vec![0i32; geometry.0];
        for v in vectors {
            let bytes = Self::payload(v);
            for (i, count) in counts.iter_mut().enumerate() {
                *count += if Self::bit(bytes, i) { 1 } else { -1 };
            }
        }
        let mut bytes = vec![0u8; geometry.bit_byte_len()];
        for (i, &count) in counts.iter().enumerate() {
            // Ties (even operand counts) break on bit-index parity, which
            // keeps the result deterministic and near-balanced.
            let set = count > 0 || (count == 0 && i % 2 == 0);
            if set {
                bytes[i / 8] |= 1 << (i % 8);
            }
        }
        Ok(ConceptVector::from_parts(
            self.kind(),
            geometry,
            VectorData::BitPacked(bytes),
        ))
    }

    fn similarity(&self, a: &ConceptVector, b: &ConceptVector) -> Result<f32, HdcError> {
        check_pair(self.kind(), a, b)?;
        let distance: u32 = Self::payload(a)
            .iter()
            .zip(Self::payload(b))
            .map(|(x, y)| (x ^ y).count_ones())
            .sum();
        let sim = 1.0 - distance as f32 / a.geometry().0 as f32;
        Ok(sim.clamp(0.0, 1.0))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const GEO: Geometry = Geometry::TEST;

    #[test]
    fn encode_is_deterministic() {
        let strat = BitVectorStrategy;
        assert_eq!(strat.encode(42, GEO), strat.encode(42, GEO));
        assert_ne!(strat.encode(42, GEO), strat.encode(43, GEO));
    }

    #[test]
    fn self_similarity_is_exactly_one() {
        let strat = BitVectorStrategy;
        let v = strat.encode(7, GEO);
        assert_eq!(strat.similarity(&v, &v).unwrap(), 1.0);
    }

    #[test]
    fn random_pair_is_near_half_similarity() {
        let strat = BitVectorStrategy;
        let a = strat.encode(1, GEO);
        let b = strat.encode(2, GEO);
        let sim = strat.similarity(&a, &b).unwrap();
        assert!((0.4..0.6).contains(&sim), "sim was {sim}");
    }

    #[test]
    fn bind_is_self_inverse() {
        let strat = BitVectorStrategy;
        let a = strat.encode(1, GEO);
        let b = strat.encode(2, GEO);
        let bound = strat.bind(&a, &b).unwrap();
        let recovered = strat.unbind(&bound, &a).unwrap();
        assert_eq!(recovered, b);
    }

    #[test]
    fn bind_is_dissimilar_to_inputs() {
        let strat = BitVectorStrategy;
        let a = strat.encode(1, GEO);
        let b = strat.encode(2, GEO);
        let bound = strat.bind(&a, &b).unwrap();
        assert!(strat.similarity(&bound, &a).unwrap() < 0.62);
        assert!(strat.similarity(&bound, &b).unwrap() < 0.62);
    }

    #[test]
    fn bundle_stays_similar_to_members() {
        let strat = BitVectorStrategy;
        let a = strat.encode(1, GEO);
        let b = strat.encode(2, GEO);
        let c = strat.encode(3, GEO);
        let bundled = strat.bundle(&[&a, &b, &c]).unwrap();
        for member in [&a, &b, &c] {
            let sim = strat.similarity(&bundled, member).unwrap();
            assert!(sim > 0.62, "member sim was {sim}");
        }
        let stranger = strat.encode(99, GEO);
        assert!(strat.similarity(&bundled, &stranger).unwrap() < 0.62);
    }

    #[test]
    fn single_member_bundle_is_identity() {
        let strat = BitVectorStrategy;
        let a = strat.encode(5, GEO);
        assert_eq!(strat.bundle(&[&a]).unwrap(), a);
    }

    #[test]
    fn trailing_bits_are_masked() {
        let strat = BitVectorStrategy;
        let v = strat.encode(3, Geometry(10));
        match v.data() {
            VectorData::BitPacked(bytes) => {
                assert_eq!(bytes.len(), 2);
                assert_eq!(bytes[1] & 0b1111_1100, 0);
            }
            other => panic!("unexpected payload: {other:?}"),
        }
    }
}
