//! Dense continuous strategy: one f32 per component, atoms drawn from
//! {-1, +1}. Bind is the Hadamard product, bundle is the normalized sum,
//! similarity is cosine clamped to `[0, 1]`.

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

use super::strategy::{VectorStrategy, check_bundle, check_pair};
use super::{ConceptVector, Geometry, StrategyKind, VectorData};
use crate::error::HdcError;

pub struct DenseStrategy;

impl DenseStrategy {
    fn payload<'a>(v: &'a ConceptVector) -> &'a [f32] {
        match v.data() {
            VectorData::Dense(values) => values,
            _ => unreachable!("dense vector with foreign payload"),
        }
    }

    fn norm(values: &[f32]) -> f32 {
        values.iter().map(|x| x * x).sum::<f32>().sqrt()
    }
}

impl VectorStrategy for DenseStrategy {
    fn kind(&self) -> StrategyKind {
        StrategyKind::Dense
    }

    fn tolerance(&self) -> f32 {
        0.02
    }

    fn plausibility_threshold(&self) -> f32 {
        0.35
    }

    fn encode(&self, seed: u64, geometry: Geometry) -> ConceptVector {
        let mut rng = StdRng::seed_from_u64(seed);
        let values = (0..geometry.0)
            .map(|_| if rng.gen_bool(0.5) { 1.0 } else { -1.0 })
            .collect();
        ConceptVector::from_parts(self.kind(), geometry, VectorData::Dense(values))
    }

    fn bind(&self, a: &ConceptVector, b: &ConceptVector) -> Result<ConceptVector, HdcError> {
        check_pair(self.kind(), a, b)?;
        let values = Self::payload(a)
            .iter()
            .zip(Self::payload(b))
            .map(|(x, y)| x * y)
            .collect();
        Ok(ConceptVector::from_parts(
            self.kind(),
            a.geometry(),
            VectorData::Dense(values),
        ))
    }

    fn bundle(&self, vectors: &[&ConceptVector]) -> Result<ConceptVector, HdcError> {
        check_bundle(self.kind(), vectors)?;
        let geometry = vectors[0].geometry();
        let mut sum = vec![0.0f32; geometry.0];
        for v in vectors {
            for (acc, x) in sum.iter_mut().zip(Self::payload(v)) {
                *acc += x;
            }
        }
        let norm = Self::norm(&sum);
        if norm > 0.0 {
            for x in &mut sum {
                *x /= norm;
            }
        }
        Ok(ConceptVector::from_parts(
            self.kind(),
            geometry,
            VectorData::Dense(sum),
        ))
    }

    fn similarity(&self, a: &ConceptVector, b: &ConceptVector) -> Result<f32, HdcError> {
        check_pair(self.kind(), a, b)?;
        // Identical payloads short-circuit so self-similarity is 1 exactly,
        // with no float rounding.
        if a.data() == b.data() {
            return Ok(1.0);
        }
        let (left, right) = (Self::payload(a), Self::payload(b));
        let dot: f32 = left.iter().zip(right).map(|(x, y)| x * y).sum();
        let denom = Self::norm(left) * Self::norm(right);
        if denom == 0.0 {
            return Ok(0.0);
        }
        Ok((dot / denom).clamp(0.0, 1.0))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const GEO: Geometry = Geometry::TEST;

    #[test]
    fn encode_is_deterministic_and_bipolar() {
        let strat = DenseStrategy;
        let v = strat.encode(42, GEO);
        assert_eq!(v, strat.encode(42, GEO));
        assert!(
            DenseStrategy::payload(&v)
                .iter()
                .all(|&x| x == 1.0 || x == -1.0)
        );
    }

    #[test]
    fn self_similarity_is_exactly_one() {
        let strat = DenseStrategy;
        let v = strat.encode(7, GEO);
        assert_eq!(strat.similarity(&v, &v).unwrap(), 1.0);
        // Also exact after bundling, where components are no longer ±1.
        let w = strat.encode(8, GEO);
        let bundled = strat.bundle(&[&v, &w]).unwrap();
        assert_eq!(strat.similarity(&bundled, &bundled).unwrap(), 1.0);
    }

    #[test]
    fn random_pair_is_near_zero_similarity() {
        let strat = DenseStrategy;
        let a = strat.encode(1, GEO);
        let b = strat.encode(2, GEO);
        // Negative cosines clamp to 0, so the range check is one-sided.
        assert!(strat.similarity(&a, &b).unwrap() < 0.35);
    }

    #[test]
    fn bind_is_self_inverse_on_atoms() {
        let strat = DenseStrategy;
        let a = strat.encode(1, GEO);
        let b = strat.encode(2, GEO);
        let bound = strat.bind(&a, &b).unwrap();
        let recovered = strat.unbind(&bound, &a).unwrap();
        // ±1 components square to 1, so recovery is exact.
        assert_eq!(recovered, b);
    }

    #[test]
    fn bundle_stays_similar_to_members() {
        let strat = DenseStrategy;
        let a = strat.encode(1, GEO);
        let b = strat.encode(2, GEO);
        let c = strat.encode(3, GEO);
        let bundled = strat.bundle(&[&a, &b, &c]).unwrap();
        for member in [&a, &b, &c] {
            assert!(strat.similarity(&bundled, member).unwrap() > 0.35);
        }
        let stranger = strat.encode(99, GEO);
        assert!(strat.similarity(&bundled, &stranger).unwrap() < 0.35);
    }

    #[test]
    fn bundle_is_unit_length() {
        let strat = DenseStrategy;
        let a = strat.encode(1, GEO);
        let b = strat.encode(2, GEO);
        let bundled = strat.bundle(&[&a, &b]).unwrap();
        let norm = DenseStrategy::norm(DenseStrategy::payload(&bundled));
        assert!((norm - 1.0).abs() < 1e-4, "norm was {norm}");
    }
}
