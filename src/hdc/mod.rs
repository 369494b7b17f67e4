//! Hyperdimensional vector algebra.
//!
//! Concept names are encoded as fixed-geometry vectors; bind, bundle, and
//! similarity operations turn the vector space into an approximate
//! associative memory. Four interchangeable strategies implement the same
//! contract:
//!
//! - [`bitvec::BitVectorStrategy`] — bit-population bipolar vectors
//! - [`sparse::SparseStrategy`] — sparse exponent-set vectors
//! - [`dense::DenseStrategy`] — continuous-metric f32 vectors
//! - [`exact::ExactStrategy`] — deterministic symbolic mode for testing
//!
//! Every vector carries its strategy and geometry tags; operations on
//! mismatched operands are rejected, never coerced. Explicit widening is a
//! separate operation, [`widen`].

pub mod bitvec;
pub mod dense;
pub mod exact;
pub mod item_memory;
pub mod sparse;
pub mod strategy;

use serde::{Deserialize, Serialize};

use crate::error::HdcError;

/// Configurable vector geometry (number of components).
///
/// For the sparse strategy the geometry is the exponent modulus; the active
/// population is derived from it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Geometry(pub usize);

impl Geometry {
    /// Standard high-capacity geometry.
    pub const DEFAULT: Self = Self(10_000);

    /// Smaller geometry for fast testing.
    pub const TEST: Self = Self(1_000);

    /// Number of bytes needed to store a bit-packed vector at this geometry.
    pub fn bit_byte_len(self) -> usize {
        (self.0 + 7) / 8
    }
}

impl Default for Geometry {
    fn default() -> Self {
        Self::DEFAULT
    }
}

impl std::fmt::Display for Geometry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Discriminant identifying which strategy produced a vector.
///
/// Adding a strategy means adding a variant here plus one new strategy
/// implementation; existing strategies do not change.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StrategyKind {
    /// Bit-population bipolar vectors (XOR bind, majority bundle, Hamming).
    BitVector,
    /// Sparse exponent-set vectors (symmetric-difference bind, Jaccard).
    Sparse,
    /// Continuous-metric f32 vectors (Hadamard bind, cosine).
    Dense,
    /// Exact symbolic multiset mode for deterministic tests.
    Exact,
}

impl std::fmt::Display for StrategyKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            StrategyKind::BitVector => write!(f, "bitvec"),
            StrategyKind::Sparse => write!(f, "sparse"),
            StrategyKind::Dense => write!(f, "dense"),
            StrategyKind::Exact => write!(f, "exact"),
        }
    }
}

/// Strategy-specific vector payload.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum VectorData {
    /// Bit-packed components, bit `i` of byte `i / 8`.
    BitPacked(Vec<u8>),
    /// Sorted, deduplicated active exponent indices.
    Exponents(Vec<u32>),
    /// One f32 per component.
    Dense(Vec<f32>),
    /// Sorted atom codes (symbolic multiset, exact mode).
    Symbolic(Vec<u64>),
}

/// A concept vector: strategy- and geometry-tagged encoding of a name.
///
/// Vectors are immutable once created, and byte-identical for identical
/// (name, geometry, strategy).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ConceptVector {
    strategy: StrategyKind,
    geometry: Geometry,
    data: VectorData,
}

impl ConceptVector {
    /// Assemble a vector from its parts. Strategy implementations are the
    /// only intended callers.
    pub(crate) fn from_parts(strategy: StrategyKind, geometry: Geometry, data: VectorData) -> Self {
        Self {
            strategy,
            geometry,
            data,
        }
    }

    /// The strategy discriminant.
    pub fn strategy(&self) -> StrategyKind {
        self.strategy
    }

    /// The geometry tag.
    pub fn geometry(&self) -> Geometry {
        self.geometry
    }

    /// The raw payload.
    pub fn data(&self) -> &VectorData {
        &self.data
    }
}

/// Explicitly widen a vector to a larger geometry.
///
/// Bit-packed and dense payloads are zero-padded; exponent sets keep their
/// indices under the raised modulus; symbolic payloads are unchanged. This
/// is the only sanctioned way to mix geometries — the algebra itself never
/// pads implicitly.
pub fn widen(v: &ConceptVector, target: Geometry) -> Result<ConceptVector, HdcError> {
    if target.0 < v.geometry.0 {
        return Err(HdcError::NarrowingWiden {
            from: v.geometry.0,
            to: target.0,
        });
    }
    if target == v.geometry {
        return Ok(v.clone());
    }
    let data = match &v.data {
        VectorData::BitPacked(bytes) => {
            let mut out = bytes.clone();
            out.resize(target.bit_byte_len(), 0);
            VectorData::BitPacked(out)
        }
        VectorData::Exponents(indices) => VectorData::Exponents(indices.clone()),
        VectorData::Dense(values) => {
            let mut out = values.clone();
            out.resize(target.0, 0.0);
            VectorData::Dense(out)
        }
        VectorData::Symbolic(atoms) => VectorData::Symbolic(atoms.clone()),
    };
    Ok(ConceptVector::from_parts(v.strategy, target, data))
}
