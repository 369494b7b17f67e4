//! # noema
//!
//! A neuro-symbolic knowledge engine: facts live as subject–relation–object
//! triples in a stack of branchable theories, and queries are answered by a
//! waterfall of symbolic proof strategies with a hyperdimensional-vector
//! fallback for approximate reasoning.
//!
//! ## Architecture
//!
//! - **Vector algebra** (`hdc`): strategy-tagged concept vectors with
//!   bind/bundle/similarity behind one pluggable contract
//! - **Fact store** (`store`): layered theory stack with O(1) branch/rollback
//!   and atomic staged batches
//! - **Contradiction detection** (`detect`): pre-commit consistency scan
//! - **Inference** (`infer`): priority-ordered proof strategies producing
//!   auditable proofs
//! - **Session** (`session`): line-oriented statement execution and rendering
//!
//! ## Library usage
//!
//! ```
//! use noema::session::{Session, SessionConfig};
//!
//! let mut session = Session::new(SessionConfig::default()).unwrap();
//! let env = session.run(&[
//!     "@f1 ASSERT Dog IS_A animal",
//!     "@f2 ASSERT animal HAS_PROPERTY Alive",
//!     "@q1 QUERY Dog HAS_PROPERTY Alive",
//! ]);
//! assert!(env.get("q1").is_some());
//! ```

pub mod config;
pub mod detect;
pub mod error;
pub mod hdc;
pub mod infer;
pub mod registry;
pub mod session;
pub mod store;
pub mod symbol;
