//! Session-scoped reasoner configuration.
//!
//! Relation categories (transitive, inheritable, single-valued, ...), proof
//! strategy weights, depth bounds, and execution policies all live here
//! rather than in code: adding a relation category for a new domain is a
//! data change. A built-in default covers the common ontology relations and
//! every field is overridable from TOML.

use std::collections::BTreeSet;
use std::collections::HashMap;
use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::error::{ConfigError, NoemaResult};

/// What to do when a statement in a `run()` batch fails.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ErrorPolicy {
    /// Record the error in the environment and continue with the next
    /// statement. Prior statements stay applied.
    SkipAndContinue,
    /// Record the error and stop executing the remaining statements.
    /// Prior statements stay applied.
    Abort,
}

/// How a TEACH batch reacts to contradictions.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CommitPolicy {
    /// Reject the whole batch if any proposed fact contradicts.
    BlockBatch,
    /// Commit the clean facts and drop only the offending ones.
    BlockOffenders,
}

/// Session-scoped reasoner configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ReasonerConfig {
    /// Relations closed under transitivity (followed by the BFS strategy).
    pub transitive_relations: BTreeSet<String>,
    /// Relations inherited down the type hierarchy.
    pub inheritable_relations: BTreeSet<String>,
    /// Relations that define the type hierarchy itself.
    pub type_relations: BTreeSet<String>,
    /// Relations followed backward during abduction.
    pub causal_relations: BTreeSet<String>,
    /// Relations declared single-valued: a newer value supersedes an older
    /// one in the current view, and two simultaneous values are a
    /// contradiction.
    pub single_valued_relations: BTreeSet<String>,
    /// The relation declaring two types mutually exclusive.
    pub disjoint_relation: String,

    /// Depth bound for transitive closure search.
    pub max_transitive_depth: usize,
    /// Depth bound for recursive rule proving.
    pub max_rule_depth: usize,
    /// Confidence attached to closed-world `FALSE` verdicts.
    pub closed_world_confidence: f32,

    /// Proof method priority weights; higher runs earlier. Methods absent
    /// from the map keep their default weight.
    pub method_weights: HashMap<String, f32>,

    /// Per-statement error handling in `run()`.
    pub error_policy: ErrorPolicy,
    /// Contradiction handling for TEACH batches.
    pub commit_policy: CommitPolicy,
}

impl Default for ReasonerConfig {
    fn default() -> Self {
        let set = |items: &[&str]| items.iter().map(|s| s.to_string()).collect();
        Self {
            transitive_relations: set(&[
                "IS_A",
                "SUBTYPE_OF",
                "PART_OF",
                "LOCATED_IN",
                "CAUSES",
                "BEFORE",
                "AFTER",
            ]),
            inheritable_relations: set(&["HAS_PROPERTY", "HAS_PART", "CAN", "MADE_OF"]),
            type_relations: set(&["IS_A", "SUBTYPE_OF"]),
            causal_relations: set(&["CAUSES"]),
            single_valued_relations: BTreeSet::new(),
            disjoint_relation: "DISJOINT_WITH".to_string(),
            max_transitive_depth: 200,
            max_rule_depth: 32,
            closed_world_confidence: 0.8,
            method_weights: default_method_weights(),
            error_policy: ErrorPolicy::SkipAndContinue,
            commit_policy: CommitPolicy::BlockBatch,
        }
    }
}

/// Built-in method priority weights, mirroring the documented waterfall
/// order. Overridable per domain through `method_weights`.
pub fn default_method_weights() -> HashMap<String, f32> {
    [
        ("direct", 100.0),
        ("transitive", 90.0),
        ("property_inheritance", 80.0),
        ("rule_application", 70.0),
        ("argument_type_inference", 60.0),
        ("disjoint_negation", 50.0),
        ("closed_world", 40.0),
        ("approximate_similarity", 30.0),
        ("compound_csp", 20.0),
    ]
    .into_iter()
    .map(|(k, v)| (k.to_string(), v))
    .collect()
}

impl ReasonerConfig {
    /// Parse a config from TOML text. Missing fields keep their defaults.
    pub fn from_toml_str(text: &str) -> NoemaResult<Self> {
        let config: Self = toml::from_str(text).map_err(|e| ConfigError::Invalid {
            message: e.to_string(),
        })?;
        config.validate()?;
        Ok(config)
    }

    /// Load a config from a TOML file.
    pub fn from_path(path: impl AsRef<Path>) -> NoemaResult<Self> {
        let path = path.as_ref();
        let text = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.display().to_string(),
            source,
        })?;
        Self::from_toml_str(&text)
    }

    /// The effective weight for a proof method name.
    pub fn weight_of(&self, method: &str) -> f32 {
        self.method_weights
            .get(method)
            .copied()
            .or_else(|| default_method_weights().get(method).copied())
            .unwrap_or(0.0)
    }

    fn validate(&self) -> NoemaResult<()> {
        if self.max_transitive_depth == 0 {
            return Err(ConfigError::Invalid {
                message: "max_transitive_depth must be > 0".into(),
            }
            .into());
        }
        if self.max_rule_depth == 0 {
            return Err(ConfigError::Invalid {
                message: "max_rule_depth must be > 0".into(),
            }
            .into());
        }
        if !(0.0..=1.0).contains(&self.closed_world_confidence) {
            return Err(ConfigError::Invalid {
                message: "closed_world_confidence must be in [0, 1]".into(),
            }
            .into());
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_cover_core_ontology_relations() {
        let config = ReasonerConfig::default();
        assert!(config.transitive_relations.contains("IS_A"));
        assert!(config.transitive_relations.contains("PART_OF"));
        assert!(config.inheritable_relations.contains("HAS_PROPERTY"));
        assert!(config.causal_relations.contains("CAUSES"));
        assert_eq!(config.disjoint_relation, "DISJOINT_WITH");
        assert_eq!(config.max_transitive_depth, 200);
    }

    #[test]
    fn toml_override_merges_with_defaults() {
        let config = ReasonerConfig::from_toml_str(
            r#"
            transitive_relations = ["ANCESTOR_OF"]
            closed_world_confidence = 0.5
            error_policy = "abort"
            "#,
        )
        .unwrap();
        assert!(config.transitive_relations.contains("ANCESTOR_OF"));
        assert!(!config.transitive_relations.contains("IS_A"));
        assert_eq!(config.closed_world_confidence, 0.5);
        assert_eq!(config.error_policy, ErrorPolicy::Abort);
        // Untouched fields keep defaults.
        assert_eq!(config.max_rule_depth, 32);
        assert_eq!(config.commit_policy, CommitPolicy::BlockBatch);
    }

    #[test]
    fn from_path_reads_a_toml_file() {
        let dir = tempfile::TempDir::new().unwrap();
        let path = dir.path().join("reasoner.toml");
        std::fs::write(&path, "max_rule_depth = 8\n").unwrap();
        let config = ReasonerConfig::from_path(&path).unwrap();
        assert_eq!(config.max_rule_depth, 8);

        let missing = ReasonerConfig::from_path(dir.path().join("absent.toml"));
        assert!(missing.is_err());
    }

    #[test]
    fn invalid_depth_rejected() {
        let result = ReasonerConfig::from_toml_str("max_transitive_depth = 0");
        assert!(result.is_err());
    }

    #[test]
    fn weight_falls_back_to_builtin() {
        let mut config = ReasonerConfig::default();
        config.method_weights.clear();
        assert_eq!(config.weight_of("direct"), 100.0);
        assert_eq!(config.weight_of("no_such_method"), 0.0);

        config.method_weights.insert("direct".into(), 1.0);
        assert_eq!(config.weight_of("direct"), 1.0);
    }

    #[test]
    fn config_roundtrips_through_toml() {
        let config = ReasonerConfig::default();
        let text = toml::to_string(&config).unwrap();
        let back = ReasonerConfig::from_toml_str(&text).unwrap();
        assert_eq!(back.transitive_relations, config.transitive_relations);
        assert_eq!(back.max_transitive_depth, config.max_transitive_depth);
    }
}
