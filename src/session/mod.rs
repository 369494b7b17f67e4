//! Session/runtime: the single entry point wiring store, engine, detector,
//! and vector algebra behind a line-oriented statement interface.
//!
//! Statements execute strictly in order within one [`Session::run`] call
//! and bind their outcome to `@name`, referencable as `$name` by later
//! statements in the same call. The environment does not persist across
//! calls; only store mutations survive.

pub mod describe;
pub mod ops;
pub mod parser;

use indexmap::IndexMap;
use serde::Serialize;

use crate::config::{ErrorPolicy, ReasonerConfig};
use crate::detect::ContradictionDetector;
use crate::error::{NoemaError, NoemaResult, QueryError};
use crate::hdc::item_memory::ConceptMemory;
use crate::hdc::{Geometry, StrategyKind};
use crate::infer::rules::Rule;
use crate::infer::strategies::{InferenceEngine, Query, QueryContext};
use crate::infer::view::{FactView, RelationSets};
use crate::infer::InferenceResult;
use crate::registry::SymbolRegistry;
use crate::store::TheoryStack;
use crate::symbol::SymbolId;

/// Construction-time session settings. The vector strategy and geometry
/// are fixed for the session's lifetime.
#[derive(Debug, Clone)]
pub struct SessionConfig {
    pub strategy: StrategyKind,
    pub geometry: Geometry,
    pub reasoner: ReasonerConfig,
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            strategy: StrategyKind::BitVector,
            geometry: Geometry::DEFAULT,
            reasoner: ReasonerConfig::default(),
        }
    }
}

impl SessionConfig {
    /// Small-geometry exact-strategy settings for fast deterministic tests.
    pub fn for_testing() -> Self {
        Self {
            strategy: StrategyKind::BitVector,
            geometry: Geometry::TEST,
            reasoner: ReasonerConfig::default(),
        }
    }
}

/// A hypothesis rendered for the environment.
#[derive(Debug, Clone, Serialize)]
pub struct HypothesisView {
    pub cause: String,
    pub path: Vec<String>,
    pub confidence: f32,
}

/// The structured result of one statement.
#[derive(Debug, Clone, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Outcome {
    Asserted {
        fact: String,
    },
    Retracted {
        fact: String,
    },
    Taught {
        committed: usize,
        rejected: usize,
    },
    Answer {
        truth: crate::infer::TruthValue,
        confidence: f32,
        method: String,
        proof: Vec<String>,
    },
    Matches {
        facts: Vec<String>,
    },
    Pushed {
        layer: String,
    },
    Popped {
        layer: String,
    },
    RuleAdded {
        rule: String,
    },
    Abduced {
        hypotheses: Vec<HypothesisView>,
    },
    Induced {
        shared: Vec<String>,
    },
    Analogy {
        relation: Option<String>,
        answer: Option<String>,
        similarity: f32,
    },
    Checked {
        consistent: bool,
        findings: Vec<String>,
    },
    Similar {
        hits: Vec<(String, f32)>,
    },
    Described {
        text: String,
    },
    Error {
        message: String,
    },
}

impl Outcome {
    /// The principal text spliced in for `$name` references.
    pub fn principal_text(&self) -> String {
        match self {
            Outcome::Asserted { fact } | Outcome::Retracted { fact } => fact.clone(),
            Outcome::Taught { committed, .. } => committed.to_string(),
            Outcome::Answer { truth, .. } => truth.to_string(),
            Outcome::Matches { facts } => facts.first().cloned().unwrap_or_default(),
            Outcome::Pushed { layer } | Outcome::Popped { layer } => layer.clone(),
            Outcome::RuleAdded { rule } => rule.clone(),
            Outcome::Abduced { hypotheses } => hypotheses
                .first()
                .map(|h| h.cause.clone())
                .unwrap_or_default(),
            Outcome::Induced { shared } => shared.first().cloned().unwrap_or_default(),
            Outcome::Analogy { answer, .. } => answer.clone().unwrap_or_default(),
            Outcome::Checked { consistent, .. } => consistent.to_string(),
            Outcome::Similar { hits } => hits.first().map(|(l, _)| l.clone()).unwrap_or_default(),
            Outcome::Described { text } => text.clone(),
            Outcome::Error { message } => message.clone(),
        }
    }
}

/// One environment binding: the outcome plus its cached principal text.
#[derive(Debug, Clone, Serialize)]
pub struct Binding {
    pub outcome: Outcome,
    text: String,
}

/// The ordered name→result environment returned by [`Session::run`].
#[derive(Debug, Clone, Default, Serialize)]
pub struct Environment {
    bindings: IndexMap<String, Binding>,
}

impl Environment {
    pub fn new() -> Self {
        Self::default()
    }

    fn insert(&mut self, name: String, outcome: Outcome) {
        let text = outcome.principal_text();
        self.bindings.insert(name, Binding { outcome, text });
    }

    pub fn get(&self, name: &str) -> Option<&Outcome> {
        self.bindings.get(name).map(|b| &b.outcome)
    }

    fn text_of(&self, name: &str) -> Option<&str> {
        self.bindings.get(name).map(|b| b.text.as_str())
    }

    /// Bindings in execution order.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &Outcome)> {
        self.bindings.iter().map(|(n, b)| (n.as_str(), &b.outcome))
    }

    pub fn len(&self) -> usize {
        self.bindings.len()
    }

    pub fn is_empty(&self) -> bool {
        self.bindings.is_empty()
    }

    /// Whether any statement in the run failed.
    pub fn has_errors(&self) -> bool {
        self.bindings
            .values()
            .any(|b| matches!(b.outcome, Outcome::Error { .. }))
    }
}

/// One reasoning session: private store, engine, detector, and vector
/// memory, wired behind statement execution. Single-writer by design.
pub struct Session {
    registry: SymbolRegistry,
    stack: TheoryStack,
    memory: ConceptMemory,
    detector: ContradictionDetector,
    engine: InferenceEngine,
    relations: RelationSets,
    rules: Vec<Rule>,
    reasoner: ReasonerConfig,
    operators: std::collections::HashMap<&'static str, ops::OpHandler>,
}

impl Session {
    pub fn new(config: SessionConfig) -> NoemaResult<Self> {
        let registry = SymbolRegistry::new();
        let relations = RelationSets::from_config(&config.reasoner, &registry)?;
        let detector = ContradictionDetector::from_config(&config.reasoner, &registry)?;
        let mut stack = TheoryStack::new();
        stack.set_single_valued(relations.single_valued.clone());
        tracing::debug!(
            strategy = %config.strategy,
            geometry = config.geometry.0,
            "session created"
        );
        Ok(Self {
            memory: ConceptMemory::new(config.strategy, config.geometry),
            engine: InferenceEngine::new(&config.reasoner),
            operators: ops::builtin_operators(),
            registry,
            stack,
            detector,
            relations,
            rules: Vec::new(),
            reasoner: config.reasoner,
        })
    }

    /// Execute statements in order, returning the name→result environment.
    ///
    /// A failing statement is recorded as an [`Outcome::Error`]; whether
    /// the remaining statements still run is the configured
    /// [`ErrorPolicy`]. Prior statements stay applied either way.
    pub fn run<S: AsRef<str>>(&mut self, statements: &[S]) -> Environment {
        let mut env = Environment::new();
        for line in statements {
            let line = line.as_ref();
            if line.trim().is_empty() {
                continue;
            }
            match self.execute(line, &env) {
                Ok((name, outcome)) => env.insert(name, outcome),
                Err((name, error)) => {
                    tracing::warn!(statement = line, error = %error, "statement failed");
                    let name = name.unwrap_or_else(|| format!("error_{}", env.len()));
                    env.insert(
                        name,
                        Outcome::Error {
                            message: error.to_string(),
                        },
                    );
                    if self.reasoner.error_policy == ErrorPolicy::Abort {
                        break;
                    }
                }
            }
        }
        env
    }

    fn execute(
        &mut self,
        line: &str,
        env: &Environment,
    ) -> Result<(String, Outcome), (Option<String>, NoemaError)> {
        let substituted =
            parser::substitute(line, |name| env.text_of(name)).map_err(|e| (None, e.into()))?;
        let statement = parser::parse_statement(&substituted).map_err(|e| (None, e.into()))?;
        let handler = *self
            .operators
            .get(statement.operation.as_str())
            .ok_or_else(|| {
                (
                    Some(statement.name.clone()),
                    crate::error::SessionError::UnknownOperator {
                        operator: statement.operation.clone(),
                    }
                    .into(),
                )
            })?;
        match handler(self, &statement.args) {
            Ok(outcome) => Ok((statement.name, outcome)),
            Err(error) => Err((Some(statement.name), error)),
        }
    }

    /// Run a truth query against the current view.
    pub fn decide(
        &self,
        subject: SymbolId,
        relation: SymbolId,
        object: SymbolId,
    ) -> Result<InferenceResult, QueryError> {
        self.with_ctx(|ctx| {
            self.engine.decide(
                &Query {
                    subject,
                    relation,
                    object,
                },
                ctx,
            )
        })
    }

    /// Assemble a read-only query context and pass it to `f`.
    pub(crate) fn with_ctx<T>(&self, f: impl FnOnce(&QueryContext<'_>) -> T) -> T {
        let view = FactView::new(
            &self.stack,
            &self.relations,
            self.reasoner.max_transitive_depth,
        );
        let ctx = QueryContext {
            view: &view,
            registry: &self.registry,
            config: &self.reasoner,
            memory: &self.memory,
            rules: &self.rules,
        };
        f(&ctx)
    }

    // ---- read-only accessors ----

    pub fn registry(&self) -> &SymbolRegistry {
        &self.registry
    }

    pub fn stack(&self) -> &TheoryStack {
        &self.stack
    }

    pub fn rules(&self) -> &[Rule] {
        &self.rules
    }

    pub fn memory(&self) -> &ConceptMemory {
        &self.memory
    }
}

impl std::fmt::Debug for Session {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Session")
            .field("symbols", &self.registry.len())
            .field("layers", &self.stack.depth())
            .field("rules", &self.rules.len())
            .finish()
    }
}
