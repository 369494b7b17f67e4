//! The proof strategies and the waterfall engine.
//!
//! Strategies are trait objects ordered by externally configurable method
//! weights. The engine tries them best-first and stops at the first
//! conclusive verdict, with one exception: a closed-world `FALSE` yields
//! to positive evidence found by a lower-priority strategy, because an
//! assumption should never outrank support.

use std::collections::{HashMap, HashSet};

use crate::config::ReasonerConfig;
use crate::error::QueryError;
use crate::hdc::ConceptVector;
use crate::hdc::item_memory::ConceptMemory;
use crate::infer::proof::{Justification, Proof, render_fact};
use crate::infer::rules::{Rule, RuleProver};
use crate::infer::view::FactView;
use crate::infer::{InferenceResult, TruthValue};
use crate::registry::SymbolRegistry;
use crate::store::Fact;
use crate::symbol::SymbolId;

/// A ground truth query.
#[derive(Debug, Clone, Copy)]
pub struct Query {
    pub subject: SymbolId,
    pub relation: SymbolId,
    pub object: SymbolId,
}

impl Query {
    pub fn fact(&self) -> Fact {
        Fact::new(self.subject, self.relation, self.object)
    }
}

/// Everything a strategy may consult. Strictly read-only.
pub struct QueryContext<'a> {
    pub view: &'a FactView<'a>,
    pub registry: &'a SymbolRegistry,
    pub config: &'a ReasonerConfig,
    pub memory: &'a ConceptMemory,
    pub rules: &'a [Rule],
}

impl QueryContext<'_> {
    fn vector_of(&self, id: SymbolId) -> ConceptVector {
        self.memory.get_or_encode(id, &self.registry.label_of(id))
    }
}

/// One proof strategy in the waterfall.
///
/// `prove` returns `Ok(None)` when the strategy has no opinion; only a
/// conclusive verdict stops the waterfall.
pub trait ProofStrategy: Send + Sync {
    fn name(&self) -> &'static str;
    fn prove(
        &self,
        query: &Query,
        ctx: &QueryContext<'_>,
    ) -> Result<Option<InferenceResult>, QueryError>;
}

// ---------------------------------------------------------------------------
// 1. Direct match
// ---------------------------------------------------------------------------

struct DirectMatch;

impl ProofStrategy for DirectMatch {
    fn name(&self) -> &'static str {
        "direct"
    }

    fn prove(
        &self,
        query: &Query,
        ctx: &QueryContext<'_>,
    ) -> Result<Option<InferenceResult>, QueryError> {
        let Some(fact) = ctx
            .view
            .statement_of(query.subject, query.relation, query.object)
        else {
            return Ok(None);
        };
        let truth = if fact.negated {
            TruthValue::FalseCertain
        } else {
            TruthValue::TrueCertain
        };
        let mut proof = Proof::new();
        proof.push(fact.clone(), Justification::Given);
        Ok(Some(InferenceResult::new(
            truth,
            fact.confidence,
            self.name(),
            proof,
        )))
    }
}

// ---------------------------------------------------------------------------
// 2. Transitive closure
// ---------------------------------------------------------------------------

struct TransitiveClosure;

impl ProofStrategy for TransitiveClosure {
    fn name(&self) -> &'static str {
        "transitive"
    }

    fn prove(
        &self,
        query: &Query,
        ctx: &QueryContext<'_>,
    ) -> Result<Option<InferenceResult>, QueryError> {
        if !ctx.view.relations().transitive.contains(&query.relation) {
            return Ok(None);
        }
        let Some(chain) = ctx
            .view
            .shortest_chain(query.subject, query.object, query.relation)
        else {
            return Ok(None);
        };
        let confidence: f32 = chain.iter().map(|hop| hop.confidence).product();
        let mut proof = Proof::new();
        for hop in chain {
            proof.push(hop.clone(), Justification::Transitive);
        }
        Ok(Some(InferenceResult::new(
            TruthValue::TrueCertain,
            confidence,
            self.name(),
            proof,
        )))
    }
}

// ---------------------------------------------------------------------------
// 3. Property inheritance
// ---------------------------------------------------------------------------

struct PropertyInheritance;

impl ProofStrategy for PropertyInheritance {
    fn name(&self) -> &'static str {
        "property_inheritance"
    }

    fn prove(
        &self,
        query: &Query,
        ctx: &QueryContext<'_>,
    ) -> Result<Option<InferenceResult>, QueryError> {
        if !ctx.view.relations().inheritable.contains(&query.relation) {
            return Ok(None);
        }
        for (ancestor, path) in ctx.view.type_closure(query.subject) {
            let Some(fact) = ctx.view.statement_of(ancestor, query.relation, query.object)
            else {
                continue;
            };
            let mut proof = Proof::new();
            for type_fact in path {
                proof.push(type_fact.clone(), Justification::Given);
            }
            proof.push(fact.clone(), Justification::Inherited);
            let truth = if fact.negated {
                TruthValue::FalseCertain
            } else {
                TruthValue::TrueCertain
            };
            return Ok(Some(InferenceResult::new(
                truth,
                fact.confidence,
                self.name(),
                proof,
            )));
        }
        Ok(None)
    }
}

// ---------------------------------------------------------------------------
// 4. Rule application
// ---------------------------------------------------------------------------

struct RuleApplication;

impl ProofStrategy for RuleApplication {
    fn name(&self) -> &'static str {
        "rule_application"
    }

    fn prove(
        &self,
        query: &Query,
        ctx: &QueryContext<'_>,
    ) -> Result<Option<InferenceResult>, QueryError> {
        if ctx.rules.is_empty() {
            return Ok(None);
        }
        let prover = RuleProver::new(ctx.rules, ctx.view, ctx.config.max_rule_depth);
        let Some((proof, confidence)) =
            prover.prove_query(query.subject, query.relation, query.object)
        else {
            return Ok(None);
        };
        Ok(Some(InferenceResult::new(
            TruthValue::True,
            confidence,
            self.name(),
            proof,
        )))
    }
}

// ---------------------------------------------------------------------------
// 5. Argument-type inference
// ---------------------------------------------------------------------------

struct ArgumentTypeInference;

impl ProofStrategy for ArgumentTypeInference {
    fn name(&self) -> &'static str {
        "argument_type_inference"
    }

    fn prove(
        &self,
        query: &Query,
        ctx: &QueryContext<'_>,
    ) -> Result<Option<InferenceResult>, QueryError> {
        // Forward: the subject relates to an instance of the queried type.
        for fact in ctx.view.objects_of(query.subject, query.relation) {
            if fact.object == query.object {
                continue;
            }
            for (ancestor, path) in ctx.view.type_closure(fact.object) {
                if ancestor == query.object {
                    let mut proof = Proof::new();
                    proof.push(fact.clone(), Justification::Given);
                    for type_fact in path {
                        proof.push(type_fact.clone(), Justification::TypeWitness);
                    }
                    return Ok(Some(InferenceResult::new(
                        TruthValue::True,
                        0.9,
                        self.name(),
                        proof,
                    )));
                }
            }
        }
        // Mirrored: an instance of the queried subject-type carries the
        // relation to the object.
        for fact in ctx.view.subjects_of(query.relation, query.object) {
            if fact.subject == query.subject {
                continue;
            }
            for (ancestor, path) in ctx.view.type_closure(fact.subject) {
                if ancestor == query.subject {
                    let mut proof = Proof::new();
                    proof.push(fact.clone(), Justification::Given);
                    for type_fact in path {
                        proof.push(type_fact.clone(), Justification::TypeWitness);
                    }
                    return Ok(Some(InferenceResult::new(
                        TruthValue::True,
                        0.9,
                        self.name(),
                        proof,
                    )));
                }
            }
        }
        Ok(None)
    }
}

// ---------------------------------------------------------------------------
// 6. Disjointness-based negation
// ---------------------------------------------------------------------------

struct DisjointNegation;

impl ProofStrategy for DisjointNegation {
    fn name(&self) -> &'static str {
        "disjoint_negation"
    }

    fn prove(
        &self,
        query: &Query,
        ctx: &QueryContext<'_>,
    ) -> Result<Option<InferenceResult>, QueryError> {
        if !ctx.view.relations().types.contains(&query.relation) {
            return Ok(None);
        }
        let declarations = ctx.view.disjoint_declarations();
        if declarations.is_empty() {
            return Ok(None);
        }

        // Types of the subject (with supporting paths) and the queried
        // type side (the object and its ancestors).
        let mut subject_side: HashMap<SymbolId, Vec<&Fact>> = HashMap::new();
        for (ancestor, path) in ctx.view.type_closure(query.subject) {
            subject_side.entry(ancestor).or_insert(path);
        }
        let mut object_side: HashSet<SymbolId> = HashSet::from([query.object]);
        object_side.extend(ctx.view.type_closure(query.object).into_iter().map(|(t, _)| t));

        for declaration in declarations {
            let (a, b) = (declaration.subject, declaration.object);
            let matched = if subject_side.contains_key(&a) && object_side.contains(&b) {
                Some(a)
            } else if subject_side.contains_key(&b) && object_side.contains(&a) {
                Some(b)
            } else {
                None
            };
            if let Some(subject_type) = matched {
                let mut proof = Proof::new();
                for type_fact in &subject_side[&subject_type] {
                    proof.push((*type_fact).clone(), Justification::Given);
                }
                proof.push(declaration.clone(), Justification::Disjoint);
                return Ok(Some(InferenceResult::new(
                    TruthValue::FalseCertain,
                    1.0,
                    self.name(),
                    proof,
                )));
            }
        }
        Ok(None)
    }
}

// ---------------------------------------------------------------------------
// 7. Closed-world fallback
// ---------------------------------------------------------------------------

struct ClosedWorld;

impl ProofStrategy for ClosedWorld {
    fn name(&self) -> &'static str {
        "closed_world"
    }

    fn prove(
        &self,
        query: &Query,
        ctx: &QueryContext<'_>,
    ) -> Result<Option<InferenceResult>, QueryError> {
        // "Known" here means the subject states something itself; an
        // entity seen only as an object is not closed over.
        let Some(known) = ctx.view.knows(query.subject) else {
            return Ok(None);
        };
        let mut proof = Proof::new();
        proof.push(known.clone(), Justification::ClosedWorld);
        Ok(Some(InferenceResult::new(
            TruthValue::False,
            ctx.config.closed_world_confidence,
            self.name(),
            proof,
        )))
    }
}

// ---------------------------------------------------------------------------
// 8. Approximate similarity fallback
// ---------------------------------------------------------------------------

struct ApproximateSimilarity;

impl ProofStrategy for ApproximateSimilarity {
    fn name(&self) -> &'static str {
        "approximate_similarity"
    }

    fn prove(
        &self,
        query: &Query,
        ctx: &QueryContext<'_>,
    ) -> Result<Option<InferenceResult>, QueryError> {
        // Peers: entities sharing a direct type with the subject. Their
        // objects under the queried relation form a bundled profile; if
        // the queried object sits inside that superposition, the claim is
        // plausible by association.
        let mut support: Vec<(&Fact, &Fact)> = Vec::new();
        for type_fact in ctx.view.direct_types(query.subject) {
            for peer_fact in ctx.view.subjects_of(type_fact.relation, type_fact.object) {
                if peer_fact.subject == query.subject {
                    continue;
                }
                for property in ctx.view.objects_of(peer_fact.subject, query.relation) {
                    support.push((peer_fact, property));
                }
            }
        }
        if support.is_empty() {
            return Ok(None);
        }

        let strategy = ctx.memory.strategy();
        let mut seen = HashSet::new();
        let mut members = Vec::new();
        for (_, property) in &support {
            if seen.insert(property.object) {
                members.push(ctx.vector_of(property.object));
            }
        }
        let refs: Vec<&ConceptVector> = members.iter().collect();
        let profile = strategy.bundle(&refs)?;
        let target = ctx.vector_of(query.object);
        let similarity = strategy.similarity(&target, &profile)?;
        if similarity < strategy.plausibility_threshold() {
            return Ok(None);
        }

        let mut proof = Proof::new();
        for (peer_fact, property) in support
            .iter()
            .filter(|(_, p)| p.object == query.object)
            .take(3)
        {
            proof.push((*peer_fact).clone(), Justification::Given);
            proof.push((*property).clone(), Justification::Similarity(similarity));
        }
        Ok(Some(InferenceResult::new(
            TruthValue::Plausible,
            similarity,
            self.name(),
            proof,
        )))
    }
}

// ---------------------------------------------------------------------------
// Engine
// ---------------------------------------------------------------------------

/// The strategy waterfall, ordered by configured method weights.
pub struct InferenceEngine {
    strategies: Vec<Box<dyn ProofStrategy>>,
}

impl InferenceEngine {
    pub fn new(config: &ReasonerConfig) -> Self {
        let mut strategies: Vec<Box<dyn ProofStrategy>> = vec![
            Box::new(DirectMatch),
            Box::new(TransitiveClosure),
            Box::new(PropertyInheritance),
            Box::new(RuleApplication),
            Box::new(ArgumentTypeInference),
            Box::new(DisjointNegation),
            Box::new(ClosedWorld),
            Box::new(ApproximateSimilarity),
        ];
        // Stable sort: equal weights keep the built-in order.
        strategies.sort_by(|a, b| {
            config
                .weight_of(b.name())
                .partial_cmp(&config.weight_of(a.name()))
                .unwrap_or(std::cmp::Ordering::Equal)
        });
        Self { strategies }
    }

    /// Strategy names in execution order.
    pub fn strategy_order(&self) -> Vec<&'static str> {
        self.strategies.iter().map(|s| s.name()).collect()
    }

    /// Decide a ground query. Never errors on unknown entities; malformed
    /// queries are rejected before reaching here.
    pub fn decide(
        &self,
        query: &Query,
        ctx: &QueryContext<'_>,
    ) -> Result<InferenceResult, QueryError> {
        let mut result = InferenceResult::unknown();
        for (i, strategy) in self.strategies.iter().enumerate() {
            let Some(verdict) = strategy.prove(query, ctx)? else {
                continue;
            };
            if verdict.truth == TruthValue::False {
                // A closed-world assumption yields to positive evidence
                // from any remaining strategy.
                if let Some(positive) = self.positive_after(i + 1, query, ctx)? {
                    result = positive;
                    break;
                }
            }
            result = verdict;
            break;
        }
        tracing::debug!(
            query = %render_fact(&query.fact(), ctx.registry),
            truth = %result.truth,
            method = result.method.as_str(),
            confidence = result.confidence,
            "query decided"
        );
        let conclusion = format!(
            "{} is {} ({}, confidence {:.2})",
            render_fact(&query.fact(), ctx.registry),
            result.truth,
            result.method,
            result.confidence,
        );
        result.proof = std::mem::take(&mut result.proof).conclude(conclusion);
        Ok(result)
    }

    fn positive_after(
        &self,
        start: usize,
        query: &Query,
        ctx: &QueryContext<'_>,
    ) -> Result<Option<InferenceResult>, QueryError> {
        for strategy in &self.strategies[start..] {
            if let Some(verdict) = strategy.prove(query, ctx)? {
                if matches!(
                    verdict.truth,
                    TruthValue::True | TruthValue::TrueCertain | TruthValue::Plausible
                ) {
                    return Ok(Some(verdict));
                }
            }
        }
        Ok(None)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::hdc::{Geometry, StrategyKind};
    use crate::store::TheoryStack;
    use crate::symbol::SymbolKind;

    struct Fixture {
        registry: SymbolRegistry,
        stack: TheoryStack,
        config: ReasonerConfig,
        memory: ConceptMemory,
        rules: Vec<Rule>,
        engine: InferenceEngine,
    }

    fn fixture() -> Fixture {
        let config = ReasonerConfig::default();
        Fixture {
            registry: SymbolRegistry::new(),
            stack: TheoryStack::new(),
            engine: InferenceEngine::new(&config),
            config,
            memory: ConceptMemory::new(StrategyKind::BitVector, Geometry::TEST),
            rules: Vec::new(),
        }
    }

    impl Fixture {
        fn fact(&mut self, line: &str) -> Fact {
            let tokens: Vec<&str> = line.split_whitespace().collect();
            let (negated, s, r, o) = match tokens.as_slice() {
                [s, "NOT", r, o] => (true, *s, *r, *o),
                [s, r, o] => (false, *s, *r, *o),
                _ => panic!("bad fact line: {line}"),
            };
            let mut fact = Fact::new(
                self.registry.intern(SymbolKind::Entity, s).unwrap(),
                self.registry.intern(SymbolKind::Relation, r).unwrap(),
                self.registry.intern(SymbolKind::Entity, o).unwrap(),
            );
            if negated {
                fact = fact.negated();
            }
            fact
        }

        fn assert(&mut self, line: &str) {
            let fact = self.fact(line);
            self.stack.assert_fact(fact);
        }

        fn assert_with_confidence(&mut self, line: &str, confidence: f32) {
            let fact = self.fact(line).with_confidence(confidence);
            self.stack.assert_fact(fact);
        }

        fn ask(&self, s: &str, r: &str, o: &str) -> InferenceResult {
            let relations =
                crate::infer::view::RelationSets::from_config(&self.config, &self.registry)
                    .unwrap();
            let view = FactView::new(&self.stack, &relations, self.config.max_transitive_depth);
            let ctx = QueryContext {
                view: &view,
                registry: &self.registry,
                config: &self.config,
                memory: &self.memory,
                rules: &self.rules,
            };
            let query = Query {
                subject: self.registry.intern(SymbolKind::Entity, s).unwrap(),
                relation: self.registry.intern(SymbolKind::Relation, r).unwrap(),
                object: self.registry.intern(SymbolKind::Entity, o).unwrap(),
            };
            self.engine.decide(&query, &ctx).unwrap()
        }
    }

    #[test]
    fn direct_match_is_certain() {
        let mut fx = fixture();
        fx.assert("Dog IS_A animal");
        let result = fx.ask("Dog", "IS_A", "animal");
        assert_eq!(result.truth, TruthValue::TrueCertain);
        assert_eq!(result.method, "direct");
        assert_eq!(result.confidence, 1.0);
        assert_eq!(result.proof.len(), 1);
    }

    #[test]
    fn direct_negation_is_certainly_false() {
        let mut fx = fixture();
        fx.assert("Penguin NOT CAN Fly");
        let result = fx.ask("Penguin", "CAN", "Fly");
        assert_eq!(result.truth, TruthValue::FalseCertain);
        assert_eq!(result.method, "direct");
    }

    #[test]
    fn transitive_chain_with_k_hop_proof() {
        let mut fx = fixture();
        fx.assert("A IS_A B");
        fx.assert("B IS_A C");
        fx.assert("C IS_A D");
        fx.assert("D IS_A E");

        let result = fx.ask("A", "IS_A", "E");
        assert_eq!(result.truth, TruthValue::TrueCertain);
        assert_eq!(result.method, "transitive");
        assert_eq!(result.proof.len(), 4);

        // No accidental symmetry.
        let reverse = fx.ask("E", "IS_A", "A");
        assert_ne!(reverse.truth, TruthValue::TrueCertain);
    }

    #[test]
    fn transitive_confidence_multiplies_hop_confidences() {
        let mut fx = fixture();
        fx.assert_with_confidence("Dog IS_A mammal", 0.5);
        fx.assert_with_confidence("mammal IS_A animal", 0.5);
        let result = fx.ask("Dog", "IS_A", "animal");
        assert_eq!(result.method, "transitive");
        assert_eq!(result.confidence, 0.25);
    }

    #[test]
    fn property_inheritance_two_step_proof() {
        let mut fx = fixture();
        fx.assert("Dog IS_A animal");
        fx.assert("animal HAS_PROPERTY Alive");
        let result = fx.ask("Dog", "HAS_PROPERTY", "Alive");
        assert_eq!(result.truth, TruthValue::TrueCertain);
        assert_eq!(result.method, "property_inheritance");
        assert_eq!(result.proof.len(), 2);
    }

    #[test]
    fn rule_application_fires() {
        let mut fx = fixture();
        fx.rules.push(
            Rule::parse("flight", "IF ?x IS_A bird THEN ?x CAN Fly", &fx.registry).unwrap(),
        );
        fx.assert("Sparky IS_A bird");
        let result = fx.ask("Sparky", "CAN", "Fly");
        assert_eq!(result.truth, TruthValue::True);
        assert_eq!(result.method, "rule_application");
    }

    #[test]
    fn argument_type_inference_forward() {
        let mut fx = fixture();
        fx.assert("Alice OWNS Car");
        fx.assert("Car IS_A vehicle");
        let result = fx.ask("Alice", "OWNS", "vehicle");
        assert_eq!(result.truth, TruthValue::True);
        assert_eq!(result.method, "argument_type_inference");
    }

    #[test]
    fn disjointness_yields_certain_false() {
        let mut fx = fixture();
        fx.assert("bird DISJOINT_WITH mammal");
        fx.assert("Sparky IS_A bird");
        let result = fx.ask("Sparky", "IS_A", "mammal");
        assert_eq!(result.truth, TruthValue::FalseCertain);
        assert_eq!(result.method, "disjoint_negation");
        // The proof cites the disjoint declaration.
        assert!(
            result
                .proof
                .steps()
                .iter()
                .any(|s| s.justification == Justification::Disjoint)
        );
    }

    #[test]
    fn closed_world_vs_unknown() {
        let mut fx = fixture();
        fx.assert("Alice IS_A human");
        let known = fx.ask("Alice", "IS_A", "reptile");
        assert_eq!(known.truth, TruthValue::False);
        assert_eq!(known.method, "closed_world");
        assert_eq!(known.confidence, 0.8);

        let unknown = fx.ask("Bob", "IS_A", "reptile");
        assert_eq!(unknown.truth, TruthValue::Unknown);
    }

    #[test]
    fn peer_support_beats_closed_world() {
        let mut fx = fixture();
        fx.assert("Rex IS_A dog");
        fx.assert("Fido IS_A dog");
        fx.assert("Buddy IS_A dog");
        fx.assert("Fido LIKES Bones");
        fx.assert("Buddy LIKES Bones");

        let result = fx.ask("Rex", "LIKES", "Bones");
        assert_eq!(result.truth, TruthValue::Plausible);
        assert_eq!(result.method, "approximate_similarity");
        assert!(result.confidence > 0.0);
    }

    #[test]
    fn unknown_relation_is_unknown_not_error() {
        let mut fx = fixture();
        fx.assert("Dog IS_A animal");
        let result = fx.ask("Ghost", "HAUNTS", "House");
        assert_eq!(result.truth, TruthValue::Unknown);
    }

    #[test]
    fn engine_order_follows_weights() {
        let config = ReasonerConfig::default();
        let engine = InferenceEngine::new(&config);
        let order = engine.strategy_order();
        assert_eq!(order[0], "direct");
        assert_eq!(order.last().copied(), Some("approximate_similarity"));

        let mut flipped = ReasonerConfig::default();
        flipped.method_weights.insert("direct".into(), 1.0);
        let engine = InferenceEngine::new(&flipped);
        assert_ne!(engine.strategy_order()[0], "direct");
    }
}
