//! Non-truth query forms: list matching, abduction, induction, analogy.
//!
//! Counterfactual queries are a push→query→pop choreography over the
//! store and live with the session, which owns the mutable stack.

use serde::{Deserialize, Serialize};

use crate::error::QueryError;
use crate::hdc::ConceptVector;
use crate::infer::strategies::QueryContext;
use crate::store::{Fact, Pattern};
use crate::symbol::SymbolId;

/// List every visible fact matching a wildcard pattern, newest first.
pub fn query_match(pattern: Pattern, ctx: &QueryContext<'_>) -> Vec<Fact> {
    ctx.view.matching(pattern).cloned().collect()
}

/// A candidate cause for an observed effect.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Hypothesis {
    pub cause: SymbolId,
    /// The causal chain from the cause down to the effect.
    pub path: Vec<Fact>,
    pub confidence: f32,
}

/// Follow causal edges backward from an observed effect.
///
/// Candidates are ranked by path length (direct causes first), ties by
/// canonical label; confidence decays with each causal hop.
pub fn abduce(effect: SymbolId, ctx: &QueryContext<'_>) -> Vec<Hypothesis> {
    let decay = ctx.config.closed_world_confidence;
    let mut hypotheses: Vec<Hypothesis> = ctx
        .view
        .causes_of(effect)
        .into_iter()
        .map(|(cause, path)| Hypothesis {
            cause,
            confidence: decay.powi(path.len() as i32),
            path: path.into_iter().cloned().collect(),
        })
        .collect();
    hypotheses.sort_by(|a, b| {
        a.path
            .len()
            .cmp(&b.path.len())
            .then_with(|| ctx.registry.label_of(a.cause).cmp(&ctx.registry.label_of(b.cause)))
    });
    hypotheses
}

/// Intersect the known positive (relation, object) profiles of two or
/// more entities. Returns the shared pairs with one supporting fact per
/// entity, ordered by canonical labels.
pub fn induce(
    entities: &[SymbolId],
    ctx: &QueryContext<'_>,
) -> Result<Vec<(SymbolId, SymbolId)>, QueryError> {
    if entities.len() < 2 {
        return Err(QueryError::Validation {
            message: "induction needs at least two entities to compare".to_string(),
        });
    }
    let mut shared: Vec<(SymbolId, SymbolId)> = ctx
        .view
        .profile_of(entities[0])
        .keys()
        .copied()
        .collect();
    for entity in &entities[1..] {
        let profile = ctx.view.profile_of(*entity);
        shared.retain(|pair| profile.contains_key(pair));
    }
    shared.sort_by_key(|(r, o)| (ctx.registry.label_of(*r), ctx.registry.label_of(*o)));
    Ok(shared)
}

/// The answer to `A : B :: C : ?`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AnalogyAnswer {
    /// The relation found linking A to B.
    pub relation: SymbolId,
    pub answer: SymbolId,
    /// Vector similarity of the answer to B, used as the tie-break score.
    pub similarity: f32,
}

/// Solve `A : B :: C : ?`: find the relation linking A and B, then the D
/// reached from C over the same relation. When several candidates exist,
/// vector similarity to B breaks the tie, then candidate order.
pub fn analogy(
    a: SymbolId,
    b: SymbolId,
    c: SymbolId,
    ctx: &QueryContext<'_>,
) -> Result<Option<AnalogyAnswer>, QueryError> {
    let strategy = ctx.memory.strategy();
    let b_vector = ctx.memory.get_or_encode(b, &ctx.registry.label_of(b));

    let mut best: Option<AnalogyAnswer> = None;
    for link in ctx.view.matching(Pattern::any().subject(a).object(b)) {
        if link.negated {
            continue;
        }
        for candidate in ctx.view.objects_of(c, link.relation) {
            if candidate.object == b {
                continue;
            }
            let d_vector: ConceptVector = ctx
                .memory
                .get_or_encode(candidate.object, &ctx.registry.label_of(candidate.object));
            let similarity = strategy.similarity(&d_vector, &b_vector)?;
            // Strictly-greater keeps the earliest candidate on ties.
            if best.as_ref().is_none_or(|prev| similarity > prev.similarity) {
                best = Some(AnalogyAnswer {
                    relation: link.relation,
                    answer: candidate.object,
                    similarity,
                });
            }
        }
    }
    Ok(best)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::ReasonerConfig;
    use crate::hdc::item_memory::ConceptMemory;
    use crate::hdc::{Geometry, StrategyKind};
    use crate::infer::view::{FactView, RelationSets};
    use crate::registry::SymbolRegistry;
    use crate::store::TheoryStack;
    use crate::symbol::SymbolKind;

    struct Fixture {
        registry: SymbolRegistry,
        stack: TheoryStack,
        config: ReasonerConfig,
        memory: ConceptMemory,
    }

    fn fixture() -> Fixture {
        Fixture {
            registry: SymbolRegistry::new(),
            stack: TheoryStack::new(),
            config: ReasonerConfig::default(),
            memory: ConceptMemory::new(StrategyKind::BitVector, Geometry::TEST),
        }
    }

    impl Fixture {
        fn assert(&mut self, s: &str, r: &str, o: &str) {
            let fact = Fact::new(
                self.registry.intern(SymbolKind::Entity, s).unwrap(),
                self.registry.intern(SymbolKind::Relation, r).unwrap(),
                self.registry.intern(SymbolKind::Entity, o).unwrap(),
            );
            self.stack.assert_fact(fact);
        }

        fn with_ctx<T>(&self, f: impl FnOnce(&QueryContext<'_>) -> T) -> T {
            let relations = RelationSets::from_config(&self.config, &self.registry).unwrap();
            let view = FactView::new(&self.stack, &relations, self.config.max_transitive_depth);
            let ctx = QueryContext {
                view: &view,
                registry: &self.registry,
                config: &self.config,
                memory: &self.memory,
                rules: &[],
            };
            f(&ctx)
        }
    }

    #[test]
    fn abduction_ranks_direct_cause_first() {
        let mut fx = fixture();
        fx.assert("Spark", "CAUSES", "Fire");
        fx.assert("Fire", "CAUSES", "Smoke");
        let smoke = fx.registry.lookup("Smoke").unwrap();

        let hypotheses = fx.with_ctx(|ctx| abduce(smoke, ctx));
        assert_eq!(hypotheses[0].cause, fx.registry.lookup("Fire").unwrap());
        assert_eq!(hypotheses[0].path.len(), 1);
        assert_eq!(hypotheses[1].cause, fx.registry.lookup("Spark").unwrap());
        assert!(hypotheses[1].confidence < hypotheses[0].confidence);
    }

    #[test]
    fn abduction_without_causes_is_empty() {
        let mut fx = fixture();
        fx.assert("Dog", "IS_A", "animal");
        let dog = fx.registry.lookup("Dog").unwrap();
        let hypotheses = fx.with_ctx(|ctx| abduce(dog, ctx));
        assert!(hypotheses.is_empty());
    }

    #[test]
    fn induction_intersects_profiles() {
        let mut fx = fixture();
        fx.assert("Dog", "HAS_PROPERTY", "Alive");
        fx.assert("Dog", "HAS_PROPERTY", "Furry");
        fx.assert("Cat", "HAS_PROPERTY", "Alive");
        fx.assert("Cat", "HAS_PROPERTY", "Furry");
        fx.assert("Fish", "HAS_PROPERTY", "Alive");

        let dog = fx.registry.lookup("Dog").unwrap();
        let cat = fx.registry.lookup("Cat").unwrap();
        let fish = fx.registry.lookup("Fish").unwrap();

        let two = fx.with_ctx(|ctx| induce(&[dog, cat], ctx)).unwrap();
        assert_eq!(two.len(), 2);
        let three = fx.with_ctx(|ctx| induce(&[dog, cat, fish], ctx)).unwrap();
        assert_eq!(three.len(), 1);
        assert_eq!(fx.registry.label_of(three[0].1), "Alive");
    }

    #[test]
    fn induction_needs_two_entities() {
        let mut fx = fixture();
        fx.assert("Dog", "IS_A", "animal");
        let dog = fx.registry.lookup("Dog").unwrap();
        let result = fx.with_ctx(|ctx| induce(&[dog], ctx));
        assert!(matches!(result, Err(QueryError::Validation { .. })));
    }

    #[test]
    fn analogy_follows_the_shared_relation() {
        let mut fx = fixture();
        // Paris : France :: Tokyo : ?
        fx.assert("Paris", "CAPITAL_OF", "France");
        fx.assert("Tokyo", "CAPITAL_OF", "Japan");
        let a = fx.registry.lookup("Paris").unwrap();
        let b = fx.registry.lookup("France").unwrap();
        let c = fx.registry.lookup("Tokyo").unwrap();

        let answer = fx.with_ctx(|ctx| analogy(a, b, c, ctx)).unwrap().unwrap();
        assert_eq!(answer.answer, fx.registry.lookup("Japan").unwrap());
        assert_eq!(answer.relation, fx.registry.lookup("CAPITAL_OF").unwrap());
    }

    #[test]
    fn analogy_without_link_is_none() {
        let mut fx = fixture();
        fx.assert("Paris", "CAPITAL_OF", "France");
        let a = fx.registry.lookup("Paris").unwrap();
        let b = fx.registry.lookup("France").unwrap();
        let c = fx.registry.intern(SymbolKind::Entity, "Tokyo").unwrap();
        let answer = fx.with_ctx(|ctx| analogy(a, b, c, ctx)).unwrap();
        assert!(answer.is_none());
    }
}
