//! Pre-commit consistency scanning.
//!
//! The detector answers one question: would adding these proposed facts to
//! the current view make it inconsistent? Three independent checks run and
//! their findings are unioned. The scan is read-only over
//! (current view ∪ proposed facts); deciding what to do with the report is
//! the caller's policy.

use std::collections::{HashMap, HashSet, VecDeque};

use serde::{Deserialize, Serialize};

use crate::config::ReasonerConfig;
use crate::error::NoemaResult;
use crate::registry::SymbolRegistry;
use crate::store::{Fact, Pattern, TheoryStack};
use crate::symbol::{SymbolId, SymbolKind};

/// Which check found the problem.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ContradictionKind {
    /// An entity is typed as two mutually disjoint types.
    DisjointTypes,
    /// A statement and its explicit negation are both present.
    NegationClash,
    /// A single-valued property carries two different values.
    SingleValuedConflict,
}

impl std::fmt::Display for ContradictionKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ContradictionKind::DisjointTypes => write!(f, "disjoint_types"),
            ContradictionKind::NegationClash => write!(f, "negation_clash"),
            ContradictionKind::SingleValuedConflict => write!(f, "single_valued_conflict"),
        }
    }
}

/// One inconsistency found by the scan.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Contradiction {
    pub kind: ContradictionKind,
    /// The entity at fault, when the check is entity-centric.
    pub entity: Option<SymbolId>,
    /// The facts involved.
    pub facts: Vec<Fact>,
    /// Human-readable account with canonical labels.
    pub explanation: String,
}

/// The result of a consistency scan.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ContradictionReport {
    pub consistent: bool,
    pub contradictions: Vec<Contradiction>,
}

impl ContradictionReport {
    fn from_findings(contradictions: Vec<Contradiction>) -> Self {
        Self {
            consistent: contradictions.is_empty(),
            contradictions,
        }
    }

    /// Map each contradiction back to the proposed facts involved, by
    /// statement identity or entity match. Enables the block-offenders
    /// commit policy.
    pub fn offending_indices(&self, proposed: &[Fact]) -> Vec<usize> {
        let mut indices: Vec<usize> = proposed
            .iter()
            .enumerate()
            .filter(|(_, fact)| {
                self.contradictions.iter().any(|c| {
                    c.facts.iter().any(|f| f.same_statement(fact))
                        || c.entity.is_some_and(|e| e == fact.subject)
                })
            })
            .map(|(i, _)| i)
            .collect();
        indices.dedup();
        indices
    }

    /// One-line-per-finding rendering for error payloads.
    pub fn summary(&self) -> String {
        self.contradictions
            .iter()
            .map(|c| format!("[{}] {}", c.kind, c.explanation))
            .collect::<Vec<_>>()
            .join("; ")
    }
}

/// The consistency scanner. Relation categories are resolved from
/// configuration once at construction.
pub struct ContradictionDetector {
    type_relations: HashSet<SymbolId>,
    single_valued: HashSet<SymbolId>,
    disjoint_relation: SymbolId,
}

impl ContradictionDetector {
    /// Resolve the configured relation names against the registry.
    pub fn from_config(config: &ReasonerConfig, registry: &SymbolRegistry) -> NoemaResult<Self> {
        let mut type_relations = HashSet::new();
        for name in &config.type_relations {
            type_relations.insert(registry.intern(SymbolKind::Relation, name)?);
        }
        let mut single_valued = HashSet::new();
        for name in &config.single_valued_relations {
            single_valued.insert(registry.intern(SymbolKind::Relation, name)?);
        }
        let disjoint_relation =
            registry.intern(SymbolKind::Relation, &config.disjoint_relation)?;
        Ok(Self {
            type_relations,
            single_valued,
            disjoint_relation,
        })
    }

    /// Scan (current view ∪ proposed) for inconsistencies. Read-only; the
    /// union is assembled here and dropped on return.
    pub fn scan(
        &self,
        stack: &TheoryStack,
        proposed: &[Fact],
        registry: &SymbolRegistry,
    ) -> ContradictionReport {
        let visible = stack.facts_matching(Pattern::any()).cloned();
        let combined: Vec<Fact> = proposed.iter().cloned().chain(visible).collect();

        let mut findings = Vec::new();
        findings.extend(self.negation_clashes(&combined, registry));
        findings.extend(self.disjoint_violations(&combined, registry));
        findings.extend(self.single_valued_conflicts(&combined, registry));
        ContradictionReport::from_findings(findings)
    }

    // ---- negation clash ----

    fn negation_clashes(&self, facts: &[Fact], registry: &SymbolRegistry) -> Vec<Contradiction> {
        let mut polarity: HashMap<(SymbolId, SymbolId, SymbolId), [Option<&Fact>; 2]> =
            HashMap::new();
        for fact in facts {
            let slot = &mut polarity.entry(fact.triple()).or_default()[fact.negated as usize];
            if slot.is_none() {
                *slot = Some(fact);
            }
        }
        let mut findings = Vec::new();
        for (triple, [positive, negative]) in polarity {
            if let (Some(pos), Some(neg)) = (positive, negative) {
                let (s, r, o) = triple;
                findings.push(Contradiction {
                    kind: ContradictionKind::NegationClash,
                    entity: Some(s),
                    facts: vec![pos.clone(), neg.clone()],
                    explanation: format!(
                        "{} {} {} is asserted both positively and negatively",
                        registry.label_of(s),
                        registry.label_of(r),
                        registry.label_of(o),
                    ),
                });
            }
        }
        findings.sort_by_key(|c| c.facts[0].triple());
        findings
    }

    // ---- disjointness ----

    fn disjoint_violations(&self, facts: &[Fact], registry: &SymbolRegistry) -> Vec<Contradiction> {
        // Type edges for the ancestor closure, and the declared disjoint
        // pairs, both from positive facts only.
        let mut type_edges: HashMap<SymbolId, Vec<SymbolId>> = HashMap::new();
        let mut disjoint_pairs: Vec<(&Fact, SymbolId, SymbolId)> = Vec::new();
        for fact in facts {
            if fact.negated {
                continue;
            }
            if self.type_relations.contains(&fact.relation) {
                type_edges.entry(fact.subject).or_default().push(fact.object);
            } else if fact.relation == self.disjoint_relation {
                disjoint_pairs.push((fact, fact.subject, fact.object));
            }
        }
        if disjoint_pairs.is_empty() {
            return Vec::new();
        }

        let mut entities: Vec<SymbolId> = type_edges.keys().copied().collect();
        entities.sort_unstable();

        let mut findings = Vec::new();
        for entity in entities {
            let ancestors = ancestor_closure(entity, &type_edges);
            for (decl, a, b) in &disjoint_pairs {
                let hits_a = ancestors.contains(a);
                let hits_b = ancestors.contains(b);
                if hits_a && hits_b {
                    let involved: Vec<Fact> = facts
                        .iter()
                        .filter(|f| {
                            !f.negated
                                && f.subject == entity
                                && self.type_relations.contains(&f.relation)
                        })
                        .cloned()
                        .chain(std::iter::once((*decl).clone()))
                        .collect();
                    findings.push(Contradiction {
                        kind: ContradictionKind::DisjointTypes,
                        entity: Some(entity),
                        facts: involved,
                        explanation: format!(
                            "{} is typed as both {} and {}, which are declared disjoint",
                            registry.label_of(entity),
                            registry.label_of(*a),
                            registry.label_of(*b),
                        ),
                    });
                }
            }
        }
        findings
    }

    // ---- single-valued conflicts ----

    fn single_valued_conflicts(
        &self,
        facts: &[Fact],
        registry: &SymbolRegistry,
    ) -> Vec<Contradiction> {
        if self.single_valued.is_empty() {
            return Vec::new();
        }
        let mut values: HashMap<(SymbolId, SymbolId), Vec<&Fact>> = HashMap::new();
        for fact in facts {
            if fact.negated || !self.single_valued.contains(&fact.relation) {
                continue;
            }
            let group = values.entry((fact.subject, fact.relation)).or_default();
            if !group.iter().any(|f| f.object == fact.object) {
                group.push(fact);
            }
        }
        let mut keys: Vec<_> = values.keys().copied().collect();
        keys.sort_unstable();

        let mut findings = Vec::new();
        for key in keys {
            let group = &values[&key];
            if group.len() > 1 {
                let (subject, relation) = key;
                findings.push(Contradiction {
                    kind: ContradictionKind::SingleValuedConflict,
                    entity: Some(subject),
                    facts: group.iter().map(|f| (*f).clone()).collect(),
                    explanation: format!(
                        "{} {} has {} distinct values but is declared single-valued",
                        registry.label_of(subject),
                        registry.label_of(relation),
                        group.len(),
                    ),
                });
            }
        }
        findings
    }
}

/// Everything reachable from `start` over type edges, excluding `start`
/// itself unless it appears in a cycle. Visited-set bounded.
fn ancestor_closure(
    start: SymbolId,
    type_edges: &HashMap<SymbolId, Vec<SymbolId>>,
) -> HashSet<SymbolId> {
    let mut seen = HashSet::new();
    let mut queue: VecDeque<SymbolId> = type_edges
        .get(&start)
        .map(|targets| targets.iter().copied().collect())
        .unwrap_or_default();
    while let Some(node) = queue.pop_front() {
        if !seen.insert(node) {
            continue;
        }
        if let Some(targets) = type_edges.get(&node) {
            queue.extend(targets.iter().copied());
        }
    }
    seen
}
