//! Horn-clause-like rules with recursive sub-goal proving.
//!
//! Rules are written in canonical text: `IF <goal> THEN <goal>`, where a
//! goal is atoms joined by `AND` or by `OR`, and `?name` tokens are
//! variables. Proving unifies the query against a consequent leaf and then
//! proves the antecedent with backtracking, a cycle guard on ground
//! triples, and a depth bound.

use std::collections::{HashMap, HashSet};

use serde::{Deserialize, Serialize};

use crate::error::{NoemaResult, SessionError};
use crate::infer::proof::{Justification, Proof};
use crate::infer::view::FactView;
use crate::registry::SymbolRegistry;
use crate::store::{Fact, Pattern};
use crate::symbol::{SymbolId, SymbolKind};

/// A constant or a `?variable` slot in a rule atom.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum Term {
    Const(SymbolId),
    Var(String),
}

/// One triple pattern inside a rule.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RuleAtom {
    pub subject: Term,
    pub relation: Term,
    pub object: Term,
    pub negated: bool,
}

/// A rule goal: a single atom, or atoms under one connective.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum Goal {
    Atom(RuleAtom),
    And(Vec<Goal>),
    Or(Vec<Goal>),
}

impl Goal {
    /// The atoms of this goal, left to right.
    pub fn leaves(&self) -> Vec<&RuleAtom> {
        match self {
            Goal::Atom(atom) => vec![atom],
            Goal::And(goals) | Goal::Or(goals) => {
                goals.iter().flat_map(|g| g.leaves()).collect()
            }
        }
    }
}

/// A named implication.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Rule {
    pub name: String,
    pub antecedent: Goal,
    pub consequent: Goal,
}

impl Rule {
    /// Parse `IF <goal> THEN <goal>`, interning constants as they appear.
    pub fn parse(name: &str, text: &str, registry: &SymbolRegistry) -> NoemaResult<Self> {
        let rest = text.trim().strip_prefix("IF ").ok_or_else(|| parse_err(
            "rule must start with IF",
        ))?;
        let (antecedent_text, consequent_text) =
            rest.split_once(" THEN ").ok_or_else(|| parse_err(
                "rule must contain THEN",
            ))?;
        Ok(Self {
            name: name.to_string(),
            antecedent: parse_goal(antecedent_text, registry)?,
            consequent: parse_goal(consequent_text, registry)?,
        })
    }

    /// Canonical text rendering.
    pub fn render(&self, registry: &SymbolRegistry) -> String {
        format!(
            "{}: IF {} THEN {}",
            self.name,
            render_goal(&self.antecedent, registry),
            render_goal(&self.consequent, registry),
        )
    }
}

fn parse_err(message: &str) -> SessionError {
    SessionError::Parse {
        message: message.to_string(),
    }
}

fn parse_goal(text: &str, registry: &SymbolRegistry) -> NoemaResult<Goal> {
    let text = text.trim();
    let (connective, parts): (&str, Vec<&str>) = if text.contains(" AND ") {
        if text.contains(" OR ") {
            return Err(parse_err("a goal may use AND or OR, not both").into());
        }
        ("AND", text.split(" AND ").collect())
    } else if text.contains(" OR ") {
        ("OR", text.split(" OR ").collect())
    } else {
        ("", vec![text])
    };

    let mut atoms = Vec::with_capacity(parts.len());
    for part in parts {
        atoms.push(Goal::Atom(parse_atom(part, registry)?));
    }
    Ok(match connective {
        "AND" => Goal::And(atoms),
        "OR" => Goal::Or(atoms),
        _ => atoms.into_iter().next().expect("one atom parsed"),
    })
}

fn parse_atom(text: &str, registry: &SymbolRegistry) -> NoemaResult<RuleAtom> {
    let tokens: Vec<&str> = text.split_whitespace().collect();
    let (negated, tokens) = match tokens.as_slice() {
        [s, "NOT", r, o] => (true, [*s, *r, *o]),
        [s, r, o] => (false, [*s, *r, *o]),
        _ => {
            return Err(parse_err(&format!(
                "atom must be `Subject [NOT] RELATION Object`, got `{text}`"
            ))
            .into());
        }
    };
    Ok(RuleAtom {
        subject: parse_term(tokens[0], SymbolKind::Entity, registry)?,
        relation: parse_term(tokens[1], SymbolKind::Relation, registry)?,
        object: parse_term(tokens[2], SymbolKind::Entity, registry)?,
        negated,
    })
}

fn parse_term(token: &str, kind: SymbolKind, registry: &SymbolRegistry) -> NoemaResult<Term> {
    if let Some(var) = token.strip_prefix('?') {
        if var.is_empty() {
            return Err(parse_err("variable name must not be empty").into());
        }
        return Ok(Term::Var(var.to_string()));
    }
    Ok(Term::Const(registry.intern(kind, token)?))
}

fn render_term(term: &Term, registry: &SymbolRegistry) -> String {
    match term {
        Term::Const(id) => registry.label_of(*id),
        Term::Var(name) => format!("?{name}"),
    }
}

fn render_goal(goal: &Goal, registry: &SymbolRegistry) -> String {
    match goal {
        Goal::Atom(atom) => {
            let not = if atom.negated { "NOT " } else { "" };
            format!(
                "{} {}{} {}",
                render_term(&atom.subject, registry),
                not,
                render_term(&atom.relation, registry),
                render_term(&atom.object, registry),
            )
        }
        Goal::And(goals) => goals
            .iter()
            .map(|g| render_goal(g, registry))
            .collect::<Vec<_>>()
            .join(" AND "),
        Goal::Or(goals) => goals
            .iter()
            .map(|g| render_goal(g, registry))
            .collect::<Vec<_>>()
            .join(" OR "),
    }
}

// ---------------------------------------------------------------------------
// Proving
// ---------------------------------------------------------------------------

pub type Bindings = HashMap<String, SymbolId>;

fn resolve(term: &Term, bindings: &Bindings) -> Option<SymbolId> {
    match term {
        Term::Const(id) => Some(*id),
        Term::Var(name) => bindings.get(name).copied(),
    }
}

/// Bind `term` to `value`, failing on a conflicting earlier binding.
fn bind(term: &Term, value: SymbolId, bindings: &mut Bindings) -> bool {
    match term {
        Term::Const(id) => *id == value,
        Term::Var(name) => match bindings.get(name) {
            Some(bound) => *bound == value,
            None => {
                bindings.insert(name.clone(), value);
                true
            }
        },
    }
}

/// Recursive rule prover with backtracking over candidate facts.
pub struct RuleProver<'a> {
    rules: &'a [Rule],
    view: &'a FactView<'a>,
    max_depth: usize,
}

impl<'a> RuleProver<'a> {
    pub fn new(rules: &'a [Rule], view: &'a FactView<'a>, max_depth: usize) -> Self {
        Self {
            rules,
            view,
            max_depth,
        }
    }

    /// Prove a ground query triple through the rule base. Returns the
    /// concatenated proof and the product of sub-proof confidences.
    pub fn prove_query(
        &self,
        subject: SymbolId,
        relation: SymbolId,
        object: SymbolId,
    ) -> Option<(Proof, f32)> {
        let mut guard = HashSet::new();
        self.prove_triple(subject, relation, object, 0, &mut guard)
    }

    fn prove_triple(
        &self,
        subject: SymbolId,
        relation: SymbolId,
        object: SymbolId,
        depth: usize,
        guard: &mut HashSet<(SymbolId, SymbolId, SymbolId)>,
    ) -> Option<(Proof, f32)> {
        if depth >= self.max_depth {
            return None;
        }
        // Cycle guard: a goal already on the current proving path cannot
        // justify itself.
        if !guard.insert((subject, relation, object)) {
            return None;
        }
        let mut found = None;
        'rules: for rule in self.rules {
            for leaf in rule.consequent.leaves() {
                if leaf.negated {
                    continue;
                }
                let mut bindings = Bindings::new();
                if !(bind(&leaf.subject, subject, &mut bindings)
                    && bind(&leaf.relation, relation, &mut bindings)
                    && bind(&leaf.object, object, &mut bindings))
                {
                    continue;
                }
                if let Some((_, mut proof, confidence)) =
                    self.solve(&rule.antecedent, bindings, depth, guard)
                {
                    proof.push(
                        Fact::new(subject, relation, object).with_confidence(confidence),
                        Justification::Rule(rule.name.clone()),
                    );
                    found = Some((proof, confidence));
                    break 'rules;
                }
            }
        }
        guard.remove(&(subject, relation, object));
        found
    }

    fn solve(
        &self,
        goal: &Goal,
        bindings: Bindings,
        depth: usize,
        guard: &mut HashSet<(SymbolId, SymbolId, SymbolId)>,
    ) -> Option<(Bindings, Proof, f32)> {
        match goal {
            Goal::Atom(atom) => self
                .atom_solutions(atom, &bindings, depth, guard)
                .into_iter()
                .next(),
            Goal::And(goals) => self.solve_all(goals, bindings, depth, guard),
            Goal::Or(goals) => goals
                .iter()
                .find_map(|g| self.solve(g, bindings.clone(), depth, guard)),
        }
    }

    /// Prove a conjunction left to right, backtracking over each atom's
    /// candidate solutions.
    fn solve_all(
        &self,
        goals: &[Goal],
        bindings: Bindings,
        depth: usize,
        guard: &mut HashSet<(SymbolId, SymbolId, SymbolId)>,
    ) -> Option<(Bindings, Proof, f32)> {
        let Some((first, rest)) = goals.split_first() else {
            return Some((bindings, Proof::new(), 1.0));
        };
        let candidates = match first {
            Goal::Atom(atom) => self.atom_solutions(atom, &bindings, depth, guard),
            nested => self
                .solve(nested, bindings.clone(), depth, guard)
                .into_iter()
                .collect(),
        };
        for (next_bindings, mut proof, confidence) in candidates {
            if let Some((final_bindings, rest_proof, rest_confidence)) =
                self.solve_all(rest, next_bindings, depth, guard)
            {
                proof.append(rest_proof);
                return Some((final_bindings, proof, confidence * rest_confidence));
            }
        }
        None
    }

    /// All ways to satisfy one atom under the current bindings.
    fn atom_solutions(
        &self,
        atom: &RuleAtom,
        bindings: &Bindings,
        depth: usize,
        guard: &mut HashSet<(SymbolId, SymbolId, SymbolId)>,
    ) -> Vec<(Bindings, Proof, f32)> {
        let subject = resolve(&atom.subject, bindings);
        let relation = resolve(&atom.relation, bindings);
        let object = resolve(&atom.object, bindings);

        // Fully ground atoms may also be satisfied by derivation.
        if let (Some(s), Some(r), Some(o)) = (subject, relation, object) {
            if let Some(fact) = self.view.statement_of(s, r, o) {
                if fact.negated == atom.negated {
                    let mut proof = Proof::new();
                    proof.push(fact.clone(), Justification::Given);
                    return vec![(bindings.clone(), proof, fact.confidence)];
                }
                // The opposite polarity is visible; the atom fails.
                return Vec::new();
            }
            if atom.negated {
                return Vec::new();
            }
            if self.view.relations().transitive.contains(&r) {
                if let Some(chain) = self.view.shortest_chain(s, o, r) {
                    let confidence: f32 = chain.iter().map(|hop| hop.confidence).product();
                    let mut proof = Proof::new();
                    for hop in chain {
                        proof.push(hop.clone(), Justification::Transitive);
                    }
                    return vec![(bindings.clone(), proof, confidence)];
                }
            }
            return self
                .prove_triple(s, r, o, depth + 1, guard)
                .map(|(proof, confidence)| (bindings.clone(), proof, confidence))
                .into_iter()
                .collect();
        }

        // Free variables remain: enumerate visible facts of the right
        // polarity and unify.
        let mut pattern = Pattern::any();
        if let Some(s) = subject {
            pattern = pattern.subject(s);
        }
        if let Some(r) = relation {
            pattern = pattern.relation(r);
        }
        if let Some(o) = object {
            pattern = pattern.object(o);
        }
        let mut solutions = Vec::new();
        for fact in self.view.matching(pattern) {
            if fact.negated != atom.negated {
                continue;
            }
            let mut extended = bindings.clone();
            if bind(&atom.subject, fact.subject, &mut extended)
                && bind(&atom.relation, fact.relation, &mut extended)
                && bind(&atom.object, fact.object, &mut extended)
            {
                let mut proof = Proof::new();
                proof.push(fact.clone(), Justification::Given);
                solutions.push((extended, proof, fact.confidence));
            }
        }
        // Newest fact first, matching the iterator order.
        solutions
    }
}
