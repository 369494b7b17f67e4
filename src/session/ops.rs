//! The built-in statement operators.
//!
//! Each operator is a plain function taking the session and the raw
//! argument text; dispatch is a name→handler map so the set is closed
//! over at construction and lookup stays O(1).

use std::collections::{HashMap, HashSet};

use crate::config::CommitPolicy;
use crate::error::{NoemaResult, QueryError, SessionError, StoreError};
use crate::infer::proof::render_fact;
use crate::infer::queries::{abduce, analogy, induce, query_match};
use crate::infer::rules::Rule;
use crate::store::{Pattern, StagedBatch};
use crate::symbol::{SymbolId, SymbolKind};

use super::describe::{self, DescribeOptions};
use super::parser::{parse_fact_line, split_fact_list};
use super::{HypothesisView, Outcome, Session};

pub(crate) type OpHandler = fn(&mut Session, &str) -> NoemaResult<Outcome>;

/// The full operator table.
pub(crate) fn builtin_operators() -> HashMap<&'static str, OpHandler> {
    let mut table: HashMap<&'static str, OpHandler> = HashMap::new();
    table.insert("ASSERT", op_assert);
    table.insert("RETRACT", op_retract);
    table.insert("TEACH", op_teach);
    table.insert("QUERY", op_query);
    table.insert("MATCH", op_match);
    table.insert("PUSH", op_push);
    table.insert("POP", op_pop);
    table.insert("RULE", op_rule);
    table.insert("ABDUCE", op_abduce);
    table.insert("INDUCE", op_induce);
    table.insert("ANALOGY", op_analogy);
    table.insert("WHATIF", op_whatif);
    table.insert("CHECK", op_check);
    table.insert("SIMILAR", op_similar);
    table.insert("DESCRIBE", op_describe);
    table
}

// ---- store mutation ----

fn op_assert(session: &mut Session, args: &str) -> NoemaResult<Outcome> {
    let fact = parse_fact_line(args, &session.registry)?
        .with_operator("ASSERT", statement_args(args));
    let rendered = render_fact(&fact, &session.registry);
    session.stack.assert_fact(fact);
    Ok(Outcome::Asserted { fact: rendered })
}

fn statement_args(args: &str) -> Vec<String> {
    args.split_whitespace().map(str::to_string).collect()
}

fn op_retract(session: &mut Session, args: &str) -> NoemaResult<Outcome> {
    let fact = parse_fact_line(args, &session.registry)?;
    let rendered = render_fact(&fact, &session.registry);
    session.stack.retract(&fact)?;
    Ok(Outcome::Retracted { fact: rendered })
}

fn op_teach(session: &mut Session, args: &str) -> NoemaResult<Outcome> {
    let lines = split_fact_list(args);
    if lines.is_empty() {
        return Err(SessionError::Parse {
            message: "TEACH needs at least one fact".to_string(),
        }
        .into());
    }
    let mut batch = StagedBatch::new();
    for line in lines {
        batch.add(
            parse_fact_line(line, &session.registry)?
                .with_operator("TEACH", statement_args(line)),
        );
    }
    let report = session
        .detector
        .scan(&session.stack, batch.facts(), &session.registry);
    if report.consistent {
        let committed = batch.len();
        session.stack.commit_batch(batch);
        tracing::debug!(committed, "teach batch committed");
        return Ok(Outcome::Taught {
            committed,
            rejected: 0,
        });
    }
    match session.reasoner.commit_policy {
        CommitPolicy::BlockBatch => {
            tracing::debug!(
                contradictions = report.contradictions.len(),
                "teach batch rejected"
            );
            Err(StoreError::ContradictionRejected {
                count: report.contradictions.len(),
                report: report.summary(),
            }
            .into())
        }
        CommitPolicy::BlockOffenders => {
            let offenders: HashSet<usize> =
                report.offending_indices(batch.facts()).into_iter().collect();
            let mut clean = StagedBatch::new();
            for (i, fact) in batch.into_facts().into_iter().enumerate() {
                if !offenders.contains(&i) {
                    clean.add(fact);
                }
            }
            let committed = clean.len();
            session.stack.commit_batch(clean);
            tracing::debug!(
                committed,
                rejected = offenders.len(),
                "offending facts dropped from teach batch"
            );
            Ok(Outcome::Taught {
                committed,
                rejected: offenders.len(),
            })
        }
    }
}

// ---- truth queries ----

fn op_query(session: &mut Session, args: &str) -> NoemaResult<Outcome> {
    let fact = parse_fact_line(args, &session.registry)?;
    if fact.negated {
        return Err(QueryError::Validation {
            message: "query the positive form; the verdict already covers negation".to_string(),
        }
        .into());
    }
    let result = session.decide(fact.subject, fact.relation, fact.object)?;
    Ok(Outcome::Answer {
        truth: result.truth,
        confidence: result.confidence,
        method: result.method,
        proof: result.proof.render(&session.registry),
    })
}

fn op_whatif(session: &mut Session, args: &str) -> NoemaResult<Outcome> {
    let Some((facts_text, query_text)) = args.split_once(" => ") else {
        return Err(SessionError::Parse {
            message: "WHATIF takes `fact; ... => Subject RELATION Object`".to_string(),
        }
        .into());
    };
    session.stack.push_layer("whatif");
    let outcome = hypothetical(session, facts_text, query_text);
    session.stack.pop_layer()?;
    outcome
}

fn hypothetical(session: &mut Session, facts_text: &str, query_text: &str) -> NoemaResult<Outcome> {
    for line in split_fact_list(facts_text) {
        let fact = parse_fact_line(line, &session.registry)?;
        session.stack.assert_fact(fact);
    }
    op_query(session, query_text)
}

// ---- pattern and structure queries ----

fn op_match(session: &mut Session, args: &str) -> NoemaResult<Outcome> {
    let tokens: Vec<&str> = args.split_whitespace().collect();
    let [subject, relation, object] = tokens.as_slice() else {
        return Err(SessionError::Parse {
            message: "MATCH takes three terms, `*` for a wildcard".to_string(),
        }
        .into());
    };
    let mut pattern = Pattern::any();
    // An unmentioned label cannot match anything; short-circuit to empty.
    for (term, slot) in [(*subject, 0usize), (*relation, 1), (*object, 2)] {
        if term == "*" {
            continue;
        }
        let Some(id) = session.registry.lookup(term) else {
            return Ok(Outcome::Matches { facts: Vec::new() });
        };
        pattern = match slot {
            0 => pattern.subject(id),
            1 => pattern.relation(id),
            _ => pattern.object(id),
        };
    }
    let facts = session.with_ctx(|ctx| {
        query_match(pattern, ctx)
            .iter()
            .map(|f| render_fact(f, ctx.registry))
            .collect()
    });
    Ok(Outcome::Matches { facts })
}

fn op_abduce(session: &mut Session, args: &str) -> NoemaResult<Outcome> {
    let label = single_token(args, "ABDUCE takes one effect entity")?;
    let Some(effect) = session.registry.lookup(label) else {
        return Ok(Outcome::Abduced {
            hypotheses: Vec::new(),
        });
    };
    let hypotheses = session.with_ctx(|ctx| {
        abduce(effect, ctx)
            .into_iter()
            .map(|h| HypothesisView {
                cause: ctx.registry.label_of(h.cause),
                path: h.path.iter().map(|f| render_fact(f, ctx.registry)).collect(),
                confidence: h.confidence,
            })
            .collect()
    });
    Ok(Outcome::Abduced { hypotheses })
}

fn op_induce(session: &mut Session, args: &str) -> NoemaResult<Outcome> {
    let mut entities: Vec<SymbolId> = Vec::new();
    for token in args.split_whitespace() {
        entities.push(session.registry.intern(SymbolKind::Entity, token)?);
    }
    let shared = session.with_ctx(|ctx| -> NoemaResult<Vec<String>> {
        Ok(induce(&entities, ctx)?
            .into_iter()
            .map(|(r, o)| format!("{} {}", ctx.registry.label_of(r), ctx.registry.label_of(o)))
            .collect())
    })?;
    Ok(Outcome::Induced { shared })
}

fn op_analogy(session: &mut Session, args: &str) -> NoemaResult<Outcome> {
    let tokens: Vec<&str> = args.split_whitespace().collect();
    let [a, b, c] = tokens.as_slice() else {
        return Err(SessionError::Parse {
            message: "ANALOGY takes three entities: A B C, solving A : B :: C : ?".to_string(),
        }
        .into());
    };
    let looked = (
        session.registry.lookup(a),
        session.registry.lookup(b),
        session.registry.lookup(c),
    );
    let (Some(a), Some(b), Some(c)) = looked else {
        return Ok(Outcome::Analogy {
            relation: None,
            answer: None,
            similarity: 0.0,
        });
    };
    let answer = session.with_ctx(|ctx| analogy(a, b, c, ctx))?;
    Ok(match answer {
        Some(found) => Outcome::Analogy {
            relation: Some(session.registry.label_of(found.relation)),
            answer: Some(session.registry.label_of(found.answer)),
            similarity: found.similarity,
        },
        None => Outcome::Analogy {
            relation: None,
            answer: None,
            similarity: 0.0,
        },
    })
}

// ---- layers, rules, diagnostics ----

fn op_push(session: &mut Session, args: &str) -> NoemaResult<Outcome> {
    let name = single_token(args, "PUSH takes a layer name")?;
    session.stack.push_layer(name);
    Ok(Outcome::Pushed {
        layer: name.to_string(),
    })
}

fn op_pop(session: &mut Session, _args: &str) -> NoemaResult<Outcome> {
    let layer = session.stack.pop_layer()?;
    Ok(Outcome::Popped {
        layer: layer.name().to_string(),
    })
}

fn op_rule(session: &mut Session, args: &str) -> NoemaResult<Outcome> {
    let Some((name, body)) = args.split_once(char::is_whitespace) else {
        return Err(SessionError::Parse {
            message: "RULE takes a name followed by `IF ... THEN ...`".to_string(),
        }
        .into());
    };
    let rule = Rule::parse(name, body.trim(), &session.registry)?;
    let rendered = rule.render(&session.registry);
    session.rules.push(rule);
    Ok(Outcome::RuleAdded { rule: rendered })
}

fn op_check(session: &mut Session, _args: &str) -> NoemaResult<Outcome> {
    let report = session
        .detector
        .scan(&session.stack, &[], &session.registry);
    Ok(Outcome::Checked {
        consistent: report.consistent,
        findings: report
            .contradictions
            .iter()
            .map(|c| format!("[{}] {}", c.kind, c.explanation))
            .collect(),
    })
}

fn op_similar(session: &mut Session, args: &str) -> NoemaResult<Outcome> {
    let tokens: Vec<&str> = args.split_whitespace().collect();
    let (label, k) = match tokens.as_slice() {
        [label] => (*label, 5usize),
        [label, k] => (
            *label,
            k.parse().map_err(|_| SessionError::Parse {
                message: format!("`{k}` is not a neighbour count"),
            })?,
        ),
        _ => {
            return Err(SessionError::Parse {
                message: "SIMILAR takes an entity and an optional neighbour count".to_string(),
            }
            .into());
        }
    };
    let id = session.registry.require(label)?;

    // Make sure every registered symbol has a vector before searching.
    let mut symbols = session.registry.all();
    symbols.sort_by_key(|m| m.id);
    let items: Vec<(SymbolId, String)> = symbols.into_iter().map(|m| (m.id, m.label)).collect();
    session.memory.insert_batch(&items);

    let query = session.memory.require(id)?;
    let hits = session
        .memory
        .most_similar(&query, k.saturating_add(1))
        .map_err(QueryError::from)?
        .into_iter()
        .filter(|(hit, _)| *hit != id)
        .take(k)
        .map(|(hit, score)| (session.registry.label_of(hit), score))
        .collect();
    Ok(Outcome::Similar { hits })
}

fn op_describe(session: &mut Session, args: &str) -> NoemaResult<Outcome> {
    let options = match args.trim() {
        "" => DescribeOptions::default(),
        "facts" => DescribeOptions {
            facts: true,
            rules: false,
        },
        "rules" => DescribeOptions {
            facts: false,
            rules: true,
        },
        other => {
            return Err(SessionError::Parse {
                message: format!("DESCRIBE takes nothing, `facts`, or `rules`, not `{other}`"),
            }
            .into());
        }
    };
    let text = describe::render(&session.stack, &session.rules, &session.registry, options);
    Ok(Outcome::Described { text })
}

fn single_token<'a>(args: &'a str, expected: &str) -> Result<&'a str, SessionError> {
    let tokens: Vec<&str> = args.split_whitespace().collect();
    match tokens.as_slice() {
        [token] => Ok(token),
        _ => Err(SessionError::Parse {
            message: expected.to_string(),
        }),
    }
}
