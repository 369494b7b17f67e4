//! Line parsing: statements, canonical fact lines, and `$name` chaining.
//!
//! Canonical form: `Subject RELATION Object` with UPPER_SNAKE relations,
//! Capitalized instance names, lowercase generic types, underscores for
//! multi-word concepts, and `NOT` before the relation for negation.

use std::sync::LazyLock;

use regex::Regex;

use crate::error::{NoemaResult, SessionError};
use crate::registry::SymbolRegistry;
use crate::store::Fact;
use crate::symbol::SymbolKind;

static STATEMENT_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^@([A-Za-z_][A-Za-z0-9_]*)\s+([A-Z][A-Z_]*)(?:\s+(.*))?$")
        .expect("statement regex")
});

static RELATION_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^[A-Z][A-Z0-9_]*$").expect("relation regex"));

static ENTITY_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^[A-Za-z][A-Za-z0-9_]*$").expect("entity regex"));

static REFERENCE_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\$([A-Za-z_][A-Za-z0-9_]*)").expect("reference regex"));

/// A parsed `@name OPERATION args...` line.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Statement {
    pub name: String,
    pub operation: String,
    pub args: String,
}

/// Parse one statement line.
pub fn parse_statement(line: &str) -> Result<Statement, SessionError> {
    let caps = STATEMENT_RE
        .captures(line.trim())
        .ok_or_else(|| SessionError::Parse {
            message: format!("not a statement: `{line}`"),
        })?;
    Ok(Statement {
        name: caps[1].to_string(),
        operation: caps[2].to_string(),
        args: caps.get(3).map(|m| m.as_str().trim().to_string()).unwrap_or_default(),
    })
}

/// Replace every `$name` with the principal text of the named binding.
pub fn substitute<'a>(
    line: &str,
    lookup: impl Fn(&str) -> Option<&'a str>,
) -> Result<String, SessionError> {
    let mut out = String::with_capacity(line.len());
    let mut last = 0;
    for caps in REFERENCE_RE.captures_iter(line) {
        let whole = caps.get(0).expect("capture 0");
        let name = &caps[1];
        let value = lookup(name).ok_or_else(|| SessionError::UnboundReference {
            name: name.to_string(),
        })?;
        out.push_str(&line[last..whole.start()]);
        out.push_str(value);
        last = whole.end();
    }
    out.push_str(&line[last..]);
    Ok(out)
}

fn check_relation(token: &str) -> Result<(), SessionError> {
    if RELATION_RE.is_match(token) {
        Ok(())
    } else {
        Err(SessionError::Parse {
            message: format!("`{token}` is not an UPPER_SNAKE relation"),
        })
    }
}

fn check_entity(token: &str) -> Result<(), SessionError> {
    if ENTITY_RE.is_match(token) {
        Ok(())
    } else {
        Err(SessionError::Parse {
            message: format!("`{token}` is not a valid concept name"),
        })
    }
}

/// Parse a canonical fact line, interning its symbols.
pub fn parse_fact_line(text: &str, registry: &SymbolRegistry) -> NoemaResult<Fact> {
    let tokens: Vec<&str> = text.split_whitespace().collect();
    let (negated, subject, relation, object) = match tokens.as_slice() {
        [s, "NOT", r, o] => (true, *s, *r, *o),
        [s, r, o] => (false, *s, *r, *o),
        _ => {
            return Err(SessionError::Parse {
                message: format!("fact must be `Subject [NOT] RELATION Object`, got `{text}`"),
            }
            .into());
        }
    };
    check_entity(subject)?;
    check_relation(relation)?;
    check_entity(object)?;

    let fact = Fact::new(
        registry.intern(SymbolKind::Entity, subject)?,
        registry.intern(SymbolKind::Relation, relation)?,
        registry.intern(SymbolKind::Entity, object)?,
    );
    Ok(if negated { fact.negated() } else { fact })
}

/// Split a `fact; fact; ...` argument into individual fact lines.
pub fn split_fact_list(text: &str) -> Vec<&str> {
    text.split(';')
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .collect()
}
