//! Rich diagnostic error types for the noema engine.
//!
//! Each subsystem defines its own error type with miette `#[diagnostic]`
//! derives, providing error codes, help text, and source chains so callers
//! know exactly what went wrong and how to fix it.

use miette::Diagnostic;
use thiserror::Error;

/// Top-level error type for the noema engine.
///
/// Each variant wraps a subsystem-specific error, preserving the full
/// diagnostic chain (error codes, help text) through to the caller.
#[derive(Debug, Error, Diagnostic)]
pub enum NoemaError {
    #[error(transparent)]
    #[diagnostic(transparent)]
    Hdc(#[from] HdcError),

    #[error(transparent)]
    #[diagnostic(transparent)]
    Store(#[from] StoreError),

    #[error(transparent)]
    #[diagnostic(transparent)]
    Symbol(#[from] SymbolError),

    #[error(transparent)]
    #[diagnostic(transparent)]
    Query(#[from] QueryError),

    #[error(transparent)]
    #[diagnostic(transparent)]
    Session(#[from] SessionError),

    #[error(transparent)]
    #[diagnostic(transparent)]
    Config(#[from] ConfigError),
}

// ---------------------------------------------------------------------------
// Vector algebra errors
// ---------------------------------------------------------------------------

#[derive(Debug, Error, Diagnostic)]
pub enum HdcError {
    #[error("geometry mismatch: expected {expected}, got {actual}")]
    #[diagnostic(
        code(noema::hdc::geometry_mismatch),
        help(
            "All concept vectors in an operation must share the same geometry. \
             Widen the smaller vector explicitly with `widen()` if the mix is \
             intentional; vectors are never coerced silently."
        )
    )]
    GeometryMismatch { expected: usize, actual: usize },

    #[error("strategy mismatch: cannot combine {left} and {right} vectors")]
    #[diagnostic(
        code(noema::hdc::strategy_mismatch),
        help(
            "The two vectors were produced by different strategies. Re-encode \
             one of them under the session's strategy; cross-strategy algebra \
             is not defined."
        )
    )]
    StrategyMismatch { left: String, right: String },

    #[error("empty bundle: cannot bundle zero vectors")]
    #[diagnostic(
        code(noema::hdc::empty_bundle),
        help("Provide at least one vector to the bundle operation.")
    )]
    EmptyBundle,

    #[error("cannot widen from geometry {from} to smaller geometry {to}")]
    #[diagnostic(
        code(noema::hdc::narrowing_widen),
        help("`widen()` only pads upward. Narrowing a vector is not supported.")
    )]
    NarrowingWiden { from: usize, to: usize },

    #[error("no vector encoded for symbol {symbol_id}")]
    #[diagnostic(
        code(noema::hdc::not_found),
        help(
            "The symbol has no vector in the concept memory. Encode it first \
             with `get_or_encode()`, or check that the symbol id is correct."
        )
    )]
    VectorNotFound { symbol_id: u64 },
}

// ---------------------------------------------------------------------------
// Store errors
// ---------------------------------------------------------------------------

#[derive(Debug, Error, Diagnostic)]
pub enum StoreError {
    #[error("cannot pop the base layer of the theory stack")]
    #[diagnostic(
        code(noema::store::base_layer_pop),
        help(
            "The theory stack always keeps at least its base layer. Push a \
             layer before popping, or check the stack depth with `depth()`."
        )
    )]
    BaseLayerPop,

    #[error("fact not present in any layer: {fact}")]
    #[diagnostic(
        code(noema::store::fact_not_found),
        help("Retract only removes facts that exist. Check the triple with `contains()`.")
    )]
    FactNotFound { fact: String },

    #[error("layer not found: {name}")]
    #[diagnostic(
        code(noema::store::layer_not_found),
        help("No layer with this name is on the stack.")
    )]
    LayerNotFound { name: String },

    #[error("batch rejected: {count} contradiction(s) detected, nothing was committed")]
    #[diagnostic(
        code(noema::store::contradiction_rejected),
        help(
            "The staged batch failed the consistency scan and was discarded in \
             full. Inspect the attached report, fix or drop the offending \
             facts, and teach again."
        )
    )]
    ContradictionRejected { count: usize, report: String },
}

// ---------------------------------------------------------------------------
// Symbol errors
// ---------------------------------------------------------------------------

#[derive(Debug, Error, Diagnostic)]
pub enum SymbolError {
    #[error("symbol allocator exhausted: cannot allocate more than u64::MAX symbols")]
    #[diagnostic(
        code(noema::symbol::exhausted),
        help(
            "The symbol id space is exhausted. This requires 2^64 allocations \
             and indicates an allocation loop."
        )
    )]
    AllocatorExhausted,

    #[error("unknown symbol: {label}")]
    #[diagnostic(
        code(noema::symbol::unknown),
        help("The label has not been interned. Mention it in a fact first.")
    )]
    Unknown { label: String },
}

// ---------------------------------------------------------------------------
// Query errors
// ---------------------------------------------------------------------------

#[derive(Debug, Error, Diagnostic)]
pub enum QueryError {
    #[error("invalid query: {message}")]
    #[diagnostic(
        code(noema::query::validation),
        help("The query is well-formed text but semantically invalid. {message}")
    )]
    Validation { message: String },

    #[error(transparent)]
    #[diagnostic(transparent)]
    Hdc(#[from] HdcError),
}

// ---------------------------------------------------------------------------
// Session errors
// ---------------------------------------------------------------------------

#[derive(Debug, Error, Diagnostic)]
pub enum SessionError {
    #[error("parse error in statement: {message}")]
    #[diagnostic(
        code(noema::session::parse),
        help(
            "Statements are `@name OPERATION args...` and facts are \
             `Subject RELATION Object` (UPPER_SNAKE relations, Capitalized \
             instances, lowercase types). {message}"
        )
    )]
    Parse { message: String },

    #[error("unknown operator: {operator}")]
    #[diagnostic(
        code(noema::session::unknown_operator),
        help("No handler is registered for this operation name.")
    )]
    UnknownOperator { operator: String },

    #[error("unbound reference: ${name}")]
    #[diagnostic(
        code(noema::session::unbound_reference),
        help(
            "`$name` refers to a binding made earlier in the same run() call \
             with `@name ...`. Bindings do not persist across calls."
        )
    )]
    UnboundReference { name: String },

    #[error(transparent)]
    #[diagnostic(transparent)]
    Store(#[from] StoreError),

    #[error(transparent)]
    #[diagnostic(transparent)]
    Query(#[from] QueryError),

    #[error(transparent)]
    #[diagnostic(transparent)]
    Hdc(#[from] HdcError),
}

// ---------------------------------------------------------------------------
// Config errors
// ---------------------------------------------------------------------------

#[derive(Debug, Error, Diagnostic)]
pub enum ConfigError {
    #[error("failed to read config file: {path}")]
    #[diagnostic(
        code(noema::config::io),
        help("Check that the path exists and is readable.")
    )]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("invalid config: {message}")]
    #[diagnostic(
        code(noema::config::invalid),
        help("The TOML was readable but its contents are not a valid ReasonerConfig.")
    )]
    Invalid { message: String },
}

/// Convenience alias for functions returning noema results.
pub type NoemaResult<T> = std::result::Result<T, NoemaError>;
