//! Deterministic rendering of the knowledge state.
//!
//! Pure over its inputs: same stack, rules, and registry always produce
//! byte-identical text. Layers render base first; fact lines within a
//! layer and rules sort lexicographically.

use crate::infer::proof::render_fact;
use crate::infer::rules::Rule;
use crate::registry::SymbolRegistry;
use crate::store::TheoryStack;

#[derive(Debug, Clone, Copy)]
pub struct DescribeOptions {
    pub facts: bool,
    pub rules: bool,
}

impl Default for DescribeOptions {
    fn default() -> Self {
        Self {
            facts: true,
            rules: true,
        }
    }
}

/// Render the stack and rule base to canonical text.
pub fn render(
    stack: &TheoryStack,
    rules: &[Rule],
    registry: &SymbolRegistry,
    options: DescribeOptions,
) -> String {
    let mut out = String::new();
    if options.facts {
        for layer in stack.layers() {
            out.push_str(&format!("layer {}:\n", layer.name()));
            let mut lines: Vec<String> = layer
                .facts()
                .iter()
                .map(|fact| render_fact(fact, registry))
                .collect();
            lines.sort();
            for line in lines {
                out.push_str("  ");
                out.push_str(&line);
                out.push('\n');
            }
        }
    }
    if options.rules && !rules.is_empty() {
        out.push_str("rules:\n");
        // `render` already leads with the rule name, so sorting the lines
        // sorts by name.
        let mut lines: Vec<String> = rules
            .iter()
            .map(|rule| format!("  {}", rule.render(registry)))
            .collect();
        lines.sort();
        for line in lines {
            out.push_str(&line);
            out.push('\n');
        }
    }
    out
}
