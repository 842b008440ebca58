//! Style-object extraction (`StyleSheet.create({ rule: { prop: value } })`)

use once_cell::sync::Lazy;
use regex::Regex;
use tree_sitter::Node;

use super::{
    note_dynamic, StyleExtraction, StyleExtractor, StyleSystem, StyleToken, ValidationIssue,
    ValidationReport,
};
use crate::detectors::common::{
    get_node_text, named_children, property_key_text, string_literal_value, unwrap_expression,
    visit_all,
};

/// Calls whose first argument is a style table
const CREATE_CALLEES: &[&str] = &["StyleSheet.create", "stylex.create", "createStyles"];

static CAMEL_PROPERTY: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^[a-zA-Z][a-zA-Z0-9]*$").expect("static regex"));

/// Flattens style tables into `{rule, property, value}` tokens
#[derive(Debug, Clone)]
pub struct StyleObjectExtractor {
    callees: Vec<String>,
}

impl Default for StyleObjectExtractor {
    fn default() -> Self {
        Self {
            callees: CREATE_CALLEES.iter().map(|s| s.to_string()).collect(),
        }
    }
}

impl StyleObjectExtractor {
    fn is_create_call(&self, call: &Node, source: &str) -> bool {
        call.child_by_field_name("function")
            .map(|f| {
                let callee = get_node_text(&f, source);
                self.callees.iter().any(|c| *c == callee)
            })
            .unwrap_or(false)
    }

    fn collect_table(&self, table: &Node, source: &str, out: &mut StyleExtraction) {
        for entry in named_children(table) {
            match entry.kind() {
                "pair" => {
                    let (Some(key), Some(value)) = (
                        entry.child_by_field_name("key"),
                        entry.child_by_field_name("value"),
                    ) else {
                        continue;
                    };
                    let rule = property_key_text(&key, source);
                    let value = unwrap_expression(value);
                    if value.kind() == "object" {
                        flatten_rule(&rule, "", &value, source, out);
                    } else {
                        note_dynamic(&entry, source, out);
                    }
                }
                "comment" => {}
                _ => note_dynamic(&entry, source, out),
            }
        }
    }
}

impl StyleExtractor for StyleObjectExtractor {
    fn system(&self) -> StyleSystem {
        StyleSystem::StyleObject
    }

    fn extract(&self, node: &Node, source: &str) -> StyleExtraction {
        let mut out = StyleExtraction::default();

        visit_all(node, |n| {
            if n.kind() != "call_expression" || !self.is_create_call(n, source) {
                return;
            }
            let table = n
                .child_by_field_name("arguments")
                .and_then(|args| args.named_child(0))
                .map(unwrap_expression);
            match table {
                Some(table) if table.kind() == "object" => {
                    self.collect_table(&table, source, &mut out);
                }
                Some(other) => note_dynamic(&other, source, &mut out),
                None => {}
            }
        });

        out
    }

    fn validate(&self, tokens: &[StyleToken]) -> ValidationReport {
        let mut issues = Vec::new();
        for token in tokens {
            let Some(decl) = &token.declaration else {
                continue;
            };
            let leaf = decl.property.rsplit('.').next().unwrap_or_default();
            if !CAMEL_PROPERTY.is_match(leaf) {
                issues.push(ValidationIssue::warning(
                    &token.value,
                    format!("property `{}` is not a camelCase style key", leaf),
                ));
            }
            if decl.value.trim().is_empty() {
                issues.push(ValidationIssue::warning(&token.value, "empty style value"));
            }
        }
        ValidationReport::from_issues(issues)
    }
}

/// Flatten one rule; nested objects (`':hover': {...}`) extend the property path
fn flatten_rule(rule: &str, prefix: &str, object: &Node, source: &str, out: &mut StyleExtraction) {
    for entry in named_children(object) {
        match entry.kind() {
            "pair" => {
                let (Some(key), Some(value)) = (
                    entry.child_by_field_name("key"),
                    entry.child_by_field_name("value"),
                ) else {
                    continue;
                };
                let key = property_key_text(&key, source);
                let property = if prefix.is_empty() {
                    key
                } else {
                    format!("{}.{}", prefix, key)
                };
                let value = unwrap_expression(value);
                match value.kind() {
                    "object" => flatten_rule(rule, &property, &value, source, out),
                    "template_string" | "call_expression" | "ternary_expression" => {
                        note_dynamic(&entry, source, out);
                    }
                    _ => {
                        let text = string_literal_value(&value, source)
                            .unwrap_or_else(|| get_node_text(&value, source));
                        out.push(StyleToken::declaration(rule, &property, &text));
                    }
                }
            }
            "comment" => {}
            _ => note_dynamic(&entry, source, out),
        }
    }
}
