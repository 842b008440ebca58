//! Style token extraction
//!
//! Components declare their visual contract through one of two styling systems:
//! - `utility`: utility-class strings on `className`/`class` attributes and in
//!   class-merging helpers (`cn`, `clsx`, `twMerge`, ...)
//! - `style_object`: style tables passed to a `create` call
//!   (`StyleSheet.create({...})`, `stylex.create({...})`)
//!
//! Both implement [`StyleExtractor`], producing an ordered, deduplicated set of
//! [`StyleToken`]s plus notes about expressions that could not be resolved.
//! Validation only ever produces warnings; it never blocks extraction.

mod style_object;
mod utility;

pub use style_object::StyleObjectExtractor;
pub use utility::UtilityClassExtractor;

use std::collections::HashSet;

use serde::{Deserialize, Serialize};
use tree_sitter::Node;

use crate::detectors::common::get_node_text;
use crate::utils::truncate_with_ellipsis;

/// Styling system a token came from
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum StyleSystem {
    UtilityClass,
    StyleObject,
}

/// A flattened style-object declaration
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StyleDeclaration {
    pub rule: String,
    pub property: String,
    pub value: String,
}

/// One atomic styling declaration
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StyleToken {
    /// Comparable token text: a class name, or `rule.property:value`
    pub value: String,
    /// Only applied under some runtime condition (ternary, `&&`, object key)
    #[serde(default, skip_serializing_if = "std::ops::Not::not")]
    pub conditional: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub declaration: Option<StyleDeclaration>,
}

impl StyleToken {
    pub fn class(name: impl Into<String>) -> Self {
        Self {
            value: name.into(),
            conditional: false,
            declaration: None,
        }
    }

    pub fn conditional_class(name: impl Into<String>) -> Self {
        Self {
            conditional: true,
            ..Self::class(name)
        }
    }

    pub fn declaration(rule: &str, property: &str, value: &str) -> Self {
        Self {
            value: format!("{}.{}:{}", rule, property, value),
            conditional: false,
            declaration: Some(StyleDeclaration {
                rule: rule.to_string(),
                property: property.to_string(),
                value: value.to_string(),
            }),
        }
    }

    pub fn system(&self) -> StyleSystem {
        if self.declaration.is_some() {
            StyleSystem::StyleObject
        } else {
            StyleSystem::UtilityClass
        }
    }
}

/// Output of one extractor run
#[derive(Debug, Clone, Default)]
pub struct StyleExtraction {
    /// Tokens in first-seen order, without duplicates
    pub tokens: Vec<StyleToken>,
    /// Notes on dynamic expressions that were dropped
    pub unresolved: Vec<String>,
    seen: HashSet<String>,
}

impl StyleExtraction {
    /// Add a token unless an equal value was already seen
    pub fn push(&mut self, token: StyleToken) {
        if token.value.is_empty() {
            return;
        }
        if self.seen.insert(token.value.clone()) {
            self.tokens.push(token);
        }
    }

    pub fn note_unresolved(&mut self, note: String) {
        if !self.unresolved.contains(&note) {
            self.unresolved.push(note);
        }
    }

    /// Append another extraction, keeping first-seen order
    pub fn merge(&mut self, other: StyleExtraction) {
        for token in other.tokens {
            self.push(token);
        }
        for note in other.unresolved {
            self.note_unresolved(note);
        }
    }

    pub fn is_empty(&self) -> bool {
        self.tokens.is_empty() && self.unresolved.is_empty()
    }
}

/// Severity of a validation finding
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum IssueSeverity {
    Warning,
    Error,
}

/// A single validation finding for a token
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ValidationIssue {
    pub token: String,
    pub severity: IssueSeverity,
    pub message: String,
}

impl ValidationIssue {
    pub fn warning(token: &str, message: impl Into<String>) -> Self {
        Self {
            token: token.to_string(),
            severity: IssueSeverity::Warning,
            message: message.into(),
        }
    }
}

/// Result of validating a token set
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ValidationReport {
    pub is_valid: bool,
    pub issues: Vec<ValidationIssue>,
}

impl ValidationReport {
    pub fn from_issues(issues: Vec<ValidationIssue>) -> Self {
        let is_valid = !issues.iter().any(|i| i.severity == IssueSeverity::Error);
        Self { is_valid, issues }
    }
}

/// A styling system that can pull tokens out of a syntax tree
pub trait StyleExtractor: Send + Sync {
    fn system(&self) -> StyleSystem;

    /// Extract tokens from the subtree rooted at `node`
    fn extract(&self, node: &Node, source: &str) -> StyleExtraction;

    /// Check tokens of this extractor's system against its known grammar
    fn validate(&self, tokens: &[StyleToken]) -> ValidationReport;
}

/// Record an expression that cannot be tokenized statically
pub(crate) fn note_dynamic(node: &Node, source: &str, out: &mut StyleExtraction) {
    let text = get_node_text(node, source);
    let text = text.split_whitespace().collect::<Vec<_>>().join(" ");
    out.note_unresolved(format!(
        "dynamic, unresolved: `{}`",
        truncate_with_ellipsis(&text, 60)
    ));
}

/// All supported styling systems
pub fn default_extractors() -> Vec<Box<dyn StyleExtractor>> {
    extractors(&[])
}

/// All supported styling systems, with project-specific class-merging helpers
pub fn extractors(merge_helpers: &[String]) -> Vec<Box<dyn StyleExtractor>> {
    vec![
        Box::new(UtilityClassExtractor::default().with_helpers(merge_helpers.iter().cloned())),
        Box::new(StyleObjectExtractor::default()),
    ]
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_push_deduplicates_preserving_order() {
        let mut extraction = StyleExtraction::default();
        extraction.push(StyleToken::class("px-4"));
        extraction.push(StyleToken::class("py-2"));
        extraction.push(StyleToken::conditional_class("px-4"));
        extraction.push(StyleToken::class(""));

        let values: Vec<&str> = extraction.tokens.iter().map(|t| t.value.as_str()).collect();
        assert_eq!(values, vec!["px-4", "py-2"]);
        assert!(!extraction.tokens[0].conditional);
    }

    #[test]
    fn test_declaration_token_value() {
        let token = StyleToken::declaration("container", "padding", "16");
        assert_eq!(token.value, "container.padding:16");
        assert_eq!(token.system(), StyleSystem::StyleObject);
        assert_eq!(StyleToken::class("flex").system(), StyleSystem::UtilityClass);
    }

    #[test]
    fn test_report_validity_ignores_warnings() {
        let report = ValidationReport::from_issues(vec![ValidationIssue::warning(
            "foo",
            "unknown utility",
        )]);
        assert!(report.is_valid);
        assert_eq!(report.issues.len(), 1);
    }
}
