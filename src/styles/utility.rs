//! Utility-class extraction (`className="px-4 py-2"`, `cn(...)`, `clsx(...)`)

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

/// JSX attributes that carry a class list
const CLASS_ATTRIBUTES: &[&str] = &["className", "class"];

/// Class-merging helpers whose arguments are class expressions
const MERGE_HELPERS: &[&str] = &["cn", "clsx", "classnames", "classNames", "cx", "twMerge", "twJoin"];

/// Variant prefixes allowed before a utility (`md:`, `dark:`, `hover:`)
const MODIFIERS: &[&str] = &[
    "sm", "md", "lg", "xl", "2xl", "dark", "hover", "focus", "focus-within", "focus-visible",
    "active", "visited", "disabled", "enabled", "checked", "required", "invalid", "first", "last",
    "odd", "even", "only", "empty", "placeholder", "before", "after", "selection", "marker",
    "file", "motion-safe", "motion-reduce", "print", "rtl", "ltr", "open", "portrait", "landscape",
];

/// Utilities that take no value
const STANDALONE: &[&str] = &[
    "flex", "inline-flex", "block", "inline-block", "inline", "hidden", "grid", "inline-grid",
    "contents", "table", "relative", "absolute", "fixed", "sticky", "static", "container",
    "truncate", "underline", "overline", "line-through", "no-underline", "italic", "not-italic",
    "uppercase", "lowercase", "capitalize", "normal-case", "visible", "invisible", "grow",
    "shrink", "border", "rounded", "shadow", "transition", "antialiased", "subpixel-antialiased",
    "sr-only", "not-sr-only", "outline", "ring", "resize", "isolate", "transform", "filter",
    "group", "peer", "prose", "flex-row", "flex-col", "flex-wrap", "flex-nowrap",
];

/// Utilities that take a numeric, keyword or color suffix
const PREFIXES: &[&str] = &[
    "p", "px", "py", "pt", "pr", "pb", "pl", "ps", "pe", "m", "mx", "my", "mt", "mr", "mb", "ml",
    "ms", "me", "space-x", "space-y", "gap", "gap-x", "gap-y", "w", "h", "min-w", "min-h",
    "max-w", "max-h", "size", "inset", "inset-x", "inset-y", "top", "right", "bottom", "left",
    "z", "order", "col", "row", "basis", "flex", "grow", "shrink", "grid-cols", "grid-rows",
    "col-span", "row-span", "col-start", "col-end", "items", "justify", "content", "self",
    "place", "text", "font", "leading", "tracking", "bg", "from", "via", "to", "border",
    "border-t", "border-b", "border-l", "border-r", "border-x", "border-y", "rounded",
    "rounded-t", "rounded-b", "rounded-l", "rounded-r", "rounded-tl", "rounded-tr", "rounded-bl",
    "rounded-br", "shadow", "ring", "ring-offset", "outline", "outline-offset", "opacity",
    "transition", "duration", "ease", "delay", "animate", "cursor", "overflow", "overflow-x",
    "overflow-y", "object", "aspect", "divide", "divide-x", "divide-y", "fill", "stroke",
    "decoration", "underline-offset", "line-clamp", "whitespace", "break", "list", "align",
    "origin", "scale", "rotate", "translate-x", "translate-y", "skew-x", "skew-y", "blur",
    "backdrop-blur", "select", "pointer-events", "placeholder", "caret", "accent", "columns",
    "auto-cols", "auto-rows", "grid-flow", "drop-shadow", "brightness", "contrast", "will-change",
];

/// Suffix grammar: numbers, fractions, keywords, color-shade pairs, arbitrary values
static SUFFIX: Lazy<Regex> = Lazy::new(|| {
    Regex::new(
        r"^(?:\d+(?:\.\d+)?|\d+/\d+|[a-z]+(?:-[a-z]+)*(?:-\d{2,3})?(?:/\d{1,3})?|\[[^\]\s]+\])$",
    )
    .expect("static regex")
});

/// Modifiers with open-ended names (`group-hover`, `aria-checked`, `data-[state=open]`, `[&>*]`)
static OPEN_MODIFIER: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^(?:(?:group|peer)(?:-[a-z]+)+|(?:aria|data|supports)-\S+|max-\w+|min-\w+|\[.+\])$")
        .expect("static regex")
});

/// Extracts utility classes from class attributes and merge-helper calls
#[derive(Debug, Clone)]
pub struct UtilityClassExtractor {
    class_attributes: Vec<String>,
    merge_helpers: Vec<String>,
}

impl Default for UtilityClassExtractor {
    fn default() -> Self {
        Self {
            class_attributes: CLASS_ATTRIBUTES.iter().map(|s| s.to_string()).collect(),
            merge_helpers: MERGE_HELPERS.iter().map(|s| s.to_string()).collect(),
        }
    }
}

impl UtilityClassExtractor {
    /// Recognize additional class-merging helpers
    pub fn with_helpers<I, S>(mut self, helpers: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        for helper in helpers {
            let helper = helper.into();
            if !self.merge_helpers.contains(&helper) {
                self.merge_helpers.push(helper);
            }
        }
        self
    }

    fn is_class_attribute(&self, name: &str) -> bool {
        self.class_attributes.iter().any(|a| a == name)
    }

    fn is_merge_helper(&self, call: &Node, source: &str) -> bool {
        call.child_by_field_name("function")
            .map(|f| {
                let name = get_node_text(&f, source);
                self.merge_helpers.iter().any(|h| *h == name)
            })
            .unwrap_or(false)
    }

    /// Collect tokens from one class-bearing expression
    fn collect(&self, node: Node, source: &str, conditional: bool, out: &mut StyleExtraction) {
        let node = unwrap_expression(node);
        match node.kind() {
            "string" => {
                let value = string_literal_value(&node, source).unwrap_or_default();
                push_classes(&value, conditional, out);
            }
            "template_string" => collect_template(&node, source, conditional, out),
            "jsx_expression" => {
                if let Some(inner) = node.named_child(0) {
                    self.collect(inner, source, conditional, out);
                }
            }
            "ternary_expression" => {
                for field in ["consequence", "alternative"] {
                    if let Some(branch) = node.child_by_field_name(field) {
                        self.collect(branch, source, true, out);
                    }
                }
            }
            "binary_expression" => {
                let operator = node
                    .child_by_field_name("operator")
                    .map(|o| get_node_text(&o, source))
                    .unwrap_or_default();
                match operator.as_str() {
                    "&&" => {
                        if let Some(right) = node.child_by_field_name("right") {
                            self.collect(right, source, true, out);
                        }
                    }
                    "||" | "??" => {
                        for field in ["left", "right"] {
                            if let Some(side) = node.child_by_field_name(field) {
                                self.collect(side, source, true, out);
                            }
                        }
                    }
                    "+" => {
                        for field in ["left", "right"] {
                            if let Some(side) = node.child_by_field_name(field) {
                                self.collect(side, source, conditional, out);
                            }
                        }
                    }
                    _ => note_dynamic(&node, source, out),
                }
            }
            "object" => {
                for entry in named_children(&node) {
                    match entry.kind() {
                        "pair" => match entry.child_by_field_name("key") {
                            Some(key) if key.kind() != "computed_property_name" => {
                                push_classes(&property_key_text(&key, source), true, out);
                            }
                            _ => note_dynamic(&entry, source, out),
                        },
                        "shorthand_property_identifier" => {
                            push_classes(&get_node_text(&entry, source), true, out);
                        }
                        "comment" => {}
                        _ => note_dynamic(&entry, source, out),
                    }
                }
            }
            "array" => {
                for element in named_children(&node) {
                    self.collect(element, source, conditional, out);
                }
            }
            "call_expression" if self.is_merge_helper(&node, source) => {
                if let Some(args) = node.child_by_field_name("arguments") {
                    for arg in named_children(&args) {
                        self.collect(arg, source, conditional, out);
                    }
                }
            }
            "null" | "undefined" | "true" | "false" | "number" | "comment" => {}
            _ => note_dynamic(&node, source, out),
        }
    }
}

impl StyleExtractor for UtilityClassExtractor {
    fn system(&self) -> StyleSystem {
        StyleSystem::UtilityClass
    }

    fn extract(&self, node: &Node, source: &str) -> StyleExtraction {
        let mut out = StyleExtraction::default();

        visit_all(node, |n| match n.kind() {
            "jsx_attribute" => {
                let mut children = named_children(n).into_iter();
                let (Some(name), value) = (children.next(), children.next()) else {
                    return;
                };
                if !self.is_class_attribute(&get_node_text(&name, source)) {
                    return;
                }
                if let Some(value) = value {
                    self.collect(value, source, false, &mut out);
                }
            }
            // Calls nested in a class attribute were already collected; dedup drops repeats
            "call_expression" if self.is_merge_helper(n, source) => {
                self.collect(*n, source, false, &mut out);
            }
            _ => {}
        });

        out
    }

    fn validate(&self, tokens: &[StyleToken]) -> ValidationReport {
        let issues = tokens
            .iter()
            .filter(|t| t.system() == StyleSystem::UtilityClass)
            .filter_map(|t| {
                validate_class(&t.value)
                    .err()
                    .map(|reason| ValidationIssue::warning(&t.value, reason))
            })
            .collect();
        ValidationReport::from_issues(issues)
    }
}

fn push_classes(text: &str, conditional: bool, out: &mut StyleExtraction) {
    for class in text.split_whitespace() {
        out.push(if conditional {
            StyleToken::conditional_class(class)
        } else {
            StyleToken::class(class)
        });
    }
}

/// Tokenize only the static segments of a template literal.
///
/// A class glued to an interpolation (`bg-${color}-500`) is partial and dropped.
fn collect_template(node: &Node, source: &str, conditional: bool, out: &mut StyleExtraction) {
    let start = node.start_byte() + 1;
    let end = node.end_byte().saturating_sub(1).max(start);

    let substitutions: Vec<Node> = named_children(node)
        .into_iter()
        .filter(|c| c.kind() == "template_substitution")
        .collect();

    let mut cursor = start;
    let mut segments: Vec<(&str, bool, bool)> = Vec::new();
    for (i, sub) in substitutions.iter().enumerate() {
        let after_dynamic = i > 0;
        segments.push((source.get(cursor..sub.start_byte()).unwrap_or(""), after_dynamic, true));
        note_dynamic(sub, source, out);
        cursor = sub.end_byte();
    }
    segments.push((source.get(cursor..end).unwrap_or(""), !substitutions.is_empty(), false));

    for (text, after_dynamic, before_dynamic) in segments {
        let mut pieces: Vec<&str> = text.split_whitespace().collect();
        let glued_start = after_dynamic && !text.starts_with(char::is_whitespace);
        let glued_end = before_dynamic && !text.ends_with(char::is_whitespace);
        if glued_end && !pieces.is_empty() {
            pieces.pop();
        }
        if glued_start && !pieces.is_empty() {
            pieces.remove(0);
        }
        for piece in pieces {
            push_classes(piece, conditional, out);
        }
    }
}

/// Check a class against the known utility grammar
fn validate_class(class: &str) -> Result<(), String> {
    let mut parts: Vec<&str> = class.split(':').collect();
    let utility = parts.pop().unwrap_or_default();

    for modifier in &parts {
        if !MODIFIERS.contains(modifier) && !OPEN_MODIFIER.is_match(modifier) {
            return Err(format!("unknown variant modifier `{}`", modifier));
        }
    }

    let core = utility.trim_start_matches('!').trim_start_matches('-');
    if core.is_empty() {
        return Err("empty utility".to_string());
    }
    // Arbitrary properties like `[mask-type:luminance]`
    if core.starts_with('[') && core.ends_with(']') {
        return Ok(());
    }
    if STANDALONE.contains(&core) {
        return Ok(());
    }

    let known = PREFIXES.iter().any(|prefix| {
        core.strip_prefix(prefix)
            .and_then(|rest| rest.strip_prefix('-'))
            .is_some_and(|suffix| SUFFIX.is_match(suffix))
    });
    if known {
        Ok(())
    } else {
        Err("unrecognized utility class".to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::lang::Lang;

    fn extract(source: &str) -> StyleExtraction {
        let tree = Lang::Tsx.parse(source).unwrap();
        UtilityClassExtractor::default().extract(&tree.root_node(), source)
    }

    fn values(extraction: &StyleExtraction) -> Vec<&str> {
        extraction.tokens.iter().map(|t| t.value.as_str()).collect()
    }

    #[test]
    fn test_plain_string_class_name() {
        let out = extract(r#"const A = () => <div className="px-4  py-2 px-4 bg-blue-500" />;"#);
        assert_eq!(values(&out), vec!["px-4", "py-2", "bg-blue-500"]);
        assert!(out.tokens.iter().all(|t| !t.conditional));
        assert!(out.unresolved.is_empty());
    }

    #[test]
    fn test_ternary_branches_are_conditional() {
        let out = extract(
            r#"const A = ({ on }) => <div className={on ? "bg-green-500" : "bg-gray-200"} />;"#,
        );
        assert_eq!(values(&out), vec!["bg-green-500", "bg-gray-200"]);
        assert!(out.tokens.iter().all(|t| t.conditional));
    }

    #[test]
    fn test_merge_helper_with_object_keys() {
        let out = extract(
            r#"const A = ({ active, big }) => (
                <button className={cn("rounded px-4", { "ring-2 ring-blue-500": active, big }, active && "font-bold")} />
            );"#,
        );
        assert_eq!(
            values(&out),
            vec!["rounded", "px-4", "ring-2", "ring-blue-500", "big", "font-bold"]
        );
        assert!(!out.tokens[0].conditional);
        assert!(out.tokens[2].conditional);
        assert!(out.tokens[5].conditional);
    }

    #[test]
    fn test_template_literal_drops_interpolations_with_note() {
        let out = extract(
            r#"const A = ({ color, size }) => <div className={`flex bg-${color}-500 ${size} items-center`} />;"#,
        );
        assert_eq!(values(&out), vec!["flex", "items-center"]);
        assert_eq!(out.unresolved.len(), 2);
        assert!(out.unresolved[0].contains("dynamic, unresolved"));
    }

    #[test]
    fn test_helper_call_outside_jsx() {
        let out = extract(r#"const styles = clsx("grid gap-4", ["p-2"]);"#);
        assert_eq!(values(&out), vec!["grid", "gap-4", "p-2"]);
    }

    #[test]
    fn test_identifier_class_is_noted_not_ignored() {
        let out = extract(r#"const A = ({ cls }) => <div className={cls} />;"#);
        assert!(out.tokens.is_empty());
        assert_eq!(out.unresolved, vec!["dynamic, unresolved: `cls`".to_string()]);
    }

    #[test]
    fn test_order_is_first_seen_after_permutation() {
        let a = extract(r#"const A = () => <div className="px-4 py-2 bg-blue-500" />;"#);
        let b = extract(r#"const A = () => <div className="bg-blue-500 px-4 py-2" />;"#);
        let mut va = values(&a);
        let mut vb = values(&b);
        assert_ne!(va, vb);
        va.sort();
        vb.sort();
        assert_eq!(va, vb);
    }

    #[test]
    fn test_validate_known_grammar() {
        assert!(validate_class("px-4").is_ok());
        assert!(validate_class("md:hover:bg-blue-500").is_ok());
        assert!(validate_class("dark:text-white/80").is_ok());
        assert!(validate_class("-mt-2").is_ok());
        assert!(validate_class("w-1/2").is_ok());
        assert!(validate_class("w-[137px]").is_ok());
        assert!(validate_class("flex").is_ok());
        assert!(validate_class("group-hover:opacity-100").is_ok());
        assert!(validate_class("btn-primary").is_err());
        assert!(validate_class("wat:px-4").is_err());
    }

    #[test]
    fn test_validate_reports_warnings_only() {
        let tokens = vec![StyleToken::class("px-4"), StyleToken::class("card-header")];
        let report = UtilityClassExtractor::default().validate(&tokens);
        assert!(report.is_valid);
        assert_eq!(report.issues.len(), 1);
        assert_eq!(report.issues[0].token, "card-header");
        assert_eq!(report.issues[0].severity, super::super::IssueSeverity::Warning);
    }
}
