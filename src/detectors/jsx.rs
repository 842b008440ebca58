//! JSX structure extraction
//!
//! Builds the shallow element tree of the expression a component returns.
//! Conditional wrappers (`cond ? <A/> : <B/>`, `cond && <A/>`) are looked
//! through; attribute expressions are recorded by name and never evaluated.

use tree_sitter::Node;

use crate::detectors::common::{get_node_text, named_children, string_literal_value, unwrap_expression};
use crate::schema::ElementNode;

/// Tag used when both branches of a conditional render an element
pub const CONDITIONAL_TAG: &str = "(conditional)";

/// Tag used for `<>...</>`
pub const FRAGMENT_TAG: &str = "Fragment";

/// Whether an expression evaluates to an element, looking through wrappers
pub fn is_element_like(node: Node, source: &str) -> bool {
    let node = unwrap_expression(node);
    match node.kind() {
        "jsx_element" | "jsx_self_closing_element" | "jsx_fragment" => true,
        "call_expression" => is_create_element(&node, source),
        "ternary_expression" => ["consequence", "alternative"]
            .iter()
            .filter_map(|f| node.child_by_field_name(f))
            .any(|branch| is_element_like(branch, source)),
        "binary_expression" => ["left", "right"]
            .iter()
            .filter_map(|f| node.child_by_field_name(f))
            .any(|side| is_element_like(side, source)),
        _ => false,
    }
}

/// Build the element tree for a returned expression
pub fn build_structure(node: Node, source: &str) -> Option<ElementNode> {
    let mut roots = collect_elements(node, source);
    match roots.len() {
        0 => None,
        1 => roots.pop(),
        _ => Some(ElementNode {
            tag: CONDITIONAL_TAG.to_string(),
            children: roots,
            ..Default::default()
        }),
    }
}

/// Elements an expression may render, in source order
fn collect_elements(node: Node, source: &str) -> Vec<ElementNode> {
    let node = unwrap_expression(node);
    match node.kind() {
        "jsx_element" | "jsx_fragment" => vec![element_from_jsx(&node, source)],
        "jsx_self_closing_element" => vec![opening_to_node(&node, source)],
        "call_expression" if is_create_element(&node, source) => {
            element_from_create_element(&node, source).into_iter().collect()
        }
        "call_expression" => mapped_elements(&node, source),
        "ternary_expression" => ["consequence", "alternative"]
            .iter()
            .filter_map(|f| node.child_by_field_name(f))
            .flat_map(|branch| collect_elements(branch, source))
            .collect(),
        "binary_expression" => {
            let operator = node
                .child_by_field_name("operator")
                .map(|o| get_node_text(&o, source))
                .unwrap_or_default();
            let fields: &[&str] = match operator.as_str() {
                "&&" => &["right"],
                "||" | "??" => &["left", "right"],
                _ => &[],
            };
            fields
                .iter()
                .filter_map(|f| node.child_by_field_name(f))
                .flat_map(|side| collect_elements(side, source))
                .collect()
        }
        "jsx_expression" => node
            .named_child(0)
            .map(|inner| collect_elements(inner, source))
            .unwrap_or_default(),
        _ => Vec::new(),
    }
}

/// `items.map(item => <li/>)` renders the callback's element
fn mapped_elements(call: &Node, source: &str) -> Vec<ElementNode> {
    let Some(function) = call.child_by_field_name("function") else {
        return Vec::new();
    };
    let is_map = function
        .child_by_field_name("property")
        .map(|p| get_node_text(&p, source) == "map")
        .unwrap_or(false);
    if !is_map {
        return Vec::new();
    }
    let Some(callback) = call
        .child_by_field_name("arguments")
        .and_then(|args| args.named_child(0))
    else {
        return Vec::new();
    };
    match callback.child_by_field_name("body") {
        Some(body) if body.kind() == "statement_block" => last_returned_expression(&body)
            .map(|expr| collect_elements(expr, source))
            .unwrap_or_default(),
        Some(body) => collect_elements(body, source),
        None => Vec::new(),
    }
}

/// Argument of the last `return` directly inside a block
fn last_returned_expression<'a>(block: &Node<'a>) -> Option<Node<'a>> {
    named_children(block)
        .into_iter()
        .filter(|s| s.kind() == "return_statement")
        .filter_map(|s| s.named_child(0))
        .last()
}

fn element_from_jsx(node: &Node, source: &str) -> ElementNode {
    let opening = node
        .child_by_field_name("open_tag")
        .or_else(|| {
            named_children(node)
                .into_iter()
                .find(|c| c.kind() == "jsx_opening_element")
        });

    let mut element = match opening {
        Some(open) => opening_to_node(&open, source),
        None => ElementNode::new(FRAGMENT_TAG),
    };

    for child in named_children(node) {
        match child.kind() {
            "jsx_element" | "jsx_fragment" => element.children.push(element_from_jsx(&child, source)),
            "jsx_self_closing_element" => element.children.push(opening_to_node(&child, source)),
            "jsx_expression" => element.children.extend(collect_elements(child, source)),
            _ => {}
        }
    }

    element
}

/// Tag and attributes of an opening or self-closing element
fn opening_to_node(node: &Node, source: &str) -> ElementNode {
    let tag = node
        .child_by_field_name("name")
        .map(|n| get_node_text(&n, source))
        .unwrap_or_else(|| FRAGMENT_TAG.to_string());

    let mut element = ElementNode::new(tag);
    for attr in named_children(node) {
        match attr.kind() {
            "jsx_attribute" => {
                let mut parts = named_children(&attr).into_iter();
                let Some(name) = parts.next() else { continue };
                let name = get_node_text(&name, source);
                match parts.next() {
                    None => {
                        element.static_attributes.insert(name, "true".to_string());
                    }
                    Some(value) if value.kind() == "string" => {
                        let text = string_literal_value(&value, source).unwrap_or_default();
                        element.static_attributes.insert(name, text);
                    }
                    Some(_) => push_dynamic(&mut element, name),
                }
            }
            // `{...props}`
            "jsx_expression" => {
                let text = get_node_text(&attr, source);
                let text = text.trim_start_matches('{').trim_end_matches('}').trim();
                push_dynamic(&mut element, text.to_string());
            }
            _ => {}
        }
    }
    element
}

fn push_dynamic(element: &mut ElementNode, name: String) {
    if !element.dynamic_attributes.contains(&name) {
        element.dynamic_attributes.push(name);
    }
}

/// `React.createElement(...)` / `createElement(...)` / `h(...)`
fn is_create_element(call: &Node, source: &str) -> bool {
    call.child_by_field_name("function")
        .map(|f| {
            let callee = get_node_text(&f, source);
            callee == "createElement" || callee.ends_with(".createElement")
        })
        .unwrap_or(false)
}

fn element_from_create_element(call: &Node, source: &str) -> Option<ElementNode> {
    let args = named_children(&call.child_by_field_name("arguments")?);
    let mut args = args.into_iter();

    let tag_node = args.next()?;
    let tag = string_literal_value(&tag_node, source).unwrap_or_else(|| get_node_text(&tag_node, source));
    let mut element = ElementNode::new(tag);

    if let Some(props) = args.next().map(unwrap_expression) {
        if props.kind() == "object" {
            for entry in named_children(&props) {
                match entry.kind() {
                    "pair" => {
                        let (Some(key), Some(value)) =
                            (entry.child_by_field_name("key"), entry.child_by_field_name("value"))
                        else {
                            continue;
                        };
                        let key = string_literal_value(&key, source).unwrap_or_else(|| get_node_text(&key, source));
                        match string_literal_value(&value, source) {
                            Some(text) => {
                                element.static_attributes.insert(key, text);
                            }
                            None => push_dynamic(&mut element, key),
                        }
                    }
                    "shorthand_property_identifier" => push_dynamic(&mut element, get_node_text(&entry, source)),
                    "spread_element" => push_dynamic(&mut element, get_node_text(&entry, source)),
                    _ => {}
                }
            }
        }
    }

    for child in args {
        element.children.extend(collect_elements(child, source));
    }
    Some(element)
}
