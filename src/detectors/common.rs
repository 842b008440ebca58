//! Shared tree-sitter helpers for the component detectors

use tree_sitter::Node;

/// Get the source text of a node
pub fn get_node_text(node: &Node, source: &str) -> String {
    node.utf8_text(source.as_bytes()).unwrap_or("").to_string()
}

/// Visit every node in the subtree rooted at `node`, depth-first
pub fn visit_all<F>(node: &Node, mut f: F)
where
    F: FnMut(&Node),
{
    visit_recursive(node, &mut f);
}

fn visit_recursive<F>(node: &Node, f: &mut F)
where
    F: FnMut(&Node),
{
    f(node);
    let mut cursor = node.walk();
    for child in node.children(&mut cursor) {
        visit_recursive(&child, f);
    }
}

/// Strip parentheses (and TS `as`/`satisfies`/non-null wrappers) around an expression
pub fn unwrap_expression<'a>(node: Node<'a>) -> Node<'a> {
    let mut current = node;
    loop {
        match current.kind() {
            "parenthesized_expression"
            | "as_expression"
            | "satisfies_expression"
            | "non_null_expression" => match current.named_child(0) {
                Some(inner) => current = inner,
                None => return current,
            },
            _ => return current,
        }
    }
}

/// Value of a string literal node without its quotes
pub fn string_literal_value(node: &Node, source: &str) -> Option<String> {
    if node.kind() != "string" {
        return None;
    }
    let text = get_node_text(node, source);
    let inner = text
        .strip_prefix(['"', '\''])
        .and_then(|t| t.strip_suffix(['"', '\'']))
        .unwrap_or(&text);
    Some(inner.to_string())
}

/// Key of an object `pair` as plain text (identifiers, strings and numbers)
pub fn property_key_text(key: &Node, source: &str) -> String {
    string_literal_value(key, source).unwrap_or_else(|| get_node_text(key, source))
}

/// Whether the identifier looks like a component name (starts uppercase)
pub fn is_component_name(name: &str) -> bool {
    name.chars().next().is_some_and(|c| c.is_ascii_uppercase())
}

/// Named children of a node collected into a Vec
pub fn named_children<'a>(node: &Node<'a>) -> Vec<Node<'a>> {
    let mut cursor = node.walk();
    node.named_children(&mut cursor).collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::lang::Lang;

    #[test]
    fn test_string_literal_value() {
        let source = "const a = 'px-4 py-2';";
        let tree = Lang::TypeScript.parse(source).unwrap();
        let mut found = None;
        visit_all(&tree.root_node(), |node| {
            if node.kind() == "string" {
                found = string_literal_value(node, source);
            }
        });
        assert_eq!(found.as_deref(), Some("px-4 py-2"));
    }

    #[test]
    fn test_unwrap_expression() {
        let source = "const a = ((value as string));";
        let tree = Lang::TypeScript.parse(source).unwrap();
        let mut inner_kind = String::new();
        visit_all(&tree.root_node(), |node| {
            if node.kind() == "variable_declarator" {
                if let Some(value) = node.child_by_field_name("value") {
                    inner_kind = unwrap_expression(value).kind().to_string();
                }
            }
        });
        assert_eq!(inner_kind, "identifier");
    }

    #[test]
    fn test_is_component_name() {
        assert!(is_component_name("Button"));
        assert!(!is_component_name("useButton"));
        assert!(!is_component_name(""));
    }
}
