//! JavaScript/TypeScript/JSX/TSX component detector
//!
//! Decides whether a file defines a UI component and extracts:
//! - Component name (function declaration, bound arrow/function expression,
//!   or anonymous default export named after the file)
//! - Props from the parameter destructuring pattern and the prop type declaration
//! - The element tree of the returned JSX
//! - Local imports referenced by that JSX

use std::collections::{BTreeSet, HashMap, HashSet};
use std::path::Path;

use tree_sitter::Node;

use crate::detectors::common::{
    get_node_text, is_component_name, named_children, property_key_text, unwrap_expression,
    visit_all,
};
use crate::detectors::jsx::{build_structure, is_element_like};
use crate::schema::{ElementNode, Prop, RawType};
use crate::utils::to_pascal_case;

/// Wrappers that keep a component's identity (`memo(Button)`, `forwardRef(...)`)
const COMPONENT_WRAPPERS: &[&str] = &["forwardRef", "memo", "observer"];

/// Node kinds that start a new function scope
const FUNCTION_KINDS: &[&str] = &[
    "function_declaration",
    "function_expression",
    "function",
    "arrow_function",
    "generator_function_declaration",
    "method_definition",
    "class_declaration",
    "class",
];

/// Which name-resolution strategy found the component
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NameSource {
    FunctionDeclaration,
    VariableBinding,
    DefaultExport,
}

/// A component found in a file, still tied to its syntax tree
#[derive(Debug, Clone)]
pub struct ComponentMatch<'a> {
    pub name: String,
    pub source: NameSource,
    /// The function implementing the component
    pub function: Node<'a>,
    /// Top-level statement containing the component
    pub declaration: Node<'a>,
    /// `React.FC<Props>`-style annotation on the binding
    pub binding_type: Option<Node<'a>>,
    /// Props type argument of a wrapper call (`forwardRef<Ref, Props>`)
    pub wrapper_type: Option<Node<'a>>,
    /// The returned element-like expression
    pub returned: Node<'a>,
}

/// Everything extracted for one component
#[derive(Debug, Clone)]
pub struct ComponentFacts {
    pub name: String,
    pub props: Vec<Prop>,
    pub structure: Option<ElementNode>,
    pub dependencies: BTreeSet<String>,
}

/// Analyze a parsed file; `None` when it defines no exported component
pub fn extract_component<'a>(
    root: &Node<'a>,
    source: &str,
    file_path: &Path,
) -> Option<(ComponentMatch<'a>, ComponentFacts)> {
    let found = find_component(root, source, file_path)?;

    let mut props = extract_props(root, &found, source);
    apply_default_props(root, &found.name, source, &mut props);

    let structure = build_structure(found.returned, source);
    let dependencies = extract_dependencies(root, &found.returned, source);

    let facts = ComponentFacts {
        name: found.name.clone(),
        props,
        structure,
        dependencies,
    };
    Some((found, facts))
}

// ============================================================================
// Component name resolution
// ============================================================================

/// Try each strategy in order; the first that matches wins
pub fn find_component<'a>(
    root: &Node<'a>,
    source: &str,
    file_path: &Path,
) -> Option<ComponentMatch<'a>> {
    let exports = collect_exported_names(root, source);

    let mut declarations: Vec<ComponentMatch<'a>> = Vec::new();
    let mut bindings: Vec<ComponentMatch<'a>> = Vec::new();

    for statement in named_children(root) {
        let (decl, exported_inline) = match statement.kind() {
            "export_statement" => match statement.child_by_field_name("declaration") {
                Some(decl) => (decl, true),
                None => continue,
            },
            _ => (statement, false),
        };

        match decl.kind() {
            "function_declaration" => {
                let Some(name) = decl.child_by_field_name("name").map(|n| get_node_text(&n, source))
                else {
                    continue;
                };
                if !is_component_name(&name) || !(exported_inline || exports.contains(&name)) {
                    continue;
                }
                if let Some(returned) = returned_element(&decl, source) {
                    declarations.push(ComponentMatch {
                        name,
                        source: NameSource::FunctionDeclaration,
                        function: decl,
                        declaration: statement,
                        binding_type: None,
                        wrapper_type: None,
                        returned,
                    });
                }
            }
            "lexical_declaration" | "variable_declaration" => {
                for declarator in named_children(&decl) {
                    if declarator.kind() != "variable_declarator" {
                        continue;
                    }
                    let Some(name) = declarator
                        .child_by_field_name("name")
                        .map(|n| get_node_text(&n, source))
                    else {
                        continue;
                    };
                    if !is_component_name(&name) || !(exported_inline || exports.contains(&name)) {
                        continue;
                    }
                    let Some((function, wrapper_type)) = declarator
                        .child_by_field_name("value")
                        .and_then(|v| unwrap_component_function(v, source))
                    else {
                        continue;
                    };
                    if let Some(returned) = returned_element(&function, source) {
                        bindings.push(ComponentMatch {
                            name,
                            source: NameSource::VariableBinding,
                            function,
                            declaration: statement,
                            binding_type: declarator.child_by_field_name("type"),
                            wrapper_type,
                            returned,
                        });
                    }
                }
            }
            _ => {}
        }
    }

    if let Some(found) = declarations.into_iter().next() {
        return Some(found);
    }
    if let Some(found) = bindings.into_iter().next() {
        return Some(found);
    }
    find_anonymous_default_export(root, source, file_path)
}

/// Names exported by declaration, export clause or `export default Name`
fn collect_exported_names(root: &Node, source: &str) -> HashSet<String> {
    let mut names = HashSet::new();

    for statement in named_children(root) {
        if statement.kind() != "export_statement" {
            continue;
        }
        if let Some(value) = statement.child_by_field_name("value") {
            collect_wrapped_identifiers(&unwrap_expression(value), source, &mut names);
        }
        for child in named_children(&statement) {
            if child.kind() == "export_clause" {
                for specifier in named_children(&child) {
                    if specifier.kind() == "export_specifier" {
                        if let Some(name) = specifier.child_by_field_name("name") {
                            names.insert(get_node_text(&name, source));
                        }
                    }
                }
            }
        }
    }
    names
}

/// `Button`, `memo(Button)`, `memo(forwardRef(Button))`
fn collect_wrapped_identifiers(node: &Node, source: &str, names: &mut HashSet<String>) {
    match node.kind() {
        "identifier" => {
            names.insert(get_node_text(node, source));
        }
        "call_expression" if is_wrapper_call(node, source) => {
            if let Some(args) = node.child_by_field_name("arguments") {
                for arg in named_children(&args) {
                    collect_wrapped_identifiers(&unwrap_expression(arg), source, names);
                }
            }
        }
        _ => {}
    }
}

/// `forwardRef` for `React.forwardRef(...)`, `None` for non-wrapper calls
fn wrapper_name(call: &Node, source: &str) -> Option<&'static str> {
    let callee = get_node_text(&call.child_by_field_name("function")?, source);
    let last = callee.rsplit('.').next().unwrap_or(&callee);
    COMPONENT_WRAPPERS.iter().copied().find(|w| *w == last)
}

fn is_wrapper_call(call: &Node, source: &str) -> bool {
    wrapper_name(call, source).is_some()
}

/// The function behind a binding value, looking through component wrappers,
/// with the innermost props type argument found on the way
fn unwrap_component_function<'a>(
    value: Node<'a>,
    source: &str,
) -> Option<(Node<'a>, Option<Node<'a>>)> {
    let value = unwrap_expression(value);
    match value.kind() {
        "arrow_function" | "function_expression" | "function" => Some((value, None)),
        "call_expression" if is_wrapper_call(&value, source) => {
            let args = value.child_by_field_name("arguments")?;
            let (function, inner) = named_children(&args)
                .into_iter()
                .find_map(|arg| unwrap_component_function(arg, source))?;
            Some((function, inner.or_else(|| wrapper_props_type(&value, source))))
        }
        _ => None,
    }
}

/// `forwardRef<Ref, Props>` carries props second; `memo<Props>` and `observer<Props>` first
fn wrapper_props_type<'a>(call: &Node<'a>, source: &str) -> Option<Node<'a>> {
    let args = call.child_by_field_name("type_arguments")?;
    let index = match wrapper_name(call, source)? {
        "forwardRef" => 1,
        _ => 0,
    };
    named_children(&args)
        .into_iter()
        .filter(|t| t.kind() != "comment")
        .nth(index)
}

/// `export default function () {...}` / `export default () => ...`
fn find_anonymous_default_export<'a>(
    root: &Node<'a>,
    source: &str,
    file_path: &Path,
) -> Option<ComponentMatch<'a>> {
    for statement in named_children(root) {
        if statement.kind() != "export_statement" {
            continue;
        }
        let Some(value) = statement.child_by_field_name("value") else {
            continue;
        };
        let Some((function, wrapper_type)) = unwrap_component_function(value, source) else {
            continue;
        };
        if let Some(returned) = returned_element(&function, source) {
            return Some(ComponentMatch {
                name: name_from_file(file_path),
                source: NameSource::DefaultExport,
                function,
                declaration: statement,
                binding_type: None,
                wrapper_type,
                returned,
            });
        }
    }
    None
}

/// PascalCase file stem; `index` files take their directory name
fn name_from_file(file_path: &Path) -> String {
    let stem = file_path
        .file_stem()
        .and_then(|s| s.to_str())
        .unwrap_or_default();
    let stem = if stem.eq_ignore_ascii_case("index") {
        file_path
            .parent()
            .and_then(|p| p.file_name())
            .and_then(|s| s.to_str())
            .unwrap_or(stem)
    } else {
        stem
    };
    to_pascal_case(stem)
}

// ============================================================================
// Returned expression
// ============================================================================

/// The element-like expression a function returns.
///
/// Arrow functions with an expression body return it directly. For block
/// bodies the last element-like `return` of the function's own scope wins, so
/// early `return <Spinner />` guards do not shadow the main render.
pub fn returned_element<'a>(function: &Node<'a>, source: &str) -> Option<Node<'a>> {
    let body = function.child_by_field_name("body")?;
    if body.kind() != "statement_block" {
        return is_element_like(body, source).then_some(body);
    }

    let mut returns = Vec::new();
    collect_returns(&body, &mut returns);
    returns
        .into_iter()
        .filter_map(|r| r.named_child(0))
        .filter(|expr| is_element_like(*expr, source))
        .last()
}

fn collect_returns<'a>(node: &Node<'a>, out: &mut Vec<Node<'a>>) {
    let mut cursor = node.walk();
    for child in node.named_children(&mut cursor) {
        if child.kind() == "return_statement" {
            out.push(child);
        } else if !FUNCTION_KINDS.contains(&child.kind()) {
            collect_returns(&child, out);
        }
    }
}

// ============================================================================
// Props
// ============================================================================

/// A member of a prop type declaration
#[derive(Debug, Clone)]
struct TypeMember {
    name: String,
    type_text: String,
    optional: bool,
}

/// Extract props from the first parameter and its type declaration
fn extract_props(root: &Node, found: &ComponentMatch, source: &str) -> Vec<Prop> {
    let (pattern, annotation) = first_parameter(&found.function);

    let type_node = annotation
        .or_else(|| {
            found
                .binding_type
                .and_then(|t| t.named_child(0))
                .and_then(component_type_argument)
        })
        .or(found.wrapper_type);

    let members = type_node.map(|t| {
        let declarations = collect_type_declarations(root, source);
        let mut members = Vec::new();
        resolve_type_members(t, source, &declarations, &mut members, 0);
        members
    });

    let declared: HashMap<&str, &TypeMember> = members
        .iter()
        .flatten()
        .map(|m| (m.name.as_str(), m))
        .collect();

    let mut props: Vec<Prop> = Vec::new();
    match pattern {
        Some(pattern) if pattern.kind() == "object_pattern" => {
            for (name, default) in destructured_props(&pattern, source) {
                let member = declared.get(name.as_str());
                props.push(Prop {
                    prop_type: member
                        .map(|m| RawType::new(m.type_text.clone()))
                        .unwrap_or_default(),
                    required: default.is_none() && !member.is_some_and(|m| m.optional),
                    default,
                    name,
                });
            }
        }
        Some(pattern) if pattern.kind() == "identifier" && members.is_none() => {
            let param = get_node_text(&pattern, source);
            for name in member_accesses(&found.function, &param, source) {
                props.push(Prop {
                    name,
                    prop_type: RawType::unknown(),
                    required: true,
                    default: None,
                });
            }
        }
        _ => {}
    }

    // Declared props that the pattern does not destructure still belong to the contract
    for member in members.iter().flatten() {
        if props.iter().any(|p| p.name == member.name) {
            continue;
        }
        props.push(Prop {
            name: member.name.clone(),
            prop_type: RawType::new(member.type_text.clone()),
            required: !member.optional,
            default: None,
        });
    }

    props
}

/// Pattern and type annotation of a function's first parameter
fn first_parameter<'a>(function: &Node<'a>) -> (Option<Node<'a>>, Option<Node<'a>>) {
    if let Some(param) = function.child_by_field_name("parameter") {
        return (Some(param), None);
    }
    let Some(params) = function.child_by_field_name("parameters") else {
        return (None, None);
    };
    let Some(first) = named_children(&params)
        .into_iter()
        .find(|p| p.kind() != "comment")
    else {
        return (None, None);
    };

    match first.kind() {
        "required_parameter" | "optional_parameter" => {
            let pattern = first.child_by_field_name("pattern");
            let annotation = first
                .child_by_field_name("type")
                .and_then(|t| t.named_child(0));
            (pattern, annotation)
        }
        // `({ a } = {})` in plain JavaScript
        "assignment_pattern" => (first.child_by_field_name("left"), None),
        _ => (Some(first), None),
    }
}

/// `React.FC<Props>` / `FC<Props>` / `ComponentProps<...>` -> `Props`
fn component_type_argument<'a>(type_node: Node<'a>) -> Option<Node<'a>> {
    if type_node.kind() != "generic_type" {
        return None;
    }
    let args = type_node.child_by_field_name("type_arguments").or_else(|| {
        named_children(&type_node)
            .into_iter()
            .find(|c| c.kind() == "type_arguments")
    })?;
    args.named_child(0)
}

/// Entries of a destructuring pattern as `(name, default)` in source order
fn destructured_props(pattern: &Node, source: &str) -> Vec<(String, Option<String>)> {
    let mut props = Vec::new();
    for entry in named_children(pattern) {
        match entry.kind() {
            "shorthand_property_identifier_pattern" => {
                props.push((get_node_text(&entry, source), None));
            }
            "object_assignment_pattern" => {
                let name = entry
                    .child_by_field_name("left")
                    .map(|n| get_node_text(&n, source));
                let default = entry
                    .child_by_field_name("right")
                    .map(|n| get_node_text(&n, source));
                if let Some(name) = name {
                    props.push((name, default));
                }
            }
            "pair_pattern" => {
                let Some(key) = entry.child_by_field_name("key") else {
                    continue;
                };
                let default = entry
                    .child_by_field_name("value")
                    .filter(|v| v.kind() == "assignment_pattern")
                    .and_then(|v| v.child_by_field_name("right"))
                    .map(|n| get_node_text(&n, source));
                props.push((property_key_text(&key, source), default));
            }
            _ => {}
        }
    }
    props
}

/// `props.foo` accesses inside a function, first-seen order
fn member_accesses(function: &Node, param: &str, source: &str) -> Vec<String> {
    let mut names: Vec<String> = Vec::new();
    if let Some(body) = function.child_by_field_name("body") {
        visit_all(&body, |node| {
            if node.kind() != "member_expression" {
                return;
            }
            let object = node.child_by_field_name("object");
            if object.map(|o| get_node_text(&o, source)) != Some(param.to_string()) {
                return;
            }
            if let Some(property) = node.child_by_field_name("property") {
                let name = get_node_text(&property, source);
                if !names.contains(&name) {
                    names.push(name);
                }
            }
        });
    }
    names
}

/// Interfaces and type aliases declared in this file, by name
fn collect_type_declarations<'a>(root: &Node<'a>, source: &str) -> HashMap<String, Node<'a>> {
    let mut declarations = HashMap::new();
    for statement in named_children(root) {
        let decl = if statement.kind() == "export_statement" {
            match statement.child_by_field_name("declaration") {
                Some(d) => d,
                None => continue,
            }
        } else {
            statement
        };
        if matches!(decl.kind(), "interface_declaration" | "type_alias_declaration") {
            if let Some(name) = decl.child_by_field_name("name") {
                declarations.insert(get_node_text(&name, source), decl);
            }
        }
    }
    declarations
}

/// Members of a prop type; aliases are followed only within this file
fn resolve_type_members(
    type_node: Node,
    source: &str,
    declarations: &HashMap<String, Node>,
    out: &mut Vec<TypeMember>,
    depth: usize,
) {
    if depth > 8 {
        return;
    }
    match type_node.kind() {
        "object_type" | "interface_body" => {
            for member in named_children(&type_node) {
                if let Some(m) = type_member(&member, source) {
                    if !out.iter().any(|existing| existing.name == m.name) {
                        out.push(m);
                    }
                }
            }
        }
        "type_identifier" | "nested_type_identifier" => {
            let name = get_node_text(&type_node, source);
            let Some(decl) = declarations.get(&name) else {
                return;
            };
            let body = match decl.kind() {
                "interface_declaration" => decl.child_by_field_name("body"),
                _ => decl.child_by_field_name("value"),
            };
            if let Some(body) = body {
                resolve_type_members(body, source, declarations, out, depth + 1);
            }
            if decl.kind() == "interface_declaration" {
                for child in named_children(decl) {
                    if child.kind() == "extends_type_clause" {
                        for base in named_children(&child) {
                            resolve_type_members(base, source, declarations, out, depth + 1);
                        }
                    }
                }
            }
        }
        "intersection_type" | "parenthesized_type" => {
            for part in named_children(&type_node) {
                resolve_type_members(part, source, declarations, out, depth + 1);
            }
        }
        // `PropsWithChildren<Props>` style wrappers: look at the first argument
        "generic_type" => {
            if let Some(arg) = component_type_argument(type_node) {
                resolve_type_members(arg, source, declarations, out, depth + 1);
            }
        }
        _ => {}
    }
}

fn type_member(member: &Node, source: &str) -> Option<TypeMember> {
    match member.kind() {
        "property_signature" => {
            let name = property_key_text(&member.child_by_field_name("name")?, source);
            let type_text = member
                .child_by_field_name("type")
                .and_then(|t| t.named_child(0))
                .map(|t| get_node_text(&t, source))
                .unwrap_or_else(|| RawType::UNKNOWN.to_string());
            Some(TypeMember {
                name,
                type_text,
                optional: has_optional_marker(member),
            })
        }
        "method_signature" => {
            let name_node = member.child_by_field_name("name")?;
            let name = property_key_text(&name_node, source);
            let full = get_node_text(member, source);
            let signature = full
                .get(name_node.end_byte() - member.start_byte()..)
                .unwrap_or_default()
                .trim_start_matches('?')
                .trim()
                .trim_end_matches([';', ','])
                .to_string();
            Some(TypeMember {
                name,
                type_text: signature,
                optional: has_optional_marker(member),
            })
        }
        _ => None,
    }
}

/// `name?: T` carries an anonymous `?` child
fn has_optional_marker(member: &Node) -> bool {
    let mut cursor = member.walk();
    let has_marker = member.children(&mut cursor).any(|c| c.kind() == "?");
    has_marker
}

/// `Button.defaultProps = { size: "md" }`
fn apply_default_props(root: &Node, component: &str, source: &str, props: &mut [Prop]) {
    let target = format!("{}.defaultProps", component);
    for statement in named_children(root) {
        if statement.kind() != "expression_statement" {
            continue;
        }
        let Some(assignment) = statement.named_child(0) else {
            continue;
        };
        if assignment.kind() != "assignment_expression" {
            continue;
        }
        let is_target = assignment
            .child_by_field_name("left")
            .map(|l| get_node_text(&l, source) == target)
            .unwrap_or(false);
        let Some(defaults) = assignment
            .child_by_field_name("right")
            .map(unwrap_expression)
            .filter(|r| is_target && r.kind() == "object")
        else {
            continue;
        };
        for pair in named_children(&defaults) {
            if pair.kind() != "pair" {
                continue;
            }
            let (Some(key), Some(value)) =
                (pair.child_by_field_name("key"), pair.child_by_field_name("value"))
            else {
                continue;
            };
            let key = property_key_text(&key, source);
            if let Some(prop) = props.iter_mut().find(|p| p.name == key) {
                if prop.default.is_none() {
                    prop.default = Some(get_node_text(&value, source));
                }
                prop.required = false;
            }
        }
    }
}

// ============================================================================
// Dependencies
// ============================================================================

/// Local imports that the returned expression references
fn extract_dependencies(root: &Node, returned: &Node, source: &str) -> BTreeSet<String> {
    let imported = collect_local_imports(root, source);
    if imported.is_empty() {
        return BTreeSet::new();
    }

    let mut referenced = BTreeSet::new();
    visit_all(returned, |node| {
        if matches!(node.kind(), "identifier" | "type_identifier") {
            let name = get_node_text(node, source);
            if imported.contains(&name) {
                referenced.insert(name);
            }
        }
    });
    referenced
}

/// Identifiers bound by imports from local modules
pub fn collect_local_imports(root: &Node, source: &str) -> HashSet<String> {
    let mut names = HashSet::new();
    for statement in named_children(root) {
        if statement.kind() != "import_statement" {
            continue;
        }
        let Some(module) = statement.child_by_field_name("source") else {
            continue;
        };
        let module = get_node_text(&module, source);
        if !is_local_import(module.trim_matches(['"', '\''])) {
            continue;
        }
        for clause in named_children(&statement) {
            if clause.kind() != "import_clause" {
                continue;
            }
            for inner in named_children(&clause) {
                match inner.kind() {
                    "identifier" => {
                        names.insert(get_node_text(&inner, source));
                    }
                    "named_imports" => {
                        for specifier in named_children(&inner) {
                            if specifier.kind() != "import_specifier" {
                                continue;
                            }
                            let local = specifier
                                .child_by_field_name("alias")
                                .or_else(|| specifier.child_by_field_name("name"));
                            if let Some(local) = local {
                                names.insert(get_node_text(&local, source));
                            }
                        }
                    }
                    "namespace_import" => {
                        if let Some(ident) = named_children(&inner)
                            .into_iter()
                            .find(|n| n.kind() == "identifier")
                        {
                            names.insert(get_node_text(&ident, source));
                        }
                    }
                    _ => {}
                }
            }
        }
    }
    names
}

/// Relative paths and the common project-root aliases are local
fn is_local_import(module: &str) -> bool {
    module.starts_with('.')
        || module.starts_with('/')
        || module.starts_with("@/")
        || module.starts_with("~/")
}
