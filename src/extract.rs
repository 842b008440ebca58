//! Component extraction orchestration
//!
//! Coordinates the detectors and style extractors over one parsed file and
//! assembles the [`ComponentDescriptor`].

use std::path::Path;

use tracing::debug;
use tree_sitter::Tree;

use crate::detectors::javascript::extract_component;
use crate::error::Result;
use crate::lang::Lang;
use crate::schema::{content_fingerprint, ComponentCategory, ComponentDescriptor};
use crate::styles::{default_extractors, StyleExtraction, StyleExtractor, StyleSystem};

/// Outcome of analyzing one file
#[derive(Debug, Clone, PartialEq)]
pub enum Extraction {
    Component(Box<ComponentDescriptor>),
    /// Valid syntax without a component-shaped declaration
    NotComponent,
}

impl Extraction {
    pub fn into_component(self) -> Option<ComponentDescriptor> {
        match self {
            Extraction::Component(descriptor) => Some(*descriptor),
            Extraction::NotComponent => None,
        }
    }
}

/// Parse and analyze one file.
///
/// Errors are limited to unsupported extensions and unparseable sources; a
/// well-formed file without a component yields [`Extraction::NotComponent`].
pub fn analyze_file(file_path: &Path, source: &str) -> Result<Extraction> {
    analyze_file_with(file_path, source, &default_extractors())
}

/// [`analyze_file`] with an explicit set of style extractors
pub fn analyze_file_with(
    file_path: &Path,
    source: &str,
    extractors: &[Box<dyn StyleExtractor>],
) -> Result<Extraction> {
    let lang = Lang::from_path(file_path)?;
    let tree = lang.parse(source)?;
    Ok(extract(file_path, source, &tree, lang, extractors))
}

/// Extract a component descriptor from a parsed source file
///
/// The category is left unclassified; assignment happens at snapshot build time.
pub fn extract(
    file_path: &Path,
    source: &str,
    tree: &Tree,
    lang: Lang,
    extractors: &[Box<dyn StyleExtractor>],
) -> Extraction {
    let root = tree.root_node();

    let Some((found, facts)) = extract_component(&root, source, file_path) else {
        debug!(path = %file_path.display(), "no component found");
        return Extraction::NotComponent;
    };

    // Class lists belong to the component's own declaration; style tables are
    // usually declared next to it at module level.
    let mut styles = StyleExtraction::default();
    for extractor in extractors {
        let scope = match extractor.system() {
            StyleSystem::UtilityClass => found.declaration,
            StyleSystem::StyleObject => root,
        };
        styles.merge(extractor.extract(&scope, source));
    }

    let mut style_issues = Vec::new();
    for extractor in extractors {
        let own: Vec<_> = styles
            .tokens
            .iter()
            .filter(|t| t.system() == extractor.system())
            .cloned()
            .collect();
        if own.is_empty() {
            continue;
        }
        style_issues.extend(extractor.validate(&own).issues);
    }

    let descriptor = ComponentDescriptor {
        name: facts.name,
        category: ComponentCategory::Unclassified,
        file: file_path.display().to_string(),
        language: lang.name().to_string(),
        style_tokens: styles.tokens,
        unresolved_styles: styles.unresolved,
        style_issues,
        props: facts.props,
        structure: facts.structure,
        dependencies: facts.dependencies,
        fingerprint: content_fingerprint(source),
    };

    debug!(
        path = %file_path.display(),
        component = %descriptor.name,
        tokens = descriptor.style_tokens.len(),
        props = descriptor.props.len(),
        "extracted component"
    );

    Extraction::Component(Box::new(descriptor))
}
