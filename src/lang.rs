//! Language detection and tree-sitter grammar loading

use std::path::Path;
use tree_sitter::{Language, Parser, Tree};

use crate::error::{CatalogError, Result};

/// Source languages a UI component can be written in
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Lang {
    TypeScript,
    Tsx,
    JavaScript,
    Jsx,
}

impl Lang {
    /// Detect language from file path extension
    pub fn from_path(path: &Path) -> Result<Self> {
        let ext = path
            .extension()
            .and_then(|e| e.to_str())
            .ok_or_else(|| CatalogError::UnsupportedLanguage {
                extension: "none".to_string(),
            })?;

        Self::from_extension(ext)
    }

    /// Detect language from file extension string
    pub fn from_extension(ext: &str) -> Result<Self> {
        match ext.to_lowercase().as_str() {
            "ts" | "mts" | "cts" => Ok(Self::TypeScript),
            "tsx" => Ok(Self::Tsx),
            "js" | "mjs" | "cjs" => Ok(Self::JavaScript),
            "jsx" => Ok(Self::Jsx),
            _ => Err(CatalogError::UnsupportedLanguage {
                extension: ext.to_string(),
            }),
        }
    }

    /// Get the canonical name of the language
    pub fn name(&self) -> &'static str {
        match self {
            Self::TypeScript => "typescript",
            Self::Tsx => "tsx",
            Self::JavaScript => "javascript",
            Self::Jsx => "jsx",
        }
    }

    /// Get the tree-sitter Language for parsing
    pub fn tree_sitter_language(&self) -> Language {
        match self {
            Self::TypeScript => tree_sitter_typescript::LANGUAGE_TYPESCRIPT.into(),
            Self::Tsx => tree_sitter_typescript::LANGUAGE_TSX.into(),
            // The JavaScript grammar parses JSX natively
            Self::JavaScript | Self::Jsx => tree_sitter_javascript::LANGUAGE.into(),
        }
    }

    /// Parse source text into a syntax tree.
    ///
    /// tree-sitter recovers from syntax errors, so a tree containing error
    /// nodes is reported as a parse failure here rather than handed on.
    pub fn parse(&self, source: &str) -> Result<Tree> {
        let mut parser = Parser::new();
        parser
            .set_language(&self.tree_sitter_language())
            .map_err(|e| CatalogError::ParseFailure {
                message: format!("Failed to set language: {:?}", e),
            })?;

        let tree = parser
            .parse(source, None)
            .ok_or_else(|| CatalogError::ParseFailure {
                message: "Failed to parse file".to_string(),
            })?;

        let root = tree.root_node();
        if root.has_error() {
            let position = first_error_position(&root)
                .map(|(row, col)| format!(" near line {}, column {}", row + 1, col + 1))
                .unwrap_or_default();
            return Err(CatalogError::ParseFailure {
                message: format!("syntax error{}", position),
            });
        }

        Ok(tree)
    }
}

/// Locate the first ERROR or MISSING node for diagnostics
fn first_error_position(node: &tree_sitter::Node) -> Option<(usize, usize)> {
    if node.is_error() || node.is_missing() {
        let pos = node.start_position();
        return Some((pos.row, pos.column));
    }
    let mut cursor = node.walk();
    for child in node.children(&mut cursor) {
        if child.has_error() {
            if let Some(pos) = first_error_position(&child) {
                return Some(pos);
            }
        }
    }
    None
}
