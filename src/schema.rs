//! Snapshot data model
//!
//! Everything here is serialized into the persisted snapshot JSON. The shape is
//! a stability contract: fields may be added, but `category` and `name` (the
//! identity key used by the diff) must never be renamed or removed.

use std::collections::{BTreeMap, BTreeSet};
use std::fmt;
use std::fs;
use std::path::Path;

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::error::{CatalogError, Result};
use crate::styles::{StyleToken, ValidationIssue};
use crate::tokens::TokenTable;

/// Current snapshot format version. Readers accept any `1.x` snapshot.
pub const SNAPSHOT_FORMAT_VERSION: &str = "1.0";

/// FNV-1a 64-bit hash, stable across platforms and runs
pub fn fnv1a_hash(s: &str) -> u64 {
    const FNV_OFFSET: u64 = 0xcbf29ce484222325;
    const FNV_PRIME: u64 = 0x100000001b3;

    let mut hash = FNV_OFFSET;
    for byte in s.as_bytes() {
        hash ^= u64::from(*byte);
        hash = hash.wrapping_mul(FNV_PRIME);
    }
    hash
}

/// Content fingerprint of a component source file.
///
/// Computed over the raw text, so comment or formatting edits change it too.
pub fn content_fingerprint(source: &str) -> String {
    format!("{:016x}", fnv1a_hash(source))
}

/// Atomic-design bucket a component is filed under
#[derive(
    Debug, Clone, Copy, Default, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize,
)]
#[serde(rename_all = "lowercase")]
pub enum ComponentCategory {
    Atoms,
    Molecules,
    Organisms,
    Templates,
    Pages,
    #[default]
    Unclassified,
}

impl ComponentCategory {
    pub const ALL: [ComponentCategory; 6] = [
        Self::Atoms,
        Self::Molecules,
        Self::Organisms,
        Self::Templates,
        Self::Pages,
        Self::Unclassified,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Atoms => "atoms",
            Self::Molecules => "molecules",
            Self::Organisms => "organisms",
            Self::Templates => "templates",
            Self::Pages => "pages",
            Self::Unclassified => "unclassified",
        }
    }

    /// Parse a category name, accepting singular forms (`atom`, `page`)
    pub fn from_name(name: &str) -> Option<Self> {
        match name.to_lowercase().as_str() {
            "atoms" | "atom" => Some(Self::Atoms),
            "molecules" | "molecule" => Some(Self::Molecules),
            "organisms" | "organism" => Some(Self::Organisms),
            "templates" | "template" => Some(Self::Templates),
            "pages" | "page" => Some(Self::Pages),
            "unclassified" => Some(Self::Unclassified),
            _ => None,
        }
    }
}

impl fmt::Display for ComponentCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Stable identity of a component across snapshots
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct ComponentId {
    pub category: ComponentCategory,
    pub name: String,
}

impl ComponentId {
    pub fn new(category: ComponentCategory, name: impl Into<String>) -> Self {
        Self {
            category,
            name: name.into(),
        }
    }
}

impl fmt::Display for ComponentId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}", self.category, self.name)
    }
}

/// Textual type annotation of a prop, kept verbatim.
///
/// Unions, generics and literal types are preserved as written; aliases are
/// never resolved across files.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct RawType(String);

impl RawType {
    pub const UNKNOWN: &'static str = "unknown";

    pub fn new(text: impl Into<String>) -> Self {
        let text: String = text.into();
        let collapsed = text.split_whitespace().collect::<Vec<_>>().join(" ");
        if collapsed.is_empty() {
            Self::unknown()
        } else {
            Self(collapsed)
        }
    }

    pub fn unknown() -> Self {
        Self(Self::UNKNOWN.to_string())
    }

    pub fn is_unknown(&self) -> bool {
        self.0 == Self::UNKNOWN
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl Default for RawType {
    fn default() -> Self {
        Self::unknown()
    }
}

impl fmt::Display for RawType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// A component prop
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Prop {
    pub name: String,
    #[serde(rename = "type")]
    pub prop_type: RawType,
    pub required: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub default: Option<String>,
}

impl Prop {
    /// The part of a prop that counts for prop-shape comparison
    pub fn shape(&self) -> (&str, &str, bool) {
        (&self.name, self.prop_type.as_str(), self.required)
    }
}

/// One element of the JSX returned by a component
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ElementNode {
    pub tag: String,
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub static_attributes: BTreeMap<String, String>,
    /// Attributes bound to expressions, recorded by name only
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub dynamic_attributes: Vec<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub children: Vec<ElementNode>,
}

impl ElementNode {
    pub fn new(tag: impl Into<String>) -> Self {
        Self {
            tag: tag.into(),
            ..Default::default()
        }
    }

    /// Number of nodes in this subtree, including self
    pub fn node_count(&self) -> usize {
        1 + self.children.iter().map(ElementNode::node_count).sum::<usize>()
    }

    /// All tags in this subtree in document order
    pub fn tags(&self) -> Vec<&str> {
        let mut tags = vec![self.tag.as_str()];
        for child in &self.children {
            tags.extend(child.tags());
        }
        tags
    }
}

/// Structured record of one UI component
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ComponentDescriptor {
    pub name: String,
    pub category: ComponentCategory,
    /// Path of the defining file, relative to the project root when known
    pub file: String,
    pub language: String,
    /// Ordered, deduplicated style tokens
    #[serde(default)]
    pub style_tokens: Vec<StyleToken>,
    /// Style expressions that could not be resolved statically
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub unresolved_styles: Vec<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub style_issues: Vec<ValidationIssue>,
    #[serde(default)]
    pub props: Vec<Prop>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub structure: Option<ElementNode>,
    /// Local imports referenced by the returned JSX
    #[serde(default)]
    pub dependencies: BTreeSet<String>,
    pub fingerprint: String,
}

impl ComponentDescriptor {
    pub fn id(&self) -> ComponentId {
        ComponentId::new(self.category, self.name.clone())
    }

    /// Style token values in display order
    pub fn token_values(&self) -> impl Iterator<Item = &str> {
        self.style_tokens.iter().map(|t| t.value.as_str())
    }
}

/// Project metadata stored alongside a snapshot
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProjectInfo {
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub root: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub version: Option<String>,
    #[serde(default)]
    pub file_count: usize,
}

/// Immutable state of a design system at one point in time
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Snapshot {
    pub format_version: String,
    pub timestamp: String,
    pub components: Vec<ComponentDescriptor>,
    pub tokens: TokenTable,
    pub project: ProjectInfo,
}

impl Snapshot {
    /// Assemble a snapshot stamped with the current time.
    ///
    /// Components are ordered by category, then name.
    pub fn new(
        project: ProjectInfo,
        mut components: Vec<ComponentDescriptor>,
        tokens: TokenTable,
    ) -> Self {
        components.sort_by(|a, b| a.category.cmp(&b.category).then_with(|| a.name.cmp(&b.name)));
        Self {
            format_version: SNAPSHOT_FORMAT_VERSION.to_string(),
            timestamp: chrono::Utc::now().to_rfc3339(),
            components,
            tokens,
            project,
        }
    }

    pub fn to_json_pretty(&self) -> Result<String> {
        Ok(serde_json::to_string_pretty(self)?)
    }

    /// Parse a snapshot, checking `formatVersion` before anything else
    pub fn from_json(json: &str) -> Result<Self> {
        let value: Value = serde_json::from_str(json).map_err(|e| CatalogError::InvalidSnapshot {
            message: e.to_string(),
        })?;

        let found = value
            .get("formatVersion")
            .and_then(Value::as_str)
            .ok_or_else(|| CatalogError::InvalidSnapshot {
                message: "missing formatVersion".to_string(),
            })?;
        check_format_version(found)?;

        serde_json::from_value(value).map_err(|e| CatalogError::InvalidSnapshot {
            message: e.to_string(),
        })
    }

    pub fn load(path: &Path) -> Result<Self> {
        if !path.exists() {
            return Err(CatalogError::FileNotFound {
                path: path.display().to_string(),
            });
        }
        let json = fs::read_to_string(path)?;
        Self::from_json(&json)
    }

    pub fn save(&self, path: &Path) -> Result<()> {
        if let Some(parent) = path.parent() {
            if !parent.as_os_str().is_empty() {
                fs::create_dir_all(parent)?;
            }
        }
        fs::write(path, self.to_json_pretty()?)?;
        Ok(())
    }
}

/// Accept any version sharing the current major number
pub fn check_format_version(found: &str) -> Result<()> {
    let major = |v: &str| v.split('.').next().unwrap_or_default().trim().to_string();
    let expected_major = major(SNAPSHOT_FORMAT_VERSION);
    if major(found) == expected_major {
        Ok(())
    } else {
        Err(CatalogError::FormatVersion {
            found: found.to_string(),
            expected: format!("{}.x", expected_major),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn descriptor(name: &str, category: ComponentCategory) -> ComponentDescriptor {
        ComponentDescriptor {
            name: name.to_string(),
            category,
            file: format!("src/{}.tsx", name),
            language: "tsx".to_string(),
            style_tokens: vec![StyleToken::class("p-4")],
            unresolved_styles: Vec::new(),
            style_issues: Vec::new(),
            props: vec![Prop {
                name: "label".to_string(),
                prop_type: RawType::new("string"),
                required: true,
                default: None,
            }],
            structure: Some(ElementNode::new("button")),
            dependencies: BTreeSet::new(),
            fingerprint: content_fingerprint(name),
        }
    }

    #[test]
    fn test_fnv1a_deterministic() {
        assert_eq!(fnv1a_hash("button"), fnv1a_hash("button"));
        assert_ne!(fnv1a_hash("button"), fnv1a_hash("Button"));
        assert_eq!(fnv1a_hash(""), 0xcbf29ce484222325);
        assert_eq!(content_fingerprint("x").len(), 16);
    }

    #[test]
    fn test_raw_type_normalizes_whitespace() {
        assert_eq!(RawType::new("'a' |\n   'b'").as_str(), "'a' | 'b'");
        assert!(RawType::new("   ").is_unknown());
    }

    #[test]
    fn test_category_names() {
        assert_eq!(ComponentCategory::from_name("Atom"), Some(ComponentCategory::Atoms));
        assert_eq!(ComponentCategory::from_name("widgets"), None);
        assert_eq!(ComponentCategory::default(), ComponentCategory::Unclassified);
        assert_eq!(
            serde_json::to_string(&ComponentCategory::Organisms).unwrap(),
            "\"organisms\""
        );
    }

    #[test]
    fn test_snapshot_orders_by_category_then_name() {
        let snapshot = Snapshot::new(
            ProjectInfo::default(),
            vec![
                descriptor("Header", ComponentCategory::Organisms),
                descriptor("Input", ComponentCategory::Atoms),
                descriptor("Button", ComponentCategory::Atoms),
            ],
            TokenTable::default(),
        );
        let order: Vec<String> = snapshot.components.iter().map(|c| c.id().to_string()).collect();
        assert_eq!(order, vec!["atoms/Button", "atoms/Input", "organisms/Header"]);
    }

    #[test]
    fn test_snapshot_json_roundtrip_and_field_names() {
        let snapshot = Snapshot::new(
            ProjectInfo {
                name: "demo".to_string(),
                ..Default::default()
            },
            vec![descriptor("Button", ComponentCategory::Atoms)],
            TokenTable::default(),
        );
        let json = snapshot.to_json_pretty().unwrap();
        assert!(json.contains("\"formatVersion\": \"1.0\""));
        assert!(json.contains("\"styleTokens\""));
        assert!(json.contains("\"type\": \"string\""));

        let parsed = Snapshot::from_json(&json).unwrap();
        assert_eq!(parsed, snapshot);
    }

    #[test]
    fn test_future_format_version_rejected() {
        let json = r#"{"formatVersion": "2.0", "timestamp": "", "components": []}"#;
        match Snapshot::from_json(json) {
            Err(CatalogError::FormatVersion { found, .. }) => assert_eq!(found, "2.0"),
            other => panic!("expected format version error, got {:?}", other),
        }
    }

    #[test]
    fn test_missing_format_version_rejected() {
        let err = Snapshot::from_json(r#"{"components": []}"#).unwrap_err();
        assert!(matches!(err, CatalogError::InvalidSnapshot { .. }));
        assert!(check_format_version("1.4").is_ok());
    }
}
