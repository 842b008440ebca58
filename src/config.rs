//! Catalog configuration.
//!
//! Loads the project config (JSON or JSON5), builds the component category
//! table and reads the theme configuration module consumed by the token loader.
//!
//! Example `catalog.config.json5`:
//! ```json5
//! {
//!   projectName: "acme-ui",
//!   extensions: ["tsx", "jsx"],
//!   mergeHelpers: ["tw"],
//!   categories: {
//!     atoms: ["Button", "Input"],
//!     molecules: ["SearchBar"],
//!   },
//!   themeConfig: "tailwind.config.js",
//! }
//! ```

use std::collections::{BTreeMap, HashMap};
use std::fs;
use std::path::{Component, Path, PathBuf};

use once_cell::sync::Lazy;
use regex::Regex;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use tracing::{debug, warn};

use crate::error::{CatalogError, Result};
use crate::schema::ComponentCategory;
use crate::tokens::ThemeConfig;

/// Config file names looked up in the project root, in order
pub const CONFIG_FILE_NAMES: &[&str] = &["catalog.config.json", "catalog.config.json5"];

/// Theme modules looked up in the project root when none is configured
pub const THEME_FILE_NAMES: &[&str] = &[
    "tailwind.config.js",
    "tailwind.config.cjs",
    "tailwind.config.mjs",
    "tailwind.config.ts",
    "tailwind.config.json",
    "theme.json",
];

/// Bare numeric object keys (`{ 500: "#fff" }`) are valid JS but not JSON5
static NUMERIC_KEY: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"([{,]\s*)(\d+(?:\.\d+)?)(\s*:)").expect("static regex"));

/// Project configuration for a snapshot build
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct CatalogConfig {
    /// Defaults to the project directory name
    pub project_name: Option<String>,
    /// Source extensions to include; empty means every supported one
    pub extensions: Vec<String>,
    pub max_depth: usize,
    /// Worker threads for extraction; `None` uses the global pool
    pub workers: Option<usize>,
    /// Project class-merging helpers in addition to `cn`, `clsx` and friends
    pub merge_helpers: Vec<String>,
    /// `category -> [component names]`
    pub categories: BTreeMap<String, Vec<String>>,
    /// Fall back to a category-named directory (`src/atoms/...`) for
    /// components missing from `categories`
    pub infer_categories: bool,
    /// Theme module, relative to the project root
    pub theme_config: Option<PathBuf>,
}

impl Default for CatalogConfig {
    fn default() -> Self {
        Self {
            project_name: None,
            extensions: Vec::new(),
            max_depth: 20,
            workers: None,
            merge_helpers: Vec::new(),
            categories: BTreeMap::new(),
            infer_categories: false,
            theme_config: None,
        }
    }
}

impl CatalogConfig {
    /// Load a config file; JSON5 is a superset of JSON so both parse the same way
    pub fn load(path: &Path) -> Result<Self> {
        let content = fs::read_to_string(path).map_err(|e| match e.kind() {
            std::io::ErrorKind::NotFound => CatalogError::FileNotFound {
                path: path.display().to_string(),
            },
            _ => CatalogError::Io(e),
        })?;
        json5::from_str(&content).map_err(|e| CatalogError::Config {
            message: format!("{}: {}", path.display(), e),
        })
    }

    /// Load the first config file found in `root`, or defaults
    pub fn discover(root: &Path) -> Result<Self> {
        for name in CONFIG_FILE_NAMES {
            let path = root.join(name);
            if path.is_file() {
                debug!(path = %path.display(), "loading catalog config");
                return Self::load(&path);
            }
        }
        Ok(Self::default())
    }

    /// Theme module path: the configured one, else a conventional file in `root`
    pub fn theme_path(&self, root: &Path) -> Option<PathBuf> {
        if let Some(path) = &self.theme_config {
            return Some(if path.is_absolute() {
                path.clone()
            } else {
                root.join(path)
            });
        }
        THEME_FILE_NAMES
            .iter()
            .map(|name| root.join(name))
            .find(|path| path.is_file())
    }

    pub fn category_map(&self) -> CategoryMap {
        let mut map = CategoryMap::default().with_path_inference(self.infer_categories);
        for (category, names) in &self.categories {
            let Some(category) = ComponentCategory::from_name(category) else {
                warn!(category = %category, "unknown component category in config");
                continue;
            };
            for name in names {
                map.insert(name.clone(), category);
            }
        }
        map
    }
}

/// Component name to category assignment
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CategoryMap {
    names: HashMap<String, ComponentCategory>,
    infer_from_path: bool,
}

impl CategoryMap {
    pub fn with_path_inference(mut self, enabled: bool) -> Self {
        self.infer_from_path = enabled;
        self
    }

    pub fn insert(&mut self, name: impl Into<String>, category: ComponentCategory) {
        self.names.insert(name.into(), category);
    }

    pub fn len(&self) -> usize {
        self.names.len()
    }

    pub fn is_empty(&self) -> bool {
        self.names.is_empty()
    }

    /// Explicit entry, else `unclassified`.
    ///
    /// With path inference enabled, a component missing from the table takes
    /// the innermost category-named directory of `file`. Only project-relative
    /// paths are inspected; absolute paths never infer.
    pub fn assign(&self, name: &str, file: &Path) -> ComponentCategory {
        if let Some(category) = self.names.get(name) {
            return *category;
        }
        if !self.infer_from_path || file.has_root() {
            return ComponentCategory::Unclassified;
        }
        file.parent()
            .into_iter()
            .flat_map(|dir| dir.components().rev())
            .filter_map(|c| match c {
                Component::Normal(part) => part.to_str(),
                _ => None,
            })
            .find_map(ComponentCategory::from_name)
            .unwrap_or_default()
    }
}

impl FromIterator<(String, ComponentCategory)> for CategoryMap {
    fn from_iter<I: IntoIterator<Item = (String, ComponentCategory)>>(iter: I) -> Self {
        Self {
            names: iter.into_iter().collect(),
            infer_from_path: false,
        }
    }
}

// ============================================================================
// Theme configuration modules
// ============================================================================

/// Read and evaluate a theme configuration file.
///
/// Never fails: a missing file is [`ThemeConfig::Absent`], anything that cannot
/// be read or evaluated is [`ThemeConfig::Failed`].
pub fn read_theme_config(path: &Path) -> ThemeConfig {
    let content = match fs::read_to_string(path) {
        Ok(content) => content,
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => return ThemeConfig::Absent,
        Err(e) => return ThemeConfig::Failed(format!("{}: {}", path.display(), e)),
    };

    let ext = path
        .extension()
        .and_then(|e| e.to_str())
        .unwrap_or_default()
        .to_lowercase();

    let result = match ext.as_str() {
        "json" | "json5" => parse_value(&content),
        "js" | "cjs" | "mjs" | "ts" | "cts" | "mts" => evaluate_module(&content),
        other => Err(format!("unsupported theme config extension `{}`", other)),
    };

    match result {
        Ok(value) => ThemeConfig::from(Some(value)),
        Err(reason) => ThemeConfig::Failed(format!("{}: {}", path.display(), reason)),
    }
}

fn parse_value(text: &str) -> std::result::Result<Value, String> {
    json5::from_str::<Value>(text).map_err(|e| e.to_string())
}

/// Evaluate `module.exports = {...}` / `export default {...}` whose object
/// literal is plain data.
fn evaluate_module(content: &str) -> std::result::Result<Value, String> {
    let start = ["module.exports", "export default"]
        .iter()
        .filter_map(|marker| content.find(marker).map(|i| i + marker.len()))
        .min()
        .ok_or("no `module.exports` or `export default` found")?;

    let rest = &content[start..];
    let rest = rest.trim_start().trim_start_matches('=').trim_start();
    if !rest.starts_with('{') {
        return Err("exported value is not an object literal".to_string());
    }
    let end = matching_brace(rest).ok_or("unbalanced braces in exported object")?;
    let literal = NUMERIC_KEY.replace_all(&rest[..=end], "$1\"$2\"$3");
    parse_value(&literal)
}

/// Byte index of the brace closing the one at index 0, skipping strings and comments
fn matching_brace(text: &str) -> Option<usize> {
    let bytes = text.as_bytes();
    let mut depth = 0usize;
    let mut i = 0;
    while i < bytes.len() {
        match bytes[i] {
            b'"' | b'\'' | b'`' => {
                let quote = bytes[i];
                i += 1;
                while i < bytes.len() && bytes[i] != quote {
                    if bytes[i] == b'\\' {
                        i += 1;
                    }
                    i += 1;
                }
            }
            b'/' if bytes.get(i + 1) == Some(&b'/') => {
                while i < bytes.len() && bytes[i] != b'\n' {
                    i += 1;
                }
            }
            b'/' if bytes.get(i + 1) == Some(&b'*') => {
                i += 2;
                while i + 1 < bytes.len() && !(bytes[i] == b'*' && bytes[i + 1] == b'/') {
                    i += 1;
                }
                i += 1;
            }
            b'{' => depth += 1,
            b'}' => {
                depth = depth.checked_sub(1)?;
                if depth == 0 {
                    return Some(i);
                }
            }
            _ => {}
        }
        i += 1;
    }
    None
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use std::io::Write;
    use tempfile::TempDir;

    fn write(dir: &TempDir, name: &str, content: &str) -> PathBuf {
        let path = dir.path().join(name);
        let mut file = fs::File::create(&path).unwrap();
        write!(file, "{}", content).unwrap();
        path
    }

    #[test]
    fn test_load_json5_config() {
        let dir = TempDir::new().unwrap();
        let path = write(
            &dir,
            "catalog.config.json5",
            r#"{
                // comments are allowed
                projectName: "acme-ui",
                extensions: ["tsx"],
                workers: 2,
                categories: { atoms: ["Button"], molecule: ["SearchBar"], widgets: ["X"] },
            }"#,
        );
        let config = CatalogConfig::load(&path).unwrap();
        assert_eq!(config.project_name.as_deref(), Some("acme-ui"));
        assert_eq!(config.extensions, vec!["tsx"]);
        assert_eq!(config.workers, Some(2));
        assert_eq!(config.max_depth, 20);

        let map = config.category_map();
        assert_eq!(map.len(), 2);
        assert_eq!(map.assign("Button", Path::new("x/Button.tsx")), ComponentCategory::Atoms);
        assert_eq!(
            map.assign("SearchBar", Path::new("SearchBar.tsx")),
            ComponentCategory::Molecules
        );
    }

    #[test]
    fn test_discover_defaults_when_missing() {
        let dir = TempDir::new().unwrap();
        assert_eq!(CatalogConfig::discover(dir.path()).unwrap(), CatalogConfig::default());
    }

    #[test]
    fn test_invalid_config_is_an_error() {
        let dir = TempDir::new().unwrap();
        let path = write(&dir, "catalog.config.json", "{ maxDepth: ");
        assert!(matches!(CatalogConfig::load(&path), Err(CatalogError::Config { .. })));
    }

    #[test]
    fn test_unlisted_component_is_unclassified() {
        let map = CategoryMap::default();
        assert_eq!(
            map.assign("Card", Path::new("src/components/organisms/Card/index.tsx")),
            ComponentCategory::Unclassified
        );
        assert_eq!(
            CatalogConfig::default().category_map().assign("Button", Path::new("src/atoms/Button.tsx")),
            ComponentCategory::Unclassified
        );
    }

    #[test]
    fn test_category_from_path_when_enabled() {
        let map = CategoryMap::default().with_path_inference(true);
        assert_eq!(
            map.assign("Card", Path::new("src/components/organisms/Card/index.tsx")),
            ComponentCategory::Organisms
        );
        assert_eq!(
            map.assign("Card", Path::new("src/components/Card.tsx")),
            ComponentCategory::Unclassified
        );
        assert_eq!(
            map.assign("Card", Path::new("/srv/templates/app/src/Card.tsx")),
            ComponentCategory::Unclassified
        );
    }

    #[test]
    fn test_infer_categories_flag_from_config() {
        let dir = TempDir::new().unwrap();
        let path = write(
            &dir,
            "catalog.config.json5",
            "{ inferCategories: true, categories: { molecules: ['Button'] } }",
        );
        let config = CatalogConfig::load(&path).unwrap();
        assert!(config.infer_categories);
        let map = config.category_map();
        assert_eq!(map.assign("Button", Path::new("src/atoms/Button.tsx")), ComponentCategory::Molecules);
        assert_eq!(map.assign("Icon", Path::new("src/atoms/Icon.tsx")), ComponentCategory::Atoms);
    }

    #[test]
    fn test_read_module_exports() {
        let dir = TempDir::new().unwrap();
        let path = write(
            &dir,
            "tailwind.config.js",
            r##"/** @type {import('tailwindcss').Config} */
module.exports = {
  content: ["./src/**/*.{ts,tsx}"],
  theme: {
    extend: {
      colors: { brand: { 500: "#ff0000" } }, // "}" in a comment
    },
  },
};
"##,
        );
        let ThemeConfig::Value(value) = read_theme_config(&path) else {
            panic!("expected a value");
        };
        assert_eq!(value["theme"]["extend"]["colors"]["brand"]["500"], json!("#ff0000"));
    }

    #[test]
    fn test_read_export_default_ts() {
        let dir = TempDir::new().unwrap();
        let path = write(
            &dir,
            "tailwind.config.ts",
            "import type { Config } from 'tailwindcss';\nexport default { theme: { spacing: { 1: '4px' } } } satisfies Config;\n",
        );
        assert!(matches!(read_theme_config(&path), ThemeConfig::Value(_)));
    }

    #[test]
    fn test_unevaluable_module_fails_softly() {
        let dir = TempDir::new().unwrap();
        let path = write(
            &dir,
            "tailwind.config.js",
            "const colors = require('tailwindcss/colors');\nmodule.exports = { theme: { colors: colors.slate } };",
        );
        assert!(matches!(read_theme_config(&path), ThemeConfig::Failed(_)));

        let path = write(&dir, "broken.js", "throw new Error('boom')");
        assert!(matches!(read_theme_config(&path), ThemeConfig::Failed(_)));
    }

    #[test]
    fn test_missing_theme_is_absent() {
        let dir = TempDir::new().unwrap();
        assert_eq!(
            read_theme_config(&dir.path().join("tailwind.config.js")),
            ThemeConfig::Absent
        );
    }

    #[test]
    fn test_theme_path_discovery() {
        let dir = TempDir::new().unwrap();
        let config = CatalogConfig::default();
        assert!(config.theme_path(dir.path()).is_none());
        write(&dir, "tailwind.config.cjs", "module.exports = {}");
        assert_eq!(
            config.theme_path(dir.path()),
            Some(dir.path().join("tailwind.config.cjs"))
        );
    }
}
