//! Design token table
//!
//! Normalizes a theme configuration value (Tailwind-style `theme` with an
//! optional `extend` section) into flat per-category token maps. Loading never
//! fails: every category falls back to its own default independently, and
//! anything unusable is reported as a warning on the returned [`TokenLoad`].

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::schema::ComponentDescriptor;

/// Breakpoint scale used when the configuration defines none
pub const DEFAULT_BREAKPOINTS: [(&str, &str); 5] = [
    ("sm", "640px"),
    ("md", "768px"),
    ("lg", "1024px"),
    ("xl", "1280px"),
    ("2xl", "1536px"),
];

/// Theme keys with a dedicated category; everything else lands in `custom`
const KNOWN_THEME_KEYS: &[&str] = &[
    "colors",
    "spacing",
    "fontFamily",
    "fontSize",
    "fontWeight",
    "lineHeight",
    "screens",
    "boxShadow",
    "borderRadius",
    "extend",
];

/// Utility prefixes that take a color suffix
const COLOR_UTILITY_PREFIXES: &[&str] = &[
    "bg", "text", "border", "border-t", "border-b", "border-l", "border-r", "border-x",
    "border-y", "ring", "ring-offset", "outline", "fill", "stroke", "from", "via", "to",
    "divide", "placeholder", "decoration", "accent", "caret", "shadow",
];

/// Theme configuration handed over by the config-evaluation collaborator
#[derive(Debug, Clone, PartialEq)]
pub enum ThemeConfig {
    /// No configuration file was found
    Absent,
    /// The evaluated configuration value
    Value(Value),
    /// Reading or evaluating the configuration failed
    Failed(String),
}

impl From<Option<Value>> for ThemeConfig {
    fn from(value: Option<Value>) -> Self {
        match value {
            Some(Value::Null) | None => Self::Absent,
            Some(v) => Self::Value(v),
        }
    }
}

/// A resolved color token
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ColorToken {
    pub value: String,
    /// `None` when the value is not a well-formed hex color
    pub derived_rgb: Option<[u8; 3]>,
    /// Components whose styles reference this color (`category/Name`)
    #[serde(default)]
    pub usage_sites: Vec<String>,
}

impl ColorToken {
    pub fn new(value: impl Into<String>) -> Self {
        let value = value.into();
        let derived_rgb = hex_to_rgb(&value);
        Self {
            value,
            derived_rgb,
            usage_sites: Vec::new(),
        }
    }
}

/// Typography scales
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Typography {
    #[serde(default)]
    pub font_family: BTreeMap<String, String>,
    #[serde(default)]
    pub font_size: BTreeMap<String, String>,
    #[serde(default)]
    pub font_weight: BTreeMap<String, String>,
    #[serde(default)]
    pub line_height: BTreeMap<String, String>,
}

/// Normalized design tokens of one snapshot
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TokenTable {
    #[serde(default)]
    pub colors: BTreeMap<String, ColorToken>,
    #[serde(default)]
    pub spacing: BTreeMap<String, String>,
    #[serde(default)]
    pub typography: Typography,
    #[serde(default = "default_breakpoints")]
    pub breakpoints: BTreeMap<String, String>,
    #[serde(default)]
    pub shadows: BTreeMap<String, String>,
    #[serde(default)]
    pub radii: BTreeMap<String, String>,
    /// Theme keys outside the known categories, flattened as `section.key`
    #[serde(default)]
    pub custom: BTreeMap<String, String>,
}

impl Default for TokenTable {
    fn default() -> Self {
        Self {
            colors: BTreeMap::new(),
            spacing: BTreeMap::new(),
            typography: Typography::default(),
            breakpoints: default_breakpoints(),
            shadows: BTreeMap::new(),
            radii: BTreeMap::new(),
            custom: BTreeMap::new(),
        }
    }
}

fn default_breakpoints() -> BTreeMap<String, String> {
    DEFAULT_BREAKPOINTS
        .iter()
        .map(|(k, v)| (k.to_string(), v.to_string()))
        .collect()
}

impl TokenTable {
    /// Every category as a flat `key -> value` map, in a fixed category order
    pub fn categories(&self) -> Vec<(&'static str, BTreeMap<String, String>)> {
        vec![
            (
                "colors",
                self.colors
                    .iter()
                    .map(|(k, c)| (k.clone(), c.value.clone()))
                    .collect(),
            ),
            ("spacing", self.spacing.clone()),
            ("fontFamily", self.typography.font_family.clone()),
            ("fontSize", self.typography.font_size.clone()),
            ("fontWeight", self.typography.font_weight.clone()),
            ("lineHeight", self.typography.line_height.clone()),
            ("breakpoints", self.breakpoints.clone()),
            ("shadows", self.shadows.clone()),
            ("radii", self.radii.clone()),
            ("custom", self.custom.clone()),
        ]
    }

    /// Number of tokens per category
    pub fn counts(&self) -> BTreeMap<String, usize> {
        self.categories()
            .into_iter()
            .map(|(name, entries)| (name.to_string(), entries.len()))
            .collect()
    }

    /// Attach usage sites to colors referenced by component style tokens
    pub fn record_color_usage(&mut self, components: &[ComponentDescriptor]) {
        for color in self.colors.values_mut() {
            color.usage_sites.clear();
        }

        for component in components {
            let site = component.id().to_string();
            for token in &component.style_tokens {
                let referenced: Vec<String> = match &token.declaration {
                    Some(decl) => self
                        .colors
                        .iter()
                        .filter(|(_, c)| c.value.eq_ignore_ascii_case(decl.value.trim()))
                        .map(|(k, _)| k.clone())
                        .collect(),
                    None => color_key_of_class(&token.value)
                        .filter(|key| self.colors.contains_key(*key))
                        .map(|key| vec![key.to_string()])
                        .unwrap_or_default(),
                };
                for key in referenced {
                    if let Some(color) = self.colors.get_mut(&key) {
                        if !color.usage_sites.contains(&site) {
                            color.usage_sites.push(site.clone());
                        }
                    }
                }
            }
        }

        for color in self.colors.values_mut() {
            color.usage_sites.sort();
        }
    }
}

/// Color key referenced by a utility class, if it is a color utility
fn color_key_of_class(class: &str) -> Option<&str> {
    let utility = class.rsplit(':').next().unwrap_or(class);
    let utility = utility.trim_start_matches('!');
    let utility = utility.split('/').next().unwrap_or(utility);
    COLOR_UTILITY_PREFIXES
        .iter()
        .filter_map(|prefix| {
            utility
                .strip_prefix(prefix)
                .and_then(|rest| rest.strip_prefix('-'))
        })
        // Longest prefix leaves the shortest remainder (`border-t-red` over `border-t`)
        .min_by_key(|rest| rest.len())
}

/// Result of loading a token table
#[derive(Debug, Clone, Default, PartialEq)]
pub struct TokenLoad {
    pub table: TokenTable,
    pub warnings: Vec<String>,
}

/// Convert `#rgb`, `#rrggbb` or `#rrggbbaa` to an RGB triple
pub fn hex_to_rgb(value: &str) -> Option<[u8; 3]> {
    let hex = value.trim().strip_prefix('#')?;
    if !hex.chars().all(|c| c.is_ascii_hexdigit()) {
        return None;
    }
    let expanded: String = match hex.len() {
        3 | 4 => hex.chars().take(3).flat_map(|c| [c, c]).collect(),
        6 | 8 => hex[..6].to_string(),
        _ => return None,
    };
    let channel = |i: usize| u8::from_str_radix(&expanded[i..i + 2], 16).ok();
    Some([channel(0)?, channel(2)?, channel(4)?])
}

/// Load a token table from a theme configuration.
///
/// `extend` keys replace same-named base keys wholesale; base-only keys survive.
pub fn load_tokens(config: &ThemeConfig) -> TokenLoad {
    let mut load = TokenLoad::default();

    let value = match config {
        ThemeConfig::Absent => {
            tracing::debug!("no theme configuration; using default tokens");
            return load;
        }
        ThemeConfig::Failed(reason) => {
            tracing::warn!(reason = %reason, "theme configuration failed to load; using default tokens");
            load.warnings
                .push(format!("theme configuration unavailable: {}", reason));
            return load;
        }
        ThemeConfig::Value(value) => value,
    };

    let theme = match value.get("theme") {
        Some(theme) => theme,
        None => value,
    };
    let Some(theme) = theme.as_object() else {
        load.warnings
            .push("theme configuration is not an object".to_string());
        tracing::warn!("theme configuration is not an object; using default tokens");
        return load;
    };
    let extend = match theme.get("extend") {
        Some(Value::Object(map)) => Some(map),
        Some(_) => {
            load.warnings.push("`extend` is not an object; ignored".to_string());
            None
        }
        None => None,
    };

    let section = |key: &str, warnings: &mut Vec<String>| {
        merge_section(key, theme.get(key), extend.and_then(|e| e.get(key)), warnings)
    };

    let table = &mut load.table;
    let warnings = &mut load.warnings;

    if let Some(colors) = section("colors", warnings) {
        flatten_colors("", &colors, &mut table.colors, warnings);
    }
    if let Some(spacing) = section("spacing", warnings) {
        flatten_scalars("", &spacing, &mut table.spacing, "spacing", warnings);
    }
    if let Some(families) = section("fontFamily", warnings) {
        flatten_scalars("", &families, &mut table.typography.font_family, "fontFamily", warnings);
    }
    if let Some(sizes) = section("fontSize", warnings) {
        flatten_scalars("", &sizes, &mut table.typography.font_size, "fontSize", warnings);
    }
    if let Some(weights) = section("fontWeight", warnings) {
        flatten_scalars("", &weights, &mut table.typography.font_weight, "fontWeight", warnings);
    }
    if let Some(heights) = section("lineHeight", warnings) {
        flatten_scalars("", &heights, &mut table.typography.line_height, "lineHeight", warnings);
    }
    if let Some(screens) = section("screens", warnings) {
        let mut breakpoints = BTreeMap::new();
        for (name, value) in &screens {
            match screen_value(value) {
                Some(text) => {
                    breakpoints.insert(name.clone(), text);
                }
                None => warnings.push(format!("screens.{}: unsupported value ignored", name)),
            }
        }
        if !breakpoints.is_empty() {
            table.breakpoints = breakpoints;
        }
    }
    if let Some(shadows) = section("boxShadow", warnings) {
        flatten_scalars("", &shadows, &mut table.shadows, "boxShadow", warnings);
    }
    if let Some(radii) = section("borderRadius", warnings) {
        flatten_scalars("", &radii, &mut table.radii, "borderRadius", warnings);
    }

    let mut custom_keys: Vec<&String> = theme
        .keys()
        .chain(extend.into_iter().flat_map(|e| e.keys()))
        .filter(|k| !KNOWN_THEME_KEYS.contains(&k.as_str()))
        .collect();
    custom_keys.sort();
    custom_keys.dedup();
    for key in custom_keys {
        let base = theme.get(key.as_str());
        let ext = extend.and_then(|e| e.get(key.as_str()));
        match ext.or(base) {
            Some(Value::Object(_)) => {
                if let Some(merged) = merge_section(key, base, ext, warnings) {
                    flatten_scalars(key, &merged, &mut table.custom, key, warnings);
                }
            }
            Some(other) => {
                if let Some(text) = scalar_text(other) {
                    table.custom.insert(key.clone(), text);
                }
            }
            None => {}
        }
    }

    for warning in &load.warnings {
        tracing::warn!(warning = %warning, "theme token warning");
    }
    load
}

/// Merge one theme section with its `extend` counterpart
fn merge_section(
    key: &str,
    base: Option<&Value>,
    extend: Option<&Value>,
    warnings: &mut Vec<String>,
) -> Option<Map<String, Value>> {
    let as_map = |value: Option<&Value>, origin: &str, warnings: &mut Vec<String>| match value {
        Some(Value::Object(map)) => Some(map.clone()),
        Some(_) => {
            warnings.push(format!("{}{} is not an object; using default", origin, key));
            None
        }
        None => None,
    };

    let base = as_map(base, "theme.", warnings);
    let extend = as_map(extend, "theme.extend.", warnings);

    match (base, extend) {
        (None, None) => None,
        (Some(base), None) => Some(base),
        (None, Some(extend)) => Some(extend),
        (Some(mut base), Some(extend)) => {
            for (k, v) in extend {
                base.insert(k, v);
            }
            Some(base)
        }
    }
}

/// Flatten a (possibly nested) color scale into `name[-shade]` keys
fn flatten_colors(
    prefix: &str,
    map: &Map<String, Value>,
    out: &mut BTreeMap<String, ColorToken>,
    warnings: &mut Vec<String>,
) {
    for (name, value) in map {
        let key = join_key(prefix, name, "-");
        match value {
            Value::Object(shades) => flatten_colors(&key, shades, out, warnings),
            other => match scalar_text(other) {
                Some(text) => {
                    out.insert(key, ColorToken::new(text));
                }
                None => warnings.push(format!("colors.{}: unsupported value ignored", key)),
            },
        }
    }
}

fn flatten_scalars(
    prefix: &str,
    map: &Map<String, Value>,
    out: &mut BTreeMap<String, String>,
    category: &str,
    warnings: &mut Vec<String>,
) {
    let separator = if category == prefix && !prefix.is_empty() { "." } else { "-" };
    for (name, value) in map {
        let key = join_key(prefix, name, separator);
        match value {
            Value::Object(inner) => flatten_scalars(&key, inner, out, category, warnings),
            other => match scalar_text(other) {
                Some(text) => {
                    out.insert(key, text);
                }
                None => warnings.push(format!("{}.{}: unsupported value ignored", category, key)),
            },
        }
    }
}

/// Tailwind's `DEFAULT` shade names the bare key
fn join_key(prefix: &str, name: &str, separator: &str) -> String {
    if prefix.is_empty() {
        name.to_string()
    } else if name == "DEFAULT" {
        prefix.to_string()
    } else {
        format!("{}{}{}", prefix, separator, name)
    }
}

/// Text form of a token value.
///
/// Arrays are either `[size, { lineHeight }]` tuples (first element wins) or
/// font stacks (joined with `, `).
fn scalar_text(value: &Value) -> Option<String> {
    match value {
        Value::String(s) => Some(s.clone()),
        Value::Number(n) => Some(n.to_string()),
        Value::Array(items) => {
            if items.len() == 2 && !items[1].is_string() {
                return scalar_text(&items[0]);
            }
            let parts: Vec<String> = items.iter().filter_map(scalar_text).collect();
            if parts.is_empty() {
                None
            } else {
                Some(parts.join(", "))
            }
        }
        Value::Bool(_) | Value::Null | Value::Object(_) => None,
    }
}

/// Breakpoints may be plain widths or `{ min, max }` ranges
fn screen_value(value: &Value) -> Option<String> {
    match value {
        Value::Object(range) => range
            .get("min")
            .or_else(|| range.get("max"))
            .or_else(|| range.get("raw"))
            .and_then(scalar_text),
        other => scalar_text(other),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_extend_wins_on_collision() {
        let config = ThemeConfig::Value(json!({
            "theme": {
                "colors": { "primary": { "500": "#111" }, "gray": "#888" },
                "extend": { "colors": { "primary": { "500": "#222", "900": "#333" } } }
            }
        }));
        let load = load_tokens(&config);
        let colors = &load.table.colors;
        assert_eq!(colors["primary-500"].value, "#222");
        assert_eq!(colors["primary-900"].value, "#333");
        assert_eq!(colors["gray"].value, "#888");
        assert_eq!(colors.len(), 3);
        assert!(load.warnings.is_empty());
    }

    #[test]
    fn test_extend_replaces_wholesale() {
        let config = ThemeConfig::Value(json!({
            "theme": {
                "colors": { "primary": { "100": "#eee", "500": "#111" } },
                "extend": { "colors": { "primary": { "500": "#222" } } }
            }
        }));
        let colors = load_tokens(&config).table.colors;
        assert!(!colors.contains_key("primary-100"));
        assert_eq!(colors["primary-500"].value, "#222");
    }

    #[test]
    fn test_missing_breakpoints_use_default_scale() {
        let config = ThemeConfig::Value(json!({ "theme": { "colors": { "brand": "#ff0000" } } }));
        let table = load_tokens(&config).table;
        assert_eq!(table.breakpoints["sm"], "640px");
        assert_eq!(table.breakpoints["md"], "768px");
        assert_eq!(table.breakpoints["lg"], "1024px");
        assert_eq!(table.breakpoints["xl"], "1280px");
        assert_eq!(table.breakpoints["2xl"], "1536px");
        assert_eq!(table.breakpoints.len(), 5);
        assert_eq!(table.colors["brand"].derived_rgb, Some([255, 0, 0]));
    }

    #[test]
    fn test_failed_config_defaults_every_category_with_warning() {
        let load = load_tokens(&ThemeConfig::Failed("ReferenceError: x is not defined".into()));
        assert_eq!(load.table, TokenTable::default());
        assert_eq!(load.warnings.len(), 1);
        assert!(load.warnings[0].contains("ReferenceError"));
    }

    #[test]
    fn test_absent_config_is_silent_default() {
        let load = load_tokens(&ThemeConfig::from(None));
        assert_eq!(load.table, TokenTable::default());
        assert!(load.warnings.is_empty());
    }

    #[test]
    fn test_bad_category_defaults_independently() {
        let config = ThemeConfig::Value(json!({
            "theme": {
                "colors": "not-a-map",
                "spacing": { "1": "0.25rem", "2": "0.5rem" },
                "screens": { "tablet": "700px", "desktop": { "min": "1100px" } }
            }
        }));
        let load = load_tokens(&config);
        assert!(load.table.colors.is_empty());
        assert_eq!(load.table.spacing["2"], "0.5rem");
        assert_eq!(load.table.breakpoints["desktop"], "1100px");
        assert_eq!(load.table.breakpoints.len(), 2);
        assert_eq!(load.warnings.len(), 1);
    }

    #[test]
    fn test_typography_and_custom_sections() {
        let config = ThemeConfig::Value(json!({
            "theme": {
                "fontFamily": { "sans": ["Inter", "sans-serif"] },
                "fontSize": { "lg": ["1.125rem", { "lineHeight": "1.75rem" }], "sm": "0.875rem" },
                "fontWeight": { "bold": 700 },
                "extend": { "zIndex": { "modal": "50" }, "borderRadius": { "xl": "1rem" } }
            }
        }));
        let table = load_tokens(&config).table;
        assert_eq!(table.typography.font_family["sans"], "Inter, sans-serif");
        assert_eq!(table.typography.font_size["lg"], "1.125rem");
        assert_eq!(table.typography.font_weight["bold"], "700");
        assert_eq!(table.radii["xl"], "1rem");
        assert_eq!(table.custom["zIndex.modal"], "50");
    }

    #[test]
    fn test_default_shade_and_malformed_hex() {
        let config = ThemeConfig::Value(json!({
            "colors": { "accent": { "DEFAULT": "#0af", "light": "#zzzzzz" }, "current": "currentColor" }
        }));
        let colors = load_tokens(&config).table.colors;
        assert_eq!(colors["accent"].derived_rgb, Some([0, 170, 255]));
        assert_eq!(colors["accent-light"].value, "#zzzzzz");
        assert_eq!(colors["accent-light"].derived_rgb, None);
        assert_eq!(colors["current"].derived_rgb, None);
    }

    #[test]
    fn test_hex_to_rgb() {
        assert_eq!(hex_to_rgb("#3b82f6"), Some([59, 130, 246]));
        assert_eq!(hex_to_rgb("#fff"), Some([255, 255, 255]));
        assert_eq!(hex_to_rgb("#3b82f680"), Some([59, 130, 246]));
        assert_eq!(hex_to_rgb("3b82f6"), None);
        assert_eq!(hex_to_rgb("#12345"), None);
    }

    #[test]
    fn test_color_key_of_class() {
        assert_eq!(color_key_of_class("bg-primary-500"), Some("primary-500"));
        assert_eq!(color_key_of_class("hover:text-brand/80"), Some("brand"));
        assert_eq!(color_key_of_class("border-t-red-500"), Some("red-500"));
        assert_eq!(color_key_of_class("px-4"), None);
    }
}
