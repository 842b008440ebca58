//! Snapshot diffing
//!
//! Matches components by `(category, name)` and computes field-level deltas.
//! Every comparison is set based, so reordering tokens, props or components
//! never shows up as a change.

use std::collections::{BTreeMap, BTreeSet, HashMap, HashSet};
use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::error::Result;
use crate::schema::{ComponentDescriptor, ComponentId, Snapshot};
use crate::tokens::TokenTable;

/// Field-level changes of a component present in both snapshots
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ComponentChange {
    pub id: ComponentId,
    pub file: String,
    pub classes_added: Vec<String>,
    pub classes_removed: Vec<String>,
    /// The unordered set of `(name, type, required)` differs
    pub props_changed: bool,
    /// Source fingerprints differ
    pub content_changed: bool,
    pub old_fingerprint: String,
    pub new_fingerprint: String,
    /// Local dependencies gained or lost, as an impact hint
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub dependencies_added: Vec<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub dependencies_removed: Vec<String>,
}

impl ComponentChange {
    pub fn is_modified(&self) -> bool {
        !self.classes_added.is_empty()
            || !self.classes_removed.is_empty()
            || self.props_changed
            || self.content_changed
    }
}

/// Old and new value of a token present in both tables
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ValueChange {
    pub old: String,
    pub new: String,
}

/// Key-level changes within one token category
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CategoryDelta {
    pub added: BTreeMap<String, String>,
    pub removed: BTreeMap<String, String>,
    pub modified: BTreeMap<String, ValueChange>,
}

impl CategoryDelta {
    pub fn is_empty(&self) -> bool {
        self.added.is_empty() && self.removed.is_empty() && self.modified.is_empty()
    }

    pub fn change_count(&self) -> usize {
        self.added.len() + self.removed.len() + self.modified.len()
    }

    fn mirrored(&self) -> Self {
        Self {
            added: self.removed.clone(),
            removed: self.added.clone(),
            modified: self
                .modified
                .iter()
                .map(|(k, v)| {
                    (
                        k.clone(),
                        ValueChange {
                            old: v.new.clone(),
                            new: v.old.clone(),
                        },
                    )
                })
                .collect(),
        }
    }
}

/// Token counts of one category in both snapshots
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TokenCount {
    pub base: usize,
    pub current: usize,
}

/// Order-independent aggregate of a diff
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DiffSummary {
    pub added: usize,
    pub removed: usize,
    pub modified: usize,
    pub unchanged: usize,
    /// Style tokens introduced by any modified component
    pub classes_introduced: BTreeSet<String>,
    /// Style tokens dropped by any modified component
    pub classes_dropped: BTreeSet<String>,
    pub token_counts: BTreeMap<String, TokenCount>,
    /// Changed keys per token category
    pub token_changes: BTreeMap<String, usize>,
}

/// Differences between two snapshots
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Diff {
    pub base_timestamp: String,
    pub current_timestamp: String,
    pub added: Vec<ComponentId>,
    pub removed: Vec<ComponentId>,
    pub modified: Vec<ComponentChange>,
    /// Only categories with changes
    pub tokens: BTreeMap<String, CategoryDelta>,
    pub summary: DiffSummary,
}

impl Diff {
    /// No component or token changed
    pub fn is_empty(&self) -> bool {
        self.added.is_empty()
            && self.removed.is_empty()
            && self.modified.is_empty()
            && self.tokens.is_empty()
    }

    /// The diff with base and current swapped
    pub fn mirrored(&self) -> Self {
        let modified = self
            .modified
            .iter()
            .map(|c| ComponentChange {
                classes_added: c.classes_removed.clone(),
                classes_removed: c.classes_added.clone(),
                old_fingerprint: c.new_fingerprint.clone(),
                new_fingerprint: c.old_fingerprint.clone(),
                dependencies_added: c.dependencies_removed.clone(),
                dependencies_removed: c.dependencies_added.clone(),
                ..c.clone()
            })
            .collect();
        Self {
            base_timestamp: self.current_timestamp.clone(),
            current_timestamp: self.base_timestamp.clone(),
            added: self.removed.clone(),
            removed: self.added.clone(),
            modified,
            tokens: self
                .tokens
                .iter()
                .map(|(k, v)| (k.clone(), v.mirrored()))
                .collect(),
            summary: DiffSummary {
                added: self.summary.removed,
                removed: self.summary.added,
                classes_introduced: self.summary.classes_dropped.clone(),
                classes_dropped: self.summary.classes_introduced.clone(),
                token_counts: self
                    .summary
                    .token_counts
                    .iter()
                    .map(|(k, c)| {
                        (
                            k.clone(),
                            TokenCount {
                                base: c.current,
                                current: c.base,
                            },
                        )
                    })
                    .collect(),
                ..self.summary.clone()
            },
        }
    }
}

/// Compute the diff from `base` to `current`
pub fn diff(base: &Snapshot, current: &Snapshot) -> Diff {
    let base_index: HashMap<ComponentId, &ComponentDescriptor> =
        base.components.iter().map(|c| (c.id(), c)).collect();
    let current_index: HashMap<ComponentId, &ComponentDescriptor> =
        current.components.iter().map(|c| (c.id(), c)).collect();

    let mut added: Vec<ComponentId> = current_index
        .keys()
        .filter(|id| !base_index.contains_key(*id))
        .cloned()
        .collect();
    let mut removed: Vec<ComponentId> = base_index
        .keys()
        .filter(|id| !current_index.contains_key(*id))
        .cloned()
        .collect();
    added.sort();
    removed.sort();

    let mut modified = Vec::new();
    let mut unchanged = 0;
    for (id, old) in &base_index {
        let Some(new) = current_index.get(id) else {
            continue;
        };
        match compare_components(old, new) {
            Some(change) => modified.push(change),
            None => unchanged += 1,
        }
    }
    modified.sort_by(|a, b| a.id.cmp(&b.id));

    let tokens = diff_tokens(&base.tokens, &current.tokens);
    let summary = summarize(&added, &removed, &modified, unchanged, base, current, &tokens);

    Diff {
        base_timestamp: base.timestamp.clone(),
        current_timestamp: current.timestamp.clone(),
        added,
        removed,
        modified,
        tokens,
        summary,
    }
}

/// Load two snapshot files, checking their format versions, and diff them
pub fn diff_files(base: &Path, current: &Path) -> Result<Diff> {
    let base = Snapshot::load(base)?;
    let current = Snapshot::load(current)?;
    Ok(diff(&base, &current))
}

/// `None` when the pair is unchanged.
///
/// The source fingerprint decides first: any byte change, including a pure
/// reorder of the same classes, yields a change with `content_changed` set and
/// empty class deltas. Class and prop deltas are computed as sets.
pub fn compare_components(
    old: &ComponentDescriptor,
    new: &ComponentDescriptor,
) -> Option<ComponentChange> {
    // Identical source means every extracted field is identical too
    if old.fingerprint == new.fingerprint {
        return None;
    }

    let old_tokens: BTreeSet<&str> = old.token_values().collect();
    let new_tokens: BTreeSet<&str> = new.token_values().collect();

    let old_props: HashSet<(&str, &str, bool)> = old.props.iter().map(|p| p.shape()).collect();
    let new_props: HashSet<(&str, &str, bool)> = new.props.iter().map(|p| p.shape()).collect();

    let change = ComponentChange {
        id: new.id(),
        file: new.file.clone(),
        classes_added: set_difference(&new_tokens, &old_tokens),
        classes_removed: set_difference(&old_tokens, &new_tokens),
        props_changed: old_props != new_props,
        content_changed: true,
        old_fingerprint: old.fingerprint.clone(),
        new_fingerprint: new.fingerprint.clone(),
        dependencies_added: new.dependencies.difference(&old.dependencies).cloned().collect(),
        dependencies_removed: old.dependencies.difference(&new.dependencies).cloned().collect(),
    };
    Some(change)
}

fn set_difference(left: &BTreeSet<&str>, right: &BTreeSet<&str>) -> Vec<String> {
    left.difference(right).map(|s| s.to_string()).collect()
}

/// Per-category key diff of two token tables
pub fn diff_tokens(base: &TokenTable, current: &TokenTable) -> BTreeMap<String, CategoryDelta> {
    let current_categories: BTreeMap<&str, BTreeMap<String, String>> =
        current.categories().into_iter().collect();

    let mut deltas = BTreeMap::new();
    for (category, old) in base.categories() {
        let empty = BTreeMap::new();
        let new = current_categories.get(category).unwrap_or(&empty);

        let mut delta = CategoryDelta::default();
        for (key, old_value) in &old {
            match new.get(key) {
                None => {
                    delta.removed.insert(key.clone(), old_value.clone());
                }
                Some(new_value) if new_value != old_value => {
                    delta.modified.insert(
                        key.clone(),
                        ValueChange {
                            old: old_value.clone(),
                            new: new_value.clone(),
                        },
                    );
                }
                Some(_) => {}
            }
        }
        for (key, new_value) in new {
            if !old.contains_key(key) {
                delta.added.insert(key.clone(), new_value.clone());
            }
        }

        if !delta.is_empty() {
            deltas.insert(category.to_string(), delta);
        }
    }
    deltas
}

fn summarize(
    added: &[ComponentId],
    removed: &[ComponentId],
    modified: &[ComponentChange],
    unchanged: usize,
    base: &Snapshot,
    current: &Snapshot,
    tokens: &BTreeMap<String, CategoryDelta>,
) -> DiffSummary {
    let base_counts = base.tokens.counts();
    let current_counts = current.tokens.counts();
    let token_counts = base_counts
        .keys()
        .chain(current_counts.keys())
        .map(|category| {
            let count = TokenCount {
                base: base_counts.get(category).copied().unwrap_or(0),
                current: current_counts.get(category).copied().unwrap_or(0),
            };
            (category.clone(), count)
        })
        .collect();

    DiffSummary {
        added: added.len(),
        removed: removed.len(),
        modified: modified.len(),
        unchanged,
        classes_introduced: modified
            .iter()
            .flat_map(|c| c.classes_added.iter().cloned())
            .collect(),
        classes_dropped: modified
            .iter()
            .flat_map(|c| c.classes_removed.iter().cloned())
            .collect(),
        token_counts,
        token_changes: tokens
            .iter()
            .map(|(category, delta)| (category.clone(), delta.change_count()))
            .collect(),
    }
}
