//! Snapshot generation
//!
//! Runs component extraction over a file set in parallel, loads the token
//! table independently, assigns categories and assembles the [`Snapshot`].

use std::collections::HashSet;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Instant;

use rayon::prelude::*;
use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};

use super::files::{collect_files, read_sources, SourceFile};
use crate::config::{read_theme_config, CatalogConfig, CategoryMap};
use crate::extract::{analyze_file_with, Extraction};
use crate::schema::{ComponentDescriptor, ProjectInfo, Snapshot};
use crate::styles::{extractors, StyleExtractor};
use crate::tokens::{load_tokens, ThemeConfig, TokenLoad};

/// Cooperative cancellation flag, checked once per file
#[derive(Debug, Clone, Default)]
pub struct CancellationToken(Arc<AtomicBool>);

impl CancellationToken {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn cancel(&self) {
        self.0.store(true, Ordering::SeqCst);
    }

    pub fn is_cancelled(&self) -> bool {
        self.0.load(Ordering::SeqCst)
    }
}

/// A file excluded from the snapshot because it could not be analyzed
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SkippedFile {
    pub path: String,
    pub reason: String,
}

/// Aggregate of everything recoverable that happened during a build
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BuildReport {
    pub files_seen: usize,
    pub components: usize,
    /// Unreadable, unparseable or unsupported files
    pub skipped: Vec<SkippedFile>,
    pub non_components: usize,
    /// Identities defined by more than one file; the first file wins
    pub duplicates: Vec<String>,
    /// Dynamic style expressions plus validation warnings across all components
    pub unresolved_tokens: usize,
    pub token_warnings: Vec<String>,
    pub cancelled: bool,
    pub duration_ms: u64,
}

/// A snapshot and the report of the run that produced it
#[derive(Debug, Clone)]
pub struct BuildOutput {
    pub snapshot: Snapshot,
    pub report: BuildReport,
}

/// Per-file result of the extraction phase
enum FileOutcome {
    Component(Box<ComponentDescriptor>),
    NotComponent,
    Skipped(SkippedFile),
    Cancelled,
}

/// Builds snapshots from an explicit configuration; nothing is read from globals
#[derive(Debug, Clone)]
pub struct SnapshotBuilder {
    project: ProjectInfo,
    root: Option<PathBuf>,
    categories: CategoryMap,
    merge_helpers: Vec<String>,
    theme: ThemeConfig,
    workers: Option<usize>,
    cancel: CancellationToken,
}

impl SnapshotBuilder {
    pub fn new(project_name: impl Into<String>) -> Self {
        Self {
            project: ProjectInfo {
                name: project_name.into(),
                ..Default::default()
            },
            root: None,
            categories: CategoryMap::default(),
            merge_helpers: Vec::new(),
            theme: ThemeConfig::Absent,
            workers: None,
            cancel: CancellationToken::new(),
        }
    }

    /// Builder for a project directory: categories, workers and theme module
    /// all come from `config`
    pub fn from_config(config: &CatalogConfig, root: &Path) -> Self {
        let name = config.project_name.clone().unwrap_or_else(|| {
            root.file_name()
                .and_then(|n| n.to_str())
                .unwrap_or("project")
                .to_string()
        });
        let theme = match config.theme_path(root) {
            Some(path) => read_theme_config(&path),
            None => ThemeConfig::Absent,
        };

        let mut builder = Self::new(name)
            .with_root(root)
            .with_categories(config.category_map())
            .with_merge_helpers(config.merge_helpers.iter().cloned())
            .with_theme(theme);
        if let Some(workers) = config.workers {
            builder = builder.with_workers(workers);
        }
        builder
    }

    /// Paths in descriptors are made relative to `root`
    pub fn with_root(mut self, root: impl Into<PathBuf>) -> Self {
        let root = root.into();
        self.project.root = Some(root.display().to_string());
        self.root = Some(root);
        self
    }

    pub fn with_version(mut self, version: impl Into<String>) -> Self {
        self.project.version = Some(version.into());
        self
    }

    pub fn with_categories(mut self, categories: CategoryMap) -> Self {
        self.categories = categories;
        self
    }

    /// Extra class-merging helper functions to read utility classes from
    pub fn with_merge_helpers<I, S>(mut self, helpers: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.merge_helpers.extend(helpers.into_iter().map(Into::into));
        self
    }

    pub fn with_theme(mut self, theme: ThemeConfig) -> Self {
        self.theme = theme;
        self
    }

    pub fn with_workers(mut self, workers: usize) -> Self {
        self.workers = Some(workers.max(1));
        self
    }

    pub fn with_cancellation(mut self, cancel: CancellationToken) -> Self {
        self.cancel = cancel;
        self
    }

    pub fn cancellation(&self) -> CancellationToken {
        self.cancel.clone()
    }

    /// Collect, read and build every candidate file under `dir`
    pub fn build_dir(&self, dir: &Path, max_depth: usize, extensions: &[String]) -> BuildOutput {
        let paths = collect_files(dir, max_depth, extensions);
        debug!(dir = %dir.display(), files = paths.len(), "collected candidate files");

        let (sources, unreadable) = read_sources(&paths);
        let mut output = self.build(&sources);

        output.report.files_seen += unreadable.len();
        output.snapshot.project.file_count = output.report.files_seen;
        output.report.skipped.extend(unreadable.into_iter().map(|(path, reason)| SkippedFile {
            path: self.display_path(&path),
            reason,
        }));
        output.report.skipped.sort_by(|a, b| a.path.cmp(&b.path));
        output
    }

    /// Build a snapshot from already-read files.
    ///
    /// Never fails: per-file problems land in the report, and the token table
    /// falls back to defaults on its own.
    pub fn build(&self, files: &[SourceFile]) -> BuildOutput {
        let start = Instant::now();

        let style_extractors = extractors(&self.merge_helpers);
        let run = || {
            rayon::join(
                || load_tokens(&self.theme),
                || self.extract_all(files, &style_extractors),
            )
        };
        let (token_load, outcomes) = match self.workers {
            Some(workers) => match rayon::ThreadPoolBuilder::new().num_threads(workers).build() {
                Ok(pool) => pool.install(run),
                Err(e) => {
                    warn!(error = %e, "failed to build worker pool; using the global pool");
                    run()
                }
            },
            None => run(),
        };

        let mut output = self.assemble(files.len(), token_load, outcomes);
        output.report.duration_ms = start.elapsed().as_millis() as u64;

        info!(
            project = %output.snapshot.project.name,
            components = output.report.components,
            skipped = output.report.skipped.len(),
            unresolved_tokens = output.report.unresolved_tokens,
            cancelled = output.report.cancelled,
            "snapshot built"
        );
        output
    }

    fn extract_all(
        &self,
        files: &[SourceFile],
        extractors: &[Box<dyn StyleExtractor>],
    ) -> Vec<FileOutcome> {
        files
            .par_iter()
            .map(|file| self.process(file, extractors))
            .collect()
    }

    fn process(&self, file: &SourceFile, extractors: &[Box<dyn StyleExtractor>]) -> FileOutcome {
        if self.cancel.is_cancelled() {
            return FileOutcome::Cancelled;
        }

        // Files outside the root keep their absolute path, which never infers a category
        let rel_path = self.display_path(&file.path);
        match analyze_file_with(&file.path, &file.content, extractors) {
            Ok(Extraction::Component(mut descriptor)) => {
                descriptor.category = self.categories.assign(&descriptor.name, Path::new(&rel_path));
                descriptor.file = rel_path;
                FileOutcome::Component(descriptor)
            }
            Ok(Extraction::NotComponent) => FileOutcome::NotComponent,
            Err(e) => {
                warn!(path = %rel_path, error = %e, "skipping file");
                FileOutcome::Skipped(SkippedFile {
                    path: rel_path,
                    reason: e.to_string(),
                })
            }
        }
    }

    fn assemble(
        &self,
        files_seen: usize,
        token_load: TokenLoad,
        outcomes: Vec<FileOutcome>,
    ) -> BuildOutput {
        let mut report = BuildReport {
            files_seen,
            token_warnings: token_load.warnings,
            cancelled: self.cancel.is_cancelled(),
            ..Default::default()
        };

        let mut seen = HashSet::new();
        let mut components = Vec::new();
        for outcome in outcomes {
            match outcome {
                FileOutcome::Component(descriptor) => {
                    let id = descriptor.id();
                    if !seen.insert(id.clone()) {
                        warn!(component = %id, path = %descriptor.file, "duplicate component identity");
                        report.duplicates.push(format!("{} ({})", id, descriptor.file));
                        continue;
                    }
                    report.unresolved_tokens +=
                        descriptor.unresolved_styles.len() + descriptor.style_issues.len();
                    components.push(*descriptor);
                }
                FileOutcome::NotComponent => report.non_components += 1,
                FileOutcome::Skipped(skipped) => report.skipped.push(skipped),
                FileOutcome::Cancelled => report.cancelled = true,
            }
        }
        report.components = components.len();

        let mut tokens = token_load.table;
        tokens.record_color_usage(&components);

        let mut project = self.project.clone();
        project.file_count = files_seen;

        BuildOutput {
            snapshot: Snapshot::new(project, components, tokens),
            report,
        }
    }

    fn display_path(&self, path: &Path) -> String {
        let relative = self
            .root
            .as_deref()
            .and_then(|root| path.strip_prefix(root).ok())
            .unwrap_or(path);
        relative.to_string_lossy().replace('\\', "/")
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::schema::ComponentCategory;
    use serde_json::json;

    fn file(path: &str, content: &str) -> SourceFile {
        SourceFile {
            path: PathBuf::from(path),
            content: content.to_string(),
        }
    }

    fn fixture() -> Vec<SourceFile> {
        vec![
            file(
                "src/Button.tsx",
                r#"export function Button({ label }: { label: string }) {
                    return <button className="px-4 py-2 bg-primary-500">{label}</button>;
                }"#,
            ),
            file(
                "src/molecules/SearchBar.jsx",
                r#"export const SearchBar = () => <form className="flex gap-2"><input /></form>;"#,
            ),
            file("src/utils/format.ts", "export const format = (n: number) => n.toFixed(2);"),
            file("src/Broken.tsx", "export function Broken( { return <div; }"),
        ]
    }

    #[test]
    fn test_build_assigns_categories_and_reports() {
        let categories: CategoryMap =
            [("Button".to_string(), ComponentCategory::Atoms)].into_iter().collect();
        let theme = ThemeConfig::Value(json!({ "theme": { "colors": { "primary": { "500": "#3b82f6" } } } }));

        let output = SnapshotBuilder::new("demo")
            .with_categories(categories)
            .with_theme(theme)
            .build(&fixture());

        let snapshot = &output.snapshot;
        let ids: Vec<String> = snapshot.components.iter().map(|c| c.id().to_string()).collect();
        assert_eq!(ids, vec!["atoms/Button", "unclassified/SearchBar"]);
        assert_eq!(snapshot.project.file_count, 4);

        let report = &output.report;
        assert_eq!(report.files_seen, 4);
        assert_eq!(report.components, 2);
        assert_eq!(report.non_components, 1);
        assert_eq!(report.skipped.len(), 1);
        assert_eq!(report.skipped[0].path, "src/Broken.tsx");
        assert!(!report.cancelled);

        let primary = &snapshot.tokens.colors["primary-500"];
        assert_eq!(primary.usage_sites, vec!["atoms/Button"]);
    }

    #[test]
    fn test_failed_theme_does_not_block_components() {
        let output = SnapshotBuilder::new("demo")
            .with_theme(ThemeConfig::Failed("boom".to_string()))
            .build(&fixture());
        assert_eq!(output.snapshot.components.len(), 2);
        assert_eq!(output.report.token_warnings.len(), 1);
        assert_eq!(output.snapshot.tokens.breakpoints.len(), 5);
    }

    #[test]
    fn test_duplicate_identity_keeps_first_file() {
        let files = vec![
            file("a/Card.tsx", "export const Card = () => <div className=\"p-2\" />;"),
            file("b/Card.tsx", "export const Card = () => <section />;"),
        ];
        let output = SnapshotBuilder::new("demo").with_workers(2).build(&files);
        assert_eq!(output.snapshot.components.len(), 1);
        assert_eq!(output.snapshot.components[0].file, "a/Card.tsx");
        assert_eq!(output.report.duplicates, vec!["unclassified/Card (b/Card.tsx)"]);
    }

    #[test]
    fn test_cancelled_build_is_partial_but_consistent() {
        let cancel = CancellationToken::new();
        cancel.cancel();
        let output = SnapshotBuilder::new("demo")
            .with_cancellation(cancel)
            .build(&fixture());
        assert!(output.report.cancelled);
        assert!(output.snapshot.components.is_empty());
        assert_eq!(output.snapshot.tokens.breakpoints.len(), 5);
    }

    #[test]
    fn test_build_is_deterministic() {
        let builder = SnapshotBuilder::new("demo").with_workers(4);
        let a = builder.build(&fixture());
        let b = builder.build(&fixture());
        assert_eq!(a.snapshot.components, b.snapshot.components);
        assert_eq!(a.snapshot.tokens, b.snapshot.tokens);
    }

    #[test]
    fn test_paths_relative_to_root() {
        let files = vec![file(
            "/work/app/src/atoms/Icon.tsx",
            "export default function Icon() { return <svg />; }",
        )];
        let output = SnapshotBuilder::new("app")
            .with_root("/work/app")
            .with_categories(CategoryMap::default().with_path_inference(true))
            .build(&files);
        let icon = &output.snapshot.components[0];
        assert_eq!(icon.file, "src/atoms/Icon.tsx");
        assert_eq!(icon.category, ComponentCategory::Atoms);
        assert_eq!(output.snapshot.project.root.as_deref(), Some("/work/app"));
    }

    #[test]
    fn test_merge_helpers_feed_utility_classes() {
        let files = vec![file(
            "Box.tsx",
            r#"export const Box = () => <div className={tw("p-4 flex")} />;"#,
        )];

        let plain = SnapshotBuilder::new("p").build(&files);
        let component = &plain.snapshot.components[0];
        assert_eq!(component.token_values().count(), 0);
        assert_eq!(component.unresolved_styles.len(), 1);

        let output = SnapshotBuilder::new("p").with_merge_helpers(["tw"]).build(&files);
        let component = &output.snapshot.components[0];
        assert_eq!(component.token_values().collect::<Vec<_>>(), vec!["p-4", "flex"]);
        assert!(component.unresolved_styles.is_empty());
    }

    #[test]
    fn test_category_directories_do_not_classify_by_default() {
        let files = vec![
            file("src/atoms/Button.tsx", "export const Button = () => <button />;"),
            file(
                "/srv/templates/app/src/Card.tsx",
                "export const Card = () => <div />;",
            ),
        ];
        let output = SnapshotBuilder::new("p").build(&files);
        assert!(output
            .snapshot
            .components
            .iter()
            .all(|c| c.category == ComponentCategory::Unclassified));

        // Inference only reads the part of the path inside the project
        let output = SnapshotBuilder::new("p")
            .with_root("/work/app")
            .with_categories(CategoryMap::default().with_path_inference(true))
            .build(&files);
        let categories: Vec<(&str, ComponentCategory)> = output
            .snapshot
            .components
            .iter()
            .map(|c| (c.name.as_str(), c.category))
            .collect();
        assert_eq!(
            categories,
            vec![
                ("Button", ComponentCategory::Atoms),
                ("Card", ComponentCategory::Unclassified)
            ]
        );
    }
}
