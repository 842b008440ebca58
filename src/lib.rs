//! Component catalog: static extraction and snapshot diffing for UI components
//!
//! This library parses JavaScript-family component sources with tree-sitter,
//! extracts each component's name, props, rendered element tree, style tokens
//! and local dependencies, and assembles them with the project's design tokens
//! into a versioned JSON [`Snapshot`]. Two snapshots can be compared with
//! [`diff`] to get a deterministic, order-independent change report.
//!
//! # Supported Languages
//!
//! - TypeScript, TSX, JavaScript, JSX
//!
//! # Example
//!
//! ```ignore
//! use component_catalog::{diff, CatalogConfig, Snapshot, SnapshotBuilder};
//! use std::path::Path;
//!
//! let root = Path::new("./my-app");
//! let config = CatalogConfig::discover(root)?;
//! let output = SnapshotBuilder::from_config(&config, root)
//!     .build_dir(root, config.max_depth, &config.extensions);
//!
//! let previous = Snapshot::load(Path::new("catalog.snapshot.json"))?;
//! let changes = diff(&previous, &output.snapshot);
//! println!("{} modified", changes.summary.modified);
//! ```

pub mod cli;
pub mod config;
pub mod detectors;
pub mod diff;
pub mod error;
pub mod extract;
pub mod indexing;
pub mod lang;
pub mod schema;
pub mod styles;
pub mod tokens;
pub mod utils;

// Re-export commonly used types
pub use cli::{Cli, Command};
pub use config::{read_theme_config, CatalogConfig, CategoryMap};
pub use diff::{diff, diff_files, ComponentChange, Diff, DiffSummary};
pub use error::{CatalogError, Result};
pub use extract::{analyze_file, analyze_file_with, extract, Extraction};
pub use indexing::{BuildOutput, BuildReport, CancellationToken, SnapshotBuilder, SourceFile};
pub use lang::Lang;
pub use schema::{
    ComponentCategory, ComponentDescriptor, ComponentId, ElementNode, ProjectInfo, Prop, RawType,
    Snapshot, SNAPSHOT_FORMAT_VERSION,
};
pub use styles::{StyleExtractor, StyleToken, ValidationReport};
pub use tokens::{load_tokens, ThemeConfig, TokenLoad, TokenTable};
