//! Snapshot building shared by the CLI and library callers
//!
//! This module provides file collection and parallel snapshot generation.
//!
//! # Key Features
//!
//! - **Parallel Processing**: Uses Rayon for multi-threaded file analysis
//! - **Cancellation**: Checked between files, never mid-parse
//! - **Error Handling**: Collects per-file failures without stopping the build
//!
//! # Example
//!
//! ```ignore
//! use component_catalog::indexing::SnapshotBuilder;
//! use component_catalog::CatalogConfig;
//!
//! let config = CatalogConfig::discover(&repo_dir)?;
//! let output = SnapshotBuilder::from_config(&config, &repo_dir)
//!     .build_dir(&repo_dir, config.max_depth, &config.extensions);
//!
//! println!("{} components, {} skipped", output.report.components, output.report.skipped.len());
//! ```

mod files;
mod generation;

pub use files::{collect_files, read_sources, should_skip_path, SourceFile};
pub use generation::{
    BuildOutput, BuildReport, CancellationToken, SkippedFile, SnapshotBuilder,
};
