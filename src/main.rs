//! component-catalog CLI entry point

use std::fs;
use std::path::Path;
use std::process::ExitCode;

use tracing::info;
use tracing_subscriber::EnvFilter;

use component_catalog::utils::truncate_with_ellipsis;
use component_catalog::{
    analyze_file, diff_files, CatalogConfig, CatalogError, Cli, Command, Extraction,
    SnapshotBuilder,
};

fn main() -> ExitCode {
    let cli = Cli::parse_args();

    // Logs go to stderr so stdout stays machine-readable
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(cli.log_filter())),
        )
        .with_writer(std::io::stderr)
        .init();

    match run(cli) {
        Ok(Some(output)) => {
            println!("{}", output);
            ExitCode::SUCCESS
        }
        Ok(None) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("Error: {}", e);
            e.exit_code()
        }
    }
}

fn run(cli: Cli) -> component_catalog::Result<Option<String>> {
    match cli.command {
        Command::Snapshot {
            dir,
            config,
            out,
            workers,
            report,
        } => {
            if !dir.is_dir() {
                return Err(CatalogError::FileNotFound {
                    path: dir.display().to_string(),
                });
            }

            let config = match config {
                Some(path) => CatalogConfig::load(&path)?,
                None => CatalogConfig::discover(&dir)?,
            };

            let mut builder = SnapshotBuilder::from_config(&config, &dir)
                .with_version(env!("CARGO_PKG_VERSION"));
            if let Some(workers) = workers {
                builder = builder.with_workers(workers);
            }

            let output = builder.build_dir(&dir, config.max_depth, &config.extensions);

            if report {
                eprintln!("{}", serde_json::to_string_pretty(&output.report)?);
            }
            eprintln!(
                "{} components, {} skipped files, {} unresolved tokens",
                output.report.components,
                output.report.skipped.len(),
                output.report.unresolved_tokens
            );

            match out {
                Some(path) => {
                    output.snapshot.save(&path)?;
                    info!(path = %path.display(), "snapshot written");
                    Ok(None)
                }
                None => Ok(Some(output.snapshot.to_json_pretty()?)),
            }
        }

        Command::Diff {
            base,
            current,
            summary,
        } => {
            let diff = diff_files(&base, &current)?;
            let json = if summary {
                serde_json::to_string_pretty(&diff.summary)?
            } else {
                serde_json::to_string_pretty(&diff)?
            };
            Ok(Some(json))
        }

        Command::Inspect { file, print_ast } => inspect(&file, print_ast).map(Some),
    }
}

fn inspect(file: &Path, print_ast: bool) -> component_catalog::Result<String> {
    if !file.exists() {
        return Err(CatalogError::FileNotFound {
            path: file.display().to_string(),
        });
    }
    let source = fs::read_to_string(file)?;

    if print_ast {
        let lang = component_catalog::Lang::from_path(file)?;
        let tree = lang.parse(&source)?;
        dump_tree(&tree, &source);
    }

    match analyze_file(file, &source)? {
        Extraction::Component(descriptor) => Ok(serde_json::to_string_pretty(&descriptor)?),
        Extraction::NotComponent => Ok("null".to_string()),
    }
}

/// Dump named nodes to stderr as `kind line:col "text"`, indented by depth
fn dump_tree(tree: &tree_sitter::Tree, source: &str) {
    let mut cursor = tree.walk();
    let mut depth = 0usize;
    loop {
        let node = cursor.node();
        if node.is_named() {
            let text = node.utf8_text(source.as_bytes()).unwrap_or_default();
            let text = text.split_whitespace().collect::<Vec<_>>().join(" ");
            let start = node.start_position();
            eprintln!(
                "{:indent$}{} {}:{} {:?}",
                "",
                node.kind(),
                start.row + 1,
                start.column + 1,
                truncate_with_ellipsis(&text, 48),
                indent = depth * 2
            );
        }

        if cursor.goto_first_child() {
            depth += 1;
            continue;
        }
        while !cursor.goto_next_sibling() {
            if !cursor.goto_parent() {
                return;
            }
            depth -= 1;
        }
    }
}
