use std::io;
use std::path::{Component, Path, PathBuf};

use anyhow::{Context, Result};
use clap::Parser;
use rayon::prelude::*;
use tracing::{debug, warn};
use tracing_subscriber::EnvFilter;

use fileowners::{OwnerFilter, Report, ReportBuilder, RuleSet};

/// Directories holding version-control metadata, never user files.
const VCS_DIRS: &[&str] = &[".git", ".hg", ".svn"];

#[derive(Parser)]
#[command(
    version,
    about = "Resolve CODEOWNERS ownership for file trees and report it as JSON"
)]
struct Cli {
    /// Files or directories to evaluate. Defaults to the current directory.
    paths: Vec<PathBuf>,

    /// CODEOWNERS file path. Defaults to the standard locations.
    #[clap(short = 'f', long = "file")]
    codeowners_file: Option<PathBuf>,

    /// Filter results by owner (leading `@` optional, repeatable).
    #[clap(short = 'o', long = "owner")]
    owners: Vec<String>,
}

impl Cli {
    fn root_paths(&self) -> Vec<PathBuf> {
        if self.paths.is_empty() {
            vec![PathBuf::from(".")]
        } else {
            self.paths.clone()
        }
    }
}

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .with_writer(io::stderr)
        .with_target(false)
        .init();

    let cli = Cli::parse();

    let ruleset = load_ruleset(&cli)?;
    debug!("loaded {} rules", ruleset.len());

    let filter = OwnerFilter::new(cli.owners.iter().cloned());

    let mut paths = Vec::new();
    for root in cli.root_paths() {
        if !root.exists() {
            eprintln!("error: path does not exist: {}", root.display());
            continue;
        }

        if root.is_dir() {
            collect_files(&root, &mut paths);
        } else {
            match normalize(&root) {
                Some(path) => paths.push(path),
                None => eprintln!(
                    "error: path is outside the evaluated root: {}",
                    root.display()
                ),
            }
        }
    }
    debug!("collected {} candidate files", paths.len());

    let report = build_report(&ruleset, &filter, &paths);
    println!("{}", serde_json::to_string(&report)?);

    Ok(())
}

fn load_ruleset(cli: &Cli) -> Result<RuleSet> {
    match &cli.codeowners_file {
        Some(path) => fileowners::from_path(path)
            .with_context(|| format!("failed to load CODEOWNERS from {}", path.display())),
        None => fileowners::from_standard_location(".").context("failed to load CODEOWNERS"),
    }
}

fn collect_files(root: &Path, paths: &mut Vec<String>) {
    let walker = walkdir::WalkDir::new(root)
        .min_depth(1)
        .into_iter()
        .filter_entry(|entry| !is_vcs_dir(entry));

    for entry in walker {
        let entry = match entry {
            Ok(entry) => entry,
            // Unreadable entries (permissions, dangling links) are skipped
            // and the walk continues.
            Err(err) => {
                warn!("skipping unreadable entry: {}", err);
                continue;
            }
        };
        if !entry.file_type().is_file() {
            continue;
        }
        match normalize(entry.path()) {
            Some(path) => paths.push(path),
            None => eprintln!(
                "error: path is outside the evaluated root: {}",
                entry.path().display()
            ),
        }
    }
}

fn is_vcs_dir(entry: &walkdir::DirEntry) -> bool {
    entry.file_type().is_dir()
        && entry
            .file_name()
            .to_str()
            .is_some_and(|name| VCS_DIRS.contains(&name))
}

// Resolution works on root-relative, forward-slash paths. Anything that
// escapes the evaluated root (absolute, or climbing out via `..`) cannot be
// matched against the manifest and is rejected per path.
fn normalize(path: &Path) -> Option<String> {
    let mut segments: Vec<String> = Vec::new();
    for component in path.components() {
        match component {
            Component::CurDir => {}
            Component::Normal(segment) => segments.push(segment.to_string_lossy().into_owned()),
            Component::ParentDir => {
                segments.pop()?;
            }
            Component::RootDir | Component::Prefix(_) => return None,
        }
    }
    if segments.is_empty() {
        None
    } else {
        Some(segments.join("/"))
    }
}

// The ruleset is read-only after construction, so per-path resolution fans
// out across rayon workers with no locking; each worker folds into its own
// partial report and the partials merge at the end.
fn build_report(ruleset: &RuleSet, filter: &OwnerFilter, paths: &[String]) -> Report {
    paths
        .par_iter()
        .fold(
            || ReportBuilder::new(filter.clone()),
            |mut builder, path| {
                builder.record(path, ruleset.owners(path));
                builder
            },
        )
        .reduce(|| ReportBuilder::new(filter.clone()), ReportBuilder::merge)
        .finish(ruleset)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_normalize() {
        assert_eq!(normalize(Path::new("./src/main.rs")), Some("src/main.rs".to_owned()));
        assert_eq!(normalize(Path::new("src/./main.rs")), Some("src/main.rs".to_owned()));
        assert_eq!(normalize(Path::new("a/../b")), Some("b".to_owned()));
        assert_eq!(normalize(Path::new("../escape")), None);
        assert_eq!(normalize(Path::new("/abs/path")), None);
        assert_eq!(normalize(Path::new(".")), None);
    }

    #[test]
    fn test_parallel_report_matches_sequential() {
        let ruleset = RuleSet::new(
            fileowners::parser::parse("* @default\n*.go @go-owners\n/cmd/ @cli-team\n").unwrap(),
        );
        let filter = OwnerFilter::default();
        let paths: Vec<String> = (0..64)
            .flat_map(|i| {
                [
                    format!("pkg-{}/main.go", i),
                    format!("cmd/tool-{}.go", i),
                    format!("docs/page-{}.md", i),
                ]
            })
            .collect();

        let parallel = build_report(&ruleset, &filter, &paths);

        let mut builder = ReportBuilder::new(filter.clone());
        for path in &paths {
            builder.record(path, ruleset.owners(path));
        }
        let sequential = builder.finish(&ruleset);

        assert_eq!(parallel, sequential);
    }
}
