//! Parse CODEOWNERS-style ownership manifests and resolve which owners are
//! responsible for which paths.
//!
//! ```
//! use fileowners::{parser, RuleSet};
//!
//! let rules = parser::parse("*.rs @rust-team\n/docs/ @docs-team\n")?;
//! let ruleset = RuleSet::new(rules);
//!
//! let rule = ruleset.resolve("docs/guide.md").unwrap();
//! assert_eq!(rule.pattern(), "/docs/");
//! # Ok::<(), fileowners::ParseError>(())
//! ```

pub mod parser;
mod pattern;
mod report;
mod ruleset;

use std::fs;
use std::io::{self, Read};
use std::path::{Path, PathBuf};

use thiserror::Error;

pub use parser::ParseError;
pub use pattern::Matcher;
pub use report::{OwnedFile, OwnerFilter, Report, ReportBuilder};
pub use ruleset::{InvalidOwner, Owner, OwnerKind, Rule, RuleSet};

/// Locations probed for a manifest when none is given explicitly, relative
/// to the repository root and in priority order.
pub const STANDARD_LOCATIONS: &[&str] =
    &[".github/CODEOWNERS", "CODEOWNERS", "docs/CODEOWNERS"];

#[derive(Debug, Error)]
pub enum Error {
    #[error(transparent)]
    Io(#[from] io::Error),
    #[error(transparent)]
    Parse(#[from] ParseError),
    #[error("no CODEOWNERS file found in any of the standard locations")]
    ManifestNotFound,
}

/// Load and compile the manifest at `path`.
pub fn from_path(path: impl AsRef<Path>) -> Result<RuleSet, Error> {
    let source = fs::read_to_string(path)?;
    Ok(RuleSet::new(parser::parse(&source)?))
}

/// Load and compile a manifest from a reader.
pub fn from_reader(mut reader: impl Read) -> Result<RuleSet, Error> {
    let mut source = String::new();
    reader.read_to_string(&mut source)?;
    Ok(RuleSet::new(parser::parse(&source)?))
}

/// Load the manifest from the first conventional location that exists
/// under `root`.
pub fn from_standard_location(root: impl AsRef<Path>) -> Result<RuleSet, Error> {
    match locate_manifest(root) {
        Some(path) => from_path(path),
        None => Err(Error::ManifestNotFound),
    }
}

/// The first conventional manifest location under `root` that exists, if
/// any.
pub fn locate_manifest(root: impl AsRef<Path>) -> Option<PathBuf> {
    STANDARD_LOCATIONS
        .iter()
        .map(|location| root.as_ref().join(location))
        .find(|path| path.is_file())
}
