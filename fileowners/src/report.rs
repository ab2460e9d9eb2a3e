//! Aggregation of per-file resolution results into the serialized report.

use std::collections::BTreeMap;

use serde::Serialize;

use crate::ruleset::{Owner, RuleSet};

/// A file with a governing rule that assigns owners. The `files` key name
/// is part of the external contract and must not change.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct OwnedFile {
    #[serde(rename = "files")]
    pub path: String,
    pub owners: Vec<String>,
}

/// The serialized ownership report. Field names are an external contract:
/// `users`, `owned_files`, `unowned_files`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Report {
    pub users: BTreeMap<String, Vec<String>>,
    pub owned_files: Vec<OwnedFile>,
    pub unowned_files: Vec<String>,
}

/// Owner filter built from `--owner` style flags. A leading `@` on either
/// side of the comparison is ignored; matching is otherwise exact and
/// case-sensitive. An empty filter admits every owner.
#[derive(Debug, Clone, Default)]
pub struct OwnerFilter {
    names: Vec<String>,
}

impl OwnerFilter {
    pub fn new<I, S>(names: I) -> OwnerFilter
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let names = names
            .into_iter()
            .map(|name| name.into().trim_start_matches('@').to_owned())
            .collect();
        OwnerFilter { names }
    }

    pub fn is_empty(&self) -> bool {
        self.names.is_empty()
    }

    pub fn admits(&self, owner: &Owner) -> bool {
        self.names.is_empty()
            || self
                .names
                .iter()
                .any(|name| name == owner.value().trim_start_matches('@'))
    }
}

/// Accumulates `(path, resolution)` pairs, in any order, into a [`Report`].
///
/// Parallel walks give each worker its own builder and [`merge`] the
/// partials afterwards; the result is independent of how the work was
/// split because [`finish`] imposes the final ordering.
///
/// [`merge`]: ReportBuilder::merge
/// [`finish`]: ReportBuilder::finish
#[derive(Debug, Clone)]
pub struct ReportBuilder {
    filter: OwnerFilter,
    owned_files: Vec<OwnedFile>,
    unowned_files: Vec<String>,
}

impl ReportBuilder {
    pub fn new(filter: OwnerFilter) -> ReportBuilder {
        ReportBuilder {
            filter,
            owned_files: Vec::new(),
            unowned_files: Vec::new(),
        }
    }

    /// Record one resolution result. `None` means no rule matched; an empty
    /// owner list means the governing rule explicitly assigns no owners.
    /// Both land in `unowned_files`. The owner filter narrows the visible
    /// owner list of an owned file but never changes its owned status.
    pub fn record(&mut self, path: &str, owners: Option<&[Owner]>) {
        match owners {
            Some(owners) if !owners.is_empty() => {
                let visible = owners
                    .iter()
                    .filter(|owner| self.filter.admits(owner))
                    .map(|owner| owner.value().to_owned())
                    .collect();
                self.owned_files.push(OwnedFile {
                    path: path.to_owned(),
                    owners: visible,
                });
            }
            _ => self.unowned_files.push(path.to_owned()),
        }
    }

    /// Fold another builder's results into this one. Keeps `self`'s filter;
    /// both builders are expected to share it.
    pub fn merge(mut self, other: ReportBuilder) -> ReportBuilder {
        self.owned_files.extend(other.owned_files);
        self.unowned_files.extend(other.unowned_files);
        self
    }

    /// Build the final report. Traversal order is unspecified, so the file
    /// lists are sorted here to make output identical across runs and
    /// worker counts. The `users` index is taken from the rule store, of
    /// which it is a derived projection.
    pub fn finish(mut self, ruleset: &RuleSet) -> Report {
        self.owned_files.sort_by(|a, b| a.path.cmp(&b.path));
        self.unowned_files.sort();
        Report {
            users: ruleset.owner_index().clone(),
            owned_files: self.owned_files,
            unowned_files: self.unowned_files,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::parser;
    use crate::ruleset::RuleSet;

    fn ruleset(source: &str) -> RuleSet {
        RuleSet::new(parser::parse(source).unwrap())
    }

    fn report_for(rules: &RuleSet, filter: OwnerFilter, paths: &[&str]) -> Report {
        let mut builder = ReportBuilder::new(filter);
        for path in paths {
            builder.record(path, rules.owners(path));
        }
        builder.finish(rules)
    }

    #[test]
    fn test_owned_and_unowned_partition() {
        let rules = ruleset("*.go @gophers\nvendor/\n");
        let report = report_for(
            &rules,
            OwnerFilter::default(),
            &["main.go", "README.md", "vendor/lib.go"],
        );

        assert_eq!(
            report.owned_files,
            [OwnedFile {
                path: "main.go".to_owned(),
                owners: vec!["@gophers".to_owned()],
            }]
        );
        // Explicitly empty owners and no match both read as unowned.
        assert_eq!(report.unowned_files, ["README.md", "vendor/lib.go"]);
    }

    #[test]
    fn test_filter_narrows_owner_list() {
        let rules = ruleset("*.go @gophers @org/backend\n");
        let report = report_for(&rules, OwnerFilter::new(["gophers"]), &["main.go"]);
        assert_eq!(report.owned_files[0].owners, ["@gophers"]);
    }

    #[test]
    fn test_filtered_out_file_stays_owned() {
        let rules = ruleset("*.go @gophers\n");
        let report = report_for(&rules, OwnerFilter::new(["@docs-team"]), &["main.go"]);

        assert_eq!(report.owned_files[0].path, "main.go");
        assert!(report.owned_files[0].owners.is_empty());
        assert!(report.unowned_files.is_empty());
    }

    #[test]
    fn test_filter_strips_leading_at() {
        let rules = ruleset("*.go @gophers\n*.md dev@example.com\n");

        for filter in [OwnerFilter::new(["gophers"]), OwnerFilter::new(["@gophers"])] {
            let report = report_for(&rules, filter, &["main.go"]);
            assert_eq!(report.owned_files[0].owners, ["@gophers"]);
        }

        let report = report_for(
            &rules,
            OwnerFilter::new(["dev@example.com"]),
            &["guide.md"],
        );
        assert_eq!(report.owned_files[0].owners, ["dev@example.com"]);
    }

    #[test]
    fn test_filter_by_full_owner_set_is_identity() {
        let rules = ruleset("* @default\n*.go @go-owners\n/cmd/ @cli-team\n");
        let paths = ["main.go", "cmd/main.go", "README.md", "docs/guide.md"];

        let unfiltered = report_for(&rules, OwnerFilter::default(), &paths);
        let filtered = report_for(
            &rules,
            OwnerFilter::new(["default", "go-owners", "cli-team"]),
            &paths,
        );

        assert_eq!(unfiltered, filtered);
    }

    #[test]
    fn test_merge_is_order_independent() {
        let rules = ruleset("*.go @gophers\n");
        let paths = ["b.go", "a.md", "c.go", "d.md"];

        let mut whole = ReportBuilder::new(OwnerFilter::default());
        for path in &paths {
            whole.record(path, rules.owners(path));
        }

        let mut left = ReportBuilder::new(OwnerFilter::default());
        let mut right = ReportBuilder::new(OwnerFilter::default());
        for path in &paths[..2] {
            right.record(path, rules.owners(path));
        }
        for path in &paths[2..] {
            left.record(path, rules.owners(path));
        }

        assert_eq!(whole.finish(&rules), left.merge(right).finish(&rules));
    }

    #[test]
    fn test_users_index_is_unfiltered() {
        let rules = ruleset("*.go @gophers\n*.md @docs\n");
        let report = report_for(&rules, OwnerFilter::new(["gophers"]), &["main.go"]);
        assert_eq!(report.users["@docs"], ["*.md"]);
    }

    #[test]
    fn test_serialized_field_names() {
        let rules = ruleset("*.go @gophers\n");
        let report = report_for(&rules, OwnerFilter::default(), &["main.go", "README.md"]);
        let value = serde_json::to_value(&report).unwrap();

        assert_eq!(value["users"]["@gophers"][0], "*.go");
        assert_eq!(value["owned_files"][0]["files"], "main.go");
        assert_eq!(value["owned_files"][0]["owners"][0], "@gophers");
        assert_eq!(value["unowned_files"][0], "README.md");
    }
}
