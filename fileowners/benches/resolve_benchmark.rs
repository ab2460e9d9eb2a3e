use criterion::{criterion_group, criterion_main, Criterion};
use fileowners::{parser, RuleSet};

const TEST_PATHS: &[&str] = &[
    "file-a",
    "dir-a/file-a",
    "dir-a/dir-c/file-a",
    "dir-a/dir-c/file-b",
    "dir-b/file-a",
    "dir-b/dir-d/dir-e/dir-f/dir-g/file-a",
];

const TEST_PATTERNS: &[&str] = &[
    "*",
    "*-a",
    "file-*",
    "/dir-b",
    "dir-a/dir-b",
    "**/dir-*/file-*",
    "dir-*/*",
    "dir-b/dir-d/dir-e/dir-f/dir-g/file-a",
];

fn build_ruleset(patterns: &[&str]) -> RuleSet {
    let rules = patterns
        .iter()
        .enumerate()
        .map(|(idx, &pattern)| parser::Rule {
            pattern: pattern.to_string(),
            owners: vec![],
            line_number: idx + 1,
        })
        .collect();

    RuleSet::new(rules)
}

fn resolve_benchmark(c: &mut Criterion) {
    c.bench_function("building", |b| b.iter(|| build_ruleset(TEST_PATTERNS)));

    let ruleset = build_ruleset(TEST_PATTERNS);
    c.bench_function("resolving", |b| {
        b.iter(|| {
            for path in TEST_PATHS {
                ruleset.resolve(path);
            }
        })
    });
}

criterion_group!(benches, resolve_benchmark);
criterion_main!(benches);
