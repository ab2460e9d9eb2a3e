use std::collections::BTreeMap;
use std::fmt;

use thiserror::Error;

use crate::parser;
use crate::pattern::Matcher;

/// Syntactic shape of an owner token.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OwnerKind {
    /// `@username`
    User,
    /// `@org/team`
    Team,
    /// `local@domain`
    Email,
}

/// An owner token, kept verbatim (`@` included). The kind records the
/// syntactic shape only; the value is otherwise opaque, and equality is
/// exact, case-sensitive string comparison.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Owner {
    value: String,
    kind: OwnerKind,
}

impl Owner {
    pub fn new(value: String, kind: OwnerKind) -> Owner {
        Owner { value, kind }
    }

    pub fn value(&self) -> &str {
        &self.value
    }

    pub fn kind(&self) -> OwnerKind {
        self.kind
    }
}

impl fmt::Display for Owner {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.value)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("invalid owner `{0}`")]
pub struct InvalidOwner(pub String);

impl TryFrom<&str> for Owner {
    type Error = InvalidOwner;

    fn try_from(token: &str) -> Result<Owner, InvalidOwner> {
        match owner_kind(token) {
            Some(kind) => Ok(Owner {
                value: token.to_owned(),
                kind,
            }),
            None => Err(InvalidOwner(token.to_owned())),
        }
    }
}

impl TryFrom<String> for Owner {
    type Error = InvalidOwner;

    fn try_from(token: String) -> Result<Owner, InvalidOwner> {
        Owner::try_from(token.as_str())
    }
}

fn owner_kind(token: &str) -> Option<OwnerKind> {
    if let Some(name) = token.strip_prefix('@') {
        if name.is_empty() {
            return None;
        }
        return match name.split_once('/') {
            Some((org, team)) if !org.is_empty() && !team.is_empty() => Some(OwnerKind::Team),
            Some(_) => None,
            None => Some(OwnerKind::User),
        };
    }
    match token.split_once('@') {
        Some((local, domain)) if !local.is_empty() && !domain.is_empty() => Some(OwnerKind::Email),
        _ => None,
    }
}

/// A compiled rule: the raw pattern it came from, its matcher, the owners
/// it assigns, and the manifest line it was parsed from. Immutable after
/// construction.
#[derive(Debug, Clone)]
pub struct Rule {
    pattern: String,
    matcher: Matcher,
    owners: Vec<Owner>,
    line_number: usize,
}

impl Rule {
    pub fn pattern(&self) -> &str {
        &self.pattern
    }

    pub fn owners(&self) -> &[Owner] {
        &self.owners
    }

    pub fn line_number(&self) -> usize {
        self.line_number
    }

    pub fn matches(&self, path: &str) -> bool {
        self.matcher.matches(path)
    }
}

/// An ordered collection of compiled rules. Order is exactly manifest line
/// order and is load-bearing: the last matching rule governs a path.
/// Read-only after construction, so it can be shared freely across threads.
#[derive(Debug, Clone)]
pub struct RuleSet {
    rules: Vec<Rule>,
    owner_index: BTreeMap<String, Vec<String>>,
}

impl RuleSet {
    /// Compile a parsed rule list. One matcher per rule is built here, up
    /// front, so repeated resolution only evaluates them.
    pub fn new(rules: Vec<parser::Rule>) -> RuleSet {
        let rules = rules
            .into_iter()
            .map(|rule| Rule {
                matcher: Matcher::new(&rule.pattern),
                pattern: rule.pattern,
                owners: rule.owners,
                line_number: rule.line_number,
            })
            .collect::<Vec<_>>();

        // The owner index is a projection of the rule list; building it in
        // the same pass keeps it from drifting out of sync with the rules.
        let mut owner_index: BTreeMap<String, Vec<String>> = BTreeMap::new();
        for rule in &rules {
            for owner in &rule.owners {
                owner_index
                    .entry(owner.value().to_owned())
                    .or_default()
                    .push(rule.pattern.clone());
            }
        }

        RuleSet { rules, owner_index }
    }

    /// The rule governing `path`: the last rule in manifest order whose
    /// pattern matches, found by scanning in reverse and stopping at the
    /// first hit. `None` means no rule matches.
    ///
    /// `path` must be root-relative in forward-slash form.
    pub fn resolve(&self, path: &str) -> Option<&Rule> {
        self.rules.iter().rev().find(|rule| rule.matches(path))
    }

    /// Owners of `path` under its governing rule. `Some(&[])` means a rule
    /// matched but explicitly assigns no owners; `None` means no rule
    /// matched. Callers that only care about "has owners" can treat both
    /// the same way.
    pub fn owners(&self, path: &str) -> Option<&[Owner]> {
        self.resolve(path).map(Rule::owners)
    }

    pub fn rules(&self) -> &[Rule] {
        &self.rules
    }

    pub fn len(&self) -> usize {
        self.rules.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rules.is_empty()
    }

    /// Owner value → raw patterns mentioning that owner, in manifest order.
    pub fn owner_index(&self) -> &BTreeMap<String, Vec<String>> {
        &self.owner_index
    }
}
