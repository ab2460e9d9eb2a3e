//! Line-oriented parsing of ownership manifests.
//!
//! Each non-blank, non-comment line is `<pattern> <owner>...`, where the
//! owner list may be empty (an explicitly unowned pattern). `#` starts a
//! comment, either on its own line or trailing a rule. Parsing stops at the
//! first malformed line: an incomplete ownership model is worse than none,
//! so no partial rule list is ever returned.

use thiserror::Error;

use crate::ruleset::Owner;

/// A single manifest line: the raw pattern and the owners assigned to it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Rule {
    pub pattern: String,
    pub owners: Vec<Owner>,
    /// 1-based manifest line this rule was parsed from.
    pub line_number: usize,
}

/// A malformed manifest line, with its 1-based line number.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ParseError {
    #[error("line {line}: expected pattern")]
    ExpectedPattern { line: usize },
    #[error("line {line}: invalid owner `{token}`")]
    InvalidOwner { line: usize, token: String },
}

impl ParseError {
    pub fn line(&self) -> usize {
        match self {
            ParseError::ExpectedPattern { line } => *line,
            ParseError::InvalidOwner { line, .. } => *line,
        }
    }
}

/// Parse a manifest, preserving rule order. Fails on the first malformed
/// line.
pub fn parse(source: &str) -> Result<Vec<Rule>, ParseError> {
    let mut rules = Vec::new();
    for (idx, line) in source.lines().enumerate() {
        let line_number = idx + 1;
        let line = line.trim();
        if line.is_empty() || line.starts_with('#') {
            continue;
        }
        rules.push(parse_rule(line, line_number)?);
    }
    Ok(rules)
}

fn parse_rule(line: &str, line_number: usize) -> Result<Rule, ParseError> {
    let (pattern, rest) = split_pattern(line);
    if pattern.is_empty() {
        return Err(ParseError::ExpectedPattern { line: line_number });
    }

    // Everything after an unescaped `#` is a trailing comment.
    let rest = match rest.find('#') {
        Some(pos) => &rest[..pos],
        None => rest,
    };

    let mut owners = Vec::new();
    for token in rest.split_whitespace() {
        let owner = Owner::try_from(token).map_err(|_| ParseError::InvalidOwner {
            line: line_number,
            token: token.to_owned(),
        })?;
        owners.push(owner);
    }

    Ok(Rule {
        pattern,
        owners,
        line_number,
    })
}

// The pattern runs until the first unescaped whitespace or `#`. A backslash
// escapes a space or tab into the pattern; other escape pairs are kept
// verbatim for the matcher to interpret.
fn split_pattern(line: &str) -> (String, &str) {
    let mut pattern = String::new();
    let mut chars = line.char_indices();
    while let Some((idx, c)) = chars.next() {
        match c {
            '\\' => match chars.next() {
                Some((_, ' ')) => pattern.push(' '),
                Some((_, '\t')) => pattern.push('\t'),
                Some((_, escaped)) => {
                    pattern.push('\\');
                    pattern.push(escaped);
                }
                None => pattern.push('\\'),
            },
            ' ' | '\t' | '#' => return (pattern, &line[idx..]),
            _ => pattern.push(c),
        }
    }
    (pattern, "")
}
