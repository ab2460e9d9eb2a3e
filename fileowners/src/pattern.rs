/// A compiled ownership pattern. Matching is a pure function of the path;
/// a `Matcher` never changes after construction.
///
/// Patterns follow the CODEOWNERS subset of gitignore globbing: `*` and `?`
/// stay within one path segment, `**` spans any number of segments, a
/// leading (or interior) `/` anchors the pattern to the manifest root, and
/// a trailing `/` restricts it to directories. Only files are ever matched,
/// so a directory pattern matches every file beneath a matching directory.
#[derive(Debug, Clone)]
pub struct Matcher {
    ops: Vec<Op>,
}

#[derive(Debug, Clone)]
enum Op {
    /// Zero or more path segments.
    Any,
    /// Exactly one path segment satisfying the condition.
    Segment(Condition),
}

impl Matcher {
    pub fn new(pattern: &str) -> Matcher {
        let (pattern, leading_slash) = match pattern.strip_prefix('/') {
            Some(rest) => (rest, true),
            None => (pattern, false),
        };
        let (pattern, trailing_slash) = match pattern.strip_suffix('/') {
            Some(rest) => (rest, true),
            None => (pattern, false),
        };

        // Manifests use Unix path separators regardless of platform.
        let segments = pattern.split('/').collect::<Vec<_>>();

        // Patterns are left-anchored unless they consist of a single
        // component with no leading slash (a trailing slash is permitted).
        let anchored = leading_slash || segments.len() > 1;

        let mut ops = Vec::with_capacity(segments.len() + 3);
        if !anchored {
            push_any(&mut ops);
        }
        for segment in &segments {
            match *segment {
                "**" => push_any(&mut ops),
                _ => ops.push(Op::Segment(Condition::new(segment))),
            }
        }

        let last = segments.last().copied();
        if trailing_slash || last == Some("**") {
            // Directory patterns match everything under the directory but
            // not the directory itself, so at least one more segment is
            // required.
            ops.push(Op::Segment(Condition::Unconditional));
            push_any(&mut ops);
        } else if last != Some("*") {
            // Everything else prefix-matches: a rule naming a directory also
            // covers the files beneath it. A final bare `*` is the one
            // exception and matches exactly one segment, a known divergence
            // between CODEOWNERS globbing and the gitignore rules.
            push_any(&mut ops);
        }

        Matcher { ops }
    }

    /// Test a root-relative, forward-slash path. A leading `/` is ignored.
    pub fn matches(&self, path: &str) -> bool {
        let path = path.strip_prefix('/').unwrap_or(path);
        self.matches_segments(&path.split('/').collect::<Vec<_>>())
    }

    // Two-pointer scan with backtracking: `Any` records a resume point that
    // re-enters with one more segment consumed, so each failed tail retries
    // the most recent `Any` greedily. Segment-level version of the classic
    // single-star wildcard loop.
    fn matches_segments(&self, segments: &[&str]) -> bool {
        let mut op_idx = 0;
        let mut seg_idx = 0;
        let mut reset: Option<(usize, usize)> = None;

        while op_idx < self.ops.len() || seg_idx < segments.len() {
            match self.ops.get(op_idx) {
                Some(Op::Any) => {
                    reset = Some((op_idx, seg_idx + 1));
                    op_idx += 1;
                    continue;
                }
                Some(Op::Segment(condition)) => {
                    if seg_idx < segments.len() && condition.is_match(segments[seg_idx]) {
                        op_idx += 1;
                        seg_idx += 1;
                        continue;
                    }
                }
                None => {}
            }

            match reset {
                Some((reset_op, reset_seg)) if reset_seg <= segments.len() => {
                    op_idx = reset_op;
                    seg_idx = reset_seg;
                }
                _ => return false,
            }
        }

        true
    }
}

// Consecutive `Any` ops coalesce: zero-or-more twice is still zero-or-more.
fn push_any(ops: &mut Vec<Op>) {
    if !matches!(ops.last(), Some(Op::Any)) {
        ops.push(Op::Any);
    }
}

#[derive(Debug, Clone)]
enum Condition {
    Unconditional,
    Literal(String),
    Prefix(String),
    Suffix(String),
    Contains(String),
    Regex(regex::Regex),
}

impl Condition {
    fn new(glob: &str) -> Condition {
        if glob == "*" {
            return Condition::Unconditional;
        }
        // Escapes and `?` always take the regex path; the fast paths below
        // only handle a single leading and/or trailing star.
        if glob.contains('\\') || glob.contains('?') {
            return Condition::Regex(segment_regex(glob));
        }

        let leading_star = glob.starts_with('*');
        let trailing_star = glob.len() > 1 && glob.ends_with('*');
        let core = &glob[leading_star as usize..glob.len() - trailing_star as usize];
        if core.contains('*') {
            return Condition::Regex(segment_regex(glob));
        }

        match (leading_star, trailing_star) {
            (false, false) => Condition::Literal(core.to_owned()),
            (false, true) => Condition::Prefix(core.to_owned()),
            (true, false) => Condition::Suffix(core.to_owned()),
            (true, true) => Condition::Contains(core.to_owned()),
        }
    }

    fn is_match(&self, candidate: &str) -> bool {
        match self {
            Condition::Unconditional => true,
            Condition::Literal(literal) => literal == candidate,
            Condition::Prefix(prefix) => candidate.starts_with(prefix.as_str()),
            Condition::Suffix(suffix) => candidate.ends_with(suffix.as_str()),
            Condition::Contains(needle) => {
                memchr::memmem::find(candidate.as_bytes(), needle.as_bytes()).is_some()
            }
            Condition::Regex(regex) => regex.is_match(candidate),
        }
    }
}

fn segment_regex(glob: &str) -> regex::Regex {
    let mut regex = String::with_capacity(glob.len() + 8);
    regex.push_str(r"\A");
    let mut chars = glob.chars();
    while let Some(c) = chars.next() {
        match c {
            '*' => regex.push_str("[^/]*"),
            '?' => regex.push_str("[^/]"),
            '\\' => {
                if let Some(escaped) = chars.next() {
                    if regex_syntax::is_meta_character(escaped) {
                        regex.push('\\');
                    }
                    regex.push(escaped);
                }
            }
            _ => {
                if regex_syntax::is_meta_character(c) {
                    regex.push('\\');
                }
                regex.push(c);
            }
        }
    }
    regex.push_str(r"\z");
    regex::Regex::new(&regex).unwrap_or_else(|_| panic!("invalid segment regex: {}", regex))
}
