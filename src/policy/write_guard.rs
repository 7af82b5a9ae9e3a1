//! Gmail write-operation guard.
//!
//! Read traffic passes untouched. Write methods are tested against a fixed
//! table of Gmail API path shapes; the table is plain data so it can be
//! inspected and tested apart from the matching logic.

use regex::Regex;

use crate::error::{Error, Result};

/// API prefix the rule table is compiled under by default.
pub const GMAIL_API_PREFIX: &str = "/gmail/v1";

/// Methods treated as potentially state-changing.
pub const WRITE_METHODS: [&str; 4] = ["POST", "DELETE", "PUT", "PATCH"];

/// Placeholder for one path segment in [`WriteRuleSpec::pattern`].
const ID: &str = "{id}";

/// How a rule's pattern relates to the end of the path.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Exactness {
    /// Names a single resource by ID; only matches at the end of the path
    /// and only fires for DELETE.
    Exact,
    /// Names a sub-path or action; matches anywhere in the path and fires
    /// for every write method.
    SubPath,
}

/// Declarative description of one blocked operation.
#[derive(Debug, Clone, Copy)]
pub struct WriteRuleSpec {
    /// Path shape relative to the API prefix; `{id}` stands for one or more
    /// non-slash characters.
    pub pattern: &'static str,
    pub exactness: Exactness,
}

const fn sub_path(pattern: &'static str) -> WriteRuleSpec {
    WriteRuleSpec {
        pattern,
        exactness: Exactness::SubPath,
    }
}

const fn exact(pattern: &'static str) -> WriteRuleSpec {
    WriteRuleSpec {
        pattern,
        exactness: Exactness::Exact,
    }
}

/// Blocked Gmail write operations, in evaluation order.
pub const GMAIL_WRITE_RULES: &[WriteRuleSpec] = &[
    sub_path("/users/{id}/messages/send"),
    exact("/users/{id}/messages/{id}"),
    sub_path("/users/{id}/messages/{id}/trash"),
    sub_path("/users/{id}/messages/batchDelete"),
    exact("/users/{id}/threads/{id}"),
    sub_path("/users/{id}/threads/{id}/trash"),
    exact("/users/{id}/drafts/{id}"),
    sub_path("/users/{id}/drafts/send"),
];

/// Check whether `method` is one of the write methods. Case-sensitive.
pub fn is_write_method(method: &str) -> bool {
    WRITE_METHODS.contains(&method)
}

/// A rule compiled for matching
#[derive(Debug, Clone)]
pub struct WritePatternRule {
    spec: WriteRuleSpec,
    regex: Regex,
}

impl WritePatternRule {
    /// Compile a rule under the given API prefix
    pub fn compile(prefix: &str, spec: WriteRuleSpec) -> Result<Self> {
        let mut source = String::new();
        for (i, literal) in format!("{}{}", prefix, spec.pattern)
            .split(ID)
            .enumerate()
        {
            if i > 0 {
                source.push_str("[^/]+");
            }
            source.push_str(&regex::escape(literal));
        }
        if spec.exactness == Exactness::Exact {
            source.push('$');
        }

        let regex = Regex::new(&source)
            .map_err(|e| Error::pattern(format!("{}: {}", spec.pattern, e)))?;
        Ok(Self { spec, regex })
    }

    /// Check whether the pattern occurs in `path`
    pub fn matches(&self, path: &str) -> bool {
        self.regex.is_match(path)
    }

    /// Whether a match actually blocks `method`. Exact rules only block DELETE.
    pub fn fires_for(&self, method: &str) -> bool {
        match self.spec.exactness {
            Exactness::Exact => method == "DELETE",
            Exactness::SubPath => true,
        }
    }

    pub fn pattern(&self) -> &'static str {
        self.spec.pattern
    }

    pub fn exactness(&self) -> Exactness {
        self.spec.exactness
    }

    /// The compiled regular expression source
    pub fn regex(&self) -> &str {
        self.regex.as_str()
    }
}

/// Blocks the enumerated Gmail write operations
#[derive(Debug, Clone)]
pub struct WriteGuard {
    rules: Vec<WritePatternRule>,
}

impl WriteGuard {
    /// Compile the Gmail rule table under the default `/gmail/v1` prefix
    pub fn gmail() -> Result<Self> {
        Self::with_prefix(GMAIL_API_PREFIX)
    }

    /// Compile the Gmail rule table under another API prefix
    pub fn with_prefix(prefix: &str) -> Result<Self> {
        Self::from_specs(prefix, GMAIL_WRITE_RULES)
    }

    pub fn from_specs(prefix: &str, specs: &[WriteRuleSpec]) -> Result<Self> {
        let rules = specs
            .iter()
            .map(|spec| WritePatternRule::compile(prefix, *spec))
            .collect::<Result<Vec<_>>>()?;
        Ok(Self { rules })
    }

    /// A guard with no rules; blocks nothing
    pub fn disabled() -> Self {
        Self { rules: Vec::new() }
    }

    /// Check whether `method` on `path` is a blocked write
    pub fn is_blocked(&self, method: &str, path: &str) -> bool {
        self.matching_rule(method, path).is_some()
    }

    /// The first rule that matches `path` and fires for `method`.
    ///
    /// An exact rule that matches a non-DELETE write is skipped, not treated
    /// as a miss: a later sub-path rule may still fire.
    pub fn matching_rule(&self, method: &str, path: &str) -> Option<&WritePatternRule> {
        if !is_write_method(method) {
            return None;
        }

        self.rules
            .iter()
            .find(|rule| rule.matches(path) && rule.fires_for(method))
    }

    pub fn rules(&self) -> &[WritePatternRule] {
        &self.rules
    }

    pub fn rule_count(&self) -> usize {
        self.rules.len()
    }
}
