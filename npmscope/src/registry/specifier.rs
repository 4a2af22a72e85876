//! Version specifier classification.
//!
//! Turns a raw dependency-map value into one of three shapes: an external
//! reference that never touches the registry, an `npm:` alias, or a registry
//! lookup with a single target version.

use super::version::{LooseVersion, VersionTarget};

/// Schemes that point outside the registry.
const EXTERNAL_PREFIXES: &[&str] = &[
    "file:",
    "git+",
    "git:",
    "github:",
    "http://",
    "https://",
    "link:",
    "workspace:",
];

const ALIAS_PREFIX: &str = "npm:";

/// Classified version specifier.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SpecifierKind {
    /// Local path, VCS or tarball reference. Carries the raw specifier.
    External(String),
    /// `npm:other[@range]`; the range defaults to `latest`.
    Alias { name: String, spec: String },
    /// Regular registry lookup.
    Registry(VersionTarget),
}

impl SpecifierKind {
    /// Classifies a raw specifier.
    pub fn classify(spec: &str) -> Self {
        let spec = spec.trim();

        if EXTERNAL_PREFIXES.iter().any(|p| spec.starts_with(p)) {
            return Self::External(spec.to_string());
        }

        if let Some(rest) = spec.strip_prefix(ALIAS_PREFIX) {
            let (name, range) = split_alias(rest);
            return Self::Alias {
                name: name.to_string(),
                spec: if range.is_empty() {
                    "latest".to_string()
                } else {
                    range.to_string()
                },
            };
        }

        Self::Registry(parse_target(spec))
    }
}

/// Splits `name@range`, keeping the leading `@` of a scoped name.
fn split_alias(rest: &str) -> (&str, &str) {
    let search_from = usize::from(rest.starts_with('@'));
    match rest[search_from..].find('@') {
        Some(idx) => {
            let at = search_from + idx;
            (&rest[..at], &rest[at + 1..])
        }
        None => (rest, ""),
    }
}

/// Reduces a range expression to a single target.
///
/// Only the first alternative of `a || b` is considered, only the lower bound
/// of `a - b`, and only the first comparator of a compound range.
pub fn parse_target(spec: &str) -> VersionTarget {
    let first_alternative = spec.split("||").next().unwrap_or_default().trim();
    let lower_bound = first_alternative
        .split(" - ")
        .next()
        .unwrap_or_default()
        .trim();

    let token = lower_bound
        .trim_start_matches(|c: char| matches!(c, '^' | '~' | '>' | '<' | '=') || c.is_whitespace())
        .split_whitespace()
        .next()
        .unwrap_or_default()
        .trim_start_matches(['v', '=']);

    match token {
        "" | "*" | "x" | "X" | "latest" => VersionTarget::Latest,
        _ => match LooseVersion::parse_target(token) {
            Some(version) => VersionTarget::Version {
                raw: token.to_string(),
                version,
            },
            None => VersionTarget::Tag(token.to_string()),
        },
    }
}
