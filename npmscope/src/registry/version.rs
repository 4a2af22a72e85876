//! Loose version parsing and best-match selection.
//!
//! This is deliberately not a semver range solver. A specifier is reduced to
//! a single target version and the packument is searched for the closest
//! published version sharing its major.

use std::cmp::Ordering;
use std::fmt;

use super::types::Packument;

/// A `major.minor.patch[-pre]` version with lenient parsing.
///
/// Missing components are zero (`1` is `1.0.0`), `x`/`X`/`*` components are
/// wildcards that also read as zero, a leading `v` or `=` is ignored and build
/// metadata after `+` is dropped.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct LooseVersion {
    pub major: u64,
    pub minor: u64,
    pub patch: u64,
    pub pre: Option<String>,
}

impl LooseVersion {
    pub fn new(major: u64, minor: u64, patch: u64) -> Self {
        Self {
            major,
            minor,
            patch,
            pre: None,
        }
    }

    /// Parses a published version key. Wildcards are rejected.
    pub fn parse(text: &str) -> Option<Self> {
        Self::parse_inner(text, false)
    }

    /// Parses a target token taken from a range, accepting wildcards.
    pub fn parse_target(text: &str) -> Option<Self> {
        Self::parse_inner(text, true)
    }

    fn parse_inner(text: &str, allow_wildcards: bool) -> Option<Self> {
        let text = text.trim().trim_start_matches(['v', '=']);
        let text = text.split('+').next().unwrap_or_default();

        let (core, pre) = match text.split_once('-') {
            Some((core, pre)) if !pre.is_empty() => (core, Some(pre.to_string())),
            Some(_) => return None,
            None => (text, None),
        };

        let mut parts = [0u64; 3];
        let mut count = 0;
        for (i, part) in core.split('.').enumerate() {
            if i >= 3 {
                return None;
            }
            parts[i] = match part {
                "x" | "X" | "*" if allow_wildcards => 0,
                _ if !part.is_empty() && part.bytes().all(|b| b.is_ascii_digit()) => {
                    part.parse().ok()?
                }
                _ => return None,
            };
            count += 1;
        }
        if count == 0 {
            return None;
        }

        Some(Self {
            major: parts[0],
            minor: parts[1],
            patch: parts[2],
            pre,
        })
    }

    pub fn is_prerelease(&self) -> bool {
        self.pre.is_some()
    }
}

impl fmt::Display for LooseVersion {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}.{}.{}", self.major, self.minor, self.patch)?;
        if let Some(pre) = &self.pre {
            write!(f, "-{}", pre)?;
        }
        Ok(())
    }
}

impl Ord for LooseVersion {
    fn cmp(&self, other: &Self) -> Ordering {
        (self.major, self.minor, self.patch)
            .cmp(&(other.major, other.minor, other.patch))
            .then_with(|| match (&self.pre, &other.pre) {
                (None, None) => Ordering::Equal,
                (None, Some(_)) => Ordering::Greater,
                (Some(_), None) => Ordering::Less,
                (Some(a), Some(b)) => compare_prerelease(a, b),
            })
    }
}

impl PartialOrd for LooseVersion {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

/// Dot-separated identifiers; numeric ones compare numerically and sort
/// before alphanumeric ones.
fn compare_prerelease(a: &str, b: &str) -> Ordering {
    let mut left = a.split('.');
    let mut right = b.split('.');
    loop {
        match (left.next(), right.next()) {
            (None, None) => return Ordering::Equal,
            (None, Some(_)) => return Ordering::Less,
            (Some(_), None) => return Ordering::Greater,
            (Some(x), Some(y)) => {
                let ord = match (x.parse::<u64>(), y.parse::<u64>()) {
                    (Ok(x), Ok(y)) => x.cmp(&y),
                    (Ok(_), Err(_)) => Ordering::Less,
                    (Err(_), Ok(_)) => Ordering::Greater,
                    (Err(_), Err(_)) => x.cmp(y),
                };
                if ord != Ordering::Equal {
                    return ord;
                }
            }
        }
    }
}

/// What a registry specifier asks for once range syntax is stripped.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum VersionTarget {
    /// Empty, `*`, `x` or `latest`.
    Latest,
    /// A non-numeric token such as `next` or `beta`.
    Tag(String),
    /// A concrete target. `raw` is the token as written, used for the exact lookup.
    Version { raw: String, version: LooseVersion },
}

/// Picks the published version key that best satisfies `target`.
///
/// Returns `None` only when no key parses as a version and no usable
/// `latest` tag exists.
pub fn select_version(packument: &Packument, target: &VersionTarget) -> Option<String> {
    match target {
        VersionTarget::Latest => latest_or_highest(packument),
        VersionTarget::Tag(tag) => packument
            .tagged_version(tag)
            .map(str::to_string)
            .or_else(|| latest_or_highest(packument)),
        VersionTarget::Version { raw, version } => {
            if packument.versions.contains_key(raw) {
                return Some(raw.clone());
            }
            let normalized = version.to_string();
            if packument.versions.contains_key(&normalized) {
                return Some(normalized);
            }
            best_match(packument, version).or_else(|| latest_or_highest(packument))
        }
    }
}

/// Lowest published version with the same major and `(minor, patch)` at or
/// above the target's. A stable release wins over prereleases of the same
/// `major.minor.patch`.
fn best_match(packument: &Packument, target: &LooseVersion) -> Option<String> {
    packument
        .version_keys()
        .filter_map(|key| LooseVersion::parse(key).map(|v| (key, v)))
        .filter(|(_, v)| v.major == target.major)
        .filter(|(_, v)| (v.minor, v.patch) >= (target.minor, target.patch))
        .min_by(|(_, a), (_, b)| {
            (a.major, a.minor, a.patch, a.is_prerelease())
                .cmp(&(b.major, b.minor, b.patch, b.is_prerelease()))
                .then_with(|| a.cmp(b))
        })
        .map(|(key, _)| key.to_string())
}

fn latest_or_highest(packument: &Packument) -> Option<String> {
    if let Some(latest) = packument.tagged_version("latest") {
        return Some(latest.to_string());
    }
    highest(packument)
}

/// Numerically highest published version.
fn highest(packument: &Packument) -> Option<String> {
    packument
        .version_keys()
        .filter_map(|key| LooseVersion::parse(key).map(|v| (key, v)))
        .max_by(|(_, a), (_, b)| a.cmp(b))
        .map(|(key, _)| key.to_string())
}
