//! npm-style version ranges
//!
//! Ranges in `package.json` follow npm semantics, which differ from Cargo's
//! `VersionReq`: a bare `0.66.0` is an exact pin, alternatives are joined with
//! `||`, comparators are space separated and `1.2.3 - 2.0` is a hyphen range.
//! Each range is normalized into a union of intervals over `semver::Version`
//! so intersection and subset checks are exact.

use std::cmp::Ordering;
use std::fmt;
use std::sync::LazyLock;

use regex::Regex;
use semver::{Prerelease, Version};

use crate::error::RangeError;

static COMPARATOR_REGEX: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(
        r"^(?P<op><=|>=|<|>|=|\^|~>|~)?v?(?P<major>\d+|[xX*])(?:\.(?P<minor>\d+|[xX*]))?(?:\.(?P<patch>\d+|[xX*]))?(?:-(?P<pre>[0-9A-Za-z.-]+))?(?:\+[0-9A-Za-z.-]+)?$",
    )
    .expect("Invalid regex")
});

#[derive(Debug, Clone, PartialEq, Eq)]
enum Bound {
    Unbounded,
    Inclusive(Version),
    Exclusive(Version),
}

fn cmp_lower(a: &Bound, b: &Bound) -> Ordering {
    match (a, b) {
        (Bound::Unbounded, Bound::Unbounded) => Ordering::Equal,
        (Bound::Unbounded, _) => Ordering::Less,
        (_, Bound::Unbounded) => Ordering::Greater,
        (Bound::Inclusive(x), Bound::Inclusive(y)) | (Bound::Exclusive(x), Bound::Exclusive(y)) => {
            x.cmp(y)
        }
        (Bound::Inclusive(x), Bound::Exclusive(y)) => x.cmp(y).then(Ordering::Less),
        (Bound::Exclusive(x), Bound::Inclusive(y)) => x.cmp(y).then(Ordering::Greater),
    }
}

fn cmp_upper(a: &Bound, b: &Bound) -> Ordering {
    match (a, b) {
        (Bound::Unbounded, Bound::Unbounded) => Ordering::Equal,
        (Bound::Unbounded, _) => Ordering::Greater,
        (_, Bound::Unbounded) => Ordering::Less,
        (Bound::Inclusive(x), Bound::Inclusive(y)) | (Bound::Exclusive(x), Bound::Exclusive(y)) => {
            x.cmp(y)
        }
        (Bound::Inclusive(x), Bound::Exclusive(y)) => x.cmp(y).then(Ordering::Greater),
        (Bound::Exclusive(x), Bound::Inclusive(y)) => x.cmp(y).then(Ordering::Less),
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
struct Interval {
    lower: Bound,
    upper: Bound,
}

impl Interval {
    fn any() -> Self {
        Self {
            lower: Bound::Unbounded,
            upper: Bound::Unbounded,
        }
    }

    fn is_empty(&self) -> bool {
        match (&self.lower, &self.upper) {
            (Bound::Unbounded, _) | (_, Bound::Unbounded) => false,
            (Bound::Inclusive(lo), Bound::Inclusive(hi)) => lo > hi,
            (Bound::Inclusive(lo), Bound::Exclusive(hi))
            | (Bound::Exclusive(lo), Bound::Inclusive(hi))
            | (Bound::Exclusive(lo), Bound::Exclusive(hi)) => lo >= hi,
        }
    }

    fn intersect(&self, other: &Interval) -> Option<Interval> {
        let lower = if cmp_lower(&self.lower, &other.lower) == Ordering::Less {
            other.lower.clone()
        } else {
            self.lower.clone()
        };
        let upper = if cmp_upper(&self.upper, &other.upper) == Ordering::Greater {
            other.upper.clone()
        } else {
            self.upper.clone()
        };
        let interval = Interval { lower, upper };
        (!interval.is_empty()).then_some(interval)
    }

    fn contains(&self, inner: &Interval) -> bool {
        cmp_lower(&self.lower, &inner.lower) != Ordering::Greater
            && cmp_upper(&self.upper, &inner.upper) != Ordering::Less
    }

    fn matches(&self, version: &Version) -> bool {
        let above = match &self.lower {
            Bound::Unbounded => true,
            Bound::Inclusive(lo) => version >= lo,
            Bound::Exclusive(lo) => version > lo,
        };
        let below = match &self.upper {
            Bound::Unbounded => true,
            Bound::Inclusive(hi) => version <= hi,
            Bound::Exclusive(hi) => version < hi,
        };
        above && below
    }

    /// Whether `next` (which starts at or after `self`) overlaps or touches `self`
    fn connects(&self, next: &Interval) -> bool {
        match (&self.upper, &next.lower) {
            (Bound::Unbounded, _) | (_, Bound::Unbounded) => true,
            (Bound::Exclusive(hi), Bound::Exclusive(lo)) => hi > lo,
            (Bound::Exclusive(hi), Bound::Inclusive(lo))
            | (Bound::Inclusive(hi), Bound::Exclusive(lo))
            | (Bound::Inclusive(hi), Bound::Inclusive(lo)) => hi >= lo,
        }
    }
}

impl fmt::Display for Interval {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if let (Bound::Inclusive(lo), Bound::Inclusive(hi)) = (&self.lower, &self.upper) {
            if lo == hi {
                return write!(f, "{}", lo);
            }
        }
        let mut parts = Vec::new();
        match &self.lower {
            Bound::Unbounded => {}
            Bound::Inclusive(v) => parts.push(format!(">={}", v)),
            Bound::Exclusive(v) => parts.push(format!(">{}", v)),
        }
        match &self.upper {
            Bound::Unbounded => {}
            Bound::Inclusive(v) => parts.push(format!("<={}", v)),
            Bound::Exclusive(v) => parts.push(format!("<{}", v)),
        }
        if parts.is_empty() {
            write!(f, "*")
        } else {
            write!(f, "{}", parts.join(" "))
        }
    }
}

/// A partially specified version, e.g. `1`, `1.2`, `1.2.x` or `1.2.3-rc.1`
#[derive(Debug, Clone, Copy)]
struct Partial<'a> {
    major: Option<u64>,
    minor: Option<u64>,
    patch: Option<u64>,
    pre: Option<&'a str>,
}

impl<'a> Partial<'a> {
    fn parse(text: &'a str, raw: &str) -> Result<(Option<&'a str>, Self), RangeError> {
        let caps = COMPARATOR_REGEX
            .captures(text)
            .ok_or_else(|| RangeError::InvalidRange(raw.to_string()))?;
        let number = |name: &str| -> Result<Option<u64>, RangeError> {
            match caps.name(name).map(|m| m.as_str()) {
                None | Some("x") | Some("X") | Some("*") => Ok(None),
                Some(digits) => digits
                    .parse::<u64>()
                    .map(Some)
                    .map_err(|_| RangeError::InvalidRange(raw.to_string())),
            }
        };
        let mut partial = Partial {
            major: number("major")?,
            minor: number("minor")?,
            patch: number("patch")?,
            pre: caps.name("pre").map(|m| m.as_str()),
        };
        // `1.x.3` is treated as `1.x`
        if partial.major.is_none() {
            partial.minor = None;
        }
        if partial.minor.is_none() {
            partial.patch = None;
        }
        Ok((caps.name("op").map(|m| m.as_str()), partial))
    }

    fn floor(&self) -> Version {
        let mut version = Version::new(
            self.major.unwrap_or(0),
            self.minor.unwrap_or(0),
            self.patch.unwrap_or(0),
        );
        if self.patch.is_some() {
            if let Some(pre) = self.pre {
                version.pre = Prerelease::new(pre).unwrap_or(Prerelease::EMPTY);
            }
        }
        version
    }

    /// Exclusive upper bound covering every version this partial matches
    fn ceiling(&self) -> Option<Version> {
        match (self.major, self.minor, self.patch) {
            (None, _, _) => None,
            (Some(major), None, _) => Some(lowest(major + 1, 0, 0)),
            (Some(major), Some(minor), None) => Some(lowest(major, minor + 1, 0)),
            (Some(_), Some(_), Some(_)) => None,
        }
    }

    fn is_complete(&self) -> bool {
        self.patch.is_some()
    }
}

/// Lowest version with the given core, i.e. `major.minor.patch-0`
fn lowest(major: u64, minor: u64, patch: u64) -> Version {
    let mut version = Version::new(major, minor, patch);
    version.pre = Prerelease::new("0").unwrap_or(Prerelease::EMPTY);
    version
}

fn comparator_interval(op: Option<&str>, partial: Partial<'_>) -> Interval {
    let Some(major) = partial.major else {
        return match op {
            Some("<") | Some(">") => Interval {
                lower: Bound::Exclusive(Version::new(0, 0, 0)),
                upper: Bound::Exclusive(Version::new(0, 0, 0)),
            },
            _ => Interval::any(),
        };
    };
    let floor = Bound::Inclusive(partial.floor());

    match op {
        None | Some("=") => Interval {
            lower: floor,
            upper: match partial.ceiling() {
                Some(ceiling) => Bound::Exclusive(ceiling),
                None => Bound::Inclusive(partial.floor()),
            },
        },
        Some("^") => {
            let ceiling = match (major, partial.minor, partial.patch) {
                (0, None, _) => lowest(1, 0, 0),
                (0, Some(0), None) => lowest(0, 1, 0),
                (0, Some(0), Some(patch)) => lowest(0, 0, patch + 1),
                (0, Some(minor), _) => lowest(0, minor + 1, 0),
                (major, _, _) => lowest(major + 1, 0, 0),
            };
            Interval {
                lower: floor,
                upper: Bound::Exclusive(ceiling),
            }
        }
        Some("~") | Some("~>") => {
            let ceiling = match partial.minor {
                None => lowest(major + 1, 0, 0),
                Some(minor) => lowest(major, minor + 1, 0),
            };
            Interval {
                lower: floor,
                upper: Bound::Exclusive(ceiling),
            }
        }
        Some(">") => Interval {
            lower: match partial.ceiling() {
                Some(ceiling) => Bound::Inclusive(Version::new(
                    ceiling.major,
                    ceiling.minor,
                    ceiling.patch,
                )),
                None => Bound::Exclusive(partial.floor()),
            },
            upper: Bound::Unbounded,
        },
        Some(">=") => Interval {
            lower: floor,
            upper: Bound::Unbounded,
        },
        Some("<") => Interval {
            lower: Bound::Unbounded,
            upper: if partial.is_complete() {
                Bound::Exclusive(partial.floor())
            } else {
                Bound::Exclusive(lowest(
                    major,
                    partial.minor.unwrap_or(0),
                    partial.patch.unwrap_or(0),
                ))
            },
        },
        Some("<=") => Interval {
            lower: Bound::Unbounded,
            upper: match partial.ceiling() {
                Some(ceiling) => Bound::Exclusive(ceiling),
                None => Bound::Inclusive(partial.floor()),
            },
        },
        Some(_) => Interval::any(),
    }
}

/// Split a comparator set into tokens, gluing dangling operators (`>= 1.2`) to their operand
fn tokenize(set: &str) -> Vec<String> {
    let mut tokens: Vec<String> = Vec::new();
    let mut pending: Option<String> = None;
    for word in set.split_whitespace() {
        if let Some(op) = pending.take() {
            tokens.push(format!("{}{}", op, word));
        } else if matches!(word, "<" | ">" | "<=" | ">=" | "=" | "^" | "~" | "~>") {
            pending = Some(word.to_string());
        } else {
            tokens.push(word.to_string());
        }
    }
    if let Some(op) = pending {
        tokens.push(op);
    }
    tokens
}

fn parse_set(set: &str, raw: &str) -> Result<Option<Interval>, RangeError> {
    let set = set.trim();
    if set.is_empty() {
        return Ok(Some(Interval::any()));
    }

    if let Some((from, to)) = set.split_once(" - ") {
        let (from_op, from) = Partial::parse(from.trim(), raw)?;
        let (to_op, to) = Partial::parse(to.trim(), raw)?;
        if from_op.is_some() || to_op.is_some() {
            return Err(RangeError::InvalidRange(raw.to_string()));
        }
        let lower = match from.major {
            None => Bound::Unbounded,
            Some(_) => Bound::Inclusive(from.floor()),
        };
        let upper = match to.major {
            None => Bound::Unbounded,
            Some(_) => match to.ceiling() {
                Some(ceiling) => Bound::Exclusive(ceiling),
                None => Bound::Inclusive(to.floor()),
            },
        };
        let interval = Interval { lower, upper };
        return Ok((!interval.is_empty()).then_some(interval));
    }

    let mut current = Interval::any();
    for token in tokenize(set) {
        let (op, partial) = Partial::parse(&token, raw)?;
        match current.intersect(&comparator_interval(op, partial)) {
            Some(next) => current = next,
            None => return Ok(None),
        }
    }
    Ok(Some(current))
}

fn normalize(mut intervals: Vec<Interval>) -> Vec<Interval> {
    intervals.sort_by(|a, b| cmp_lower(&a.lower, &b.lower));
    let mut merged: Vec<Interval> = Vec::with_capacity(intervals.len());
    for interval in intervals {
        match merged.last_mut() {
            Some(last) if last.connects(&interval) => {
                if cmp_upper(&interval.upper, &last.upper) == Ordering::Greater {
                    last.upper = interval.upper;
                }
            }
            _ => merged.push(interval),
        }
    }
    merged
}

/// A parsed npm version range
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VersionRange {
    raw: String,
    intervals: Vec<Interval>,
}

impl VersionRange {
    /// Parse an npm version range such as `^0.73.0`, `0.66` or `>=1.2 <2 || 3.x`
    pub fn parse(input: &str) -> Result<Self, RangeError> {
        let raw = input.trim();
        let mut intervals = Vec::new();
        for set in raw.split("||") {
            if let Some(interval) = parse_set(set, raw)? {
                intervals.push(interval);
            }
        }
        Ok(Self {
            raw: raw.to_string(),
            intervals: normalize(intervals),
        })
    }

    /// The range as written
    pub fn as_str(&self) -> &str {
        &self.raw
    }

    /// Whether no version can satisfy the range
    pub fn is_empty(&self) -> bool {
        self.intervals.is_empty()
    }

    /// Whether the version satisfies the range
    pub fn matches(&self, version: &Version) -> bool {
        self.intervals.iter().any(|i| i.matches(version))
    }

    /// Whether at least one version satisfies both ranges
    pub fn intersects(&self, other: &VersionRange) -> bool {
        self.intervals
            .iter()
            .any(|a| other.intervals.iter().any(|b| a.intersect(b).is_some()))
    }

    /// Whether every version satisfying `self` also satisfies `other`
    pub fn is_subset_of(&self, other: &VersionRange) -> bool {
        self.intervals
            .iter()
            .all(|inner| other.intervals.iter().any(|outer| outer.contains(inner)))
    }

    /// The range satisfied by both, or `None` if they do not intersect.
    ///
    /// When one range is a subset of the other, the narrower one is returned
    /// as written.
    pub fn intersect(&self, other: &VersionRange) -> Option<VersionRange> {
        if self.is_subset_of(other) {
            return (!self.is_empty()).then(|| self.clone());
        }
        if other.is_subset_of(self) {
            return (!other.is_empty()).then(|| other.clone());
        }

        let intervals: Vec<Interval> = self
            .intervals
            .iter()
            .flat_map(|a| other.intervals.iter().filter_map(move |b| a.intersect(b)))
            .collect();
        if intervals.is_empty() {
            return None;
        }

        let composable = |raw: &str| !raw.contains("||") && !raw.contains(" - ");
        let raw = if composable(&self.raw) && composable(&other.raw) {
            format!("{} {}", self.raw, other.raw)
        } else {
            intervals
                .iter()
                .map(|i| i.to_string())
                .collect::<Vec<_>>()
                .join(" || ")
        };
        Some(Self {
            raw,
            intervals: normalize(intervals),
        })
    }

    /// Lowest version satisfying the range
    pub fn min_version(&self) -> Option<Version> {
        let first = self.intervals.first()?;
        match &first.lower {
            Bound::Unbounded => Some(Version::new(0, 0, 0)),
            Bound::Inclusive(v) => Some(v.clone()),
            Bound::Exclusive(v) => {
                if v.pre.is_empty() {
                    Some(Version::new(v.major, v.minor, v.patch + 1))
                } else {
                    Some(Version::new(v.major, v.minor, v.patch))
                }
            }
        }
    }
}

impl fmt::Display for VersionRange {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.raw)
    }
}

impl std::str::FromStr for VersionRange {
    type Err = RangeError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

/// Compare two version specifiers the way npm tooling does.
///
/// Returns `None` when either side is not a semver range (`workspace:*`,
/// git URLs, dist-tags); callers fall back to string equality.
pub fn parse_pair(a: &str, b: &str) -> Option<(VersionRange, VersionRange)> {
    Some((VersionRange::parse(a).ok()?, VersionRange::parse(b).ok()?))
}

/// Reduce a range to `major.minor` per alternative, e.g. `^0.73.4 || 0.74.1` -> `0.73 || 0.74`
pub fn drop_patch(range: &str) -> Result<String, RangeError> {
    let mut versions: Vec<String> = Vec::new();
    for set in range.split("||") {
        let parsed = VersionRange::parse(set)?;
        let min = parsed
            .min_version()
            .ok_or_else(|| RangeError::InvalidRange(range.to_string()))?;
        let short = format!("{}.{}", min.major, min.minor);
        if !versions.contains(&short) {
            versions.push(short);
        }
    }
    Ok(versions.join(" || "))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn v(s: &str) -> Version {
        Version::parse(s).unwrap()
    }

    fn r(s: &str) -> VersionRange {
        VersionRange::parse(s).unwrap()
    }

    #[test]
    fn test_bare_version_is_exact() {
        let range = r("0.66.0");
        assert!(range.matches(&v("0.66.0")));
        assert!(!range.matches(&v("0.66.1")));
    }

    #[test]
    fn test_partial_versions() {
        let range = r("0.66");
        assert!(range.matches(&v("0.66.0")));
        assert!(range.matches(&v("0.66.9")));
        assert!(!range.matches(&v("0.67.0")));

        let range = r("18");
        assert!(range.matches(&v("18.2.0")));
        assert!(!range.matches(&v("19.0.0")));
    }

    #[test]
    fn test_caret() {
        assert!(r("^1.2.3").matches(&v("1.9.0")));
        assert!(!r("^1.2.3").matches(&v("2.0.0")));
        assert!(r("^0.73.0").matches(&v("0.73.6")));
        assert!(!r("^0.73.0").matches(&v("0.74.0")));
        assert!(r("^0.0.3").matches(&v("0.0.3")));
        assert!(!r("^0.0.3").matches(&v("0.0.4")));
    }

    #[test]
    fn test_tilde() {
        assert!(r("~1.2.3").matches(&v("1.2.9")));
        assert!(!r("~1.2.3").matches(&v("1.3.0")));
        assert!(r("~1").matches(&v("1.9.9")));
    }

    #[test]
    fn test_comparators_and_alternatives() {
        let range = r(">=0.76 <0.81");
        assert!(range.matches(&v("0.80.2")));
        assert!(!range.matches(&v("0.81.0")));

        let range = r(">= 0.76 < 0.81");
        assert!(range.matches(&v("0.76.0")));

        let range = r("^0.73.0 || ^0.74.0");
        assert!(range.matches(&v("0.73.1")));
        assert!(range.matches(&v("0.74.1")));
        assert!(!range.matches(&v("0.75.0")));
    }

    #[test]
    fn test_hyphen_range() {
        let range = r("1.2.3 - 2.3");
        assert!(range.matches(&v("1.2.3")));
        assert!(range.matches(&v("2.3.9")));
        assert!(!range.matches(&v("2.4.0")));
    }

    #[test]
    fn test_wildcards() {
        assert!(r("*").matches(&v("99.0.0")));
        assert!(r("").matches(&v("0.0.1")));
        assert!(r("1.x").matches(&v("1.5.0")));
        assert!(!r("1.x").matches(&v("2.0.0")));
    }

    #[test]
    fn test_invalid_ranges() {
        assert!(VersionRange::parse("latest").is_err());
        assert!(VersionRange::parse("workspace:*").is_err());
        assert!(VersionRange::parse("github:owner/repo").is_err());
    }

    #[test]
    fn test_intersects() {
        assert!(!r("^26.0.0").intersects(&r("^27.0.0")));
        assert!(r("^0.73.0").intersects(&r("0.73")));
        assert!(r(">=0.66.4").intersects(&r("^0.66.0")));
        assert!(!r("^0.81.0").intersects(&r(">=0.76 <0.81")));
    }

    #[test]
    fn test_subset() {
        assert!(r("^0.73.2").is_subset_of(&r("^0.73.0")));
        assert!(!r("^0.73.0").is_subset_of(&r("^0.73.2")));
        assert!(r("^0.73.0").is_subset_of(&r("^0.72.0 || ^0.73.0")));
        assert!(r("0.66.0").is_subset_of(&r("0.66")));
    }

    #[test]
    fn test_intersect_picks_narrower_range() {
        let narrowed = r("^1.2.0").intersect(&r("^1.4.0")).unwrap();
        assert_eq!(narrowed.as_str(), "^1.4.0");

        let narrowed = r(">=1.2.0").intersect(&r("<1.5.0")).unwrap();
        assert_eq!(narrowed.as_str(), ">=1.2.0 <1.5.0");
        assert!(narrowed.matches(&v("1.4.0")));
        assert!(!narrowed.matches(&v("1.5.0")));

        assert!(r("^26.0.0").intersect(&r("^27.0.0")).is_none());
    }

    #[test]
    fn test_intersect_with_hyphen_range() {
        let narrowed = r("1.2.3 - 2.3").intersect(&r(">=1.5.0")).unwrap();
        assert!(!narrowed.as_str().contains(" - "));

        let reparsed = r(narrowed.as_str());
        assert!(reparsed.matches(&v("1.5.0")));
        assert!(reparsed.matches(&v("2.3.9")));
        assert!(!reparsed.matches(&v("1.4.9")));
        assert!(!reparsed.matches(&v("2.4.0")));
        assert!(reparsed.is_subset_of(&narrowed) && narrowed.is_subset_of(&reparsed));
    }

    #[test]
    fn test_min_version() {
        assert_eq!(r("^0.73.4").min_version(), Some(v("0.73.4")));
        assert_eq!(r(">1.2.3").min_version(), Some(v("1.2.4")));
        assert_eq!(r("*").min_version(), Some(v("0.0.0")));
    }

    #[test]
    fn test_drop_patch() {
        assert_eq!(drop_patch("^0.73.4").unwrap(), "0.73");
        assert_eq!(drop_patch("0.72.1 || ^0.73.0").unwrap(), "0.72 || 0.73");
        assert!(drop_patch("latest").is_err());
    }
}
