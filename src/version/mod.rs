//! Gem dependency token grammar and version ordering.
//!
//! A dependency token is `NAME` optionally followed by an operator and a
//! version: `gemA`, `gemA==1.2.3`, `gemA~=2.1`. Operators are `==`, `>=`,
//! `<=`, `>`, `<` and `~=`; versions are dotted sequences of non-negative
//! integers, padded to three components for [`semver::Version`] ordering.
//!
//! Parsing emits a structured predicate ([`Constraint`]) rather than a
//! closure, so callers can report which clause failed and tests can assert
//! on the parsed shape.
//!
//! A gem without a `version` field orders below every explicit version and
//! compares equal to `0.0.0` when a predicate is evaluated against it.

use std::fmt;

use anyhow::Result;
use semver::Version;

use crate::core::O3deError;

/// Comparison operators accepted in a dependency token.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SpecifierOp {
    /// `==` exact version
    Exact,
    /// `>=`
    GreaterEq,
    /// `<=`
    LessEq,
    /// `>`
    Greater,
    /// `<`
    Less,
    /// `~=` compatible release: same series, at least the given version
    Compatible,
}

impl SpecifierOp {
    const fn as_str(self) -> &'static str {
        match self {
            Self::Exact => "==",
            Self::GreaterEq => ">=",
            Self::LessEq => "<=",
            Self::Greater => ">",
            Self::Less => "<",
            Self::Compatible => "~=",
        }
    }
}

impl fmt::Display for SpecifierOp {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A structured version predicate: operator, target version, and how many
/// dotted components the token actually spelled out.
///
/// The component count matters only for `~=`: `~=1.2` pins the `1.x` series
/// while `~=1.2.3` pins `1.2.x`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Constraint {
    /// The comparison operator
    pub op: SpecifierOp,
    /// Target version, padded to three components
    pub version: Version,
    /// Number of components spelled out in the token (2 or 3 for `~=`)
    pub precision: usize,
}

impl Constraint {
    /// Evaluate the predicate against a candidate version.
    #[must_use]
    pub fn matches(&self, candidate: &Version) -> bool {
        match self.op {
            SpecifierOp::Exact => candidate == &self.version,
            SpecifierOp::GreaterEq => candidate >= &self.version,
            SpecifierOp::LessEq => candidate <= &self.version,
            SpecifierOp::Greater => candidate > &self.version,
            SpecifierOp::Less => candidate < &self.version,
            SpecifierOp::Compatible => {
                if candidate < &self.version {
                    return false;
                }
                if self.precision == 2 {
                    candidate.major == self.version.major
                } else {
                    candidate.major == self.version.major && candidate.minor == self.version.minor
                }
            }
        }
    }
}

impl fmt::Display for Constraint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}{}", self.op, self.version)
    }
}

/// A parsed dependency token: gem name plus optional constraint.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GemSpecifier {
    /// The gem name part of the token
    pub name: String,
    /// The version predicate, absent for a bare `NAME`
    pub constraint: Option<Constraint>,
}

impl GemSpecifier {
    /// Parse a dependency token.
    ///
    /// # Errors
    ///
    /// Returns [`O3deError::InvalidVersionSpecifier`] when the token has an
    /// empty name, an empty or malformed version, a single-component `~=`
    /// clause, or trailing garbage.
    pub fn parse(token: &str) -> Result<Self> {
        let token = token.trim();
        if token.is_empty() {
            return Err(invalid(token, "empty token"));
        }

        // Two-character operators first so ">=" is not read as ">" "=".
        const OPS: [(&str, SpecifierOp); 6] = [
            ("==", SpecifierOp::Exact),
            (">=", SpecifierOp::GreaterEq),
            ("<=", SpecifierOp::LessEq),
            ("~=", SpecifierOp::Compatible),
            (">", SpecifierOp::Greater),
            ("<", SpecifierOp::Less),
        ];

        let mut split: Option<(usize, &str, SpecifierOp)> = None;
        for (symbol, op) in OPS {
            if let Some(idx) = token.find(symbol) {
                let better = match split {
                    Some((found, existing, _)) => {
                        idx < found || (idx == found && symbol.len() > existing.len())
                    }
                    None => true,
                };
                if better {
                    split = Some((idx, symbol, op));
                }
            }
        }

        let Some((idx, symbol, op)) = split else {
            return Ok(Self { name: validated_name(token, token)?, constraint: None });
        };

        let name = validated_name(token[..idx].trim(), token)?;
        let version_str = token[idx + symbol.len()..].trim();
        let (version, precision) = parse_dotted_version(version_str, token)?;

        if op == SpecifierOp::Compatible && precision < 2 {
            return Err(invalid(token, "'~=' requires at least two version components"));
        }

        Ok(Self { name, constraint: Some(Constraint { op, version, precision }) })
    }

    /// Whether `candidate` satisfies this specifier's constraint.
    ///
    /// A bare `NAME` accepts every candidate.
    #[must_use]
    pub fn matches(&self, candidate: &Version) -> bool {
        self.constraint.as_ref().is_none_or(|c| c.matches(candidate))
    }
}

impl fmt::Display for GemSpecifier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.constraint {
            Some(constraint) => write!(f, "{}{}", self.name, constraint),
            None => f.write_str(&self.name),
        }
    }
}

fn invalid(token: &str, reason: &str) -> anyhow::Error {
    O3deError::InvalidVersionSpecifier { token: token.to_string(), reason: reason.to_string() }
        .into()
}

fn validated_name(name: &str, token: &str) -> Result<String> {
    if name.is_empty() {
        return Err(invalid(token, "missing gem name"));
    }
    Ok(name.to_string())
}

/// Parse a dotted-integer version string into a padded [`Version`] plus the
/// number of components that were actually given.
///
/// Accepts one to three components; more than three is rejected because the
/// ordering domain is semver.
pub fn parse_dotted_version(version: &str, token: &str) -> Result<(Version, usize)> {
    if version.is_empty() {
        return Err(invalid(token, "missing version after operator"));
    }

    let components: Vec<&str> = version.split('.').collect();
    if components.len() > 3 {
        return Err(invalid(token, "more than three version components"));
    }

    let mut parts = [0u64; 3];
    for (i, component) in components.iter().enumerate() {
        parts[i] = component
            .parse::<u64>()
            .map_err(|_| invalid(token, "version components must be non-negative integers"))?;
    }

    Ok((Version::new(parts[0], parts[1], parts[2]), components.len()))
}

/// Parse a descriptor's `version` field for ordering.
///
/// Descriptor versions follow the same dotted-integer form as specifier
/// versions.
pub fn parse_gem_version(version: &str) -> Result<Version> {
    parse_dotted_version(version.trim(), version).map(|(v, _)| v)
}

/// The sentinel version a version-less gem compares as.
#[must_use]
pub fn sentinel_version() -> Version {
    Version::new(0, 0, 0)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn v(s: &str) -> Version {
        parse_gem_version(s).unwrap()
    }

    #[test]
    fn test_parse_bare_name() {
        let spec = GemSpecifier::parse("gemA").unwrap();
        assert_eq!(spec.name, "gemA");
        assert!(spec.constraint.is_none());
        assert!(spec.matches(&v("0.0.1")));
    }

    #[test]
    fn test_parse_each_operator() {
        for (token, op) in [
            ("gemA==1.2.3", SpecifierOp::Exact),
            ("gemA>=1.2.3", SpecifierOp::GreaterEq),
            ("gemA<=1.2.3", SpecifierOp::LessEq),
            ("gemA>1.2.3", SpecifierOp::Greater),
            ("gemA<1.2.3", SpecifierOp::Less),
            ("gemA~=1.2.3", SpecifierOp::Compatible),
        ] {
            let spec = GemSpecifier::parse(token).unwrap();
            assert_eq!(spec.name, "gemA");
            assert_eq!(spec.constraint.as_ref().unwrap().op, op, "token {token}");
        }
    }

    #[test]
    fn test_parse_pads_short_versions() {
        let spec = GemSpecifier::parse("gemB>=2").unwrap();
        assert_eq!(spec.constraint.unwrap().version, Version::new(2, 0, 0));

        let spec = GemSpecifier::parse("gemB==1.5").unwrap();
        assert_eq!(spec.constraint.unwrap().version, Version::new(1, 5, 0));
    }

    #[test]
    fn test_parse_allows_whitespace_around_operator() {
        let spec = GemSpecifier::parse("gemA >= 1.0.0").unwrap();
        assert_eq!(spec.name, "gemA");
        assert_eq!(spec.constraint.unwrap().op, SpecifierOp::GreaterEq);
    }

    #[test]
    fn test_parse_rejects_bad_tokens() {
        for token in ["==1.0.0", "gemA==", "gemA==x.y", "gemA==1.2.3.4", "gemA~=2", ""] {
            let err = GemSpecifier::parse(token).unwrap_err();
            assert!(
                err.downcast_ref::<O3deError>().is_some(),
                "expected typed error for {token:?}"
            );
        }
    }

    #[test]
    fn test_exact_and_relational_matching() {
        let spec = GemSpecifier::parse("gemA==1.2.3").unwrap();
        assert!(spec.matches(&v("1.2.3")));
        assert!(!spec.matches(&v("1.2.4")));

        let spec = GemSpecifier::parse("gemA>1.0").unwrap();
        assert!(spec.matches(&v("1.0.1")));
        assert!(!spec.matches(&v("1.0.0")));

        let spec = GemSpecifier::parse("gemA<=2").unwrap();
        assert!(spec.matches(&v("2.0.0")));
        assert!(!spec.matches(&v("2.0.1")));
    }

    #[test]
    fn test_compatible_release_two_components() {
        // ~=1.2 pins the 1.x series at or above 1.2.0
        let spec = GemSpecifier::parse("gemA~=1.2").unwrap();
        assert!(spec.matches(&v("1.2.0")));
        assert!(spec.matches(&v("1.9.9")));
        assert!(!spec.matches(&v("1.1.9")));
        assert!(!spec.matches(&v("2.0.0")));
    }

    #[test]
    fn test_compatible_release_three_components() {
        // ~=1.2.3 pins the 1.2.x series at or above 1.2.3
        let spec = GemSpecifier::parse("gemA~=1.2.3").unwrap();
        assert!(spec.matches(&v("1.2.3")));
        assert!(spec.matches(&v("1.2.9")));
        assert!(!spec.matches(&v("1.3.0")));
        assert!(!spec.matches(&v("1.2.2")));
    }

    #[test]
    fn test_sentinel_orders_below_everything() {
        assert!(sentinel_version() < v("0.0.1"));
        assert_eq!(sentinel_version(), v("0"));
    }

    #[test]
    fn test_display_round_trips() {
        for token in ["gemA", "gemA==1.2.3", "gemA~=1.2.0"] {
            let spec = GemSpecifier::parse(token).unwrap();
            assert_eq!(GemSpecifier::parse(&spec.to_string()).unwrap(), spec);
        }
    }
}
