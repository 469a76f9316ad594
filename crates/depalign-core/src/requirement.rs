//! Requirements on the platform runtime, e.g. `react-native@>=0.66`

use serde::{Deserialize, Deserializer, Serialize, Serializer};

use crate::error::RangeError;
use crate::range::VersionRange;

/// A package name paired with the version range it must satisfy
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Requirement {
    /// Package name, possibly scoped
    pub package: String,
    /// Required range
    pub range: VersionRange,
}

impl Requirement {
    /// Create a requirement from parts
    pub fn new(package: impl Into<String>, range: VersionRange) -> Self {
        Self {
            package: package.into(),
            range,
        }
    }

    /// Parse `name@range`. The name may be scoped (`@scope/pkg@1.0`).
    pub fn parse(requirement: &str) -> Result<Self, RangeError> {
        let trimmed = requirement.trim();
        let separator = trimmed
            .char_indices()
            .skip(1)
            .find(|(_, c)| *c == '@')
            .map(|(i, _)| i)
            .ok_or_else(|| RangeError::InvalidRequirement(requirement.to_string()))?;

        let (package, range) = (&trimmed[..separator], &trimmed[separator + 1..]);
        if package.is_empty() {
            return Err(RangeError::InvalidRequirement(requirement.to_string()));
        }
        if range.trim().is_empty() {
            return Err(RangeError::InvalidRange(range.to_string()));
        }

        Ok(Self {
            package: package.to_string(),
            range: VersionRange::parse(range)?,
        })
    }

    /// Parse a list of requirements, failing on the first invalid one
    pub fn parse_all<S: AsRef<str>>(requirements: &[S]) -> Result<Vec<Self>, RangeError> {
        requirements
            .iter()
            .map(|r| Self::parse(r.as_ref()))
            .collect()
    }
}

impl std::fmt::Display for Requirement {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}@{}", self.package, self.range)
    }
}

impl std::str::FromStr for Requirement {
    type Err = RangeError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

impl Serialize for Requirement {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

impl<'de> Deserialize<'de> for Requirement {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let raw = String::deserialize(deserializer)?;
        Self::parse(&raw).map_err(serde::de::Error::custom)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_requirement() {
        let req = Requirement::parse("react-native@>=0.66").unwrap();
        assert_eq!(req.package, "react-native");
        assert_eq!(req.range.as_str(), ">=0.66");
        assert_eq!(req.to_string(), "react-native@>=0.66");
    }

    #[test]
    fn test_parse_scoped_requirement() {
        let req = Requirement::parse("@react-native/core@^0.73 || ^0.74").unwrap();
        assert_eq!(req.package, "@react-native/core");
        assert_eq!(req.range.as_str(), "^0.73 || ^0.74");
    }

    #[test]
    fn test_invalid_requirements() {
        assert!(matches!(
            Requirement::parse("react-native"),
            Err(RangeError::InvalidRequirement(_))
        ));
        assert!(matches!(
            Requirement::parse("@scope/pkg"),
            Err(RangeError::InvalidRequirement(_))
        ));
        assert!(matches!(
            Requirement::parse("react-native@"),
            Err(RangeError::InvalidRange(_))
        ));
        assert!(matches!(
            Requirement::parse("react-native@latest"),
            Err(RangeError::InvalidRange(_))
        ));
    }

    #[test]
    fn test_deserialize_requirement() {
        let reqs: Vec<Requirement> =
            serde_json::from_str(r#"["react-native@0.73", "react@^18.2.0"]"#).unwrap();
        assert_eq!(reqs.len(), 2);
        assert_eq!(reqs[1].package, "react");

        let err = serde_json::from_str::<Vec<Requirement>>(r#"["react-native"]"#);
        assert!(err.is_err());
    }
}
