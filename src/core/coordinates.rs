//! Maven coordinates of a single published artifact

use crate::core::error::DeployError;
use std::fmt;
use std::str::FromStr;

/// `group:artifact:version` triple
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Coordinates {
    group: String,
    artifact: String,
    version: String,
}

impl Coordinates {
    pub fn new(
        group: impl Into<String>,
        artifact: impl Into<String>,
        version: impl Into<String>,
    ) -> Self {
        Self {
            group: group.into(),
            artifact: artifact.into(),
            version: version.into(),
        }
    }

    /// Parse `group:artifact:version`, failing unless there are exactly 3 parts
    pub fn parse(input: &str) -> Result<Self, DeployError> {
        let parts: Vec<&str> = input.split(':').collect();
        match parts.as_slice() {
            [group, artifact, version] => Ok(Self::new(*group, *artifact, *version)),
            _ => Err(DeployError::InvalidCoordinates {
                input: input.to_string(),
                parts: parts.len(),
            }),
        }
    }

    pub fn group(&self) -> &str {
        &self.group
    }

    pub fn artifact(&self) -> &str {
        &self.artifact
    }

    pub fn version(&self) -> &str {
        &self.version
    }

    /// Repository path of the main jar, relative to a Maven repository root
    pub fn jar_path(&self) -> String {
        format!(
            "{}/{}/{}/{}-{}.jar",
            self.group.replace('.', "/"),
            self.artifact,
            self.version,
            self.artifact,
            self.version
        )
    }
}

impl FromStr for Coordinates {
    type Err = DeployError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

impl fmt::Display for Coordinates {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}:{}", self.group, self.artifact, self.version)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_valid_coordinates() {
        let coordinates = Coordinates::parse("io.spring.test:demo:1.2.3").unwrap();

        assert_eq!(coordinates.group(), "io.spring.test");
        assert_eq!(coordinates.artifact(), "demo");
        assert_eq!(coordinates.version(), "1.2.3");
    }

    #[test]
    fn test_display_round_trips() {
        let input = "io.spring.test:demo:1.2.3-SNAPSHOT";
        let coordinates: Coordinates = input.parse().unwrap();

        assert_eq!(coordinates.to_string(), input);
    }

    #[test]
    fn test_parse_rejects_wrong_part_counts() {
        for (input, parts) in [("demo", 1), ("io.spring:demo", 2), ("a:b:c:d", 4), ("", 1)] {
            match Coordinates::parse(input) {
                Err(DeployError::InvalidCoordinates { parts: actual, .. }) => {
                    assert_eq!(actual, parts, "input '{input}'")
                }
                other => panic!("expected InvalidCoordinates for '{input}', got {other:?}"),
            }
        }
    }

    #[test]
    fn test_jar_path() {
        let coordinates = Coordinates::new("io.github.example", "widget", "0.0.5");

        assert_eq!(
            coordinates.jar_path(),
            "io/github/example/widget/0.0.5/widget-0.0.5.jar"
        );
    }
}
