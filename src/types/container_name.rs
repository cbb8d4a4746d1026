// ABOUTME: Validated stateful-container name.
// ABOUTME: Must be usable both as a runtime container name and as an image repository.

use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::fmt;
use thiserror::Error;

const MAX_LEN: usize = 63;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum ContainerNameError {
    #[error("container name cannot be empty")]
    Empty,

    #[error("container name exceeds maximum length of 63 characters")]
    TooLong,

    #[error("container name must start with a letter or digit")]
    BadStart,

    #[error("container name must be lowercase")]
    NotLowercase,

    #[error("invalid character in container name: '{0}'")]
    InvalidChar(char),

    #[error("invalid separator '{0}' in container name; use '.', '_', '__' or dashes")]
    BadSeparator(String),

    #[error("container name must end with a letter or digit")]
    BadEnd,
}

/// Name of a stateful container.
///
/// Snapshots are committed as `{name}:v{n}`, so the name follows the image
/// repository component grammar as well as the container name rules:
/// lowercase alphanumeric runs joined by `.`, `_`, `__` or one or more `-`.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ContainerName(String);

impl ContainerName {
    pub fn new(value: &str) -> Result<Self, ContainerNameError> {
        let Some(first) = value.chars().next() else {
            return Err(ContainerNameError::Empty);
        };

        if value.len() > MAX_LEN {
            return Err(ContainerNameError::TooLong);
        }

        if !first.is_ascii_alphanumeric() {
            return Err(ContainerNameError::BadStart);
        }

        let mut separator = String::new();
        for c in value.chars() {
            if c.is_ascii_uppercase() {
                return Err(ContainerNameError::NotLowercase);
            }
            if c.is_ascii_lowercase() || c.is_ascii_digit() {
                if !separator.is_empty() {
                    if !is_separator(&separator) {
                        return Err(ContainerNameError::BadSeparator(separator));
                    }
                    separator.clear();
                }
            } else if matches!(c, '-' | '_' | '.') {
                separator.push(c);
            } else {
                return Err(ContainerNameError::InvalidChar(c));
            }
        }
        if !separator.is_empty() {
            return Err(ContainerNameError::BadEnd);
        }

        Ok(Self(value.to_string()))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

fn is_separator(run: &str) -> bool {
    matches!(run, "." | "_" | "__") || run.chars().all(|c| c == '-')
}

impl fmt::Display for ContainerName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl std::str::FromStr for ContainerName {
    type Err = ContainerNameError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::new(s)
    }
}

impl Serialize for ContainerName {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        self.0.serialize(serializer)
    }
}

impl<'de> Deserialize<'de> for ContainerName {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let s = String::deserialize(deserializer)?;
        ContainerName::new(&s).map_err(serde::de::Error::custom)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn accepts_runtime_style_names() {
        for name in ["web", "db-1", "cache_2", "app.v2", "9lives", "a--b", "a__b"] {
            assert!(ContainerName::new(name).is_ok(), "{name} should be valid");
        }
    }

    #[test]
    fn rejects_uppercase() {
        assert_eq!(
            ContainerName::new("Web"),
            Err(ContainerNameError::NotLowercase)
        );
    }

    #[test]
    fn rejects_leading_separator() {
        assert_eq!(ContainerName::new("-web"), Err(ContainerNameError::BadStart));
        assert_eq!(ContainerName::new(".web"), Err(ContainerNameError::BadStart));
    }

    #[test]
    fn rejects_colon_and_slash() {
        assert_eq!(
            ContainerName::new("web:v1"),
            Err(ContainerNameError::InvalidChar(':'))
        );
        assert_eq!(
            ContainerName::new("a/b"),
            Err(ContainerNameError::InvalidChar('/'))
        );
    }

    #[test]
    fn rejects_trailing_separator() {
        for name in ["web-", "web.", "web_"] {
            assert_eq!(ContainerName::new(name), Err(ContainerNameError::BadEnd), "{name}");
        }
    }

    #[test]
    fn rejects_separators_outside_repository_grammar() {
        for (name, run) in [("a.-b", ".-"), ("a-.b", "-."), ("a___b", "___"), ("a..b", "..")] {
            assert_eq!(
                ContainerName::new(name),
                Err(ContainerNameError::BadSeparator(run.to_string())),
                "{name}"
            );
        }
    }

    #[test]
    fn rejects_overlong() {
        let long = "a".repeat(64);
        assert_eq!(ContainerName::new(&long), Err(ContainerNameError::TooLong));
    }
}
