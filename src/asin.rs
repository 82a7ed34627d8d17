//! The ASIN identifier type.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Number of characters in an ASIN.
pub const ASIN_LEN: usize = 10;

/// A 10-character alphanumeric product code, always uppercase.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct Asin(String);

/// Reasons a candidate string is not an ASIN.
#[derive(Debug, Clone, PartialEq)]
pub enum AsinError {
    WrongLength(usize),
    InvalidCharacter(char),
}

impl fmt::Display for AsinError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AsinError::WrongLength(len) => {
                write!(f, "expected {} characters, found {}", ASIN_LEN, len)
            }
            AsinError::InvalidCharacter(c) => write!(f, "invalid character '{}'", c),
        }
    }
}

impl std::error::Error for AsinError {}

impl Asin {
    /// Parse a raw candidate, trimming whitespace and uppercasing it.
    pub fn parse(raw: &str) -> Result<Self, AsinError> {
        let normalized = raw.trim().to_ascii_uppercase();
        let len = normalized.chars().count();
        if len != ASIN_LEN {
            return Err(AsinError::WrongLength(len));
        }
        if let Some(bad) = normalized.chars().find(|c| !c.is_ascii_alphanumeric()) {
            return Err(AsinError::InvalidCharacter(bad));
        }
        Ok(Self(normalized))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for Asin {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl FromStr for Asin {
    type Err = AsinError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

impl TryFrom<String> for Asin {
    type Error = AsinError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::parse(&value)
    }
}

impl From<Asin> for String {
    fn from(asin: Asin) -> Self {
        asin.0
    }
}

impl AsRef<str> for Asin {
    fn as_ref(&self) -> &str {
        &self.0
    }
}
