//! Domain identifier types with validation

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Partition identifier newtype wrapper
///
/// Identifies an independently-ordered substream of the broker source.
/// Event Hubs uses small decimal strings ("0", "1", ...) but any non-empty
/// string is accepted.
///
/// # Examples
///
/// ```
/// use vitalstream::domain::ids::PartitionId;
/// use std::str::FromStr;
///
/// let partition = PartitionId::from_str("3").unwrap();
/// assert_eq!(partition.as_str(), "3");
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct PartitionId(String);

impl PartitionId {
    /// Creates a new PartitionId
    ///
    /// Returns `Err` if the id is empty or contains a path separator, since the
    /// id becomes the last segment of a checkpoint blob name.
    pub fn new(id: impl Into<String>) -> Result<Self, String> {
        let id = id.into();
        if id.trim().is_empty() {
            return Err("Partition ID cannot be empty".to_string());
        }
        if id.contains('/') {
            return Err(format!("Partition ID cannot contain '/': {id}"));
        }
        Ok(Self(id))
    }

    /// Returns the partition id as a string slice
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Consumes self and returns the inner String
    pub fn into_inner(self) -> String {
        self.0
    }
}

impl fmt::Display for PartitionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl FromStr for PartitionId {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::new(s)
    }
}

impl TryFrom<String> for PartitionId {
    type Error = String;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::new(value)
    }
}

impl From<PartitionId> for String {
    fn from(id: PartitionId) -> Self {
        id.0
    }
}

impl AsRef<str> for PartitionId {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

impl std::borrow::Borrow<str> for PartitionId {
    fn borrow(&self) -> &str {
        &self.0
    }
}
