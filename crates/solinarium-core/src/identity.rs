//! User identities.
//!
//! Identities are provisioned by the account layer; the engine treats them as
//! opaque, stable strings and never creates or mutates them.

use std::{fmt, str::FromStr};

use serde::{Deserialize, Serialize};

use crate::{Error, Result};

/// An opaque, non-empty reference to a registered person.
#[derive(
  Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
)]
#[serde(try_from = "String", into = "String")]
pub struct UserId(String);

impl UserId {
  pub fn new(id: impl Into<String>) -> Result<Self> {
    let id = id.into();
    if id.trim().is_empty() {
      return Err(Error::InvalidUserId);
    }
    Ok(Self(id))
  }

  pub fn as_str(&self) -> &str { &self.0 }
}

impl fmt::Display for UserId {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    f.write_str(&self.0)
  }
}

impl AsRef<str> for UserId {
  fn as_ref(&self) -> &str { &self.0 }
}

impl FromStr for UserId {
  type Err = Error;

  fn from_str(s: &str) -> Result<Self> { Self::new(s) }
}

impl TryFrom<String> for UserId {
  type Error = Error;

  fn try_from(s: String) -> Result<Self> { Self::new(s) }
}

impl From<UserId> for String {
  fn from(id: UserId) -> Self { id.0 }
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn rejects_blank_ids() {
    assert!(matches!(UserId::new(""), Err(Error::InvalidUserId)));
    assert!(matches!(UserId::new("   "), Err(Error::InvalidUserId)));
  }

  #[test]
  fn deserialises_through_validation() {
    let id: UserId = serde_json::from_str("\"alice\"").unwrap();
    assert_eq!(id.as_str(), "alice");
    assert!(serde_json::from_str::<UserId>("\"\"").is_err());
  }
}
