/// ID types for Curator entities
use serde::{Deserialize, Serialize};
use std::fmt;

/// Internal user identifier (database row id)
///
/// Distinct from the external streaming account id, which lives on
/// [`User::spotify_id`](crate::types::User).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct UserId(i64);

impl UserId {
    /// Wrap a raw row id
    pub const fn new(id: i64) -> Self {
        Self(id)
    }

    /// Get the raw row id
    pub const fn get(self) -> i64 {
        self.0
    }
}

impl fmt::Display for UserId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<i64> for UserId {
    fn from(id: i64) -> Self {
        Self(id)
    }
}
