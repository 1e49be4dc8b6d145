//! Identifier newtypes.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Opaque validator identity.
///
/// Also the node's network identity: a validator votes under the same id the
/// network layer reports for it. Binding this identity to a cryptographic key
/// is layered above the consensus core.
#[derive(Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct ValidatorId(String);

impl ValidatorId {
    pub fn new(id: impl Into<String>) -> Self {
        ValidatorId(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for ValidatorId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl fmt::Debug for ValidatorId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "ValidatorId({})", self.0)
    }
}

impl From<&str> for ValidatorId {
    fn from(s: &str) -> Self {
        ValidatorId(s.to_string())
    }
}

impl From<String> for ValidatorId {
    fn from(s: String) -> Self {
        ValidatorId(s)
    }
}
