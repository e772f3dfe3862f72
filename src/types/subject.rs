//! Subject identity.

use std::fmt;

use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Opaque identity of a subject (typically a player) a placeholder is
/// resolved for.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct SubjectId(Uuid);

impl SubjectId {
    pub const fn from_uuid(uuid: Uuid) -> Self {
        SubjectId(uuid)
    }

    /// A fresh random identity.
    pub fn random() -> Self {
        SubjectId(Uuid::new_v4())
    }

    pub const fn as_uuid(&self) -> &Uuid {
        &self.0
    }
}

impl From<Uuid> for SubjectId {
    fn from(uuid: Uuid) -> Self {
        SubjectId(uuid)
    }
}

impl fmt::Display for SubjectId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.0.fmt(f)
    }
}
