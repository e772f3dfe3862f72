//! Subject positions for relational constraints.

use crate::types::SubjectId;

/// Where a subject currently is.
#[derive(Debug, Clone, PartialEq)]
pub struct Location {
    pub world: String,
    pub x: f64,
    pub y: f64,
    pub z: f64,
}

impl Location {
    pub fn new(world: impl Into<String>, x: f64, y: f64, z: f64) -> Self {
        Self {
            world: world.into(),
            x,
            y,
            z,
        }
    }

    /// Euclidean distance, or `None` across worlds.
    pub fn distance(&self, other: &Location) -> Option<f64> {
        if self.world != other.world {
            return None;
        }
        let (dx, dy, dz) = (self.x - other.x, self.y - other.y, self.z - other.z);
        Some((dx * dx + dy * dy + dz * dz).sqrt())
    }
}

/// Looks up subject locations for same-world and max-distance checks.
///
/// Supplied by the host runtime. Returning `None` (unknown or offline
/// subject) fails any constraint that needs the location.
pub trait SubjectLocator: Send + Sync {
    fn locate(&self, subject: SubjectId) -> Option<Location>;
}

impl<F> SubjectLocator for F
where
    F: Fn(SubjectId) -> Option<Location> + Send + Sync,
{
    fn locate(&self, subject: SubjectId) -> Option<Location> {
        self(subject)
    }
}
