//! Error taxonomy of the structure engine.

use std::fmt;

use thiserror::Error;

use crate::boolean::KernelError;

/// Kind of entity a UID was expected to name.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum EntityKind {
    SparPosition,
    SparSegment,
    RibsDefinition,
    SectionElement,
    WingReference,
    /// Any structural entity, when the kind is not known up front.
    Entity,
}

impl fmt::Display for EntityKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            EntityKind::SparPosition => "spar position",
            EntityKind::SparSegment => "spar segment",
            EntityKind::RibsDefinition => "ribs definition",
            EntityKind::SectionElement => "section element",
            EntityKind::WingReference => "wing structure reference",
            EntityKind::Entity => "entity",
        };
        f.write_str(name)
    }
}

#[derive(Debug, Error)]
pub enum Error {
    /// A UID reference does not resolve.
    #[error("{kind} \"{uid}\" not found")]
    NotFound { kind: EntityKind, uid: String },

    /// A 1-based index outside `[1, count]`.
    #[error("{what} index {index} out of range [1, {count}]")]
    Index { what: &'static str, index: usize, count: usize },

    /// The definition produces no valid geometry.
    #[error("geometry of \"{uid}\" is inconsistent: {reason}")]
    Geometry { uid: String, reason: String },

    /// The declarative definition is incomplete or contradictory.
    #[error("invalid definition of \"{uid}\": {reason}")]
    Config { uid: String, reason: String },

    #[error(transparent)]
    Kernel(#[from] KernelError),

    #[error("malformed structure description: {0}")]
    Json(#[from] serde_json::Error),
}

impl Error {
    pub fn not_found(kind: EntityKind, uid: impl Into<String>) -> Self {
        Error::NotFound { kind, uid: uid.into() }
    }

    pub fn geometry(uid: impl Into<String>, reason: impl fmt::Display) -> Self {
        Error::Geometry { uid: uid.into(), reason: reason.to_string() }
    }

    pub fn config(uid: impl Into<String>, reason: impl fmt::Display) -> Self {
        Error::Config { uid: uid.into(), reason: reason.to_string() }
    }

    /// Check a 1-based index.
    pub fn check_index(what: &'static str, index: usize, count: usize) -> Result<usize> {
        if index == 0 || index > count {
            return Err(Error::Index { what, index, count });
        }
        Ok(index - 1)
    }
}

pub type Result<T> = std::result::Result<T, Error>;

/// Attach an entity UID to kernel failures.
pub(crate) trait GeometryContext<T> {
    fn in_entity(self, uid: &str) -> Result<T>;
}

impl<T> GeometryContext<T> for std::result::Result<T, KernelError> {
    fn in_entity(self, uid: &str) -> Result<T> {
        self.map_err(|e| Error::geometry(uid, e))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn index_check_is_one_based() {
        assert_eq!(Error::check_index("rib", 1, 3).unwrap(), 0);
        assert_eq!(Error::check_index("rib", 3, 3).unwrap(), 2);
        assert!(matches!(Error::check_index("rib", 0, 3), Err(Error::Index { index: 0, .. })));
        assert!(matches!(Error::check_index("rib", 4, 3), Err(Error::Index { count: 3, .. })));
    }

    #[test]
    fn messages_carry_uid() {
        let e = Error::not_found(EntityKind::SparSegment, "spar1");
        assert_eq!(e.to_string(), "spar segment \"spar1\" not found");
        let e = KernelError::OpenWire;
        let wrapped: Result<()> = Err::<(), _>(e).in_entity("rib1");
        assert!(wrapped.unwrap_err().to_string().contains("rib1"));
    }
}
