use std::fmt;

use serde::{Deserialize, Serialize};
use uuid::Uuid;

macro_rules! define_id {
    ($name:ident) => {
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
        pub struct $name(Uuid);

        impl $name {
            pub fn new() -> Self {
                Self(Uuid::new_v4())
            }

            pub fn from_uuid(uuid: Uuid) -> Self {
                Self(uuid)
            }

            pub fn as_uuid(&self) -> &Uuid {
                &self.0
            }

            pub fn to_uuid(self) -> Uuid {
                self.0
            }
        }

        impl Default for $name {
            fn default() -> Self {
                Self::new()
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                write!(f, "{}", self.0)
            }
        }

        impl From<Uuid> for $name {
            fn from(value: Uuid) -> Self {
                Self(value)
            }
        }

        impl From<$name> for Uuid {
            fn from(value: $name) -> Self {
                value.0
            }
        }
    };
}

// Shared record IDs
define_id!(MessageId);
define_id!(ActorId);

// Session participant IDs
define_id!(UserId);

/// Opaque reference to a world entity, in `Kind.<uuid>` form.
///
/// Transitions receive these from the caller and hand them to the entity
/// resolver; the engine never assumes anything about the string beyond the
/// `Actor.` prefix it knows how to resolve.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct TargetRef(String);

impl TargetRef {
    pub fn new(raw: impl Into<String>) -> Self {
        Self(raw.into())
    }

    pub fn actor(id: ActorId) -> Self {
        Self(format!("Actor.{id}"))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Parses the `Actor.<uuid>` form. Any other kind yields `None`.
    pub fn actor_id(&self) -> Option<ActorId> {
        let raw = self.0.strip_prefix("Actor.")?;
        Uuid::parse_str(raw).ok().map(ActorId::from_uuid)
    }
}

impl fmt::Display for TargetRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}
