use std::{fmt, str::FromStr};

use uuid::Uuid;

macro_rules! define_id {
    ($(#[$meta:meta])* $name:ident) => {
        $(#[$meta])*
        #[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
        #[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
        #[cfg_attr(feature = "serde", serde(transparent))]
        pub struct $name(pub Uuid);

        impl Default for $name {
            fn default() -> Self {
                Self::new()
            }
        }

        impl $name {
            pub fn new() -> Self {
                Self(Uuid::now_v7())
            }

            pub const fn from_uuid(id: Uuid) -> Self {
                Self(id)
            }

            pub fn as_uuid(&self) -> &Uuid {
                &self.0
            }

            pub fn to_uuid(self) -> Uuid {
                self.0
            }
        }

        impl AsRef<Uuid> for $name {
            fn as_ref(&self) -> &Uuid {
                &self.0
            }
        }

        impl From<Uuid> for $name {
            fn from(id: Uuid) -> Self {
                Self(id)
            }
        }

        impl From<$name> for Uuid {
            fn from(id: $name) -> Self {
                id.0
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                write!(f, "{}", self.0)
            }
        }

        impl FromStr for $name {
            type Err = uuid::Error;

            fn from_str(s: &str) -> Result<Self, Self::Err> {
                Uuid::parse_str(s.trim()).map(Self)
            }
        }
    };
}

define_id!(
    /// Tenant (school or client organisation) owning vehicles and records.
    TenantId
);
define_id!(
    /// Transport unit. Also the partition key for location history.
    VehicleId
);
define_id!(StudentId);
define_id!(AssetId);
define_id!(
    /// Any authenticated person: drivers, assistants, parents, clients.
    UserId
);
define_id!(ManifestEntryId);
define_id!(LocationSampleId);
define_id!(PanicEventId);

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_with_surrounding_whitespace() {
        let raw = Uuid::now_v7();
        let parsed: VehicleId = format!("  {raw} ").parse().unwrap();
        assert_eq!(parsed.to_uuid(), raw);
    }

    #[test]
    fn new_ids_are_distinct() {
        assert_ne!(PanicEventId::new(), PanicEventId::new());
    }
}
