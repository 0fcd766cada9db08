//! Typed identifiers for the planning domain.
//!
//! Every persisted entity gets its own newtype over the database primary
//! key so that ids cannot be mixed up across entity kinds.

use serde::{Deserialize, Serialize};

macro_rules! define_id {
    ($(#[$doc:meta])* $name:ident) => {
        $(#[$doc])*
        #[derive(
            Debug, Copy, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
        )]
        pub struct $name(pub i64);

        impl $name {
            pub fn new(value: i64) -> Self {
                $name(value)
            }

            pub fn value(&self) -> i64 {
                self.0
            }
        }

        impl std::fmt::Display for $name {
            fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
                write!(f, "{}", self.0)
            }
        }
    };
}

define_id!(
    /// Visit identifier.
    VisitId
);
define_id!(
    /// Cluster identifier.
    ClusterId
);
define_id!(
    /// Project identifier.
    ProjectId
);
define_id!(
    /// Researcher identifier.
    ResearcherId
);
define_id!(
    /// Species identifier.
    SpeciesId
);
define_id!(
    /// Survey function identifier.
    FunctionId
);
define_id!(
    /// Protocol identifier.
    ProtocolId
);
define_id!(
    /// Protocol visit window identifier.
    WindowId
);
define_id!(
    /// Activity event identifier.
    EventId
);
