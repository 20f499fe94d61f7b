use std::fmt;

use serde::{Deserialize, Serialize};

macro_rules! id_newtype {
    ($(#[$meta:meta])* $name:ident) => {
        $(#[$meta])*
        #[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
        pub struct $name(pub u32);

        impl $name {
            #[inline]
            pub fn index(self) -> usize {
                self.0 as usize
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                write!(f, "{}", self.0)
            }
        }

        impl From<u32> for $name {
            fn from(raw: u32) -> Self {
                Self(raw)
            }
        }
    };
}

id_newtype!(
    /// Identifies a charge (a batch of molten steel), `1..N`.
    ChargeId
);
id_newtype!(
    /// Identifies a production stage, `1..H`. The last stage is the continuous-casting stage.
    StageId
);
id_newtype!(
    /// Identifies a machine. Each machine belongs to exactly one stage.
    MachineId
);
id_newtype!(
    /// Identifies a cast: a group of charges processed contiguously on the same caster.
    CastId
);
