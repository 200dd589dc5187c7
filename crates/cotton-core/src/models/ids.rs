//! Server-assigned numeric identifiers

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

macro_rules! numeric_id {
    ($(#[$meta:meta])* $name:ident) => {
        $(#[$meta])*
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
        #[serde(transparent)]
        pub struct $name(i64);

        impl $name {
            /// Wrap a raw server id
            #[must_use]
            pub const fn new(raw: i64) -> Self {
                Self(raw)
            }

            /// Raw numeric value
            #[must_use]
            pub const fn get(self) -> i64 {
                self.0
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                write!(f, "{}", self.0)
            }
        }

        impl FromStr for $name {
            type Err = std::num::ParseIntError;

            fn from_str(s: &str) -> Result<Self, Self::Err> {
                Ok(Self(s.trim().parse()?))
            }
        }
    };
}

numeric_id!(
    /// Identifier of a conversation
    GroupId
);
numeric_id!(
    /// Identifier of a user account
    UserId
);
numeric_id!(
    /// Identifier of a timeline post
    PostId
);
numeric_id!(
    /// Server-assigned message id; `-1` marks a message the server has not acknowledged
    MessageId
);

impl MessageId {
    /// Placeholder id carried by optimistic messages
    pub const UNCONFIRMED: Self = Self(-1);

    /// Whether this id was assigned by the server
    #[must_use]
    pub const fn is_confirmed(self) -> bool {
        self.0 != Self::UNCONFIRMED.0
    }
}
