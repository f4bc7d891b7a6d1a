//! Platform snowflake identifiers.
//!
//! Discord ids are 64-bit unsigned integers; PostgreSQL stores them as
//! signed bigints, hence the `to_db`/`from_db` pair.

use serde::{Deserialize, Serialize};

macro_rules! snowflake {
    ($(#[$meta:meta])* $name:ident) => {
        $(#[$meta])*
        #[derive(
            Debug,
            Clone,
            Copy,
            PartialEq,
            Eq,
            PartialOrd,
            Ord,
            Hash,
            Serialize,
            Deserialize,
            derive_more::Display,
            derive_more::From,
        )]
        #[serde(transparent)]
        pub struct $name(u64);

        impl $name {
            /// Wrap a raw snowflake.
            pub const fn new(id: u64) -> Self {
                Self(id)
            }

            /// The raw snowflake.
            pub const fn get(self) -> u64 {
                self.0
            }

            /// Bit-preserving conversion to a database bigint.
            pub const fn to_db(self) -> i64 {
                self.0 as i64
            }

            /// Inverse of [`Self::to_db`].
            pub const fn from_db(id: i64) -> Self {
                Self(id as u64)
            }
        }

        impl std::str::FromStr for $name {
            type Err = std::num::ParseIntError;

            fn from_str(s: &str) -> Result<Self, Self::Err> {
                s.parse::<u64>().map(Self)
            }
        }
    };
}

snowflake!(
    /// A guild (server).
    GuildId
);
snowflake!(
    /// A text channel.
    ChannelId
);
snowflake!(
    /// A message.
    MessageId
);
snowflake!(
    /// A user or guild member.
    UserId
);
snowflake!(
    /// A role.
    RoleId
);

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_db_round_trip_preserves_high_bit() {
        let id = GuildId::new(u64::MAX - 7);
        assert!(id.to_db() < 0);
        assert_eq!(GuildId::from_db(id.to_db()), id);
    }

    #[test]
    fn test_parse_and_display() {
        let role: RoleId = "567819334852804626".parse().unwrap();
        assert_eq!(role.to_string(), "567819334852804626");
        assert!("abc".parse::<RoleId>().is_err());
    }
}
