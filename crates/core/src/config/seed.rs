use derive_more::Display;
use fnv::FnvHasher;
use serde::{de::Visitor, Deserialize, Deserializer, Serialize, Serializer};
use std::{
    convert::TryInto,
    fmt,
    hash::{Hash, Hasher},
};

/// Seed for the RNG that drives height synthesis.
///
/// Accepted input, both from code and when deserializing:
/// - an integer that fits in `u64`, used directly
/// - a string that parses as a `u64`, used as that integer
/// - any other string, kept as-is and hashed into a `u64` when the RNG is
///   seeded
///
/// Anything else (negative or oversized numbers, floats, bools...) fails to
/// deserialize.
///
/// Seeds always serialize as a **string**. JSON and TOML can't reliably carry
/// a full 64-bit unsigned integer, and a stringified integer parses back into
/// the same `Int` seed.
#[derive(Clone, Debug, Display, PartialEq, Eq)]
pub enum Seed {
    Int(u64),
    Text(String),
}

impl Seed {
    /// Get the numeric form of this seed, for seeding an RNG
    pub fn to_u64(&self) -> u64 {
        match self {
            Self::Int(seed) => *seed,
            Self::Text(text) => {
                let mut hasher = FnvHasher::default();
                text.hash(&mut hasher);
                hasher.finish()
            }
        }
    }
}

impl From<u64> for Seed {
    fn from(seed: u64) -> Self {
        Self::Int(seed)
    }
}

impl From<&str> for Seed {
    fn from(seed: &str) -> Self {
        match seed.parse::<u64>() {
            Ok(seed) => Self::Int(seed),
            Err(_) => Self::Text(seed.into()),
        }
    }
}

impl Serialize for Seed {
    fn serialize<S: Serializer>(
        &self,
        serializer: S,
    ) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&self.to_string())
    }
}

impl<'de> Deserialize<'de> for Seed {
    fn deserialize<D: Deserializer<'de>>(
        deserializer: D,
    ) -> Result<Self, D::Error> {
        // Both ints and strings are allowed, so no type hint
        deserializer.deserialize_any(SeedVisitor)
    }
}

struct SeedVisitor;

/// Generate a visit method for an integer type. Anything that doesn't fit in
/// a `u64` is rejected.
macro_rules! visit_int {
    ($($fname:ident: $type:ty),* $(,)?) => {
        $(
            fn $fname<E: serde::de::Error>(
                self,
                value: $type,
            ) -> Result<Self::Value, E> {
                value.try_into().map(Seed::Int).map_err(|_| {
                    E::custom(format!("u64 out of range: {}", value))
                })
            }
        )*
    };
}

impl<'de> Visitor<'de> for SeedVisitor {
    type Value = Seed;

    fn expecting(&self, formatter: &mut fmt::Formatter) -> fmt::Result {
        formatter.write_str("a positive integer or string")
    }

    visit_int!(
        visit_u8: u8,
        visit_u16: u16,
        visit_u32: u32,
        visit_u64: u64,
        visit_u128: u128,
        visit_i8: i8,
        visit_i16: i16,
        visit_i32: i32,
        visit_i64: i64,
        visit_i128: i128,
    );

    fn visit_str<E: serde::de::Error>(
        self,
        value: &str,
    ) -> Result<Self::Value, E> {
        Ok(value.into())
    }
}
