//! Conversions from a generated mesh into external model formats. These are
//! feature-gated, so only the formats you need get compiled in.

#[cfg(feature = "stl")]
pub mod stl;
