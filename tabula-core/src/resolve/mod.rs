//! Key and bus resolution.
//!
//! - `keys`: logical field name to source column, with sequence fallbacks
//! - `busses`: bus roles to physical bus names
//! - `similarity`: string similarity used by the fuzzy bus fallback
/// Bus role resolution.
pub mod busses;
/// Logical-to-physical key resolution and field lookup.
pub mod keys;
/// Ratcliff/Obershelp similarity ratio.
pub mod similarity;
