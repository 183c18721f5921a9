//! Entity resolution: link extracted fields to a shop's directory through
//! ordered matching cascades. Pure functions over an immutable snapshot.

pub mod types;
pub mod cascade;

pub use types::*;
pub use cascade::*;
