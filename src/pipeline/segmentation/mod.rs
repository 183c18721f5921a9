//! Document segmentation: one merged PDF in, one segment per repair order out.
//!
//! Boundaries come from header markers in page text (`markers`); each
//! boundary range is then cut out of the source PDF as a standalone
//! document (`split`).

pub mod markers;
pub mod split;
pub mod types;

pub use markers::*;
pub use split::*;
pub use types::*;
