//! Heuristic field extraction from repair-order text.
//!
//! One declarative table (`rules::FIELD_TABLE`) lists, per field, an ordered
//! set of (pattern, normalizer) rules and a selection policy. A single
//! generic loop (`extractor`) evaluates the table. Every field is optional:
//! no match is a normal outcome, never an error.

pub mod validators;
pub mod rules;
pub mod extractor;

pub use validators::*;
pub use rules::{ExtractContext, FieldKind, FieldValue, Selection};
pub use extractor::*;
