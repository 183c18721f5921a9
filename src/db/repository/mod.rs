//! Repository layer: table-scoped database operations.
//!
//! `directory` reads (and, for seeding, writes) the shop directory tables.
//! `repair_order` owns the repair-order rows produced by intake.

mod directory;
mod repair_order;

pub use directory::*;
pub use repair_order::*;
