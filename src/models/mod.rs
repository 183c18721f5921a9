pub mod directory;
pub mod extracted;
pub mod repair_order;

pub use directory::*;
pub use extracted::*;
pub use repair_order::*;
