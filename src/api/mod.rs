//! Intake HTTP API.
//!
//! Thin axum layer over the pipeline: multipart uploads in, batch reports
//! and repair-order URLs out. Routes are nested under `/api/`.
//!
//! The router is composable: `intake_router()` returns a `Router` that can
//! be mounted on any axum server instance.

pub mod endpoints;
pub mod error;
pub mod router;
pub mod server;
pub mod types;

pub use router::intake_router;
pub use server::{start_intake_server, IntakeServer, ServerSession};
pub use types::ApiContext;
