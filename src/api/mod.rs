//! HTTP API: router, server lifecycle, shared context and error mapping.

pub mod endpoints;
pub mod error;
pub mod router;
pub mod server;
pub mod types;

pub use error::ApiError;
pub use router::api_router;
pub use server::{start_server, ApiServer};
pub use types::ApiContext;
