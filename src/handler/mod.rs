//! Request handler module
//!
//! Routes requests to the login redirect endpoint and health probes.

pub mod router;

// Re-export main entry point
pub use router::handle_request;
