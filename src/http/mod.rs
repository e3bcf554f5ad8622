//! HTTP protocol layer module
//!
//! Response builders, decoupled from the redirect logic.

pub mod response;

// Re-export commonly used types
pub use response::{
    build_404_response, build_405_response, build_health_response, build_options_response,
    build_redirect_response, with_server_name,
};
