//! Translation between the wrapper's simplified API and the Dify API.
//!
//! The core of the wrapper: builds upstream payloads from inbound requests
//! and reshapes Dify responses into the simplified envelope. All translation
//! functions are pure (no I/O).

pub mod api_types;
pub mod dify_types;
pub mod request;
pub mod response;
