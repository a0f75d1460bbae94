pub mod config;
pub mod cors;
pub mod error;
pub mod logging;
pub mod relay;
pub mod server;
pub mod translate;

pub use config::WrapperConfig;
pub use error::{Result, WrapperError};
pub use logging::SharedLogger;
pub use server::{build_router, AppState};
