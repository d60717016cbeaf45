pub mod config;
pub mod error;

pub use config::{AuthConfig, Config};
pub use error::{ApiError, ApiResult};
