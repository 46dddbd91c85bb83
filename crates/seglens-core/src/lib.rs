pub mod app_config;
pub mod config;
pub mod demo;
pub mod error;
pub mod job;
pub mod mapping;
pub mod result;
pub mod upload;

pub use app_config::{AppConfig, Environment};
pub use config::{load_app_config, load_app_config_from_env};
pub use error::{ConfigError, CoreError};
