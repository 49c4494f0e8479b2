pub mod config;
pub mod error;
pub mod football;
pub mod http;
pub mod telemetry;

pub use config::Config;
pub use error::{Error, Result};
