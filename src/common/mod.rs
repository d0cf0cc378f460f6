pub mod config;
pub mod errors;
pub mod format;
pub mod safety;
pub mod workspace;

pub use config::{ImportConfig, Settings};
pub use errors::{ImportError, Result};
