//! Layered client configuration:
//! 1. Defaults (from code)
//! 2. Config file (`barber.toml`)
//! 3. Environment variables (`BARBER_*`, `__` for nesting)

pub mod error;
pub mod loader;

pub use error::{ConfigError, Result};
pub use loader::{ClientConfig, ConfigLoader};
