//! Configuration loading and management

mod loader;

pub use loader::{parse_config, LoadedConfig};
