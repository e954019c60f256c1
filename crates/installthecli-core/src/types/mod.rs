//! Type definitions for configuration, catalog entries and run outcomes

mod config_types;
mod outcome_types;
mod target_types;

pub use config_types::*;
pub use outcome_types::*;
pub use target_types::*;
