//! Configuration and dependency wiring for the inspection indexer.

mod dependencies;
mod settings;

pub use dependencies::Dependencies;
pub use settings::{etl_config_from_env, etl_config_from_lookup};
