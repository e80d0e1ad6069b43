//! Configuration for the catalog cache
//!
//! Sections are declared with [`config_struct!`](crate::config_struct) so every
//! field carries its default next to its type; TOML files only need to list
//! overrides.

pub mod macros;
pub mod schemas;
pub mod utils;

pub use schemas::*;
pub use utils::{load_config, load_config_from_path, CONFIG_FILE_PATH, PROVIDER_MAX_PAGE_SIZE};
