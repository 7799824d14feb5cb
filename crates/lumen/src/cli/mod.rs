pub mod config;
pub mod scan;

use lumen_core::{Config, ConfigError};
use std::path::Path;

/// Load the config from `path` if given, else from the default location.
pub fn load_config(path: Option<&Path>) -> Result<Config, ConfigError> {
    match path {
        Some(path) => Config::load_from(path),
        None => Config::load(),
    }
}
