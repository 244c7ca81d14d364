//! Configuration for ICWS clients.
//!
//! Connection settings are kept as named contexts in a YAML file, see
//! [`client`]. The file lives in `$ICWS_CONFIG_DIR` when that is set, and in
//! the platform config directory (`~/.config/icws` on Linux) otherwise.

use std::path::PathBuf;

pub mod client;
pub mod error;

pub use client::{
    ClientConfig, ClientDefaults, Context, ResolvedContext, client_config_path,
    load_client_config, load_client_config_from, save_client_config, save_client_config_to,
};
pub use error::{ConfigError, Result};

/// Application directory name.
const APP_NAME: &str = "icws";

/// Environment variable overriding the config directory.
pub const CONFIG_DIR_ENV: &str = "ICWS_CONFIG_DIR";

/// Directory holding the client config file.
pub fn config_dir() -> Option<PathBuf> {
    if let Ok(dir) = std::env::var(CONFIG_DIR_ENV)
        && !dir.is_empty()
    {
        return Some(PathBuf::from(dir));
    }
    dirs::config_dir().map(|d| d.join(APP_NAME))
}
