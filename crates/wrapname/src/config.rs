//! Configuration for wrapname.
//!
//! Loads settings from `.wrapname.toml` in the project root, then from
//! `WRAPNAME_`-prefixed environment variables. Nested keys use `__`, so
//! `WRAPNAME_NAMING__WRAPPER` sets `naming.wrapper`.
//! Uses figment for layered configuration with provenance tracking.

use figment::{
    providers::{Env, Format, Serialized, Toml},
    Figment,
};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::Path;

use crate::naming::Role;

pub const CONFIG_FILE: &str = ".wrapname.toml";

/// wrapname configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct Config {
    /// Target module name reported alongside resolved symbols.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub module: Option<String>,

    /// Whether protected virtuals, constructors and destructors get name
    /// warnings (default: true).
    #[serde(default = "default_warn_protected")]
    pub warn_protected: bool,

    /// Naming templates per role, overriding the built-in defaults.
    #[serde(default)]
    pub naming: BTreeMap<Role, String>,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            naming: BTreeMap::new(),
            module: None,
            warn_protected: default_warn_protected(),
        }
    }
}

fn default_warn_protected() -> bool {
    true
}

impl Config {
    fn figment(root: &Path) -> Figment {
        let config_path = root.join(CONFIG_FILE);

        // Build layered config: defaults <- toml file <- environment
        let figment = Figment::from(Serialized::defaults(Config::default()));
        let figment = if config_path.exists() {
            figment.merge(Toml::file(&config_path))
        } else {
            figment
        };
        figment.merge(Env::prefixed("WRAPNAME_").split("__"))
    }

    /// Load configuration for the given root directory.
    ///
    /// Returns the default config if the file doesn't exist or is invalid.
    pub fn load(root: &Path) -> Self {
        let config_path = root.join(CONFIG_FILE);
        match Self::figment(root).extract() {
            Ok(config) => {
                if config_path.exists() {
                    tracing::info!("Loaded config from {:?}", config_path);
                }
                config
            }
            Err(e) => {
                tracing::warn!("Config error: {}", e);
                Self::default()
            }
        }
    }

    /// Render the effective configuration as TOML.
    pub fn to_toml(&self) -> Result<String, toml::ser::Error> {
        toml::to_string_pretty(self)
    }
}
