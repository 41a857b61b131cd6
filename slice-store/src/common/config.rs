/*
 * Copyright (c) 2024. Govcraft
 *
 * Licensed under either of
 *   * Apache License, Version 2.0 (the "License");
 *     you may not use this file except in compliance with the License.
 *     You may obtain a copy of the License at http://www.apache.org/licenses/LICENSE-2.0
 *   * MIT license: http://opensource.org/licenses/MIT
 *
 * Unless required by applicable law or agreed to in writing, software
 * distributed under the License is distributed on an "AS IS" BASIS,
 * WITHOUT WARRANTIES OR CONDITIONS OF ANY KIND, either express or implied.
 * See the applicable License for the specific language governing permissions and
 * limitations under that License.
 */

use serde::{Deserialize, Serialize};
use tracing::{error, info};

use crate::message::StoreError;

/// Configuration for a slice store.
///
/// Loaded from TOML files in XDG-compliant directories by [`StoreConfig::load`], or supplied
/// directly through [`StoreBuilder::with_config`](crate::common::StoreBuilder::with_config).
/// Every section and field is optional in the file; missing values take their defaults.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct StoreConfig {
    /// Default values configuration
    pub defaults: DefaultsConfig,
    /// Behavioral configuration switches
    pub behavior: BehaviorConfig,
}

/// Default configuration values
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct DefaultsConfig {
    /// Label attached to the store's tracing spans
    pub store_name: String,
}

/// Behavioral configuration switches
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct BehaviorConfig {
    /// Emit a `debug!` event for every action lifecycle event on the bus
    pub log_action_lifecycle: bool,
    /// Offer failed dispatches to the store's error observer
    pub report_handler_errors: bool,
}

impl Default for DefaultsConfig {
    fn default() -> Self {
        Self {
            store_name: "store".to_string(),
        }
    }
}

impl Default for BehaviorConfig {
    fn default() -> Self {
        Self {
            log_action_lifecycle: false,
            report_handler_errors: true,
        }
    }
}

impl StoreConfig {
    /// Parses a configuration from TOML text.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError::Configuration`] if the text is not valid TOML or a field has the
    /// wrong type.
    pub fn from_toml_str(text: &str) -> Result<Self, StoreError> {
        toml::from_str(text).map_err(|e| StoreError::Configuration(e.to_string()))
    }

    /// Load configuration from XDG-compliant locations
    ///
    /// Looks for `slice-store/config.toml` under `$XDG_CONFIG_HOME` and then the
    /// `$XDG_CONFIG_DIRS` fallbacks.
    ///
    /// If no configuration file is found, returns the default configuration.
    /// If a configuration file exists but is malformed, logs an error and uses defaults.
    #[must_use]
    pub fn load() -> Self {
        let xdg_dirs = match xdg::BaseDirectories::with_prefix("slice-store") {
            Ok(dirs) => dirs,
            Err(e) => {
                error!("Failed to initialize XDG directories: {}", e);
                return Self::default();
            }
        };

        let Some(path) = xdg_dirs.find_config_file("config.toml") else {
            info!("No configuration file found, using defaults");
            return Self::default();
        };

        info!("Loading configuration from: {}", path.display());
        match std::fs::read_to_string(&path) {
            Ok(config_str) => match Self::from_toml_str(&config_str) {
                Ok(config) => {
                    info!("Successfully loaded configuration");
                    config
                }
                Err(e) => {
                    error!("Failed to parse configuration file {}: {}", path.display(), e);
                    Self::default()
                }
            },
            Err(e) => {
                error!("Failed to read configuration file {}: {}", path.display(), e);
                Self::default()
            }
        }
    }
}
