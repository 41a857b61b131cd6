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

use std::fs;

use slice_store::prelude::*;
use slice_store_test::prelude::*;

use crate::setup::*;

mod setup;

// The only test in this binary that touches XDG_CONFIG_HOME; keep it that way so parallel
// tests never observe each other's environment.
#[store_test]
async fn test_config_is_loaded_from_xdg_config_home() -> anyhow::Result<()> {
    initialize_tracing();
    let home = tempfile::tempdir()?;
    let config_dir = home.path().join("slice-store");
    fs::create_dir_all(&config_dir)?;
    fs::write(
        config_dir.join("config.toml"),
        r#"
[defaults]
store_name = "inventory"

[behavior]
report_handler_errors = false
"#,
    )?;
    std::env::set_var("XDG_CONFIG_HOME", home.path());

    let loaded = StoreConfig::load();
    assert_eq!(loaded.defaults.store_name, "inventory");
    assert!(!loaded.behavior.report_handler_errors);
    assert!(!loaded.behavior.log_action_lifecycle, "unset fields keep defaults");

    let store = StoreBuilder::new().module(counter_module()).launch()?;
    assert_eq!(store.config(), &loaded);

    fs::write(config_dir.join("config.toml"), "behavior = [not toml")?;
    assert_eq!(StoreConfig::load(), StoreConfig::default());

    std::env::remove_var("XDG_CONFIG_HOME");
    Ok(())
}

#[store_test]
async fn test_explicit_config_bypasses_file_lookup() -> anyhow::Result<()> {
    initialize_tracing();
    let config = StoreConfig::from_toml_str(
        r#"
[behavior]
log_action_lifecycle = true
"#,
    )?;
    let store = StoreBuilder::new()
        .with_config(config.clone())
        .module(counter_module())
        .launch()?;

    assert_eq!(store.config(), &config);
    assert!(store.config().behavior.log_action_lifecycle);
    assert_eq!(store.config().defaults.store_name, "store");

    store.dispatch(Action::new("Increment"))?.await?;
    assert_eq!(store.select_snapshot("counter.value")?, Some(json!(1)));
    Ok(())
}

#[store_test]
async fn test_malformed_toml_is_a_configuration_error() -> anyhow::Result<()> {
    initialize_tracing();
    let err = StoreConfig::from_toml_str("[behavior]\nreport_handler_errors = \"sometimes\"")
        .unwrap_err();
    assert!(matches!(err, StoreError::Configuration(_)));
    Ok(())
}
