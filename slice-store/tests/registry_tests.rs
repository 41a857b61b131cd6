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

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

use parking_lot::Mutex;

use slice_store::prelude::*;
use slice_store_test::prelude::*;

use crate::setup::*;

mod setup;

#[store_test]
async fn test_child_defaults_nest_under_parent() -> anyhow::Result<()> {
    initialize_tracing();
    let store = test_builder()
        .module(
            ModuleDescriptor::new("b")
                .parent("a")
                .defaults(json!({ "y": 2 })),
        )
        .module(ModuleDescriptor::new("a").defaults(json!({ "x": 1 })))
        .launch()?;

    assert_eq!(*store.snapshot(), json!({ "a": { "x": 1, "b": { "y": 2 } } }));
    assert_eq!(store.module_path("b").as_deref(), Some("a.b"));
    Ok(())
}

#[store_test]
async fn test_registering_a_name_twice_is_idempotent() -> anyhow::Result<()> {
    initialize_tracing();
    let store = test_builder()
        .module(counter_module())
        .module(counter_module())
        .launch()?;
    assert_eq!(store.module_count(), 1);

    store.add_modules([counter_module(), counter_module()])?;
    assert_eq!(store.module_count(), 1);

    store.dispatch(Action::new("Increment"))?.await?;
    assert_eq!(
        store.select_snapshot("counter.value")?,
        Some(json!(1)),
        "the handler is registered once"
    );
    Ok(())
}

#[store_test]
async fn test_parent_cycles_are_configuration_errors() -> anyhow::Result<()> {
    initialize_tracing();
    let err = test_builder()
        .module(ModuleDescriptor::new("left").parent("right"))
        .module(ModuleDescriptor::new("right").parent("left"))
        .launch()
        .unwrap_err();
    assert!(matches!(err, StoreError::Configuration(ref msg) if msg.contains("cycle")));

    let err = test_builder()
        .module(ModuleDescriptor::new("ouroboros").parent("ouroboros"))
        .launch()
        .unwrap_err();
    assert!(matches!(err, StoreError::Configuration(_)));
    Ok(())
}

#[store_test]
async fn test_invalid_descriptors_are_rejected() -> anyhow::Result<()> {
    initialize_tracing();
    let store = test_builder().launch()?;

    for descriptor in [
        ModuleDescriptor::new(""),
        ModuleDescriptor::new("has.dot"),
        ModuleDescriptor::new("orphan").parent("missing"),
    ] {
        let name = descriptor.name().to_string();
        let err = store.add_modules([descriptor]).unwrap_err();
        assert!(
            matches!(err, StoreError::Configuration(_)),
            "`{name}` should be rejected"
        );
    }
    assert_eq!(store.module_count(), 0);
    Ok(())
}

#[store_test]
async fn test_lazy_registration_keeps_existing_values() -> anyhow::Result<()> {
    initialize_tracing();
    let store = test_builder()
        .initial_state(json!({ "settings": { "theme": "dark" } }))
        .module(counter_module())
        .launch()?;
    store.dispatch(Action::new("Increment"))?.await?;

    store.add_modules([
        ModuleDescriptor::new("settings").defaults(json!({ "theme": "light", "lang": "en" })),
        ModuleDescriptor::new("history")
            .parent("counter")
            .defaults(json!({ "entries": [] })),
    ])?;

    assert_eq!(
        *store.snapshot(),
        json!({
            "counter": { "value": 1, "history": { "entries": [] } },
            "settings": { "theme": "dark", "lang": "en" }
        })
    );
    assert_eq!(store.module_path("history").as_deref(), Some("counter.history"));
    Ok(())
}

#[store_test]
async fn test_parent_may_be_named_by_full_path() -> anyhow::Result<()> {
    initialize_tracing();
    let store = test_builder()
        .module(ModuleDescriptor::new("a"))
        .module(ModuleDescriptor::new("b").parent("a"))
        .launch()?;

    store.add_modules([ModuleDescriptor::new("c")
        .parent("a.b")
        .defaults(json!({ "z": 3 }))])?;

    assert_eq!(store.select_snapshot("a.b.c.z")?, Some(json!(3)));
    Ok(())
}

#[store_test]
async fn test_init_hooks_run_after_defaults_parents_first() -> anyhow::Result<()> {
    initialize_tracing();
    let order = Arc::new(Mutex::new(Vec::new()));
    let parent_order = order.clone();
    let child_order = order.clone();

    let store = test_builder()
        .module(
            ModuleDescriptor::new("child")
                .parent("parent")
                .defaults(json!({ "ready": false }))
                .on_init(move |ctx| {
                    child_order.lock().push(ctx.path().to_string());
                    ctx.patch_state(json!({ "ready": true }))?;
                    Ok(())
                }),
        )
        .module(
            ModuleDescriptor::new("parent")
                .defaults(json!({ "seen_defaults": null }))
                .on_init(move |ctx| {
                    parent_order.lock().push(ctx.path().to_string());
                    let slice = ctx.get_state();
                    ctx.patch_state(json!({ "seen_defaults": slice["child"]["ready"] }))?;
                    Ok(())
                }),
        )
        .launch()?;

    assert_eq!(*order.lock(), vec!["parent".to_string(), "parent.child".to_string()]);
    assert_eq!(store.select_snapshot("parent.seen_defaults")?, Some(json!(false)));
    assert_eq!(store.select_snapshot("parent.child.ready")?, Some(json!(true)));
    Ok(())
}

#[store_test]
async fn test_failing_init_hook_is_a_configuration_error() -> anyhow::Result<()> {
    initialize_tracing();
    let err = test_builder()
        .module(ModuleDescriptor::new("broken").on_init(|_ctx| anyhow::bail!("no database")))
        .launch()
        .unwrap_err();
    assert!(matches!(err, StoreError::Configuration(ref msg) if msg.contains("no database")));
    Ok(())
}

#[store_test]
async fn test_module_selector_resolves_registered_path() -> anyhow::Result<()> {
    initialize_tracing();
    let store = test_builder()
        .module(ModuleDescriptor::new("app"))
        .module(
            ModuleDescriptor::new("session")
                .parent("app")
                .defaults(json!({ "user": "ada" })),
        )
        .launch()?;

    let session = store.module_selector("session")?;
    assert_eq!(store.select_snapshot(session)?, Some(json!({ "user": "ada" })));

    let err = store.module_selector("nope").unwrap_err();
    assert!(matches!(err, StoreError::Configuration(_)));
    Ok(())
}

#[store_test]
async fn test_handlers_registered_at_runtime_receive_actions() -> anyhow::Result<()> {
    initialize_tracing();
    let calls = Arc::new(AtomicUsize::new(0));
    let counted = calls.clone();
    let store = test_builder().module(counter_module()).launch()?;

    store.add_modules([ModuleDescriptor::new("late").on("Increment", move |_ctx, _action| {
        counted.fetch_add(1, Ordering::SeqCst);
        Outcome::done()
    })])?;
    store.dispatch(Action::new("Increment"))?.await?;

    assert_eq!(calls.load(Ordering::SeqCst), 1);
    assert_eq!(store.select_snapshot("counter.value")?, Some(json!(1)));
    Ok(())
}
