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

use std::time::Duration;

use futures::{stream, StreamExt};
use tokio::sync::mpsc;
use tokio::time::{sleep, timeout};

use slice_store::prelude::*;
use slice_store_test::prelude::*;

use crate::setup::*;

mod setup;

/// `search` stores the last query it finished, after a short delay.
fn search_module(options: HandlerOptions) -> ModuleDescriptor {
    ModuleDescriptor::new("search")
        .defaults(json!({ "last": null }))
        .on_with("Search", options, |ctx, action| {
            let query = action.get("query").cloned().unwrap_or(Value::Null);
            Outcome::pending(async move {
                sleep(Duration::from_millis(30)).await;
                ctx.patch_state(json!({ "last": query }))?;
                Ok(())
            })
        })
}

fn search(query: &str) -> Action {
    Action::new("Search").with("query", query)
}

#[store_test]
async fn test_newer_action_cancels_uncompleted_handler() -> anyhow::Result<()> {
    initialize_tracing();
    let store = test_builder()
        .module(search_module(HandlerOptions::cancel_uncompleted()))
        .launch()?;
    let mut canceled = store.of_action_canceled(&["Search"]);

    let first = store.dispatch(search("rust"))?;
    let second = store.dispatch(search("tokio"))?;

    assert!(first.await?.is_none(), "the older search is canceled");
    let snapshot = second.await?.expect("the newer search succeeds");
    assert_eq!(snapshot["search"]["last"], json!("tokio"));

    let event = canceled.next().await.expect("canceled event");
    assert_eq!(event.get("query"), Some(&json!("rust")));
    Ok(())
}

#[store_test]
async fn test_handlers_without_the_option_run_to_completion() -> anyhow::Result<()> {
    initialize_tracing();
    let store = test_builder()
        .module(search_module(HandlerOptions::default()))
        .launch()?;

    let first = store.dispatch(search("rust"))?;
    let second = store.dispatch(search("tokio"))?;

    assert!(first.await?.is_some());
    assert!(second.await?.is_some());
    Ok(())
}

#[store_test]
async fn test_completed_handlers_are_not_canceled_later() -> anyhow::Result<()> {
    initialize_tracing();
    let store = test_builder()
        .module(search_module(HandlerOptions::cancel_uncompleted()))
        .launch()?;

    assert!(store.dispatch(search("rust"))?.await?.is_some());
    assert!(store.dispatch(search("tokio"))?.await?.is_some());
    assert_eq!(store.select_snapshot("search.last")?, Some(json!("tokio")));
    Ok(())
}

#[store_test]
async fn test_handler_context_observes_cancellation() -> anyhow::Result<()> {
    initialize_tracing();
    let (sender, mut notified) = mpsc::unbounded_channel();
    let store = test_builder()
        .module(ModuleDescriptor::new("watcher").on_with(
            "Watch",
            HandlerOptions::cancel_uncompleted(),
            move |ctx, action| {
                let sender = sender.clone();
                let id = action.get("id").cloned().unwrap_or(Value::Null);
                let canceled = ctx.canceled();
                tokio::spawn(async move {
                    canceled.await;
                    let _ = sender.send(id);
                });
                Outcome::pending(futures::future::pending::<anyhow::Result<()>>())
            },
        ))
        .launch()?;

    let first = store.dispatch(Action::new("Watch").with("id", 1))?;
    let _second = store.dispatch(Action::new("Watch").with("id", 2))?;

    assert!(first.await?.is_none());
    let id = timeout(Duration::from_secs(1), notified.recv()).await?;
    assert_eq!(id, Some(json!(1)));
    Ok(())
}

#[store_test]
async fn test_empty_outcome_cancels_the_action() -> anyhow::Result<()> {
    initialize_tracing();
    let store = test_builder()
        .module(ModuleDescriptor::new("noop").on("Skip", |_ctx, _action| Outcome::empty()))
        .launch()?;
    let mut canceled = store.of_action_canceled(&["Skip"]);

    assert!(store.dispatch(Action::new("Skip"))?.await?.is_none());
    assert!(canceled.next().await.is_some());
    Ok(())
}

#[store_test]
async fn test_stream_outcomes_need_a_value_to_succeed() -> anyhow::Result<()> {
    initialize_tracing();
    let store = test_builder()
        .module(
            ModuleDescriptor::new("feed")
                .defaults(json!({ "received": 0 }))
                .on("Pull", |ctx, _action| {
                    Outcome::stream(stream::iter(1..=3).then(move |n| {
                        let ctx = ctx.clone();
                        async move {
                            ctx.set_state(json!({ "received": n }));
                            Ok::<_, anyhow::Error>(n)
                        }
                    }))
                })
                .on("PullNothing", |_ctx, _action| {
                    Outcome::stream(stream::empty::<anyhow::Result<()>>())
                }),
        )
        .launch()?;

    assert!(store.dispatch(Action::new("Pull"))?.await?.is_some());
    assert_eq!(store.select_snapshot("feed.received")?, Some(json!(3)));

    assert!(store.dispatch(Action::new("PullNothing"))?.await?.is_none());
    Ok(())
}

#[store_test]
async fn test_failure_takes_precedence_over_cancellation() -> anyhow::Result<()> {
    initialize_tracing();
    let store = test_builder()
        .module(ModuleDescriptor::new("quiet").on("Mixed", |_ctx, _action| Outcome::empty()))
        .module(ModuleDescriptor::new("loud").on("Mixed", |_ctx, _action| {
            Outcome::pending(async {
                sleep(Duration::from_millis(5)).await;
                Err::<(), _>(anyhow::anyhow!("loud failure"))
            })
        }))
        .launch()?;

    let err = store.dispatch(Action::new("Mixed"))?.await.unwrap_err();
    assert!(err.to_string().contains("loud failure"));
    Ok(())
}
