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

use std::sync::Arc;

use futures::future;
use tracing::trace;

use crate::common::{DispatchFuture, State, Store};
use crate::message::{Action, ActionContext, ActionStatus, StoreError};
use crate::traits::{Next, Terminal};

/// Runs the middleware chain for one action instance.
///
/// Every middleware's synchronous prelude runs before this returns. The returned future
/// completes once the action reaches a terminal status.
pub(crate) fn run_chain(store: &Store, action: Arc<Action>) -> DispatchFuture {
    let captured = store.snapshot();
    let terminal_store = store.clone();
    let terminal_captured = captured.clone();
    let terminal: Terminal = Arc::new(move |state, action| {
        enter_handlers(&terminal_store, &terminal_captured, state, action)
    });
    Next::new(store.inner.middleware.clone(), terminal).run(captured, action)
}

/// The end of the chain: commit the state the middleware settled on, announce the action,
/// run its handlers and wait for the registry's verdict.
///
/// Handlers are invoked before this returns, so their synchronous writes are committed by
/// the time the surrounding `dispatch` call returns.
fn enter_handlers(
    store: &Store,
    captured: &State,
    state: State,
    action: Arc<Action>,
) -> DispatchFuture {
    let inner = &store.inner;
    let result = match inner.results.track(&action) {
        Ok(result) => result,
        Err(error) => return Box::pin(future::ready(Err(error))),
    };
    if !Arc::ptr_eq(captured, &state) {
        trace!(action = action.kind(), "Middleware replaced the state");
        inner.state.commit(state);
    }

    inner.bus.publish(ActionContext::dispatched(action.clone()));
    let completion = inner.registry.invoke_handlers(store, action.clone());
    let settling = store.clone();
    inner.runtime.spawn(async move {
        let context = completion.await;
        settling.inner.results.post(context);
    });

    let store = store.clone();
    Box::pin(async move {
        let context = result
            .await
            .map_err(|_| StoreError::Closed(action.kind().to_string()))?;
        store.inner.bus.publish(context.clone());

        match context.status {
            ActionStatus::Successful => Ok(Some(store.snapshot())),
            ActionStatus::Canceled => Ok(None),
            ActionStatus::Errored => Err(context.error.unwrap_or_else(|| {
                StoreError::Dispatch(format!("`{}` errored without a cause", action.kind()))
            })),
            ActionStatus::Dispatched => Err(StoreError::Dispatch(format!(
                "`{}` reported a non-terminal status as its result",
                action.kind()
            ))),
        }
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::common::{StoreBuilder, StoreConfig};

    #[tokio::test]
    async fn an_instance_already_in_flight_is_rejected() {
        let store = StoreBuilder::new()
            .with_config(StoreConfig::default())
            .launch()
            .expect("store launches");
        let action = Arc::new(Action::new("Ping"));
        let captured = store.snapshot();

        let first = enter_handlers(&store, &captured, captured.clone(), action.clone());
        let second = enter_handlers(&store, &captured, captured.clone(), action.clone());

        assert!(matches!(second.await, Err(StoreError::Dispatch(_))));
        assert!(first.await.expect("first run succeeds").is_some());
    }
}
