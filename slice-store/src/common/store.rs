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

use std::fmt;
use std::sync::Arc;

use futures::future::try_join_all;
use futures::StreamExt;
use serde_json::Value;
use tokio::runtime::Handle;
use tokio::sync::oneshot;
use tokio_util::sync::CancellationToken;
use tracing::{debug, instrument, trace};

use crate::common::action_bus::ActionBus;
use crate::common::action_results::ActionResults;
use crate::common::dispatcher;
use crate::common::state_stream::{StateFeed, StateStream};
use crate::common::value_path::deep_merge;
use crate::common::{ActionStream, DispatchHandle, State, StoreConfig, Subscription};
use crate::message::{Action, ActionStatus, StoreError};
use crate::module::{ModuleDescriptor, StateContext, StateRegistry};
use crate::selector::{ActionFilter, ContextFilter, Selection, Selector};
use crate::traits::{ErrorObserver, Middleware};

/// Everything a store shares between its handles.
pub(crate) struct StoreInner {
    pub(crate) config: StoreConfig,
    pub(crate) state: StateStream,
    pub(crate) bus: ActionBus,
    pub(crate) results: ActionResults,
    pub(crate) registry: StateRegistry,
    pub(crate) middleware: Arc<[Arc<dyn Middleware>]>,
    pub(crate) error_observer: Arc<dyn ErrorObserver>,
    pub(crate) runtime: Handle,
}

/// A handle to a running slice store.
///
/// `Store` is cheap to clone; every clone addresses the same composite state, registry and
/// action bus. Build one with [`StoreBuilder`](crate::common::StoreBuilder).
///
/// ```rust,ignore
/// let store = StoreBuilder::new()
///     .module(counter_module())
///     .launch()?;
///
/// store.dispatch(Action::new("Increment"))?.await?;
/// assert_eq!(store.select_snapshot("counter.value")?, Some(json!(1)));
/// ```
#[derive(Clone)]
pub struct Store {
    pub(crate) inner: Arc<StoreInner>,
}

impl Store {
    pub(crate) fn from_inner(inner: StoreInner) -> Self {
        Self {
            inner: Arc::new(inner),
        }
    }

    /// Dispatches one action.
    ///
    /// The middleware chain starts immediately. Unless a middleware defers `next`, the
    /// synchronous part of every handler has run and its writes are committed when this
    /// returns. The returned handle resolves once every handler has completed; the
    /// dispatch proceeds even if the handle is dropped.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError::Dispatch`] synchronously if the action's type is empty.
    #[instrument(
        skip(self, action),
        fields(store = %self.inner.config.defaults.store_name, action = action.kind())
    )]
    pub fn dispatch(&self, action: Action) -> Result<DispatchHandle<Option<State>>, StoreError> {
        action.validate()?;
        Ok(self.start_dispatch(action))
    }

    /// Dispatches several actions independently and joins their results.
    ///
    /// The handle resolves to one entry per action, in input order, or to the first error.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError::Dispatch`] if any action's type is empty. In that case none of
    /// the actions are dispatched.
    #[instrument(skip_all, fields(store = %self.inner.config.defaults.store_name))]
    pub fn dispatch_all<I>(
        &self,
        actions: I,
    ) -> Result<DispatchHandle<Vec<Option<State>>>, StoreError>
    where
        I: IntoIterator<Item = Action>,
    {
        let actions: Vec<Action> = actions.into_iter().collect();
        for action in &actions {
            action.validate()?;
        }
        debug!(count = actions.len(), "Dispatching batch");
        let handles: Vec<_> = actions
            .into_iter()
            .map(|action| self.start_dispatch(action))
            .collect();
        Ok(DispatchHandle::new(try_join_all(handles)))
    }

    fn start_dispatch(&self, action: Action) -> DispatchHandle<Option<State>> {
        let action = Arc::new(action);
        let kind = action.kind().to_string();
        trace!(action = action.kind(), "Entering middleware chain");
        let future = dispatcher::run_chain(self, action.clone());

        let observer = self
            .inner
            .config
            .behavior
            .report_handler_errors
            .then(|| self.inner.error_observer.clone());
        let (sender, receiver) = oneshot::channel();
        self.inner.runtime.spawn(async move {
            let result = future.await;
            if let (Err(error), Some(observer)) = (&result, &observer) {
                observer.observe(&action, error);
            }
            if sender.send(result).is_err() {
                trace!(action = action.kind(), "Dispatch result not awaited");
            }
        });

        DispatchHandle::new(async move {
            receiver.await.map_err(|_| StoreError::Closed(kind))?
        })
    }

    /// The latest committed composite snapshot.
    #[must_use]
    pub fn snapshot(&self) -> State {
        self.inner.state.current()
    }

    /// Replaces the whole composite state.
    #[instrument(skip_all)]
    pub fn reset(&self, state: Value) {
        debug!("Resetting composite state");
        self.inner.state.commit(Arc::new(state));
    }

    /// Subscribes to a projection of the state.
    ///
    /// The stream yields the current projection immediately, then again after every commit
    /// whose projection differs from the last one yielded.
    pub fn select<R>(&self, selector: impl Into<Selector<R>>) -> Selection<R>
    where
        R: PartialEq + Clone + Send + 'static,
    {
        Selection::new(self.inner.state.subscribe(), selector.into())
    }

    /// Resolves to the current projection.
    ///
    /// # Errors
    ///
    /// Returns the projection's error, or [`StoreError::Closed`] if the store was dropped.
    pub async fn select_once<R>(&self, selector: impl Into<Selector<R>>) -> Result<R, StoreError>
    where
        R: PartialEq + Clone + Send + 'static,
    {
        self.select(selector)
            .next()
            .await
            .unwrap_or_else(|| Err(StoreError::Closed("selection".into())))
    }

    /// Evaluates a projection against the latest snapshot.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError::Selector`] if a projection function fails.
    pub fn select_snapshot<R: 'static>(
        &self,
        selector: impl Into<Selector<R>>,
    ) -> Result<R, StoreError> {
        selector.into().evaluate(&self.snapshot())
    }

    /// Calls `callback` with the current snapshot, then once for every later commit, in
    /// commit order.
    pub fn subscribe<F>(&self, mut callback: F) -> Subscription
    where
        F: FnMut(State) + Send + 'static,
    {
        let StateFeed {
            current,
            mut updates,
        } = self.inner.state.subscribe();
        callback(current);

        let token = CancellationToken::new();
        let stopped = token.clone();
        self.inner.runtime.spawn(async move {
            loop {
                tokio::select! {
                    biased;
                    () = stopped.cancelled() => break,
                    next = updates.recv() => match next {
                        Some(snapshot) => callback(snapshot),
                        None => break,
                    },
                }
            }
            trace!("State subscription loop finished");
        });
        Subscription::new(token)
    }

    /// Registers modules on a running store.
    ///
    /// Defaults of newly registered modules are merged under the current state, so values
    /// already present win. Init hooks then run, parents before children. Names that are
    /// already registered are skipped.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError::Configuration`] for invalid descriptors, unknown parents, cycles
    /// or a failing init hook.
    #[instrument(skip_all, fields(store = %self.inner.config.defaults.store_name))]
    pub fn add_modules<I>(&self, descriptors: I) -> Result<(), StoreError>
    where
        I: IntoIterator<Item = ModuleDescriptor>,
    {
        let added = self.inner.registry.add(descriptors)?;
        if added.is_empty() {
            return Ok(());
        }

        let defaults = StateRegistry::compute_defaults(&added);
        self.inner.state.update(|current| {
            let mut merged = defaults;
            if !current.is_null() {
                deep_merge(&mut merged, std::mem::take(current));
            }
            *current = merged;
        });
        debug!(count = added.len(), "Module defaults committed");

        for module in &added {
            let Some(on_init) = module.on_init.clone() else {
                continue;
            };
            trace!(module = %module.name, "Running init hook");
            on_init(StateContext::new(self.clone(), module.clone())).map_err(|e| {
                StoreError::Configuration(format!("init hook of `{}` failed: {e:#}", module.name))
            })?;
        }
        Ok(())
    }

    /// The registered path of a module, if a module with that name exists.
    #[must_use]
    pub fn module_path(&self, name: &str) -> Option<String> {
        self.inner.registry.path_of(name)
    }

    /// Number of registered modules.
    #[must_use]
    pub fn module_count(&self) -> usize {
        self.inner.registry.len()
    }

    /// A path selector for the named module's slice.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError::Configuration`] if no module has that name.
    pub fn module_selector(&self, name: &str) -> Result<Selector<Option<Value>>, StoreError> {
        self.module_path(name)
            .map(|path| Selector::path(&path))
            .ok_or_else(|| StoreError::Configuration(format!("unknown module `{name}`")))
    }

    /// Every event published on the action bus from now on.
    pub fn actions(&self) -> ActionStream {
        self.inner.bus.subscribe()
    }

    /// Actions of the given types, at every lifecycle stage.
    pub fn of_action(&self, types: &[&str]) -> ActionFilter {
        ActionFilter::new(self.actions(), types, None)
    }

    /// Actions of the given types as they are dispatched.
    pub fn of_action_dispatched(&self, types: &[&str]) -> ActionFilter {
        ActionFilter::new(self.actions(), types, Some(ActionStatus::Dispatched))
    }

    /// Actions of the given types that completed successfully.
    pub fn of_action_successful(&self, types: &[&str]) -> ActionFilter {
        ActionFilter::new(self.actions(), types, Some(ActionStatus::Successful))
    }

    /// Actions of the given types that were canceled.
    pub fn of_action_canceled(&self, types: &[&str]) -> ActionFilter {
        ActionFilter::new(self.actions(), types, Some(ActionStatus::Canceled))
    }

    /// Actions of the given types that errored.
    pub fn of_action_errored(&self, types: &[&str]) -> ActionFilter {
        ActionFilter::new(self.actions(), types, Some(ActionStatus::Errored))
    }

    /// Full lifecycle events for the given types, optionally restricted to one status.
    pub fn of_action_context(&self, types: &[&str], status: Option<ActionStatus>) -> ContextFilter {
        ActionFilter::new(self.actions(), types, status).contexts()
    }

    /// The configuration this store was launched with.
    #[must_use]
    pub fn config(&self) -> &StoreConfig {
        &self.inner.config
    }
}

impl fmt::Debug for Store {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Store")
            .field("name", &self.inner.config.defaults.store_name)
            .field("modules", &self.inner.registry.len())
            .field("middleware", &self.inner.middleware.len())
            .finish_non_exhaustive()
    }
}
