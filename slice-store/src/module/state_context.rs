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
use std::future::Future;
use std::sync::Arc;

use serde::de::DeserializeOwned;
use serde_json::Value;
use tokio_util::sync::CancellationToken;
use tracing::trace;

use crate::common::value_path::{get_path, set_path, shallow_merge};
use crate::common::{DispatchHandle, State, Store};
use crate::message::{Action, StoreError};
use crate::module::state_registry::RegisteredModule;

/// A handler's view of the store, scoped to its module's slice.
///
/// Reads and writes address the module's path inside the composite state. Every write
/// commits a new snapshot immediately, so a `get_state` after a `set_state` in the same
/// handler observes the write.
///
/// The context is cheap to clone and may be moved into the handler's async work.
#[derive(Clone)]
pub struct StateContext {
    store: Store,
    module: Arc<RegisteredModule>,
    cancel: CancellationToken,
}

impl StateContext {
    pub(crate) fn new(store: Store, module: Arc<RegisteredModule>) -> Self {
        Self::with_cancel(store, module, CancellationToken::new())
    }

    pub(crate) fn with_cancel(
        store: Store,
        module: Arc<RegisteredModule>,
        cancel: CancellationToken,
    ) -> Self {
        Self {
            store,
            module,
            cancel,
        }
    }

    /// The module's dotted path.
    #[must_use]
    pub fn path(&self) -> &str {
        &self.module.path
    }

    /// The module's current slice, or `Value::Null` if nothing is stored at its path.
    #[must_use]
    pub fn get_state(&self) -> Value {
        let snapshot = self.store.snapshot();
        get_path(&snapshot, &self.module.segments)
            .cloned()
            .unwrap_or(Value::Null)
    }

    /// The module's current slice, deserialized.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError::Payload`] if the slice does not deserialize into `T`.
    pub fn get_state_as<T: DeserializeOwned>(&self) -> Result<T, StoreError> {
        serde_json::from_value(self.get_state()).map_err(|e| {
            StoreError::Payload(format!("slice `{}` has an unexpected shape: {e}", self.path()))
        })
    }

    /// Replaces the module's slice.
    pub fn set_state(&self, value: impl Into<Value>) {
        let value = value.into();
        trace!(path = %self.module.path, "Setting slice");
        let segments = &self.module.segments;
        self.store
            .inner
            .state
            .update(|current| set_path(current, segments, value));
    }

    /// Replaces the module's slice with a value computed from the current one.
    ///
    /// `f` runs without any store lock held, so it may read the store. If another write
    /// changes the slice before the result is committed, `f` runs again on the newer
    /// value.
    pub fn update_state<F>(&self, mut f: F)
    where
        F: FnMut(&Value) -> Value,
    {
        trace!(path = %self.module.path, "Updating slice");
        let segments = &self.module.segments;
        loop {
            let read = self.get_state();
            let next = f(&read);
            let committed = self.store.inner.state.update_if(
                |current| get_path(current, segments).unwrap_or(&Value::Null) == &read,
                |current| set_path(current, segments, next),
            );
            if committed {
                return;
            }
            trace!(path = %self.module.path, "Slice changed during update, retrying");
        }
    }

    /// Shallow-merges the fields of `partial` over the module's slice.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError::Payload`] if `partial` is not a JSON object.
    pub fn patch_state(&self, partial: Value) -> Result<(), StoreError> {
        let Value::Object(fields) = partial else {
            return Err(StoreError::Payload(format!(
                "patch for `{}` must be an object",
                self.path()
            )));
        };
        trace!(path = %self.module.path, "Patching slice");
        let segments = &self.module.segments;
        self.store
            .inner
            .state
            .update(|current| shallow_merge(current, segments, fields));
        Ok(())
    }

    /// Dispatches another action through the full pipeline.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError::Dispatch`] if the action's type is empty.
    pub fn dispatch(&self, action: Action) -> Result<DispatchHandle<Option<State>>, StoreError> {
        self.store.dispatch(action)
    }

    /// The latest composite snapshot.
    #[must_use]
    pub fn snapshot(&self) -> State {
        self.store.snapshot()
    }

    /// The store this context belongs to.
    #[must_use]
    pub fn store(&self) -> &Store {
        &self.store
    }

    /// Returns `true` once a newer action of the same type has canceled this invocation.
    ///
    /// Only handlers registered with `cancel_uncompleted` are ever canceled.
    #[must_use]
    pub fn is_canceled(&self) -> bool {
        self.cancel.is_cancelled()
    }

    /// Resolves when this invocation is canceled.
    pub fn canceled(&self) -> impl Future<Output = ()> + Send + 'static {
        let token = self.cancel.clone();
        async move { token.cancelled().await }
    }
}

impl fmt::Debug for StateContext {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("StateContext")
            .field("path", &self.module.path)
            .field("canceled", &self.cancel.is_cancelled())
            .finish_non_exhaustive()
    }
}
