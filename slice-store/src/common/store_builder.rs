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

use serde_json::{Map, Value};
use tokio::runtime::Handle;
use tracing::{debug, instrument, trace};

use crate::common::action_bus::ActionBus;
use crate::common::action_results::ActionResults;
use crate::common::state_stream::StateStream;
use crate::common::store::StoreInner;
use crate::common::{DispatchFuture, State, Store, StoreConfig};
use crate::message::{Action, StoreError};
use crate::module::{ModuleDescriptor, StateRegistry};
use crate::traits::{
    ErrorObserver, FnErrorObserver, FnMiddleware, Middleware, Next, TracingErrorObserver,
};

/// Composes and launches a [`Store`].
///
/// Modules, middleware and the error observer are fixed at launch; more modules can be
/// added later with [`Store::add_modules`].
///
/// ```rust,ignore
/// #[tokio::main]
/// async fn main() -> anyhow::Result<()> {
///     let store = StoreBuilder::new()
///         .module(ModuleDescriptor::new("counter").defaults(json!({ "value": 0 })))
///         .middleware_fn(|state, action, next| {
///             tracing::info!(action = action.kind(), "dispatching");
///             next.run(state, action)
///         })
///         .launch()?;
///     Ok(())
/// }
/// ```
#[derive(Default)]
pub struct StoreBuilder {
    config: Option<StoreConfig>,
    modules: Vec<ModuleDescriptor>,
    middleware: Vec<Arc<dyn Middleware>>,
    initial_state: Option<Value>,
    error_observer: Option<Arc<dyn ErrorObserver>>,
}

impl StoreBuilder {
    /// Starts an empty builder.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Uses `config` instead of loading one from the XDG config directory.
    #[must_use]
    pub fn with_config(mut self, config: StoreConfig) -> Self {
        self.config = Some(config);
        self
    }

    /// Registers a module at launch.
    #[must_use]
    pub fn module(mut self, descriptor: ModuleDescriptor) -> Self {
        self.modules.push(descriptor);
        self
    }

    /// Registers several modules at launch.
    #[must_use]
    pub fn modules<I>(mut self, descriptors: I) -> Self
    where
        I: IntoIterator<Item = ModuleDescriptor>,
    {
        self.modules.extend(descriptors);
        self
    }

    /// Appends a middleware to the chain. Middleware run in the order they are added.
    #[must_use]
    pub fn middleware(mut self, middleware: impl Middleware) -> Self {
        self.middleware.push(Arc::new(middleware));
        self
    }

    /// Appends a closure middleware to the chain.
    #[must_use]
    pub fn middleware_fn<F>(self, middleware: F) -> Self
    where
        F: Fn(State, Arc<Action>, Next) -> DispatchFuture + Send + Sync + 'static,
    {
        self.middleware(FnMiddleware(middleware))
    }

    /// Seeds the composite state. Module defaults fill in only what this value leaves unset.
    #[must_use]
    pub fn initial_state(mut self, state: Value) -> Self {
        self.initial_state = Some(state);
        self
    }

    /// Replaces the default [`TracingErrorObserver`].
    #[must_use]
    pub fn error_observer(mut self, observer: impl ErrorObserver) -> Self {
        self.error_observer = Some(Arc::new(observer));
        self
    }

    /// Replaces the default error observer with a closure.
    #[must_use]
    pub fn error_observer_fn<F>(self, observer: F) -> Self
    where
        F: Fn(&Action, &StoreError) + Send + Sync + 'static,
    {
        self.error_observer(FnErrorObserver(observer))
    }

    /// Launches the store on the current tokio runtime and registers the builder's modules.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError::Configuration`] when called outside a tokio runtime, or when
    /// module registration fails.
    #[instrument(skip(self))]
    pub fn launch(self) -> Result<Store, StoreError> {
        let runtime = Handle::try_current().map_err(|e| {
            StoreError::Configuration(format!("a store must be launched inside a tokio runtime: {e}"))
        })?;
        let config = self.config.unwrap_or_else(StoreConfig::load);
        trace!("Configuration resolved: {:?}", config);

        let inner = StoreInner {
            bus: ActionBus::new(config.behavior.log_action_lifecycle),
            state: StateStream::new(
                self.initial_state
                    .unwrap_or_else(|| Value::Object(Map::new())),
            ),
            results: ActionResults::default(),
            registry: StateRegistry::default(),
            middleware: self.middleware.into(),
            error_observer: self
                .error_observer
                .unwrap_or_else(|| Arc::new(TracingErrorObserver)),
            config,
            runtime,
        };
        let store = Store::from_inner(inner);
        store.add_modules(self.modules)?;

        debug!(
            store = %store.inner.config.defaults.store_name,
            modules = store.module_count(),
            "Store launched"
        );
        Ok(store)
    }
}

impl fmt::Debug for StoreBuilder {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("StoreBuilder")
            .field("config", &self.config)
            .field("modules", &self.modules.len())
            .field("middleware", &self.middleware.len())
            .finish_non_exhaustive()
    }
}
