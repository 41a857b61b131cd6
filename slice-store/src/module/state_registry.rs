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

use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;

use futures::future::BoxFuture;
use parking_lot::RwLock;
use serde_json::{Map, Value};
use tracing::{debug, instrument, trace};

use crate::common::value_path::{merge_at, split_path};
use crate::common::{InitFn, Store};
use crate::message::{Action, ActionContext, StoreError};
use crate::module::graph::parents_first;
use crate::module::invocation::{self, InFlight};
use crate::module::{HandlerDescriptor, ModuleDescriptor};

/// A module after registration: its descriptor plus the path it was assigned.
pub(crate) struct RegisteredModule {
    pub(crate) name: String,
    pub(crate) path: String,
    pub(crate) segments: Vec<String>,
    pub(crate) defaults: Value,
    pub(crate) handlers: HashMap<String, Vec<HandlerDescriptor>>,
    pub(crate) on_init: Option<Arc<InitFn>>,
}

impl fmt::Debug for RegisteredModule {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RegisteredModule")
            .field("name", &self.name)
            .field("path", &self.path)
            .finish_non_exhaustive()
    }
}

/// The set of registered modules, in registration order.
///
/// Registration happens under a write lock; handler invocation reads a copy of the module
/// list, so handlers may register further modules without deadlocking.
#[derive(Debug, Default)]
pub(crate) struct StateRegistry {
    modules: RwLock<Vec<Arc<RegisteredModule>>>,
    in_flight: Arc<InFlight>,
}

impl StateRegistry {
    /// Registers a batch of modules and returns the newly added ones, parents first.
    ///
    /// Names already registered are skipped. Nothing is registered if any descriptor in the
    /// batch is invalid.
    #[instrument(skip_all)]
    pub(crate) fn add<I>(&self, descriptors: I) -> Result<Vec<Arc<RegisteredModule>>, StoreError>
    where
        I: IntoIterator<Item = ModuleDescriptor>,
    {
        let mut modules = self.modules.write();

        let mut batch: Vec<ModuleDescriptor> = Vec::new();
        for descriptor in descriptors {
            validate_name(&descriptor.name)?;
            if modules.iter().any(|m| m.name == descriptor.name) {
                trace!(module = %descriptor.name, "Module already registered, skipping");
                continue;
            }
            if let Some(first) = batch.iter().find(|d| d.name == descriptor.name) {
                if first.parent != descriptor.parent {
                    return Err(StoreError::Configuration(format!(
                        "module `{}` is declared twice with different parents",
                        descriptor.name
                    )));
                }
                trace!(module = %descriptor.name, "Duplicate module in batch, skipping");
                continue;
            }
            batch.push(descriptor);
        }
        if batch.is_empty() {
            return Ok(Vec::new());
        }

        let names: Vec<String> = batch.iter().map(|d| d.name.clone()).collect();
        let mut batch_parent = Vec::with_capacity(batch.len());
        let mut registered_parent = Vec::with_capacity(batch.len());
        for descriptor in &batch {
            let Some(parent) = descriptor.parent.as_deref() else {
                batch_parent.push(None);
                registered_parent.push(None);
                continue;
            };
            if let Some(idx) = names.iter().position(|n| n == parent) {
                batch_parent.push(Some(idx));
                registered_parent.push(None);
            } else if let Some(known) = modules.iter().find(|m| m.name == parent || m.path == parent) {
                batch_parent.push(None);
                registered_parent.push(Some(known.path.clone()));
            } else {
                return Err(StoreError::Configuration(format!(
                    "module `{}` names unknown parent `{parent}`",
                    descriptor.name
                )));
            }
        }

        let order = parents_first(&names, &batch_parent)
            .map_err(|cycle| StoreError::Configuration(cycle.to_string()))?;

        let mut slots: Vec<Option<ModuleDescriptor>> = batch.into_iter().map(Some).collect();
        let mut paths: Vec<Option<String>> = vec![None; slots.len()];
        let mut added = Vec::with_capacity(slots.len());
        for idx in order {
            let Some(descriptor) = slots[idx].take() else {
                continue;
            };
            let parent_path = match batch_parent[idx] {
                Some(parent) => paths[parent].clone(),
                None => registered_parent[idx].clone(),
            };
            let path = match parent_path {
                Some(parent_path) => format!("{parent_path}.{}", descriptor.name),
                None => descriptor.name.clone(),
            };
            paths[idx] = Some(path.clone());

            debug!(module = %descriptor.name, path = %path, "Registering module");
            let module = Arc::new(RegisteredModule {
                segments: split_path(&path),
                name: descriptor.name,
                path,
                defaults: descriptor.defaults,
                handlers: descriptor.handlers,
                on_init: descriptor.on_init,
            });
            modules.push(module.clone());
            added.push(module);
        }
        Ok(added)
    }

    /// Deep-merges each module's defaults at its path into one composite object.
    pub(crate) fn compute_defaults(modules: &[Arc<RegisteredModule>]) -> Value {
        let mut composite = Value::Object(Map::new());
        for module in modules {
            merge_at(&mut composite, &module.segments, module.defaults.clone());
        }
        composite
    }

    /// Starts every handler registered for the action's type and returns the joined result.
    ///
    /// Uncompleted invocations of earlier actions of the same type that opted into
    /// cancellation are canceled first.
    pub(crate) fn invoke_handlers(
        &self,
        store: &Store,
        action: Arc<Action>,
    ) -> BoxFuture<'static, ActionContext> {
        self.in_flight.cancel(action.kind());

        let modules = self.modules.read().clone();
        let mut completions = Vec::new();
        for module in &modules {
            let Some(handlers) = module.handlers.get(action.kind()) else {
                continue;
            };
            for descriptor in handlers {
                completions.push(invocation::invoke(
                    store,
                    module,
                    descriptor,
                    &action,
                    &self.in_flight,
                ));
            }
        }
        trace!(
            action = action.kind(),
            handlers = completions.len(),
            "Handlers started"
        );
        invocation::settle(action, completions)
    }

    pub(crate) fn path_of(&self, name: &str) -> Option<String> {
        self.modules
            .read()
            .iter()
            .find(|m| m.name == name)
            .map(|m| m.path.clone())
    }

    pub(crate) fn len(&self) -> usize {
        self.modules.read().len()
    }
}

fn validate_name(name: &str) -> Result<(), StoreError> {
    if name.trim().is_empty() {
        return Err(StoreError::Configuration(
            "module names must not be empty".to_string(),
        ));
    }
    if name.contains('.') {
        return Err(StoreError::Configuration(format!(
            "module name `{name}` must not contain '.'"
        )));
    }
    Ok(())
}
