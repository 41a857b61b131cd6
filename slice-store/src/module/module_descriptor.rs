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

use serde_json::{Map, Value};

use crate::common::{HandlerFn, InitFn, Outcome};
use crate::message::Action;
use crate::module::StateContext;
use crate::traits::ActionType;

/// Per-handler registration options.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct HandlerOptions {
    /// Drop this handler's unfinished work when another action of the same type is
    /// dispatched. The abandoned invocation counts as "completed without a value".
    pub cancel_uncompleted: bool,
}

impl HandlerOptions {
    /// Options with `cancel_uncompleted` set.
    #[must_use]
    pub const fn cancel_uncompleted() -> Self {
        Self {
            cancel_uncompleted: true,
        }
    }
}

/// A registered action handler and its options.
#[derive(Clone)]
pub struct HandlerDescriptor {
    pub(crate) handler: Arc<HandlerFn>,
    pub(crate) options: HandlerOptions,
}

impl HandlerDescriptor {
    /// The options this handler was registered with.
    #[must_use]
    pub fn options(&self) -> HandlerOptions {
        self.options
    }
}

impl fmt::Debug for HandlerDescriptor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("HandlerDescriptor")
            .field("options", &self.options)
            .finish_non_exhaustive()
    }
}

/// Describes one state module: its name, optional parent, default slice and handlers.
///
/// Handlers are keyed by action type and receive a [`StateContext`] bound to the module's
/// path. Several handlers may be registered for the same type; they all run.
///
/// ```rust,ignore
/// let counter = ModuleDescriptor::new("counter")
///     .defaults(json!({ "value": 0 }))
///     .on("Increment", |ctx, _action| {
///         ctx.update_state(|current| {
///             json!({ "value": current["value"].as_i64().unwrap_or(0) + 1 })
///         });
///         Outcome::done()
///     });
/// ```
pub struct ModuleDescriptor {
    pub(crate) name: String,
    pub(crate) parent: Option<String>,
    pub(crate) defaults: Value,
    pub(crate) handlers: HashMap<String, Vec<HandlerDescriptor>>,
    pub(crate) on_init: Option<Arc<InitFn>>,
}

impl ModuleDescriptor {
    /// Starts a descriptor for a top-level module with empty-object defaults.
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            parent: None,
            defaults: Value::Object(Map::new()),
            handlers: HashMap::new(),
            on_init: None,
        }
    }

    /// Nests this module under `parent`, named by module name or by full path.
    #[must_use]
    pub fn parent(mut self, parent: impl Into<String>) -> Self {
        self.parent = Some(parent.into());
        self
    }

    /// Sets the module's default slice.
    #[must_use]
    pub fn defaults(mut self, defaults: Value) -> Self {
        self.defaults = defaults;
        self
    }

    /// Registers a handler for `action_type`.
    #[must_use]
    pub fn on<F>(self, action_type: impl Into<String>, handler: F) -> Self
    where
        F: Fn(StateContext, Arc<Action>) -> anyhow::Result<Outcome> + Send + Sync + 'static,
    {
        self.on_with(action_type, HandlerOptions::default(), handler)
    }

    /// Registers a handler for `action_type` with explicit options.
    #[must_use]
    pub fn on_with<F>(
        mut self,
        action_type: impl Into<String>,
        options: HandlerOptions,
        handler: F,
    ) -> Self
    where
        F: Fn(StateContext, Arc<Action>) -> anyhow::Result<Outcome> + Send + Sync + 'static,
    {
        self.handlers
            .entry(action_type.into())
            .or_default()
            .push(HandlerDescriptor {
                handler: Arc::new(handler),
                options,
            });
        self
    }

    /// Registers a handler for the typed action `A`.
    #[must_use]
    pub fn on_action<A, F>(self, handler: F) -> Self
    where
        A: ActionType,
        F: Fn(StateContext, Arc<Action>) -> anyhow::Result<Outcome> + Send + Sync + 'static,
    {
        self.on(A::TYPE, handler)
    }

    /// Registers a hook that runs once, after the module's defaults are committed.
    #[must_use]
    pub fn on_init<F>(mut self, hook: F) -> Self
    where
        F: Fn(StateContext) -> anyhow::Result<()> + Send + Sync + 'static,
    {
        self.on_init = Some(Arc::new(hook));
        self
    }

    /// The module's name.
    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// The action types this module handles.
    pub fn action_types(&self) -> impl Iterator<Item = &str> {
        self.handlers.keys().map(String::as_str)
    }
}

impl fmt::Debug for ModuleDescriptor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ModuleDescriptor")
            .field("name", &self.name)
            .field("parent", &self.parent)
            .field("handlers", &self.handlers.keys().collect::<Vec<_>>())
            .field("on_init", &self.on_init.is_some())
            .finish_non_exhaustive()
    }
}
