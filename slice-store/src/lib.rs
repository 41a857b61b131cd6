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

#![forbid(unsafe_code)]
#![warn(missing_docs)]

//! # Slice Store
//!
//! A reactive application-state container built on Tokio. The whole application state is
//! one nested JSON snapshot, partitioned into named slices owned by modules. State changes
//! are requested by dispatching actions; handlers registered per action type update their
//! module's slice, and selectors observe projections of the snapshot as it changes.
//!
//! ## Key Concepts
//!
//! - **Modules (`ModuleDescriptor`)**: a named slice with defaults, an optional parent and
//!   handlers keyed by action type. Child slices nest under their parent's path.
//! - **Actions (`Action`)**: a type string plus a JSON payload. Every dispatch publishes a
//!   `Dispatched` event followed by exactly one terminal event (`Successful`, `Canceled`
//!   or `Errored`) on the action bus.
//! - **Middleware (`Middleware`)**: an ordered chain every dispatch passes through before
//!   handlers run.
//! - **Selectors (`Selector`)**: dotted paths or projection functions, consumed as a
//!   change-detecting stream (`Store::select`) or evaluated once.
//! - **Store (`Store`, `StoreBuilder`)**: owns the snapshot, the registry and the bus.
//!
//! ## Quick Start
//!
//! ```rust,ignore
//! use slice_store::prelude::*;
//!
//! #[tokio::main]
//! async fn main() -> anyhow::Result<()> {
//!     let store = StoreBuilder::new()
//!         .module(
//!             ModuleDescriptor::new("counter")
//!                 .defaults(json!({ "value": 0 }))
//!                 .on("Increment", |ctx, _action| {
//!                     ctx.update_state(|current| {
//!                         json!({ "value": current["value"].as_i64().unwrap_or(0) + 1 })
//!                     });
//!                     Outcome::done()
//!                 }),
//!         )
//!         .launch()?;
//!
//!     store.dispatch(Action::new("Increment"))?.await?;
//!     assert_eq!(store.select_snapshot("counter.value")?, Some(json!(1)));
//!     Ok(())
//! }
//! ```

/// Store machinery and entry points.
pub(crate) mod common;

/// Defines actions, lifecycle events and errors.
pub(crate) mod message;

/// Defines state modules and handler invocation.
pub(crate) mod module;

/// Defines selectors and action filters.
pub(crate) mod selector;

/// Defines the extension traits of the store.
pub(crate) mod traits;

/// A prelude module for conveniently importing the most commonly used items.
///
/// # Re-exports
///
/// ## External Crates
/// *   [`serde_json::json`] and [`serde_json::Value`]: slices, payloads and snapshots are
///     JSON values.
///
/// ## Core Types
/// *   [`crate::common::StoreBuilder`]: Composes and launches a store.
/// *   [`crate::common::Store`]: Handle to a running store.
/// *   [`crate::common::StoreConfig`]: Configuration loaded from the XDG config directory.
/// *   [`crate::common::Outcome`]: Handler return values.
/// *   [`crate::common::DispatchHandle`]: Awaitable dispatch result.
/// *   [`crate::common::Subscription`]: Callback subscription guard.
/// *   [`crate::message::Action`]: The dispatched message.
/// *   [`crate::message::ActionContext`]: An action bus event.
/// *   [`crate::message::StoreError`]: The crate's error type.
/// *   [`crate::module::ModuleDescriptor`]: Describes a state module.
/// *   [`crate::module::StateContext`]: A handler's view of its slice.
/// *   [`crate::selector::Selector`]: A projection of the composite state.
/// *   [`crate::traits::Middleware`]: Dispatch chain plugins.
/// *   [`crate::traits::ActionType`]: Typed actions.
pub mod prelude {
    // External crate re-exports
    pub use serde_json::{json, Value};

    // Core types
    pub use crate::common::{
        ActionStream, BehaviorConfig, DefaultsConfig, DispatchFuture, DispatchHandle, Outcome,
        State, Store, StoreBuilder, StoreConfig, Subscription,
    };
    pub use crate::message::{Action, ActionContext, ActionStatus, HandlerError, StoreError};
    pub use crate::module::{HandlerDescriptor, HandlerOptions, ModuleDescriptor, StateContext};
    pub use crate::selector::{ActionFilter, ContextFilter, Selection, Selector};

    // Traits
    pub use crate::traits::{ActionType, ErrorObserver, Middleware, Next, TracingErrorObserver};
}
