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

//! Defines common type aliases used within `slice-store`.
//!
//! Centralizes the future, handler and snapshot types so signatures elsewhere stay short.

use std::sync::Arc;

use futures::future::BoxFuture;
use futures::stream::BoxStream;
use serde_json::Value;

use crate::common::Outcome;
use crate::message::{Action, StoreError};
use crate::module::StateContext;

/// A composite state snapshot.
///
/// Snapshots are immutable; every commit swaps in a new `Arc`. Two snapshots are "the same
/// state" when they are the same `Arc` ([`Arc::ptr_eq`]).
pub type State = Arc<Value>;

/// The future a middleware returns: resolves to the committed snapshot on success,
/// `None` when the action was canceled, or the error the action ended with.
pub type DispatchFuture = BoxFuture<'static, Result<Option<State>, StoreError>>;

/// Crate-internal: an action handler registered on a module.
pub(crate) type HandlerFn =
    dyn Fn(StateContext, Arc<Action>) -> anyhow::Result<Outcome> + Send + Sync + 'static;

/// Crate-internal: a module's init hook.
pub(crate) type InitFn = dyn Fn(StateContext) -> anyhow::Result<()> + Send + Sync + 'static;

/// Crate-internal: asynchronous work returned by a handler.
pub(crate) type OutcomeFuture = BoxFuture<'static, anyhow::Result<()>>;

/// Crate-internal: a handler's stream of produced values.
pub(crate) type OutcomeStream = BoxStream<'static, anyhow::Result<()>>;
