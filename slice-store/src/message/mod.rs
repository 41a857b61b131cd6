//! Defines actions, their lifecycle events and the store's error type.
//!
//! # Key Components
//!
//! *   [`Action`]: A typed message (`type` discriminant plus JSON payload) describing
//!     an intended state transition.
//! *   [`ActionStatus`]: The lifecycle stage of a dispatched instance.
//! *   [`ActionContext`]: An event on the action bus, pairing an instance with a stage.
//! *   [`StoreError`]: Every failure the store reports, synchronous or asynchronous.

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

// --- Public Re-exports ---
pub use action::Action;
pub use action_context::{ActionContext, ActionStatus};
pub use store_error::{HandlerError, StoreError};

// --- Submodules ---

/// Defines [`Action`].
mod action;
/// Defines [`ActionContext`] and [`ActionStatus`].
mod action_context;
/// Defines [`StoreError`].
mod store_error;
