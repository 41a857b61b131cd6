//! Defines the extension points of the store.
//!
//! *   [`Middleware`]: Intercepts every dispatch; continues the chain through [`Next`].
//! *   [`ActionType`]: Binds a payload type to its action discriminant.
//! *   [`ErrorObserver`]: Receives dispatch failures for logging or reporting.

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
pub use action_type::ActionType;
pub use error_observer::{ErrorObserver, TracingErrorObserver};
pub use middleware::{Middleware, Next};

// --- Crate-Internal Re-exports ---
pub(crate) use error_observer::FnErrorObserver;
pub(crate) use middleware::{FnMiddleware, Terminal};

// --- Submodules ---

/// Defines the [`ActionType`] trait.
mod action_type;
/// Defines the [`ErrorObserver`] trait and its default implementation.
mod error_observer;
/// Defines the [`Middleware`] trait and the [`Next`] continuation.
mod middleware;
