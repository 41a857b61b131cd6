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

//! Core store machinery: the composite state, the action bus, the dispatch pipeline and the
//! public [`Store`] / [`StoreBuilder`] entry points.

// --- Public Re-exports ---
pub use action_bus::ActionStream;
pub use config::{BehaviorConfig, DefaultsConfig, StoreConfig};
pub use dispatch_handle::DispatchHandle;
pub use outcome::Outcome;
pub use store::Store;
pub use store_builder::StoreBuilder;
pub use subscription::Subscription;

// --- Crate-Internal Re-exports ---
pub use types::*;

// --- Submodules ---

/// Defines common type aliases.
mod types;

/// Defines the action bus and its subscription stream.
mod action_bus;
/// Defines the result tracker correlating handler results with dispatches.
mod action_results;
/// Defines the configuration system.
pub mod config;
/// Defines the middleware-chain driver.
mod dispatcher;
/// Defines the awaitable dispatch result.
mod dispatch_handle;
/// Defines the `Outcome` handler return type.
mod outcome;
/// Defines the composite state holder.
pub(crate) mod state_stream;
/// Defines the `Store` handle.
mod store;
/// Defines the `StoreBuilder` entry point.
mod store_builder;
/// Defines callback subscription handles.
mod subscription;
/// Dotted-path reads, writes and merges on JSON values.
pub(crate) mod value_path;
