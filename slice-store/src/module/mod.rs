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

//! State modules: descriptors, the registry that assigns their paths, and the context
//! handlers use to read and write their slice.

// --- Public Re-exports ---
pub use module_descriptor::{HandlerDescriptor, HandlerOptions, ModuleDescriptor};
pub use state_context::StateContext;

// --- Crate-Internal Re-exports ---
pub(crate) use state_registry::StateRegistry;

// --- Submodules ---

/// Kahn ordering of the parent/child graph.
mod graph;
/// Handler invocation, cancellation and completion joining.
mod invocation;
/// Defines [`ModuleDescriptor`] and handler registration.
mod module_descriptor;
/// Defines [`StateContext`].
mod state_context;
/// Defines the module registry.
mod state_registry;
