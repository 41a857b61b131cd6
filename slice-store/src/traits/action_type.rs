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

/// Associates a Rust type with an action discriminant.
///
/// Implement this for payload structs to build actions with [`Action::of`](crate::message::Action::of),
/// register handlers with [`ModuleDescriptor::on_action`](crate::module::ModuleDescriptor::on_action)
/// and read payloads back with [`Action::payload_as`](crate::message::Action::payload_as).
///
/// ```rust,ignore
/// #[derive(Serialize, Deserialize)]
/// struct AddTodo { title: String }
///
/// impl ActionType for AddTodo {
///     const TYPE: &'static str = "[Todo] Add";
/// }
/// ```
pub trait ActionType {
    /// The discriminant written to the action's `type` field.
    const TYPE: &'static str;
}
