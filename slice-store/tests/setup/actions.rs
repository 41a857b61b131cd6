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

use serde::{Deserialize, Serialize};
use slice_store::prelude::*;

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct Increment;

impl ActionType for Increment {
    const TYPE: &'static str = "Increment";
}

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct AddBy {
    pub amount: i64,
}

impl ActionType for AddBy {
    const TYPE: &'static str = "AddBy";
}

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct AddTodo {
    pub title: String,
}

impl ActionType for AddTodo {
    const TYPE: &'static str = "AddTodo";
}

// handlers registered for this one always fail
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct Explode;

impl ActionType for Explode {
    const TYPE: &'static str = "Explode";
}
