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

use anyhow::Context as _;
use slice_store::prelude::*;

use crate::setup::actions::{AddBy, AddTodo, Explode, Increment};

/// `counter` with `{ value: 0 }`, handling `Increment` and `AddBy`.
pub fn counter_module() -> ModuleDescriptor {
    ModuleDescriptor::new("counter")
        .defaults(json!({ "value": 0 }))
        .on_action::<Increment, _>(|ctx, _action| {
            let value = ctx.get_state()["value"].as_i64().unwrap_or(0);
            ctx.patch_state(json!({ "value": value + 1 }))?;
            Outcome::done()
        })
        .on_action::<AddBy, _>(|ctx, action| {
            let AddBy { amount } = action.payload_as()?;
            ctx.update_state(|current| {
                json!({ "value": current["value"].as_i64().unwrap_or(0) + amount })
            });
            Outcome::done()
        })
}

/// `todos` with `{ items: [] }`, handling `AddTodo`.
pub fn todos_module() -> ModuleDescriptor {
    ModuleDescriptor::new("todos")
        .defaults(json!({ "items": [] }))
        .on_action::<AddTodo, _>(|ctx, action| {
            let AddTodo { title } = action.payload_as()?;
            let mut items = ctx.get_state()["items"]
                .as_array()
                .cloned()
                .context("todos.items is not an array")?;
            items.push(json!(title));
            ctx.patch_state(json!({ "items": items }))?;
            Outcome::done()
        })
}

/// `faulty`, whose `Explode` handler fails synchronously.
pub fn faulty_module() -> ModuleDescriptor {
    ModuleDescriptor::new("faulty").on_action::<Explode, _>(|_ctx, _action| {
        anyhow::bail!("kaboom");
    })
}
