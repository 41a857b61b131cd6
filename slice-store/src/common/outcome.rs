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

//! Convenient helpers for creating handler return values.
//!
//! Action handlers return `anyhow::Result<Outcome>`. The variant tells the store how the
//! handler completes, which in turn decides the action's terminal status.
//!
//! ```ignore
//! // Synchronous handler
//! ModuleDescriptor::new("counter").on("Increment", |ctx, _action| {
//!     let next = ctx.get_state()["value"].as_i64().unwrap_or(0) + 1;
//!     ctx.patch_state(json!({ "value": next }))?;
//!     Outcome::done()
//! });
//!
//! // Async handler
//! ModuleDescriptor::new("todos").on("Load", |ctx, _action| {
//!     Outcome::pending(async move {
//!         let items = fetch_items().await?;
//!         ctx.set_state(json!({ "items": items }));
//!         Ok(())
//!     })
//! });
//! ```

use std::fmt;
use std::future::Future;

use futures::stream::{self, Stream, StreamExt};

use crate::common::{OutcomeFuture, OutcomeStream};

/// How an action handler completes.
///
/// - [`Outcome::Done`]: completed synchronously, producing a value.
/// - [`Outcome::Pending`]: completes when the future resolves; `Ok` counts as one value.
/// - [`Outcome::Stream`]: produces zero or more values. A stream that ends without
///   yielding counts as "completed without a value", which makes the action `Canceled`.
///
/// Build values with the associated helpers rather than the variants directly.
pub enum Outcome {
    /// Immediate completion with a value.
    Done,
    /// Asynchronous completion.
    Pending(OutcomeFuture),
    /// A stream of produced values.
    Stream(OutcomeStream),
}

impl Outcome {
    /// Completes the handler immediately.
    #[inline]
    pub fn done() -> anyhow::Result<Self> {
        Ok(Outcome::Done)
    }

    /// Completes the handler once `future` resolves.
    ///
    /// An `Err` from the future marks the action `Errored`.
    #[inline]
    pub fn pending<F>(future: F) -> anyhow::Result<Self>
    where
        F: Future<Output = anyhow::Result<()>> + Send + 'static,
    {
        Ok(Outcome::Pending(Box::pin(future)))
    }

    /// Completes the handler once `stream` ends.
    ///
    /// Each `Ok` item counts as a produced value; the first `Err` marks the action
    /// `Errored`. Streams from handlers registered with `cancel_uncompleted` are dropped
    /// when a newer action of the same type is dispatched.
    #[inline]
    pub fn stream<S, T>(stream: S) -> anyhow::Result<Self>
    where
        S: Stream<Item = anyhow::Result<T>> + Send + 'static,
        T: Send + 'static,
    {
        Ok(Outcome::Stream(stream.map(|item| item.map(|_| ())).boxed()))
    }

    /// Completes the handler without producing a value.
    #[inline]
    pub fn empty() -> anyhow::Result<Self> {
        Ok(Outcome::Stream(stream::empty().boxed()))
    }
}

impl fmt::Debug for Outcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Outcome::Done => f.write_str("Done"),
            Outcome::Pending(_) => f.write_str("Pending(..)"),
            Outcome::Stream(_) => f.write_str("Stream(..)"),
        }
    }
}
