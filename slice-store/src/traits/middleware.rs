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

use std::fmt;
use std::sync::Arc;

use crate::common::{DispatchFuture, State};
use crate::message::Action;

/// A plugin interposed in the dispatch chain.
///
/// Each middleware receives the state captured when the dispatch started, the action and
/// a [`Next`] continuation. Calling [`Next::run`] hands control to the next middleware
/// (or to the store itself after the last one); returning any other future
/// short-circuits the chain.
///
/// Code that runs before `next.run(..)` executes in registration order. Code that awaits
/// the future returned by `next.run(..)` and then does more work executes in reverse
/// registration order, because each middleware awaits the ones installed after it.
///
/// ```rust,ignore
/// struct Audit;
///
/// impl Middleware for Audit {
///     fn handle(&self, state: State, action: Arc<Action>, next: Next) -> DispatchFuture {
///         tracing::info!(action = action.kind(), "before");
///         let result = next.run(state, action);
///         Box::pin(async move {
///             let outcome = result.await;
///             tracing::info!("after");
///             outcome
///         })
///     }
/// }
/// ```
///
/// If the state passed to `next.run` is not the same `Arc` as the captured snapshot, the
/// store commits it before the action's handlers run.
pub trait Middleware: Send + Sync + 'static {
    /// Handles one dispatch.
    fn handle(&self, state: State, action: Arc<Action>, next: Next) -> DispatchFuture;
}

/// Adapter turning a closure into a [`Middleware`].
pub(crate) struct FnMiddleware<F>(pub(crate) F);

impl<F> Middleware for FnMiddleware<F>
where
    F: Fn(State, Arc<Action>, Next) -> DispatchFuture + Send + Sync + 'static,
{
    #[inline]
    fn handle(&self, state: State, action: Arc<Action>, next: Next) -> DispatchFuture {
        (self.0)(state, action, next)
    }
}

/// The store-side end of the chain: commits state and starts handler invocation.
pub(crate) type Terminal = Arc<dyn Fn(State, Arc<Action>) -> DispatchFuture + Send + Sync>;

/// The remainder of the middleware chain for one dispatch.
///
/// `Next` is owned and `'static`, so a middleware may move it into an async block and
/// continue the chain after awaiting its own work.
pub struct Next {
    chain: Arc<[Arc<dyn Middleware>]>,
    position: usize,
    terminal: Terminal,
}

impl Next {
    pub(crate) fn new(chain: Arc<[Arc<dyn Middleware>]>, terminal: Terminal) -> Self {
        Self {
            chain,
            position: 0,
            terminal,
        }
    }

    /// Continues the chain with the given state and action.
    pub fn run(self, state: State, action: Arc<Action>) -> DispatchFuture {
        match self.chain.get(self.position).cloned() {
            Some(middleware) => {
                let next = Next {
                    chain: self.chain,
                    position: self.position + 1,
                    terminal: self.terminal,
                };
                middleware.handle(state, action, next)
            }
            None => (self.terminal)(state, action),
        }
    }

    /// Number of middleware still ahead in the chain.
    #[must_use]
    pub fn remaining(&self) -> usize {
        self.chain.len().saturating_sub(self.position)
    }
}

impl fmt::Debug for Next {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Next")
            .field("position", &self.position)
            .field("chain_len", &self.chain.len())
            .finish_non_exhaustive()
    }
}
