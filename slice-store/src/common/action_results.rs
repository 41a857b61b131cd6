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

use std::sync::Arc;

use dashmap::mapref::entry::Entry;
use dashmap::DashMap;
use tokio::sync::oneshot;
use tracing::trace;

use crate::message::{Action, ActionContext, StoreError};

/// Carries handler-invocation results back to the dispatch that started them.
///
/// Waiters are keyed by the address of the dispatched `Arc<Action>`. The waiter keeps
/// that `Arc` alive until its result arrives, so the key cannot be reused by another
/// instance while it is registered.
#[derive(Debug, Default)]
pub(crate) struct ActionResults {
    waiting: DashMap<usize, oneshot::Sender<ActionContext>>,
}

fn key(action: &Arc<Action>) -> usize {
    Arc::as_ptr(action) as usize
}

impl ActionResults {
    /// Registers interest in the terminal result of `action`.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError::Dispatch`] if the same instance is still waiting for a
    /// result, for example when a middleware runs `next` twice with one action.
    pub(crate) fn track(
        &self,
        action: &Arc<Action>,
    ) -> Result<oneshot::Receiver<ActionContext>, StoreError> {
        match self.waiting.entry(key(action)) {
            Entry::Occupied(_) => Err(StoreError::Dispatch(format!(
                "`{}` is already in flight; dispatch a new instance instead",
                action.kind()
            ))),
            Entry::Vacant(slot) => {
                let (sender, receiver) = oneshot::channel();
                slot.insert(sender);
                Ok(receiver)
            }
        }
    }

    /// Posts a terminal result to whoever is tracking its instance.
    pub(crate) fn post(&self, context: ActionContext) {
        match self.waiting.remove(&key(&context.action)) {
            Some((_, waiter)) => {
                let kind = context.action.kind().to_string();
                if waiter.send(context).is_err() {
                    trace!(action = %kind, "Result waiter dropped before delivery");
                }
            }
            None => trace!(
                action = context.action.kind(),
                "No dispatch waiting for this result"
            ),
        }
    }
}
