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

//! Running one handler and folding many handler completions into a terminal status.

use std::any::Any;
use std::collections::HashMap;
use std::panic::{catch_unwind, AssertUnwindSafe};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use futures::future::{self, BoxFuture};
use futures::stream::{FuturesUnordered, StreamExt};
use futures::FutureExt;
use parking_lot::Mutex;
use tokio_util::sync::CancellationToken;
use tracing::{debug, trace};

use crate::common::{Outcome, OutcomeFuture, OutcomeStream, Store};
use crate::message::{Action, ActionContext, StoreError};
use crate::module::state_registry::RegisteredModule;
use crate::module::{HandlerDescriptor, StateContext};

/// How a single handler invocation ended.
#[derive(Debug)]
pub(crate) enum Completion {
    /// Produced at least one value.
    Value,
    /// Finished without a value, or was canceled.
    Empty,
    /// Returned or yielded an error, or panicked.
    Failed(StoreError),
}

/// Cancellation tokens of running `cancel_uncompleted` handlers, by action type.
#[derive(Debug, Default)]
pub(crate) struct InFlight {
    next_id: AtomicU64,
    tokens: Mutex<HashMap<String, Vec<(u64, CancellationToken)>>>,
}

impl InFlight {
    /// Cancels every tracked invocation for `kind`.
    pub(crate) fn cancel(&self, kind: &str) {
        let Some(running) = self.tokens.lock().remove(kind) else {
            return;
        };
        debug!(action = kind, count = running.len(), "Canceling uncompleted handlers");
        for (_, token) in running {
            token.cancel();
        }
    }

    fn track(self: &Arc<Self>, kind: &str) -> (CancellationToken, InFlightGuard) {
        let id = self.next_id.fetch_add(1, Ordering::Relaxed);
        let token = CancellationToken::new();
        self.tokens
            .lock()
            .entry(kind.to_string())
            .or_default()
            .push((id, token.clone()));
        let guard = InFlightGuard {
            owner: self.clone(),
            kind: kind.to_string(),
            id,
        };
        (token, guard)
    }
}

/// Untracks an invocation when it finishes.
pub(crate) struct InFlightGuard {
    owner: Arc<InFlight>,
    kind: String,
    id: u64,
}

impl Drop for InFlightGuard {
    fn drop(&mut self) {
        let mut tokens = self.owner.tokens.lock();
        if let Some(running) = tokens.get_mut(&self.kind) {
            running.retain(|(id, _)| *id != self.id);
            if running.is_empty() {
                tokens.remove(&self.kind);
            }
        }
    }
}

/// Calls one handler and returns a future for its completion.
///
/// The synchronous part of the handler runs before this returns.
pub(crate) fn invoke(
    store: &Store,
    module: &Arc<RegisteredModule>,
    descriptor: &HandlerDescriptor,
    action: &Arc<Action>,
    in_flight: &Arc<InFlight>,
) -> BoxFuture<'static, Completion> {
    let kind = action.kind().to_string();
    let (cancel, guard) = if descriptor.options.cancel_uncompleted {
        let (token, guard) = in_flight.track(&kind);
        (token, Some(guard))
    } else {
        (CancellationToken::new(), None)
    };
    let context = StateContext::with_cancel(store.clone(), module.clone(), cancel.clone());

    trace!(module = %module.name, action = %kind, "Invoking handler");
    let handler = descriptor.handler.clone();
    let called = catch_unwind(AssertUnwindSafe(|| handler(context, action.clone())));
    let outcome = match called {
        Ok(Ok(outcome)) => outcome,
        Ok(Err(error)) => {
            return future::ready(Completion::Failed(StoreError::handler(&kind, error))).boxed()
        }
        Err(panic) => {
            return future::ready(Completion::Failed(StoreError::handler(
                &kind,
                panic_error(panic),
            )))
            .boxed()
        }
    };

    match outcome {
        Outcome::Done => future::ready(Completion::Value).boxed(),
        Outcome::Pending(work) => drive_future(kind, work, cancel, guard).boxed(),
        Outcome::Stream(values) => drive_stream(kind, values, cancel, guard).boxed(),
    }
}

async fn drive_future(
    kind: String,
    work: OutcomeFuture,
    cancel: CancellationToken,
    _guard: Option<InFlightGuard>,
) -> Completion {
    tokio::select! {
        biased;
        () = cancel.cancelled() => {
            trace!(action = %kind, "Pending handler canceled");
            Completion::Empty
        }
        result = AssertUnwindSafe(work).catch_unwind() => match result {
            Ok(Ok(())) => Completion::Value,
            Ok(Err(error)) => Completion::Failed(StoreError::handler(&kind, error)),
            Err(panic) => Completion::Failed(StoreError::handler(&kind, panic_error(panic))),
        },
    }
}

async fn drive_stream(
    kind: String,
    mut values: OutcomeStream,
    cancel: CancellationToken,
    _guard: Option<InFlightGuard>,
) -> Completion {
    let mut produced = false;
    loop {
        tokio::select! {
            biased;
            () = cancel.cancelled() => {
                trace!(action = %kind, "Streaming handler canceled");
                return Completion::Empty;
            }
            item = AssertUnwindSafe(values.next()).catch_unwind() => match item {
                Ok(Some(Ok(()))) => produced = true,
                Ok(Some(Err(error))) => {
                    return Completion::Failed(StoreError::handler(&kind, error));
                }
                Ok(None) if produced => return Completion::Value,
                Ok(None) => return Completion::Empty,
                Err(panic) => {
                    return Completion::Failed(StoreError::handler(&kind, panic_error(panic)));
                }
            },
        }
    }
}

/// Joins handler completions into the action's terminal context.
///
/// The first failure decides the result immediately; the remaining handlers keep running
/// in the background. Otherwise any handler without a value makes the action `Canceled`.
pub(crate) fn settle(
    action: Arc<Action>,
    completions: Vec<BoxFuture<'static, Completion>>,
) -> BoxFuture<'static, ActionContext> {
    async move {
        let mut pending: FuturesUnordered<_> = completions.into_iter().collect();
        let mut without_value = false;
        loop {
            let Some(completion) = pending.next().await else {
                break;
            };
            match completion {
                Completion::Value => {}
                Completion::Empty => without_value = true,
                Completion::Failed(error) => {
                    if !pending.is_empty() {
                        trace!(
                            action = action.kind(),
                            remaining = pending.len(),
                            "Handler failed; remaining handlers continue detached"
                        );
                        tokio::spawn(pending.for_each(|_| future::ready(())));
                    }
                    return ActionContext::errored(action, error);
                }
            }
        }
        if without_value {
            ActionContext::canceled(action)
        } else {
            ActionContext::successful(action)
        }
    }
    .boxed()
}

fn panic_error(panic: Box<dyn Any + Send>) -> anyhow::Error {
    let message = panic
        .downcast_ref::<&str>()
        .map(|s| (*s).to_string())
        .or_else(|| panic.downcast_ref::<String>().cloned())
        .unwrap_or_else(|| "non-string payload".to_string());
    anyhow::anyhow!("handler panicked: {message}")
}
