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

use std::pin::Pin;
use std::task::{Context, Poll};

use futures::channel::mpsc::{unbounded, UnboundedReceiver, UnboundedSender};
use futures::stream::{Stream, StreamExt};
use parking_lot::Mutex;
use tracing::{debug, trace};

use crate::message::ActionContext;

/// Broadcasts action lifecycle events to every subscriber.
///
/// The `ActionBus` is the store's internal publish-subscribe hub. Every correlation
/// filter and every raw [`ActionStream`] holds one subscription.
/// Publishing is synchronous: the event is pushed into each subscriber's unbounded
/// queue under a single lock, so all subscribers observe events in the same order and
/// a `Dispatched` event is always queued before the terminal event of the same instance.
///
/// Subscribers whose stream has been dropped are pruned on the next publish.
#[derive(Debug)]
pub(crate) struct ActionBus {
    /// Live subscriber queues.
    subscribers: Mutex<Vec<UnboundedSender<ActionContext>>>,
    /// Emit a `debug!` line for every published event.
    log_lifecycle: bool,
}

impl ActionBus {
    pub(crate) fn new(log_lifecycle: bool) -> Self {
        Self {
            subscribers: Mutex::new(Vec::new()),
            log_lifecycle,
        }
    }

    /// Opens a new subscription. Only events published after this call are delivered.
    pub(crate) fn subscribe(&self) -> ActionStream {
        let (sender, receiver) = unbounded();
        let mut subscribers = self.subscribers.lock();
        subscribers.push(sender);
        trace!(count = subscribers.len(), "Action bus subscription added");
        ActionStream { receiver }
    }

    /// Delivers `context` to every live subscriber.
    pub(crate) fn publish(&self, context: ActionContext) {
        if self.log_lifecycle {
            debug!(
                action = context.action.kind(),
                status = ?context.status,
                "Action lifecycle event"
            );
        }
        let mut subscribers = self.subscribers.lock();
        subscribers.retain(|subscriber| subscriber.unbounded_send(context.clone()).is_ok());
        trace!(
            count = subscribers.len(),
            status = ?context.status,
            "Published action event"
        );
    }
}

/// A subscription to every event on the store's action bus.
///
/// Obtained from [`Store::actions`](crate::common::Store::actions). Events published
/// before the stream was created are not replayed. The stream ends when the store is
/// dropped.
#[derive(Debug)]
pub struct ActionStream {
    receiver: UnboundedReceiver<ActionContext>,
}

impl Stream for ActionStream {
    type Item = ActionContext;

    fn poll_next(mut self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Option<Self::Item>> {
        self.receiver.poll_next_unpin(cx)
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use super::*;
    use crate::message::{Action, ActionStatus};

    #[tokio::test]
    async fn every_subscriber_sees_events_in_publish_order() {
        let bus = ActionBus::new(false);
        let mut first = bus.subscribe();
        let mut second = bus.subscribe();
        let action = Arc::new(Action::new("Ping"));

        bus.publish(ActionContext::dispatched(action.clone()));
        bus.publish(ActionContext::successful(action.clone()));

        for stream in [&mut first, &mut second] {
            let dispatched = stream.next().await.expect("dispatched event");
            let terminal = stream.next().await.expect("terminal event");
            assert_eq!(dispatched.status, ActionStatus::Dispatched);
            assert_eq!(terminal.status, ActionStatus::Successful);
            assert!(terminal.is_for(&action));
        }
    }

    #[tokio::test]
    async fn dropped_subscribers_are_pruned() {
        let bus = ActionBus::new(false);
        let dropped = bus.subscribe();
        let _kept = bus.subscribe();
        drop(dropped);

        bus.publish(ActionContext::dispatched(Arc::new(Action::new("Ping"))));
        assert_eq!(bus.subscribers.lock().len(), 1);
    }
}
