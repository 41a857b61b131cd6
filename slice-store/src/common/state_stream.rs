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

use parking_lot::Mutex;
use serde_json::Value;
use tokio::sync::{mpsc, watch};
use tracing::trace;

use crate::common::State;

/// Holds the current composite snapshot and publishes every commit.
///
/// The latest snapshot lives in a watch channel. Each subscriber also gets its own
/// unbounded queue that receives every committed snapshot, in commit order.
///
/// Commits are whole-snapshot swaps performed under the channel's write lock, and the
/// fan-out to subscribers happens under that same lock. A snapshot nobody else holds is
/// updated in place; a shared one is copied first.
#[derive(Debug)]
pub(crate) struct StateStream {
    sender: watch::Sender<State>,
    subscribers: Mutex<Vec<mpsc::UnboundedSender<State>>>,
}

/// A subscriber's view: the snapshot current at subscription time, then every commit.
#[derive(Debug)]
pub(crate) struct StateFeed {
    pub(crate) current: State,
    pub(crate) updates: mpsc::UnboundedReceiver<State>,
}

impl StateStream {
    pub(crate) fn new(initial: Value) -> Self {
        let (sender, _) = watch::channel(Arc::new(initial));
        Self {
            sender,
            subscribers: Mutex::new(Vec::new()),
        }
    }

    /// The latest committed snapshot.
    pub(crate) fn current(&self) -> State {
        self.sender.borrow().clone()
    }

    /// Replaces the snapshot.
    pub(crate) fn commit(&self, next: State) {
        trace!("Committing replacement snapshot");
        self.sender.send_modify(|current| {
            *current = next;
            self.publish(current);
        });
    }

    /// Applies `apply` to the snapshot and commits the result.
    pub(crate) fn update(&self, apply: impl FnOnce(&mut Value)) {
        self.update_if(|_| true, apply);
    }

    /// Applies `apply` and commits only if `check` accepts the current snapshot.
    ///
    /// Returns whether a commit happened. Both closures run under the write lock.
    pub(crate) fn update_if(
        &self,
        check: impl FnOnce(&Value) -> bool,
        apply: impl FnOnce(&mut Value),
    ) -> bool {
        self.sender.send_if_modified(|current| {
            if !check(current) {
                return false;
            }
            apply(Arc::make_mut(current));
            trace!("Committed derived snapshot");
            self.publish(current);
            true
        })
    }

    /// Opens a feed starting at the current snapshot.
    pub(crate) fn subscribe(&self) -> StateFeed {
        let (sender, updates) = mpsc::unbounded_channel();
        // the read lock keeps commits out until the queue is registered
        let current = self.sender.borrow();
        self.subscribers.lock().push(sender);
        StateFeed {
            current: Arc::clone(&current),
            updates,
        }
    }

    fn publish(&self, committed: &State) {
        self.subscribers
            .lock()
            .retain(|subscriber| subscriber.send(committed.clone()).is_ok());
    }
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;

    #[test]
    fn every_commit_reaches_every_feed_in_order() {
        let stream = StateStream::new(json!({ "v": 0 }));
        let mut feed = stream.subscribe();
        assert_eq!(*feed.current, json!({ "v": 0 }));

        for v in 1..=3 {
            stream.update(|state| state["v"] = json!(v));
        }
        stream.commit(Arc::new(json!({ "v": 0 })));

        let mut seen = Vec::new();
        while let Ok(snapshot) = feed.updates.try_recv() {
            seen.push(snapshot["v"].clone());
        }
        assert_eq!(seen, vec![json!(1), json!(2), json!(3), json!(0)]);
    }

    #[test]
    fn unshared_snapshots_are_updated_in_place() {
        let stream = StateStream::new(json!({ "big": [1, 2, 3], "v": 0 }));
        let before = Arc::as_ptr(&stream.current());

        stream.update(|state| state["v"] = json!(1));

        assert_eq!(Arc::as_ptr(&stream.current()), before);
        assert_eq!(stream.current()["v"], json!(1));
    }

    #[test]
    fn held_snapshots_are_never_modified() {
        let stream = StateStream::new(json!({ "v": 0 }));
        let held = stream.current();

        stream.update(|state| state["v"] = json!(1));

        assert_eq!(*held, json!({ "v": 0 }));
        assert!(!Arc::ptr_eq(&held, &stream.current()));
    }

    #[test]
    fn rejected_checks_leave_the_snapshot_alone() {
        let stream = StateStream::new(json!({ "v": 0 }));
        let mut feed = stream.subscribe();

        let applied = stream.update_if(|state| state["v"] == json!(5), |state| state["v"] = json!(6));

        assert!(!applied);
        assert_eq!(stream.current()["v"], json!(0));
        assert!(feed.updates.try_recv().is_err());
    }

    #[test]
    fn dropped_feeds_are_pruned() {
        let stream = StateStream::new(json!({}));
        let feed = stream.subscribe();
        drop(feed);

        stream.update(|state| state["v"] = json!(1));
        assert!(stream.subscribers.lock().is_empty());
    }
}
