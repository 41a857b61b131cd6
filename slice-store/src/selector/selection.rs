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
use std::pin::Pin;
use std::task::{Context, Poll};

use futures::stream::{self, BoxStream, Stream, StreamExt};
use tokio::sync::mpsc;
use tracing::trace;

use crate::common::state_stream::StateFeed;
use crate::common::State;
use crate::message::StoreError;
use crate::selector::Selector;

/// A change-detecting subscription to a projection of the state.
///
/// Yields the current projection first, then the projection of each later commit that
/// differs from the last one yielded. Every commit is evaluated, so a value that changes
/// and then changes back is yielded twice. A projection error is yielded once and ends
/// the stream. The stream also ends when the store is dropped.
pub struct Selection<R> {
    inner: BoxStream<'static, Result<R, StoreError>>,
}

struct Cursor<R> {
    pending: Option<State>,
    updates: mpsc::UnboundedReceiver<State>,
    selector: Selector<R>,
    last: Option<R>,
    finished: bool,
}

impl<R> Selection<R>
where
    R: PartialEq + Clone + Send + 'static,
{
    pub(crate) fn new(feed: StateFeed, selector: Selector<R>) -> Self {
        trace!(selector = selector.description(), "Opening selection");
        let cursor = Cursor {
            pending: Some(feed.current),
            updates: feed.updates,
            selector,
            last: None,
            finished: false,
        };
        let inner = stream::unfold(cursor, |mut cursor| async move {
            if cursor.finished {
                return None;
            }
            loop {
                let snapshot = match cursor.pending.take() {
                    Some(snapshot) => snapshot,
                    None => cursor.updates.recv().await?,
                };
                match cursor.selector.evaluate(&snapshot) {
                    Ok(value) if cursor.last.as_ref() == Some(&value) => continue,
                    Ok(value) => {
                        cursor.last = Some(value.clone());
                        return Some((Ok(value), cursor));
                    }
                    Err(error) => {
                        cursor.finished = true;
                        return Some((Err(error), cursor));
                    }
                }
            }
        });
        Self {
            inner: inner.boxed(),
        }
    }
}

impl<R> Stream for Selection<R> {
    type Item = Result<R, StoreError>;

    fn poll_next(mut self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Option<Self::Item>> {
        self.inner.poll_next_unpin(cx)
    }
}

impl<R> fmt::Debug for Selection<R> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Selection").finish_non_exhaustive()
    }
}
