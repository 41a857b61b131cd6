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

use std::collections::HashSet;
use std::pin::Pin;
use std::sync::Arc;
use std::task::{ready, Context, Poll};

use futures::stream::{Stream, StreamExt};

use crate::common::ActionStream;
use crate::message::{Action, ActionContext, ActionStatus};

/// Action bus events narrowed to a set of action types and, optionally, one status.
///
/// Yields the bare action. Use [`ActionFilter::contexts`] to receive the full
/// [`ActionContext`] instead, for example to read an error. An empty type list matches
/// nothing.
#[derive(Debug)]
pub struct ActionFilter {
    events: ActionStream,
    types: HashSet<String>,
    status: Option<ActionStatus>,
}

impl ActionFilter {
    pub(crate) fn new(events: ActionStream, types: &[&str], status: Option<ActionStatus>) -> Self {
        Self {
            events,
            types: types.iter().map(|t| (*t).to_string()).collect(),
            status,
        }
    }

    /// Yields full lifecycle events instead of bare actions.
    pub fn contexts(self) -> ContextFilter {
        ContextFilter(self)
    }

    fn matches(&self, context: &ActionContext) -> bool {
        self.types.contains(context.action.kind())
            && self.status.map_or(true, |status| status == context.status)
    }

    fn poll_matching(&mut self, cx: &mut Context<'_>) -> Poll<Option<ActionContext>> {
        loop {
            match ready!(self.events.poll_next_unpin(cx)) {
                Some(context) if self.matches(&context) => return Poll::Ready(Some(context)),
                Some(_) => continue,
                None => return Poll::Ready(None),
            }
        }
    }
}

impl Stream for ActionFilter {
    type Item = Arc<Action>;

    fn poll_next(mut self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Option<Self::Item>> {
        self.poll_matching(cx)
            .map(|context| context.map(|context| context.action))
    }
}

/// Like [`ActionFilter`], but yields the whole [`ActionContext`].
#[derive(Debug)]
pub struct ContextFilter(ActionFilter);

impl Stream for ContextFilter {
    type Item = ActionContext;

    fn poll_next(mut self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Option<Self::Item>> {
        self.0.poll_matching(cx)
    }
}
