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

use crate::message::{Action, StoreError};

/// Lifecycle stage of a dispatched action instance.
///
/// `Dispatched` is always published first; exactly one of the terminal stages follows.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ActionStatus {
    /// The action passed the middleware chain and is being handled.
    Dispatched,
    /// Every handler completed and produced a value.
    Successful,
    /// A handler completed without producing a value, or was canceled.
    Canceled,
    /// A handler failed.
    Errored,
}

impl ActionStatus {
    /// Returns `true` for every stage except `Dispatched`.
    #[inline]
    #[must_use]
    pub const fn is_terminal(self) -> bool {
        !matches!(self, ActionStatus::Dispatched)
    }
}

/// An event on the action bus.
#[derive(Debug, Clone)]
pub struct ActionContext {
    /// The dispatched instance.
    pub action: Arc<Action>,
    /// The lifecycle stage this event reports.
    pub status: ActionStatus,
    /// The failure, present only when `status` is [`ActionStatus::Errored`].
    pub error: Option<StoreError>,
}

impl ActionContext {
    pub(crate) fn dispatched(action: Arc<Action>) -> Self {
        Self::with_status(action, ActionStatus::Dispatched)
    }

    pub(crate) fn successful(action: Arc<Action>) -> Self {
        Self::with_status(action, ActionStatus::Successful)
    }

    pub(crate) fn canceled(action: Arc<Action>) -> Self {
        Self::with_status(action, ActionStatus::Canceled)
    }

    pub(crate) fn errored(action: Arc<Action>, error: StoreError) -> Self {
        Self {
            action,
            status: ActionStatus::Errored,
            error: Some(error),
        }
    }

    fn with_status(action: Arc<Action>, status: ActionStatus) -> Self {
        Self {
            action,
            status,
            error: None,
        }
    }

    /// Returns `true` if this event belongs to the given dispatched instance.
    #[inline]
    #[must_use]
    pub fn is_for(&self, action: &Arc<Action>) -> bool {
        Arc::ptr_eq(&self.action, action)
    }
}
