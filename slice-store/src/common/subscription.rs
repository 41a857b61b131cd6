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

use tokio_util::sync::CancellationToken;
use tracing::trace;

/// Keeps a callback subscription alive.
///
/// The callback stops being invoked when the `Subscription` is dropped or
/// [`unsubscribe`](Subscription::unsubscribe) is called.
#[derive(Debug)]
#[must_use = "the subscription ends as soon as this value is dropped"]
pub struct Subscription {
    token: CancellationToken,
}

impl Subscription {
    pub(crate) fn new(token: CancellationToken) -> Self {
        Self { token }
    }

    /// Ends the subscription.
    pub fn unsubscribe(self) {}

    /// Returns `true` until the subscription is ended.
    #[must_use]
    pub fn is_active(&self) -> bool {
        !self.token.is_cancelled()
    }
}

impl Drop for Subscription {
    fn drop(&mut self) {
        trace!("Ending state subscription");
        self.token.cancel();
    }
}
