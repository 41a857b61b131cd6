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

use tracing::error;

use crate::message::{Action, StoreError};

/// Receives every error a dispatch ends with, whether or not the caller awaits it.
pub trait ErrorObserver: Send + Sync + 'static {
    /// Called once per failed dispatch.
    fn observe(&self, action: &Action, error: &StoreError);
}

/// The default observer: logs through `tracing`.
#[derive(Debug, Default, Clone, Copy)]
pub struct TracingErrorObserver;

impl ErrorObserver for TracingErrorObserver {
    fn observe(&self, action: &Action, error: &StoreError) {
        error!(action = action.kind(), error = %error, "Dispatch failed");
    }
}

pub(crate) struct FnErrorObserver<F>(pub(crate) F);

impl<F> ErrorObserver for FnErrorObserver<F>
where
    F: Fn(&Action, &StoreError) + Send + Sync + 'static,
{
    fn observe(&self, action: &Action, error: &StoreError) {
        (self.0)(action, error);
    }
}
