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
use std::future::Future;
use std::pin::Pin;
use std::task::{Context, Poll};

use futures::future::BoxFuture;
use futures::FutureExt;

use crate::message::StoreError;

/// Resolves when a dispatch reaches its terminal status.
///
/// The dispatch itself is already running when the handle is returned; awaiting the handle
/// only observes the result, and dropping it does not cancel anything.
///
/// For a single dispatch the output is `Ok(Some(snapshot))` when the action was
/// `Successful`, `Ok(None)` when it was `Canceled`, and `Err(..)` when it `Errored`.
#[must_use = "a dispatch handle does nothing unless awaited; drop it to ignore the result"]
pub struct DispatchHandle<T> {
    inner: BoxFuture<'static, Result<T, StoreError>>,
}

impl<T> DispatchHandle<T> {
    pub(crate) fn new<F>(future: F) -> Self
    where
        F: Future<Output = Result<T, StoreError>> + Send + 'static,
    {
        Self {
            inner: Box::pin(future),
        }
    }
}

impl<T> Future for DispatchHandle<T> {
    type Output = Result<T, StoreError>;

    fn poll(mut self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Self::Output> {
        self.inner.poll_unpin(cx)
    }
}

impl<T> fmt::Debug for DispatchHandle<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("DispatchHandle").finish_non_exhaustive()
    }
}
