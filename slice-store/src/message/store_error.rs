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
use std::sync::Arc;

/// Errors produced by the store.
///
/// Configuration and dispatch-call errors are returned synchronously. Handler errors
/// travel asynchronously: they are attached to the `Errored` [`ActionContext`](crate::message::ActionContext)
/// and surface as the rejection of that action's dispatch future.
///
/// The enum is `Clone` so a single failure can be fanned out to every action-bus
/// subscriber, the waiting dispatcher and the error observer.
#[derive(Debug, Clone, thiserror::Error)]
pub enum StoreError {
    /// A module was declared incorrectly or the module graph contains a cycle.
    #[error("configuration error: {0}")]
    Configuration(String),
    /// An action without a usable `type` was handed to `dispatch`.
    #[error("dispatch error: {0}")]
    Dispatch(String),
    /// A handler returned an error, its future or stream failed, or it panicked.
    #[error("handler for action `{action}` failed: {source}")]
    Handler {
        /// The type of the action being handled.
        action: String,
        /// The captured failure.
        #[source]
        source: HandlerError,
    },
    /// A projection function failed while evaluating a selector.
    #[error("selector `{selector}` failed: {message}")]
    Selector {
        /// Description of the selector that failed.
        selector: String,
        /// The projection failure, rendered with its causes.
        message: String,
    },
    /// An action payload or state slice could not be converted to or from JSON.
    #[error("payload error: {0}")]
    Payload(String),
    /// The store went away before the action reached a terminal status.
    #[error("store closed before `{0}` completed")]
    Closed(String),
}

impl StoreError {
    pub(crate) fn handler(action: &str, error: anyhow::Error) -> Self {
        StoreError::Handler {
            action: action.to_string(),
            source: HandlerError(Arc::new(error)),
        }
    }

    /// Returns the captured handler failure, if this is a [`StoreError::Handler`].
    #[must_use]
    pub fn as_handler_error(&self) -> Option<&HandlerError> {
        match self {
            StoreError::Handler { source, .. } => Some(source),
            _ => None,
        }
    }
}

/// A shareable wrapper around the error a handler produced.
#[derive(Clone)]
pub struct HandlerError(Arc<anyhow::Error>);

impl HandlerError {
    /// The underlying error.
    #[must_use]
    pub fn inner(&self) -> &anyhow::Error {
        &self.0
    }

    /// Attempts to downcast the underlying error to a concrete type.
    #[must_use]
    pub fn downcast_ref<E>(&self) -> Option<&E>
    where
        E: fmt::Display + fmt::Debug + Send + Sync + 'static,
    {
        self.0.downcast_ref::<E>()
    }
}

impl fmt::Debug for HandlerError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Debug::fmt(&*self.0, f)
    }
}

impl fmt::Display for HandlerError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:#}", self.0)
    }
}

impl std::error::Error for HandlerError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        self.0.source()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[derive(Debug)]
    struct OutOfStock;

    impl fmt::Display for OutOfStock {
        fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
            write!(f, "out of stock")
        }
    }

    impl std::error::Error for OutOfStock {}

    #[test]
    fn handler_errors_keep_their_concrete_type() {
        let error = StoreError::handler("Checkout", anyhow::Error::new(OutOfStock));
        let handler_error = error.as_handler_error().expect("handler variant");
        assert!(handler_error.downcast_ref::<OutOfStock>().is_some());
        assert_eq!(
            error.to_string(),
            "handler for action `Checkout` failed: out of stock"
        );
    }

    #[test]
    fn clones_share_the_same_failure() {
        let error = StoreError::handler("Checkout", anyhow::anyhow!("boom"));
        let copy = error.clone();
        assert_eq!(error.to_string(), copy.to_string());
    }
}
