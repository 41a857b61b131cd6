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

use serde::de::DeserializeOwned;
use serde_json::Value;

use crate::common::value_path::{get_path, split_path};
use crate::message::StoreError;

type Projection<R> = dyn Fn(&Value) -> Result<R, StoreError> + Send + Sync + 'static;

/// A projection from the composite state to a value of type `R`.
///
/// Selectors are built once and evaluated against every snapshot. A dotted path string
/// converts into a `Selector<Option<Value>>` directly:
///
/// ```rust,ignore
/// let value = store.select_snapshot("counter.value")?;
/// let items = Selector::from_fn(|state| state["cart"]["items"].as_array().map_or(0, Vec::len));
/// let total = store.select_snapshot(items)?;
/// ```
pub struct Selector<R> {
    projection: Arc<Projection<R>>,
    description: Arc<str>,
}

impl<R> Clone for Selector<R> {
    fn clone(&self) -> Self {
        Self {
            projection: self.projection.clone(),
            description: self.description.clone(),
        }
    }
}

impl Selector<Option<Value>> {
    /// Selects the value at a dotted path.
    ///
    /// Yields `None` when any segment is missing or traverses a non-object.
    #[must_use]
    pub fn path(path: &str) -> Self {
        let segments = split_path(path);
        Self {
            projection: Arc::new(move |state: &Value| Ok(get_path(state, &segments).cloned())),
            description: Arc::from(path),
        }
    }

    /// Deserializes the selected value, yielding `None` when the path is missing.
    #[must_use]
    pub fn as_type<T>(self) -> Selector<Option<T>>
    where
        T: DeserializeOwned + 'static,
    {
        let description = self.description.clone();
        let projection = self.projection;
        Selector {
            projection: Arc::new(move |state: &Value| {
                projection(state)?
                    .map(serde_json::from_value)
                    .transpose()
                    .map_err(|e| StoreError::Selector {
                        selector: description.to_string(),
                        message: e.to_string(),
                    })
            }),
            description: self.description,
        }
    }
}

impl<R: 'static> Selector<R> {
    /// Wraps an infallible projection function.
    pub fn from_fn<F>(f: F) -> Self
    where
        F: Fn(&Value) -> R + Send + Sync + 'static,
    {
        Self {
            projection: Arc::new(move |state: &Value| Ok(f(state))),
            description: Arc::from("fn"),
        }
    }

    /// Wraps a fallible projection function. Its errors surface as
    /// [`StoreError::Selector`].
    pub fn try_from_fn<F>(f: F) -> Self
    where
        F: Fn(&Value) -> anyhow::Result<R> + Send + Sync + 'static,
    {
        Self {
            projection: Arc::new(move |state: &Value| {
                f(state).map_err(|e| StoreError::Selector {
                    selector: "fn".to_string(),
                    message: format!("{e:#}"),
                })
            }),
            description: Arc::from("fn"),
        }
    }

    /// Maps the projected value.
    #[must_use]
    pub fn map<U, F>(self, f: F) -> Selector<U>
    where
        U: 'static,
        F: Fn(R) -> U + Send + Sync + 'static,
    {
        let projection = self.projection;
        Selector {
            projection: Arc::new(move |state: &Value| projection(state).map(&f)),
            description: self.description,
        }
    }

    /// Evaluates the projection against one snapshot.
    ///
    /// # Errors
    ///
    /// Returns the projection function's error.
    pub fn evaluate(&self, state: &Value) -> Result<R, StoreError> {
        (self.projection)(state)
    }

    /// A short label for logs: the path for path selectors, `fn` otherwise.
    #[must_use]
    pub fn description(&self) -> &str {
        &self.description
    }
}

impl From<&str> for Selector<Option<Value>> {
    fn from(path: &str) -> Self {
        Selector::path(path)
    }
}

impl From<String> for Selector<Option<Value>> {
    fn from(path: String) -> Self {
        Selector::path(&path)
    }
}

impl<R> fmt::Debug for Selector<R> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Selector")
            .field("description", &self.description)
            .finish_non_exhaustive()
    }
}
