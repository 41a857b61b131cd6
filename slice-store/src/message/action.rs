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

use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::message::StoreError;
use crate::traits::ActionType;

/// A message describing an intended state transition.
///
/// An action is a discriminant (`type`) plus arbitrary payload fields. It serializes to
/// a flat JSON object, so `Action::new("AddTodo").with("title", "milk")` and
/// `{"type": "AddTodo", "title": "milk"}` are the same action.
///
/// Once dispatched, an action is shared as an `Arc<Action>`. Lifecycle events are
/// correlated by the identity of that `Arc`, never by the type string, so two
/// dispatches of equal actions are tracked independently.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Action {
    #[serde(rename = "type")]
    kind: String,
    #[serde(flatten)]
    payload: Map<String, Value>,
}

impl Action {
    /// Creates an action with the given type and an empty payload.
    pub fn new(kind: impl Into<String>) -> Self {
        Self {
            kind: kind.into(),
            payload: Map::new(),
        }
    }

    /// Builds an action from a typed value.
    ///
    /// The value must serialize to a JSON object (or a unit struct); its fields become
    /// the payload and [`ActionType::TYPE`] becomes the discriminant.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError::Payload`] if the value does not serialize to an object.
    pub fn of<A>(value: &A) -> Result<Self, StoreError>
    where
        A: ActionType + Serialize,
    {
        let payload = match serde_json::to_value(value)
            .map_err(|e| StoreError::Payload(format!("{}: {e}", A::TYPE)))?
        {
            Value::Object(map) => map,
            Value::Null => Map::new(),
            other => {
                return Err(StoreError::Payload(format!(
                    "{} must serialize to a JSON object, got {other}",
                    A::TYPE
                )))
            }
        };
        Ok(Self {
            kind: A::TYPE.to_string(),
            payload,
        })
    }

    /// Adds (or replaces) a payload field.
    #[must_use]
    pub fn with(mut self, key: impl Into<String>, value: impl Into<Value>) -> Self {
        self.payload.insert(key.into(), value.into());
        self
    }

    /// The action's discriminant.
    #[inline]
    #[must_use]
    pub fn kind(&self) -> &str {
        &self.kind
    }

    /// The payload fields.
    #[inline]
    #[must_use]
    pub fn payload(&self) -> &Map<String, Value> {
        &self.payload
    }

    /// Looks up a single payload field.
    #[must_use]
    pub fn get(&self, key: &str) -> Option<&Value> {
        self.payload.get(key)
    }

    /// Returns `true` if this action carries the discriminant of `A`.
    #[must_use]
    pub fn is<A: ActionType>(&self) -> bool {
        self.kind == A::TYPE
    }

    /// Deserializes the payload into a typed value.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError::Payload`] if the payload does not match `T`.
    pub fn payload_as<T: DeserializeOwned>(&self) -> Result<T, StoreError> {
        serde_json::from_value(Value::Object(self.payload.clone()))
            .map_err(|e| StoreError::Payload(format!("{}: {e}", self.kind)))
    }

    pub(crate) fn validate(&self) -> Result<(), StoreError> {
        if self.kind.trim().is_empty() {
            return Err(StoreError::Dispatch(
                "action must carry a non-empty `type`".to_string(),
            ));
        }
        Ok(())
    }
}

impl TryFrom<Value> for Action {
    type Error = StoreError;

    /// Reads a plain JSON action: an object whose `type` field is a non-empty string.
    fn try_from(value: Value) -> Result<Self, Self::Error> {
        let Value::Object(mut payload) = value else {
            return Err(StoreError::Dispatch(format!(
                "action must be a JSON object, got {value}"
            )));
        };
        let kind = match payload.remove("type") {
            Some(Value::String(kind)) if !kind.trim().is_empty() => kind,
            Some(other) => {
                return Err(StoreError::Dispatch(format!(
                    "action `type` must be a non-empty string, got {other}"
                )))
            }
            None => {
                return Err(StoreError::Dispatch(
                    "action is missing its `type` field".to_string(),
                ))
            }
        };
        Ok(Self { kind, payload })
    }
}

impl From<Action> for Value {
    fn from(action: Action) -> Self {
        let mut object = action.payload;
        object.insert("type".to_string(), Value::String(action.kind));
        Value::Object(object)
    }
}
