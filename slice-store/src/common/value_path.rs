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

//! Dotted-path access into JSON values.
//!
//! Writers mutate the value they are given. Copy-on-write of shared snapshots happens one
//! level up, in the state stream.

use serde_json::{Map, Value};
use tracing::warn;

/// Splits `"a.b.c"` into its segments. Empty segments are dropped.
pub(crate) fn split_path(path: &str) -> Vec<String> {
    path.split('.')
        .filter(|segment| !segment.is_empty())
        .map(str::to_string)
        .collect()
}

/// Reads the value at `segments`, or `None` if any segment is missing.
///
/// Arrays are indexed by numeric segments; any other non-object intermediate ends the
/// walk with `None`.
pub(crate) fn get_path<'a>(root: &'a Value, segments: &[String]) -> Option<&'a Value> {
    segments.iter().try_fold(root, |current, segment| match current {
        Value::Object(map) => map.get(segment),
        Value::Array(items) => segment.parse::<usize>().ok().and_then(|i| items.get(i)),
        _ => None,
    })
}

/// Stores `value` at `segments` inside `root`.
///
/// Missing intermediates become empty objects. A non-object intermediate is replaced
/// by an empty object.
pub(crate) fn set_path(root: &mut Value, segments: &[String], value: Value) {
    *slot_mut(root, segments) = value;
}

/// Deep-merges `value` into whatever already sits at `segments` inside `root`.
pub(crate) fn merge_at(root: &mut Value, segments: &[String], value: Value) {
    deep_merge(slot_mut(root, segments), value);
}

/// Merges `source` into `target`: objects merge key by key, recursively; anything
/// else replaces the target.
pub(crate) fn deep_merge(target: &mut Value, source: Value) {
    match (target, source) {
        (Value::Object(target), Value::Object(source)) => {
            for (key, value) in source {
                match target.get_mut(&key) {
                    Some(existing) => deep_merge(existing, value),
                    None => {
                        target.insert(key, value);
                    }
                }
            }
        }
        (target, source) => *target = source,
    }
}

/// Shallow-merges the fields of `partial` over the value at `segments`.
///
/// A non-object target is replaced by an empty object first.
pub(crate) fn shallow_merge(root: &mut Value, segments: &[String], partial: Map<String, Value>) {
    let slot = slot_mut(root, segments);
    if !slot.is_object() {
        *slot = Value::Object(Map::new());
    }
    if let Value::Object(fields) = slot {
        fields.extend(partial);
    }
}

fn slot_mut<'a>(root: &'a mut Value, segments: &[String]) -> &'a mut Value {
    segments.iter().fold(root, |current, segment| {
        let index = match &*current {
            Value::Array(items) => segment.parse::<usize>().ok().filter(|i| *i < items.len()),
            _ => None,
        };
        if let Some(index) = index {
            return match current {
                Value::Array(items) => &mut items[index],
                _ => unreachable!("index is only computed for arrays"),
            };
        }
        if !current.is_object() {
            if !current.is_null() {
                warn!(segment = %segment, "Replacing non-object value on state path");
            }
            *current = Value::Object(Map::new());
        }
        match current {
            Value::Object(map) => map
                .entry(segment.clone())
                .or_insert_with(|| Value::Object(Map::new())),
            _ => unreachable!("intermediate was just replaced by an object"),
        }
    })
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;

    fn segs(path: &str) -> Vec<String> {
        split_path(path)
    }

    #[test]
    fn reads_through_objects_and_arrays() {
        let root = json!({ "todos": { "items": [ { "title": "milk" } ] } });
        assert_eq!(
            get_path(&root, &segs("todos.items.0.title")),
            Some(&json!("milk"))
        );
        assert_eq!(get_path(&root, &segs("todos.missing.title")), None);
        assert_eq!(get_path(&root, &segs("todos.items.title")), None);
        assert_eq!(get_path(&root, &[]), Some(&root));
    }

    #[test]
    fn set_creates_placeholders() {
        let mut root = json!({ "a": { "x": 1 } });
        set_path(&mut root, &segs("a.b.c"), json!(2));
        assert_eq!(root, json!({ "a": { "x": 1, "b": { "c": 2 } } }));
    }

    #[test]
    fn set_replaces_scalar_intermediates() {
        let mut root = json!({ "a": 5 });
        set_path(&mut root, &segs("a.b"), json!(true));
        assert_eq!(root, json!({ "a": { "b": true } }));
    }

    #[test]
    fn set_indexes_existing_array_slots() {
        let mut root = json!({ "list": [1, 2, 3] });
        set_path(&mut root, &segs("list.1"), json!(20));
        assert_eq!(root, json!({ "list": [1, 20, 3] }));
    }

    #[test]
    fn merge_keeps_existing_children() {
        let mut root = json!({ "a": { "b": { "y": 2 } } });
        merge_at(&mut root, &segs("a"), json!({ "x": 1 }));
        assert_eq!(root, json!({ "a": { "x": 1, "b": { "y": 2 } } }));
    }

    #[test]
    fn shallow_merge_overwrites_top_level_fields_only() {
        let mut root = json!({ "m": { "value": 1, "nested": { "keep": true }, "other": 0 } });
        let Value::Object(partial) = json!({ "value": 2, "nested": { "other": 1 } }) else {
            unreachable!()
        };
        shallow_merge(&mut root, &segs("m"), partial);
        assert_eq!(
            root,
            json!({ "m": { "value": 2, "nested": { "other": 1 }, "other": 0 } })
        );
    }

    #[test]
    fn shallow_merge_replaces_non_object_targets() {
        let mut root = json!({ "m": 3 });
        let Value::Object(partial) = json!({ "value": 2 }) else {
            unreachable!()
        };
        shallow_merge(&mut root, &segs("m"), partial);
        assert_eq!(root, json!({ "m": { "value": 2 } }));
    }
}
