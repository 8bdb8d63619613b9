//! # Field Errors
//!
//! The per-field error tree the form renders from. Errors are a dynamic
//! JSON object keyed by field path — `address`, `amount`,
//! `outputs[2].amount`, `feePerUnit` — because outer layers merge their
//! own entries into the same tree and the engine must tolerate whatever
//! shape lands there. The search helpers therefore walk *arbitrary*
//! values defensively: junk input yields no matches, never a panic.
//!
//! Two error kinds exist. `validate` errors come from local field
//! checks and block composition. `compose` errors come from a compose
//! attempt (e.g. "amount is not enough") and are cleared wholesale
//! before the next attempt — they describe the previous result, not the
//! current input.

use serde::{Deserialize, Serialize};
use serde_json::{json, Map, Value};

// ---------------------------------------------------------------------------
// ErrorKind
// ---------------------------------------------------------------------------

/// Where a field error came from; decides its lifecycle.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ErrorKind {
    /// Local field validation. Blocks composition until fixed.
    Validate,
    /// Result of a compose attempt. Cleared before the next attempt.
    Compose,
}

impl ErrorKind {
    fn tag(self) -> &'static str {
        match self {
            Self::Validate => "validate",
            Self::Compose => "compose",
        }
    }
}

// ---------------------------------------------------------------------------
// FormErrors
// ---------------------------------------------------------------------------

/// The error tree for one form.
///
/// Top-level fields live directly under the root; per-output fields live
/// under `outputs[i]`. Each leaf is `{ "type": ..., "message": ... }`.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct FormErrors {
    tree: Value,
}

impl FormErrors {
    pub fn new() -> Self {
        Self { tree: json!({}) }
    }

    /// Set an error on a top-level field, replacing any existing one.
    pub fn set_field(&mut self, field: &str, kind: ErrorKind, message: &str) {
        self.root_mut().insert(
            field.to_string(),
            json!({ "type": kind.tag(), "message": message }),
        );
    }

    /// Set an error on `outputs[index].field`, growing the outputs array
    /// with nulls as needed so untouched outputs stay hole-shaped.
    pub fn set_output_field(&mut self, index: usize, field: &str, kind: ErrorKind, message: &str) {
        let outputs = self
            .root_mut()
            .entry("outputs".to_string())
            .or_insert_with(|| json!([]));
        let arr = match outputs.as_array_mut() {
            Some(arr) => arr,
            // Something else claimed the key; rebuild it as an array.
            None => {
                *outputs = json!([]);
                outputs.as_array_mut().expect("just assigned an array")
            }
        };
        while arr.len() <= index {
            arr.push(Value::Null);
        }
        if !arr[index].is_object() {
            arr[index] = json!({});
        }
        arr[index]
            .as_object_mut()
            .expect("just assigned an object")
            .insert(
                field.to_string(),
                json!({ "type": kind.tag(), "message": message }),
            );
    }

    /// True when any error is *not* a compose error — those come from
    /// field validation and make the form unsendable.
    pub fn has_blocking_errors(&self) -> bool {
        fn walk(value: &Value) -> bool {
            match value {
                Value::Object(map) => {
                    if let Some(Value::String(tag)) = map.get("type") {
                        return tag != "compose";
                    }
                    map.values().any(walk)
                }
                Value::Array(items) => items.iter().any(walk),
                _ => false,
            }
        }
        walk(&self.tree)
    }

    /// Drop every compose-kind error, pruning emptied containers. Run
    /// before each compose attempt so stale results don't linger.
    pub fn clear_compose_errors(&mut self) {
        fn prune(value: &mut Value) {
            match value {
                Value::Object(map) => {
                    map.retain(|_, v| {
                        if v.get("type").and_then(Value::as_str) == Some("compose") {
                            return false;
                        }
                        prune(v);
                        !is_hollow(v)
                    });
                }
                Value::Array(items) => {
                    for item in items.iter_mut() {
                        if item.get("type").and_then(Value::as_str) == Some("compose") {
                            *item = Value::Null;
                        } else {
                            prune(item);
                        }
                    }
                    while items.last().map_or(false, is_hollow) {
                        items.pop();
                    }
                }
                _ => {}
            }
        }
        fn is_hollow(value: &Value) -> bool {
            match value {
                Value::Null => true,
                Value::Object(map) => map.is_empty(),
                Value::Array(items) => items.is_empty(),
                _ => false,
            }
        }
        prune(&mut self.tree);
    }

    pub fn is_empty(&self) -> bool {
        self.tree.as_object().map_or(true, Map::is_empty)
    }

    /// The raw tree, for rendering or merging by outer layers.
    pub fn as_value(&self) -> &Value {
        &self.tree
    }

    fn root_mut(&mut self) -> &mut Map<String, Value> {
        if !self.tree.is_object() {
            self.tree = json!({});
        }
        self.tree.as_object_mut().expect("root is an object")
    }
}

// ---------------------------------------------------------------------------
// Compose-error search
// ---------------------------------------------------------------------------

/// Collect the paths of every compose-kind error in `value`.
///
/// Walks arbitrary trees: non-object roots yield nothing, arrays under
/// any key are treated as output lists (elements become `outputs[i]`),
/// and an object counts as an error leaf only when its `type` is
/// exactly `"compose"`.
pub fn find_compose_errors(value: &Value, prefix: Option<&str>) -> Vec<String> {
    let mut paths = Vec::new();
    let map = match value.as_object() {
        Some(map) => map,
        None => return paths,
    };
    for (key, entry) in map {
        match entry {
            Value::Array(items) => {
                for (i, item) in items.iter().enumerate() {
                    paths.extend(find_compose_errors(item, Some(&format!("outputs[{i}]"))));
                }
            }
            Value::Object(inner) => {
                if inner.get("type").and_then(Value::as_str) == Some("compose") {
                    match prefix {
                        Some(prefix) => paths.push(format!("{prefix}.{key}")),
                        None => paths.push(key.clone()),
                    }
                }
            }
            _ => {}
        }
    }
    paths
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
