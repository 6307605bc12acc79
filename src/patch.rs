//! JSON patches derived from layout updates.
//!
//! A [`VdomJsonPatch`] carries the path of the re-rendered node and the `add` /
//! `replace` / `remove` operations that turn its old fragment into the new one. Operation
//! paths are JSON pointers relative to the node.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use tideline_core::child_pointer;

use crate::LayoutError;
use crate::layout::LayoutUpdate;

/// One patch operation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "op", rename_all = "lowercase")]
pub enum PatchOperation {
    /// Insert a member or array element.
    Add {
        /// Pointer of the new value.
        path: String,
        /// The inserted value.
        value: Value,
    },
    /// Overwrite an existing value.
    Replace {
        /// Pointer of the replaced value.
        path: String,
        /// The new value.
        value: Value,
    },
    /// Delete a member or array element.
    Remove {
        /// Pointer of the removed value.
        path: String,
    },
}

/// A [`LayoutUpdate`] expressed as a list of patch operations.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct VdomJsonPatch {
    /// Path of the re-rendered node, empty for the root.
    pub path: String,
    /// Operations relative to that node.
    pub changes: Vec<PatchOperation>,
}

/// A patch operation that does not fit the document it is applied to.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum PatchError {
    /// The pointer is not a valid JSON pointer.
    #[error("invalid json pointer: {0}")]
    InvalidPointer(String),
    /// The pointer does not resolve to a value that can be changed.
    #[error("path does not exist: {0}")]
    MissingPath(String),
}

impl VdomJsonPatch {
    /// Diffs the old and new fragments of `update`.
    ///
    /// A first render diffs against an empty object, so every member is an `add`.
    ///
    /// # Errors
    ///
    /// Returns [`LayoutError::Serialize`] if a fragment cannot be converted to JSON.
    pub fn from_update(update: &LayoutUpdate) -> Result<Self, LayoutError> {
        let old = match &update.old {
            Some(old) => serde_json::to_value(old)?,
            None => Value::Object(Map::new()),
        };
        let new = serde_json::to_value(&update.new)?;

        let mut changes = Vec::new();
        diff_values(String::new(), &old, &new, &mut changes);
        Ok(Self {
            path: update.path.clone(),
            changes,
        })
    }

    /// Applies the operations to the node's old fragment, in order.
    ///
    /// # Errors
    ///
    /// Returns a [`PatchError`] for the first operation that does not apply.
    pub fn apply(&self, node: &mut Value) -> Result<(), PatchError> {
        for change in &self.changes {
            match change {
                PatchOperation::Add { path, value } | PatchOperation::Replace { path, value } => {
                    set_path(node, path, value.clone())?;
                }
                PatchOperation::Remove { path } => remove_path(node, path)?,
            }
        }
        Ok(())
    }
}

fn diff_values(pointer: String, old: &Value, new: &Value, changes: &mut Vec<PatchOperation>) {
    match (old, new) {
        (Value::Object(old), Value::Object(new)) => {
            for name in old.keys() {
                if !new.contains_key(name) {
                    changes.push(PatchOperation::Remove {
                        path: child_pointer(&pointer, name),
                    });
                }
            }
            for (name, value) in new {
                let path = child_pointer(&pointer, name);
                match old.get(name) {
                    Some(previous) => diff_values(path, previous, value, changes),
                    None => changes.push(PatchOperation::Add {
                        path,
                        value: value.clone(),
                    }),
                }
            }
        }
        (Value::Array(old), Value::Array(new)) => {
            for (index, (previous, value)) in old.iter().zip(new).enumerate() {
                diff_values(format!("{pointer}/{index}"), previous, value, changes);
            }
            for (index, value) in new.iter().enumerate().skip(old.len()) {
                changes.push(PatchOperation::Add {
                    path: format!("{pointer}/{index}"),
                    value: value.clone(),
                });
            }
            for index in (new.len()..old.len()).rev() {
                changes.push(PatchOperation::Remove {
                    path: format!("{pointer}/{index}"),
                });
            }
        }
        _ if old == new => {}
        _ => changes.push(PatchOperation::Replace {
            path: pointer,
            value: new.clone(),
        }),
    }
}

fn parse_pointer(path: &str) -> Result<Vec<String>, PatchError> {
    if path.is_empty() {
        return Ok(Vec::new());
    }
    let Some(rest) = path.strip_prefix('/') else {
        return Err(PatchError::InvalidPointer(path.to_string()));
    };
    Ok(rest
        .split('/')
        .map(|token| token.replace("~1", "/").replace("~0", "~"))
        .collect())
}

fn descend<'a>(current: &'a mut Value, token: &str, path: &str) -> Result<&'a mut Value, PatchError> {
    let next = match current {
        Value::Object(map) => map.get_mut(token),
        Value::Array(items) => token.parse::<usize>().ok().and_then(|index| items.get_mut(index)),
        _ => None,
    };
    next.ok_or_else(|| PatchError::MissingPath(path.to_string()))
}

fn set_path(root: &mut Value, path: &str, value: Value) -> Result<(), PatchError> {
    let tokens = parse_pointer(path)?;
    let Some((last, parents)) = tokens.split_last() else {
        *root = value;
        return Ok(());
    };

    let mut current = root;
    for token in parents {
        current = descend(current, token, path)?;
    }

    match current {
        Value::Object(map) => {
            map.insert(last.clone(), value);
            Ok(())
        }
        Value::Array(items) => match last.parse::<usize>() {
            Ok(index) if index == items.len() => {
                items.push(value);
                Ok(())
            }
            Ok(index) if index < items.len() => {
                items[index] = value;
                Ok(())
            }
            _ => Err(PatchError::MissingPath(path.to_string())),
        },
        _ => Err(PatchError::MissingPath(path.to_string())),
    }
}

fn remove_path(root: &mut Value, path: &str) -> Result<(), PatchError> {
    let tokens = parse_pointer(path)?;
    let Some((last, parents)) = tokens.split_last() else {
        *root = Value::Object(Map::new());
        return Ok(());
    };

    let mut current = root;
    for token in parents {
        current = descend(current, token, path)?;
    }

    let removed = match current {
        Value::Object(map) => map.remove(last).is_some(),
        Value::Array(items) => match last.parse::<usize>() {
            Ok(index) if index < items.len() => {
                items.remove(index);
                true
            }
            _ => false,
        },
        _ => false,
    };

    if removed {
        Ok(())
    } else {
        Err(PatchError::MissingPath(path.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use tideline_core::VdomJson;

    fn update(old: Option<Value>, new: Value) -> LayoutUpdate {
        LayoutUpdate {
            path: String::new(),
            old: old.map(|old| serde_json::from_value(old).unwrap()),
            new: serde_json::from_value::<VdomJson>(new).unwrap(),
        }
    }

    #[test]
    fn first_render_adds_every_member() {
        let patch = VdomJsonPatch::from_update(&update(None, json!({"tagName": "div"}))).unwrap();
        assert_eq!(
            serde_json::to_value(&patch.changes).unwrap(),
            json!([{"op": "add", "path": "/tagName", "value": "div"}])
        );
    }

    #[test]
    fn changed_tag_is_replaced() {
        let patch = VdomJsonPatch::from_update(&update(
            Some(json!({"tagName": "div"})),
            json!({"tagName": "table"}),
        ))
        .unwrap();
        assert_eq!(
            patch.changes,
            [PatchOperation::Replace {
                path: "/tagName".to_string(),
                value: json!("table"),
            }]
        );
    }

    #[test]
    fn shrinking_children_removes_from_the_end() {
        let patch = VdomJsonPatch::from_update(&update(
            Some(json!({"tagName": "ul", "children": ["a", "b", "c"]})),
            json!({"tagName": "ul", "children": ["a"]}),
        ))
        .unwrap();
        assert_eq!(
            patch.changes,
            [
                PatchOperation::Remove {
                    path: "/children/2".to_string()
                },
                PatchOperation::Remove {
                    path: "/children/1".to_string()
                },
            ]
        );
    }

    #[test]
    fn applying_the_patch_yields_the_new_fragment() {
        let old = json!({
            "tagName": "div",
            "attributes": {"class": "a/b"},
            "children": ["x", {"tagName": "span"}]
        });
        let new = json!({
            "tagName": "div",
            "attributes": {"class": "c"},
            "children": [{"tagName": "p"}, {"tagName": "span", "key": 1}, "y"],
            "eventHandlers": {"onClick": {"target": "t", "preventDefault": false, "stopPropagation": false}}
        });
        let patch = VdomJsonPatch::from_update(&update(Some(old.clone()), new.clone())).unwrap();

        let mut node = old;
        patch.apply(&mut node).unwrap();
        assert_eq!(node, new);
    }

    #[test]
    fn pointer_tokens_are_escaped() {
        assert_eq!(child_pointer("", "a/b~c"), "/a~1b~0c");
        assert_eq!(parse_pointer("/a~1b~0c").unwrap(), ["a/b~c"]);
        assert!(parse_pointer("nope").is_err());
    }
}
