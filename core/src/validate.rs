//! Schema check for serialized fragments.
//!
//! Used by the layout when output verification is enabled. The check walks the whole
//! fragment and reports the first violation together with the JSON pointer at which it
//! was found.

use alloc::{format, string::String};

use serde_json::{Map, Value};

/// Appends `token` to a JSON pointer, escaping `~` and `/` as RFC 6901 requires.
#[must_use]
pub fn child_pointer(pointer: &str, token: &str) -> String {
    format!("{pointer}/{}", token.replace('~', "~0").replace('/', "~1"))
}

/// A serialized fragment that does not match the expected shape.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("invalid vdom at '{pointer}': {reason}")]
pub struct ValidationError {
    /// JSON pointer to the offending value, `/` for the root.
    pub pointer: String,
    /// What was expected there.
    pub reason: String,
}

impl ValidationError {
    fn new(pointer: &str, reason: impl Into<String>) -> Self {
        Self {
            pointer: if pointer.is_empty() {
                String::from("/")
            } else {
                String::from(pointer)
            },
            reason: reason.into(),
        }
    }
}

/// Checks that `value` is a well formed fragment.
///
/// # Errors
///
/// Returns the first [`ValidationError`] found, in document order.
///
/// # Example
///
/// ```rust
/// use serde_json::json;
/// use tideline_core::validate_vdom_json;
///
/// assert!(validate_vdom_json(&json!({"tagName": "div", "children": ["hi"]})).is_ok());
/// assert!(validate_vdom_json(&json!({"children": []})).is_err());
/// ```
pub fn validate_vdom_json(value: &Value) -> Result<(), ValidationError> {
    validate_element(value, "")
}

fn validate_element(value: &Value, pointer: &str) -> Result<(), ValidationError> {
    let Some(object) = value.as_object() else {
        return Err(ValidationError::new(pointer, "expected an object"));
    };

    match object.get("tagName") {
        Some(Value::String(_)) => {}
        Some(_) => {
            return Err(ValidationError::new(
                &format!("{pointer}/tagName"),
                "expected a string",
            ));
        }
        None => return Err(ValidationError::new(pointer, "missing 'tagName'")),
    }

    for (name, member) in object {
        let member_pointer = child_pointer(pointer, name);
        match name.as_str() {
            "tagName" => {}
            "key" => {
                if !(member.is_string() || member.is_number()) {
                    return Err(ValidationError::new(
                        &member_pointer,
                        "expected a string or a number",
                    ));
                }
            }
            "error" => {
                if !member.is_string() {
                    return Err(ValidationError::new(&member_pointer, "expected a string"));
                }
            }
            "attributes" => {
                if !member.is_object() {
                    return Err(ValidationError::new(&member_pointer, "expected an object"));
                }
            }
            "children" => validate_children(member, &member_pointer)?,
            "eventHandlers" => validate_event_handlers(member, &member_pointer)?,
            "importSource" => validate_import_source(member, &member_pointer)?,
            _ => {
                return Err(ValidationError::new(
                    &member_pointer,
                    "unexpected member",
                ));
            }
        }
    }

    Ok(())
}

fn validate_children(value: &Value, pointer: &str) -> Result<(), ValidationError> {
    let Some(children) = value.as_array() else {
        return Err(ValidationError::new(pointer, "expected an array"));
    };

    for (index, child) in children.iter().enumerate() {
        let index_pointer = format!("{pointer}/{index}");
        match child {
            Value::String(_) => {}
            Value::Object(_) => validate_element(child, &index_pointer)?,
            _ => {
                return Err(ValidationError::new(
                    &index_pointer,
                    "expected a string or an object",
                ));
            }
        }
    }

    Ok(())
}

fn validate_event_handlers(value: &Value, pointer: &str) -> Result<(), ValidationError> {
    let Some(handlers) = value.as_object() else {
        return Err(ValidationError::new(pointer, "expected an object"));
    };

    for (event, handler) in handlers {
        let handler_pointer = child_pointer(pointer, event);
        let Some(handler) = handler.as_object() else {
            return Err(ValidationError::new(&handler_pointer, "expected an object"));
        };
        expect_string(handler, "target", &handler_pointer)?;
        for flag in ["preventDefault", "stopPropagation"] {
            if handler.get(flag).is_some_and(|value| !value.is_boolean()) {
                return Err(ValidationError::new(
                    &format!("{handler_pointer}/{flag}"),
                    "expected a boolean",
                ));
            }
        }
    }

    Ok(())
}

fn validate_import_source(value: &Value, pointer: &str) -> Result<(), ValidationError> {
    let Some(source) = value.as_object() else {
        return Err(ValidationError::new(pointer, "expected an object"));
    };

    expect_string(source, "source", pointer)?;
    match source.get("sourceType").and_then(Value::as_str) {
        Some("NAME" | "URL") => {}
        _ => {
            return Err(ValidationError::new(
                &format!("{pointer}/sourceType"),
                "expected \"NAME\" or \"URL\"",
            ));
        }
    }

    if let Some(fallback) = source.get("fallback") {
        match fallback {
            Value::Null | Value::String(_) => {}
            Value::Object(_) => validate_element(fallback, &format!("{pointer}/fallback"))?,
            _ => {
                return Err(ValidationError::new(
                    &format!("{pointer}/fallback"),
                    "expected null, a string or an object",
                ));
            }
        }
    }

    Ok(())
}

fn expect_string(
    object: &Map<String, Value>,
    name: &str,
    pointer: &str,
) -> Result<(), ValidationError> {
    match object.get(name) {
        Some(Value::String(_)) => Ok(()),
        Some(_) => Err(ValidationError::new(
            &format!("{pointer}/{name}"),
            "expected a string",
        )),
        None => Err(ValidationError::new(pointer, format!("missing '{name}'"))),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn accepts_nested_fragments() {
        let value = json!({
            "tagName": "div",
            "key": 1,
            "attributes": {"id": "root"},
            "children": [
                "text",
                {"tagName": "button", "eventHandlers": {"onClick": {"target": "abc", "preventDefault": false, "stopPropagation": true}}},
                {"tagName": "", "error": "boom"}
            ],
            "importSource": {"source": "chart", "sourceType": "NAME", "fallback": "loading"}
        });
        assert_eq!(validate_vdom_json(&value), Ok(()));
    }

    #[test]
    fn reports_pointer_of_nested_violation() {
        let value = json!({"tagName": "div", "children": [{"tagName": "p", "attributes": []}]});
        let error = validate_vdom_json(&value).unwrap_err();
        assert_eq!(error.pointer, "/children/0/attributes");
        assert_eq!(
            error.to_string(),
            "invalid vdom at '/children/0/attributes': expected an object"
        );
    }

    #[test]
    fn event_handlers_require_target() {
        let value = json!({"tagName": "a", "eventHandlers": {"onClick": {"preventDefault": true}}});
        let error = validate_vdom_json(&value).unwrap_err();
        assert_eq!(error.pointer, "/eventHandlers/onClick");
        assert_eq!(error.reason, "missing 'target'");
    }

    #[test]
    fn missing_tag_name_at_root() {
        let error = validate_vdom_json(&json!({})).unwrap_err();
        assert_eq!(error.pointer, "/");
    }

    #[test]
    fn pointers_escape_member_names() {
        let value = json!({"tagName": "a", "eventHandlers": {"on/Click~1": {"target": 3}}});
        let error = validate_vdom_json(&value).unwrap_err();
        assert_eq!(error.pointer, "/eventHandlers/on~1Click~01/target");
        assert_eq!(child_pointer("/x", "a~/b"), "/x/a~0~1b");
    }
}
