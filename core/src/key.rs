//! Keys identifying elements and components amongst their siblings.

use alloc::string::{String, ToString};
use core::fmt;

use serde::{Deserialize, Serialize};

/// A key that uniquely identifies an element or component amongst its siblings.
///
/// Keys are how the layout decides that a child in a new render is "the same" child as
/// one from the previous render. A child keeps its state (and its event targets) for as
/// long as its key keeps showing up under the same parent.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Key {
    /// An integer key.
    Int(i64),
    /// A string key.
    Str(String),
}

impl fmt::Display for Key {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Int(value) => write!(f, "{value}"),
            Self::Str(value) => write!(f, "{value:?}"),
        }
    }
}

impl From<&str> for Key {
    fn from(value: &str) -> Self {
        Self::Str(value.to_string())
    }
}

impl From<String> for Key {
    fn from(value: String) -> Self {
        Self::Str(value)
    }
}

macro_rules! impl_int_key {
    ($($ty:ty),*) => {
        $(
            impl From<$ty> for Key {
                fn from(value: $ty) -> Self {
                    Self::Int(i64::from(value))
                }
            }
        )*
    };
}

impl_int_key!(i8, i16, i32, i64, u8, u16, u32);

#[cfg(test)]
mod tests {
    use super::Key;

    #[test]
    fn display_quotes_strings_only() {
        assert_eq!(Key::from("a").to_string(), "\"a\"");
        assert_eq!(Key::from(3).to_string(), "3");
    }

    #[test]
    fn serializes_untagged() {
        assert_eq!(serde_json::to_string(&Key::from("a")).unwrap(), "\"a\"");
        assert_eq!(serde_json::to_string(&Key::from(7u8)).unwrap(), "7");
    }
}
