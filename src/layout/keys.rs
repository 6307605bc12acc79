//! Child classification and key defaulting.
//!
//! Each child of a rendered element is classified once into a [`ClassifiedChild`] and
//! given a [`ChildKey`]. Unkeyed children receive a fresh marker per classification pass
//! unless index keys are enabled, so unkeyed children are never matched positionally
//! across renders by default.

use core::fmt;
use core::sync::atomic::{AtomicU64, Ordering};

use tideline_core::{AnyComponent, Key, VdomChild, VdomElement};

static NEXT_FRESH_KEY: AtomicU64 = AtomicU64::new(0);

/// The identity of a child amongst its siblings.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum ChildKey {
    /// A key set by the element or component.
    Explicit(Key),
    /// A process-unique marker given to an unkeyed child.
    Fresh(u64),
    /// The child's position, used for unkeyed children when index keys are enabled.
    Index(usize),
}

impl ChildKey {
    fn fresh() -> Self {
        Self::Fresh(NEXT_FRESH_KEY.fetch_add(1, Ordering::Relaxed))
    }

    /// The explicit key, if the child set one.
    #[must_use]
    pub const fn explicit(&self) -> Option<&Key> {
        match self {
            Self::Explicit(key) => Some(key),
            Self::Fresh(_) | Self::Index(_) => None,
        }
    }
}

impl fmt::Display for ChildKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Explicit(key) => write!(f, "{key}"),
            Self::Fresh(marker) => write!(f, "<default key #{marker}>"),
            Self::Index(index) => write!(f, "<index {index}>"),
        }
    }
}

impl From<Key> for ChildKey {
    fn from(value: Key) -> Self {
        Self::Explicit(value)
    }
}

/// A child resolved to its kind.
#[derive(Debug)]
pub(crate) enum ChildKind {
    Element(VdomElement),
    Component(AnyComponent),
    Text(String),
}

/// A classified child together with its key.
#[derive(Debug)]
pub(crate) struct ClassifiedChild {
    pub(crate) key: ChildKey,
    pub(crate) kind: ChildKind,
}

/// Classifies `children`, assigning default keys to the unkeyed ones.
pub(crate) fn classify_children(
    children: Vec<VdomChild>,
    index_as_default_key: bool,
) -> Vec<ClassifiedChild> {
    children
        .into_iter()
        .enumerate()
        .map(|(index, child)| {
            let key = match child.key() {
                Some(key) => ChildKey::Explicit(key),
                None if index_as_default_key => ChildKey::Index(index),
                None => ChildKey::fresh(),
            };
            let kind = match child {
                VdomChild::Element(element) => ChildKind::Element(element),
                VdomChild::Component(component) => ChildKind::Component(component),
                VdomChild::Text(text) => ChildKind::Text(text),
            };
            ClassifiedChild { key, kind }
        })
        .collect()
}

/// Keys that occur more than once, in order of first occurrence.
pub(crate) fn duplicate_keys(children: &[ClassifiedChild]) -> Vec<ChildKey> {
    let mut counts: indexmap::IndexMap<&ChildKey, usize> = indexmap::IndexMap::new();
    for child in children {
        *counts.entry(&child.key).or_default() += 1;
    }
    counts
        .into_iter()
        .filter(|(_, count)| *count > 1)
        .map(|(key, _)| key.clone())
        .collect()
}
