//! Shared data model for the tideline layout engine.
//!
//! Components render [`VdomElement`] trees; the engine reconciles them into serialized
//! [`VdomJson`] fragments and routes [`LayoutEvent`]s back to [`EventHandler`]s.
#![allow(clippy::multiple_crate_versions)]

extern crate alloc;
#[macro_use]
mod macros;

pub mod component;
pub mod event;
pub mod handler;
pub mod json;
pub mod key;
pub mod validate;
pub mod vdom;

#[doc(inline)]
pub use component::{AnyComponent, Component, ComponentFn, component};
pub use event::LayoutEvent;
pub use handler::{EventHandler, Handler, SharedHandler, into_handler, into_sync_handler};
pub use json::{EventTarget, VdomJson, VdomJsonChild};
pub use key::Key;
pub use validate::{ValidationError, child_pointer, validate_vdom_json};
pub use vdom::{ImportSource, SourceType, VdomChild, VdomElement, VdomParts};
