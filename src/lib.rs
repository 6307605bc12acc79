#![doc = include_str!("../README.md")]
#![allow(clippy::multiple_crate_versions)]
#![allow(clippy::future_not_send)]

extern crate alloc;

pub mod config;
pub mod dispatcher;
pub mod error;
pub mod hooks;
pub mod layout;
pub mod logging;
pub mod patch;
pub mod registry;
pub mod scheduler;

pub use config::LayoutConfig;
pub use dispatcher::{DispatchError, dispatch_single_view};
pub use error::LayoutError;
pub use hooks::{CurrentHookGuard, LifeCycleHook, LifeCycleStateId, RenderTrigger, current_hook};
#[doc(inline)]
pub use layout::{Layout, LayoutUpdate};
pub use patch::{PatchError, PatchOperation, VdomJsonPatch};
pub use registry::EventRegistry;
pub use scheduler::{RenderQueue, RenderScheduler, render_queue};

pub mod prelude {
    //! Commonly used types, for glob importing.
    //!
    //! ```rust
    //! use tideline::prelude::*;
    //!
    //! let layout = Layout::with_config(
    //!     component("Empty", || Ok(vdom!("div"))),
    //!     LayoutConfig::new(),
    //! );
    //! assert_eq!(layout.to_string(), "Layout(Empty)");
    //! ```
    pub use crate::{Layout, LayoutConfig, LayoutError, LayoutUpdate, current_hook};
    pub use tideline_core::{
        AnyComponent, Component, EventHandler, ImportSource, Key, LayoutEvent, SourceType,
        VdomChild, VdomElement, VdomJson, component, vdom,
    };
}
