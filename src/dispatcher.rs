//! Driving a layout from a pair of channels.
//!
//! [`dispatch_single_view`] renders updates as they become available and delivers
//! inbound events concurrently, so a slow handler never holds back rendering.

use async_channel::{Receiver, Sender};
use futures::future::LocalBoxFuture;
use futures::stream::FuturesUnordered;
use futures::{FutureExt, StreamExt};
use tracing::debug;

use tideline_core::LayoutEvent;

use crate::{Layout, LayoutError, VdomJsonPatch};

/// Errors that end a dispatch loop.
#[derive(Debug, thiserror::Error)]
pub enum DispatchError {
    /// The receiving end of the patch channel is gone.
    #[error("outbound patch channel closed")]
    SendClosed,
    /// Rendering failed.
    #[error(transparent)]
    Layout(#[from] LayoutError),
}

enum Step {
    Delivered,
    Event(Option<LayoutEvent>),
    Update(Result<VdomJsonPatch, LayoutError>),
}

/// Runs `layout` until the inbound event channel closes.
///
/// Every render is sent on `send` as a [`VdomJsonPatch`]; every event received on `recv`
/// is delivered to its handler. The layout is unmounted when the loop ends.
///
/// # Errors
///
/// [`DispatchError::SendClosed`] if `send` is closed, [`DispatchError::Layout`] if a
/// render fails.
pub async fn dispatch_single_view(
    mut layout: Layout,
    send: Sender<VdomJsonPatch>,
    recv: Receiver<LayoutEvent>,
) -> Result<(), DispatchError> {
    let mut deliveries: FuturesUnordered<LocalBoxFuture<'static, ()>> = FuturesUnordered::new();

    loop {
        let step = futures::select_biased! {
            () = deliveries.select_next_some() => Step::Delivered,
            event = recv.recv().fuse() => Step::Event(event.ok()),
            patch = layout.render_json_patch().fuse() => Step::Update(patch),
        };

        match step {
            Step::Delivered => {}
            Step::Event(Some(event)) => deliveries.push(layout.deliver(event).boxed_local()),
            Step::Event(None) => {
                debug!(layout = %layout, "Inbound channel closed, stopping dispatch");
                return Ok(());
            }
            Step::Update(patch) => {
                if send.send(patch?).await.is_err() {
                    return Err(DispatchError::SendClosed);
                }
            }
        }
    }
}
