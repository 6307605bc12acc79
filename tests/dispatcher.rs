mod common;

use common::{State, capture_logs};
use futures::executor::block_on;
use futures::future::join;
use serde_json::json;
use tideline::prelude::*;
use tideline::{DispatchError, dispatch_single_view};

fn counter(count: &State<i32>) -> Layout {
    let count = count.clone();
    let root = component("Counter", move || {
        let count = count.clone();
        let hook = current_hook().unwrap();
        Ok(vdom!("button", [count.get()])
            .on(
                "onClick",
                EventHandler::sync(move |_| {
                    count.set(count.get() + 1);
                    hook.schedule_render();
                    Ok(())
                })
                .with_target("increment"),
            )
            .on(
                "onFocus",
                EventHandler::sync(|_| anyhow::bail!("focus failed")).with_target("focus"),
            ))
    });
    Layout::with_config(root, LayoutConfig::new())
}

#[test]
fn dispatch_sends_patches_and_delivers_events() {
    let count = State::new(0);
    let (patch_tx, patch_rx) = async_channel::unbounded();
    let (event_tx, event_rx) = async_channel::unbounded();

    let client = async move {
        let mut view = json!({});

        let first: tideline::VdomJsonPatch = patch_rx.recv().await.unwrap();
        assert_eq!(first.path, "");
        first.apply(&mut view).unwrap();
        assert_eq!(
            view,
            json!({
                "tagName": "button",
                "children": ["0"],
                "eventHandlers": {
                    "onClick": {"target": "increment", "preventDefault": false, "stopPropagation": false},
                    "onFocus": {"target": "focus", "preventDefault": false, "stopPropagation": false},
                },
            })
        );

        event_tx
            .send(LayoutEvent::new("increment", Vec::new()))
            .await
            .unwrap();
        let second = patch_rx.recv().await.unwrap();
        second.apply(&mut view).unwrap();
        assert_eq!(view["children"], json!(["1"]));
    };

    let (result, ()) = block_on(join(
        dispatch_single_view(counter(&count), patch_tx, event_rx),
        client,
    ));
    assert!(result.is_ok());
    assert_eq!(count.get(), 1);
}

#[test]
fn failing_handlers_do_not_stop_dispatch() {
    let (logs, _guard) = capture_logs();
    let count = State::new(0);
    let (patch_tx, patch_rx) = async_channel::unbounded();
    let (event_tx, event_rx) = async_channel::unbounded();

    let client = async move {
        patch_rx.recv().await.unwrap();
        event_tx
            .send(LayoutEvent::new("focus", Vec::new()))
            .await
            .unwrap();
        event_tx
            .send(LayoutEvent::new("missing", Vec::new()))
            .await
            .unwrap();
        event_tx
            .send(LayoutEvent::new("increment", Vec::new()))
            .await
            .unwrap();
        let patch: tideline::VdomJsonPatch = patch_rx.recv().await.unwrap();
        assert_eq!(
            patch.changes,
            [tideline::PatchOperation::Replace {
                path: "/children/0".to_string(),
                value: json!("1"),
            }]
        );
    };

    let (result, ()) = block_on(join(
        dispatch_single_view(counter(&count), patch_tx, event_rx),
        client,
    ));
    assert!(result.is_ok());
    assert!(logs.contains("Failed to execute event handler"));
    assert!(logs.contains("focus failed"));
    assert!(logs.contains("Ignored event - handler \"missing\""));
}

#[test]
fn dispatch_stops_when_the_patch_receiver_is_gone() {
    let count = State::new(0);
    let (patch_tx, patch_rx) = async_channel::unbounded();
    let (_event_tx, event_rx) = async_channel::unbounded();
    drop(patch_rx);

    let result = block_on(dispatch_single_view(counter(&count), patch_tx, event_rx));
    assert!(matches!(result, Err(DispatchError::SendClosed)));
}
