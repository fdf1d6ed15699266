// SPDX-FileCopyrightText: 2026 Bruno Meilick
// SPDX-License-Identifier: LicenseRef-Galatea-FreeUse-NoCopy-NoDerivatives
//
// All rights reserved.
//
// This file is part of Galatea and is proprietary software.
// Unauthorized copying, modification, or distribution is prohibited.

//! End-to-end flow over the public surface: mutations entering the store
//! come out of viewer sessions as ordered wire messages.

use rstest::{fixture, rstest};

use galatea::model::ElementType;
use galatea::ops::CreateElement;
use galatea::protocol::CanvasMessage;
use galatea::server::{CanvasState, SharedCanvas};

#[fixture]
fn canvas() -> SharedCanvas {
    CanvasState::new()
}

async fn join(canvas: &SharedCanvas) -> galatea::broadcast::ViewerSession {
    let store = canvas.store().lock().await;
    canvas.broadcaster().join(&store)
}

fn wire(message: &CanvasMessage) -> serde_json::Value {
    serde_json::to_value(message).expect("serialize message")
}

#[rstest]
#[tokio::test]
async fn a_late_viewer_gets_the_snapshot_then_only_newer_events(canvas: SharedCanvas) {
    canvas
        .store()
        .lock()
        .await
        .create(CreateElement::new(ElementType::Rectangle, 0.0, 0.0));

    let mut session = join(&canvas).await;
    assert_eq!(session.greeting.len(), 2);
    assert_eq!(wire(&session.greeting[0])["type"], "initial_elements");
    assert_eq!(wire(&session.greeting[1])["type"], "sync_status");
    assert_eq!(wire(&session.greeting[1])["element_count"], 1);

    let later = canvas
        .store()
        .lock()
        .await
        .create(CreateElement::new(ElementType::Ellipse, 50.0, 0.0));

    let message = session.recv().await.expect("incremental");
    let json = wire(&message);
    assert_eq!(json["type"], "element_created");
    assert_eq!(json["element"]["id"], later.id.as_str());
    // The snapshot already covered the first element; it is not replayed.
    assert_eq!(json["element"]["type"], "ellipse");
}

#[rstest]
#[tokio::test]
async fn batch_mutations_arrive_as_single_aggregate_messages(canvas: SharedCanvas) {
    let mut session = join(&canvas).await;

    let created = canvas.store().lock().await.batch_create(vec![
        CreateElement::new(ElementType::Rectangle, 0.0, 0.0),
        CreateElement::new(ElementType::Rectangle, 100.0, 0.0),
        CreateElement::new(ElementType::Rectangle, 200.0, 0.0),
    ]);
    assert_eq!(created.len(), 3);

    let ids: Vec<String> = created
        .iter()
        .map(|element| element.id.to_string())
        .chain(["missing".to_owned()])
        .collect();
    let outcome = canvas.store().lock().await.batch_delete(&ids);
    assert_eq!(outcome.succeeded.len(), 3);
    assert_eq!(outcome.failed.len(), 1);

    let first = wire(&session.recv().await.expect("batch created"));
    assert_eq!(first["type"], "elements_batch_created");
    assert_eq!(first["elements"].as_array().expect("elements").len(), 3);

    let second = wire(&session.recv().await.expect("batch deleted"));
    assert_eq!(second["type"], "elements_batch_deleted");
    // Only the succeeded subset is announced.
    assert_eq!(second["ids"].as_array().expect("ids").len(), 3);
}

#[rstest]
#[tokio::test]
async fn sync_announces_one_wholesale_replacement(canvas: SharedCanvas) {
    let keep = canvas
        .store()
        .lock()
        .await
        .create(CreateElement::new(ElementType::Diamond, 0.0, 0.0));
    canvas
        .store()
        .lock()
        .await
        .create(CreateElement::new(ElementType::Rectangle, 50.0, 0.0));

    let mut session = join(&canvas).await;
    let count = canvas.store().lock().await.sync(vec![keep], Some(4242));
    assert_eq!(count, 1);

    let message = wire(&session.recv().await.expect("synced"));
    assert_eq!(message["type"], "elements_synced");
    assert_eq!(message["count"], 1);
    assert_eq!(message["timestamp"], 4242);

    let store = canvas.store().lock().await;
    assert_eq!(store.len(), 1);
    assert!(store.get_all()[0].synced_at == Some(4242));
}
