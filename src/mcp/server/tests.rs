// SPDX-FileCopyrightText: 2026 Bruno Meilick
// SPDX-License-Identifier: LicenseRef-Galatea-FreeUse-NoCopy-NoDerivatives
//
// All rights reserved.
//
// This file is part of Galatea and is proprietary software.
// Unauthorized copying, modification, or distribution is prohibited.

use super::*;
use crate::model::ElementType;
use crate::ops::ElementPatch;
use crate::server::CanvasState;

fn server() -> GalateaMcp {
    GalateaMcp::new(CanvasState::new())
}

fn rectangle(x: f64, y: f64) -> CreateElement {
    CreateElement::new(ElementType::Rectangle, x, y)
}

async fn create(server: &GalateaMcp, input: CreateElement) -> crate::model::Element {
    server
        .create_element(Parameters(input))
        .await
        .expect("create element")
        .0
        .element
}

#[tokio::test]
async fn create_update_delete_lifecycle() {
    let server = server();
    let element = create(&server, rectangle(0.0, 0.0)).await;
    assert_eq!(element.version, 1);

    let updated = server
        .update_element(Parameters(ElementUpdate {
            id: element.id.clone(),
            patch: ElementPatch {
                x: Some(40.0),
                ..ElementPatch::default()
            },
        }))
        .await
        .expect("update element")
        .0
        .element;
    assert_eq!(updated.version, 2);
    assert_eq!(updated.x, 40.0);

    let deleted = server
        .delete_element(Parameters(DeleteElementParams {
            id: element.id.to_string(),
        }))
        .await
        .expect("delete element")
        .0;
    assert_eq!(deleted.deleted_id, element.id.to_string());

    server
        .delete_element(Parameters(DeleteElementParams {
            id: element.id.to_string(),
        }))
        .await
        .err()
        .expect("second delete must fail");
}

#[tokio::test]
async fn query_filters_by_type_and_fields() {
    let server = server();
    create(&server, rectangle(0.0, 0.0)).await;
    let mut wanted = rectangle(50.0, 0.0);
    wanted.stroke_color = Some("#ff0000".to_owned());
    let wanted = create(&server, wanted).await;
    create(&server, CreateElement::new(ElementType::Ellipse, 0.0, 0.0)).await;

    let response = server
        .query_elements(Parameters(QueryElementsParams {
            element_type: Some(ElementType::Rectangle),
            filter: Some(
                [("strokeColor".to_owned(), serde_json::json!("#ff0000"))]
                    .into_iter()
                    .collect(),
            ),
        }))
        .await
        .expect("query")
        .0;
    assert_eq!(response.count, 1);
    assert_eq!(response.elements[0].id, wanted.id);
}

#[tokio::test]
async fn batch_create_reports_every_created_element() {
    let server = server();
    let response = server
        .batch_create_elements(Parameters(BatchCreateParams {
            elements: vec![rectangle(0.0, 0.0), rectangle(100.0, 0.0)],
        }))
        .await
        .expect("batch create")
        .0;
    assert_eq!(response.count, 2);
    assert!(response.created.iter().all(|element| element.version == 1));
}

#[tokio::test]
async fn group_then_ungroup() {
    let server = server();
    let a = create(&server, rectangle(0.0, 0.0)).await;
    let b = create(&server, rectangle(100.0, 0.0)).await;

    let grouped = server
        .group_elements(Parameters(ElementIdsParams {
            element_ids: vec![a.id.to_string(), b.id.to_string(), "missing".to_owned()],
        }))
        .await
        .expect("group")
        .0;
    let group_id = grouped.group_id.expect("group id");
    assert_eq!(grouped.grouped, vec![a.id.to_string(), b.id.to_string()]);
    assert_eq!(grouped.failed.len(), 1);

    let ungrouped = server
        .ungroup_elements(Parameters(UngroupElementsParams {
            group_id: group_id.clone(),
        }))
        .await
        .expect("ungroup")
        .0;
    assert_eq!(ungrouped.ungrouped, 2);

    server
        .ungroup_elements(Parameters(UngroupElementsParams { group_id }))
        .await
        .err()
        .expect("group is gone");
}

#[tokio::test]
async fn lock_is_advisory() {
    let server = server();
    let element = create(&server, rectangle(0.0, 0.0)).await;

    let locked = server
        .lock_elements(Parameters(ElementIdsParams {
            element_ids: vec![element.id.to_string()],
        }))
        .await
        .expect("lock")
        .0;
    assert!(locked.locked);
    assert_eq!(locked.element_ids, vec![element.id.to_string()]);

    // A locked element still accepts updates.
    let updated = server
        .update_element(Parameters(ElementUpdate {
            id: element.id.clone(),
            patch: ElementPatch {
                y: Some(9.0),
                ..ElementPatch::default()
            },
        }))
        .await
        .expect("update locked element")
        .0
        .element;
    assert!(updated.locked);
    assert_eq!(updated.y, 9.0);

    let unlocked = server
        .unlock_elements(Parameters(ElementIdsParams {
            element_ids: vec![element.id.to_string()],
        }))
        .await
        .expect("unlock")
        .0;
    assert!(!unlocked.locked);
}

#[tokio::test]
async fn layout_tools_acknowledge_without_mutating() {
    let server = server();
    let element = create(&server, rectangle(0.0, 0.0)).await;

    let ack = server
        .align_elements(Parameters(AlignElementsParams {
            element_ids: vec![element.id.to_string()],
            alignment: "left".to_owned(),
        }))
        .await
        .expect("align")
        .0;
    assert_eq!(ack.operation, "align:left");
    assert!(!ack.applied);

    let ack = server
        .distribute_elements(Parameters(DistributeElementsParams {
            element_ids: vec![element.id.to_string()],
            direction: "horizontal".to_owned(),
        }))
        .await
        .expect("distribute")
        .0;
    assert_eq!(ack.operation, "distribute:horizontal");

    let snapshot = server.get_canvas_snapshot().await.expect("snapshot").0;
    assert_eq!(snapshot.elements[0].version, 1);
}

#[tokio::test]
async fn convert_mermaid_forwards_to_viewers() {
    let server = server();

    // No viewers: the request succeeds but reaches nobody.
    let response = server
        .convert_mermaid(Parameters(ConvertMermaidParams {
            mermaid: "flowchart TD; A-->B".to_owned(),
        }))
        .await
        .expect("convert")
        .0;
    assert_eq!(response.forwarded_to, 0);

    let mut session = {
        let store = server.canvas.store().lock().await;
        server.canvas.broadcaster().join(&store)
    };
    let response = server
        .convert_mermaid(Parameters(ConvertMermaidParams {
            mermaid: "flowchart TD; A-->B".to_owned(),
        }))
        .await
        .expect("convert")
        .0;
    assert_eq!(response.forwarded_to, 1);
    assert_eq!(
        session.recv().await.expect("forwarded"),
        CanvasMessage::MermaidConvert {
            mermaid: "flowchart TD; A-->B".to_owned()
        }
    );

    server
        .convert_mermaid(Parameters(ConvertMermaidParams {
            mermaid: "   ".to_owned(),
        }))
        .await
        .err()
        .expect("empty mermaid");
}

#[tokio::test]
async fn snapshot_reflects_store_and_scene() {
    let server = server();
    let a = create(&server, rectangle(0.0, 0.0)).await;
    let b = create(&server, rectangle(100.0, 0.0)).await;
    server
        .group_elements(Parameters(ElementIdsParams {
            element_ids: vec![a.id.to_string(), b.id.to_string()],
        }))
        .await
        .expect("group");

    let snapshot = server.get_canvas_snapshot().await.expect("snapshot").0;
    assert_eq!(snapshot.element_count, 2);
    assert_eq!(snapshot.viewer_count, 0);
    assert_eq!(snapshot.scene.groups.len(), 1);
    assert_eq!(snapshot.scene.theme, "light");
}
