// SPDX-FileCopyrightText: 2026 Bruno Meilick
// SPDX-License-Identifier: LicenseRef-Galatea-FreeUse-NoCopy-NoDerivatives
//
// All rights reserved.
//
// This file is part of Galatea and is proprietary software.
// Unauthorized copying, modification, or distribution is prohibited.

//! REST surface for the browser client, plus the `/ws` upgrade endpoint.
//!
//! Handlers validate payloads into the shared mutation types, call the store
//! under its lock, and let the attached broadcaster carry the resulting
//! events; no handler talks to the push channel directly except `sync`,
//! whose wholesale overwrite is already announced by the store.

use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::routing::{get, post};
use axum::{Json, Router};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use tower_http::cors::CorsLayer;

use crate::model::{Element, ElementId};
use crate::ops::{BatchOutcome, CreateElement, ElementPatch, ElementUpdate, StoreError};
use crate::server::SharedCanvas;

mod ws;

pub fn router(state: SharedCanvas) -> Router {
    Router::new()
        .route("/health", get(health))
        .route("/ws", get(ws::upgrade))
        .route(
            "/api/elements",
            get(list_elements).post(create_element).delete(clear_elements),
        )
        .route("/api/elements/batch", post(batch_create).put(batch_update))
        .route("/api/elements/batch-delete", post(batch_delete))
        .route(
            "/api/elements/{id}",
            get(get_element).put(update_element).delete(delete_element),
        )
        .route("/api/sync", post(sync_elements))
        // The browser client is served from a different origin during
        // development.
        .layer(CorsLayer::permissive())
        .with_state(state)
}

/// Structured error payload; the status code carries the taxonomy
/// (400 malformed, 404 unknown id).
#[derive(Debug, Serialize)]
struct ErrorBody {
    error: String,
}

type ApiError = (StatusCode, Json<ErrorBody>);

fn bad_request(err: impl std::fmt::Display) -> ApiError {
    (
        StatusCode::BAD_REQUEST,
        Json(ErrorBody {
            error: err.to_string(),
        }),
    )
}

fn store_error(err: StoreError) -> ApiError {
    (
        StatusCode::NOT_FOUND,
        Json(ErrorBody {
            error: err.to_string(),
        }),
    )
}

/// Accept any JSON shape, then validate into `T` so malformed payloads get a
/// structured 400 body instead of axum's plain-text rejection.
fn parse<T: serde::de::DeserializeOwned>(value: Value) -> Result<T, ApiError> {
    serde_json::from_value(value).map_err(bad_request)
}

#[derive(Debug, Serialize)]
struct HealthBody {
    status: &'static str,
    element_count: usize,
    viewer_count: usize,
    uptime_seconds: u64,
}

async fn health(State(state): State<SharedCanvas>) -> Json<HealthBody> {
    state.touch();
    let element_count = state.store().lock().await.len();
    Json(HealthBody {
        status: "ok",
        element_count,
        viewer_count: state.broadcaster().viewer_count(),
        uptime_seconds: state.uptime_seconds(),
    })
}

async fn list_elements(State(state): State<SharedCanvas>) -> Json<Vec<Element>> {
    state.touch();
    Json(state.store().lock().await.get_all())
}

async fn get_element(
    State(state): State<SharedCanvas>,
    Path(id): Path<String>,
) -> Result<Json<Element>, ApiError> {
    state.touch();
    let store = state.store().lock().await;
    store
        .get(&id)
        .cloned()
        .map(Json)
        .ok_or_else(|| store_error(StoreError::NotFound { id }))
}

async fn create_element(
    State(state): State<SharedCanvas>,
    Json(body): Json<Value>,
) -> Result<(StatusCode, Json<Element>), ApiError> {
    state.touch();
    let input: CreateElement = parse(body)?;
    let element = state.store().lock().await.create(input);
    Ok((StatusCode::CREATED, Json(element)))
}

async fn update_element(
    State(state): State<SharedCanvas>,
    Path(id): Path<String>,
    Json(body): Json<Value>,
) -> Result<Json<Element>, ApiError> {
    state.touch();
    let patch: ElementPatch = parse(body)?;
    let element = state
        .store()
        .lock()
        .await
        .update(&id, &patch)
        .map_err(store_error)?;
    Ok(Json(element))
}

#[derive(Debug, Serialize)]
struct DeletedBody {
    deleted: ElementId,
}

async fn delete_element(
    State(state): State<SharedCanvas>,
    Path(id): Path<String>,
) -> Result<Json<DeletedBody>, ApiError> {
    state.touch();
    let deleted = state
        .store()
        .lock()
        .await
        .delete(&id)
        .map_err(store_error)?;
    Ok(Json(DeletedBody { deleted }))
}

#[derive(Debug, Serialize)]
struct ClearedBody {
    cleared: usize,
}

/// Clearing is intentionally silent on the push channel.
async fn clear_elements(State(state): State<SharedCanvas>) -> Json<ClearedBody> {
    state.touch();
    let mut store = state.store().lock().await;
    let cleared = store.len();
    store.clear();
    Json(ClearedBody { cleared })
}

async fn batch_create(
    State(state): State<SharedCanvas>,
    Json(body): Json<Value>,
) -> Result<(StatusCode, Json<Vec<Element>>), ApiError> {
    state.touch();
    let inputs: Vec<CreateElement> = parse(body)?;
    let created = state.store().lock().await.batch_create(inputs);
    Ok((StatusCode::CREATED, Json(created)))
}

async fn batch_update(
    State(state): State<SharedCanvas>,
    Json(body): Json<Value>,
) -> Result<Json<BatchOutcome<Element>>, ApiError> {
    state.touch();
    let updates: Vec<ElementUpdate> = parse(body)?;
    let outcome = state.store().lock().await.batch_update(updates);
    Ok(Json(outcome))
}

#[derive(Debug, Deserialize)]
struct BatchDeleteBody {
    ids: Vec<String>,
}

async fn batch_delete(
    State(state): State<SharedCanvas>,
    Json(body): Json<Value>,
) -> Result<Json<BatchOutcome<ElementId>>, ApiError> {
    state.touch();
    let body: BatchDeleteBody = parse(body)?;
    let outcome = state.store().lock().await.batch_delete(&body.ids);
    Ok(Json(outcome))
}

#[derive(Debug, Deserialize)]
struct SyncBody {
    elements: Vec<Element>,
    #[serde(default)]
    timestamp: Option<u64>,
}

#[derive(Debug, Serialize)]
struct SyncedBody {
    synced: usize,
}

/// Wholesale overwrite from a viewer whose local edits became authoritative.
async fn sync_elements(
    State(state): State<SharedCanvas>,
    Json(body): Json<Value>,
) -> Result<Json<SyncedBody>, ApiError> {
    state.touch();
    let body: SyncBody = parse(body)?;
    let synced = state
        .store()
        .lock()
        .await
        .sync(body.elements, body.timestamp);
    Ok(Json(SyncedBody { synced }))
}
