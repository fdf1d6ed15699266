// SPDX-FileCopyrightText: 2026 Bruno Meilick
// SPDX-License-Identifier: LicenseRef-Galatea-FreeUse-NoCopy-NoDerivatives
//
// All rights reserved.
//
// This file is part of Galatea and is proprietary software.
// Unauthorized copying, modification, or distribution is prohibited.

use rmcp::handler::server::tool::ToolRouter;
use rmcp::handler::server::wrapper::{Json, Parameters};
use rmcp::model::{ServerCapabilities, ServerInfo};
use rmcp::{tool, tool_handler, tool_router, ErrorData, ServerHandler, ServiceExt};

use crate::ops::{CreateElement, ElementUpdate, StoreError};
use crate::protocol::CanvasMessage;
use crate::server::SharedCanvas;

use super::types::*;

fn store_error(err: StoreError) -> ErrorData {
    match err {
        StoreError::NotFound { .. } | StoreError::GroupNotFound { .. } => {
            ErrorData::resource_not_found(err.to_string(), None)
        }
    }
}

/// The MCP tool surface over the shared canvas.
///
/// Cheap to clone; all clones share the canvas state, so tool calls from any
/// number of MCP sessions serialize through the same store lock as the REST
/// surface.
#[derive(Clone)]
pub struct GalateaMcp {
    canvas: SharedCanvas,
    tool_router: ToolRouter<Self>,
}

#[tool_router]
impl GalateaMcp {
    pub fn new(canvas: SharedCanvas) -> Self {
        Self {
            canvas,
            tool_router: Self::tool_router(),
        }
    }

    pub async fn serve_stdio(self) -> Result<(), rmcp::RmcpError> {
        let service = self.serve((tokio::io::stdin(), tokio::io::stdout())).await?;
        service.waiting().await?;
        Ok(())
    }

    /// Add one element to the canvas; omit the id to have one allocated.
    /// Style fields fall back to canvas defaults.
    #[tool(name = "create_element")]
    async fn create_element(
        &self,
        params: Parameters<CreateElement>,
    ) -> Result<Json<ElementResponse>, ErrorData> {
        self.canvas.touch();
        let element = self.canvas.store().lock().await.create(params.0);
        Ok(Json(ElementResponse { element }))
    }

    /// Patch an existing element; only the supplied fields change, and the
    /// element's version is bumped.
    #[tool(name = "update_element")]
    async fn update_element(
        &self,
        params: Parameters<ElementUpdate>,
    ) -> Result<Json<ElementResponse>, ErrorData> {
        self.canvas.touch();
        let ElementUpdate { id, patch } = params.0;
        let element = self
            .canvas
            .store()
            .lock()
            .await
            .update(id.as_str(), &patch)
            .map_err(store_error)?;
        Ok(Json(ElementResponse { element }))
    }

    /// Remove one element from the canvas.
    #[tool(name = "delete_element")]
    async fn delete_element(
        &self,
        params: Parameters<DeleteElementParams>,
    ) -> Result<Json<DeleteElementResponse>, ErrorData> {
        self.canvas.touch();
        let deleted = self
            .canvas
            .store()
            .lock()
            .await
            .delete(&params.0.id)
            .map_err(store_error)?;
        Ok(Json(DeleteElementResponse {
            deleted_id: deleted.into_string(),
        }))
    }

    /// List elements, optionally narrowed by type and exact field matches.
    #[tool(name = "query_elements")]
    async fn query_elements(
        &self,
        params: Parameters<QueryElementsParams>,
    ) -> Result<Json<QueryElementsResponse>, ErrorData> {
        self.canvas.touch();
        let QueryElementsParams {
            element_type,
            filter,
        } = params.0;
        let elements = self
            .canvas
            .store()
            .lock()
            .await
            .query(element_type, &filter.unwrap_or_default());
        let count = elements.len();
        Ok(Json(QueryElementsResponse { elements, count }))
    }

    /// Create several elements at once; viewers see one aggregate update.
    #[tool(name = "batch_create_elements")]
    async fn batch_create_elements(
        &self,
        params: Parameters<BatchCreateParams>,
    ) -> Result<Json<BatchCreateResponse>, ErrorData> {
        self.canvas.touch();
        let created = self
            .canvas
            .store()
            .lock()
            .await
            .batch_create(params.0.elements);
        let count = created.len();
        Ok(Json(BatchCreateResponse { created, count }))
    }

    /// Put the listed elements into a new group. Missing ids are reported
    /// per-item; no group is created when every id is missing.
    #[tool(name = "group_elements")]
    async fn group_elements(
        &self,
        params: Parameters<ElementIdsParams>,
    ) -> Result<Json<GroupElementsResponse>, ErrorData> {
        self.canvas.touch();
        let result = self
            .canvas
            .store()
            .lock()
            .await
            .group(&params.0.element_ids);
        Ok(Json(GroupElementsResponse {
            group_id: result.group_id.map(|id| id.into_string()),
            grouped: result
                .members
                .succeeded
                .iter()
                .map(|element| element.id.to_string())
                .collect(),
            failed: result.members.failed,
        }))
    }

    /// Dissolve a group, stripping its id from every surviving member.
    #[tool(name = "ungroup_elements")]
    async fn ungroup_elements(
        &self,
        params: Parameters<UngroupElementsParams>,
    ) -> Result<Json<UngroupElementsResponse>, ErrorData> {
        self.canvas.touch();
        let group_id = params.0.group_id;
        let updated = self
            .canvas
            .store()
            .lock()
            .await
            .ungroup(&group_id)
            .map_err(store_error)?;
        Ok(Json(UngroupElementsResponse {
            group_id,
            ungrouped: updated.len(),
        }))
    }

    /// Set the advisory lock flag on the listed elements. Locking is a hint
    /// to viewers; it does not prevent further mutations.
    #[tool(name = "lock_elements")]
    async fn lock_elements(
        &self,
        params: Parameters<ElementIdsParams>,
    ) -> Result<Json<LockElementsResponse>, ErrorData> {
        self.set_locked(params.0.element_ids, true).await
    }

    /// Clear the advisory lock flag on the listed elements.
    #[tool(name = "unlock_elements")]
    async fn unlock_elements(
        &self,
        params: Parameters<ElementIdsParams>,
    ) -> Result<Json<LockElementsResponse>, ErrorData> {
        self.set_locked(params.0.element_ids, false).await
    }

    /// Request client-side alignment of the listed elements. Layout geometry
    /// lives in the viewers, so the server only acknowledges.
    #[tool(name = "align_elements")]
    async fn align_elements(
        &self,
        params: Parameters<AlignElementsParams>,
    ) -> Result<Json<LayoutAck>, ErrorData> {
        self.canvas.touch();
        let AlignElementsParams {
            element_ids,
            alignment,
        } = params.0;
        Ok(Json(LayoutAck {
            operation: format!("align:{alignment}"),
            element_ids,
            applied: false,
            note: "alignment is computed client-side; element coordinates are unchanged"
                .to_owned(),
        }))
    }

    /// Request client-side distribution of the listed elements.
    #[tool(name = "distribute_elements")]
    async fn distribute_elements(
        &self,
        params: Parameters<DistributeElementsParams>,
    ) -> Result<Json<LayoutAck>, ErrorData> {
        self.canvas.touch();
        let DistributeElementsParams {
            element_ids,
            direction,
        } = params.0;
        Ok(Json(LayoutAck {
            operation: format!("distribute:{direction}"),
            element_ids,
            applied: false,
            note: "distribution is computed client-side; element coordinates are unchanged"
                .to_owned(),
        }))
    }

    /// Forward raw Mermaid text to connected viewers for conversion into
    /// canvas elements. The store is not touched.
    #[tool(name = "convert_mermaid")]
    async fn convert_mermaid(
        &self,
        params: Parameters<ConvertMermaidParams>,
    ) -> Result<Json<ConvertMermaidResponse>, ErrorData> {
        self.canvas.touch();
        let mermaid = params.0.mermaid;
        if mermaid.trim().is_empty() {
            return Err(ErrorData::invalid_params(
                "mermaid text must not be empty",
                None,
            ));
        }
        let forwarded_to = self
            .canvas
            .broadcaster()
            .broadcast_message(CanvasMessage::MermaidConvert { mermaid });
        Ok(Json(ConvertMermaidResponse { forwarded_to }))
    }

    /// Read the whole canvas: every element plus scene state and counters.
    #[tool(name = "get_canvas_snapshot")]
    async fn get_canvas_snapshot(&self) -> Result<Json<CanvasSnapshotResponse>, ErrorData> {
        self.canvas.touch();
        let store = self.canvas.store().lock().await;
        Ok(Json(CanvasSnapshotResponse {
            elements: store.get_all(),
            scene: store.scene().clone(),
            element_count: store.len(),
            viewer_count: self.canvas.broadcaster().viewer_count(),
        }))
    }

    async fn set_locked(
        &self,
        element_ids: Vec<String>,
        locked: bool,
    ) -> Result<Json<LockElementsResponse>, ErrorData> {
        self.canvas.touch();
        let outcome = self
            .canvas
            .store()
            .lock()
            .await
            .set_locked(&element_ids, locked);
        Ok(Json(LockElementsResponse {
            locked,
            element_ids: outcome
                .succeeded
                .iter()
                .map(|element| element.id.to_string())
                .collect(),
            failed: outcome.failed,
        }))
    }
}

#[tool_handler]
impl ServerHandler for GalateaMcp {
    fn get_info(&self) -> ServerInfo {
        ServerInfo {
            instructions: Some(
                "Galatea shared canvas server (tools: create_element, update_element, delete_element, query_elements, batch_create_elements, group_elements, ungroup_elements, lock_elements, unlock_elements, align_elements, distribute_elements, convert_mermaid, get_canvas_snapshot)"
                    .into(),
            ),
            capabilities: ServerCapabilities::builder().enable_tools().build(),
            ..Default::default()
        }
    }
}

#[cfg(test)]
mod tests;
