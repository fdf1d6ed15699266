// SPDX-FileCopyrightText: 2026 Bruno Meilick
// SPDX-License-Identifier: LicenseRef-Galatea-FreeUse-NoCopy-NoDerivatives
//
// All rights reserved.
//
// This file is part of Galatea and is proprietary software.
// Unauthorized copying, modification, or distribution is prohibited.

use std::collections::BTreeMap;

use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::model::{Element, ElementType, SceneState};
use crate::ops::{BatchFailure, CreateElement};

#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
pub struct ElementResponse {
    pub element: Element,
}

#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
pub struct DeleteElementParams {
    pub id: String,
}

#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
pub struct DeleteElementResponse {
    pub deleted_id: String,
}

#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
pub struct QueryElementsParams {
    /// Restrict results to one element type.
    #[serde(rename = "type", default, skip_serializing_if = "Option::is_none")]
    pub element_type: Option<ElementType>,
    /// Exact-match filters on arbitrary element fields, ANDed together.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub filter: Option<BTreeMap<String, Value>>,
}

#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
pub struct QueryElementsResponse {
    pub elements: Vec<Element>,
    pub count: usize,
}

#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
pub struct BatchCreateParams {
    pub elements: Vec<CreateElement>,
}

#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
pub struct BatchCreateResponse {
    pub created: Vec<Element>,
    pub count: usize,
}

#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
pub struct ElementIdsParams {
    pub element_ids: Vec<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
pub struct GroupElementsResponse {
    /// Absent when none of the listed elements existed.
    pub group_id: Option<String>,
    pub grouped: Vec<String>,
    pub failed: Vec<BatchFailure>,
}

#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
pub struct UngroupElementsParams {
    pub group_id: String,
}

#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
pub struct UngroupElementsResponse {
    pub group_id: String,
    /// Surviving members the group id was stripped from.
    pub ungrouped: usize,
}

#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
pub struct LockElementsResponse {
    pub locked: bool,
    pub element_ids: Vec<String>,
    pub failed: Vec<BatchFailure>,
}

#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
pub struct AlignElementsParams {
    pub element_ids: Vec<String>,
    /// One of `left`, `right`, `top`, `bottom`, `center_horizontal`,
    /// `center_vertical`.
    pub alignment: String,
}

#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
pub struct DistributeElementsParams {
    pub element_ids: Vec<String>,
    /// One of `horizontal`, `vertical`.
    pub direction: String,
}

/// Acknowledgement for layout operations the server does not compute itself.
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
pub struct LayoutAck {
    pub operation: String,
    pub element_ids: Vec<String>,
    pub applied: bool,
    pub note: String,
}

#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
pub struct ConvertMermaidParams {
    /// Raw Mermaid diagram text; rendering happens in the viewers.
    pub mermaid: String,
}

#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
pub struct ConvertMermaidResponse {
    /// Number of live viewers the conversion request was handed to.
    pub forwarded_to: usize,
}

#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
pub struct CanvasSnapshotResponse {
    pub elements: Vec<Element>,
    pub scene: SceneState,
    pub element_count: usize,
    pub viewer_count: usize,
}
