// SPDX-FileCopyrightText: 2026 Bruno Meilick
// SPDX-License-Identifier: LicenseRef-Galatea-FreeUse-NoCopy-NoDerivatives
//
// All rights reserved.
//
// This file is part of Galatea and is proprietary software.
// Unauthorized copying, modification, or distribution is prohibited.

//! Shared mutation contract: create/patch payloads, batch results, and the
//! store's error taxonomy.
//!
//! Both request surfaces (REST and MCP tools) validate into these types
//! before calling the store; the store itself trusts its input.

use std::collections::BTreeMap;
use std::fmt;

use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::model::{defaults, Element, ElementId, ElementType, GroupId};

/// A partially-specified element accepted by `create`/`batch_create`.
///
/// Only `type` and coordinates are required; all style fields fall back to
/// documented defaults. Unknown attributes pass through into `extra`.
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct CreateElement {
    /// Optional explicit id; when omitted a unique id is allocated. Supplying
    /// the id of an existing element overwrites it (last-write-wins).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<ElementId>,
    #[serde(rename = "type")]
    pub element_type: ElementType,
    pub x: f64,
    pub y: f64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub width: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub height: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub points: Option<Vec<[f64; 2]>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub stroke_color: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub background_color: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub fill_style: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub stroke_width: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub stroke_style: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub roughness: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub opacity: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub angle: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub group_ids: Option<Vec<GroupId>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub locked: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub text: Option<String>,
    #[serde(flatten)]
    pub extra: BTreeMap<String, Value>,
}

impl CreateElement {
    pub fn new(element_type: ElementType, x: f64, y: f64) -> Self {
        Self {
            id: None,
            element_type,
            x,
            y,
            width: None,
            height: None,
            points: None,
            stroke_color: None,
            background_color: None,
            fill_style: None,
            stroke_width: None,
            stroke_style: None,
            roughness: None,
            opacity: None,
            angle: None,
            group_ids: None,
            locked: None,
            text: None,
            extra: BTreeMap::new(),
        }
    }

    /// Resolve this input into a stored record: defaults applied, version 1,
    /// timestamps stamped, text/label rule enforced.
    pub fn materialize(self, id: ElementId, now: u64) -> Element {
        let mut element = Element {
            id,
            element_type: self.element_type,
            x: self.x,
            y: self.y,
            width: self.width,
            height: self.height,
            points: self.points,
            stroke_color: self
                .stroke_color
                .unwrap_or_else(|| defaults::STROKE_COLOR.to_owned()),
            background_color: self
                .background_color
                .unwrap_or_else(|| defaults::BACKGROUND_COLOR.to_owned()),
            fill_style: self
                .fill_style
                .unwrap_or_else(|| defaults::FILL_STYLE.to_owned()),
            stroke_width: self.stroke_width.unwrap_or(defaults::STROKE_WIDTH),
            stroke_style: self
                .stroke_style
                .unwrap_or_else(|| defaults::STROKE_STYLE.to_owned()),
            roughness: self.roughness.unwrap_or(defaults::ROUGHNESS),
            opacity: self.opacity.unwrap_or(defaults::OPACITY),
            angle: self.angle.unwrap_or(defaults::ANGLE),
            group_ids: self.group_ids.unwrap_or_default(),
            locked: self.locked.unwrap_or(false),
            text: self.text,
            label: None,
            created_at: now,
            updated_at: now,
            version: 1,
            synced_at: None,
            extra: self.extra,
        };
        element.apply_text_label_rule();
        element
    }
}

/// Partial fields merged over an existing element by `update`/`batch_update`.
///
/// The id is addressed separately and can never be changed through a patch.
#[derive(Debug, Clone, Default, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct ElementPatch {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub x: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub y: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub width: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub height: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub points: Option<Vec<[f64; 2]>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub stroke_color: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub background_color: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub fill_style: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub stroke_width: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub stroke_style: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub roughness: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub opacity: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub angle: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub locked: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub text: Option<String>,
    #[serde(flatten)]
    pub extra: BTreeMap<String, Value>,
}

impl ElementPatch {
    /// Merge this patch over `element`. Does not stamp timestamps, bump the
    /// version, or re-apply the text/label rule; the store does that once
    /// per accepted update.
    pub fn merge_into(&self, element: &mut Element) {
        if let Some(x) = self.x {
            element.x = x;
        }
        if let Some(y) = self.y {
            element.y = y;
        }
        if let Some(width) = self.width {
            element.width = Some(width);
        }
        if let Some(height) = self.height {
            element.height = Some(height);
        }
        if let Some(points) = &self.points {
            element.points = Some(points.clone());
        }
        if let Some(stroke_color) = &self.stroke_color {
            element.stroke_color = stroke_color.clone();
        }
        if let Some(background_color) = &self.background_color {
            element.background_color = background_color.clone();
        }
        if let Some(fill_style) = &self.fill_style {
            element.fill_style = fill_style.clone();
        }
        if let Some(stroke_width) = self.stroke_width {
            element.stroke_width = stroke_width;
        }
        if let Some(stroke_style) = &self.stroke_style {
            element.stroke_style = stroke_style.clone();
        }
        if let Some(roughness) = self.roughness {
            element.roughness = roughness;
        }
        if let Some(opacity) = self.opacity {
            element.opacity = opacity;
        }
        if let Some(angle) = self.angle {
            element.angle = angle;
        }
        if let Some(locked) = self.locked {
            element.locked = locked;
        }
        if let Some(text) = &self.text {
            element.text = Some(text.clone());
        }
        for (key, value) in &self.extra {
            element.extra.insert(key.clone(), value.clone());
        }
    }

    pub fn is_empty(&self) -> bool {
        self.x.is_none()
            && self.y.is_none()
            && self.width.is_none()
            && self.height.is_none()
            && self.points.is_none()
            && self.stroke_color.is_none()
            && self.background_color.is_none()
            && self.fill_style.is_none()
            && self.stroke_width.is_none()
            && self.stroke_style.is_none()
            && self.roughness.is_none()
            && self.opacity.is_none()
            && self.angle.is_none()
            && self.locked.is_none()
            && self.text.is_none()
            && self.extra.is_empty()
    }
}

/// A single item of a batch update: target id plus the flattened patch.
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
pub struct ElementUpdate {
    pub id: ElementId,
    #[serde(flatten)]
    pub patch: ElementPatch,
}

/// One failed item of a batch operation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
pub struct BatchFailure {
    pub id: String,
    pub error: String,
}

/// Structured partial-success result of a batch operation.
///
/// Batch operations never collapse into a single pass/fail: succeeded items
/// and failed ids are both reported.
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
pub struct BatchOutcome<T> {
    pub succeeded: Vec<T>,
    pub failed: Vec<BatchFailure>,
}

impl<T> Default for BatchOutcome<T> {
    fn default() -> Self {
        Self {
            succeeded: Vec::new(),
            failed: Vec::new(),
        }
    }
}

impl<T> BatchOutcome<T> {
    pub fn record_success(&mut self, item: T) {
        self.succeeded.push(item);
    }

    pub fn record_failure(&mut self, id: impl Into<String>, error: &StoreError) {
        self.failed.push(BatchFailure {
            id: id.into(),
            error: error.to_string(),
        });
    }

    pub fn is_full_success(&self) -> bool {
        self.failed.is_empty()
    }
}

/// Failures originating inside the store.
///
/// Ids are kept as raw strings because lookups accept caller-supplied ids
/// that may never have existed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StoreError {
    NotFound { id: String },
    GroupNotFound { id: String },
}

impl fmt::Display for StoreError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::NotFound { id } => write!(f, "element not found (id={id})"),
            Self::GroupNotFound { id } => write!(f, "group not found (id={id})"),
        }
    }
}

impl std::error::Error for StoreError {}

#[cfg(test)]
mod tests {
    use super::{CreateElement, ElementPatch, StoreError};
    use crate::model::{defaults, ElementId, ElementType, Label};

    #[test]
    fn materialize_applies_documented_defaults() {
        let input = CreateElement::new(ElementType::Rectangle, 0.0, 0.0);
        let element = input.materialize(ElementId::new("el-1").expect("id"), 42);

        assert_eq!(element.version, 1);
        assert_eq!(element.created_at, 42);
        assert_eq!(element.updated_at, 42);
        assert_eq!(element.stroke_color, defaults::STROKE_COLOR);
        assert_eq!(element.background_color, defaults::BACKGROUND_COLOR);
        assert_eq!(element.fill_style, defaults::FILL_STYLE);
        assert_eq!(element.stroke_width, defaults::STROKE_WIDTH);
        assert_eq!(element.roughness, defaults::ROUGHNESS);
        assert_eq!(element.opacity, defaults::OPACITY);
        assert_eq!(element.angle, defaults::ANGLE);
        assert!(!element.locked);
    }

    #[test]
    fn materialize_promotes_text_for_non_text_types() {
        let mut input = CreateElement::new(ElementType::Ellipse, 0.0, 0.0);
        input.text = Some("caption".to_owned());
        let element = input.materialize(ElementId::new("el-2").expect("id"), 0);

        assert_eq!(element.text, None);
        assert_eq!(
            element.label,
            Some(Label {
                text: "caption".to_owned()
            })
        );
    }

    #[test]
    fn patch_merges_only_present_fields_and_overlays_extra() {
        let input = CreateElement::new(ElementType::Rectangle, 1.0, 2.0);
        let mut element = input.materialize(ElementId::new("el-3").expect("id"), 0);
        element
            .extra
            .insert("frameId".to_owned(), serde_json::Value::Null);

        let patch = ElementPatch {
            x: Some(10.0),
            extra: [("roundness".to_owned(), serde_json::json!({"type": 3}))]
                .into_iter()
                .collect(),
            ..ElementPatch::default()
        };
        patch.merge_into(&mut element);

        assert_eq!(element.x, 10.0);
        assert_eq!(element.y, 2.0);
        assert_eq!(element.extra.get("frameId"), Some(&serde_json::Value::Null));
        assert_eq!(
            element.extra.get("roundness"),
            Some(&serde_json::json!({"type": 3}))
        );
    }

    #[test]
    fn store_error_messages_name_the_missing_id() {
        let err = StoreError::NotFound {
            id: "missing".to_owned(),
        };
        assert_eq!(err.to_string(), "element not found (id=missing)");
    }

    #[test]
    fn empty_patch_reports_empty() {
        assert!(ElementPatch::default().is_empty());
        let patch = ElementPatch {
            locked: Some(true),
            ..ElementPatch::default()
        };
        assert!(!patch.is_empty());
    }
}
