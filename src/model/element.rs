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

use super::ids::{ElementId, GroupId};

/// The drawable element kinds understood by the canvas.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "lowercase")]
pub enum ElementType {
    Rectangle,
    Ellipse,
    Diamond,
    Text,
    Line,
    Arrow,
    Freedraw,
}

impl ElementType {
    /// Text-type elements keep their raw `text`; every other kind promotes
    /// supplied text into a bound label at write time.
    pub fn is_text(self) -> bool {
        matches!(self, Self::Text)
    }
}

/// A text label bound to a non-text element.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
pub struct Label {
    pub text: String,
}

/// A single drawable shape/text/line record owned by the store.
///
/// Wire field names are camelCase, the browser client's native shape. Fields
/// the model does not know about survive round-trips through `extra`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct Element {
    pub id: ElementId,
    #[serde(rename = "type")]
    pub element_type: ElementType,
    pub x: f64,
    pub y: f64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub width: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub height: Option<f64>,
    /// Ordered coordinate pairs for line/arrow/freedraw shapes.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub points: Option<Vec<[f64; 2]>>,
    pub stroke_color: String,
    pub background_color: String,
    pub fill_style: String,
    pub stroke_width: f64,
    pub stroke_style: String,
    pub roughness: f64,
    pub opacity: f64,
    pub angle: f64,
    /// Group membership, append-only per grouping operation.
    #[serde(default)]
    pub group_ids: Vec<GroupId>,
    /// Advisory only; the store never rejects mutations on locked elements.
    #[serde(default)]
    pub locked: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub text: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub label: Option<Label>,
    pub created_at: u64,
    pub updated_at: u64,
    pub version: u64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub synced_at: Option<u64>,
    #[serde(flatten)]
    pub extra: BTreeMap<String, Value>,
}

impl Element {
    pub fn bump_version(&mut self) {
        self.version = self.version.saturating_add(1);
    }

    /// Enforce the text/label mutual-exclusivity rule.
    ///
    /// Non-text elements never carry raw `text`: supplied text is promoted
    /// into a `label` at write time. Text-type elements keep raw `text`.
    pub fn apply_text_label_rule(&mut self) {
        if self.element_type.is_text() {
            return;
        }
        if let Some(text) = self.text.take() {
            self.label = Some(Label { text });
        }
    }
}

pub mod defaults {
    pub const STROKE_COLOR: &str = "#1e1e1e";
    pub const BACKGROUND_COLOR: &str = "transparent";
    pub const FILL_STYLE: &str = "solid";
    pub const STROKE_STYLE: &str = "solid";
    pub const STROKE_WIDTH: f64 = 2.0;
    pub const ROUGHNESS: f64 = 1.0;
    pub const OPACITY: f64 = 100.0;
    pub const ANGLE: f64 = 0.0;
}
