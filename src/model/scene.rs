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

use super::ids::{ElementId, GroupId};

/// The viewer's camera: scroll offset plus zoom factor.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize, JsonSchema)]
pub struct Viewport {
    pub x: f64,
    pub y: f64,
    pub zoom: f64,
}

impl Default for Viewport {
    fn default() -> Self {
        Self {
            x: 0.0,
            y: 0.0,
            zoom: 1.0,
        }
    }
}

/// Auxiliary per-process scene state, distinct from the element collection.
///
/// Groups record member ids in grouping-call order. They are dissolved only
/// by an explicit ungroup; deleting a member element leaves the group entry
/// behind.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
pub struct SceneState {
    pub theme: String,
    pub viewport: Viewport,
    pub groups: BTreeMap<GroupId, Vec<ElementId>>,
}

impl Default for SceneState {
    fn default() -> Self {
        Self {
            theme: "light".to_owned(),
            viewport: Viewport::default(),
            groups: BTreeMap::new(),
        }
    }
}
