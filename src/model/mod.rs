// SPDX-FileCopyrightText: 2026 Bruno Meilick
// SPDX-License-Identifier: LicenseRef-Galatea-FreeUse-NoCopy-NoDerivatives
//
// All rights reserved.
//
// This file is part of Galatea and is proprietary software.
// Unauthorized copying, modification, or distribution is prohibited.

//! Canvas data model: elements, scene state, and their identifiers.

pub mod element;
pub mod ids;
pub mod scene;

pub use element::{defaults, Element, ElementType, Label};
pub use ids::{generate_element_id, generate_group_id, ElementId, GroupId, Id, IdError};
pub use scene::{SceneState, Viewport};
