// SPDX-FileCopyrightText: 2026 Bruno Meilick
// SPDX-License-Identifier: LicenseRef-Galatea-FreeUse-NoCopy-NoDerivatives
//
// All rights reserved.
//
// This file is part of Galatea and is proprietary software.
// Unauthorized copying, modification, or distribution is prohibited.

//! The change-notification contract.
//!
//! [`StoreEvent`] is what the store hands to its listeners, in mutation
//! acceptance order. [`CanvasMessage`] is the push-channel wire shape; the
//! broadcaster converts events into messages without altering payloads.

use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

use crate::model::{Element, ElementId};

/// An event emitted synchronously by the store inside a mutating operation.
///
/// Batch operations emit exactly one aggregate event, never one per item.
/// `clear()` emits nothing.
#[derive(Debug, Clone, PartialEq)]
pub enum StoreEvent {
    ElementCreated { element: Element },
    ElementUpdated { element: Element },
    /// Carries only the id; the broadcast payload for deletions stays minimal.
    ElementDeleted { id: ElementId },
    ElementsBatchCreated { elements: Vec<Element> },
    ElementsBatchUpdated { elements: Vec<Element> },
    ElementsBatchDeleted { ids: Vec<ElementId> },
    ElementsSynced { count: usize, timestamp: u64 },
}

/// A server→viewer message on the push channel.
///
/// `initial_elements` and `sync_status` greet a newly connected viewer, in
/// that order, before any incremental event. `mermaid_convert` forwards
/// diagram text for client-side rendering and never touches the store.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum CanvasMessage {
    InitialElements {
        elements: Vec<Element>,
    },
    SyncStatus {
        element_count: usize,
        timestamp: u64,
    },
    ElementCreated {
        element: Element,
    },
    ElementUpdated {
        element: Element,
    },
    ElementDeleted {
        id: ElementId,
    },
    ElementsBatchCreated {
        elements: Vec<Element>,
    },
    ElementsBatchUpdated {
        elements: Vec<Element>,
    },
    ElementsBatchDeleted {
        ids: Vec<ElementId>,
    },
    ElementsSynced {
        count: usize,
        timestamp: u64,
    },
    MermaidConvert {
        mermaid: String,
    },
}

impl From<StoreEvent> for CanvasMessage {
    fn from(event: StoreEvent) -> Self {
        match event {
            StoreEvent::ElementCreated { element } => Self::ElementCreated { element },
            StoreEvent::ElementUpdated { element } => Self::ElementUpdated { element },
            StoreEvent::ElementDeleted { id } => Self::ElementDeleted { id },
            StoreEvent::ElementsBatchCreated { elements } => {
                Self::ElementsBatchCreated { elements }
            }
            StoreEvent::ElementsBatchUpdated { elements } => {
                Self::ElementsBatchUpdated { elements }
            }
            StoreEvent::ElementsBatchDeleted { ids } => Self::ElementsBatchDeleted { ids },
            StoreEvent::ElementsSynced { count, timestamp } => {
                Self::ElementsSynced { count, timestamp }
            }
        }
    }
}
