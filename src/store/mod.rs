// SPDX-FileCopyrightText: 2026 Bruno Meilick
// SPDX-License-Identifier: LicenseRef-Galatea-FreeUse-NoCopy-NoDerivatives
//
// All rights reserved.
//
// This file is part of Galatea and is proprietary software.
// Unauthorized copying, modification, or distribution is prohibited.

//! The element store: single source of truth for canvas state.
//!
//! The store owns the element mapping and scene state exclusively; every
//! mutation goes through its methods and notifies registered listeners
//! synchronously before the mutating call returns. Because notification
//! happens inside the mutation, broadcast order equals mutation acceptance
//! order and there is no interleaving to reason about.

use std::collections::BTreeMap;
use std::fmt;
use std::panic::{catch_unwind, AssertUnwindSafe};
use std::time::{SystemTime, UNIX_EPOCH};

use serde_json::Value;

use crate::model::{
    generate_element_id, generate_group_id, Element, ElementId, ElementType, GroupId, SceneState,
    Viewport,
};
use crate::ops::{BatchOutcome, CreateElement, ElementPatch, ElementUpdate, StoreError};
use crate::protocol::StoreEvent;

/// Milliseconds since the Unix epoch; the store's only clock.
pub fn now_millis() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_millis() as u64)
        .unwrap_or(0)
}

/// Deregistration handle returned by [`CanvasStore::on_change`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ListenerId(u64);

type Listener = Box<dyn Fn(&StoreEvent) + Send + Sync>;

/// Result of a grouping operation: the allocated group id (absent when no
/// listed element existed) plus the per-member outcome.
#[derive(Debug)]
pub struct GroupResult {
    pub group_id: Option<GroupId>,
    pub members: BatchOutcome<Element>,
}

/// The authoritative mapping from element id to element, plus scene state.
///
/// All operations are synchronous and in-process; nothing here suspends or
/// performs I/O. The store trusts its input: malformed payloads are rejected
/// by the surfaces before a store method is ever called.
pub struct CanvasStore {
    elements: BTreeMap<ElementId, Element>,
    scene: SceneState,
    listeners: Vec<(ListenerId, Listener)>,
    next_listener: u64,
}

impl fmt::Debug for CanvasStore {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CanvasStore")
            .field("elements", &self.elements.len())
            .field("listeners", &self.listeners.len())
            .finish()
    }
}

impl Default for CanvasStore {
    fn default() -> Self {
        Self::new()
    }
}

impl CanvasStore {
    pub fn new() -> Self {
        Self {
            elements: BTreeMap::new(),
            scene: SceneState::default(),
            listeners: Vec::new(),
            next_listener: 0,
        }
    }

    // ── Listener registry ───────────────────────────────────────────────

    /// Register a listener invoked with every emitted event, in emission
    /// order, synchronously within the mutating call. All registered
    /// listeners receive every event.
    pub fn on_change(
        &mut self,
        listener: impl Fn(&StoreEvent) + Send + Sync + 'static,
    ) -> ListenerId {
        let id = ListenerId(self.next_listener);
        self.next_listener += 1;
        self.listeners.push((id, Box::new(listener)));
        id
    }

    pub fn remove_listener(&mut self, id: ListenerId) -> bool {
        let before = self.listeners.len();
        self.listeners.retain(|(listener_id, _)| *listener_id != id);
        self.listeners.len() != before
    }

    fn emit(&self, event: &StoreEvent) {
        for (_, listener) in &self.listeners {
            // A panicking subscriber must not corrupt the mutation that
            // triggered it, nor starve later listeners of the event.
            let _ = catch_unwind(AssertUnwindSafe(|| listener(event)));
        }
    }

    // ── Reads ───────────────────────────────────────────────────────────

    pub fn len(&self) -> usize {
        self.elements.len()
    }

    pub fn is_empty(&self) -> bool {
        self.elements.is_empty()
    }

    pub fn get(&self, id: &str) -> Option<&Element> {
        self.elements.get(id)
    }

    pub fn get_all(&self) -> Vec<Element> {
        self.elements.values().cloned().collect()
    }

    /// All elements matching an optional type-equality filter AND optional
    /// exact-match filters on arbitrary fields (known or passthrough),
    /// ANDed together. Read-only; no event.
    pub fn query(
        &self,
        element_type: Option<ElementType>,
        filters: &BTreeMap<String, Value>,
    ) -> Vec<Element> {
        self.elements
            .values()
            .filter(|element| {
                if let Some(wanted) = element_type {
                    if element.element_type != wanted {
                        return false;
                    }
                }
                if filters.is_empty() {
                    return true;
                }
                let Ok(value) = serde_json::to_value(element) else {
                    return false;
                };
                filters
                    .iter()
                    .all(|(field, expected)| value.get(field) == Some(expected))
            })
            .cloned()
            .collect()
    }

    pub fn scene(&self) -> &SceneState {
        &self.scene
    }

    // ── Single-item mutations ───────────────────────────────────────────

    /// Store a new element. An absent id is generated; a caller-supplied id
    /// that already exists overwrites the previous record (last-write-wins,
    /// version back to 1). This asymmetry with `update`/`delete` strictness
    /// is part of the contract.
    pub fn create(&mut self, input: CreateElement) -> Element {
        let element = self.materialize(input);
        self.elements.insert(element.id.clone(), element.clone());
        self.emit(&StoreEvent::ElementCreated {
            element: element.clone(),
        });
        element
    }

    /// Merge partial fields over an existing element. The id can never be
    /// changed through a patch. Fails with `NotFound` before emitting
    /// anything when the id is absent.
    pub fn update(&mut self, id: &str, patch: &ElementPatch) -> Result<Element, StoreError> {
        let element = self.update_silent(id, patch)?;
        self.emit(&StoreEvent::ElementUpdated {
            element: element.clone(),
        });
        Ok(element)
    }

    /// Remove an element. Fails with `NotFound` when absent; the emitted
    /// event carries only the id. Group entries referencing the element are
    /// left in place (dissolved only by an explicit ungroup).
    pub fn delete(&mut self, id: &str) -> Result<ElementId, StoreError> {
        let Some(removed) = self.elements.remove(id) else {
            return Err(StoreError::NotFound { id: id.to_owned() });
        };
        self.emit(&StoreEvent::ElementDeleted {
            id: removed.id.clone(),
        });
        Ok(removed.id)
    }

    // ── Batch mutations (one aggregate event each) ──────────────────────

    /// Apply `create`'s defaulting to every item but emit exactly one
    /// aggregate event listing all created records.
    pub fn batch_create(&mut self, inputs: Vec<CreateElement>) -> Vec<Element> {
        let created: Vec<Element> = inputs
            .into_iter()
            .map(|input| {
                let element = self.materialize(input);
                self.elements.insert(element.id.clone(), element.clone());
                element
            })
            .collect();

        if !created.is_empty() {
            self.emit(&StoreEvent::ElementsBatchCreated {
                elements: created.clone(),
            });
        }
        created
    }

    /// Per-item not-found failures are collected rather than aborting the
    /// batch; the single aggregate event carries only the succeeded subset.
    pub fn batch_update(&mut self, updates: Vec<ElementUpdate>) -> BatchOutcome<Element> {
        let mut outcome = BatchOutcome::default();
        for ElementUpdate { id, patch } in updates {
            match self.update_silent(id.as_str(), &patch) {
                Ok(element) => outcome.record_success(element),
                Err(err) => outcome.record_failure(id.as_str(), &err),
            }
        }
        if !outcome.succeeded.is_empty() {
            self.emit(&StoreEvent::ElementsBatchUpdated {
                elements: outcome.succeeded.clone(),
            });
        }
        outcome
    }

    pub fn batch_delete(&mut self, ids: &[String]) -> BatchOutcome<ElementId> {
        let mut outcome = BatchOutcome::default();
        for id in ids {
            match self.elements.remove(id.as_str()) {
                Some(removed) => outcome.record_success(removed.id),
                None => outcome.record_failure(
                    id.clone(),
                    &StoreError::NotFound { id: id.clone() },
                ),
            }
        }
        if !outcome.succeeded.is_empty() {
            self.emit(&StoreEvent::ElementsBatchDeleted {
                ids: outcome.succeeded.clone(),
            });
        }
        outcome
    }

    // ── Wholesale operations ────────────────────────────────────────────

    /// Wholesale overwrite: clears the collection, then inserts the supplied
    /// elements verbatim with versions reset to 1 and the sync marker
    /// stamped. Used when a viewer's local edits become authoritative.
    pub fn sync(&mut self, elements: Vec<Element>, timestamp: Option<u64>) -> usize {
        let timestamp = timestamp.unwrap_or_else(now_millis);
        self.elements.clear();
        for mut element in elements {
            element.version = 1;
            element.synced_at = Some(timestamp);
            self.elements.insert(element.id.clone(), element);
        }
        let count = self.elements.len();
        self.emit(&StoreEvent::ElementsSynced { count, timestamp });
        count
    }

    /// Empties the collection. Emits no event; callers that need a live
    /// clear notification broadcast one themselves.
    pub fn clear(&mut self) {
        self.elements.clear();
    }

    // ── Scene mutations ─────────────────────────────────────────────────

    pub fn set_theme(&mut self, theme: impl Into<String>) {
        self.scene.theme = theme.into();
    }

    pub fn set_viewport(&mut self, viewport: Viewport) {
        self.scene.viewport = viewport;
    }

    /// Group the listed elements: allocates a group id, appends it to each
    /// existing member's `group_ids`, and records members in call order.
    /// Missing ids are reported, not fatal; no group is created when every
    /// id is missing. Touched members are versioned and announced in one
    /// aggregate event.
    pub fn group(&mut self, ids: &[String]) -> GroupResult {
        let group_id = generate_group_id();
        let now = now_millis();
        let mut members = BatchOutcome::default();
        let mut member_ids = Vec::new();

        for id in ids {
            match self.elements.get_mut(id.as_str()) {
                Some(element) => {
                    element.group_ids.push(group_id.clone());
                    element.updated_at = now;
                    element.bump_version();
                    member_ids.push(element.id.clone());
                    members.record_success(element.clone());
                }
                None => members.record_failure(
                    id.clone(),
                    &StoreError::NotFound { id: id.clone() },
                ),
            }
        }

        if member_ids.is_empty() {
            return GroupResult {
                group_id: None,
                members,
            };
        }

        self.scene.groups.insert(group_id.clone(), member_ids);
        self.emit(&StoreEvent::ElementsBatchUpdated {
            elements: members.succeeded.clone(),
        });
        GroupResult {
            group_id: Some(group_id),
            members,
        }
    }

    /// Dissolve a group: removes the registry entry and strips the group id
    /// from every surviving member. Members deleted since grouping are
    /// skipped. Fails with `GroupNotFound` when the group does not exist.
    pub fn ungroup(&mut self, group_id: &str) -> Result<Vec<Element>, StoreError> {
        let Some(member_ids) = self.scene.groups.remove(group_id) else {
            return Err(StoreError::GroupNotFound {
                id: group_id.to_owned(),
            });
        };

        let now = now_millis();
        let mut updated = Vec::new();
        for member_id in &member_ids {
            if let Some(element) = self.elements.get_mut(member_id.as_str()) {
                element.group_ids.retain(|gid| gid.as_str() != group_id);
                element.updated_at = now;
                element.bump_version();
                updated.push(element.clone());
            }
        }

        if !updated.is_empty() {
            self.emit(&StoreEvent::ElementsBatchUpdated {
                elements: updated.clone(),
            });
        }
        Ok(updated)
    }

    /// Set the advisory lock flag on each listed element. The flag is
    /// metadata only: the store keeps accepting mutations on locked
    /// elements.
    pub fn set_locked(&mut self, ids: &[String], locked: bool) -> BatchOutcome<Element> {
        let now = now_millis();
        let mut outcome = BatchOutcome::default();
        for id in ids {
            match self.elements.get_mut(id.as_str()) {
                Some(element) => {
                    element.locked = locked;
                    element.updated_at = now;
                    element.bump_version();
                    outcome.record_success(element.clone());
                }
                None => outcome.record_failure(
                    id.clone(),
                    &StoreError::NotFound { id: id.clone() },
                ),
            }
        }
        if !outcome.succeeded.is_empty() {
            self.emit(&StoreEvent::ElementsBatchUpdated {
                elements: outcome.succeeded.clone(),
            });
        }
        outcome
    }

    // ── Internals ───────────────────────────────────────────────────────

    fn materialize(&self, input: CreateElement) -> Element {
        let mut input = input;
        let id = input.id.take().unwrap_or_else(generate_element_id);
        input.materialize(id, now_millis())
    }

    fn update_silent(&mut self, id: &str, patch: &ElementPatch) -> Result<Element, StoreError> {
        let element = self
            .elements
            .get_mut(id)
            .ok_or_else(|| StoreError::NotFound { id: id.to_owned() })?;
        patch.merge_into(element);
        element.updated_at = now_millis();
        element.bump_version();
        element.apply_text_label_rule();
        Ok(element.clone())
    }
}
