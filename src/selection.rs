//! Hover/lock selection state for the detail panel
//!
//! Single-selection: at most one shipment is active at a time. A click locks
//! the clicked shipment; while locked, hover events are ignored. Unlocking
//! clears the selection rather than restoring an earlier hover.

use std::sync::Arc;

use crate::record::ShipmentRecord;

#[derive(Debug, Clone, Default)]
pub enum SelectionState {
    #[default]
    None,
    Hovered(Arc<ShipmentRecord>),
    Locked(Arc<ShipmentRecord>),
}

/// Selection owned by one view
#[derive(Debug, Clone, Default)]
pub struct Selection {
    state: SelectionState,
}

impl Selection {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn state(&self) -> &SelectionState {
        &self.state
    }

    /// Pointer entered an edge or route. Ignored while locked.
    pub fn pointer_enter(&mut self, record: Arc<ShipmentRecord>) {
        if !self.is_locked() {
            self.state = SelectionState::Hovered(record);
        }
    }

    /// Pointer left an edge or route. Ignored while locked.
    pub fn pointer_leave(&mut self) {
        if let SelectionState::Hovered(_) = self.state {
            self.state = SelectionState::None;
        }
    }

    /// Lock onto the clicked record, replacing any hover or earlier lock
    pub fn click(&mut self, record: Arc<ShipmentRecord>) {
        self.state = SelectionState::Locked(record);
    }

    /// Release a lock. No-op unless locked.
    pub fn unlock(&mut self) {
        if self.is_locked() {
            self.state = SelectionState::None;
        }
    }

    pub fn clear(&mut self) {
        self.state = SelectionState::None;
    }

    pub fn is_locked(&self) -> bool {
        matches!(self.state, SelectionState::Locked(_))
    }

    /// The record the detail panel should show
    pub fn displayed(&self) -> Option<&Arc<ShipmentRecord>> {
        match &self.state {
            SelectionState::None => None,
            SelectionState::Hovered(record) | SelectionState::Locked(record) => Some(record),
        }
    }
}
