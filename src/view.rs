//! View lifecycle
//!
//! A view fetches its shipment list once when mounted and owns the selection
//! for as long as it lives. Dropping the view cancels a fetch that is still in
//! flight, and a fetch that completes after teardown is discarded.

use std::sync::Arc;

use tokio::sync::watch;
use tokio_util::sync::{CancellationToken, DropGuard};

use crate::dataset::Dataset;
use crate::detail::DetailPanel;
use crate::record::ShipmentRecord;
use crate::selection::Selection;
use crate::source::{RecordSource, SourceError};

/// Load progress of a view's shipment list
#[derive(Debug, Clone)]
pub enum LoadState {
    /// Request in flight
    Loading,
    /// No source configured; nothing was requested
    Unavailable,
    /// The source failed; see [`SourceError::kind`] for the category
    Failed(Arc<SourceError>),
    /// Loaded successfully, possibly with zero records
    Ready(Dataset),
}

impl LoadState {
    pub fn is_loading(&self) -> bool {
        matches!(self, LoadState::Loading)
    }

    pub fn dataset(&self) -> Option<&Dataset> {
        match self {
            LoadState::Ready(dataset) => Some(dataset),
            _ => None,
        }
    }
}

/// What a pointer event refers to
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Target {
    /// Cluster graph edge, by edge id
    Edge(String),
    /// Route map segment, by source record index
    Route(usize),
}

/// Interaction events dispatched by the render surface
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Interaction {
    Enter(Target),
    Leave,
    Click(Target),
    Unlock,
    Clear,
}

/// One mounted view
pub struct ShipmentView {
    state: watch::Receiver<LoadState>,
    selection: Selection,
    _cancel: Option<DropGuard>,
}

impl ShipmentView {
    /// Mount a view and start its fetch.
    ///
    /// With no source the view is immediately [`LoadState::Unavailable`] and
    /// no projection ever runs. Must be called within a tokio runtime.
    pub fn mount<S: RecordSource>(source: Option<S>) -> Self {
        let Some(source) = source else {
            tracing::warn!("no shipment source configured");
            let (_tx, state) = watch::channel(LoadState::Unavailable);
            return Self {
                state,
                selection: Selection::new(),
                _cancel: None,
            };
        };

        let token = CancellationToken::new();
        let cancelled = token.clone();
        let (tx, state) = watch::channel(LoadState::Loading);

        tokio::spawn(async move {
            let result = tokio::select! {
                _ = cancelled.cancelled() => {
                    tracing::debug!(source = %source.describe(), "view torn down; fetch cancelled");
                    return;
                }
                result = source.fetch() => result,
            };
            if cancelled.is_cancelled() {
                return;
            }

            let next = match result {
                Ok(records) => LoadState::Ready(Dataset::new(records)),
                Err(e) => {
                    tracing::error!(source = %source.describe(), error = %e, "failed to load shipments");
                    LoadState::Failed(Arc::new(e))
                }
            };
            let _ = tx.send(next);
        });

        Self {
            state,
            selection: Selection::new(),
            _cancel: Some(token.drop_guard()),
        }
    }

    /// Current load state
    pub fn state(&self) -> LoadState {
        self.state.borrow().clone()
    }

    /// Wait until the fetch has finished one way or the other
    pub async fn loaded(&mut self) -> LoadState {
        let settled = self
            .state
            .wait_for(|s| !s.is_loading())
            .await
            .map(|s| s.clone());
        match settled {
            Ok(state) => state,
            // Fetch task went away without reporting
            Err(_) => self.state.borrow().clone(),
        }
    }

    pub fn selection(&self) -> &Selection {
        &self.selection
    }

    /// Detail panel for the displayed shipment, if any
    pub fn detail(&self) -> Option<DetailPanel> {
        DetailPanel::for_selection(&self.selection)
    }

    /// Apply one interaction event. Returns false when the event referred to a
    /// target that does not exist (or nothing is loaded) and was ignored.
    pub fn apply(&mut self, event: Interaction) -> bool {
        match event {
            Interaction::Enter(target) => match self.resolve(&target) {
                Some(record) => {
                    self.selection.pointer_enter(record);
                    true
                }
                None => false,
            },
            Interaction::Click(target) => match self.resolve(&target) {
                Some(record) => {
                    self.selection.click(record);
                    true
                }
                None => false,
            },
            Interaction::Leave => {
                self.selection.pointer_leave();
                true
            }
            Interaction::Unlock => {
                self.selection.unlock();
                true
            }
            Interaction::Clear => {
                self.selection.clear();
                true
            }
        }
    }

    fn resolve(&self, target: &Target) -> Option<Arc<ShipmentRecord>> {
        let state = self.state.borrow();
        let dataset = state.dataset()?;
        match target {
            Target::Edge(id) => dataset.graph().edge(id).map(|e| Arc::clone(&e.shipment)),
            Target::Route(index) => dataset
                .routes()
                .iter()
                .find(|r| r.index == *index)
                .map(|r| Arc::clone(&r.shipment)),
        }
    }

    /// Tear the view down, cancelling any in-flight fetch
    pub fn unmount(self) {
        tracing::debug!("unmounting view");
    }
}
