//! Framework-agnostic controller: intents in, state changes and load requests out.

use std::time::Instant;

use tracing::{debug, warn};

use pf_classify::classify_prompt;
use pf_core::{
    Category, CategoryFilter, Clipboard, EntryId, PortfolioEntry, SortDirection, SortKey,
    ViewPreferences,
};

use crate::catalog::Catalog;
use crate::sweep::{pending_targets, SweepEvent, SweepTarget};
use crate::view::derive_view_with;
use crate::viewer::{KeyResponse, LoadOutcome, LoadRequest, Viewer, ViewerKey};

/// Sweep progress as shown to the user.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct SweepProgress {
    pub in_progress: bool,
    pub done: usize,
    pub total: usize,
}

/// Owns the catalog, the view preferences, and the viewer.
#[derive(Debug, Default)]
pub struct Gallery {
    catalog: Catalog,
    preferences: ViewPreferences,
    viewer: Viewer,
    sweep: SweepProgress,
}

impl Gallery {
    pub fn new(catalog: Catalog) -> Self {
        Self {
            catalog,
            ..Self::default()
        }
    }

    pub fn catalog(&self) -> &Catalog {
        &self.catalog
    }

    pub fn preferences(&self) -> &ViewPreferences {
        &self.preferences
    }

    pub fn viewer(&self) -> &Viewer {
        &self.viewer
    }

    pub fn sweep_progress(&self) -> SweepProgress {
        self.sweep
    }

    /// The current view, derived fresh from the catalog and preferences.
    pub fn view(&self) -> Vec<&PortfolioEntry> {
        derive_view_with(self.catalog.entries(), &self.preferences)
    }

    pub fn active_entry(&self) -> Option<&PortfolioEntry> {
        self.viewer.active_id().and_then(|id| self.catalog.get(id))
    }

    /// Position of the active entry in the current view.
    pub fn active_position(&self) -> Option<usize> {
        self.viewer.position(&self.view())
    }

    pub fn can_prev(&self) -> bool {
        self.viewer.can_prev(&self.view())
    }

    pub fn can_next(&self) -> bool {
        self.viewer.can_next(&self.view())
    }

    pub fn set_filter(&mut self, filter: CategoryFilter) {
        self.preferences.category_filter = filter;
    }

    pub fn set_sort_key(&mut self, key: SortKey) {
        self.preferences.sort_key = key;
    }

    pub fn set_sort_direction(&mut self, direction: SortDirection) {
        self.preferences.sort_direction = direction;
    }

    /// Open the viewer on `id`.
    pub fn select(&mut self, id: EntryId) -> Option<LoadRequest> {
        let entry = self.catalog.get(id)?;
        Some(self.viewer.open(entry))
    }

    pub fn next(&mut self) -> Option<LoadRequest> {
        let view = derive_view_with(self.catalog.entries(), &self.preferences);
        self.viewer.next(&view)
    }

    pub fn prev(&mut self) -> Option<LoadRequest> {
        let view = derive_view_with(self.catalog.entries(), &self.preferences);
        self.viewer.prev(&view)
    }

    pub fn close(&mut self) {
        self.viewer.close();
    }

    pub fn handle_key(&mut self, key: ViewerKey) -> KeyResponse {
        let view = derive_view_with(self.catalog.entries(), &self.preferences);
        self.viewer.handle_key(key, &view)
    }

    /// Apply a finished prompt load. The entry is classified from the text when it
    /// is still unclassified, even if the viewer has moved on.
    pub fn apply_load(&mut self, outcome: &LoadOutcome) -> bool {
        let is_unclassified = self
            .catalog
            .get(outcome.entry_id)
            .is_some_and(|entry| !entry.category.is_definitive());
        if is_unclassified {
            let category = classify_prompt(&outcome.text);
            self.catalog.update_category(outcome.entry_id, category);
        }
        let applied = self.viewer.apply_load(outcome);
        if !applied {
            debug!(entry = %outcome.entry_id, ticket = outcome.ticket, "stale prompt load dropped");
        }
        applied
    }

    /// Targets for the startup sweep; marks the sweep as running when there are any.
    pub fn begin_sweep(&mut self) -> Vec<SweepTarget> {
        let targets = pending_targets(&self.catalog);
        self.sweep = SweepProgress {
            in_progress: !targets.is_empty(),
            done: 0,
            total: targets.len(),
        };
        targets
    }

    pub fn apply_sweep_event(&mut self, event: &SweepEvent) {
        match *event {
            SweepEvent::Started { total } => {
                self.sweep = SweepProgress {
                    in_progress: true,
                    done: 0,
                    total,
                };
            }
            SweepEvent::Classified {
                entry_id,
                category,
                done,
                total,
            } => {
                self.catalog.update_category(entry_id, category);
                self.sweep.done = done;
                self.sweep.total = total;
            }
            SweepEvent::Finished { .. } => {
                self.sweep.in_progress = false;
            }
        }
    }

    /// Copy the loaded prompt. Returns whether the clipboard accepted it.
    pub fn copy_prompt(&mut self, clipboard: &mut dyn Clipboard, now: Instant) -> bool {
        if !self.viewer.is_open() || self.viewer.is_prompt_loading() {
            return false;
        }
        match clipboard.write_text(self.viewer.prompt_text()) {
            Ok(()) => {
                self.viewer.mark_copied(now);
                true
            }
            Err(err) => {
                warn!(error = %err, "copy to clipboard failed");
                false
            }
        }
    }

    pub fn tick(&mut self, now: Instant) {
        self.viewer.tick(now);
    }

    /// Category of `id`, for callers that only hold the id.
    pub fn category_of(&self, id: EntryId) -> Option<Category> {
        self.catalog.get(id).map(|entry| entry.category)
    }
}
