//! Modal viewer state machine over the current view.

use std::time::{Duration, Instant};

use pf_core::{EntryId, PortfolioEntry};

/// How long the "copied" confirmation stays visible.
pub const COPY_FEEDBACK: Duration = Duration::from_secs(2);

/// Request to load the prompt of `entry_id`.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct LoadRequest {
    pub entry_id: EntryId,
    pub prompt_file: String,
    /// Increases with every request; only the latest one may update the viewer.
    pub ticket: u64,
}

/// Result of a prompt load, tagged with the request it answers.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct LoadOutcome {
    pub entry_id: EntryId,
    pub ticket: u64,
    pub text: String,
    /// The text is the failure placeholder.
    pub failed: bool,
}

/// Keys the viewer reacts to while open.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ViewerKey {
    Left,
    Right,
    Escape,
}

/// What a key press did.
#[derive(Clone, Debug, PartialEq, Eq, Default)]
pub struct KeyResponse {
    /// The key was consumed; the host must suppress its default behavior.
    pub handled: bool,
    /// A prompt load to start.
    pub load: Option<LoadRequest>,
}

/// Transient state of the modal viewer.
#[derive(Debug, Default)]
pub struct Viewer {
    active: Option<EntryId>,
    prompt_text: String,
    loading: bool,
    ticket: u64,
    copied: Option<(EntryId, Instant)>,
}

impl Viewer {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn is_open(&self) -> bool {
        self.active.is_some()
    }

    pub fn active_id(&self) -> Option<EntryId> {
        self.active
    }

    pub fn prompt_text(&self) -> &str {
        &self.prompt_text
    }

    pub fn is_prompt_loading(&self) -> bool {
        self.loading
    }

    /// Show `entry`, from closed or while already open.
    pub fn open(&mut self, entry: &PortfolioEntry) -> LoadRequest {
        self.active = Some(entry.id);
        self.prompt_text.clear();
        self.loading = true;
        self.ticket += 1;
        LoadRequest {
            entry_id: entry.id,
            prompt_file: entry.prompt_file.clone(),
            ticket: self.ticket,
        }
    }

    pub fn close(&mut self) {
        self.active = None;
        self.prompt_text.clear();
        self.loading = false;
        self.copied = None;
    }

    /// Position of the active entry in `view`, looked up fresh on every call.
    pub fn position(&self, view: &[&PortfolioEntry]) -> Option<usize> {
        let active = self.active?;
        view.iter().position(|entry| entry.id == active)
    }

    pub fn can_prev(&self, view: &[&PortfolioEntry]) -> bool {
        self.position(view).is_some_and(|index| index > 0)
    }

    pub fn can_next(&self, view: &[&PortfolioEntry]) -> bool {
        self.position(view)
            .is_some_and(|index| index + 1 < view.len())
    }

    /// Move to the entry before the active one in `view`.
    pub fn prev(&mut self, view: &[&PortfolioEntry]) -> Option<LoadRequest> {
        if !self.can_prev(view) {
            return None;
        }
        let index = self.position(view)?;
        Some(self.open(view[index - 1]))
    }

    /// Move to the entry after the active one in `view`.
    pub fn next(&mut self, view: &[&PortfolioEntry]) -> Option<LoadRequest> {
        if !self.can_next(view) {
            return None;
        }
        let index = self.position(view)?;
        Some(self.open(view[index + 1]))
    }

    /// Keyboard bindings; inert while closed.
    pub fn handle_key(&mut self, key: ViewerKey, view: &[&PortfolioEntry]) -> KeyResponse {
        if !self.is_open() {
            return KeyResponse::default();
        }
        let load = match key {
            ViewerKey::Left => self.prev(view),
            ViewerKey::Right => self.next(view),
            ViewerKey::Escape => {
                self.close();
                None
            }
        };
        KeyResponse {
            handled: true,
            load,
        }
    }

    /// Apply a finished load. Returns false when a newer request has superseded it.
    pub fn apply_load(&mut self, outcome: &LoadOutcome) -> bool {
        if self.active != Some(outcome.entry_id) || self.ticket != outcome.ticket {
            return false;
        }
        self.prompt_text.clone_from(&outcome.text);
        self.loading = false;
        true
    }

    /// Record a successful clipboard write for the active entry.
    pub fn mark_copied(&mut self, now: Instant) {
        self.copied = self.active.map(|id| (id, now));
    }

    /// Id echoed while the copy confirmation is visible.
    pub fn copy_feedback_id(&self) -> Option<EntryId> {
        self.copied.map(|(id, _)| id)
    }

    /// Expire the copy confirmation.
    pub fn tick(&mut self, now: Instant) {
        if let Some((_, at)) = self.copied {
            if now.duration_since(at) >= COPY_FEEDBACK {
                self.copied = None;
            }
        }
    }
}
