//! Asynchronous prompt loading with placeholder fallback.

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

use tracing::warn;

use pf_core::{PromptSource, FAILURE_PLACEHOLDER};

use crate::viewer::{LoadOutcome, LoadRequest};

/// Loads prompt text through a [`PromptSource`]; never fails.
#[derive(Clone)]
pub struct PromptLoader {
    source: Arc<dyn PromptSource>,
    in_flight: Arc<AtomicUsize>,
}

struct InFlight<'a>(&'a AtomicUsize);

impl<'a> InFlight<'a> {
    fn enter(counter: &'a AtomicUsize) -> Self {
        counter.fetch_add(1, Ordering::SeqCst);
        Self(counter)
    }
}

impl Drop for InFlight<'_> {
    fn drop(&mut self) {
        self.0.fetch_sub(1, Ordering::SeqCst);
    }
}

impl PromptLoader {
    pub fn new(source: Arc<dyn PromptSource>) -> Self {
        Self {
            source,
            in_flight: Arc::new(AtomicUsize::new(0)),
        }
    }

    /// True while any load started by this loader (or its clones) is pending.
    pub fn is_loading(&self) -> bool {
        self.in_flight.load(Ordering::SeqCst) > 0
    }

    /// Fetch prompt text. The bool is true when the placeholder was substituted.
    pub async fn load_text(&self, prompt_file: &str) -> (String, bool) {
        let _guard = InFlight::enter(&self.in_flight);
        match self.source.fetch(prompt_file).await {
            Ok(text) => (text, false),
            Err(err) => {
                warn!(source = self.source.name(), file = prompt_file, error = %err, "prompt load failed");
                (FAILURE_PLACEHOLDER.to_string(), true)
            }
        }
    }

    /// Fetch prompt text, substituting the placeholder on failure.
    pub async fn load(&self, prompt_file: &str) -> String {
        self.load_text(prompt_file).await.0
    }

    /// Answer a viewer request with an outcome carrying the same tag.
    pub async fn load_for(&self, request: LoadRequest) -> LoadOutcome {
        let (text, failed) = self.load_text(&request.prompt_file).await;
        LoadOutcome {
            entry_id: request.entry_id,
            ticket: request.ticket,
            text,
            failed,
        }
    }
}

impl std::fmt::Debug for PromptLoader {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PromptLoader")
            .field("source", &self.source.name())
            .field("in_flight", &self.in_flight.load(Ordering::SeqCst))
            .finish()
    }
}
