//! Startup pass that resolves every unclassified entry.

use std::time::Duration;

use tokio::sync::mpsc::UnboundedSender;
use tracing::{debug, info};

use pf_classify::classify_prompt;
use pf_core::{Category, EntryId};

use crate::catalog::Catalog;
use crate::loader::PromptLoader;

/// One entry the sweep has to resolve.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct SweepTarget {
    pub entry_id: EntryId,
    pub prompt_file: String,
}

/// Progress announcements.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum SweepEvent {
    Started {
        total: usize,
    },
    Classified {
        entry_id: EntryId,
        category: Category,
        done: usize,
        total: usize,
    },
    Finished {
        classified: usize,
    },
}

/// Unclassified entries in catalog order.
pub fn pending_targets(catalog: &Catalog) -> Vec<SweepTarget> {
    catalog
        .unclassified()
        .map(|entry| SweepTarget {
            entry_id: entry.id,
            prompt_file: entry.prompt_file.clone(),
        })
        .collect()
}

/// Load and classify one target; a failed load resolves to `ImagePrompt`.
pub async fn classify_target(loader: &PromptLoader, target: &SweepTarget) -> Category {
    let (text, failed) = loader.load_text(&target.prompt_file).await;
    if failed {
        debug!(entry = %target.entry_id, "sweep load failed, defaulting category");
        return Category::ImagePrompt;
    }
    classify_prompt(&text)
}

/// Classify `targets` one at a time, pausing `delay` between items, and report
/// each result on `events`. Stops early if the receiver is gone.
pub async fn run_sweep(
    loader: PromptLoader,
    targets: Vec<SweepTarget>,
    delay: Duration,
    events: UnboundedSender<SweepEvent>,
) -> usize {
    let total = targets.len();
    info!(total, "classification sweep started");
    if events.send(SweepEvent::Started { total }).is_err() {
        return 0;
    }

    let mut done = 0;
    for target in targets {
        if done > 0 && !delay.is_zero() {
            tokio::time::sleep(delay).await;
        }
        let category = classify_target(&loader, &target).await;
        done += 1;
        debug!(entry = %target.entry_id, %category, done, total, "entry classified");
        let event = SweepEvent::Classified {
            entry_id: target.entry_id,
            category,
            done,
            total,
        };
        if events.send(event).is_err() {
            return done;
        }
    }

    info!(classified = done, "classification sweep finished");
    let _ = events.send(SweepEvent::Finished { classified: done });
    done
}

/// Run the sweep directly against an owned catalog, without pacing.
/// Returns how many entries changed category.
pub async fn sweep_catalog(catalog: &mut Catalog, loader: &PromptLoader) -> usize {
    let targets = pending_targets(catalog);
    if targets.is_empty() {
        return 0;
    }
    info!(total = targets.len(), "classification sweep started");
    let mut updated = 0;
    for target in &targets {
        let category = classify_target(loader, target).await;
        if catalog.update_category(target.entry_id, category) {
            updated += 1;
        }
    }
    info!(classified = updated, "classification sweep finished");
    updated
}
