//! Portfolio catalog, view derivation, viewer navigation, prompt loading, and the
//! classification sweep.

pub mod catalog;
pub mod gallery;
pub mod loader;
pub mod sweep;
pub mod view;
pub mod viewer;

pub use catalog::{format_timestamp, Catalog, UNKNOWN_STAMP};
pub use gallery::{Gallery, SweepProgress};
pub use loader::PromptLoader;
pub use sweep::{classify_target, pending_targets, run_sweep, sweep_catalog, SweepEvent, SweepTarget};
pub use view::{derive_view, derive_view_with};
pub use viewer::{KeyResponse, LoadOutcome, LoadRequest, Viewer, ViewerKey, COPY_FEEDBACK};
