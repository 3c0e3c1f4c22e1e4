pub mod hierarchy;
pub mod reconciler;

pub use hierarchy::collect_existing_child_titles;
pub use reconciler::{reconcile, ReconciliationReport, StoryTarget};
