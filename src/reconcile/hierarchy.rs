use std::collections::HashSet;

use futures::stream::{self, StreamExt};
use tracing::{debug, warn};

use crate::model::work_item::ParentWorkItem;
use crate::providers::WorkItemApi;

/// Upper bound on child title fetches in flight at once.
pub const CHILD_FETCH_CONCURRENCY: usize = 8;

/// Titles of the story's current children.
///
/// Title fetches fan out concurrently, at most [`CHILD_FETCH_CONCURRENCY`] at a time.
/// A child that cannot be read, or has no title, is left out of the set rather than
/// failing the whole lookup, so the result can be incomplete when the service is flaky.
pub async fn collect_existing_child_titles(
    api: &dyn WorkItemApi,
    parent: &ParentWorkItem,
) -> HashSet<String> {
    let fetches = stream::iter(parent.child_ids()).map(|child_id| async move {
        match api.fetch_title(child_id).await {
            Ok(Some(title)) if !title.is_empty() => Some(title),
            Ok(_) => {
                debug!(story_id = parent.id, child_id, "Child has no readable title");
                None
            }
            Err(e) => {
                warn!(story_id = parent.id, child_id, error = %e, "Child title fetch failed, omitting it");
                None
            }
        }
    });

    fetches
        .boxed()
        .buffered(CHILD_FETCH_CONCURRENCY)
        .collect::<Vec<_>>()
        .await
        .into_iter()
        .flatten()
        .collect()
}
