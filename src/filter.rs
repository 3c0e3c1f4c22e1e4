use tracing::debug;

use crate::automation::AutomationError;
use crate::model::event::{
    FieldValue, StoryContext, WorkItemEvent, AREA_PATH, ITERATION_PATH, USER_STORY,
    WORK_ITEM_TYPE,
};

/// Parse a webhook body and pull out the story it concerns.
///
/// `Ok(None)` means the event is well-formed but not about a user story.
pub fn extract_relevant_story(payload: &[u8]) -> Result<Option<StoryContext>, AutomationError> {
    let event: WorkItemEvent = serde_json::from_slice(payload)
        .map_err(|e| AutomationError::MalformedPayload(e.to_string()))?;
    Ok(relevant_story(&event))
}

pub fn relevant_story(event: &WorkItemEvent) -> Option<StoryContext> {
    let resource = event.resource.clone().unwrap_or_default();

    let work_item_type = resource.field(WORK_ITEM_TYPE);
    let resolved = work_item_type.as_ref().and_then(FieldValue::current);
    if resolved != Some(USER_STORY) {
        debug!(
            event_type = ?event.event_type,
            work_item_type = ?resolved,
            previous_type = ?work_item_type.as_ref().and_then(FieldValue::previous),
            "Event is not about a user story"
        );
        return None;
    }

    Some(StoryContext {
        story_id: resource.story_id(),
        area_path: resource.field(AREA_PATH).and_then(FieldValue::into_current),
        iteration_path: resource
            .field(ITERATION_PATH)
            .and_then(FieldValue::into_current),
    })
}
