use std::sync::Arc;

use thiserror::Error;
use tracing::{debug, error, info};

use crate::config::AppConfig;
use crate::filter::extract_relevant_story;
use crate::providers::azure_devops::AzureDevOpsClient;
use crate::providers::{ClientError, WorkItemApi};
use crate::reconcile::{collect_existing_child_titles, reconcile, ReconciliationReport, StoryTarget};

#[derive(Debug, Error)]
pub enum AutomationError {
    #[error("invalid payload: {0}")]
    MalformedPayload(String),
    #[error("missing required configuration or payload fields: {0}")]
    MissingConfiguration(String),
    #[error("failed to fetch work item {id}: {source}")]
    FetchFailed {
        id: u64,
        #[source]
        source: ClientError,
    },
}

/// How one webhook delivery ended, short of an error.
#[derive(Debug)]
pub enum Outcome {
    /// Not a user story event; nothing was called.
    Ignored,
    Completed {
        story_id: u64,
        report: ReconciliationReport,
    },
}

/// Runs one delivery through filter, validation, hierarchy lookup and reconciliation.
pub struct TaskAutomation {
    api: Option<Arc<dyn WorkItemApi>>,
    missing_config: Vec<&'static str>,
}

impl TaskAutomation {
    pub fn from_config(config: &AppConfig) -> Self {
        match config.ado() {
            Ok(ado) => Self::with_api(Arc::new(AzureDevOpsClient::new(ado))),
            Err(_) => Self::unconfigured(config.missing()),
        }
    }

    pub fn with_api(api: Arc<dyn WorkItemApi>) -> Self {
        Self {
            api: Some(api),
            missing_config: Vec::new(),
        }
    }

    pub fn unconfigured(missing: Vec<&'static str>) -> Self {
        Self {
            api: None,
            missing_config: missing,
        }
    }

    pub async fn handle(&self, payload: &[u8]) -> Result<Outcome, AutomationError> {
        debug!(payload = %String::from_utf8_lossy(payload), "Full payload");

        let Some(story) = extract_relevant_story(payload)? else {
            info!("Ignoring non User Story work item");
            return Ok(Outcome::Ignored);
        };

        let mut missing: Vec<&str> = self.missing_config.clone();
        if story.story_id.is_none() {
            missing.push("resource.id");
        }
        let (Some(api), Some(story_id)) = (self.api.as_deref(), story.story_id) else {
            error!(missing = ?missing, "Missing required configuration or payload fields");
            return Err(AutomationError::MissingConfiguration(missing.join(", ")));
        };

        let parent = api.fetch_with_relations(story_id).await.map_err(|e| {
            error!(story_id, error = %e, "Failed to fetch parent work item");
            AutomationError::FetchFailed {
                id: story_id,
                source: e,
            }
        })?;

        let existing = collect_existing_child_titles(api, &parent).await;
        debug!(story_id, existing = ?existing, "Existing child titles");

        let target = StoryTarget {
            story_id,
            area_path: story.area_path.or(parent.fields.area_path),
            iteration_path: story.iteration_path.or(parent.fields.iteration_path),
        };
        let report = reconcile(api, &target, &existing).await;

        info!(
            story_id,
            created = report.created_count(),
            skipped = report.skipped_count(),
            failed = report.failures().len(),
            "Task automation completed"
        );

        Ok(Outcome::Completed { story_id, report })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::providers::mock::MockWorkItemApi;
    use crate::reconcile::reconciler::CANONICAL_TASKS;
    use serde_json::json;

    fn story_event(id: u64) -> Vec<u8> {
        json!({
            "eventType": "workitem.updated",
            "resource": {
                "id": id,
                "fields": {
                    "System.WorkItemType": {"newValue": "User Story"},
                    "System.AreaPath": "Acme\\Web",
                    "System.IterationPath": "Acme\\Sprint 4"
                }
            }
        })
        .to_string()
        .into_bytes()
    }

    fn automation(api: &Arc<MockWorkItemApi>) -> TaskAutomation {
        TaskAutomation::with_api(api.clone())
    }

    #[tokio::test]
    async fn new_story_gets_every_task() {
        let api = Arc::new(MockWorkItemApi::story(42));
        let outcome = automation(&api).handle(&story_event(42)).await.unwrap();

        let Outcome::Completed { story_id, report } = outcome else {
            panic!("expected completion");
        };
        assert_eq!(story_id, 42);
        assert_eq!(report.created_count(), 5);
        assert_eq!(api.created_titles(), CANONICAL_TASKS.to_vec());
        assert!(api
            .calls
            .lock()
            .unwrap()
            .creates
            .iter()
            .all(|r| r.parent_id == 42));
    }

    #[tokio::test]
    async fn non_story_makes_no_calls() {
        let api = Arc::new(MockWorkItemApi::story(42));
        let payload = json!({
            "resource": {"id": 42, "fields": {"System.WorkItemType": "Bug"}}
        })
        .to_string();

        let outcome = automation(&api).handle(payload.as_bytes()).await.unwrap();
        assert!(matches!(outcome, Outcome::Ignored));
        assert_eq!(api.outbound_calls(), 0);
    }

    #[tokio::test]
    async fn non_story_is_ignored_even_when_unconfigured() {
        let automation = TaskAutomation::unconfigured(vec!["ADO_PAT"]);
        let payload = br#"{"resource": {"fields": {"System.WorkItemType": "Task"}}}"#;
        assert!(matches!(
            automation.handle(payload).await.unwrap(),
            Outcome::Ignored
        ));
    }

    #[tokio::test]
    async fn missing_configuration_is_rejected() {
        let automation = TaskAutomation::unconfigured(vec!["ADO_ORG", "ADO_PAT"]);
        let err = automation.handle(&story_event(42)).await.unwrap_err();
        assert!(matches!(
            err,
            AutomationError::MissingConfiguration(ref m) if m == "ADO_ORG, ADO_PAT"
        ));
    }

    #[tokio::test]
    async fn missing_story_id_is_rejected_before_any_call() {
        let api = Arc::new(MockWorkItemApi::story(42));
        let payload = json!({
            "resource": {"fields": {"System.WorkItemType": "User Story"}}
        })
        .to_string();

        let err = automation(&api).handle(payload.as_bytes()).await.unwrap_err();
        assert!(matches!(err, AutomationError::MissingConfiguration(ref m) if m == "resource.id"));
        assert_eq!(api.outbound_calls(), 0);
    }

    #[tokio::test]
    async fn zero_story_id_is_rejected_before_any_call() {
        let api = Arc::new(MockWorkItemApi::story(42));
        let err = automation(&api).handle(&story_event(0)).await.unwrap_err();
        assert!(matches!(err, AutomationError::MissingConfiguration(ref m) if m == "resource.id"));
        assert_eq!(api.outbound_calls(), 0);
    }

    #[tokio::test]
    async fn parent_fetch_failure_aborts_before_creation() {
        let api = Arc::new(MockWorkItemApi::story(42).with_parent_status(404));
        let err = automation(&api).handle(&story_event(42)).await.unwrap_err();

        assert!(matches!(err, AutomationError::FetchFailed { id: 42, .. }));
        assert!(api.calls.lock().unwrap().creates.is_empty());
    }

    #[tokio::test]
    async fn existing_children_are_not_duplicated() {
        let api = Arc::new(
            MockWorkItemApi::story(42)
                .with_child("100", "Requirements and Grooming")
                .with_child("101", "Implementation"),
        );
        automation(&api).handle(&story_event(42)).await.unwrap();
        assert_eq!(
            api.created_titles(),
            vec![
                "Design & Approach",
                "Test & Validation",
                "Documentation & Handover"
            ]
        );
    }

    #[tokio::test]
    async fn unreadable_child_leads_to_recreation() {
        // A child whose title cannot be read does not count as present.
        let api = Arc::new(
            MockWorkItemApi::story(42)
                .with_child("100", "Requirements and Grooming")
                .with_unreachable_child("101"),
        );
        let outcome = automation(&api).handle(&story_event(42)).await.unwrap();
        let Outcome::Completed { report, .. } = outcome else {
            panic!("expected completion");
        };
        assert_eq!(report.created_count(), 4);
    }

    #[tokio::test]
    async fn create_failure_still_completes() {
        let api = Arc::new(MockWorkItemApi::story(42).failing_on("Requirements and Grooming"));
        let outcome = automation(&api).handle(&story_event(42)).await.unwrap();
        let Outcome::Completed { report, .. } = outcome else {
            panic!("expected completion");
        };
        assert_eq!(report.failures().len(), 1);
        assert_eq!(report.created_count(), 4);
        assert_eq!(api.created_titles().len(), 5);
    }

    #[tokio::test]
    async fn paths_fall_back_to_parent_fields() {
        let api = Arc::new(MockWorkItemApi::story(7).with_parent_paths("Acme\\Mobile", "Acme\\Sprint 9"));
        let payload = json!({
            "resource": {"id": 7, "fields": {"System.WorkItemType": "User Story"}}
        })
        .to_string();

        automation(&api).handle(payload.as_bytes()).await.unwrap();
        let calls = api.calls.lock().unwrap();
        assert_eq!(calls.creates[0].area_path.as_deref(), Some("Acme\\Mobile"));
        assert_eq!(calls.creates[0].iteration_path.as_deref(), Some("Acme\\Sprint 9"));
    }

    #[tokio::test]
    async fn malformed_payload_is_rejected() {
        let api = Arc::new(MockWorkItemApi::story(42));
        let err = automation(&api).handle(b"not json").await.unwrap_err();
        assert!(matches!(err, AutomationError::MalformedPayload(_)));
        assert_eq!(api.outbound_calls(), 0);
    }
}
