use std::collections::HashSet;

use tracing::{error, info};

use crate::model::work_item::TaskCreationRequest;
use crate::providers::WorkItemApi;

/// Sub-tasks every user story carries, in creation order. Titles match exactly.
pub const CANONICAL_TASKS: [&str; 5] = [
    "Requirements and Grooming",
    "Design & Approach",
    "Implementation",
    "Test & Validation",
    "Documentation & Handover",
];

/// The story tasks are created under, with the paths they inherit.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StoryTarget {
    pub story_id: u64,
    pub area_path: Option<String>,
    pub iteration_path: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TaskOutcome {
    AlreadyPresent,
    Created { id: Option<u64> },
    Failed { reason: String },
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TaskFailure<'a> {
    pub title: &'static str,
    pub reason: &'a str,
}

/// Per-title outcomes in canonical order.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ReconciliationReport {
    pub outcomes: Vec<(&'static str, TaskOutcome)>,
}

impl ReconciliationReport {
    pub fn created(&self) -> Vec<&'static str> {
        self.titles_where(|o| matches!(o, TaskOutcome::Created { .. }))
    }

    pub fn skipped(&self) -> Vec<&'static str> {
        self.titles_where(|o| matches!(o, TaskOutcome::AlreadyPresent))
    }

    pub fn failures(&self) -> Vec<TaskFailure<'_>> {
        self.outcomes
            .iter()
            .filter_map(|(title, outcome)| match outcome {
                TaskOutcome::Failed { reason } => Some(TaskFailure {
                    title: *title,
                    reason: reason.as_str(),
                }),
                _ => None,
            })
            .collect()
    }

    pub fn created_count(&self) -> usize {
        self.created().len()
    }

    pub fn skipped_count(&self) -> usize {
        self.skipped().len()
    }

    fn titles_where(&self, pred: impl Fn(&TaskOutcome) -> bool) -> Vec<&'static str> {
        self.outcomes
            .iter()
            .filter(|(_, o)| pred(o))
            .map(|(t, _)| *t)
            .collect()
    }
}

/// Canonical titles not yet present, in canonical order.
pub fn missing_titles(existing: &HashSet<String>) -> Vec<&'static str> {
    CANONICAL_TASKS
        .into_iter()
        .filter(|title| !existing.contains(*title))
        .collect()
}

/// Create whichever canonical tasks the story lacks.
///
/// Creations run one after another so the service hands out ids in canonical order.
/// A failed creation is recorded and the remaining titles are still attempted;
/// nothing is retried here.
pub async fn reconcile(
    api: &dyn WorkItemApi,
    story: &StoryTarget,
    existing: &HashSet<String>,
) -> ReconciliationReport {
    let mut report = ReconciliationReport::default();
    info!(
        story_id = story.story_id,
        missing = ?missing_titles(existing),
        "Reconciling canonical tasks"
    );

    for title in CANONICAL_TASKS {
        if existing.contains(title) {
            info!(story_id = story.story_id, title, "Task already exists");
            report.outcomes.push((title, TaskOutcome::AlreadyPresent));
            continue;
        }

        let request = TaskCreationRequest {
            title: title.to_string(),
            area_path: story.area_path.clone(),
            iteration_path: story.iteration_path.clone(),
            parent_id: story.story_id,
        };

        let outcome = match api.create_task(&request).await {
            Ok(created) => {
                info!(story_id = story.story_id, title, task_id = ?created.id, "Task created");
                TaskOutcome::Created { id: created.id }
            }
            Err(e) => {
                error!(story_id = story.story_id, title, error = %e, "Failed to create task");
                TaskOutcome::Failed {
                    reason: e.to_string(),
                }
            }
        };
        report.outcomes.push((title, outcome));
    }

    report
}
