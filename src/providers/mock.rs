use std::collections::{HashMap, HashSet};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

use async_trait::async_trait;

use super::{ClientError, WorkItemApi};
use crate::model::work_item::{
    CreatedTask, ParentWorkItem, PathFields, Relation, TaskCreationRequest, FORWARD_HIERARCHY,
};

/// Every request the mock has seen, in arrival order.
#[derive(Debug, Default)]
pub struct Calls {
    pub parent_fetches: Vec<u64>,
    pub title_fetches: Vec<String>,
    pub creates: Vec<TaskCreationRequest>,
}

/// In-memory stand-in for the tracking service.
pub struct MockWorkItemApi {
    story_id: u64,
    parent_fields: PathFields,
    parent_status: Option<u16>,
    child_ids: Vec<String>,
    titles: HashMap<String, String>,
    unreachable: HashSet<String>,
    failing_titles: HashSet<String>,
    next_id: Mutex<u64>,
    in_flight: AtomicUsize,
    max_in_flight: AtomicUsize,
    pub calls: Arc<Mutex<Calls>>,
}

impl MockWorkItemApi {
    pub fn story(story_id: u64) -> Self {
        Self {
            story_id,
            parent_fields: PathFields::default(),
            parent_status: None,
            child_ids: Vec::new(),
            titles: HashMap::new(),
            unreachable: HashSet::new(),
            failing_titles: HashSet::new(),
            next_id: Mutex::new(1000),
            in_flight: AtomicUsize::new(0),
            max_in_flight: AtomicUsize::new(0),
            calls: Arc::new(Mutex::new(Calls::default())),
        }
    }

    pub fn with_child(mut self, id: &str, title: &str) -> Self {
        self.child_ids.push(id.to_string());
        self.titles.insert(id.to_string(), title.to_string());
        self
    }

    /// A child whose title fetch errors out.
    pub fn with_unreachable_child(mut self, id: &str) -> Self {
        self.child_ids.push(id.to_string());
        self.unreachable.insert(id.to_string());
        self
    }

    /// A child the service answers for without a title (e.g. a non-200).
    pub fn with_untitled_child(mut self, id: &str) -> Self {
        self.child_ids.push(id.to_string());
        self
    }

    pub fn with_parent_status(mut self, status: u16) -> Self {
        self.parent_status = Some(status);
        self
    }

    pub fn with_parent_paths(mut self, area: &str, iteration: &str) -> Self {
        self.parent_fields = PathFields {
            area_path: Some(area.to_string()),
            iteration_path: Some(iteration.to_string()),
        };
        self
    }

    pub fn failing_on(mut self, title: &str) -> Self {
        self.failing_titles.insert(title.to_string());
        self
    }

    pub fn created_titles(&self) -> Vec<String> {
        self.calls
            .lock()
            .unwrap()
            .creates
            .iter()
            .map(|r| r.title.clone())
            .collect()
    }

    /// Peak number of title fetches that were running at the same time.
    pub fn max_concurrent_title_fetches(&self) -> usize {
        self.max_in_flight.load(Ordering::SeqCst)
    }

    pub fn outbound_calls(&self) -> usize {
        let calls = self.calls.lock().unwrap();
        calls.parent_fetches.len() + calls.title_fetches.len() + calls.creates.len()
    }
}

#[async_trait]
impl WorkItemApi for MockWorkItemApi {
    async fn fetch_with_relations(&self, id: u64) -> Result<ParentWorkItem, ClientError> {
        self.calls.lock().unwrap().parent_fetches.push(id);

        if let Some(status) = self.parent_status {
            return Err(ClientError::FetchFailed {
                id: id.to_string(),
                status,
            });
        }
        if id != self.story_id {
            return Err(ClientError::FetchFailed {
                id: id.to_string(),
                status: 404,
            });
        }

        let relations = self
            .child_ids
            .iter()
            .map(|child| Relation {
                rel: FORWARD_HIERARCHY.to_string(),
                url: format!("https://dev.azure.com/acme/_apis/wit/workItems/{child}"),
            })
            .collect();

        Ok(ParentWorkItem {
            id,
            fields: self.parent_fields.clone(),
            relations,
        })
    }

    async fn fetch_title(&self, id: &str) -> Result<Option<String>, ClientError> {
        self.calls.lock().unwrap().title_fetches.push(id.to_string());

        let now = self.in_flight.fetch_add(1, Ordering::SeqCst) + 1;
        self.max_in_flight.fetch_max(now, Ordering::SeqCst);
        tokio::task::yield_now().await;
        self.in_flight.fetch_sub(1, Ordering::SeqCst);

        if self.unreachable.contains(id) {
            return Err(ClientError::Timeout {
                url: format!("mock://workitems/{id}"),
            });
        }
        Ok(self.titles.get(id).cloned().filter(|t| !t.is_empty()))
    }

    async fn create_task(&self, request: &TaskCreationRequest) -> Result<CreatedTask, ClientError> {
        self.calls.lock().unwrap().creates.push(request.clone());

        if self.failing_titles.contains(&request.title) {
            return Err(ClientError::CreateFailed {
                title: request.title.clone(),
                status: 400,
                body: "TF401320: Rule error".to_string(),
            });
        }

        let mut next = self.next_id.lock().unwrap();
        *next += 1;
        Ok(CreatedTask { id: Some(*next) })
    }
}
