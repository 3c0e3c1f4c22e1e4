pub mod azure_devops;

use async_trait::async_trait;
use thiserror::Error;

use crate::model::work_item::{CreatedTask, ParentWorkItem, TaskCreationRequest};

#[derive(Debug, Error)]
pub enum ClientError {
    #[error("request to {url} timed out")]
    Timeout { url: String },
    #[error("request to {url} failed: {source}")]
    Transport {
        url: String,
        #[source]
        source: reqwest::Error,
    },
    #[error("fetching work item {id} returned HTTP {status}")]
    FetchFailed { id: String, status: u16 },
    #[error("creating task '{title}' returned HTTP {status}: {body}")]
    CreateFailed {
        title: String,
        status: u16,
        body: String,
    },
    #[error("unreadable response from {url}: {source}")]
    Decode {
        url: String,
        #[source]
        source: reqwest::Error,
    },
}

impl ClientError {
    pub(crate) fn from_reqwest(url: &str, err: reqwest::Error) -> Self {
        if err.is_timeout() {
            ClientError::Timeout {
                url: url.to_string(),
            }
        } else {
            ClientError::Transport {
                url: url.to_string(),
                source: err,
            }
        }
    }
}

/// Read/create access to the tracking service's work items.
#[async_trait]
pub trait WorkItemApi: Send + Sync {
    /// Fetch a work item with its relations. Any non-200 answer is `FetchFailed`.
    async fn fetch_with_relations(&self, id: u64) -> Result<ParentWorkItem, ClientError>;

    /// Fetch a single item's title. A non-200 answer yields `Ok(None)`.
    async fn fetch_title(&self, id: &str) -> Result<Option<String>, ClientError>;

    async fn create_task(&self, request: &TaskCreationRequest) -> Result<CreatedTask, ClientError>;
}

#[cfg(test)]
pub mod mock;
