use std::time::Duration;

use async_trait::async_trait;
use base64::Engine;
use reqwest::StatusCode;
use tracing::{debug, warn};

use super::{ClientError, WorkItemApi};
use crate::config::AdoConfig;
use crate::model::work_item::{
    ChildWorkItem, CreatedTask, ParentWorkItem, TaskCreationRequest,
};

const PARENT_TIMEOUT: Duration = Duration::from_secs(15);
const CHILD_TIMEOUT: Duration = Duration::from_secs(10);
const CREATE_TIMEOUT: Duration = Duration::from_secs(15);

const JSON_PATCH: &str = "application/json-patch+json";

pub struct AzureDevOpsClient {
    config: AdoConfig,
    auth_header: String,
    client: reqwest::Client,
}

/// Basic auth with an empty user name and the personal access token as password.
pub fn basic_auth_header(pat: &str) -> String {
    let encoded = base64::engine::general_purpose::STANDARD.encode(format!(":{pat}"));
    format!("Basic {encoded}")
}

impl AzureDevOpsClient {
    pub fn new(config: AdoConfig) -> Self {
        Self {
            auth_header: basic_auth_header(&config.pat),
            config,
            client: reqwest::Client::new(),
        }
    }

    fn org_url(&self) -> String {
        format!(
            "{}/{}",
            self.config.base_url,
            urlencoding::encode(&self.config.organization)
        )
    }

    pub fn work_item_url(&self, id: &str) -> String {
        format!("{}/_apis/wit/workitems/{id}", self.org_url())
    }

    /// Reference stored on a task's reverse-hierarchy relation.
    pub fn parent_link(&self, parent_id: u64) -> String {
        format!("{}/_apis/wit/workItems/{parent_id}", self.org_url())
    }

    pub fn create_task_url(&self) -> String {
        format!(
            "{}/{}/_apis/wit/workitems/$Task",
            self.org_url(),
            urlencoding::encode(&self.config.project)
        )
    }

    async fn get(
        &self,
        url: &str,
        expand_relations: bool,
        timeout: Duration,
    ) -> Result<reqwest::Response, ClientError> {
        let mut req = self
            .client
            .get(url)
            .header("Authorization", &self.auth_header)
            .header("Accept", "application/json")
            .query(&[("api-version", self.config.api_version.as_str())])
            .timeout(timeout);
        if expand_relations {
            req = req.query(&[("$expand", "relations")]);
        }
        req.send()
            .await
            .map_err(|e| ClientError::from_reqwest(url, e))
    }
}

#[async_trait]
impl WorkItemApi for AzureDevOpsClient {
    async fn fetch_with_relations(&self, id: u64) -> Result<ParentWorkItem, ClientError> {
        let url = self.work_item_url(&id.to_string());
        let resp = self.get(&url, true, PARENT_TIMEOUT).await?;

        if resp.status() != StatusCode::OK {
            return Err(ClientError::FetchFailed {
                id: id.to_string(),
                status: resp.status().as_u16(),
            });
        }

        resp.json()
            .await
            .map_err(|e| ClientError::Decode { url, source: e })
    }

    async fn fetch_title(&self, id: &str) -> Result<Option<String>, ClientError> {
        let url = self.work_item_url(id);
        let resp = self.get(&url, false, CHILD_TIMEOUT).await?;

        if resp.status() != StatusCode::OK {
            warn!(child_id = %id, status = resp.status().as_u16(), "Child work item fetch failed");
            return Ok(None);
        }

        let child: ChildWorkItem = resp
            .json()
            .await
            .map_err(|e| ClientError::Decode { url, source: e })?;
        debug!(child_id = child.id, title = ?child.fields.title, "Fetched child work item");
        Ok(child.fields.title.filter(|t| !t.is_empty()))
    }

    async fn create_task(&self, request: &TaskCreationRequest) -> Result<CreatedTask, ClientError> {
        let url = self.create_task_url();
        let body = request.patch_document(&self.parent_link(request.parent_id));

        let resp = self
            .client
            .post(&url)
            .header("Authorization", &self.auth_header)
            .header("Content-Type", JSON_PATCH)
            .query(&[("api-version", self.config.api_version.as_str())])
            .timeout(CREATE_TIMEOUT)
            .json(&body)
            .send()
            .await
            .map_err(|e| ClientError::from_reqwest(&url, e))?;

        let status = resp.status();
        let text = match resp.text().await {
            Ok(text) => text,
            Err(e) => {
                warn!(title = %request.title, status = status.as_u16(), error = %e, "Could not read create response body");
                String::new()
            }
        };

        if !status.is_success() {
            return Err(ClientError::CreateFailed {
                title: request.title.clone(),
                status: status.as_u16(),
                body: text,
            });
        }

        Ok(serde_json::from_str(&text).unwrap_or_else(|e| {
            warn!(title = %request.title, error = %e, "Task created but response had no readable id");
            CreatedTask::default()
        }))
    }
}
