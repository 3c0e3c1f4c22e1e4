use serde::{Deserialize, Serialize};
use serde_json::{json, Value};

pub const FORWARD_HIERARCHY: &str = "System.LinkTypes.Hierarchy-Forward";
pub const REVERSE_HIERARCHY: &str = "System.LinkTypes.Hierarchy-Reverse";

/// Story fetched with `$expand=relations`.
#[derive(Debug, Clone, Deserialize)]
pub struct ParentWorkItem {
    pub id: u64,
    #[serde(default)]
    pub fields: PathFields,
    #[serde(default)]
    pub relations: Vec<Relation>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct PathFields {
    #[serde(rename = "System.AreaPath")]
    pub area_path: Option<String>,
    #[serde(rename = "System.IterationPath")]
    pub iteration_path: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct Relation {
    pub rel: String,
    pub url: String,
}

impl Relation {
    pub fn is_forward_hierarchy(&self) -> bool {
        self.rel == FORWARD_HIERARCHY
    }

    /// Id of the related item: the last path segment of its reference URL.
    pub fn target_id(&self) -> Option<&str> {
        self.url
            .rsplit('/')
            .next()
            .map(str::trim)
            .filter(|id| !id.is_empty())
    }
}

impl ParentWorkItem {
    pub fn child_ids(&self) -> Vec<&str> {
        self.relations
            .iter()
            .filter(|r| r.is_forward_hierarchy())
            .filter_map(Relation::target_id)
            .collect()
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct ChildWorkItem {
    pub id: u64,
    #[serde(default)]
    pub fields: TitleFields,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct TitleFields {
    #[serde(rename = "System.Title")]
    pub title: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TaskCreationRequest {
    pub title: String,
    pub area_path: Option<String>,
    pub iteration_path: Option<String>,
    pub parent_id: u64,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PatchOperation {
    pub op: &'static str,
    pub path: &'static str,
    pub value: Value,
}

impl PatchOperation {
    fn add(path: &'static str, value: Value) -> Self {
        Self {
            op: "add",
            path,
            value,
        }
    }
}

impl TaskCreationRequest {
    /// Ordered JSON-patch body: field adds first, then the link back to the story.
    /// Unknown area/iteration paths are left out so the project defaults apply.
    pub fn patch_document(&self, parent_url: &str) -> Vec<PatchOperation> {
        let mut ops = vec![PatchOperation::add(
            "/fields/System.Title",
            json!(self.title),
        )];
        if let Some(area) = &self.area_path {
            ops.push(PatchOperation::add("/fields/System.AreaPath", json!(area)));
        }
        if let Some(iteration) = &self.iteration_path {
            ops.push(PatchOperation::add(
                "/fields/System.IterationPath",
                json!(iteration),
            ));
        }
        ops.push(PatchOperation::add(
            "/relations/-",
            json!({ "rel": REVERSE_HIERARCHY, "url": parent_url }),
        ));
        ops
    }
}

/// Response to a successful creation; the id is absent if the body was unreadable.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
pub struct CreatedTask {
    pub id: Option<u64>,
}
