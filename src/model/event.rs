use serde::Deserialize;
use serde_json::{Map, Value};

pub const USER_STORY: &str = "User Story";

pub const WORK_ITEM_TYPE: &str = "System.WorkItemType";
pub const AREA_PATH: &str = "System.AreaPath";
pub const ITERATION_PATH: &str = "System.IterationPath";

/// Service-hook notification for a work item.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WorkItemEvent {
    pub event_type: Option<String>,
    pub resource: Option<Resource>,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Resource {
    pub id: Option<Value>,
    /// Present on update events, where `id` is the update number.
    pub work_item_id: Option<Value>,
    pub fields: Option<Map<String, Value>>,
    pub revision: Option<Revision>,
}

/// Full snapshot attached to update events.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct Revision {
    pub fields: Option<Map<String, Value>>,
}

/// A field as it appears in an event: a plain value, or an old/new pair on updates.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FieldValue {
    Plain(String),
    Delta {
        old: Option<String>,
        new: Option<String>,
    },
}

impl FieldValue {
    pub fn parse(value: &Value) -> Option<Self> {
        match value {
            Value::String(s) => Some(FieldValue::Plain(s.clone())),
            Value::Object(obj) if obj.contains_key("newValue") || obj.contains_key("oldValue") => {
                let text = |key: &str| obj.get(key).and_then(Value::as_str).map(String::from);
                Some(FieldValue::Delta {
                    old: text("oldValue"),
                    new: text("newValue"),
                })
            }
            _ => None,
        }
    }

    pub fn current(&self) -> Option<&str> {
        match self {
            FieldValue::Plain(s) => Some(s),
            FieldValue::Delta { new, .. } => new.as_deref(),
        }
    }

    /// Value before the update; only deltas carry one.
    pub fn previous(&self) -> Option<&str> {
        match self {
            FieldValue::Plain(_) => None,
            FieldValue::Delta { old, .. } => old.as_deref(),
        }
    }

    pub fn into_current(self) -> Option<String> {
        match self {
            FieldValue::Plain(s) => Some(s),
            FieldValue::Delta { new, .. } => new,
        }
    }
}

/// What downstream processing needs from a relevant story event.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct StoryContext {
    pub story_id: Option<u64>,
    pub area_path: Option<String>,
    pub iteration_path: Option<String>,
}

impl Resource {
    /// Looks the field up in the changed fields first, then in the revision snapshot.
    pub fn field(&self, name: &str) -> Option<FieldValue> {
        let changed = self.fields.as_ref().and_then(|f| f.get(name));
        let snapshot = || {
            self.revision
                .as_ref()
                .and_then(|r| r.fields.as_ref())
                .and_then(|f| f.get(name))
        };
        changed.or_else(snapshot).and_then(FieldValue::parse)
    }

    pub fn story_id(&self) -> Option<u64> {
        self.work_item_id
            .as_ref()
            .and_then(parse_id)
            .or_else(|| self.id.as_ref().and_then(parse_id))
    }
}

/// Work item ids start at 1; zero counts as absent.
fn parse_id(value: &Value) -> Option<u64> {
    let id = match value {
        Value::Number(n) => n.as_u64(),
        Value::String(s) => s.trim().parse().ok(),
        _ => None,
    };
    id.filter(|id| *id != 0)
}
