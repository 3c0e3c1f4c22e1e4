use std::sync::Arc;

use crate::automation::TaskAutomation;

#[derive(Clone)]
pub struct AppState {
    pub automation: Arc<TaskAutomation>,
    pub function_key: Option<String>,
}

impl AppState {
    pub fn new(automation: TaskAutomation, function_key: Option<String>) -> Self {
        Self {
            automation: Arc::new(automation),
            function_key,
        }
    }
}
