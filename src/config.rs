use anyhow::{Context, Result};
use std::fmt;

use crate::automation::AutomationError;

pub const DEFAULT_BASE_URL: &str = "https://dev.azure.com";
pub const DEFAULT_PORT: u16 = 7071;

/// Settings read once at startup. The Azure DevOps values stay optional here so a
/// misconfigured deployment still answers webhooks (with 400) instead of failing to boot.
#[derive(Debug, Clone)]
pub struct AppConfig {
    pub organization: Option<String>,
    pub project: Option<String>,
    pub pat: Option<String>,
    pub api_version: Option<String>,
    pub base_url: String,
    pub function_key: Option<String>,
    pub port: u16,
}

/// Everything needed to talk to the work-item API.
#[derive(Clone, PartialEq, Eq)]
pub struct AdoConfig {
    pub organization: String,
    pub project: String,
    pub pat: String,
    pub api_version: String,
    pub base_url: String,
}

impl fmt::Debug for AdoConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("AdoConfig")
            .field("organization", &self.organization)
            .field("project", &self.project)
            .field("pat", &"<redacted>")
            .field("api_version", &self.api_version)
            .field("base_url", &self.base_url)
            .finish()
    }
}

impl AppConfig {
    pub fn from_lookup<F>(lookup: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let var = |key: &str| lookup(key).map(|v| v.trim().to_string()).filter(|v| !v.is_empty());

        let port = match var("FUNCTIONS_CUSTOMHANDLER_PORT").or_else(|| var("PORT")) {
            Some(raw) => raw
                .parse()
                .with_context(|| format!("Invalid listen port: {raw}"))?,
            None => DEFAULT_PORT,
        };

        Ok(Self {
            organization: var("ADO_ORG"),
            project: var("ADO_PROJECT"),
            pat: var("ADO_PAT"),
            api_version: var("API_VERSION"),
            base_url: var("ADO_BASE_URL")
                .map(|u| u.trim_end_matches('/').to_string())
                .unwrap_or_else(|| DEFAULT_BASE_URL.to_string()),
            function_key: var("FUNCTION_KEY"),
            port,
        })
    }

    /// Names of the required Azure DevOps settings that are not set.
    pub fn missing(&self) -> Vec<&'static str> {
        [
            ("ADO_ORG", &self.organization),
            ("ADO_PROJECT", &self.project),
            ("ADO_PAT", &self.pat),
            ("API_VERSION", &self.api_version),
        ]
        .into_iter()
        .filter(|(_, v)| v.is_none())
        .map(|(k, _)| k)
        .collect()
    }

    pub fn ado(&self) -> Result<AdoConfig, AutomationError> {
        match (
            &self.organization,
            &self.project,
            &self.pat,
            &self.api_version,
        ) {
            (Some(organization), Some(project), Some(pat), Some(api_version)) => Ok(AdoConfig {
                organization: organization.clone(),
                project: project.clone(),
                pat: pat.clone(),
                api_version: api_version.clone(),
                base_url: self.base_url.clone(),
            }),
            _ => Err(AutomationError::MissingConfiguration(
                self.missing().join(", "),
            )),
        }
    }
}

pub fn load_config() -> Result<AppConfig> {
    AppConfig::from_lookup(|key| std::env::var(key).ok())
}
