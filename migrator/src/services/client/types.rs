use serde::{Deserialize, Serialize};
use std::fmt;

/// HTTP verbs used against the platform API
#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[serde(rename_all = "UPPERCASE")]
pub enum HttpMethod {
    Get,
    Post,
    Put,
    Patch,
    Delete,
}

impl HttpMethod {
    pub fn as_str(&self) -> &'static str {
        match self {
            HttpMethod::Get => "GET",
            HttpMethod::Post => "POST",
            HttpMethod::Put => "PUT",
            HttpMethod::Patch => "PATCH",
            HttpMethod::Delete => "DELETE",
        }
    }

    /// Anything but GET changes platform state
    pub fn is_mutation(&self) -> bool {
        !matches!(self, HttpMethod::Get)
    }
}

impl fmt::Display for HttpMethod {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl From<HttpMethod> for reqwest::Method {
    fn from(method: HttpMethod) -> Self {
        match method {
            HttpMethod::Get => reqwest::Method::GET,
            HttpMethod::Post => reqwest::Method::POST,
            HttpMethod::Put => reqwest::Method::PUT,
            HttpMethod::Patch => reqwest::Method::PATCH,
            HttpMethod::Delete => reqwest::Method::DELETE,
        }
    }
}

/// Request payload. Most calls carry JSON; dataset appends upload CSV text.
#[derive(Debug, Clone, PartialEq)]
pub enum RequestBody {
    Json(serde_json::Value),
    Csv(String),
}

impl RequestBody {
    pub fn content_type(&self) -> &'static str {
        match self {
            RequestBody::Json(_) => "application/json",
            RequestBody::Csv(_) => "text/csv",
        }
    }

    pub fn as_json(&self) -> Option<&serde_json::Value> {
        match self {
            RequestBody::Json(value) => Some(value),
            RequestBody::Csv(_) => None,
        }
    }

    pub fn as_csv(&self) -> Option<&str> {
        match self {
            RequestBody::Csv(text) => Some(text),
            RequestBody::Json(_) => None,
        }
    }
}

/// Credentials attached to every platform request
#[derive(Debug, Clone)]
pub enum ClientCredentials {
    /// Long-lived developer access token
    DeveloperToken(String),
    /// Session token obtained from an interactive login
    SessionToken(String),
}

impl ClientCredentials {
    pub(crate) fn header(&self) -> (&'static str, &str) {
        match self {
            ClientCredentials::DeveloperToken(token) => ("X-DOMO-Developer-Token", token),
            ClientCredentials::SessionToken(token) => ("X-Domo-Authentication", token),
        }
    }
}
