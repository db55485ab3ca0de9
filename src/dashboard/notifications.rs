use chrono::{DateTime, Utc};
use serde::Serialize;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, strum::Display)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase")]
pub enum Severity {
    Success,
    Error,
}

/// A message for the user, e.g. a toast after a submit.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Notification {
    pub severity: Severity,
    pub title: String,
    pub description: String,
    pub created_at: DateTime<Utc>,
}

impl Notification {
    pub fn success(description: impl Into<String>) -> Self {
        Self::new(Severity::Success, "Éxito", description)
    }

    pub fn error(description: impl Into<String>) -> Self {
        Self::new(Severity::Error, "Error", description)
    }

    fn new(severity: Severity, title: &str, description: impl Into<String>) -> Self {
        Self {
            severity,
            title: title.to_string(),
            description: description.into(),
            created_at: Utc::now(),
        }
    }

    pub fn is_error(&self) -> bool {
        self.severity == Severity::Error
    }
}
