use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Error body returned by the backend on a non-success status.
///
/// The professors backend answers `{"detail": ...}`, the instructors backend
/// and the older user store answer `{"message": ...}`.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ErrorBody {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub detail: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
}

impl ErrorBody {
    pub fn parse(raw: &str) -> Option<Self> {
        serde_json::from_str::<Self>(raw)
            .ok()
            .filter(|body| body.summary().is_some())
    }

    pub fn summary(&self) -> Option<&str> {
        self.detail
            .as_deref()
            .or(self.message.as_deref())
            .map(str::trim)
            .filter(|s| !s.is_empty())
    }
}

#[derive(Debug, Error, PartialEq, Eq)]
#[error("unknown api layout '{0}' (expected 'professors' or 'instructors')")]
pub struct UnknownLayout(pub String);
