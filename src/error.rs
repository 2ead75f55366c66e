use serde_json::Value;
use thiserror::Error;

/// Everything that can go wrong between a keypress and a rendered reply.
///
/// Views never inspect the variant; they keep the `Display` string and show it.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum ApiError {
    #[error("{0}")]
    Network(String),
    #[error("{}", status_text(.status, .message))]
    Status { status: u16, message: Option<String> },
    #[error("{0}")]
    Shape(String),
}

fn status_text(status: &u16, message: &Option<String>) -> String {
    match message {
        Some(m) => m.clone(),
        None => format!("HTTP error! status: {status}"),
    }
}

impl ApiError {
    pub fn is_not_found(&self) -> bool {
        matches!(self, ApiError::Status { status: 404, .. })
    }

    /// The server's own message if there was one, otherwise `fallback`.
    ///
    /// Used by the create/login/register flows, which prefer a fixed phrase
    /// over the bare status line.
    pub fn message_or(&self, fallback: &str) -> String {
        match self {
            ApiError::Status { message: None, .. } => fallback.to_string(),
            other => other.to_string(),
        }
    }
}

impl From<reqwest::Error> for ApiError {
    fn from(err: reqwest::Error) -> Self {
        if err.is_decode() {
            ApiError::Shape(err.to_string())
        } else {
            ApiError::Network(err.to_string())
        }
    }
}

/// Pulls a human message out of an error body. The backend is not consistent
/// about the field name.
pub fn server_message(body: &Value) -> Option<String> {
    ["message", "error", "detail", "status"]
        .iter()
        .filter_map(|key| body.get(*key))
        .find_map(|v| v.as_str().map(str::to_string))
        .filter(|s| !s.is_empty())
}
