use serde::{Deserialize, Serialize};

/// JSON envelope shared by every portal endpoint.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
pub struct ApiResponse<T> {
    pub success: bool,
    #[serde(default)]
    pub message: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub data: Option<T>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl<T> ApiResponse<T> {
    pub fn ok(message: impl Into<String>, data: T) -> Self {
        Self { success: true, message: message.into(), data: Some(data), error: None }
    }

    pub fn message(message: impl Into<String>) -> Self {
        Self { success: true, message: message.into(), data: None, error: None }
    }

    pub fn error(error: impl Into<String>) -> Self {
        Self { success: false, message: String::new(), data: None, error: Some(error.into()) }
    }
}
