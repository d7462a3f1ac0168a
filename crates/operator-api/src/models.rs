//! Request/response DTOs for the operator API

use serde::{Deserialize, Serialize};

use shared::Trigger;

/// Standard error response
#[derive(Debug, Serialize, Deserialize)]
pub struct ErrorResponse {
    pub error: String,
    pub message: String,
}

impl ErrorResponse {
    pub fn new(error: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            error: error.into(),
            message: message.into(),
        }
    }
}

/// Standard success response
#[derive(Debug, Serialize, Deserialize)]
pub struct SuccessResponse<T> {
    pub data: T,
}

impl<T> SuccessResponse<T> {
    pub fn new(data: T) -> Self {
        Self { data }
    }
}

/// Body of add/update requests. Both operations are an upsert; a request
/// without a trigger payload is rejected.
#[derive(Debug, Deserialize)]
pub struct SaveTriggerRequest {
    pub trigger: Option<Trigger>,
}

/// Response to a namespace listing
#[derive(Debug, Serialize, Deserialize)]
pub struct ListTriggersResponse {
    pub triggers: Vec<Trigger>,
}

/// Response to a trigger removal
#[derive(Debug, Serialize, Deserialize)]
pub struct RemoveTriggerResponse {
    pub success: bool,
}
