//! Error types for the resource adapter and their user-facing classification.
//!
//! # Design
//! Failure bodies come in two shapes: `{ "message": "text" }` for ordinary
//! errors and `{ "message": [{ "field": .., "message": .. }] }` for form
//! validation. The second shape becomes `ApiError::Validation` regardless of
//! status code so the edit modals can annotate fields instead of showing a
//! toast. `NotFound` keeps its own variant because screens distinguish a
//! missing record from a failing server.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::http::HttpResponse;

/// Shown when the server gave no usable message.
pub const GENERIC_FAILURE: &str = "Something went wrong. Please try again.";

/// One server-side validation failure.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FieldError {
    pub field: String,
    pub message: String,
}

/// Errors produced by `ResourceClient` parse methods or reported by the host.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ApiError {
    #[error("resource not found")]
    NotFound { message: Option<String> },

    #[error("validation failed on {} field(s)", .0.len())]
    Validation(Vec<FieldError>),

    #[error("HTTP {status}: {}", .message.as_deref().unwrap_or("<no message>"))]
    Server {
        status: u16,
        message: Option<String>,
    },

    /// The host could not complete the round trip at all.
    #[error("transport failed: {0}")]
    Transport(String),

    #[error("deserialization failed: {0}")]
    Deserialization(String),

    #[error("serialization failed: {0}")]
    Serialization(String),
}

/// Field name -> messages, ordered by field name.
pub type FieldErrors = BTreeMap<String, Vec<String>>;

/// How a failure should be surfaced to the user.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Feedback {
    /// Transient global notification.
    Notify(String),
    /// Annotations on the originating form.
    Fields(FieldErrors),
}

#[derive(Deserialize)]
#[serde(untagged)]
enum MessageBody {
    Text(String),
    Fields(Vec<FieldError>),
}

#[derive(Deserialize)]
struct ErrorBody {
    message: Option<MessageBody>,
}

impl ApiError {
    /// Classify a non-success response by status and body shape.
    pub fn from_response(response: &HttpResponse) -> Self {
        let message = serde_json::from_str::<ErrorBody>(&response.body)
            .ok()
            .and_then(|body| body.message);

        match (response.status, message) {
            (_, Some(MessageBody::Fields(fields))) if !fields.is_empty() => {
                ApiError::Validation(fields)
            }
            (404, Some(MessageBody::Text(text))) => ApiError::NotFound {
                message: non_blank(text),
            },
            (404, _) => ApiError::NotFound { message: None },
            (status, Some(MessageBody::Text(text))) => ApiError::Server {
                status,
                message: non_blank(text),
            },
            (status, _) => ApiError::Server {
                status,
                message: None,
            },
        }
    }

    pub fn feedback(&self) -> Feedback {
        match self {
            ApiError::Validation(fields) => {
                let mut grouped = FieldErrors::new();
                for error in fields {
                    grouped
                        .entry(error.field.clone())
                        .or_default()
                        .push(error.message.clone());
                }
                Feedback::Fields(grouped)
            }
            ApiError::NotFound { message: Some(m) }
            | ApiError::Server {
                message: Some(m), ..
            } => Feedback::Notify(m.clone()),
            _ => Feedback::Notify(GENERIC_FAILURE.to_string()),
        }
    }
}

fn non_blank(text: String) -> Option<String> {
    if text.trim().is_empty() {
        None
    } else {
        Some(text)
    }
}
