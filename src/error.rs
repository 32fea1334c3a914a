//! Registration error taxonomy and its HTTP mapping.
//!
//! Only two failures are distinguishable to the caller: missing form data
//! (400) and a duplicate roll number (409). Everything else collapses to a
//! generic 500; the failing step is logged internally.

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::json;
use thiserror::Error;
use tracing::error;

use crate::{asset::AssetError, record::StoreError, ticket::RenderError};

#[derive(Debug, Error)]
pub enum RegisterError {
    #[error("missing form data")]
    MissingFormData,
    #[error("roll number '{0}' already exists")]
    DuplicateRollNo(String),
    #[error("record store: {0}")]
    Store(#[from] StoreError),
    #[error("asset store: {0}")]
    Asset(#[from] AssetError),
    #[error("ticket render: {0}")]
    Render(#[from] RenderError),
}

impl RegisterError {
    /// Workflow step name, for internal logs only.
    fn step(&self) -> &'static str {
        match self {
            RegisterError::MissingFormData => "validate",
            RegisterError::DuplicateRollNo(_) => "duplicate-check",
            RegisterError::Store(_) => "record-store",
            RegisterError::Asset(_) => "asset-store",
            RegisterError::Render(_) => "ticket-render",
        }
    }
}

impl IntoResponse for RegisterError {
    fn into_response(self) -> Response {
        match &self {
            RegisterError::MissingFormData => (
                StatusCode::BAD_REQUEST,
                Json(json!({"error": "Missing form data."})),
            )
                .into_response(),
            RegisterError::DuplicateRollNo(roll_no) => (
                StatusCode::CONFLICT,
                Json(json!({"error": format!("Roll Number '{roll_no}' already exists.")})),
            )
                .into_response(),
            _ => {
                error!(step = self.step(), error = %self, "registration failed");
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    Json(json!({"error": "An unexpected server error occurred."})),
                )
                    .into_response()
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use axum::body::to_bytes;

    use super::*;

    async fn status_and_body(err: RegisterError) -> (StatusCode, serde_json::Value) {
        let resp = err.into_response();
        let status = resp.status();
        let bytes = to_bytes(resp.into_body(), usize::MAX).await.unwrap();
        (status, serde_json::from_slice(&bytes).unwrap())
    }

    #[tokio::test]
    async fn missing_form_data_is_400_with_exact_body() {
        let (status, body) = status_and_body(RegisterError::MissingFormData).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body, json!({"error": "Missing form data."}));
    }

    #[tokio::test]
    async fn duplicate_roll_no_is_409_naming_the_roll_no() {
        let (status, body) =
            status_and_body(RegisterError::DuplicateRollNo("21-001".to_string())).await;
        assert_eq!(status, StatusCode::CONFLICT);
        assert_eq!(body, json!({"error": "Roll Number '21-001' already exists."}));
    }

    #[tokio::test]
    async fn everything_else_is_a_generic_500() {
        let failures = [
            RegisterError::Asset(AssetError::InvalidKey("../x".to_string())),
            RegisterError::Render(crate::ticket::RenderError::FontParse("x.ttf".to_string())),
            RegisterError::Store(StoreError::StudentIdExists {
                student_id: "STU-AAAA1111".to_string(),
            }),
        ];
        for err in failures {
            let (status, body) = status_and_body(err).await;
            assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
            assert_eq!(body, json!({"error": "An unexpected server error occurred."}));
        }
    }
}
