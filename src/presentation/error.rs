use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use thiserror::Error;

#[derive(Error, Debug)]
pub enum ApiError {
    #[error("Missing or invalid identity header: {0}")]
    Unauthenticated(String),

    #[error("Unknown role: {0}")]
    UnknownRole(String),

    #[error("Role {viewer} may not view the {requested} dashboard")]
    Forbidden { viewer: String, requested: String },

    #[error("Internal error: {0:#}")]
    Internal(#[from] anyhow::Error),
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = match self {
            ApiError::Unauthenticated { .. } => StatusCode::UNAUTHORIZED,
            ApiError::UnknownRole { .. } => StatusCode::NOT_FOUND,
            ApiError::Forbidden { .. } => StatusCode::FORBIDDEN,
            ApiError::Internal { .. } => StatusCode::INTERNAL_SERVER_ERROR,
        };

        if status.is_server_error() {
            tracing::error!("{}", self);
        }

        (status, Json(serde_json::json!({ "error": self.to_string() }))).into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_status_mapping_and_body() {
        let response = ApiError::UnknownRole("JANITOR".to_string()).into_response();
        assert_eq!(response.status(), StatusCode::NOT_FOUND);

        let body = axum::body::to_bytes(response.into_body(), usize::MAX).await.unwrap();
        let json: serde_json::Value = serde_json::from_slice(&body).unwrap();
        assert_eq!(json["error"], "Unknown role: JANITOR");

        let forbidden = ApiError::Forbidden {
            viewer: "SALES".to_string(),
            requested: "FINANCE".to_string(),
        };
        assert_eq!(forbidden.into_response().status(), StatusCode::FORBIDDEN);

        let internal = ApiError::from(anyhow::anyhow!("pool timed out"));
        assert_eq!(internal.into_response().status(), StatusCode::INTERNAL_SERVER_ERROR);
    }
}
