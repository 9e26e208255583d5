//! Request-level error taxonomy and its HTTP rendering.

use std::collections::HashMap;

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::Serialize;
use thiserror::Error;
use tracing::error;

use crate::{catalog::CatalogError, messages::Messages, store::StoreError};

/// One failed boundary check; the text is resolved from the message catalog.
#[derive(Debug, Clone, PartialEq)]
pub struct FieldError {
    pub field: &'static str,
    pub key: &'static str,
    pub params: Vec<(&'static str, String)>,
}

impl FieldError {
    pub fn new(field: &'static str, key: &'static str) -> Self {
        Self {
            field,
            key,
            params: Vec::new(),
        }
    }

    pub fn with_param(mut self, name: &'static str, value: impl ToString) -> Self {
        self.params.push((name, value.to_string()));
        self
    }
}

#[derive(Debug, Error)]
pub enum AppError {
    #[error("validation failed")]
    Validation(Vec<FieldError>),

    #[error("no bearer token provided")]
    MissingToken,
    #[error("token has been revoked")]
    TokenRevoked,
    #[error("token is invalid or expired")]
    InvalidToken,
    #[error("invalid credentials")]
    InvalidCredentials,

    #[error("email already in use")]
    EmailInUse,
    #[error("movie already in favorites")]
    AlreadyFavorited,
    #[error("token already revoked")]
    AlreadyRevoked,

    #[error("user not found")]
    UserNotFound,
    #[error("movie not available")]
    MovieNotAvailable,

    #[error("catalog failure: {0}")]
    Upstream(#[from] CatalogError),
    #[error("storage failure: {0}")]
    Storage(#[from] StoreError),
    #[error("internal error: {0}")]
    Internal(String),
}

impl AppError {
    pub fn status(&self) -> StatusCode {
        match self {
            AppError::Validation(_) => StatusCode::BAD_REQUEST,
            AppError::MissingToken
            | AppError::TokenRevoked
            | AppError::InvalidToken
            | AppError::InvalidCredentials => StatusCode::UNAUTHORIZED,
            AppError::EmailInUse | AppError::AlreadyFavorited | AppError::AlreadyRevoked => {
                StatusCode::CONFLICT
            }
            AppError::UserNotFound | AppError::MovieNotAvailable => StatusCode::NOT_FOUND,
            AppError::Upstream(_) | AppError::Storage(_) | AppError::Internal(_) => {
                StatusCode::INTERNAL_SERVER_ERROR
            }
        }
    }

    pub fn message_key(&self) -> &'static str {
        match self {
            AppError::Validation(_) => "errors.validation.malformedBody",
            AppError::MissingToken => "errors.auth.noToken",
            AppError::TokenRevoked => "errors.auth.tokenBlacklisted",
            AppError::InvalidToken => "errors.auth.invalidToken",
            AppError::InvalidCredentials => "errors.auth.invalidCredentials",
            AppError::EmailInUse => "errors.auth.emailInUse",
            AppError::AlreadyFavorited => "errors.favorites.alreadyFavorited",
            AppError::AlreadyRevoked => "errors.auth.alreadyLoggedOut",
            AppError::UserNotFound => "errors.favorites.userNotFound",
            AppError::MovieNotAvailable => "errors.favorites.movieNotAvailable",
            AppError::Upstream(_) | AppError::Storage(_) | AppError::Internal(_) => {
                "errors.server.internal"
            }
        }
    }

    /// Resolves user-facing text. Unclassified faults are logged here with
    /// their detail; the response only carries the generic message.
    pub fn render(self, messages: &Messages) -> ApiError {
        let status = self.status();
        if status.is_server_error() {
            error!(error = %self, "request failed");
        }
        let errors = match &self {
            AppError::Validation(fields) => fields
                .iter()
                .map(|f| {
                    let params: HashMap<&str, String> = f.params.iter().cloned().collect();
                    FieldMessage {
                        field: f.field,
                        message: messages.get_with(f.key, &params),
                    }
                })
                .collect(),
            _ => Vec::new(),
        };
        let message = match errors.first() {
            Some(first) => first.message.clone(),
            None => messages.get(self.message_key()),
        };
        ApiError {
            status,
            body: ErrorBody { message, errors },
        }
    }
}

#[derive(Debug, Serialize)]
pub struct FieldMessage {
    pub field: &'static str,
    pub message: String,
}

#[derive(Debug, Serialize)]
pub struct ErrorBody {
    pub message: String,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub errors: Vec<FieldMessage>,
}

/// A rendered error, ready to go on the wire.
#[derive(Debug)]
pub struct ApiError {
    pub status: StatusCode,
    pub body: ErrorBody,
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        (self.status, Json(self.body)).into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn messages() -> Messages {
        Messages::from_value(json!({
            "errors": {
                "auth": {
                    "invalidCredentials": "Invalid credentials.",
                    "passwordMinLength": "Password must be at least {min} characters long."
                },
                "server": { "internal": "Internal server error" }
            }
        }))
    }

    #[test]
    fn storage_faults_do_not_leak_details() {
        let err = AppError::Storage(StoreError::Backend("relation \"users\" does not exist".into()));
        let api = err.render(&messages());
        assert_eq!(api.status, StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(api.body.message, "Internal server error");
        let json = serde_json::to_string(&api.body).unwrap();
        assert!(!json.contains("relation"));
    }

    #[test]
    fn validation_errors_list_every_field() {
        let err = AppError::Validation(vec![
            FieldError::new("password", "errors.auth.passwordMinLength").with_param("min", 8),
            FieldError::new("email", "errors.auth.invalidEmailFormat"),
        ]);
        let api = err.render(&messages());
        assert_eq!(api.status, StatusCode::BAD_REQUEST);
        assert_eq!(api.body.errors.len(), 2);
        assert_eq!(
            api.body.message,
            "Password must be at least 8 characters long."
        );
        assert_eq!(
            api.body.errors[1].message,
            "Message not found: errors.auth.invalidEmailFormat"
        );
    }

    #[test]
    fn auth_errors_are_unauthorized() {
        for e in [
            AppError::MissingToken,
            AppError::TokenRevoked,
            AppError::InvalidToken,
            AppError::InvalidCredentials,
        ] {
            assert_eq!(e.status(), StatusCode::UNAUTHORIZED);
        }
        assert_eq!(AppError::AlreadyRevoked.status(), StatusCode::CONFLICT);
        assert_eq!(AppError::MovieNotAvailable.status(), StatusCode::NOT_FOUND);
    }
}
