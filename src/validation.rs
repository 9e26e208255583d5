//! Boundary checks run before any core operation sees a request.

use axum::{
    async_trait,
    extract::{FromRequest, Request},
    Json,
};
use lazy_static::lazy_static;
use regex::Regex;
use serde::de::DeserializeOwned;
use serde_json::Value;
use tracing::debug;

use crate::{
    auth::{credentials::Registration, LoginRequest, RegisterRequest},
    error::{ApiError, AppError, FieldError},
    state::AppState,
};

pub const PASSWORD_MIN_LEN: usize = 8;

pub fn is_valid_email(email: &str) -> bool {
    lazy_static! {
        static ref EMAIL_RE: Regex = Regex::new(r"^[^@\s]+@[^@\s]+\.[^@\s]+$").unwrap();
    }
    EMAIL_RE.is_match(email)
}

/// HTML-escapes free text that ends up echoed back to clients.
pub fn escape_html(raw: &str) -> String {
    let mut out = String::with_capacity(raw.len());
    for c in raw.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&#x27;"),
            '/' => out.push_str("&#x2F;"),
            '\\' => out.push_str("&#x5C;"),
            '`' => out.push_str("&#96;"),
            _ => out.push(c),
        }
    }
    out
}

fn password_errors(password: &str) -> Vec<FieldError> {
    let mut errors = Vec::new();
    if password.chars().count() < PASSWORD_MIN_LEN {
        errors.push(
            FieldError::new("password", "errors.auth.passwordMinLength")
                .with_param("min", PASSWORD_MIN_LEN),
        );
    }
    if !password.chars().any(|c| c.is_ascii_lowercase()) {
        errors.push(FieldError::new("password", "errors.auth.passwordLowercase"));
    }
    if !password.chars().any(|c| c.is_ascii_uppercase()) {
        errors.push(FieldError::new("password", "errors.auth.passwordUppercase"));
    }
    if !password.chars().any(|c| c.is_ascii_digit()) {
        errors.push(FieldError::new("password", "errors.auth.passwordNumber"));
    }
    if !password.chars().any(|c| !c.is_ascii_alphanumeric()) {
        errors.push(FieldError::new("password", "errors.auth.passwordSpecialChar"));
    }
    errors
}

pub fn check_registration(req: RegisterRequest) -> Result<Registration, AppError> {
    let mut errors = Vec::new();
    if !is_valid_email(&req.email) {
        errors.push(FieldError::new("email", "errors.auth.invalidEmailFormat"));
    }
    let first_name = req.first_name.trim();
    if first_name.is_empty() {
        errors.push(FieldError::new("firstName", "errors.auth.firstNameRequired"));
    }
    let last_name = req.last_name.trim();
    if last_name.is_empty() {
        errors.push(FieldError::new("lastName", "errors.auth.lastNameRequired"));
    }
    errors.extend(password_errors(&req.password));
    if !errors.is_empty() {
        return Err(AppError::Validation(errors));
    }
    Ok(Registration {
        first_name: escape_html(first_name),
        last_name: escape_html(last_name),
        email: req.email,
        password: req.password,
    })
}

pub fn check_login(req: &LoginRequest) -> Result<(), AppError> {
    let mut errors = Vec::new();
    if !is_valid_email(&req.email) {
        errors.push(FieldError::new("email", "errors.auth.invalidEmailFormat"));
    }
    if req.password.is_empty() {
        errors.push(FieldError::new("password", "errors.auth.passwordRequired"));
    }
    if errors.is_empty() {
        Ok(())
    } else {
        Err(AppError::Validation(errors))
    }
}

/// Accepts a positive integer given as a JSON number or a numeric string.
pub fn check_movie_id(raw: &Value) -> Result<i64, AppError> {
    let id = match raw {
        Value::Number(n) => n.as_i64(),
        Value::String(s) => s.trim().parse::<i64>().ok(),
        _ => None,
    };
    match id {
        Some(id) if id > 0 => Ok(id),
        _ => Err(AppError::Validation(vec![FieldError::new(
            "movieId",
            "errors.auth.invalidMovieId",
        )])),
    }
}

/// Blank keywords mean "no keyword".
pub fn normalize_search(raw: Option<String>) -> Option<String> {
    raw.map(|s| s.trim().to_string()).filter(|s| !s.is_empty())
}

/// `Json<T>` whose rejection is rendered through the message catalog.
pub struct JsonBody<T>(pub T);

#[async_trait]
impl<T> FromRequest<AppState> for JsonBody<T>
where
    T: DeserializeOwned + Send,
{
    type Rejection = ApiError;

    async fn from_request(req: Request, state: &AppState) -> Result<Self, Self::Rejection> {
        match Json::<T>::from_request(req, state).await {
            Ok(Json(value)) => Ok(Self(value)),
            Err(rejection) => {
                debug!(error = %rejection, "request body rejected");
                Err(state.reject(AppError::Validation(vec![FieldError::new(
                    "body",
                    "errors.validation.malformedBody",
                )])))
            }
        }
    }
}
