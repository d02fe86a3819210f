use crate::response::Envelope;
use actix_web::http::StatusCode;
use actix_web::{HttpResponse, ResponseError};
use std::time::Duration;

pub type Result<T> = std::result::Result<T, AccountError>;

/// Failures raised by the document store adapters
#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    #[error("Database error: {0}")]
    Database(String),

    #[error("Store call timed out after {0:?}")]
    Timeout(Duration),

    #[error("Stored document could not be decoded: {0}")]
    Corrupt(String),

    #[error("Field '{0}' cannot be modified")]
    ImmutableField(String),

    #[error("No document matched the {0}")]
    NotFound(&'static str),
}

impl From<sqlx::Error> for StoreError {
    fn from(err: sqlx::Error) -> Self {
        StoreError::Database(err.to_string())
    }
}

impl From<serde_json::Error> for StoreError {
    fn from(err: serde_json::Error) -> Self {
        StoreError::Corrupt(err.to_string())
    }
}

/// Everything that can end an account request early
///
/// Each variant corresponds to one call site, so the status code and the
/// client-facing message are fixed per variant while the payload carries the
/// detail that ends up in `errorData`.
#[derive(Debug, thiserror::Error)]
pub enum AccountError {
    #[error("bad request format: {0}")]
    BadRequestFormat(String),

    #[error("JSON format is incorrect: {0}")]
    InvalidJson(String),

    #[error("validation failed: {0}")]
    Validation(String),

    #[error("no file was uploaded")]
    MissingFile,

    #[error("file upload failed: {0}")]
    FileSave(String),

    #[error("password hashing failed: {0}")]
    Hashing(String),

    #[error("failed to create user: {0}")]
    CreateFailed(#[source] StoreError),

    #[error("user lookup failed: {0}")]
    LookupFailed(#[source] StoreError),

    #[error("listing users failed: {0}")]
    ListFailed(#[source] StoreError),

    #[error("incorrect password")]
    IncorrectPassword,

    #[error("token generation failed: {0}")]
    TokenIssue(String),

    #[error("user update failed: {0}")]
    UpdateFailed(#[source] StoreError),

    #[error("failed to delete user: {0}")]
    DeleteFailed(#[source] StoreError),

    #[error("user not found")]
    UserNotFound,
}

impl AccountError {
    pub fn status(&self) -> StatusCode {
        match self {
            AccountError::BadRequestFormat(_)
            | AccountError::InvalidJson(_)
            | AccountError::Validation(_)
            | AccountError::MissingFile
            | AccountError::FileSave(_)
            | AccountError::IncorrectPassword
            | AccountError::UpdateFailed(_) => StatusCode::BAD_REQUEST,
            AccountError::UserNotFound => StatusCode::NOT_FOUND,
            AccountError::Hashing(_)
            | AccountError::CreateFailed(_)
            | AccountError::LookupFailed(_)
            | AccountError::ListFailed(_)
            | AccountError::TokenIssue(_)
            | AccountError::DeleteFailed(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    /// Fixed message shown to clients
    pub fn message(&self) -> &'static str {
        match self {
            AccountError::BadRequestFormat(_) => "bad request format",
            AccountError::InvalidJson(_) => "JSON format is incorrect",
            AccountError::Validation(_) => "Required user fields validation failed",
            AccountError::MissingFile => "error occurred while reading form file",
            AccountError::FileSave(_) => "error occurred while uploading file",
            AccountError::Hashing(_) => "error occurred while securing password",
            AccountError::CreateFailed(_) => "failed to create user",
            AccountError::LookupFailed(_) => "An error occurred while getting user",
            AccountError::ListFailed(_) => "error occurred while getting users from database",
            AccountError::IncorrectPassword => "incorrect password",
            AccountError::TokenIssue(_) => "error occurred while generating token",
            AccountError::UpdateFailed(_) => "user update failed",
            AccountError::DeleteFailed(_) => "failed to delete user",
            AccountError::UserNotFound => "user with specified id not found",
        }
    }

    /// Underlying detail, if the failure has one worth reporting
    pub fn detail(&self) -> Option<String> {
        match self {
            AccountError::BadRequestFormat(detail)
            | AccountError::InvalidJson(detail)
            | AccountError::Validation(detail)
            | AccountError::FileSave(detail)
            | AccountError::Hashing(detail)
            | AccountError::TokenIssue(detail) => Some(detail.clone()),
            AccountError::CreateFailed(err)
            | AccountError::LookupFailed(err)
            | AccountError::ListFailed(err)
            | AccountError::UpdateFailed(err)
            | AccountError::DeleteFailed(err) => Some(err.to_string()),
            AccountError::IncorrectPassword => Some("password does not match".to_string()),
            AccountError::MissingFile | AccountError::UserNotFound => None,
        }
    }

    /// Render the error envelope, optionally without the detail
    pub fn to_envelope(&self, expose_details: bool) -> Envelope {
        let envelope = Envelope::failure(self.status(), self.message());
        match self.detail() {
            Some(detail) if expose_details => envelope.with_error_detail(detail),
            _ => envelope,
        }
    }

    /// Log at a level matching the status class
    pub fn log(&self) {
        let status = self.status().as_u16();
        if self.status().is_server_error() {
            tracing::error!(status, error = %self, "request failed");
        } else {
            tracing::warn!(status, error = %self, "request rejected");
        }
    }
}

/// An `AccountError` paired with the detail-exposure policy of the running
/// service, ready to be turned into an HTTP response.
#[derive(Debug, thiserror::Error)]
#[error("{error}")]
pub struct ApiError {
    pub error: AccountError,
    pub expose_details: bool,
}

impl ApiError {
    pub fn new(error: AccountError, expose_details: bool) -> Self {
        error.log();
        Self {
            error,
            expose_details,
        }
    }
}

impl ResponseError for ApiError {
    fn status_code(&self) -> StatusCode {
        self.error.status()
    }

    fn error_response(&self) -> HttpResponse {
        self.error.to_envelope(self.expose_details).into_response()
    }
}
