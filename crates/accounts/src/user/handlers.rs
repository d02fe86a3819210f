use crate::error::{AccountError, ApiError};
use crate::response::Envelope;
use crate::uploads::UploadedFile;
use crate::user::model::{LoginRequest, UpdateUserRequest};
use crate::user::service::{AccountService, SignupSubmission};
use actix_multipart::Multipart;
use actix_web::http::StatusCode;
use actix_web::{delete, get, post, put, web, HttpResponse};
use futures_util::StreamExt;

/// Form field that carries the profile image
const FILE_FIELD: &str = "file";

/// Size cap for a single text part of the signup form
const TEXT_FIELD_MAX_BYTES: usize = 64 * 1024;

/// Shared state for the account handlers
pub struct AccountState {
    pub service: AccountService,
    pub expose_error_details: bool,
}

impl AccountState {
    pub fn new(service: AccountService, expose_error_details: bool) -> Self {
        Self {
            service,
            expose_error_details,
        }
    }

    /// Log the failure and pair it with this service's detail policy
    pub fn reject(&self, error: AccountError) -> ApiError {
        ApiError::new(error, self.expose_error_details)
    }
}

/// Register the account routes together with their shared state and a JSON
/// extractor config that reports malformed bodies in the envelope format.
pub fn configure(state: web::Data<AccountState>) -> impl FnOnce(&mut web::ServiceConfig) {
    move |cfg| {
        let expose_details = state.expose_error_details;
        let json_config = web::JsonConfig::default().error_handler(move |err, _req| {
            ApiError::new(AccountError::InvalidJson(err.to_string()), expose_details).into()
        });

        cfg.app_data(state)
            .app_data(json_config)
            .service(signup)
            .service(login)
            .service(get_users)
            .service(get_user)
            .service(update_user)
            .service(remove_user);
    }
}

#[post("/api/v1/signup")]
pub async fn signup(
    payload: Multipart,
    state: web::Data<AccountState>,
) -> Result<HttpResponse, ApiError> {
    let max_bytes = state.service.uploads().max_bytes();
    let submission = read_signup_submission(payload, max_bytes)
        .await
        .map_err(|e| state.reject(e))?;

    let id = state
        .service
        .signup(submission)
        .await
        .map_err(|e| state.reject(e))?;

    Ok(
        Envelope::success(StatusCode::CREATED, "user created successfully")
            .with_data("data", serde_json::json!({ "insertedId": id }))
            .into_response(),
    )
}

#[get("/api/v1/login")]
pub async fn login(
    body: web::Json<LoginRequest>,
    state: web::Data<AccountState>,
) -> Result<HttpResponse, ApiError> {
    let token = state
        .service
        .login(body.into_inner())
        .await
        .map_err(|e| state.reject(e))?;

    Ok(Envelope::success(StatusCode::OK, "token generated successfully")
        .with_data("token", token)
        .into_response())
}

#[get("/api/v1/users")]
pub async fn get_users(state: web::Data<AccountState>) -> Result<HttpResponse, ApiError> {
    let users = state
        .service
        .get_users()
        .await
        .map_err(|e| state.reject(e))?;

    Ok(Envelope::success(StatusCode::OK, "users gotten successfully")
        .with_data("data", users)
        .into_response())
}

#[get("/api/v1/user/{userId}")]
pub async fn get_user(
    path: web::Path<String>,
    state: web::Data<AccountState>,
) -> Result<HttpResponse, ApiError> {
    let user = state
        .service
        .get_user(&path)
        .await
        .map_err(|e| state.reject(e))?;

    Ok(Envelope::success(StatusCode::OK, "user gotten successfully")
        .with_data("data", user)
        .into_response())
}

#[put("/api/v1/update-user")]
pub async fn update_user(
    body: web::Json<UpdateUserRequest>,
    state: web::Data<AccountState>,
) -> Result<HttpResponse, ApiError> {
    let outcome = state
        .service
        .update_user(body.into_inner())
        .await
        .map_err(|e| state.reject(e))?;

    Ok(Envelope::success(StatusCode::OK, "user updated successfully")
        .with_data("data", outcome)
        .into_response())
}

#[delete("/api/v1/user/{userId}")]
pub async fn remove_user(
    path: web::Path<String>,
    state: web::Data<AccountState>,
) -> Result<HttpResponse, ApiError> {
    state
        .service
        .remove_user(&path)
        .await
        .map_err(|e| state.reject(e))?;

    Ok(Envelope::success(StatusCode::OK, "user deleted successfully").into_response())
}

/// Drain a signup multipart body into text fields and the file part
///
/// A `file` part with neither a filename nor content is what browsers send
/// when no file was chosen, so it is treated as absent. Any `file` part after
/// the first kept one is rejected before its content is read.
async fn read_signup_submission(
    mut payload: Multipart,
    max_bytes: usize,
) -> Result<SignupSubmission, AccountError> {
    let mut submission = SignupSubmission::default();

    while let Some(item) = payload.next().await {
        let mut field = item.map_err(|e| AccountError::BadRequestFormat(e.to_string()))?;

        let name = field.name().map(str::to_owned).unwrap_or_default();
        let file_name = field
            .content_disposition()
            .and_then(|cd| cd.get_filename())
            .map(str::to_owned);

        let is_file = name == FILE_FIELD;
        if is_file && !submission.files.is_empty() {
            return Err(AccountError::BadRequestFormat(
                "expected exactly one file, received more".to_string(),
            ));
        }

        let limit = if is_file { max_bytes } else { TEXT_FIELD_MAX_BYTES };
        let mut content = Vec::new();
        while let Some(chunk) = field.next().await {
            let data = chunk.map_err(|e| AccountError::BadRequestFormat(e.to_string()))?;
            content.extend_from_slice(&data);

            if content.len() > limit {
                return Err(if is_file {
                    AccountError::FileSave(format!("File too large. Max size: {} bytes", limit))
                } else {
                    AccountError::BadRequestFormat(format!(
                        "field '{}' exceeds {} bytes",
                        name, limit
                    ))
                });
            }
        }

        if is_file {
            let file_name = file_name.unwrap_or_default();
            if file_name.is_empty() && content.is_empty() {
                continue;
            }
            submission.files.push(UploadedFile { file_name, content });
        } else {
            let value = String::from_utf8(content).map_err(|_| {
                AccountError::BadRequestFormat(format!("field '{}' is not valid UTF-8", name))
            })?;
            submission.form.set_field(&name, value);
        }
    }

    Ok(submission)
}
