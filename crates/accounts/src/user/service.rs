//! Account lifecycle operations
//!
//! Each operation takes one already-parsed request, runs the validation and
//! the single store call behind it, and returns a typed outcome. HTTP
//! concerns (status codes, envelopes, multipart parsing) stay in the handlers.

use crate::credentials::{PasswordHasher, TokenIssuer};
use crate::error::{AccountError, Result, StoreError};
use crate::uploads::{UploadStore, UploadedFile};
use crate::user::model::{
    LoginRequest, SignupForm, UpdateOutcome, UpdateUserRequest, User, UserResponse,
};
use crate::user::repository::UserRepository;
use std::sync::Arc;
use uuid::Uuid;
use validator::Validate;

/// Parsed signup submission: the text fields plus every file part received
#[derive(Debug, Default)]
pub struct SignupSubmission {
    pub form: SignupForm,
    pub files: Vec<UploadedFile>,
}

pub struct AccountService {
    repository: Arc<dyn UserRepository>,
    hasher: Arc<PasswordHasher>,
    tokens: Arc<TokenIssuer>,
    uploads: Arc<UploadStore>,
}

impl AccountService {
    pub fn new(
        repository: Arc<dyn UserRepository>,
        hasher: Arc<PasswordHasher>,
        tokens: Arc<TokenIssuer>,
        uploads: Arc<UploadStore>,
    ) -> Self {
        Self {
            repository,
            hasher,
            tokens,
            uploads,
        }
    }

    pub fn uploads(&self) -> &UploadStore {
        &self.uploads
    }

    /// Create an account from a signup form and its profile image
    ///
    /// The image is written before the insert. If the insert fails the image
    /// is removed again; a crash between the two steps can still orphan it.
    pub async fn signup(&self, submission: SignupSubmission) -> Result<Uuid> {
        let SignupSubmission { form, mut files } = submission;

        form.validate()
            .map_err(|e| AccountError::Validation(e.to_string()))?;

        let file = match files.len() {
            0 => return Err(AccountError::MissingFile),
            1 => files.remove(0),
            n => {
                return Err(AccountError::BadRequestFormat(format!(
                    "expected exactly one file, received {}",
                    n
                )))
            }
        };

        let stored_path = self.uploads.save(&file).await?;

        let password = match self.hasher.hash_password(&form.password) {
            Ok(hash) => hash,
            Err(e) => {
                self.uploads.remove(&stored_path).await;
                return Err(e);
            }
        };

        let user = User {
            id: Uuid::new_v4(),
            full_name: form.full_name,
            user_name: form.user_name,
            user_email: form.user_email,
            password,
            profile_image: Some(stored_path.to_string_lossy().into_owned()),
        };

        match self.repository.insert(&user).await {
            Ok(id) => {
                tracing::info!(user_id = %id, email = %user.user_email, "user created");
                Ok(id)
            }
            Err(e) => {
                self.uploads.remove(&stored_path).await;
                Err(AccountError::CreateFailed(e))
            }
        }
    }

    /// Check credentials and issue a bearer token
    ///
    /// An unknown email is reported the same way as a failed lookup.
    pub async fn login(&self, request: LoginRequest) -> Result<String> {
        request
            .validate()
            .map_err(|e| AccountError::Validation(e.to_string()))?;

        let user = self
            .repository
            .find_by_email(&request.user_email)
            .await
            .map_err(AccountError::LookupFailed)?
            .ok_or(AccountError::LookupFailed(StoreError::NotFound("email")))?;

        if !self
            .hasher
            .verify_password(&request.password, &user.password)?
        {
            return Err(AccountError::IncorrectPassword);
        }

        let token = self.tokens.issue_token(&user.id.to_string())?;

        tracing::info!(user_id = %user.id, "user logged in");

        Ok(token)
    }

    pub async fn get_user(&self, user_id: &str) -> Result<UserResponse> {
        let id = Uuid::parse_str(user_id).map_err(|e| {
            AccountError::LookupFailed(StoreError::Corrupt(format!("invalid user id: {}", e)))
        })?;

        let user = self
            .repository
            .find_by_id(id)
            .await
            .map_err(AccountError::LookupFailed)?
            .ok_or(AccountError::LookupFailed(StoreError::NotFound("id")))?;

        Ok(user.into())
    }

    pub async fn get_users(&self) -> Result<Vec<UserResponse>> {
        let users = self
            .repository
            .list_all()
            .await
            .map_err(AccountError::ListFailed)?;

        Ok(users.into_iter().map(UserResponse::from).collect())
    }

    /// Set one field of one user
    ///
    /// There is no allow-list of keys. A new password is hashed before it is
    /// stored, and an id that does not parse matches nothing.
    pub async fn update_user(&self, request: UpdateUserRequest) -> Result<UpdateOutcome> {
        request
            .validate()
            .map_err(|e| AccountError::Validation(e.to_string()))?;

        let Ok(id) = Uuid::parse_str(&request.id) else {
            return Ok(UpdateOutcome::default());
        };

        let value = if request.key == "password" {
            self.hasher.hash_password(&request.value)?
        } else {
            request.value
        };

        let outcome = self
            .repository
            .update_field(id, &request.key, &value)
            .await
            .map_err(AccountError::UpdateFailed)?;

        tracing::info!(
            user_id = %id,
            key = %request.key,
            matched = outcome.matched_count,
            modified = outcome.modified_count,
            "user updated"
        );

        Ok(outcome)
    }

    /// Delete a user. Nothing deleted, including an id that does not parse,
    /// is reported as not found.
    pub async fn remove_user(&self, user_id: &str) -> Result<()> {
        let Ok(id) = Uuid::parse_str(user_id) else {
            return Err(AccountError::UserNotFound);
        };

        let deleted = self
            .repository
            .delete_by_id(id)
            .await
            .map_err(AccountError::DeleteFailed)?;

        if deleted < 1 {
            return Err(AccountError::UserNotFound);
        }

        tracing::info!(user_id = %id, "user deleted");

        Ok(())
    }
}
