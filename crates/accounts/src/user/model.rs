use crate::error::StoreError;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use uuid::Uuid;
use validator::Validate;

/// A stored account
///
/// `password` always holds an Argon2id PHC string once the user has been
/// persisted.
#[derive(Debug, Clone, PartialEq)]
pub struct User {
    pub id: Uuid,
    pub full_name: String,
    pub user_name: String,
    pub user_email: String,
    pub password: String,
    pub profile_image: Option<String>,
}

/// The schemaless document a user is persisted as. The id lives outside the
/// document so that field updates can never touch it.
#[derive(Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
struct UserDocument {
    full_name: String,
    user_name: String,
    user_email: String,
    password: String,
    #[serde(default)]
    profile_image: Option<String>,
}

impl User {
    pub fn to_document(&self) -> Value {
        serde_json::json!({
            "fullName": self.full_name,
            "userName": self.user_name,
            "userEmail": self.user_email,
            "password": self.password,
            "profileImage": self.profile_image,
        })
    }

    /// Rebuild a user from its stored document. Fields set through partial
    /// updates that the model does not know about are ignored.
    pub fn from_document(id: Uuid, document: Value) -> Result<Self, StoreError> {
        let document: UserDocument = serde_json::from_value(document)?;

        Ok(Self {
            id,
            full_name: document.full_name,
            user_name: document.user_name,
            user_email: document.user_email,
            password: document.password,
            profile_image: document.profile_image,
        })
    }
}

/// Public view of a user, without the password hash
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct UserResponse {
    pub id: Uuid,
    pub full_name: String,
    pub user_name: String,
    pub user_email: String,
    pub profile_image: Option<String>,
}

impl From<User> for UserResponse {
    fn from(user: User) -> Self {
        Self {
            id: user.id,
            full_name: user.full_name,
            user_name: user.user_name,
            user_email: user.user_email,
            profile_image: user.profile_image,
        }
    }
}

/// Text fields of the signup form
#[derive(Debug, Clone, Default, Deserialize, Validate)]
#[serde(rename_all = "camelCase", default)]
pub struct SignupForm {
    #[validate(length(min = 1, message = "fullName is required"))]
    pub full_name: String,

    #[validate(length(min = 1, message = "userName is required"))]
    pub user_name: String,

    #[validate(length(min = 1, message = "userEmail is required"))]
    pub user_email: String,

    #[validate(length(min = 1, message = "password is required"))]
    pub password: String,
}

impl SignupForm {
    /// Assign a multipart text field by its form name. Returns `false` for
    /// names the form does not know.
    pub fn set_field(&mut self, name: &str, value: String) -> bool {
        match name {
            "fullName" => self.full_name = value,
            "userName" => self.user_name = value,
            "userEmail" => self.user_email = value,
            "password" => self.password = value,
            _ => return false,
        }
        true
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, Validate)]
#[serde(rename_all = "camelCase", default)]
pub struct LoginRequest {
    #[validate(length(min = 1, message = "userEmail is required"))]
    pub user_email: String,

    #[validate(length(min = 1, message = "password is required"))]
    pub password: String,
}

/// Set field `key` of user `id` to `value`
#[derive(Debug, Clone, Default, Serialize, Deserialize, Validate)]
#[serde(default)]
pub struct UpdateUserRequest {
    #[validate(length(min = 1, message = "id is required"))]
    pub id: String,

    #[validate(length(min = 1, message = "key is required"))]
    pub key: String,

    #[validate(length(min = 1, message = "value is required"))]
    pub value: String,
}

/// Counts reported by a single-field update
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UpdateOutcome {
    pub matched_count: u64,
    pub modified_count: u64,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample_user() -> User {
        User {
            id: Uuid::new_v4(),
            full_name: "Ada Lovelace".to_string(),
            user_name: "ada".to_string(),
            user_email: "ada@example.com".to_string(),
            password: "$argon2id$v=19$m=19456,t=2,p=1$c2FsdA$aGFzaA".to_string(),
            profile_image: Some("public/uploads/user_images/avatar.png".to_string()),
        }
    }

    #[test]
    fn test_document_round_trip_keeps_id_outside() {
        let user = sample_user();
        let document = user.to_document();

        assert!(document.get("id").is_none());
        assert_eq!(document["userEmail"], "ada@example.com");

        let restored = User::from_document(user.id, document).unwrap();
        assert_eq!(restored, user);
    }

    #[test]
    fn test_unknown_document_fields_are_ignored() {
        let user = sample_user();
        let mut document = user.to_document();
        document["nickname"] = Value::String("countess".to_string());

        let restored = User::from_document(user.id, document).unwrap();
        assert_eq!(restored.full_name, user.full_name);
    }

    #[test]
    fn test_corrupt_document() {
        let result = User::from_document(Uuid::new_v4(), serde_json::json!({ "fullName": 7 }));
        assert!(matches!(result, Err(StoreError::Corrupt(_))));
    }

    #[test]
    fn test_response_hides_password() {
        let response: UserResponse = sample_user().into();
        let json = serde_json::to_value(&response).unwrap();

        assert!(json.get("password").is_none());
        assert_eq!(json["userName"], "ada");
    }

    #[test]
    fn test_signup_form_validation() {
        let mut form = SignupForm::default();
        assert!(form.validate().is_err());

        assert!(form.set_field("fullName", "Ada".to_string()));
        assert!(form.set_field("userName", "ada".to_string()));
        assert!(form.set_field("userEmail", "ada@example.com".to_string()));
        assert!(!form.set_field("file", "ignored".to_string()));
        assert!(form.validate().is_err());

        form.set_field("password", "hunter2".to_string());
        assert!(form.validate().is_ok());
    }

    #[test]
    fn test_missing_json_fields_fail_validation_not_parsing() {
        let request: UpdateUserRequest = serde_json::from_str(r#"{"id": "abc"}"#).unwrap();
        assert!(request.validate().is_err());

        let login: LoginRequest =
            serde_json::from_str(r#"{"userEmail": "a@b.c", "password": "x"}"#).unwrap();
        assert!(login.validate().is_ok());
    }
}
