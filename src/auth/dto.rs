use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::auth::repo_types::User;

/// Request body for user registration. Fields are optional so that a missing field
/// is reported as a validation error rather than a deserialization failure.
#[derive(Debug, Default, Deserialize)]
pub struct SignupRequest {
    #[serde(default)]
    pub username: Option<String>,
    #[serde(default)]
    pub email: Option<String>,
    #[serde(default)]
    pub password: Option<String>,
}

/// Request body for login.
#[derive(Debug, Default, Deserialize)]
pub struct LoginRequest {
    #[serde(default)]
    pub email: Option<String>,
    #[serde(default)]
    pub password: Option<String>,
}

/// Response returned after signup or login.
#[derive(Debug, Serialize)]
pub struct AuthResponse {
    pub token: String,
    pub user: PublicUser,
}

/// Public part of the user returned to the client.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PublicUser {
    pub id: Uuid,
    pub username: String,
    pub email: String,
}

impl From<User> for PublicUser {
    fn from(u: User) -> Self {
        Self {
            id: u.id,
            username: u.username,
            email: u.email,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use time::OffsetDateTime;

    #[test]
    fn public_user_never_contains_password_hash() {
        let user = User {
            id: Uuid::new_v4(),
            username: "ann".into(),
            email: "ann@x.com".into(),
            password_hash: "$argon2id$secret".into(),
            created_at: OffsetDateTime::now_utc(),
        };
        let raw = serde_json::to_string(&user).unwrap();
        assert!(!raw.contains("password"));

        let json = serde_json::to_value(PublicUser::from(user)).unwrap();
        assert_eq!(json["username"], "ann");
        assert_eq!(json["email"], "ann@x.com");
        assert!(json.get("password_hash").is_none());
    }

    #[test]
    fn signup_request_tolerates_missing_fields() {
        let req: SignupRequest = serde_json::from_str(r#"{"email":"a@b.co"}"#).unwrap();
        assert!(req.username.is_none());
        assert_eq!(req.email.as_deref(), Some("a@b.co"));
    }
}
