//! Request/Response Envelope
//! Mission: One JSON body shape shared by every endpoint

use crate::auth::models::{Role, User};
use axum::http::StatusCode;
use serde::{Deserialize, Serialize};

/// Absent fields are omitted on output and unknown fields ignored on input.
/// `password` is only ever read from requests.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Envelope {
    #[serde(default)]
    pub status_code: u16,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub token: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub refresh_token: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub expiration_time: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub city: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub role: Option<Role>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub email: Option<String>,
    #[serde(skip_serializing)]
    pub password: Option<String>,
    #[serde(rename = "ourUsers", skip_deserializing, skip_serializing_if = "Option::is_none")]
    pub user: Option<User>,
    #[serde(rename = "ourUsersList", skip_deserializing, skip_serializing_if = "Option::is_none")]
    pub users: Option<Vec<User>>,
}

impl Envelope {
    pub fn ok(message: impl Into<String>) -> Self {
        Self {
            status_code: StatusCode::OK.as_u16(),
            message: Some(message.into()),
            ..Default::default()
        }
    }

    pub fn error(status: StatusCode, error: impl Into<String>) -> Self {
        Self {
            status_code: status.as_u16(),
            error: Some(error.into()),
            ..Default::default()
        }
    }

    pub fn with_user(mut self, user: User) -> Self {
        self.user = Some(user);
        self
    }

    pub fn with_users(mut self, users: Vec<User>) -> Self {
        self.users = Some(users);
        self
    }

    /// Trimmed, non-empty value of an optional request field
    pub(crate) fn field(value: &Option<String>) -> Option<&str> {
        value.as_deref().map(str::trim).filter(|v| !v.is_empty())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_absent_fields_are_omitted() {
        let json = serde_json::to_value(Envelope::ok("Successful")).unwrap();
        let obj = json.as_object().unwrap();

        assert_eq!(obj.len(), 2);
        assert_eq!(json["statusCode"], 200);
        assert_eq!(json["message"], "Successful");
    }

    #[test]
    fn test_request_parsing_ignores_unknown_and_response_only_fields() {
        let body = r#"{
            "email": "a@x.com",
            "password": "pw1",
            "role": "admin",
            "ourUsers": {"id": 1},
            "favouriteColour": "green"
        }"#;

        let req: Envelope = serde_json::from_str(body).unwrap();
        assert_eq!(req.email.as_deref(), Some("a@x.com"));
        assert_eq!(req.password.as_deref(), Some("pw1"));
        assert_eq!(req.role, Some(Role::Admin));
        assert!(req.user.is_none());
        assert_eq!(req.status_code, 0);
    }

    #[test]
    fn test_password_never_serialized() {
        let env = Envelope {
            password: Some("secret".to_string()),
            email: Some("a@x.com".to_string()),
            ..Envelope::ok("Successful")
        };
        let json = serde_json::to_string(&env).unwrap();
        assert!(!json.contains("password"));
        assert!(!json.contains("secret"));
    }

    #[test]
    fn test_user_fields_use_wire_names() {
        let user = User {
            id: 1,
            email: "a@x.com".to_string(),
            name: "Ada".to_string(),
            city: None,
            role: Role::User,
            password_hash: "hash".to_string(),
            created_at: "2025-01-01T00:00:00Z".to_string(),
        };
        let json = serde_json::to_value(
            Envelope::ok("Successful")
                .with_user(user.clone())
                .with_users(vec![user]),
        )
        .unwrap();

        assert_eq!(json["ourUsers"]["email"], "a@x.com");
        assert_eq!(json["ourUsersList"].as_array().unwrap().len(), 1);
        assert!(json["ourUsers"].get("password_hash").is_none());
    }

    #[test]
    fn test_field_trims_blank_values() {
        assert_eq!(Envelope::field(&Some("  a@x.com ".to_string())), Some("a@x.com"));
        assert_eq!(Envelope::field(&Some("   ".to_string())), None);
        assert_eq!(Envelope::field(&None), None);
    }
}
