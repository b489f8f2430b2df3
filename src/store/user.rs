use serde::{Deserialize, Serialize};

/// One record of the users file.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct User {
    pub username: String,
    /// bcrypt hash, stored under the `password` key
    #[serde(rename = "password")]
    pub password_hash: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub email: Option<String>,
}

impl User {
    pub fn new(username: impl Into<String>, password_hash: impl Into<String>, email: Option<String>) -> Self {
        Self {
            username: username.into(),
            password_hash: password_hash.into(),
            email,
        }
    }

    /// Public view of the record, without the hash.
    pub fn profile(&self) -> UserProfile {
        UserProfile {
            username: self.username.clone(),
            email: self.email.clone(),
        }
    }
}

/// Trim an optional email, treating blank input as absent.
pub fn normalize_email(email: Option<String>) -> Option<String> {
    email
        .map(|e| e.trim().to_string())
        .filter(|e| !e.is_empty())
}

/// User information safe to return to clients
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UserProfile {
    pub username: String,
    pub email: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_hash_stored_under_password_key() {
        let user = User::new("alice", "$2b$04$hash", Some("alice@example.com".to_string()));
        let value = serde_json::to_value(&user).unwrap();
        assert_eq!(value["password"], "$2b$04$hash");
        assert!(value.get("password_hash").is_none());
    }

    #[test]
    fn test_missing_email_defaults_to_none() {
        let user: User = serde_json::from_str(r#"{"username":"bob","password":"x"}"#).unwrap();
        assert_eq!(user.email, None);
    }

    #[test]
    fn test_normalize_email() {
        assert_eq!(normalize_email(None), None);
        assert_eq!(normalize_email(Some(String::new())), None);
        assert_eq!(normalize_email(Some(" \t ".to_string())), None);
        assert_eq!(
            normalize_email(Some(" a@example.com ".to_string())).as_deref(),
            Some("a@example.com")
        );
    }

    #[test]
    fn test_profile_omits_hash() {
        let user = User::new("carol", "secret-hash", None);
        let value = serde_json::to_value(user.profile()).unwrap();
        assert_eq!(value["username"], "carol");
        assert!(value.get("password").is_none());
    }
}
