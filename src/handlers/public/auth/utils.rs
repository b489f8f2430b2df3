use serde::Serialize;
use std::collections::HashMap;

use crate::auth::IssuedToken;
use crate::error::ApiError;
use crate::store::UserProfile;

/// Token payload returned by login and session refresh
#[derive(Debug, Serialize)]
pub struct TokenResponse {
    pub token: String,
    pub token_type: &'static str,
    pub expires_in: i64,
    pub user: UserProfile,
}

impl TokenResponse {
    pub fn new(issued: IssuedToken, user: UserProfile) -> Self {
        Self {
            token: issued.token,
            token_type: "Bearer",
            expires_in: issued.expires_in,
            user,
        }
    }
}

/// Unwrap required string fields, collecting every missing or blank one.
///
/// Values are returned in the order given. Blank means empty after trimming.
pub fn require_fields<const N: usize>(
    fields: [(&str, Option<String>); N],
) -> Result<[String; N], ApiError> {
    let mut field_errors = HashMap::new();

    let values = fields.map(|(name, value)| match value {
        Some(v) if !v.trim().is_empty() => v,
        _ => {
            field_errors.insert(name.to_string(), "This field is required".to_string());
            String::new()
        }
    });

    if field_errors.is_empty() {
        Ok(values)
    } else {
        Err(ApiError::validation_error("Missing required fields", Some(field_errors)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_all_present() {
        let [user, pass] = require_fields([
            ("username", Some("alice".to_string())),
            ("password", Some("pw".to_string())),
        ])
        .unwrap();
        assert_eq!(user, "alice");
        assert_eq!(pass, "pw");
    }

    #[test]
    fn test_reports_every_missing_field() {
        let err = require_fields([("username", None), ("password", Some("  ".to_string()))]).unwrap_err();
        let body = err.to_json();
        assert_eq!(body["code"], "VALIDATION_ERROR");
        assert!(body["field_errors"].get("username").is_some());
        assert!(body["field_errors"].get("password").is_some());
    }
}
