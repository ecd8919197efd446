//! Token response shapes

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TokenResponse {
    pub access_token: String,
    pub refresh_token: String,
    /// Access token expiry, Unix seconds
    pub expires_at: i64,
}

/// Login result consumed by the admin frontend
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoginResult {
    #[serde(flatten)]
    pub token: TokenResponse,
    pub status: String,
    pub r#type: String,
    #[serde(rename = "currentAuthority")]
    pub current_authority: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_login_result_flattens_token() {
        let result = LoginResult {
            token: TokenResponse {
                access_token: "a".into(),
                refresh_token: "r".into(),
                expires_at: 1,
            },
            status: "ok".into(),
            r#type: "account".into(),
            current_authority: "ADMIN".into(),
        };
        let json = serde_json::to_value(&result).unwrap();
        assert_eq!(json["access_token"], "a");
        assert_eq!(json["currentAuthority"], "ADMIN");
        assert_eq!(json["status"], "ok");
    }
}
