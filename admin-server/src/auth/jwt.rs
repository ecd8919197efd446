//! Access / refresh token engine
//!
//! HMAC-SHA-256 signed bearer tokens. Two kinds distinguished by the `type`
//! claim: short-lived `access` and long-lived `refresh`, with independent
//! expiries parsed from duration strings.

use chrono::Utc;
use jsonwebtoken::errors::ErrorKind;
use jsonwebtoken::{decode, encode, Algorithm, DecodingKey, EncodingKey, Header, Validation};
use serde::{Deserialize, Serialize};
use std::time::Duration;
use thiserror::Error;

/// `type` claim of an access token
pub const ACCESS_TOKEN_TYPE: &str = "access";
/// `type` claim of a refresh token
pub const REFRESH_TOKEN_TYPE: &str = "refresh";

/// Token payload. Authoritative only as to identity and role code;
/// permissions are re-evaluated from live data at authorization time.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Claims {
    /// User id, as a string
    pub identity: String,
    /// Display name
    pub nice: String,
    /// Role code of the highest-priority role at issue time
    pub rolekey: String,
    /// Token kind: `access` or `refresh`
    #[serde(rename = "type")]
    pub kind: String,
    /// Absolute expiry, Unix seconds
    pub exp: i64,
}

/// Both tokens plus the access-token expiry
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TokenPair {
    pub access_token: String,
    pub refresh_token: String,
    pub expires_at: i64,
}

#[derive(Debug, Error)]
pub enum JwtError {
    #[error("invalid duration: {0}")]
    InvalidDuration(String),
    #[error("invalid token: {0}")]
    InvalidToken(String),
    #[error("token expired")]
    TokenExpired,
    #[error("not a refresh token")]
    NotRefreshToken,
    #[error("token generation failed: {0}")]
    GenerationFailed(String),
}

/// Parse a duration string: decimal number followed by a unit in
/// `{s, m, h, d, w}` (unit case-insensitive). `"24h"`, `"30d"`, `"1.5h"`.
pub fn parse_duration(input: &str) -> Result<Duration, JwtError> {
    if input.is_empty() {
        return Err(JwtError::InvalidDuration("empty duration string".into()));
    }

    let mut number = String::new();
    let mut unit = String::new();
    for c in input.chars() {
        if c.is_ascii_digit() || c == '.' {
            number.push(c);
        } else {
            unit.push(c);
        }
    }
    if number.is_empty() || unit.is_empty() {
        return Err(JwtError::InvalidDuration(input.to_string()));
    }

    let amount: f64 = number
        .parse()
        .map_err(|_| JwtError::InvalidDuration(input.to_string()))?;
    let unit_secs: f64 = match unit.to_lowercase().as_str() {
        "s" => 1.0,
        "m" => 60.0,
        "h" => 3600.0,
        "d" => 86_400.0,
        "w" => 604_800.0,
        _ => return Err(JwtError::InvalidDuration(input.to_string())),
    };

    let secs = amount * unit_secs;
    if !secs.is_finite() || secs < 0.0 {
        return Err(JwtError::InvalidDuration(input.to_string()));
    }
    Ok(Duration::from_secs_f64(secs))
}

/// Token manager
pub struct Jwt {
    encoding_key: EncodingKey,
    decoding_key: DecodingKey,
    access_exp: Duration,
    refresh_exp: Duration,
}

impl Jwt {
    pub fn new(secret: &str, access_exp: &str, refresh_exp: &str) -> Result<Self, JwtError> {
        Ok(Self {
            encoding_key: EncodingKey::from_secret(secret.as_bytes()),
            decoding_key: DecodingKey::from_secret(secret.as_bytes()),
            access_exp: parse_duration(access_exp)?,
            refresh_exp: parse_duration(refresh_exp)?,
        })
    }

    fn sign(&self, claims: &Claims) -> Result<String, JwtError> {
        encode(&Header::default(), claims, &self.encoding_key)
            .map_err(|e| JwtError::GenerationFailed(e.to_string()))
    }

    /// Produce an access + refresh pair for the given identity
    pub fn generate(
        &self,
        user_id: &str,
        username: &str,
        role_code: &str,
    ) -> Result<TokenPair, JwtError> {
        let now = Utc::now();
        let access_exp = now + chrono::Duration::from_std(self.access_exp).unwrap_or_default();
        let refresh_exp = now + chrono::Duration::from_std(self.refresh_exp).unwrap_or_default();

        let access = self.sign(&Claims {
            identity: user_id.to_string(),
            nice: username.to_string(),
            rolekey: role_code.to_string(),
            kind: ACCESS_TOKEN_TYPE.to_string(),
            exp: access_exp.timestamp(),
        })?;
        let refresh = self.sign(&Claims {
            identity: user_id.to_string(),
            nice: username.to_string(),
            rolekey: role_code.to_string(),
            kind: REFRESH_TOKEN_TYPE.to_string(),
            exp: refresh_exp.timestamp(),
        })?;

        Ok(TokenPair {
            access_token: access,
            refresh_token: refresh,
            expires_at: access_exp.timestamp(),
        })
    }

    /// Validate and decode a token.
    ///
    /// Fails when the signature is wrong, the algorithm is not the expected
    /// HMAC family, or the token is expired.
    pub fn parse(&self, token: &str) -> Result<Claims, JwtError> {
        let mut validation = Validation::new(Algorithm::HS256);
        validation.leeway = 0;
        validation.set_required_spec_claims(&["exp"]);

        let data =
            decode::<Claims>(token, &self.decoding_key, &validation).map_err(|e| {
                match e.kind() {
                    ErrorKind::ExpiredSignature => JwtError::TokenExpired,
                    _ => JwtError::InvalidToken(e.to_string()),
                }
            })?;
        Ok(data.claims)
    }

    /// Exchange a refresh token for a new pair, keeping the embedded role
    /// code. Callers that track role revocations should use
    /// [`Jwt::refresh_with_role`] with a freshly resolved code.
    pub fn refresh(&self, refresh_token: &str) -> Result<TokenPair, JwtError> {
        let claims = self.parse(refresh_token)?;
        if claims.kind != REFRESH_TOKEN_TYPE {
            return Err(JwtError::NotRefreshToken);
        }
        self.generate(&claims.identity, &claims.nice, &claims.rolekey)
    }

    /// Exchange a refresh token for a new pair carrying `role_code`
    pub fn refresh_with_role(
        &self,
        refresh_token: &str,
        role_code: &str,
    ) -> Result<TokenPair, JwtError> {
        let claims = self.parse(refresh_token)?;
        if claims.kind != REFRESH_TOKEN_TYPE {
            return Err(JwtError::NotRefreshToken);
        }
        self.generate(&claims.identity, &claims.nice, role_code)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn jwt() -> Jwt {
        Jwt::new("test-secret", "24h", "30d").unwrap()
    }

    #[test]
    fn test_generate_and_parse() {
        let j = jwt();
        let pair = j.generate("42", "admin", "ADMIN").unwrap();

        let access = j.parse(&pair.access_token).unwrap();
        assert_eq!(access.identity, "42");
        assert_eq!(access.nice, "admin");
        assert_eq!(access.rolekey, "ADMIN");
        assert_eq!(access.kind, ACCESS_TOKEN_TYPE);

        let refresh = j.parse(&pair.refresh_token).unwrap();
        assert_eq!(refresh.kind, REFRESH_TOKEN_TYPE);
        assert!(refresh.exp > access.exp);
    }

    #[test]
    fn test_refresh_rejects_access_token() {
        let j = jwt();
        let pair = j.generate("42", "admin", "ADMIN").unwrap();
        assert!(matches!(
            j.refresh(&pair.access_token),
            Err(JwtError::NotRefreshToken)
        ));
    }

    #[test]
    fn test_refresh_issues_new_pair() {
        let j = jwt();
        let pair = j.generate("42", "admin", "ADMIN").unwrap();
        let renewed = j.refresh(&pair.refresh_token).unwrap();
        let claims = j.parse(&renewed.access_token).unwrap();
        assert_eq!(claims.identity, "42");
        assert_eq!(claims.kind, ACCESS_TOKEN_TYPE);
    }

    #[test]
    fn test_expired_token_rejected() {
        let j = jwt();
        // Hand-craft an already-expired token with the same key
        let claims = Claims {
            identity: "42".into(),
            nice: "admin".into(),
            rolekey: "ADMIN".into(),
            kind: ACCESS_TOKEN_TYPE.into(),
            exp: Utc::now().timestamp() - 120,
        };
        let token = encode(
            &Header::default(),
            &claims,
            &EncodingKey::from_secret(b"test-secret"),
        )
        .unwrap();
        assert!(matches!(j.parse(&token), Err(JwtError::TokenExpired)));
    }

    #[test]
    fn test_wrong_signature_rejected() {
        let j = jwt();
        let other = Jwt::new("other-secret", "24h", "30d").unwrap();
        let pair = other.generate("42", "admin", "ADMIN").unwrap();
        assert!(matches!(
            j.parse(&pair.access_token),
            Err(JwtError::InvalidToken(_))
        ));
    }

    #[test]
    fn test_garbage_token_rejected() {
        assert!(matches!(
            jwt().parse("not.a.token"),
            Err(JwtError::InvalidToken(_))
        ));
    }

    #[test]
    fn test_parse_duration_units() {
        assert_eq!(parse_duration("30s").unwrap(), Duration::from_secs(30));
        assert_eq!(parse_duration("2m").unwrap(), Duration::from_secs(120));
        assert_eq!(parse_duration("24h").unwrap(), Duration::from_secs(86_400));
        assert_eq!(
            parse_duration("30d").unwrap(),
            Duration::from_secs(30 * 86_400)
        );
        assert_eq!(
            parse_duration("2w").unwrap(),
            Duration::from_secs(2 * 604_800)
        );
        assert_eq!(parse_duration("24H").unwrap(), Duration::from_secs(86_400));
        assert_eq!(
            parse_duration("1.5h").unwrap(),
            Duration::from_secs(5400)
        );
    }

    #[test]
    fn test_parse_duration_rejects_garbage() {
        assert!(parse_duration("").is_err());
        assert!(parse_duration("h").is_err());
        assert!(parse_duration("10").is_err());
        assert!(parse_duration("10y").is_err());
        assert!(parse_duration("abc").is_err());
    }
}
