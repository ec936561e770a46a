use crate::error::{AppError, AppResult};
use crate::models::StaffRole;
use chrono::{Duration, Utc};
use jsonwebtoken::{Algorithm, DecodingKey, EncodingKey, Header, Validation, decode, encode};
use serde::{Deserialize, Serialize};

#[derive(Debug, Serialize, Deserialize)]
pub struct Claims {
    pub sub: String, // provider_id
    pub role: StaffRole,
    pub exp: i64,
    pub iat: i64,
    pub token_type: String, // "access"
}

/// 令牌由外部登录系统签发，这边只负责校验；generate 留给签发方共用和测试。
#[derive(Clone)]
pub struct JwtService {
    encoding_key: EncodingKey,
    decoding_key: DecodingKey,
    access_token_expires_in: i64,
}

impl JwtService {
    pub fn new(secret: &str, access_expires_in: i64) -> Self {
        Self {
            encoding_key: EncodingKey::from_secret(secret.as_bytes()),
            decoding_key: DecodingKey::from_secret(secret.as_bytes()),
            access_token_expires_in: access_expires_in,
        }
    }

    pub fn generate_access_token(&self, provider_id: i64, role: StaffRole) -> AppResult<String> {
        let now = Utc::now();
        let exp = now + Duration::seconds(self.access_token_expires_in);

        let claims = Claims {
            sub: provider_id.to_string(),
            role,
            exp: exp.timestamp(),
            iat: now.timestamp(),
            token_type: "access".to_string(),
        };

        encode(&Header::default(), &claims, &self.encoding_key).map_err(AppError::JwtError)
    }

    pub fn verify_access_token(&self, token: &str) -> AppResult<Claims> {
        let validation = Validation::new(Algorithm::HS256);
        let claims = decode::<Claims>(token, &self.decoding_key, &validation)
            .map(|data| data.claims)
            .map_err(AppError::JwtError)?;

        if claims.token_type != "access" {
            return Err(AppError::AuthError("Invalid access token type".to_string()));
        }

        Ok(claims)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_access_token_round_trip() {
        let jwt = JwtService::new("test-secret", 3600);
        let token = jwt.generate_access_token(7, StaffRole::Manager).unwrap();
        let claims = jwt.verify_access_token(&token).unwrap();
        assert_eq!(claims.sub, "7");
        assert_eq!(claims.role, StaffRole::Manager);
        assert_eq!(claims.token_type, "access");
    }

    #[test]
    fn test_wrong_secret_rejected() {
        let issuer = JwtService::new("secret-a", 3600);
        let verifier = JwtService::new("secret-b", 3600);
        let token = issuer.generate_access_token(1, StaffRole::Staff).unwrap();
        assert!(verifier.verify_access_token(&token).is_err());
    }

    #[test]
    fn test_expired_token_rejected() {
        // 默认 leeway 是 60 秒，过期时间要拉得够远
        let jwt = JwtService::new("test-secret", -3600);
        let token = jwt.generate_access_token(1, StaffRole::Staff).unwrap();
        assert!(jwt.verify_access_token(&token).is_err());
    }
}
