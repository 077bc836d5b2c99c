use std::str::FromStr;

use actix_web::{FromRequest, HttpRequest};
use actix_web_httpauth::extractors::bearer::BearerAuth;
use jsonwebtoken::{Algorithm, DecodingKey, Validation};
use serde::{Deserialize, Serialize};

use crate::model::apperror::{ApplicationError, ErrorType};

/**
 * Claims read from the bearer token.
 */
#[derive(Debug, Serialize, Deserialize)]
struct Claim {
    sub: Option<String>,
    exp: Option<usize>,
}

/**
 * JWT Security Service guarding the api.
 */
#[derive(Clone)]
pub struct JwtSecurityService {
    /**
     * The decoding key used to verify JWT tokens.
     */
    decoding_key: DecodingKey,
    /**
     * The validation rules for JWT tokens.
     */
    validation: Validation,
}

impl JwtSecurityService {
    /**
     * Creates a new instance of JwtSecurityService.
     *
     * # Arguments
     * `public_key`: PEM encoded public key, or the shared secret for HMAC algorithms.
     * `algorithm`: The algorithm used for JWT token validation.
     *
     * # Returns
     * A Result containing the JwtSecurityService or an ApplicationError if initialization fails.
     */
    pub fn new(public_key: &str, algorithm: &str) -> Result<Self, ApplicationError> {
        let algorithm = Algorithm::from_str(algorithm).map_err(|err| ApplicationError::new(ErrorType::Initialization, format!("Invalid algorithm: {err}")))?;
        let decoding_key = match algorithm {
            Algorithm::RS256 | Algorithm::RS384 | Algorithm::RS512 | Algorithm::PS256 | Algorithm::PS384 | Algorithm::PS512 => {
                DecodingKey::from_rsa_pem(public_key.as_bytes()).map_err(|err| ApplicationError::new(ErrorType::Initialization, format!("Failed to create decoding key: {err}")))?
            }
            Algorithm::ES256 | Algorithm::ES384 => DecodingKey::from_ec_pem(public_key.as_bytes()).map_err(|err| ApplicationError::new(ErrorType::Initialization, format!("Failed to create decoding key: {err}")))?,
            Algorithm::HS256 | Algorithm::HS384 | Algorithm::HS512 => DecodingKey::from_secret(public_key.as_bytes()),
            Algorithm::EdDSA => DecodingKey::from_ed_pem(public_key.as_bytes()).map_err(|err| ApplicationError::new(ErrorType::Initialization, format!("Failed to create decoding key: {err}")))?,
            #[allow(unreachable_patterns)]
            _ => return Err(ApplicationError::new(ErrorType::Initialization, "Unsupported algorithm".to_string())),
        };
        Ok(JwtSecurityService { decoding_key, validation: Validation::new(algorithm) })
    }

    /**
     * Validates the bearer token of the HTTP request.
     *
     * # Arguments
     * `http_request`: The HTTP request containing the JWT token in the Authorization header.
     *
     * # Returns
     * A Result indicating success or a `JwtAuthorization` error.
     */
    pub fn validate(&self, http_request: &HttpRequest) -> Result<(), ApplicationError> {
        let Some(credentials) = BearerAuth::from_request(http_request, &mut actix_web::dev::Payload::None).into_inner().ok() else {
            tracing::debug!("Missing bearer token");
            return Err(ApplicationError::new(ErrorType::JwtAuthorization, "Unauthorized".to_string()));
        };
        match jsonwebtoken::decode::<Claim>(credentials.token(), &self.decoding_key, &self.validation) {
            Ok(token_data) => {
                tracing::debug!("Authorized subject {:?}", token_data.claims.sub);
                Ok(())
            }
            Err(err) => {
                tracing::warn!("JWT validation error: {err}");
                Err(ApplicationError::new(ErrorType::JwtAuthorization, "Unauthorized".to_string()))
            }
        }
    }
}

#[cfg(test)]
mod test {
    use actix_web::test::TestRequest;
    use jsonwebtoken::{EncodingKey, Header};

    use super::*;

    const SECRET: &str = "consumption-secret";

    fn token(secret: &str, exp: usize) -> String {
        let claim = Claim { sub: Some("admin".to_string()), exp: Some(exp) };
        jsonwebtoken::encode(&Header::new(Algorithm::HS256), &claim, &EncodingKey::from_secret(secret.as_bytes())).unwrap()
    }

    #[test]
    fn test_initialization_invalid_algorithm() {
        assert!(JwtSecurityService::new(SECRET, "XX256").is_err());
    }

    #[test]
    fn test_initialization_invalid_public_key() {
        let jwt_service = JwtSecurityService::new("-----BEGIN PUBLIC KEY-----\nnot a key\n-----END PUBLIC KEY-----", "RS256");
        assert_eq!(jwt_service.err().map(|err| err.error_type), Some(ErrorType::Initialization));
    }

    #[test]
    fn test_validator_success() {
        let jwt_service = JwtSecurityService::new(SECRET, "HS256").unwrap();
        let req = TestRequest::with_uri("/api/methods").insert_header(("Authorization", format!("Bearer {}", token(SECRET, 4_000_000_000)))).to_http_request();
        assert!(jwt_service.validate(&req).is_ok());
    }

    #[test]
    fn test_validator_wrong_secret() {
        let jwt_service = JwtSecurityService::new(SECRET, "HS256").unwrap();
        let req = TestRequest::with_uri("/api/methods").insert_header(("Authorization", format!("Bearer {}", token("other", 4_000_000_000)))).to_http_request();
        assert_eq!(jwt_service.validate(&req).unwrap_err().error_type, ErrorType::JwtAuthorization);
    }

    #[test]
    fn test_validator_expired_token() {
        let jwt_service = JwtSecurityService::new(SECRET, "HS256").unwrap();
        let req = TestRequest::with_uri("/api/methods").insert_header(("Authorization", format!("Bearer {}", token(SECRET, 1_000)))).to_http_request();
        assert!(jwt_service.validate(&req).is_err());
    }

    #[test]
    fn test_validator_missing_token() {
        let jwt_service = JwtSecurityService::new(SECRET, "HS256").unwrap();
        let req = TestRequest::with_uri("/api/methods").to_http_request();
        assert!(jwt_service.validate(&req).is_err());
    }
}
