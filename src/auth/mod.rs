use crate::utils::{ApiError, ApiResult, AuthConfig};
use axum::{
    extract::{Request, State},
    http::{header::AUTHORIZATION, HeaderMap, HeaderValue},
    middleware::Next,
    response::Response,
};
use chrono::{DateTime, Utc};
use jsonwebtoken::{decode, encode, Algorithm, DecodingKey, EncodingKey, Header, Validation};
use serde::{Deserialize, Serialize};
use std::{collections::BTreeSet, sync::Arc};

/// Response header carrying a freshly issued token
pub const AUTH_RESPONSE_HEADER: &str = "X-Authentication-Token";
pub const AUTH_PREFIX: &str = "Bearer ";

const ROLE_PREFIX: &str = "ROLE_";

/// Roles embedded in every issued token
pub const DEFAULT_ROLES: [&str; 2] = ["ADMIN", "USER"];

/// JWT claims structure
#[derive(Debug, Serialize, Deserialize)]
pub struct Claims {
    pub sub: String,
    #[serde(default)]
    pub roles: Vec<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub iat: Option<i64>,
    pub exp: i64,
}

/// How an [`Authentication`] was established
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AuthenticationDetails {
    pub issued_at: Option<i64>,
    pub expires_at: i64,
}

/// Authenticated principal
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Authentication {
    pub username: String,
    pub authorities: BTreeSet<String>,
    pub details: Option<AuthenticationDetails>,
}

impl Authentication {
    /// Principal carrying only a username, as handed over by a login step
    pub fn new(username: impl Into<String>) -> Self {
        Self {
            username: username.into(),
            authorities: BTreeSet::new(),
            details: None,
        }
    }
}

/// Issues and validates HS512 bearer tokens signed with a shared secret
pub struct TokenAuthenticationService {
    config: AuthConfig,
    encoding_key: EncodingKey,
    decoding_key: DecodingKey,
    validation: Validation,
}

impl TokenAuthenticationService {
    pub fn new(config: AuthConfig) -> Self {
        let mut validation = Validation::new(Algorithm::HS512);
        // Expiration is checked against our own clock in `decode_at`
        validation.validate_exp = false;
        validation.leeway = 0;
        validation.validate_aud = false;
        validation.set_required_spec_claims(&["sub", "exp"]);

        Self {
            encoding_key: EncodingKey::from_secret(config.secret.as_bytes()),
            decoding_key: DecodingKey::from_secret(config.secret.as_bytes()),
            validation,
            config,
        }
    }

    /// Sign a token for `username` valid from `now` for the configured duration
    ///
    /// `exp` is whole seconds, rounded down from `now + duration`, so a token
    /// may lapse up to 999 ms before the full duration but never after it. A
    /// zero duration yields a token that is already expired at `now`.
    pub fn issue_token(&self, username: &str, now: DateTime<Utc>) -> ApiResult<String> {
        let expires_at_ms = now
            .timestamp_millis()
            .saturating_add(i64::try_from(self.config.expiration_time_ms).unwrap_or(i64::MAX));

        let claims = Claims {
            sub: username.to_string(),
            roles: DEFAULT_ROLES.iter().map(|role| role.to_string()).collect(),
            iat: Some(now.timestamp()),
            exp: expires_at_ms.div_euclid(1000),
        };

        encode(&Header::new(Algorithm::HS512), &claims, &self.encoding_key).map_err(|e| {
            tracing::error!("Failed to sign token: {}", e);
            ApiError::internal_error("Failed to generate token")
        })
    }

    /// Issue a token for `authentication` and attach it to the response headers
    pub fn add_authentication(
        &self,
        headers: &mut HeaderMap,
        authentication: &Authentication,
    ) -> ApiResult<()> {
        let token = self.issue_token(&authentication.username, Utc::now())?;
        let value = HeaderValue::from_str(&token)
            .map_err(|_| ApiError::internal_error("Generated token is not a valid header value"))?;

        headers.insert(AUTH_RESPONSE_HEADER, value);
        tracing::debug!(username = %authentication.username, "Issued authentication token");
        Ok(())
    }

    /// Principal for the bearer token in `headers`, if there is a valid one
    pub fn get_authentication(&self, headers: &HeaderMap) -> Option<Authentication> {
        self.get_authentication_at(headers, Utc::now())
    }

    pub fn get_authentication_at(
        &self,
        headers: &HeaderMap,
        now: DateTime<Utc>,
    ) -> Option<Authentication> {
        let token = extract_auth_token(headers)?;

        match self.decode_at(token, now) {
            Ok(claims) => Some(Authentication {
                username: claims.sub,
                authorities: claims
                    .roles
                    .iter()
                    .map(|role| format!("{}{}", ROLE_PREFIX, role))
                    .collect(),
                details: Some(AuthenticationDetails {
                    issued_at: claims.iat,
                    expires_at: claims.exp,
                }),
            }),
            Err(e) => {
                tracing::debug!("Rejected bearer token: {}", e);
                None
            }
        }
    }

    fn decode_at(&self, token: &str, now: DateTime<Utc>) -> ApiResult<Claims> {
        let claims = decode::<Claims>(token, &self.decoding_key, &self.validation)
            .map_err(|e| ApiError::authentication_error(format!("Invalid token: {}", e)))?
            .claims;

        if now.timestamp() >= claims.exp {
            return Err(ApiError::authentication_error("Token has expired"));
        }

        Ok(claims)
    }
}

/// Token from an `Authorization: Bearer <token>` header
pub fn extract_auth_token(headers: &HeaderMap) -> Option<&str> {
    headers
        .get(AUTHORIZATION)
        .and_then(|value| value.to_str().ok())
        .and_then(|value| value.strip_prefix(AUTH_PREFIX))
        .map(str::trim)
        .filter(|token| !token.is_empty())
}

/// Authentication middleware
///
/// Attaches the request's [`Authentication`] to its extensions when the bearer
/// token is valid. Requests without one pass through untouched.
pub async fn auth_middleware(
    State(auth_service): State<Arc<TokenAuthenticationService>>,
    mut request: Request,
    next: Next,
) -> Response {
    if let Some(authentication) = auth_service.get_authentication(request.headers()) {
        request.extensions_mut().insert(authentication);
    }

    next.run(request).await
}

/// Required authentication middleware (returns 401 if no valid auth)
pub async fn require_auth(request: Request, next: Next) -> Result<Response, ApiError> {
    if request.extensions().get::<Authentication>().is_some() {
        Ok(next.run(request).await)
    } else {
        Err(ApiError::authentication_error("Authentication required"))
    }
}
