//! Request authentication and the role gate shared by every API route.

pub mod roles;

use crate::auth::roles::{forbidden_fields, permission, Action, Resource, Role, Scope};
use crate::error::{AppError, AppResult};
use crate::state::AppState;
use axum::async_trait;
use axum::extract::FromRequestParts;
use axum::http::{header::AUTHORIZATION, request::Parts};
use jsonwebtoken::{decode, Algorithm, DecodingKey, Validation};
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

/// Claims carried by the auth provider's session token
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Claims {
    pub sub: String,
    pub exp: usize,
    #[serde(default)]
    pub email: Option<String>,
}

/// Verifies HS256 session tokens with the provider's shared secret
pub struct TokenVerifier {
    key: DecodingKey,
    validation: Validation,
}

impl TokenVerifier {
    pub fn new(secret: &str, audience: Option<&str>) -> Self {
        let mut validation = Validation::new(Algorithm::HS256);
        match audience {
            Some(aud) => validation.set_audience(&[aud]),
            None => validation.validate_aud = false,
        }

        Self {
            key: DecodingKey::from_secret(secret.as_bytes()),
            validation,
        }
    }

    pub fn verify(&self, token: &str) -> AppResult<Claims> {
        decode::<Claims>(token, &self.key, &self.validation)
            .map(|data| data.claims)
            .map_err(|e| {
                debug!("Session token rejected: {}", e);
                AppError::unauthenticated("invalid or expired session token")
            })
    }
}

/// Caller identity taken from the bearer token
#[derive(Debug, Clone)]
pub struct AuthenticatedUser {
    pub user_id: String,
    pub email: Option<String>,
}

#[async_trait]
impl FromRequestParts<AppState> for AuthenticatedUser {
    type Rejection = AppError;

    async fn from_request_parts(parts: &mut Parts, state: &AppState) -> Result<Self, Self::Rejection> {
        let header = parts
            .headers
            .get(AUTHORIZATION)
            .and_then(|value| value.to_str().ok())
            .ok_or_else(|| AppError::unauthenticated("missing Authorization header"))?;

        let token = header
            .strip_prefix("Bearer ")
            .map(str::trim)
            .filter(|token| !token.is_empty())
            .ok_or_else(|| AppError::unauthenticated("expected a Bearer token"))?;

        let claims = state.tokens.verify(token)?;
        Ok(Self {
            user_id: claims.sub,
            email: claims.email,
        })
    }
}

impl AuthenticatedUser {
    /// Resolve the caller's role and check it against the permission matrix.
    ///
    /// Callers without a profile row are treated as customers.
    pub async fn authorize(
        &self,
        state: &AppState,
        resource: Resource,
        action: Action,
    ) -> AppResult<Actor> {
        let role = match state.stores.profiles.find(&self.user_id).await? {
            Some(profile) => profile.role.parse::<Role>().map_err(|e| {
                warn!(user_id = %self.user_id, "Profile has unusable role: {}", e);
                AppError::forbidden("profile role is not recognised")
            })?,
            None => Role::Customer,
        };

        match permission(role, resource, action) {
            Some(scope) => Ok(Actor {
                user_id: self.user_id.clone(),
                email: self.email.clone(),
                role,
                scope,
            }),
            None => {
                warn!(
                    user_id = %self.user_id,
                    role = %role,
                    resource = resource.as_str(),
                    action = action.as_str(),
                    "Permission denied"
                );
                Err(AppError::forbidden(format!(
                    "{} may not {} {}",
                    role,
                    action.as_str(),
                    resource.as_str()
                )))
            }
        }
    }
}

/// An authenticated caller whose permission for one action has been granted
#[derive(Debug, Clone)]
pub struct Actor {
    pub user_id: String,
    pub email: Option<String>,
    pub role: Role,
    pub scope: Scope,
}

impl Actor {
    /// Whether a row owned by `owner_id` falls within the granted scope
    pub fn covers_owner(&self, owner_id: &str) -> bool {
        match self.scope {
            Scope::All => true,
            Scope::Own => owner_id == self.user_id,
            Scope::Assigned => false,
        }
    }

    /// Whether a row assigned to `assignee` falls within the granted scope
    pub fn covers_assignee(&self, assignee: Option<&str>) -> bool {
        match self.scope {
            Scope::All => true,
            Scope::Assigned => assignee == Some(self.user_id.as_str()),
            Scope::Own => false,
        }
    }

    /// Restrict a list filter to the caller when the scope is not `All`
    pub fn owner_filter(&self) -> Option<String> {
        match self.scope {
            Scope::All => None,
            Scope::Own | Scope::Assigned => Some(self.user_id.clone()),
        }
    }

    /// Reject an update body that writes fields outside the role's allowlist
    pub fn check_fields(
        &self,
        resource: Resource,
        patch: &serde_json::Map<String, serde_json::Value>,
    ) -> AppResult<()> {
        let denied = forbidden_fields(self.role, resource, patch);
        if denied.is_empty() {
            return Ok(());
        }

        warn!(
            user_id = %self.user_id,
            role = %self.role,
            resource = resource.as_str(),
            fields = ?denied,
            "Update touches fields outside the role allowlist"
        );
        Err(AppError::forbidden(format!(
            "{} may not modify: {}",
            self.role,
            denied.join(", ")
        )))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use jsonwebtoken::{encode, EncodingKey, Header};

    fn token(secret: &str, sub: &str, exp_offset: i64, aud: Option<&str>) -> String {
        let exp = (chrono::Utc::now().timestamp() + exp_offset) as usize;
        let mut claims = serde_json::json!({ "sub": sub, "exp": exp, "email": "a@b.test" });
        if let Some(aud) = aud {
            claims["aud"] = serde_json::json!(aud);
        }
        encode(
            &Header::default(),
            &claims,
            &EncodingKey::from_secret(secret.as_bytes()),
        )
        .unwrap()
    }

    #[test]
    fn test_valid_token_yields_subject() {
        let verifier = TokenVerifier::new("secret", None);
        let claims = verifier.verify(&token("secret", "u1", 600, Some("authenticated"))).unwrap();
        assert_eq!(claims.sub, "u1");
        assert_eq!(claims.email.as_deref(), Some("a@b.test"));
    }

    #[test]
    fn test_wrong_secret_is_rejected() {
        let verifier = TokenVerifier::new("secret", None);
        assert!(verifier.verify(&token("other", "u1", 600, None)).is_err());
    }

    #[test]
    fn test_expired_token_is_rejected() {
        let verifier = TokenVerifier::new("secret", None);
        assert!(verifier.verify(&token("secret", "u1", -3600, None)).is_err());
    }

    #[test]
    fn test_audience_is_enforced_when_configured() {
        let verifier = TokenVerifier::new("secret", Some("authenticated"));
        assert!(verifier.verify(&token("secret", "u1", 600, Some("authenticated"))).is_ok());
        assert!(verifier.verify(&token("secret", "u1", 600, Some("anon"))).is_err());
    }

    #[test]
    fn test_actor_scopes() {
        let actor = Actor {
            user_id: "u1".to_string(),
            email: None,
            role: Role::Customer,
            scope: Scope::Own,
        };
        assert!(actor.covers_owner("u1"));
        assert!(!actor.covers_owner("u2"));
        assert!(!actor.covers_assignee(Some("u1")));
        assert_eq!(actor.owner_filter().as_deref(), Some("u1"));

        let staff = Actor {
            role: Role::Staff,
            scope: Scope::Assigned,
            ..actor
        };
        assert!(staff.covers_assignee(Some("u1")));
        assert!(!staff.covers_assignee(None));
    }
}
