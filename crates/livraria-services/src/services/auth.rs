//! Authentication: local credential login, Google sign-in and JWT issuance.
//!
//! Tokens are HS256, signed with the configured secret. Google sign-in
//! verifies the ID token against Google's tokeninfo endpoint and checks the
//! audience before trusting any claim in it.

use chrono::Utc;
use jsonwebtoken::{decode, encode, DecodingKey, EncodingKey, Header, Validation};
use serde::{Deserialize, Serialize};
use sqlx::PgPool;
use uuid::Uuid;

use livraria_core::config::AuthConfig;
use livraria_core::models::User;
use livraria_core::AppError;
use livraria_db::{with_transaction, RoleRepository, UserRepository};

const GOOGLE_TOKENINFO_URL: &str = "https://oauth2.googleapis.com/tokeninfo";
const DEFAULT_ROLE: &str = "USER";

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Claims {
    /// User id
    pub sub: Uuid,
    pub email: String,
    pub roles: Vec<String>,
    pub exp: i64,
}

#[derive(Debug, Deserialize)]
struct GoogleTokenInfo {
    aud: String,
    sub: String,
    email: String,
    #[serde(default)]
    name: Option<String>,
    #[serde(default)]
    picture: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct AuthenticatedUser {
    pub token: String,
    pub user: User,
}

#[derive(Clone)]
pub struct AuthService {
    pool: PgPool,
    users: UserRepository,
    roles: RoleRepository,
    config: AuthConfig,
    http: reqwest::Client,
    tokeninfo_url: String,
}

impl AuthService {
    pub fn new(
        pool: PgPool,
        users: UserRepository,
        roles: RoleRepository,
        config: AuthConfig,
    ) -> Result<Self, AppError> {
        let http = reqwest::Client::builder()
            .timeout(std::time::Duration::from_secs(10))
            .build()
            .map_err(|e| AppError::Internal(format!("Failed to build HTTP client: {}", e)))?;

        Ok(Self {
            pool,
            users,
            roles,
            config,
            http,
            tokeninfo_url: GOOGLE_TOKENINFO_URL.to_string(),
        })
    }

    /// Local email/password login.
    #[tracing::instrument(skip(self, password), fields(email = %email))]
    pub async fn login(&self, email: &str, password: &str) -> Result<AuthenticatedUser, AppError> {
        let record = self
            .users
            .find_by_email(email)
            .await?
            .ok_or_else(|| AppError::Unauthorized("Invalid credentials".to_string()))?;

        // Google-provisioned accounts carry no local hash.
        let hash = record
            .password_hash
            .as_deref()
            .ok_or_else(|| AppError::Unauthorized("Invalid credentials".to_string()))?;

        let valid = bcrypt::verify(password, hash)
            .map_err(|e| AppError::Internal(format!("Password verification failed: {}", e)))?;
        if !valid {
            return Err(AppError::Unauthorized("Invalid credentials".to_string()));
        }

        let roles = self.users.roles_of(record.id).await?;
        let user = User { record, roles };
        let token = self.issue_token(&user)?;

        tracing::info!(user_id = %user.record.id, "User logged in");
        Ok(AuthenticatedUser { token, user })
    }

    /// Google sign-in. Verifies the ID token remotely, then finds the linked
    /// account or provisions one with the default role.
    #[tracing::instrument(skip(self, id_token))]
    pub async fn google_login(&self, id_token: &str) -> Result<AuthenticatedUser, AppError> {
        let info = self.verify_google_token(id_token).await?;

        let record = match self.users.find_by_email(&info.email).await? {
            Some(record) => record,
            None => self.provision_google_user(&info).await?,
        };

        let roles = self.users.roles_of(record.id).await?;
        let user = User { record, roles };
        let token = self.issue_token(&user)?;

        tracing::info!(user_id = %user.record.id, "User logged in via Google");
        Ok(AuthenticatedUser { token, user })
    }

    async fn verify_google_token(&self, id_token: &str) -> Result<GoogleTokenInfo, AppError> {
        let client_id = self
            .config
            .google_client_id
            .as_deref()
            .ok_or_else(|| AppError::Unauthorized("Google sign-in is not enabled".to_string()))?;

        let response = self
            .http
            .get(&self.tokeninfo_url)
            .query(&[("id_token", id_token)])
            .send()
            .await
            .map_err(|e| {
                tracing::warn!(error = %e, "Google token verification request failed");
                AppError::Unauthorized("Failed to verify Google token".to_string())
            })?;

        if !response.status().is_success() {
            return Err(AppError::Unauthorized("Invalid Google token".to_string()));
        }

        let info: GoogleTokenInfo = response
            .json()
            .await
            .map_err(|_| AppError::Unauthorized("Invalid Google token".to_string()))?;

        if info.aud != client_id {
            return Err(AppError::Unauthorized(
                "Google token issued for another application".to_string(),
            ));
        }

        Ok(info)
    }

    /// Create the account and its default role assignment atomically.
    async fn provision_google_user(
        &self,
        info: &GoogleTokenInfo,
    ) -> Result<livraria_core::models::UserRecord, AppError> {
        let role = self
            .roles
            .find_by_name(DEFAULT_ROLE)
            .await?
            .ok_or_else(|| AppError::Internal("Default role is missing".to_string()))?;

        let users = self.users.clone();
        let name = info.name.clone().unwrap_or_else(|| info.email.clone());
        let email = info.email.clone();
        let google_id = info.sub.clone();
        let picture = info.picture.clone();
        let role_id = role.id;

        with_transaction(&self.pool, move |tx| {
            Box::pin(async move {
                let record = users
                    .insert_tx(
                        tx,
                        &name,
                        &email,
                        None,
                        Some(&google_id),
                        picture.as_deref(),
                    )
                    .await?;
                users.replace_roles_tx(tx, record.id, &[role_id]).await?;
                Ok(record)
            })
        })
        .await
    }

    pub fn issue_token(&self, user: &User) -> Result<String, AppError> {
        let exp = Utc::now() + chrono::Duration::hours(self.config.jwt_expiry_hours);
        let claims = Claims {
            sub: user.record.id,
            email: user.record.email.clone(),
            roles: user.roles.iter().map(|r| r.name.clone()).collect(),
            exp: exp.timestamp(),
        };

        encode(
            &Header::default(),
            &claims,
            &EncodingKey::from_secret(self.config.jwt_secret.as_bytes()),
        )
        .map_err(|e| AppError::Internal(format!("Failed to sign token: {}", e)))
    }

    pub fn verify_token(&self, token: &str) -> Result<Claims, AppError> {
        let data = decode::<Claims>(
            token,
            &DecodingKey::from_secret(self.config.jwt_secret.as_bytes()),
            &Validation::default(),
        )
        .map_err(|e| match e.kind() {
            jsonwebtoken::errors::ErrorKind::ExpiredSignature => {
                AppError::Unauthorized("Token has expired".to_string())
            }
            _ => AppError::Unauthorized("Invalid or expired token".to_string()),
        })?;

        Ok(data.claims)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use jsonwebtoken::{encode, EncodingKey, Header};

    fn auth_config() -> AuthConfig {
        AuthConfig {
            jwt_secret: "test-secret-key-min-32-characters-long".to_string(),
            jwt_expiry_hours: 1,
            google_client_id: Some("client-123.apps.googleusercontent.com".to_string()),
        }
    }

    fn verify(token: &str, config: &AuthConfig) -> Result<Claims, AppError> {
        let data = decode::<Claims>(
            token,
            &DecodingKey::from_secret(config.jwt_secret.as_bytes()),
            &Validation::default(),
        )
        .map_err(|_| AppError::Unauthorized("invalid".to_string()))?;
        Ok(data.claims)
    }

    #[test]
    fn issued_claims_round_trip() {
        let config = auth_config();
        let claims = Claims {
            sub: Uuid::new_v4(),
            email: "a@example.com".to_string(),
            roles: vec!["ADMIN".to_string()],
            exp: (Utc::now() + chrono::Duration::hours(1)).timestamp(),
        };

        let token = encode(
            &Header::default(),
            &claims,
            &EncodingKey::from_secret(config.jwt_secret.as_bytes()),
        )
        .expect("encode");

        let decoded = verify(&token, &config).expect("valid token");
        assert_eq!(decoded.sub, claims.sub);
        assert_eq!(decoded.roles, vec!["ADMIN".to_string()]);
    }

    #[test]
    fn expired_token_is_rejected() {
        let config = auth_config();
        let claims = Claims {
            sub: Uuid::new_v4(),
            email: "a@example.com".to_string(),
            roles: vec![],
            exp: (Utc::now() - chrono::Duration::hours(2)).timestamp(),
        };

        let token = encode(
            &Header::default(),
            &claims,
            &EncodingKey::from_secret(config.jwt_secret.as_bytes()),
        )
        .expect("encode");

        assert!(verify(&token, &config).is_err());
    }

    #[test]
    fn wrong_secret_is_rejected() {
        let config = auth_config();
        let claims = Claims {
            sub: Uuid::new_v4(),
            email: "a@example.com".to_string(),
            roles: vec![],
            exp: (Utc::now() + chrono::Duration::hours(1)).timestamp(),
        };

        let token = encode(
            &Header::default(),
            &claims,
            &EncodingKey::from_secret(b"some-other-secret-also-32-chars-xx"),
        )
        .expect("encode");

        assert!(verify(&token, &config).is_err());
    }
}
