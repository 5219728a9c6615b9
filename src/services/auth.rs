//! Authentication service implementation
//!
//! This service owns email/password accounts: sign-up, sign-in, sign-out,
//! password reset, token verification and the auth-state broadcast. Session
//! tokens are HS256 JWTs that are only honoured while their session record
//! is present in Redis.

use base64::{engine::general_purpose::STANDARD as B64, Engine as _};
use chrono::{Duration, Utc};
use jsonwebtoken::{decode, encode, Algorithm, DecodingKey, EncodingKey, Header, Validation};
use pbkdf2::pbkdf2_hmac;
use rand::RngCore;
use serde::{Deserialize, Serialize};
use sha2::Sha256;
use tokio::sync::broadcast;
use tracing::{debug, info, warn};
use uuid::Uuid;

use crate::config::AuthConfig;
use crate::database::repositories::UserRepository;
use crate::models::user::{
    AuthSession, CreateUserRequest, SignInRequest, SignUpRequest, User, UserRole,
};
use crate::services::notification::NotificationService;
use crate::services::sessions::{SessionRecord, SessionStore};
use crate::services::user::validate_profile_fields;
use crate::utils::errors::{EventifyError, Result};
use crate::utils::helpers::{generate_random_string, is_valid_email, is_valid_password, non_blank, normalize_email};
use crate::utils::logging::log_user_action;

const HASH_SCHEME: &str = "pbkdf2-sha256";
const SALT_LEN: usize = 16;
const KEY_LEN: usize = 32;
const RESET_TOKEN_LEN: usize = 48;
const INVALID_CREDENTIALS: &str = "Invalid email or password";

/// Token claims
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Claims {
    pub sub: Uuid,
    pub sid: Uuid,
    pub role: String,
    pub iat: i64,
    pub exp: i64,
}

/// Broadcast whenever an account's signed-in state changes
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum AuthStateChange {
    SignedUp { user_id: Uuid },
    SignedIn { user_id: Uuid },
    SignedOut { user_id: Uuid },
    PasswordReset { user_id: Uuid },
}

impl AuthStateChange {
    pub fn user_id(&self) -> Uuid {
        match self {
            AuthStateChange::SignedUp { user_id }
            | AuthStateChange::SignedIn { user_id }
            | AuthStateChange::SignedOut { user_id }
            | AuthStateChange::PasswordReset { user_id } => *user_id,
        }
    }
}

/// Authenticated caller of a request
#[derive(Debug, Clone)]
pub struct AuthContext {
    pub user: User,
    pub session_id: Uuid,
}

impl AuthContext {
    pub fn user_id(&self) -> Uuid {
        self.user.id
    }

    pub fn require_admin(&self) -> Result<()> {
        if !self.user.is_admin() {
            return Err(EventifyError::PermissionDenied("Admin access required".to_string()));
        }
        Ok(())
    }

    pub fn require_student(&self) -> Result<()> {
        if !self.user.is_student() {
            return Err(EventifyError::PermissionDenied("Student access required".to_string()));
        }
        Ok(())
    }
}

/// Hash a password as `pbkdf2-sha256$<iterations>$<salt>$<key>`
pub fn hash_password(password: &str, iterations: u32) -> String {
    let mut salt = [0u8; SALT_LEN];
    rand::thread_rng().fill_bytes(&mut salt);

    let mut key = [0u8; KEY_LEN];
    pbkdf2_hmac::<Sha256>(password.as_bytes(), &salt, iterations, &mut key);

    format!("{}${}${}${}", HASH_SCHEME, iterations, B64.encode(salt), B64.encode(key))
}

/// Check a password against a stored hash; malformed hashes never match
pub fn verify_password(password: &str, stored: &str) -> bool {
    let parts: Vec<&str> = stored.split('$').collect();
    let [scheme, iterations, salt, expected] = parts.as_slice() else {
        return false;
    };
    if *scheme != HASH_SCHEME {
        return false;
    }

    let (Ok(iterations), Ok(salt), Ok(expected)) = (
        iterations.parse::<u32>(),
        B64.decode(salt),
        B64.decode(expected),
    ) else {
        return false;
    };

    let mut key = vec![0u8; expected.len()];
    pbkdf2_hmac::<Sha256>(password.as_bytes(), &salt, iterations.max(1), &mut key);

    // Compare without short-circuiting on the first differing byte
    key.len() == expected.len()
        && key.iter().zip(expected.iter()).fold(0u8, |acc, (a, b)| acc | (a ^ b)) == 0
}

/// Authentication service for accounts and sessions
#[derive(Clone)]
pub struct AuthService {
    users: UserRepository,
    sessions: SessionStore,
    notifications: NotificationService,
    config: AuthConfig,
    encoding_key: EncodingKey,
    decoding_key: DecodingKey,
    changes: broadcast::Sender<AuthStateChange>,
}

impl AuthService {
    pub fn new(
        users: UserRepository,
        sessions: SessionStore,
        notifications: NotificationService,
        config: AuthConfig,
    ) -> Self {
        let encoding_key = EncodingKey::from_secret(config.jwt_secret.as_bytes());
        let decoding_key = DecodingKey::from_secret(config.jwt_secret.as_bytes());
        let (changes, _) = broadcast::channel(64);

        Self {
            users,
            sessions,
            notifications,
            config,
            encoding_key,
            decoding_key,
            changes,
        }
    }

    /// Receive every auth state change from now on
    pub fn subscribe(&self) -> broadcast::Receiver<AuthStateChange> {
        self.changes.subscribe()
    }

    fn publish(&self, change: AuthStateChange) {
        // No subscribers is fine
        let _ = self.changes.send(change);
    }

    /// Role granted to a new account with this email
    pub fn role_for_email(&self, email: &str) -> UserRole {
        if self.config.admin_emails.iter().any(|admin| admin.eq_ignore_ascii_case(email)) {
            UserRole::Admin
        } else {
            UserRole::Student
        }
    }

    /// Create an account and sign it in
    pub async fn sign_up(&self, request: SignUpRequest) -> Result<AuthSession> {
        let email = normalize_email(&request.email);
        let role = self.role_for_email(&email);

        if !is_valid_email(&email) {
            return Err(EventifyError::InvalidInput("Please enter a valid email address".to_string()));
        }
        if !is_valid_password(&request.password) {
            return Err(EventifyError::InvalidInput(
                "Password must be at least 8 characters with at least one letter and one digit".to_string(),
            ));
        }
        validate_profile_fields(
            &request.display_name,
            request.student_id.as_deref(),
            request.session.as_deref(),
            request.phone.as_deref(),
            role,
        )?;

        if self.users.find_by_email(&email).await?.is_some() {
            return Err(EventifyError::DuplicateAccount { email });
        }

        let display_name = request.display_name.trim().to_string();
        let student_id = non_blank(request.student_id.as_deref());
        let session = non_blank(request.session.as_deref());
        let profile_complete = match role {
            UserRole::Student => student_id.is_some() && session.is_some(),
            UserRole::Admin => true,
        };

        let user = self.users.create(CreateUserRequest {
            display_name,
            email,
            role,
            student_id,
            session,
            phone: non_blank(request.phone.as_deref()),
            password_hash: hash_password(&request.password, self.config.pbkdf2_iterations),
            profile_complete,
        }).await?;

        info!(user_id = %user.id, role = %user.role, "Account created");
        log_user_action(user.id, "sign_up", Some(&user.role));
        self.publish(AuthStateChange::SignedUp { user_id: user.id });

        self.issue_session(user).await
    }

    pub async fn sign_in(&self, request: SignInRequest) -> Result<AuthSession> {
        let email = normalize_email(&request.email);

        let Some(user) = self.users.find_by_email(&email).await? else {
            debug!("Sign-in for unknown email");
            return Err(EventifyError::Authentication(INVALID_CREDENTIALS.to_string()));
        };

        if !verify_password(&request.password, &user.password_hash) {
            warn!(user_id = %user.id, "Sign-in with wrong password");
            return Err(EventifyError::Authentication(INVALID_CREDENTIALS.to_string()));
        }

        log_user_action(user.id, "sign_in", None);
        self.publish(AuthStateChange::SignedIn { user_id: user.id });

        self.issue_session(user).await
    }

    async fn issue_session(&self, user: User) -> Result<AuthSession> {
        let now = Utc::now();
        let expires_at = now + Duration::hours(self.config.session_ttl_hours as i64);
        let record = SessionRecord {
            session_id: Uuid::new_v4(),
            user_id: user.id,
            role: user.role.clone(),
            created_at: now,
            expires_at,
        };

        let claims = Claims {
            sub: user.id,
            sid: record.session_id,
            role: user.role.clone(),
            iat: now.timestamp(),
            exp: expires_at.timestamp(),
        };
        let token = encode(&Header::new(Algorithm::HS256), &claims, &self.encoding_key)?;

        self.sessions.create_session(&record).await?;

        Ok(AuthSession { token, expires_at, user })
    }

    /// Decode and check a token's signature and expiry
    pub fn decode_token(&self, token: &str) -> Result<Claims> {
        let validation = Validation::new(Algorithm::HS256);
        let data = decode::<Claims>(token, &self.decoding_key, &validation)?;
        Ok(data.claims)
    }

    /// Resolve a bearer token to the signed-in user
    pub async fn authenticate(&self, token: &str) -> Result<AuthContext> {
        let claims = self.decode_token(token)?;

        let session = self.sessions.get_session(claims.sid).await?
            .ok_or_else(|| EventifyError::Authentication("Session expired or signed out".to_string()))?;
        if session.user_id != claims.sub {
            return Err(EventifyError::Authentication("Session does not match token".to_string()));
        }

        let user = self.users.find_by_id(claims.sub).await?
            .ok_or_else(|| EventifyError::Authentication("Account no longer exists".to_string()))?;

        Ok(AuthContext { user, session_id: claims.sid })
    }

    /// Revoke the caller's session
    pub async fn sign_out(&self, context: &AuthContext) -> Result<()> {
        self.sessions.delete_session(context.session_id).await?;

        log_user_action(context.user.id, "sign_out", None);
        self.publish(AuthStateChange::SignedOut { user_id: context.user.id });
        Ok(())
    }

    /// Email a reset link when the account exists
    ///
    /// Succeeds for unknown addresses as well so callers cannot probe for
    /// accounts.
    pub async fn request_password_reset(&self, email: &str) -> Result<()> {
        let email = normalize_email(email);
        if !is_valid_email(&email) {
            return Err(EventifyError::InvalidInput("Please enter a valid email address".to_string()));
        }

        let Some(user) = self.users.find_by_email(&email).await? else {
            debug!("Password reset requested for unknown email");
            return Ok(());
        };

        let token = generate_random_string(RESET_TOKEN_LEN);
        let ttl_minutes = self.config.password_reset_ttl_minutes;
        self.sessions.store_reset_token(&token, user.id, ttl_minutes * 60).await?;

        if let Err(e) = self.notifications.send_password_reset(&user, &token, ttl_minutes).await {
            warn!(user_id = %user.id, error = %e, "Password reset email not delivered");
        }

        log_user_action(user.id, "password_reset_requested", None);
        Ok(())
    }

    /// Set a new password using a reset token; the token is single-use
    pub async fn confirm_password_reset(&self, token: &str, new_password: &str) -> Result<()> {
        if !is_valid_password(new_password) {
            return Err(EventifyError::InvalidInput(
                "Password must be at least 8 characters with at least one letter and one digit".to_string(),
            ));
        }

        let user_id = self.sessions.consume_reset_token(token).await?
            .ok_or_else(|| EventifyError::Authentication("Invalid or expired reset token".to_string()))?;

        let hash = hash_password(new_password, self.config.pbkdf2_iterations);
        self.users.update_password(user_id, &hash).await?;

        log_user_action(user_id, "password_reset", None);
        self.publish(AuthStateChange::PasswordReset { user_id });
        Ok(())
    }
}
