use std::sync::Arc;
use std::time::Duration as StdDuration;

use auth::Claims;
use auth::PasswordHasher;
use auth::SignOptions;
use auth::TokenService;
use auth::VerifyOptions;
use chrono::Duration;
use uuid::Uuid;

use crate::domain::auth::cache::PrincipalCache;
use crate::domain::auth::errors::AuthError;
use crate::domain::user::models::User;
use crate::domain::user::models::UserIdentifier;
use crate::domain::user::ports::UserRepository;

/// Lifetime of action tokens (e-mail confirmation, password recovery).
/// Deliberately much shorter than a session.
fn action_token_ttl() -> Duration {
    Duration::hours(1)
}

/// Authentication orchestration: token issue/verify, credential checks and
/// cache-backed principal resolution.
///
/// Session tokens are signed with the service secret; action tokens carry a
/// distinct secret so a leaked session secret cannot mint recovery links
/// and vice versa.
pub struct AuthService<R>
where
    R: UserRepository,
{
    tokens: TokenService,
    action_secret: Vec<u8>,
    cache: PrincipalCache,
    repository: Arc<R>,
    password_hasher: PasswordHasher,
}

impl<R> AuthService<R>
where
    R: UserRepository,
{
    /// Create the service.
    ///
    /// # Arguments
    /// * `repository` - user store, used only for principal resolution
    /// * `session_secret` / `action_secret` - signing keys per token purpose
    /// * `session_ttl` - session token lifetime
    /// * `principal_ttl` - principal cache entry lifetime
    pub fn new(
        repository: Arc<R>,
        session_secret: &[u8],
        action_secret: &[u8],
        session_ttl: Duration,
        principal_ttl: StdDuration,
    ) -> Self {
        Self {
            tokens: TokenService::new(session_secret, session_ttl),
            action_secret: action_secret.to_vec(),
            cache: PrincipalCache::new(principal_ttl),
            repository,
            password_hasher: PasswordHasher::new(),
        }
    }

    /// Issue a session token for a user id with the default options.
    pub fn issue_session(&self, user_id: Uuid) -> Result<String, AuthError> {
        let token = self
            .tokens
            .issue(&user_id.to_string(), &SignOptions::default())?;
        Ok(token)
    }

    /// Issue a short-lived action token under the action secret.
    ///
    /// The subject is whatever the action needs to carry: a user id for
    /// password recovery, the new address for e-mail confirmation.
    pub fn issue_action_token(&self, subject: &str) -> Result<String, AuthError> {
        let opts = SignOptions {
            secret: Some(self.action_secret.clone()),
            ttl: Some(action_token_ttl()),
        };
        let token = self.tokens.issue(subject, &opts)?;
        Ok(token)
    }

    /// Verify a session token.
    ///
    /// # Errors
    /// * `ExpiredToken` / `DisabledToken` / `InvalidToken` - verification outcome
    /// * `Verification` - unexpected JWT library failure
    pub fn verify_session(&self, token: &str) -> Result<Claims, AuthError> {
        let claims = self.tokens.verify(token, &VerifyOptions::default())?;
        Ok(claims)
    }

    /// Verify an action token under the action secret.
    pub fn verify_action_token(&self, token: &str) -> Result<Claims, AuthError> {
        let opts = VerifyOptions {
            secret: Some(self.action_secret.clone()),
        };
        let claims = self.tokens.verify(token, &opts)?;
        Ok(claims)
    }

    /// Decode a token without signature verification.
    ///
    /// # Errors
    /// * `InvalidToken` - the token does not parse
    pub fn decode(&self, token: &str) -> Result<Claims, AuthError> {
        let claims = self.tokens.decode(token)?;
        Ok(claims)
    }

    /// Resolve verified claims into a principal.
    ///
    /// Cache first; on a miss the user entity is loaded (management
    /// included, password excluded) and cached. A cache hit is served
    /// without any freshness check: an account disabled after caching
    /// stays resolvable until the entry expires.
    ///
    /// # Errors
    /// * `NotAuthenticated` - malformed subject, unknown user, or a store
    ///   failure (logged; resolution never exposes store internals)
    pub async fn resolve_principal(&self, claims: &Claims) -> Result<User, AuthError> {
        let user_id =
            Uuid::parse_str(&claims.sub).map_err(|_| AuthError::NotAuthenticated)?;

        if let Some(principal) = self.cache.get(&user_id).await {
            return Ok(principal);
        }

        let user = self
            .repository
            .find_one(&UserIdentifier::Id(user_id))
            .await
            .map_err(|e| {
                tracing::error!(user_id = %user_id, error = %e, "Principal lookup failed");
                AuthError::NotAuthenticated
            })?
            .ok_or(AuthError::NotAuthenticated)?;

        self.cache.insert(user.clone()).await;

        Ok(user)
    }

    /// Check a plaintext password against a stored digest.
    ///
    /// # Errors
    /// * `InvalidLogin` - the password does not match
    /// * `Verification` - the stored digest is unusable
    pub fn check_credentials(&self, password: &str, digest: &str) -> Result<(), AuthError> {
        let matches = self
            .password_hasher
            .verify(password, digest)
            .map_err(|e| AuthError::Verification(e.to_string()))?;

        if matches {
            Ok(())
        } else {
            Err(AuthError::InvalidLogin)
        }
    }
}

#[cfg(test)]
mod tests {
    use async_trait::async_trait;
    use chrono::Utc;
    use mockall::mock;

    use super::*;
    use crate::domain::user::errors::UserError;
    use crate::domain::user::models::CreateUserCommand;
    use crate::domain::user::models::EnableUserCommand;
    use crate::domain::user::models::SignInCredentials;
    use crate::domain::user::models::UserFilters;
    use crate::domain::user::models::UserPage;
    use crate::domain::user::models::UserPatch;

    mock! {
        pub TestUserRepository {}

        #[async_trait]
        impl UserRepository for TestUserRepository {
            async fn create(&self, command: CreateUserCommand) -> Result<User, UserError>;
            async fn find_credentials(&self, identifier: &UserIdentifier) -> Result<Option<SignInCredentials>, UserError>;
            async fn find_one(&self, identifier: &UserIdentifier) -> Result<Option<User>, UserError>;
            async fn list(&self, filters: &UserFilters) -> Result<UserPage, UserError>;
            async fn update(&self, identifier: &UserIdentifier, patch: UserPatch) -> Result<User, UserError>;
            async fn disable(&self, identifier: &UserIdentifier) -> Result<User, UserError>;
            async fn enable(&self, identifier: &UserIdentifier, command: EnableUserCommand) -> Result<User, UserError>;
        }
    }

    const SESSION_SECRET: &[u8] = b"session_secret_at_least_32_bytes!";
    const ACTION_SECRET: &[u8] = b"action__secret_at_least_32_bytes!";

    fn service_with(
        repository: MockTestUserRepository,
        principal_ttl: StdDuration,
    ) -> AuthService<MockTestUserRepository> {
        AuthService::new(
            Arc::new(repository),
            SESSION_SECRET,
            ACTION_SECRET,
            Duration::days(1),
            principal_ttl,
        )
    }

    fn user(id: Uuid) -> User {
        User {
            id,
            department_id: Uuid::new_v4(),
            name: "Test User".to_string(),
            cpf: "01234567890".to_string(),
            email: Some("test@example.com".to_string()),
            phone: None,
            is_active: true,
            is_verified: true,
            created_at: Utc::now(),
            updated_at: Utc::now(),
            deleted_at: None,
            management: None,
        }
    }

    #[tokio::test]
    async fn test_session_roundtrip() {
        let service = service_with(MockTestUserRepository::new(), StdDuration::from_secs(60));
        let user_id = Uuid::new_v4();

        let token = service.issue_session(user_id).unwrap();
        let claims = service.verify_session(&token).unwrap();

        assert_eq!(claims.sub, user_id.to_string());
    }

    #[tokio::test]
    async fn test_action_token_rejected_as_session() {
        let service = service_with(MockTestUserRepository::new(), StdDuration::from_secs(60));

        let token = service.issue_action_token("someone@example.com").unwrap();

        assert!(matches!(
            service.verify_session(&token),
            Err(AuthError::InvalidToken)
        ));
        assert!(service.verify_action_token(&token).is_ok());
    }

    #[tokio::test]
    async fn test_decode_is_informational_only() {
        let service = service_with(MockTestUserRepository::new(), StdDuration::from_secs(60));

        // Signed with the action secret, so a session verify rejects it,
        // but an informational decode still reads the claims.
        let token = service.issue_action_token("someone@example.com").unwrap();

        let claims = service.decode(&token).unwrap();
        assert_eq!(claims.sub, "someone@example.com");
        assert!(matches!(
            service.decode("garbage"),
            Err(AuthError::InvalidToken)
        ));
    }

    #[tokio::test]
    async fn test_verify_garbage_token() {
        let service = service_with(MockTestUserRepository::new(), StdDuration::from_secs(60));

        assert!(matches!(
            service.verify_session("garbage"),
            Err(AuthError::InvalidToken)
        ));
    }

    #[tokio::test]
    async fn test_resolve_principal_hits_cache_second_time() {
        let user_id = Uuid::new_v4();
        let mut repository = MockTestUserRepository::new();

        // Exactly one store round trip for two resolutions within the TTL.
        repository
            .expect_find_one()
            .times(1)
            .returning(move |_| Ok(Some(user(user_id))));

        let service = service_with(repository, StdDuration::from_secs(60));
        let claims = Claims::for_subject(user_id.to_string(), Duration::hours(1));

        let first = service.resolve_principal(&claims).await.unwrap();
        let second = service.resolve_principal(&claims).await.unwrap();

        assert_eq!(first.id, user_id);
        assert_eq!(second.id, user_id);
    }

    #[tokio::test]
    async fn test_resolve_principal_reloads_after_expiry() {
        let user_id = Uuid::new_v4();
        let mut repository = MockTestUserRepository::new();

        repository
            .expect_find_one()
            .times(2)
            .returning(move |_| Ok(Some(user(user_id))));

        let service = service_with(repository, StdDuration::from_millis(20));
        let claims = Claims::for_subject(user_id.to_string(), Duration::hours(1));

        service.resolve_principal(&claims).await.unwrap();
        tokio::time::sleep(StdDuration::from_millis(40)).await;
        service.resolve_principal(&claims).await.unwrap();
    }

    #[tokio::test]
    async fn test_resolve_principal_unknown_user() {
        let mut repository = MockTestUserRepository::new();
        repository.expect_find_one().times(1).returning(|_| Ok(None));

        let service = service_with(repository, StdDuration::from_secs(60));
        let claims = Claims::for_subject(Uuid::new_v4().to_string(), Duration::hours(1));

        assert!(matches!(
            service.resolve_principal(&claims).await,
            Err(AuthError::NotAuthenticated)
        ));
    }

    #[tokio::test]
    async fn test_resolve_principal_malformed_subject() {
        let repository = MockTestUserRepository::new();

        let service = service_with(repository, StdDuration::from_secs(60));
        let claims = Claims::for_subject("not-a-uuid", Duration::hours(1));

        assert!(matches!(
            service.resolve_principal(&claims).await,
            Err(AuthError::NotAuthenticated)
        ));
    }

    #[tokio::test]
    async fn test_check_credentials() {
        let service = service_with(MockTestUserRepository::new(), StdDuration::from_secs(60));

        let hasher = PasswordHasher::new();
        let digest = hasher.hash("correct horse").unwrap();

        assert!(service.check_credentials("correct horse", &digest).is_ok());
        assert!(matches!(
            service.check_credentials("wrong", &digest),
            Err(AuthError::InvalidLogin)
        ));
    }
}
