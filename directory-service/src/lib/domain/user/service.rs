use std::sync::Arc;

use async_trait::async_trait;
use auth::PasswordHasher;
use rand::distributions::Alphanumeric;
use rand::Rng;
use uuid::Uuid;

use crate::domain::auth::errors::AuthError;
use crate::domain::auth::service::AuthService;
use crate::domain::user::errors::UserError;
use crate::domain::user::models::CreateUserCommand;
use crate::domain::user::models::EnableUserCommand;
use crate::domain::user::models::RegisterUserCommand;
use crate::domain::user::models::UpdateMeCommand;
use crate::domain::user::models::UpdateUserCommand;
use crate::domain::user::models::User;
use crate::domain::user::models::UserFilters;
use crate::domain::user::models::UserIdentifier;
use crate::domain::user::models::UserPage;
use crate::domain::user::models::UserPatch;
use crate::domain::user::ports::Mailer;
use crate::domain::user::ports::UserRepository;
use crate::domain::user::ports::UserServicePort;

const SERVICE_TITLE: &str = "Directory Service";
const GENERATED_PASSWORD_LEN: usize = 12;

/// Application service for user operations.
///
/// Owns plaintext password handling (generation, hashing) and the outbound
/// mail flows; relationship consistency is the repository's concern.
pub struct UserService<R, M>
where
    R: UserRepository,
    M: Mailer,
{
    repository: Arc<R>,
    mailer: Arc<M>,
    auth: Arc<AuthService<R>>,
    password_hasher: PasswordHasher,
}

impl<R, M> UserService<R, M>
where
    R: UserRepository,
    M: Mailer,
{
    pub fn new(repository: Arc<R>, mailer: Arc<M>, auth: Arc<AuthService<R>>) -> Self {
        Self {
            repository,
            mailer,
            auth,
            password_hasher: PasswordHasher::new(),
        }
    }

    /// Accounts never pick their first password: it is generated here and
    /// delivered by mail.
    fn generate_password(&self) -> String {
        let random: String = rand::thread_rng()
            .sample_iter(&Alphanumeric)
            .take(GENERATED_PASSWORD_LEN)
            .map(char::from)
            .collect();

        format!("#{}", random)
    }

    fn hash_password(&self, password: &str) -> Result<String, UserError> {
        self.password_hasher
            .hash(password)
            .map_err(|e| UserError::Internal(e.to_string()))
    }

    /// Deliver a mail without letting a failure escalate to the caller.
    async fn send_mail(&self, to: &str, subject: &str, html_body: &str) {
        if let Err(e) = self.mailer.send(to, subject, html_body).await {
            tracing::error!(to = %to, subject = %subject, error = %e, "Failed to send mail");
        }
    }

    /// Start the e-mail confirmation round trip: the new address is only
    /// persisted once its owner follows the mailed link.
    async fn send_email_confirmation(&self, email: &str, frontend_url: &str) {
        let token = match self.auth.issue_action_token(email) {
            Ok(token) => token,
            Err(e) => {
                tracing::error!(error = %e, "Failed to issue e-mail confirmation token");
                return;
            }
        };

        self.send_mail(
            email,
            &format!("{} - Email Update", SERVICE_TITLE),
            &format!("<a href=\"{}/{}\"> Confirm </a>", frontend_url, token),
        )
        .await;
    }
}

#[async_trait]
impl<R, M> UserServicePort for UserService<R, M>
where
    R: UserRepository,
    M: Mailer,
{
    async fn register(&self, command: RegisterUserCommand) -> Result<User, UserError> {
        let password = self.generate_password();
        let password_hash = self.hash_password(&password)?;

        let user = self
            .repository
            .create(CreateUserCommand {
                department_id: command.department_id,
                name: command.name,
                cpf: command.cpf,
                email: Some(command.email.clone()),
                phone: command.phone,
                password_hash,
                is_manager: command.is_manager,
            })
            .await?;

        self.send_mail(
            &command.email,
            &format!("{}: Registration Complete", SERVICE_TITLE),
            &format!("<p>Your temporary password: {}</p>", password),
        )
        .await;

        Ok(user)
    }

    async fn sign_in(&self, login: &str, password: &str) -> Result<String, UserError> {
        let credentials = self
            .repository
            .find_credentials(&UserIdentifier::Email(login.to_string()))
            .await?
            .ok_or(AuthError::InvalidLogin)?;

        self.auth
            .check_credentials(password, &credentials.password_hash)?;

        let token = self.auth.issue_session(credentials.id)?;

        Ok(token)
    }

    async fn read_one(&self, identifier: &UserIdentifier) -> Result<User, UserError> {
        self.repository
            .find_one(identifier)
            .await?
            .ok_or(UserError::NotFound)
    }

    async fn read_many(&self, filters: &UserFilters) -> Result<UserPage, UserError> {
        self.repository.list(filters).await
    }

    async fn update(
        &self,
        identifier: &UserIdentifier,
        command: UpdateUserCommand,
    ) -> Result<User, UserError> {
        if command.is_empty() {
            return Err(UserError::NoProvidedData);
        }

        let mut patch = UserPatch {
            name: command.name,
            cpf: command.cpf,
            email: command.email.clone(),
            phone: command.phone,
            password_hash: None,
            is_verified: command.is_verified,
            department_id: command.department_id,
            is_manager: command.is_manager,
        };

        let mut generated_password = None;
        if command.reset_password {
            let password = self.generate_password();
            patch.password_hash = Some(self.hash_password(&password)?);
            // The mailed password has not been seen by its owner yet.
            patch.is_verified = Some(false);
            generated_password = Some(password);
        }

        let user = self.repository.update(identifier, patch).await?;

        if command.email.is_some() || generated_password.is_some() {
            let recipient = command.email.as_deref().or(user.email.as_deref());

            if let Some(to) = recipient {
                let mut lines = Vec::new();
                if let Some(email) = &command.email {
                    lines.push(format!("<p>New e-mail: {}</p>", email));
                }
                if let Some(password) = &generated_password {
                    lines.push(format!("<p>New password: {}</p>", password));
                }

                self.send_mail(
                    to,
                    &format!("{} - Account Update", SERVICE_TITLE),
                    &lines.join("\n"),
                )
                .await;
            }
        }

        Ok(user)
    }

    async fn update_me(&self, user: &User, command: UpdateMeCommand) -> Result<User, UserError> {
        if let Some(email) = &command.email {
            if user.email.as_deref() != Some(email.as_str()) {
                self.send_email_confirmation(email, &command.frontend_url)
                    .await;
            }
        }

        let patch = UserPatch {
            name: command.name,
            phone: command.phone,
            ..UserPatch::default()
        };

        // An e-mail-only change carries nothing to persist yet; the address
        // lands via verify_email.
        if patch.is_empty() {
            return Ok(user.clone());
        }

        self.repository
            .update(&UserIdentifier::Id(user.id), patch)
            .await
    }

    async fn verify_email(&self, user: &User, token: &str) -> Result<User, UserError> {
        let claims = self.auth.verify_action_token(token)?;

        self.repository
            .update(
                &UserIdentifier::Id(user.id),
                UserPatch {
                    email: Some(claims.sub),
                    ..UserPatch::default()
                },
            )
            .await
    }

    async fn update_password(
        &self,
        user: &User,
        current_password: &str,
        new_password: &str,
    ) -> Result<User, UserError> {
        let credentials = self
            .repository
            .find_credentials(&UserIdentifier::Id(user.id))
            .await?
            .ok_or(AuthError::InvalidLogin)?;

        self.auth
            .check_credentials(current_password, &credentials.password_hash)?;

        let password_hash = self.hash_password(new_password)?;

        self.repository
            .update(
                &UserIdentifier::Id(user.id),
                UserPatch {
                    password_hash: Some(password_hash),
                    ..UserPatch::default()
                },
            )
            .await
    }

    async fn request_password_recovery(
        &self,
        login: &UserIdentifier,
        frontend_url: &str,
    ) -> Result<(), UserError> {
        let user = self.read_one(login).await?;

        let Some(email) = &user.email else {
            // Nothing to deliver to; the mail path is fire-and-forget, so
            // this is not an error the caller can act on.
            tracing::warn!(user_id = %user.id, "Password recovery requested for user without e-mail");
            return Ok(());
        };

        let token = self.auth.issue_action_token(&user.id.to_string())?;

        self.send_mail(
            email,
            &format!("{} - Password Recovery", SERVICE_TITLE),
            &format!("<a href=\"{}/{}\"> Recover Password </a>", frontend_url, token),
        )
        .await;

        Ok(())
    }

    async fn recover_password(&self, token: &str, new_password: &str) -> Result<(), UserError> {
        let claims = self.auth.verify_action_token(token)?;
        let user_id = Uuid::parse_str(&claims.sub).map_err(|_| AuthError::InvalidToken)?;

        let password_hash = self.hash_password(new_password)?;

        self.repository
            .update(
                &UserIdentifier::Id(user_id),
                UserPatch {
                    password_hash: Some(password_hash),
                    ..UserPatch::default()
                },
            )
            .await?;

        Ok(())
    }

    async fn disable(&self, identifier: &UserIdentifier) -> Result<User, UserError> {
        self.repository.disable(identifier).await
    }

    async fn enable(
        &self,
        identifier: &UserIdentifier,
        command: EnableUserCommand,
    ) -> Result<User, UserError> {
        self.repository.enable(identifier, command).await
    }
}

#[cfg(test)]
mod tests {
    use chrono::Duration;
    use chrono::Utc;
    use mockall::mock;
    use mockall::predicate::*;

    use super::*;
    use crate::domain::user::errors::MailerError;
    use crate::domain::user::models::SignInCredentials;

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

    mock! {
        pub TestMailer {}

        #[async_trait]
        impl Mailer for TestMailer {
            async fn send(&self, to: &str, subject: &str, html_body: &str) -> Result<(), MailerError>;
        }
    }

    const SESSION_SECRET: &[u8] = b"session_secret_at_least_32_bytes!";
    const ACTION_SECRET: &[u8] = b"action__secret_at_least_32_bytes!";

    fn sample_user(id: Uuid, department_id: Uuid) -> User {
        User {
            id,
            department_id,
            name: "Test User".to_string(),
            cpf: "01234567890".to_string(),
            email: Some("test@example.com".to_string()),
            phone: Some("92987654321".to_string()),
            is_active: true,
            is_verified: true,
            created_at: Utc::now(),
            updated_at: Utc::now(),
            deleted_at: None,
            management: None,
        }
    }

    fn build_service(
        repository: MockTestUserRepository,
        mailer: MockTestMailer,
    ) -> UserService<MockTestUserRepository, MockTestMailer> {
        // The auth service gets its own repository mock: principal
        // resolution is not exercised by these tests.
        let auth = Arc::new(AuthService::new(
            Arc::new(MockTestUserRepository::new()),
            SESSION_SECRET,
            ACTION_SECRET,
            Duration::days(1),
            std::time::Duration::from_secs(60),
        ));

        UserService::new(Arc::new(repository), Arc::new(mailer), auth)
    }

    fn auth_handle() -> Arc<AuthService<MockTestUserRepository>> {
        Arc::new(AuthService::new(
            Arc::new(MockTestUserRepository::new()),
            SESSION_SECRET,
            ACTION_SECRET,
            Duration::days(1),
            std::time::Duration::from_secs(60),
        ))
    }

    #[tokio::test]
    async fn test_register_hashes_generated_password() {
        let department_id = Uuid::new_v4();
        let mut repository = MockTestUserRepository::new();
        let mut mailer = MockTestMailer::new();

        repository
            .expect_create()
            .withf(|command| {
                command.password_hash.starts_with("$argon2") && command.is_manager
            })
            .times(1)
            .returning(move |command| {
                let mut user = sample_user(Uuid::new_v4(), command.department_id);
                user.email = command.email;
                Ok(user)
            });

        mailer
            .expect_send()
            .withf(|to, subject, body| {
                to == "new@example.com"
                    && subject.contains("Registration")
                    && body.contains("#")
            })
            .times(1)
            .returning(|_, _, _| Ok(()));

        let service = build_service(repository, mailer);

        let user = service
            .register(RegisterUserCommand {
                department_id,
                name: "New User".to_string(),
                cpf: "11122233344".to_string(),
                email: "new@example.com".to_string(),
                phone: None,
                is_manager: true,
            })
            .await
            .unwrap();

        assert_eq!(user.email.as_deref(), Some("new@example.com"));
    }

    #[tokio::test]
    async fn test_register_survives_mail_failure() {
        let mut repository = MockTestUserRepository::new();
        let mut mailer = MockTestMailer::new();

        repository
            .expect_create()
            .times(1)
            .returning(|command| Ok(sample_user(Uuid::new_v4(), command.department_id)));

        mailer
            .expect_send()
            .times(1)
            .returning(|_, _, _| Err(MailerError::DeliveryFailed("smtp down".to_string())));

        let service = build_service(repository, mailer);

        let result = service
            .register(RegisterUserCommand {
                department_id: Uuid::new_v4(),
                name: "New User".to_string(),
                cpf: "11122233344".to_string(),
                email: "new@example.com".to_string(),
                phone: None,
                is_manager: false,
            })
            .await;

        assert!(result.is_ok());
    }

    #[tokio::test]
    async fn test_sign_in_issues_verifiable_session() {
        let user_id = Uuid::new_v4();
        let digest = PasswordHasher::new().hash("right password").unwrap();

        let mut repository = MockTestUserRepository::new();
        repository
            .expect_find_credentials()
            .withf(|identifier| {
                matches!(identifier, UserIdentifier::Email(email) if email == "test@example.com")
            })
            .times(1)
            .returning(move |_| {
                Ok(Some(SignInCredentials {
                    id: user_id,
                    password_hash: digest.clone(),
                }))
            });

        let service = build_service(repository, MockTestMailer::new());

        let token = service
            .sign_in("test@example.com", "right password")
            .await
            .unwrap();

        let claims = auth_handle().verify_session(&token).unwrap();
        assert_eq!(claims.sub, user_id.to_string());
    }

    #[tokio::test]
    async fn test_sign_in_unknown_login() {
        let mut repository = MockTestUserRepository::new();
        repository
            .expect_find_credentials()
            .times(1)
            .returning(|_| Ok(None));

        let service = build_service(repository, MockTestMailer::new());

        let result = service.sign_in("nobody@example.com", "whatever").await;
        assert!(matches!(
            result,
            Err(UserError::Auth(AuthError::InvalidLogin))
        ));
    }

    #[tokio::test]
    async fn test_sign_in_wrong_password() {
        let digest = PasswordHasher::new().hash("right password").unwrap();

        let mut repository = MockTestUserRepository::new();
        repository
            .expect_find_credentials()
            .times(1)
            .returning(move |_| {
                Ok(Some(SignInCredentials {
                    id: Uuid::new_v4(),
                    password_hash: digest.clone(),
                }))
            });

        let service = build_service(repository, MockTestMailer::new());

        let result = service.sign_in("test@example.com", "wrong password").await;
        assert!(matches!(
            result,
            Err(UserError::Auth(AuthError::InvalidLogin))
        ));
    }

    #[tokio::test]
    async fn test_update_rejects_empty_patch() {
        let mut repository = MockTestUserRepository::new();
        repository.expect_update().times(0);

        let service = build_service(repository, MockTestMailer::new());

        let result = service
            .update(
                &UserIdentifier::Id(Uuid::new_v4()),
                UpdateUserCommand::default(),
            )
            .await;

        assert!(matches!(result, Err(UserError::NoProvidedData)));
    }

    #[tokio::test]
    async fn test_update_with_password_reset() {
        let mut repository = MockTestUserRepository::new();
        let mut mailer = MockTestMailer::new();

        repository
            .expect_update()
            .withf(|_, patch| {
                patch.password_hash.as_deref().is_some_and(|h| h.starts_with("$argon2"))
                    && patch.is_verified == Some(false)
            })
            .times(1)
            .returning(|_, _| Ok(sample_user(Uuid::new_v4(), Uuid::new_v4())));

        mailer
            .expect_send()
            .withf(|to, subject, body| {
                to == "test@example.com"
                    && subject.contains("Account Update")
                    && body.contains("New password")
            })
            .times(1)
            .returning(|_, _, _| Ok(()));

        let service = build_service(repository, mailer);

        let result = service
            .update(
                &UserIdentifier::Id(Uuid::new_v4()),
                UpdateUserCommand {
                    reset_password: true,
                    ..UpdateUserCommand::default()
                },
            )
            .await;

        assert!(result.is_ok());
    }

    #[tokio::test]
    async fn test_read_one_not_found() {
        let mut repository = MockTestUserRepository::new();
        repository.expect_find_one().times(1).returning(|_| Ok(None));

        let service = build_service(repository, MockTestMailer::new());

        let result = service
            .read_one(&UserIdentifier::Cpf("00000000000".to_string()))
            .await;
        assert!(matches!(result, Err(UserError::NotFound)));
    }

    #[tokio::test]
    async fn test_update_me_email_only_sends_confirmation_without_write() {
        let user = sample_user(Uuid::new_v4(), Uuid::new_v4());

        let mut repository = MockTestUserRepository::new();
        repository.expect_update().times(0);

        let mut mailer = MockTestMailer::new();
        mailer
            .expect_send()
            .withf(|to, subject, body| {
                to == "next@example.com"
                    && subject.contains("Email Update")
                    && body.contains("https://intranet.example.com/confirm")
            })
            .times(1)
            .returning(|_, _, _| Ok(()));

        let service = build_service(repository, mailer);

        let result = service
            .update_me(
                &user,
                UpdateMeCommand {
                    name: None,
                    phone: None,
                    email: Some("next@example.com".to_string()),
                    frontend_url: "https://intranet.example.com/confirm".to_string(),
                },
            )
            .await
            .unwrap();

        // Unchanged until the confirmation link is followed.
        assert_eq!(result.email, user.email);
    }

    #[tokio::test]
    async fn test_verify_email_persists_token_subject() {
        let user = sample_user(Uuid::new_v4(), Uuid::new_v4());
        let token = auth_handle()
            .issue_action_token("confirmed@example.com")
            .unwrap();

        let mut repository = MockTestUserRepository::new();
        repository
            .expect_update()
            .withf(|_, patch| patch.email.as_deref() == Some("confirmed@example.com"))
            .times(1)
            .returning(|_, _| Ok(sample_user(Uuid::new_v4(), Uuid::new_v4())));

        let service = build_service(repository, MockTestMailer::new());

        assert!(service.verify_email(&user, &token).await.is_ok());
    }

    #[tokio::test]
    async fn test_update_password_rejects_wrong_current() {
        let user = sample_user(Uuid::new_v4(), Uuid::new_v4());
        let digest = PasswordHasher::new().hash("the current one").unwrap();

        let mut repository = MockTestUserRepository::new();
        repository
            .expect_find_credentials()
            .times(1)
            .returning(move |_| {
                Ok(Some(SignInCredentials {
                    id: Uuid::new_v4(),
                    password_hash: digest.clone(),
                }))
            });
        repository.expect_update().times(0);

        let service = build_service(repository, MockTestMailer::new());

        let result = service
            .update_password(&user, "not the current one", "brand new")
            .await;
        assert!(matches!(
            result,
            Err(UserError::Auth(AuthError::InvalidLogin))
        ));
    }

    #[tokio::test]
    async fn test_recover_password_roundtrip() {
        let user_id = Uuid::new_v4();
        let token = auth_handle()
            .issue_action_token(&user_id.to_string())
            .unwrap();

        let mut repository = MockTestUserRepository::new();
        repository
            .expect_update()
            .withf(move |identifier, patch| {
                *identifier == UserIdentifier::Id(user_id) && patch.password_hash.is_some()
            })
            .times(1)
            .returning(|_, _| Ok(sample_user(Uuid::new_v4(), Uuid::new_v4())));

        let service = build_service(repository, MockTestMailer::new());

        assert!(service.recover_password(&token, "fresh password").await.is_ok());
    }

    #[tokio::test]
    async fn test_recover_password_rejects_session_token() {
        // A session token is signed with the session secret; the recovery
        // flow only accepts action tokens.
        let token = auth_handle().issue_session(Uuid::new_v4()).unwrap();

        let mut repository = MockTestUserRepository::new();
        repository.expect_update().times(0);

        let service = build_service(repository, MockTestMailer::new());

        let result = service.recover_password(&token, "fresh password").await;
        assert!(matches!(
            result,
            Err(UserError::Auth(AuthError::InvalidToken))
        ));
    }

    #[tokio::test]
    async fn test_request_password_recovery_without_email_is_noop() {
        let mut user = sample_user(Uuid::new_v4(), Uuid::new_v4());
        user.email = None;

        let mut repository = MockTestUserRepository::new();
        let returned = user.clone();
        repository
            .expect_find_one()
            .times(1)
            .returning(move |_| Ok(Some(returned.clone())));

        let mut mailer = MockTestMailer::new();
        mailer.expect_send().times(0);

        let service = build_service(repository, mailer);

        let result = service
            .request_password_recovery(
                &UserIdentifier::Cpf(user.cpf.clone()),
                "https://intranet.example.com/recover",
            )
            .await;
        assert!(result.is_ok());
    }
}
