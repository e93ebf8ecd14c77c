use async_trait::async_trait;

use crate::domain::user::errors::MailerError;
use crate::domain::user::errors::UserError;
use crate::domain::user::models::CreateUserCommand;
use crate::domain::user::models::EnableUserCommand;
use crate::domain::user::models::RegisterUserCommand;
use crate::domain::user::models::SignInCredentials;
use crate::domain::user::models::UpdateMeCommand;
use crate::domain::user::models::UpdateUserCommand;
use crate::domain::user::models::User;
use crate::domain::user::models::UserFilters;
use crate::domain::user::models::UserIdentifier;
use crate::domain::user::models::UserPage;
use crate::domain::user::models::UserPatch;

/// Persistence operations for the user aggregate.
///
/// Mutations that touch the manager relationship perform every referenced-
/// entity existence check before the first write and keep paired reads and
/// writes in one transaction.
#[async_trait]
pub trait UserRepository: Send + Sync + 'static {
    /// Persist a new user after validating the target department.
    ///
    /// # Errors
    /// * `DepartmentNotFound` / `InactiveDepartment` - department precondition failed
    /// * `Conflict` - a unique key is already registered
    async fn create(&self, command: CreateUserCommand) -> Result<User, UserError>;

    /// Fetch the sign-in projection (id + password digest) by unique key.
    async fn find_credentials(
        &self,
        identifier: &UserIdentifier,
    ) -> Result<Option<SignInCredentials>, UserError>;

    /// Fetch a user entity (management included) by unique key.
    async fn find_one(&self, identifier: &UserIdentifier) -> Result<Option<User>, UserError>;

    /// Count and fetch one page of users under the given filters, in a
    /// single consistent transaction.
    async fn list(&self, filters: &UserFilters) -> Result<UserPage, UserError>;

    /// Apply a partial update, dispatching the manager-relationship flows
    /// on the presence of `department_id` / `is_manager`.
    ///
    /// # Errors
    /// * `NotFound` - the identifier matches no active user
    /// * `DepartmentNotFound` / `InactiveDepartment` - target department precondition failed
    /// * `Conflict` - a unique key is already registered
    async fn update(
        &self,
        identifier: &UserIdentifier,
        patch: UserPatch,
    ) -> Result<User, UserError>;

    /// Soft-disable: scrub contact fields, clear any managed department,
    /// mark inactive with a deletion timestamp.
    async fn disable(&self, identifier: &UserIdentifier) -> Result<User, UserError>;

    /// Re-enable a disabled user with re-supplied contact fields. Does not
    /// restore any previously held management.
    async fn enable(
        &self,
        identifier: &UserIdentifier,
        command: EnableUserCommand,
    ) -> Result<User, UserError>;
}

/// Outbound mail delivery.
///
/// Every call site treats delivery as fire-and-forget: failures are logged
/// and swallowed, they never fail the surrounding operation.
#[async_trait]
pub trait Mailer: Send + Sync + 'static {
    async fn send(&self, to: &str, subject: &str, html_body: &str) -> Result<(), MailerError>;
}

/// User application service operations, as consumed by the inbound layer.
#[async_trait]
pub trait UserServicePort: Send + Sync + 'static {
    /// Create an account with a generated password and mail the credentials.
    async fn register(&self, command: RegisterUserCommand) -> Result<User, UserError>;

    /// Verify credentials and issue a session token.
    ///
    /// # Errors
    /// * `Auth(InvalidLogin)` - unknown login or wrong password
    async fn sign_in(&self, login: &str, password: &str) -> Result<String, UserError>;

    async fn read_one(&self, identifier: &UserIdentifier) -> Result<User, UserError>;

    async fn read_many(&self, filters: &UserFilters) -> Result<UserPage, UserError>;

    /// Administrative update; rejects empty patches with `NoProvidedData`.
    async fn update(
        &self,
        identifier: &UserIdentifier,
        command: UpdateUserCommand,
    ) -> Result<User, UserError>;

    /// Self-service profile update. An e-mail change only starts the
    /// confirmation round trip; the address is persisted by `verify_email`.
    async fn update_me(&self, user: &User, command: UpdateMeCommand) -> Result<User, UserError>;

    /// Persist the e-mail carried by a confirmation token.
    async fn verify_email(&self, user: &User, token: &str) -> Result<User, UserError>;

    /// Change the password after re-verifying the current one.
    async fn update_password(
        &self,
        user: &User,
        current_password: &str,
        new_password: &str,
    ) -> Result<User, UserError>;

    /// Mail a recovery link for the account addressed by `login`.
    async fn request_password_recovery(
        &self,
        login: &UserIdentifier,
        frontend_url: &str,
    ) -> Result<(), UserError>;

    /// Set a new password from a recovery token.
    async fn recover_password(&self, token: &str, new_password: &str) -> Result<(), UserError>;

    async fn disable(&self, identifier: &UserIdentifier) -> Result<User, UserError>;

    async fn enable(
        &self,
        identifier: &UserIdentifier,
        command: EnableUserCommand,
    ) -> Result<User, UserError>;
}
