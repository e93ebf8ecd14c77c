use std::fmt;

use chrono::DateTime;
use chrono::Utc;
use serde::Serialize;
use uuid::Uuid;

use crate::domain::listing::SortOrder;

/// User entity as exposed to callers.
///
/// The password digest never appears here; sign-in flows use the dedicated
/// [`SignInCredentials`] projection instead. `management` embeds the
/// department this user currently manages, if any.
#[derive(Debug, Clone, Serialize)]
pub struct User {
    pub id: Uuid,
    pub department_id: Uuid,
    pub name: String,
    pub cpf: String,
    pub email: Option<String>,
    pub phone: Option<String>,
    pub is_active: bool,
    pub is_verified: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    pub deleted_at: Option<DateTime<Utc>>,
    pub management: Option<Management>,
}

/// Department view embedded into a managing user, without its own
/// `manager_id` back-reference.
#[derive(Debug, Clone, Serialize)]
pub struct Management {
    pub id: Uuid,
    pub name: String,
    pub acronym: Option<String>,
    pub description: Option<String>,
    pub email: Option<String>,
    pub phone: Option<String>,
    pub is_active: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    pub deleted_at: Option<DateTime<Utc>>,
}

/// Minimal projection for credential checks: nothing but the identity and
/// the stored digest leaves the repository.
#[derive(Debug, Clone)]
pub struct SignInCredentials {
    pub id: Uuid,
    pub password_hash: String,
}

/// Unique key addressing exactly one user.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum UserIdentifier {
    Id(Uuid),
    Cpf(String),
    Email(String),
    Phone(String),
}

impl fmt::Display for UserIdentifier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            UserIdentifier::Id(id) => write!(f, "id={}", id),
            UserIdentifier::Cpf(cpf) => write!(f, "cpf={}", cpf),
            UserIdentifier::Email(email) => write!(f, "email={}", email),
            UserIdentifier::Phone(phone) => write!(f, "phone={}", phone),
        }
    }
}

/// Storage-level create command. The password arrives already hashed; the
/// service layer owns plaintext handling.
#[derive(Debug, Clone)]
pub struct CreateUserCommand {
    pub department_id: Uuid,
    pub name: String,
    pub cpf: String,
    pub email: Option<String>,
    pub phone: Option<String>,
    pub password_hash: String,
    pub is_manager: bool,
}

/// Storage-level partial update.
///
/// `department_id` and `is_manager` drive the management flows; everything
/// else is a plain column write. An all-`None` patch is rejected before it
/// reaches storage.
#[derive(Debug, Clone, Default)]
pub struct UserPatch {
    pub name: Option<String>,
    pub cpf: Option<String>,
    pub email: Option<String>,
    pub phone: Option<String>,
    pub password_hash: Option<String>,
    pub is_verified: Option<bool>,
    pub department_id: Option<Uuid>,
    pub is_manager: Option<bool>,
}

impl UserPatch {
    pub fn is_empty(&self) -> bool {
        self.name.is_none()
            && self.cpf.is_none()
            && self.email.is_none()
            && self.phone.is_none()
            && self.password_hash.is_none()
            && self.is_verified.is_none()
            && self.department_id.is_none()
            && self.is_manager.is_none()
    }

    /// Whether any plain column (not a relationship) is being written.
    pub fn has_field_changes(&self) -> bool {
        self.name.is_some()
            || self.cpf.is_some()
            || self.email.is_some()
            || self.phone.is_some()
            || self.password_hash.is_some()
            || self.is_verified.is_some()
    }
}

/// Contact data required to re-enable a disabled user; disabling scrubs
/// e-mail and phone, so both must be supplied again.
#[derive(Debug, Clone)]
pub struct EnableUserCommand {
    pub email: String,
    pub phone: String,
}

/// Admin-facing update command. `reset_password` regenerates the account
/// password server-side; the plaintext is mailed, never returned.
#[derive(Debug, Clone, Default)]
pub struct UpdateUserCommand {
    pub name: Option<String>,
    pub cpf: Option<String>,
    pub email: Option<String>,
    pub phone: Option<String>,
    pub is_verified: Option<bool>,
    pub department_id: Option<Uuid>,
    pub is_manager: Option<bool>,
    pub reset_password: bool,
}

impl UpdateUserCommand {
    pub fn is_empty(&self) -> bool {
        self.name.is_none()
            && self.cpf.is_none()
            && self.email.is_none()
            && self.phone.is_none()
            && self.is_verified.is_none()
            && self.department_id.is_none()
            && self.is_manager.is_none()
            && !self.reset_password
    }
}

/// Registration command; the account password is generated server-side and
/// delivered by mail.
#[derive(Debug, Clone)]
pub struct RegisterUserCommand {
    pub department_id: Uuid,
    pub name: String,
    pub cpf: String,
    pub email: String,
    pub phone: Option<String>,
    pub is_manager: bool,
}

/// Self-service profile update; an e-mail change is not persisted here, it
/// only starts the confirmation round trip.
#[derive(Debug, Clone)]
pub struct UpdateMeCommand {
    pub name: Option<String>,
    pub phone: Option<String>,
    pub email: Option<String>,
    pub frontend_url: String,
}

/// Sortable user columns, whitelisted to keep ORDER BY out of user hands.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UserSortField {
    Name,
    Cpf,
    Email,
    CreatedAt,
    UpdatedAt,
}

impl UserSortField {
    pub fn as_column(&self) -> &'static str {
        match self {
            UserSortField::Name => "name",
            UserSortField::Cpf => "cpf",
            UserSortField::Email => "email",
            UserSortField::CreatedAt => "created_at",
            UserSortField::UpdatedAt => "updated_at",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct UserOrderBy {
    pub field: UserSortField,
    pub order: SortOrder,
}

/// Listing filters; all predicates combine with AND, text fields match by
/// substring.
#[derive(Debug, Clone, Default)]
pub struct UserFilters {
    pub page: Option<i64>,
    pub limit: Option<i64>,
    pub department_id: Option<Uuid>,
    pub name: Option<String>,
    pub cpf: Option<String>,
    pub email: Option<String>,
    pub phone: Option<String>,
    pub is_active: Option<bool>,
    pub order_by: Option<UserOrderBy>,
}

/// One page of users plus the filtered total.
#[derive(Debug, Clone, Serialize)]
pub struct UserPage {
    pub total: i64,
    pub users: Vec<User>,
}
