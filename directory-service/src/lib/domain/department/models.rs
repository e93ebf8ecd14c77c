use std::fmt;

use chrono::DateTime;
use chrono::Utc;
use serde::Serialize;
use uuid::Uuid;

use crate::domain::listing::SortOrder;

/// Department entity as exposed to callers, with the manager's contact
/// data embedded when a manager is assigned.
#[derive(Debug, Clone, Serialize)]
pub struct Department {
    pub id: Uuid,
    pub manager_id: Option<Uuid>,
    pub name: String,
    pub acronym: Option<String>,
    pub description: Option<String>,
    pub email: Option<String>,
    pub phone: Option<String>,
    pub is_active: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    pub deleted_at: Option<DateTime<Utc>>,
    pub manager: Option<ManagerContact>,
}

/// Contact view of the managing user.
#[derive(Debug, Clone, Serialize)]
pub struct ManagerContact {
    pub name: String,
    pub cpf: String,
    pub email: Option<String>,
    pub phone: Option<String>,
}

/// Unique key addressing exactly one department.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DepartmentIdentifier {
    Id(Uuid),
    Name(String),
    Acronym(String),
    ManagerId(Uuid),
}

impl fmt::Display for DepartmentIdentifier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DepartmentIdentifier::Id(id) => write!(f, "id={}", id),
            DepartmentIdentifier::Name(name) => write!(f, "name={}", name),
            DepartmentIdentifier::Acronym(acronym) => write!(f, "acronym={}", acronym),
            DepartmentIdentifier::ManagerId(id) => write!(f, "manager_id={}", id),
        }
    }
}

#[derive(Debug, Clone)]
pub struct CreateDepartmentCommand {
    pub name: String,
    pub acronym: Option<String>,
    pub description: Option<String>,
    pub email: Option<String>,
    pub phone: Option<String>,
    pub manager_id: Option<Uuid>,
}

/// Partial department update.
///
/// The manager link is tri-state: `None` leaves it untouched,
/// `Some(None)` clears it, `Some(Some(id))` assigns it.
#[derive(Debug, Clone, Default)]
pub struct DepartmentPatch {
    pub name: Option<String>,
    pub acronym: Option<String>,
    pub description: Option<String>,
    pub email: Option<String>,
    pub phone: Option<String>,
    pub manager_id: Option<Option<Uuid>>,
}

impl DepartmentPatch {
    pub fn is_empty(&self) -> bool {
        self.name.is_none()
            && self.acronym.is_none()
            && self.description.is_none()
            && self.email.is_none()
            && self.phone.is_none()
            && self.manager_id.is_none()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DepartmentSortField {
    Name,
    Acronym,
    CreatedAt,
    UpdatedAt,
}

impl DepartmentSortField {
    pub fn as_column(&self) -> &'static str {
        match self {
            DepartmentSortField::Name => "name",
            DepartmentSortField::Acronym => "acronym",
            DepartmentSortField::CreatedAt => "created_at",
            DepartmentSortField::UpdatedAt => "updated_at",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DepartmentOrderBy {
    pub field: DepartmentSortField,
    pub order: SortOrder,
}

/// Listing filters. `email` and `phone` match the department's own contact
/// or its manager's.
#[derive(Debug, Clone, Default)]
pub struct DepartmentFilters {
    pub page: Option<i64>,
    pub limit: Option<i64>,
    pub name: Option<String>,
    pub acronym: Option<String>,
    pub email: Option<String>,
    pub phone: Option<String>,
    pub is_active: Option<bool>,
    pub order_by: Option<DepartmentOrderBy>,
}

/// One page of departments plus the filtered total.
#[derive(Debug, Clone, Serialize)]
pub struct DepartmentPage {
    pub total: i64,
    pub departments: Vec<Department>,
}
