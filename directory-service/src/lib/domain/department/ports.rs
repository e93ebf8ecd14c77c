use async_trait::async_trait;

use crate::domain::department::errors::DepartmentError;
use crate::domain::department::models::CreateDepartmentCommand;
use crate::domain::department::models::Department;
use crate::domain::department::models::DepartmentFilters;
use crate::domain::department::models::DepartmentIdentifier;
use crate::domain::department::models::DepartmentPage;
use crate::domain::department::models::DepartmentPatch;

/// Persistence operations for the department aggregate.
#[async_trait]
pub trait DepartmentRepository: Send + Sync + 'static {
    /// Persist a new department; a designated manager is validated
    /// (exists, active) before anything is written.
    ///
    /// # Errors
    /// * `ManagerNotFound` / `InactiveManager` - manager precondition failed
    /// * `Conflict` - a unique key is already registered
    async fn create(&self, command: CreateDepartmentCommand) -> Result<Department, DepartmentError>;

    /// Fetch a department (manager contact included) by unique key.
    async fn find_one(
        &self,
        identifier: &DepartmentIdentifier,
    ) -> Result<Option<Department>, DepartmentError>;

    /// Count and fetch one page of departments under the given filters, in
    /// a single consistent transaction.
    async fn list(&self, filters: &DepartmentFilters) -> Result<DepartmentPage, DepartmentError>;

    /// Apply a partial update; manager assignment revalidates the
    /// designated user first.
    ///
    /// # Errors
    /// * `NotFound` - the identifier matches no department
    /// * `ManagerNotFound` / `InactiveManager` - manager precondition failed
    /// * `Conflict` - a unique key is already registered
    async fn update(
        &self,
        identifier: &DepartmentIdentifier,
        patch: DepartmentPatch,
    ) -> Result<Department, DepartmentError>;

    /// Soft-disable: clear the manager link, mark inactive with a deletion
    /// timestamp.
    async fn disable(&self, identifier: &DepartmentIdentifier) -> Result<Department, DepartmentError>;

    /// Re-enable a disabled department. Does not restore a previous
    /// manager.
    async fn enable(&self, identifier: &DepartmentIdentifier) -> Result<Department, DepartmentError>;
}

/// Department application service operations, as consumed by the inbound
/// layer.
#[async_trait]
pub trait DepartmentServicePort: Send + Sync + 'static {
    async fn create(&self, command: CreateDepartmentCommand) -> Result<Department, DepartmentError>;

    async fn read_one(&self, identifier: &DepartmentIdentifier) -> Result<Department, DepartmentError>;

    async fn read_many(&self, filters: &DepartmentFilters) -> Result<DepartmentPage, DepartmentError>;

    /// Rejects empty patches with `NoProvidedData`.
    async fn update(
        &self,
        identifier: &DepartmentIdentifier,
        patch: DepartmentPatch,
    ) -> Result<Department, DepartmentError>;

    async fn disable(&self, identifier: &DepartmentIdentifier) -> Result<Department, DepartmentError>;

    async fn enable(&self, identifier: &DepartmentIdentifier) -> Result<Department, DepartmentError>;
}
