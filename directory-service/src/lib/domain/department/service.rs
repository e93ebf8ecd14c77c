use std::sync::Arc;

use async_trait::async_trait;

use crate::domain::department::errors::DepartmentError;
use crate::domain::department::models::CreateDepartmentCommand;
use crate::domain::department::models::Department;
use crate::domain::department::models::DepartmentFilters;
use crate::domain::department::models::DepartmentIdentifier;
use crate::domain::department::models::DepartmentPage;
use crate::domain::department::models::DepartmentPatch;
use crate::domain::department::ports::DepartmentRepository;
use crate::domain::department::ports::DepartmentServicePort;

/// Application service for department operations.
///
/// Thin by design: the manager preconditions and the relationship writes
/// live in the repository, next to the transactions that need them.
pub struct DepartmentService<R>
where
    R: DepartmentRepository,
{
    repository: Arc<R>,
}

impl<R> DepartmentService<R>
where
    R: DepartmentRepository,
{
    pub fn new(repository: Arc<R>) -> Self {
        Self { repository }
    }
}

#[async_trait]
impl<R> DepartmentServicePort for DepartmentService<R>
where
    R: DepartmentRepository,
{
    async fn create(&self, command: CreateDepartmentCommand) -> Result<Department, DepartmentError> {
        self.repository.create(command).await
    }

    async fn read_one(
        &self,
        identifier: &DepartmentIdentifier,
    ) -> Result<Department, DepartmentError> {
        self.repository
            .find_one(identifier)
            .await?
            .ok_or(DepartmentError::NotFound)
    }

    async fn read_many(
        &self,
        filters: &DepartmentFilters,
    ) -> Result<DepartmentPage, DepartmentError> {
        self.repository.list(filters).await
    }

    async fn update(
        &self,
        identifier: &DepartmentIdentifier,
        patch: DepartmentPatch,
    ) -> Result<Department, DepartmentError> {
        if patch.is_empty() {
            return Err(DepartmentError::NoProvidedData);
        }

        self.repository.update(identifier, patch).await
    }

    async fn disable(&self, identifier: &DepartmentIdentifier) -> Result<Department, DepartmentError> {
        self.repository.disable(identifier).await
    }

    async fn enable(&self, identifier: &DepartmentIdentifier) -> Result<Department, DepartmentError> {
        self.repository.enable(identifier).await
    }
}

#[cfg(test)]
mod tests {
    use chrono::Utc;
    use mockall::mock;
    use uuid::Uuid;

    use super::*;

    mock! {
        pub TestDepartmentRepository {}

        #[async_trait]
        impl DepartmentRepository for TestDepartmentRepository {
            async fn create(&self, command: CreateDepartmentCommand) -> Result<Department, DepartmentError>;
            async fn find_one(&self, identifier: &DepartmentIdentifier) -> Result<Option<Department>, DepartmentError>;
            async fn list(&self, filters: &DepartmentFilters) -> Result<DepartmentPage, DepartmentError>;
            async fn update(&self, identifier: &DepartmentIdentifier, patch: DepartmentPatch) -> Result<Department, DepartmentError>;
            async fn disable(&self, identifier: &DepartmentIdentifier) -> Result<Department, DepartmentError>;
            async fn enable(&self, identifier: &DepartmentIdentifier) -> Result<Department, DepartmentError>;
        }
    }

    fn sample_department(id: Uuid) -> Department {
        Department {
            id,
            manager_id: None,
            name: "Analysis".to_string(),
            acronym: Some("AN".to_string()),
            description: None,
            email: None,
            phone: None,
            is_active: true,
            created_at: Utc::now(),
            updated_at: Utc::now(),
            deleted_at: None,
            manager: None,
        }
    }

    #[tokio::test]
    async fn test_read_one_not_found() {
        let mut repository = MockTestDepartmentRepository::new();
        repository.expect_find_one().times(1).returning(|_| Ok(None));

        let service = DepartmentService::new(Arc::new(repository));

        let result = service
            .read_one(&DepartmentIdentifier::Acronym("XX".to_string()))
            .await;
        assert!(matches!(result, Err(DepartmentError::NotFound)));
    }

    #[tokio::test]
    async fn test_read_one_by_manager() {
        let manager_id = Uuid::new_v4();
        let mut repository = MockTestDepartmentRepository::new();

        repository
            .expect_find_one()
            .withf(move |identifier| {
                *identifier == DepartmentIdentifier::ManagerId(manager_id)
            })
            .times(1)
            .returning(|_| Ok(Some(sample_department(Uuid::new_v4()))));

        let service = DepartmentService::new(Arc::new(repository));

        assert!(service
            .read_one(&DepartmentIdentifier::ManagerId(manager_id))
            .await
            .is_ok());
    }

    #[tokio::test]
    async fn test_update_rejects_empty_patch() {
        let mut repository = MockTestDepartmentRepository::new();
        repository.expect_update().times(0);

        let service = DepartmentService::new(Arc::new(repository));

        let result = service
            .update(
                &DepartmentIdentifier::Id(Uuid::new_v4()),
                DepartmentPatch::default(),
            )
            .await;
        assert!(matches!(result, Err(DepartmentError::NoProvidedData)));
    }

    #[tokio::test]
    async fn test_update_passes_manager_tristate_through() {
        let mut repository = MockTestDepartmentRepository::new();

        repository
            .expect_update()
            .withf(|_, patch| patch.manager_id == Some(None))
            .times(1)
            .returning(|_, _| Ok(sample_department(Uuid::new_v4())));

        let service = DepartmentService::new(Arc::new(repository));

        let result = service
            .update(
                &DepartmentIdentifier::Id(Uuid::new_v4()),
                DepartmentPatch {
                    manager_id: Some(None),
                    ..DepartmentPatch::default()
                },
            )
            .await;
        assert!(result.is_ok());
    }
}
