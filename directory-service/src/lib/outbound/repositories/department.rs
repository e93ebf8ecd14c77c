use async_trait::async_trait;
use sqlx::postgres::PgRow;
use sqlx::PgPool;
use sqlx::Postgres;
use sqlx::QueryBuilder;
use sqlx::Row;
use sqlx::Transaction;
use uuid::Uuid;

use super::violated_keys;
use crate::domain::department::errors::DepartmentError;
use crate::domain::department::models::CreateDepartmentCommand;
use crate::domain::department::models::Department;
use crate::domain::department::models::DepartmentFilters;
use crate::domain::department::models::DepartmentIdentifier;
use crate::domain::department::models::DepartmentPage;
use crate::domain::department::models::DepartmentPatch;
use crate::domain::department::models::ManagerContact;
use crate::domain::department::ports::DepartmentRepository;
use crate::domain::listing::offset_and_limit;
use crate::domain::listing::SortOrder;

/// Entity projection: every department column plus the manager's contact
/// data joined through `manager_id`.
const ENTITY_SELECT: &str = "\
SELECT d.id, d.manager_id, d.name, d.acronym, d.description, d.email, d.phone, \
       d.is_active, d.created_at, d.updated_at, d.deleted_at, \
       u.name AS manager_name, u.cpf AS manager_cpf, \
       u.email AS manager_email, u.phone AS manager_phone \
FROM departments d \
LEFT JOIN users u ON u.id = d.manager_id";

pub struct PostgresDepartmentRepository {
    pool: PgPool,
}

impl PostgresDepartmentRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

fn map_write_error(e: sqlx::Error) -> DepartmentError {
    if let Some(db_err) = e.as_database_error() {
        if db_err.is_unique_violation() {
            return DepartmentError::Conflict(violated_keys(db_err.constraint()));
        }
    }
    DepartmentError::Database(e.to_string())
}

fn map_read_error(e: sqlx::Error) -> DepartmentError {
    DepartmentError::Database(e.to_string())
}

fn map_row(row: &PgRow) -> Result<Department, sqlx::Error> {
    let manager_id: Option<Uuid> = row.try_get("manager_id")?;
    let manager = match manager_id {
        Some(_) => Some(ManagerContact {
            name: row.try_get("manager_name")?,
            cpf: row.try_get("manager_cpf")?,
            email: row.try_get("manager_email")?,
            phone: row.try_get("manager_phone")?,
        }),
        None => None,
    };

    Ok(Department {
        id: row.try_get("id")?,
        manager_id,
        name: row.try_get("name")?,
        acronym: row.try_get("acronym")?,
        description: row.try_get("description")?,
        email: row.try_get("email")?,
        phone: row.try_get("phone")?,
        is_active: row.try_get("is_active")?,
        created_at: row.try_get("created_at")?,
        updated_at: row.try_get("updated_at")?,
        deleted_at: row.try_get("deleted_at")?,
        manager,
    })
}

fn push_identifier(
    builder: &mut QueryBuilder<'_, Postgres>,
    identifier: &DepartmentIdentifier,
    prefix: &str,
) {
    match identifier {
        DepartmentIdentifier::Id(id) => {
            builder.push(format!("{}id = ", prefix)).push_bind(*id);
        }
        DepartmentIdentifier::Name(name) => {
            builder
                .push(format!("{}name = ", prefix))
                .push_bind(name.clone());
        }
        DepartmentIdentifier::Acronym(acronym) => {
            builder
                .push(format!("{}acronym = ", prefix))
                .push_bind(acronym.clone());
        }
        DepartmentIdentifier::ManagerId(id) => {
            builder
                .push(format!("{}manager_id = ", prefix))
                .push_bind(*id);
        }
    }
}

/// Filter predicates; `email`/`phone` match the department's own contact or
/// its manager's, so the join is present in both the count and the page
/// query.
fn push_filters(builder: &mut QueryBuilder<'_, Postgres>, filters: &DepartmentFilters) {
    builder.push(" WHERE TRUE");

    if let Some(name) = &filters.name {
        builder
            .push(" AND d.name ILIKE ")
            .push_bind(format!("%{}%", name));
    }
    if let Some(acronym) = &filters.acronym {
        builder
            .push(" AND d.acronym ILIKE ")
            .push_bind(format!("%{}%", acronym));
    }
    if let Some(email) = &filters.email {
        let pattern = format!("%{}%", email);
        builder
            .push(" AND (d.email ILIKE ")
            .push_bind(pattern.clone())
            .push(" OR u.email ILIKE ")
            .push_bind(pattern)
            .push(")");
    }
    if let Some(phone) = &filters.phone {
        let pattern = format!("%{}%", phone);
        builder
            .push(" AND (d.phone ILIKE ")
            .push_bind(pattern.clone())
            .push(" OR u.phone ILIKE ")
            .push_bind(pattern)
            .push(")");
    }
    if let Some(is_active) = filters.is_active {
        builder.push(" AND d.is_active = ").push_bind(is_active);
    }
}

impl PostgresDepartmentRepository {
    async fn fetch_entity(
        tx: &mut Transaction<'_, Postgres>,
        id: Uuid,
    ) -> Result<Department, DepartmentError> {
        let query = format!("{} WHERE d.id = $1", ENTITY_SELECT);
        let row = sqlx::query(&query)
            .bind(id)
            .fetch_one(&mut **tx)
            .await
            .map_err(map_read_error)?;

        map_row(&row).map_err(map_read_error)
    }

    /// The designated manager must exist and be active before any write
    /// references them.
    async fn check_manager(
        tx: &mut Transaction<'_, Postgres>,
        manager_id: Uuid,
    ) -> Result<(), DepartmentError> {
        let row = sqlx::query("SELECT is_active FROM users WHERE id = $1")
            .bind(manager_id)
            .fetch_optional(&mut **tx)
            .await
            .map_err(map_read_error)?;

        let Some(row) = row else {
            return Err(DepartmentError::ManagerNotFound);
        };

        let is_active: bool = row.try_get("is_active").map_err(map_read_error)?;
        if !is_active {
            return Err(DepartmentError::InactiveManager);
        }

        Ok(())
    }
}

#[async_trait]
impl DepartmentRepository for PostgresDepartmentRepository {
    async fn create(&self, command: CreateDepartmentCommand) -> Result<Department, DepartmentError> {
        let mut tx = self.pool.begin().await.map_err(map_read_error)?;

        if let Some(manager_id) = command.manager_id {
            Self::check_manager(&mut tx, manager_id).await?;
        }

        let department_id = Uuid::new_v4();
        sqlx::query(
            "INSERT INTO departments (id, name, acronym, description, email, phone, manager_id) \
             VALUES ($1, $2, $3, $4, $5, $6, $7)",
        )
        .bind(department_id)
        .bind(&command.name)
        .bind(&command.acronym)
        .bind(&command.description)
        .bind(&command.email)
        .bind(&command.phone)
        .bind(command.manager_id)
        .execute(&mut *tx)
        .await
        .map_err(map_write_error)?;

        let department = Self::fetch_entity(&mut tx, department_id).await?;
        tx.commit().await.map_err(map_read_error)?;

        Ok(department)
    }

    async fn find_one(
        &self,
        identifier: &DepartmentIdentifier,
    ) -> Result<Option<Department>, DepartmentError> {
        let mut builder = QueryBuilder::new(ENTITY_SELECT);
        builder.push(" WHERE ");
        push_identifier(&mut builder, identifier, "d.");

        let row = builder
            .build()
            .fetch_optional(&self.pool)
            .await
            .map_err(map_read_error)?;

        match row {
            Some(row) => Ok(Some(map_row(&row).map_err(map_read_error)?)),
            None => Ok(None),
        }
    }

    async fn list(&self, filters: &DepartmentFilters) -> Result<DepartmentPage, DepartmentError> {
        let (offset, limit) = offset_and_limit(filters.page, filters.limit);
        let (order_column, order) = match &filters.order_by {
            Some(order_by) => (order_by.field.as_column(), order_by.order),
            None => ("created_at", SortOrder::Desc),
        };

        let mut tx = self.pool.begin().await.map_err(map_read_error)?;

        let mut count_builder = QueryBuilder::new(
            "SELECT COUNT(*) FROM departments d LEFT JOIN users u ON u.id = d.manager_id",
        );
        push_filters(&mut count_builder, filters);
        let total: i64 = count_builder
            .build_query_scalar()
            .fetch_one(&mut *tx)
            .await
            .map_err(map_read_error)?;

        let mut builder = QueryBuilder::new(ENTITY_SELECT);
        push_filters(&mut builder, filters);
        builder.push(format!(" ORDER BY d.{} {}", order_column, order.as_sql()));
        builder.push(" OFFSET ").push_bind(offset);
        builder.push(" LIMIT ").push_bind(limit);

        let rows = builder
            .build()
            .fetch_all(&mut *tx)
            .await
            .map_err(map_read_error)?;

        tx.commit().await.map_err(map_read_error)?;

        let departments = rows
            .iter()
            .map(map_row)
            .collect::<Result<Vec<_>, _>>()
            .map_err(map_read_error)?;

        Ok(DepartmentPage { total, departments })
    }

    async fn update(
        &self,
        identifier: &DepartmentIdentifier,
        patch: DepartmentPatch,
    ) -> Result<Department, DepartmentError> {
        if patch.is_empty() {
            return Err(DepartmentError::NoProvidedData);
        }

        let mut tx = self.pool.begin().await.map_err(map_read_error)?;

        if let Some(Some(manager_id)) = patch.manager_id {
            Self::check_manager(&mut tx, manager_id).await?;
        }

        let mut builder = QueryBuilder::new("UPDATE departments SET updated_at = now()");
        if let Some(name) = &patch.name {
            builder.push(", name = ").push_bind(name.clone());
        }
        if let Some(acronym) = &patch.acronym {
            builder.push(", acronym = ").push_bind(acronym.clone());
        }
        if let Some(description) = &patch.description {
            builder.push(", description = ").push_bind(description.clone());
        }
        if let Some(email) = &patch.email {
            builder.push(", email = ").push_bind(email.clone());
        }
        if let Some(phone) = &patch.phone {
            builder.push(", phone = ").push_bind(phone.clone());
        }
        match patch.manager_id {
            // Untouched.
            None => {}
            // Cleared. A designated user who already manages another
            // department surfaces as a `manager_id` conflict, same as the
            // unique index reports it.
            Some(None) => {
                builder.push(", manager_id = NULL");
            }
            Some(Some(manager_id)) => {
                builder.push(", manager_id = ").push_bind(manager_id);
            }
        }
        builder.push(" WHERE ");
        push_identifier(&mut builder, identifier, "");
        builder.push(" RETURNING id");

        let row = builder
            .build()
            .fetch_optional(&mut *tx)
            .await
            .map_err(map_write_error)?
            .ok_or(DepartmentError::NotFound)?;
        let id: Uuid = row.try_get("id").map_err(map_read_error)?;

        let department = Self::fetch_entity(&mut tx, id).await?;
        tx.commit().await.map_err(map_read_error)?;

        Ok(department)
    }

    async fn disable(&self, identifier: &DepartmentIdentifier) -> Result<Department, DepartmentError> {
        let mut tx = self.pool.begin().await.map_err(map_read_error)?;

        let mut builder = QueryBuilder::new(
            "UPDATE departments SET is_active = FALSE, deleted_at = now(), \
             manager_id = NULL, updated_at = now() WHERE ",
        );
        push_identifier(&mut builder, identifier, "");
        builder.push(" RETURNING id");

        let row = builder
            .build()
            .fetch_optional(&mut *tx)
            .await
            .map_err(map_write_error)?
            .ok_or(DepartmentError::NotFound)?;
        let id: Uuid = row.try_get("id").map_err(map_read_error)?;

        let department = Self::fetch_entity(&mut tx, id).await?;
        tx.commit().await.map_err(map_read_error)?;

        Ok(department)
    }

    async fn enable(&self, identifier: &DepartmentIdentifier) -> Result<Department, DepartmentError> {
        let mut tx = self.pool.begin().await.map_err(map_read_error)?;

        // The previous manager is not restored: the membership picture may
        // have changed while the department was disabled.
        let mut builder = QueryBuilder::new(
            "UPDATE departments SET is_active = TRUE, deleted_at = NULL, \
             updated_at = now() WHERE ",
        );
        push_identifier(&mut builder, identifier, "");
        builder.push(" RETURNING id");

        let row = builder
            .build()
            .fetch_optional(&mut *tx)
            .await
            .map_err(map_write_error)?
            .ok_or(DepartmentError::NotFound)?;
        let id: Uuid = row.try_get("id").map_err(map_read_error)?;

        let department = Self::fetch_entity(&mut tx, id).await?;
        tx.commit().await.map_err(map_read_error)?;

        Ok(department)
    }
}
