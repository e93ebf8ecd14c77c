use async_trait::async_trait;
use sqlx::postgres::PgRow;
use sqlx::PgPool;
use sqlx::Postgres;
use sqlx::QueryBuilder;
use sqlx::Row;
use sqlx::Transaction;
use uuid::Uuid;

use super::violated_keys;
use crate::domain::listing::offset_and_limit;
use crate::domain::listing::SortOrder;
use crate::domain::user::errors::UserError;
use crate::domain::user::management::resolve_flag;
use crate::domain::user::management::resolve_transfer;
use crate::domain::user::management::ManagementChange;
use crate::domain::user::management::ManagementSnapshot;
use crate::domain::user::models::CreateUserCommand;
use crate::domain::user::models::EnableUserCommand;
use crate::domain::user::models::Management;
use crate::domain::user::models::SignInCredentials;
use crate::domain::user::models::User;
use crate::domain::user::models::UserFilters;
use crate::domain::user::models::UserIdentifier;
use crate::domain::user::models::UserPage;
use crate::domain::user::models::UserPatch;
use crate::domain::user::ports::UserRepository;

/// Entity projection: every user column except the password, plus the
/// managed department (aliased `management_*`) joined through the manager
/// back-reference.
const ENTITY_SELECT: &str = "\
SELECT u.id, u.department_id, u.name, u.cpf, u.email, u.phone, \
       u.is_active, u.is_verified, u.created_at, u.updated_at, u.deleted_at, \
       m.id AS management_id, m.name AS management_name, \
       m.acronym AS management_acronym, m.description AS management_description, \
       m.email AS management_email, m.phone AS management_phone, \
       m.is_active AS management_is_active, m.created_at AS management_created_at, \
       m.updated_at AS management_updated_at, m.deleted_at AS management_deleted_at \
FROM users u \
LEFT JOIN departments m ON m.manager_id = u.id";

pub struct PostgresUserRepository {
    pool: PgPool,
}

impl PostgresUserRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

fn map_write_error(e: sqlx::Error) -> UserError {
    if let Some(db_err) = e.as_database_error() {
        if db_err.is_unique_violation() {
            return UserError::Conflict(violated_keys(db_err.constraint()));
        }
    }
    UserError::Database(e.to_string())
}

fn map_read_error(e: sqlx::Error) -> UserError {
    UserError::Database(e.to_string())
}

fn map_row(row: &PgRow) -> Result<User, sqlx::Error> {
    let management = match row.try_get::<Option<Uuid>, _>("management_id")? {
        Some(id) => Some(Management {
            id,
            name: row.try_get("management_name")?,
            acronym: row.try_get("management_acronym")?,
            description: row.try_get("management_description")?,
            email: row.try_get("management_email")?,
            phone: row.try_get("management_phone")?,
            is_active: row.try_get("management_is_active")?,
            created_at: row.try_get("management_created_at")?,
            updated_at: row.try_get("management_updated_at")?,
            deleted_at: row.try_get("management_deleted_at")?,
        }),
        None => None,
    };

    Ok(User {
        id: row.try_get("id")?,
        department_id: row.try_get("department_id")?,
        name: row.try_get("name")?,
        cpf: row.try_get("cpf")?,
        email: row.try_get("email")?,
        phone: row.try_get("phone")?,
        is_active: row.try_get("is_active")?,
        is_verified: row.try_get("is_verified")?,
        created_at: row.try_get("created_at")?,
        updated_at: row.try_get("updated_at")?,
        deleted_at: row.try_get("deleted_at")?,
        management,
    })
}

/// Append `<prefix><column> = <value>` for the unique key the identifier
/// addresses.
fn push_identifier(
    builder: &mut QueryBuilder<'_, Postgres>,
    identifier: &UserIdentifier,
    prefix: &str,
) {
    match identifier {
        UserIdentifier::Id(id) => {
            builder.push(format!("{}id = ", prefix)).push_bind(*id);
        }
        UserIdentifier::Cpf(cpf) => {
            builder
                .push(format!("{}cpf = ", prefix))
                .push_bind(cpf.clone());
        }
        UserIdentifier::Email(email) => {
            builder
                .push(format!("{}email = ", prefix))
                .push_bind(email.clone());
        }
        UserIdentifier::Phone(phone) => {
            builder
                .push(format!("{}phone = ", prefix))
                .push_bind(phone.clone());
        }
    }
}

fn push_filters(builder: &mut QueryBuilder<'_, Postgres>, filters: &UserFilters) {
    builder.push(" WHERE TRUE");

    if let Some(department_id) = filters.department_id {
        builder
            .push(" AND u.department_id = ")
            .push_bind(department_id);
    }
    if let Some(name) = &filters.name {
        builder
            .push(" AND u.name ILIKE ")
            .push_bind(format!("%{}%", name));
    }
    if let Some(cpf) = &filters.cpf {
        builder
            .push(" AND u.cpf ILIKE ")
            .push_bind(format!("%{}%", cpf));
    }
    if let Some(email) = &filters.email {
        builder
            .push(" AND u.email ILIKE ")
            .push_bind(format!("%{}%", email));
    }
    if let Some(phone) = &filters.phone {
        builder
            .push(" AND u.phone ILIKE ")
            .push_bind(format!("%{}%", phone));
    }
    if let Some(is_active) = filters.is_active {
        builder.push(" AND u.is_active = ").push_bind(is_active);
    }
}

/// Append the plain-column assignments a patch carries. The caller opens
/// the SET clause with the `updated_at` bump.
fn push_field_assignments(builder: &mut QueryBuilder<'_, Postgres>, patch: &UserPatch) {
    if let Some(name) = &patch.name {
        builder.push(", name = ").push_bind(name.clone());
    }
    if let Some(cpf) = &patch.cpf {
        builder.push(", cpf = ").push_bind(cpf.clone());
    }
    if let Some(email) = &patch.email {
        builder.push(", email = ").push_bind(email.clone());
    }
    if let Some(phone) = &patch.phone {
        builder.push(", phone = ").push_bind(phone.clone());
    }
    if let Some(password_hash) = &patch.password_hash {
        builder.push(", password = ").push_bind(password_hash.clone());
    }
    if let Some(is_verified) = patch.is_verified {
        builder.push(", is_verified = ").push_bind(is_verified);
    }
}

impl PostgresUserRepository {
    async fn fetch_entity(
        tx: &mut Transaction<'_, Postgres>,
        id: Uuid,
    ) -> Result<User, UserError> {
        let query = format!("{} WHERE u.id = $1", ENTITY_SELECT);
        let row = sqlx::query(&query)
            .bind(id)
            .fetch_one(&mut **tx)
            .await
            .map_err(map_read_error)?;

        map_row(&row).map_err(map_read_error)
    }

    /// Read the state the management decisions need: the user's id, their
    /// department and the department currently pointing its manager at
    /// them. Restricted to active users, like every update flow.
    async fn fetch_snapshot(
        tx: &mut Transaction<'_, Postgres>,
        identifier: &UserIdentifier,
    ) -> Result<Option<ManagementSnapshot>, UserError> {
        let mut builder = QueryBuilder::new(
            "SELECT u.id, u.department_id, m.id AS managed_id \
             FROM users u \
             LEFT JOIN departments m ON m.manager_id = u.id \
             WHERE u.is_active = TRUE AND ",
        );
        push_identifier(&mut builder, identifier, "u.");

        let row = builder
            .build()
            .fetch_optional(&mut **tx)
            .await
            .map_err(map_read_error)?;

        match row {
            Some(row) => Ok(Some(ManagementSnapshot {
                user_id: row.try_get("id").map_err(map_read_error)?,
                department_id: row.try_get("department_id").map_err(map_read_error)?,
                managed_department_id: row.try_get("managed_id").map_err(map_read_error)?,
            })),
            None => Ok(None),
        }
    }

    /// Validate that a department exists and is active before any write
    /// that references it.
    async fn check_department(
        tx: &mut Transaction<'_, Postgres>,
        department_id: Uuid,
    ) -> Result<(), UserError> {
        let row = sqlx::query("SELECT is_active FROM departments WHERE id = $1")
            .bind(department_id)
            .fetch_optional(&mut **tx)
            .await
            .map_err(map_read_error)?;

        let Some(row) = row else {
            return Err(UserError::DepartmentNotFound);
        };

        let is_active: bool = row.try_get("is_active").map_err(map_read_error)?;
        if !is_active {
            return Err(UserError::InactiveDepartment);
        }

        Ok(())
    }

    /// Execute a management decision. `Assign` first clears any other
    /// department still referencing the user (`manager_id` is unique), then
    /// points the target at them; the write is skipped when the target
    /// already does, so an idempotent decision leaves `updated_at` alone.
    async fn apply_management_change(
        tx: &mut Transaction<'_, Postgres>,
        user_id: Uuid,
        change: ManagementChange,
    ) -> Result<(), UserError> {
        match change {
            ManagementChange::Keep => {}
            ManagementChange::Clear => {
                sqlx::query(
                    "UPDATE departments SET manager_id = NULL, updated_at = now() \
                     WHERE manager_id = $1",
                )
                .bind(user_id)
                .execute(&mut **tx)
                .await
                .map_err(map_write_error)?;
            }
            ManagementChange::Assign(department_id) => {
                sqlx::query(
                    "UPDATE departments SET manager_id = NULL, updated_at = now() \
                     WHERE manager_id = $1 AND id <> $2",
                )
                .bind(user_id)
                .bind(department_id)
                .execute(&mut **tx)
                .await
                .map_err(map_write_error)?;

                sqlx::query(
                    "UPDATE departments SET manager_id = $1, updated_at = now() \
                     WHERE id = $2 AND manager_id IS DISTINCT FROM $1",
                )
                .bind(user_id)
                .bind(department_id)
                .execute(&mut **tx)
                .await
                .map_err(map_write_error)?;
            }
        }

        Ok(())
    }

    /// Update the active user's plain columns, returning the row id.
    async fn update_fields(
        tx: &mut Transaction<'_, Postgres>,
        identifier: &UserIdentifier,
        patch: &UserPatch,
        new_department_id: Option<Uuid>,
    ) -> Result<Option<Uuid>, UserError> {
        let mut builder = QueryBuilder::new("UPDATE users SET updated_at = now()");
        push_field_assignments(&mut builder, patch);
        if let Some(department_id) = new_department_id {
            builder.push(", department_id = ").push_bind(department_id);
        }
        builder.push(" WHERE is_active = TRUE AND ");
        push_identifier(&mut builder, identifier, "");
        builder.push(" RETURNING id");

        let row = builder
            .build()
            .fetch_optional(&mut **tx)
            .await
            .map_err(map_write_error)?;

        match row {
            Some(row) => Ok(Some(row.try_get("id").map_err(map_read_error)?)),
            None => Ok(None),
        }
    }

    /// Plain field update: no relationship involved.
    async fn simple_update(
        &self,
        identifier: &UserIdentifier,
        patch: UserPatch,
    ) -> Result<User, UserError> {
        let mut tx = self.pool.begin().await.map_err(map_read_error)?;

        let id = Self::update_fields(&mut tx, identifier, &patch, None)
            .await?
            .ok_or(UserError::NotFound)?;

        let user = Self::fetch_entity(&mut tx, id).await?;
        tx.commit().await.map_err(map_read_error)?;

        Ok(user)
    }

    /// Move the user to another department. Whatever they managed is
    /// unconditionally disconnected: membership elsewhere and management
    /// here cannot coexist.
    async fn change_department(
        &self,
        identifier: &UserIdentifier,
        patch: UserPatch,
        department_id: Uuid,
    ) -> Result<User, UserError> {
        let mut tx = self.pool.begin().await.map_err(map_read_error)?;

        Self::check_department(&mut tx, department_id).await?;

        let id = Self::update_fields(&mut tx, identifier, &patch, Some(department_id))
            .await?
            .ok_or(UserError::NotFound)?;

        Self::apply_management_change(&mut tx, id, ManagementChange::Clear).await?;

        let user = Self::fetch_entity(&mut tx, id).await?;
        tx.commit().await.map_err(map_read_error)?;

        Ok(user)
    }

    /// Toggle the manager flag against the user's own department.
    async fn define_management(
        &self,
        identifier: &UserIdentifier,
        patch: UserPatch,
        is_manager: bool,
    ) -> Result<User, UserError> {
        let mut tx = self.pool.begin().await.map_err(map_read_error)?;

        let snapshot = Self::fetch_snapshot(&mut tx, identifier)
            .await?
            .ok_or(UserError::NotFound)?;

        if patch.has_field_changes() {
            Self::update_fields(
                &mut tx,
                &UserIdentifier::Id(snapshot.user_id),
                &patch,
                None,
            )
            .await?
            .ok_or(UserError::NotFound)?;
        }

        let change = resolve_flag(&snapshot, is_manager);
        Self::apply_management_change(&mut tx, snapshot.user_id, change).await?;

        let user = Self::fetch_entity(&mut tx, snapshot.user_id).await?;
        tx.commit().await.map_err(map_read_error)?;

        Ok(user)
    }

    /// Department change and manager flag in one request. User and target
    /// department are read inside the same transaction as the writes, so
    /// the department cannot be disabled between the check and the update.
    async fn transfer_and_define(
        &self,
        identifier: &UserIdentifier,
        patch: UserPatch,
        department_id: Uuid,
        is_manager: bool,
    ) -> Result<User, UserError> {
        let mut tx = self.pool.begin().await.map_err(map_read_error)?;

        let snapshot = Self::fetch_snapshot(&mut tx, identifier)
            .await?
            .ok_or(UserError::NotFound)?;
        Self::check_department(&mut tx, department_id).await?;

        let decision = resolve_transfer(&snapshot, department_id, is_manager);

        if decision.reassign_department || patch.has_field_changes() {
            let new_department = decision.reassign_department.then_some(department_id);
            Self::update_fields(
                &mut tx,
                &UserIdentifier::Id(snapshot.user_id),
                &patch,
                new_department,
            )
            .await?
            .ok_or(UserError::NotFound)?;
        }

        Self::apply_management_change(&mut tx, snapshot.user_id, decision.management).await?;

        let user = Self::fetch_entity(&mut tx, snapshot.user_id).await?;
        tx.commit().await.map_err(map_read_error)?;

        Ok(user)
    }
}

#[async_trait]
impl UserRepository for PostgresUserRepository {
    async fn create(&self, command: CreateUserCommand) -> Result<User, UserError> {
        let mut tx = self.pool.begin().await.map_err(map_read_error)?;

        Self::check_department(&mut tx, command.department_id).await?;

        let user_id = Uuid::new_v4();
        sqlx::query(
            "INSERT INTO users (id, department_id, name, cpf, email, phone, password) \
             VALUES ($1, $2, $3, $4, $5, $6, $7)",
        )
        .bind(user_id)
        .bind(command.department_id)
        .bind(&command.name)
        .bind(&command.cpf)
        .bind(&command.email)
        .bind(&command.phone)
        .bind(&command.password_hash)
        .execute(&mut *tx)
        .await
        .map_err(map_write_error)?;

        // The flag and the row land together; a manager-flagged user is
        // never observable without the department pointing back at them.
        if command.is_manager {
            Self::apply_management_change(
                &mut tx,
                user_id,
                ManagementChange::Assign(command.department_id),
            )
            .await?;
        }

        let user = Self::fetch_entity(&mut tx, user_id).await?;
        tx.commit().await.map_err(map_read_error)?;

        Ok(user)
    }

    async fn find_credentials(
        &self,
        identifier: &UserIdentifier,
    ) -> Result<Option<SignInCredentials>, UserError> {
        let mut builder = QueryBuilder::new("SELECT id, password FROM users WHERE ");
        push_identifier(&mut builder, identifier, "");

        let row = builder
            .build()
            .fetch_optional(&self.pool)
            .await
            .map_err(map_read_error)?;

        match row {
            Some(row) => Ok(Some(SignInCredentials {
                id: row.try_get("id").map_err(map_read_error)?,
                password_hash: row.try_get("password").map_err(map_read_error)?,
            })),
            None => Ok(None),
        }
    }

    async fn find_one(&self, identifier: &UserIdentifier) -> Result<Option<User>, UserError> {
        let mut builder = QueryBuilder::new(ENTITY_SELECT);
        builder.push(" WHERE ");
        push_identifier(&mut builder, identifier, "u.");

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

    async fn list(&self, filters: &UserFilters) -> Result<UserPage, UserError> {
        let (offset, limit) = offset_and_limit(filters.page, filters.limit);
        let (order_column, order) = match &filters.order_by {
            Some(order_by) => (order_by.field.as_column(), order_by.order),
            None => ("created_at", SortOrder::Desc),
        };

        // Count and page in one transaction so the total matches the rows.
        let mut tx = self.pool.begin().await.map_err(map_read_error)?;

        let mut count_builder = QueryBuilder::new("SELECT COUNT(*) FROM users u");
        push_filters(&mut count_builder, filters);
        let total: i64 = count_builder
            .build_query_scalar()
            .fetch_one(&mut *tx)
            .await
            .map_err(map_read_error)?;

        let mut builder = QueryBuilder::new(ENTITY_SELECT);
        push_filters(&mut builder, filters);
        builder.push(format!(" ORDER BY u.{} {}", order_column, order.as_sql()));
        builder.push(" OFFSET ").push_bind(offset);
        builder.push(" LIMIT ").push_bind(limit);

        let rows = builder
            .build()
            .fetch_all(&mut *tx)
            .await
            .map_err(map_read_error)?;

        tx.commit().await.map_err(map_read_error)?;

        let users = rows
            .iter()
            .map(map_row)
            .collect::<Result<Vec<_>, _>>()
            .map_err(map_read_error)?;

        Ok(UserPage { total, users })
    }

    async fn update(
        &self,
        identifier: &UserIdentifier,
        patch: UserPatch,
    ) -> Result<User, UserError> {
        if patch.is_empty() {
            return Err(UserError::NoProvidedData);
        }

        match (patch.department_id, patch.is_manager) {
            (None, None) => self.simple_update(identifier, patch).await,
            (Some(department_id), None) => {
                self.change_department(identifier, patch, department_id).await
            }
            (None, Some(is_manager)) => {
                self.define_management(identifier, patch, is_manager).await
            }
            (Some(department_id), Some(is_manager)) => {
                self.transfer_and_define(identifier, patch, department_id, is_manager)
                    .await
            }
        }
    }

    async fn disable(&self, identifier: &UserIdentifier) -> Result<User, UserError> {
        let mut tx = self.pool.begin().await.map_err(map_read_error)?;

        // Contact fields are scrubbed on disable; enabling requires them to
        // be supplied again.
        let mut builder = QueryBuilder::new(
            "UPDATE users SET is_active = FALSE, deleted_at = now(), \
             email = NULL, phone = NULL, updated_at = now() WHERE ",
        );
        push_identifier(&mut builder, identifier, "");
        builder.push(" RETURNING id");

        let row = builder
            .build()
            .fetch_optional(&mut *tx)
            .await
            .map_err(map_write_error)?
            .ok_or(UserError::NotFound)?;
        let id: Uuid = row.try_get("id").map_err(map_read_error)?;

        Self::apply_management_change(&mut tx, id, ManagementChange::Clear).await?;

        let user = Self::fetch_entity(&mut tx, id).await?;
        tx.commit().await.map_err(map_read_error)?;

        Ok(user)
    }

    async fn enable(
        &self,
        identifier: &UserIdentifier,
        command: EnableUserCommand,
    ) -> Result<User, UserError> {
        let mut tx = self.pool.begin().await.map_err(map_read_error)?;

        let mut builder = QueryBuilder::new("UPDATE users SET is_active = TRUE, deleted_at = NULL");
        builder.push(", email = ").push_bind(command.email);
        builder.push(", phone = ").push_bind(command.phone);
        builder.push(", updated_at = now() WHERE ");
        push_identifier(&mut builder, identifier, "");
        builder.push(" RETURNING id");

        let row = builder
            .build()
            .fetch_optional(&mut *tx)
            .await
            .map_err(map_write_error)?
            .ok_or(UserError::NotFound)?;
        let id: Uuid = row.try_get("id").map_err(map_read_error)?;

        let user = Self::fetch_entity(&mut tx, id).await?;
        tx.commit().await.map_err(map_read_error)?;

        Ok(user)
    }
}
