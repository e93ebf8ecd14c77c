use axum::extract::Query;
use axum::extract::State;
use axum::http::StatusCode;
use serde::Deserialize;
use uuid::Uuid;

use crate::domain::listing::SortOrder;
use crate::domain::user::models::UserFilters;
use crate::domain::user::models::UserOrderBy;
use crate::domain::user::models::UserPage;
use crate::domain::user::models::UserSortField;
use crate::domain::user::ports::UserServicePort;
use crate::inbound::http::handlers::ApiError;
use crate::inbound::http::handlers::ApiSuccess;
use crate::inbound::http::router::AppState;

#[derive(Debug, Deserialize)]
pub struct ListUsersQuery {
    pub page: Option<i64>,
    pub limit: Option<i64>,
    pub department_id: Option<Uuid>,
    pub name: Option<String>,
    pub cpf: Option<String>,
    pub email: Option<String>,
    pub phone: Option<String>,
    pub is_active: Option<bool>,
    pub order_by: Option<String>,
    pub order: Option<String>,
}

impl ListUsersQuery {
    fn try_into_filters(self) -> Result<UserFilters, ApiError> {
        let order_by = self
            .order_by
            .as_deref()
            .map(|raw| parse_order_by(raw, self.order.as_deref()))
            .transpose()?;

        Ok(UserFilters {
            page: self.page,
            limit: self.limit,
            department_id: self.department_id,
            name: self.name,
            cpf: self.cpf,
            email: self.email,
            phone: self.phone,
            is_active: self.is_active,
            order_by,
        })
    }
}

fn parse_order_by(field: &str, order: Option<&str>) -> Result<UserOrderBy, ApiError> {
    let field = match field {
        "name" => UserSortField::Name,
        "cpf" => UserSortField::Cpf,
        "email" => UserSortField::Email,
        "created_at" => UserSortField::CreatedAt,
        "updated_at" => UserSortField::UpdatedAt,
        other => {
            return Err(ApiError::UnprocessableEntity(format!(
                "Cannot order users by '{}'",
                other
            )))
        }
    };

    let order = match order {
        None | Some("desc") => SortOrder::Desc,
        Some("asc") => SortOrder::Asc,
        Some(other) => {
            return Err(ApiError::UnprocessableEntity(format!(
                "Invalid sort order '{}'",
                other
            )))
        }
    };

    Ok(UserOrderBy { field, order })
}

pub async fn list_users(
    State(state): State<AppState>,
    Query(query): Query<ListUsersQuery>,
) -> Result<ApiSuccess<UserPage>, ApiError> {
    let filters = query.try_into_filters()?;

    state
        .user_service
        .read_many(&filters)
        .await
        .map_err(ApiError::from)
        .map(|page| ApiSuccess::new(StatusCode::OK, page))
}
