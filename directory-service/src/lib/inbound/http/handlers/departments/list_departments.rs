use axum::extract::Query;
use axum::extract::State;
use axum::http::StatusCode;
use serde::Deserialize;

use crate::domain::department::models::DepartmentFilters;
use crate::domain::department::models::DepartmentOrderBy;
use crate::domain::department::models::DepartmentPage;
use crate::domain::department::models::DepartmentSortField;
use crate::domain::department::ports::DepartmentServicePort;
use crate::domain::listing::SortOrder;
use crate::inbound::http::handlers::ApiError;
use crate::inbound::http::handlers::ApiSuccess;
use crate::inbound::http::router::AppState;

#[derive(Debug, Deserialize)]
pub struct ListDepartmentsQuery {
    pub page: Option<i64>,
    pub limit: Option<i64>,
    pub name: Option<String>,
    pub acronym: Option<String>,
    pub email: Option<String>,
    pub phone: Option<String>,
    pub is_active: Option<bool>,
    pub order_by: Option<String>,
    pub order: Option<String>,
}

impl ListDepartmentsQuery {
    fn try_into_filters(self) -> Result<DepartmentFilters, ApiError> {
        let order_by = self
            .order_by
            .as_deref()
            .map(|raw| parse_order_by(raw, self.order.as_deref()))
            .transpose()?;

        Ok(DepartmentFilters {
            page: self.page,
            limit: self.limit,
            name: self.name,
            acronym: self.acronym,
            email: self.email,
            phone: self.phone,
            is_active: self.is_active,
            order_by,
        })
    }
}

fn parse_order_by(field: &str, order: Option<&str>) -> Result<DepartmentOrderBy, ApiError> {
    let field = match field {
        "name" => DepartmentSortField::Name,
        "acronym" => DepartmentSortField::Acronym,
        "created_at" => DepartmentSortField::CreatedAt,
        "updated_at" => DepartmentSortField::UpdatedAt,
        other => {
            return Err(ApiError::UnprocessableEntity(format!(
                "Cannot order departments by '{}'",
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

    Ok(DepartmentOrderBy { field, order })
}

pub async fn list_departments(
    State(state): State<AppState>,
    Query(query): Query<ListDepartmentsQuery>,
) -> Result<ApiSuccess<DepartmentPage>, ApiError> {
    let filters = query.try_into_filters()?;

    state
        .department_service
        .read_many(&filters)
        .await
        .map_err(ApiError::from)
        .map(|page| ApiSuccess::new(StatusCode::OK, page))
}
