use axum::extract::Path;
use axum::extract::State;
use axum::http::StatusCode;
use axum::Json;
use serde::Deserialize;
use uuid::Uuid;

use crate::domain::department::models::Department;
use crate::domain::department::models::DepartmentPatch;
use crate::domain::department::ports::DepartmentServicePort;
use crate::inbound::http::handlers::departments::parse_identifier;
use crate::inbound::http::handlers::ApiError;
use crate::inbound::http::handlers::ApiSuccess;
use crate::inbound::http::router::AppState;

/// `manager_id` is tri-state: absent leaves the manager untouched, `null`
/// clears it, a uuid assigns it. The double `Option` plus
/// `deserialize_with` keeps "absent" and "null" apart.
#[derive(Debug, Deserialize)]
pub struct UpdateDepartmentRequest {
    pub name: Option<String>,
    pub acronym: Option<String>,
    pub description: Option<String>,
    pub email: Option<String>,
    pub phone: Option<String>,
    #[serde(default, deserialize_with = "deserialize_some")]
    pub manager_id: Option<Option<Uuid>>,
}

fn deserialize_some<'de, D>(deserializer: D) -> Result<Option<Option<Uuid>>, D::Error>
where
    D: serde::Deserializer<'de>,
{
    serde::Deserialize::deserialize(deserializer).map(Some)
}

pub async fn update_department(
    State(state): State<AppState>,
    Path(identifier): Path<String>,
    Json(body): Json<UpdateDepartmentRequest>,
) -> Result<ApiSuccess<Department>, ApiError> {
    state
        .department_service
        .update(
            &parse_identifier(&identifier),
            DepartmentPatch {
                name: body.name,
                acronym: body.acronym,
                description: body.description,
                email: body.email,
                phone: body.phone,
                manager_id: body.manager_id,
            },
        )
        .await
        .map_err(ApiError::from)
        .map(|department| ApiSuccess::new(StatusCode::OK, department))
}
