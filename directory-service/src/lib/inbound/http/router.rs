use std::sync::Arc;
use std::time::Duration;

use axum::body::Body;
use axum::http::Request;
use axum::http::Response;
use axum::middleware;
use axum::routing::delete;
use axum::routing::get;
use axum::routing::patch;
use axum::routing::post;
use axum::Router;
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;
use tracing::Span;

use super::handlers::departments::create_department::create_department;
use super::handlers::departments::disable_department::disable_department;
use super::handlers::departments::enable_department::enable_department;
use super::handlers::departments::get_department::get_department;
use super::handlers::departments::get_department::get_department_by_acronym;
use super::handlers::departments::list_departments::list_departments;
use super::handlers::departments::update_department::update_department;
use super::handlers::sign_in::sign_in;
use super::handlers::users::disable_user::disable_user;
use super::handlers::users::enable_user::enable_user;
use super::handlers::users::get_user::get_user;
use super::handlers::users::list_users::list_users;
use super::handlers::users::me::get_me;
use super::handlers::users::me::update_me;
use super::handlers::users::me::update_my_password;
use super::handlers::users::me::verify_my_email;
use super::handlers::users::password_recovery::recover_password;
use super::handlers::users::password_recovery::request_password_recovery;
use super::handlers::users::register::register;
use super::handlers::users::update_user::update_user;
use super::middleware::authenticate;
use super::middleware::require_manager;
use crate::domain::auth::service::AuthService;
use crate::domain::department::service::DepartmentService;
use crate::domain::user::service::UserService;
use crate::outbound::mailer::SmtpMailer;
use crate::outbound::repositories::PostgresDepartmentRepository;
use crate::outbound::repositories::PostgresUserRepository;

pub type DirectoryUserService = UserService<PostgresUserRepository, SmtpMailer>;
pub type DirectoryDepartmentService = DepartmentService<PostgresDepartmentRepository>;
pub type DirectoryAuthService = AuthService<PostgresUserRepository>;

#[derive(Clone)]
pub struct AppState {
    pub user_service: Arc<DirectoryUserService>,
    pub department_service: Arc<DirectoryDepartmentService>,
    pub auth_service: Arc<DirectoryAuthService>,
}

pub fn create_router(
    user_service: Arc<DirectoryUserService>,
    department_service: Arc<DirectoryDepartmentService>,
    auth_service: Arc<DirectoryAuthService>,
) -> Router {
    let state = AppState {
        user_service,
        department_service,
        auth_service,
    };

    let public_routes = Router::new()
        .route("/api/auth/sign-in", post(sign_in))
        .route("/api/users/password-recovery", post(request_password_recovery))
        .route("/api/users/password-recovery/:token", patch(recover_password));

    // Any authenticated principal.
    let authenticated_routes = Router::new()
        .route("/api/users/me", get(get_me))
        .route("/api/users/me", patch(update_me))
        .route("/api/users/me/password", patch(update_my_password))
        .route("/api/users/me/email/:token", patch(verify_my_email))
        .route("/api/users", get(list_users))
        .route("/api/users/:identifier", get(get_user))
        .route("/api/departments", get(list_departments))
        .route("/api/departments/:identifier", get(get_department))
        .route(
            "/api/departments/acronym/:acronym",
            get(get_department_by_acronym),
        )
        .route_layer(middleware::from_fn_with_state(
            state.clone(),
            authenticate,
        ));

    // Mutations are reserved for principals currently managing a
    // department. `authenticate` is added last so it runs first.
    let manager_routes = Router::new()
        .route("/api/users", post(register))
        .route("/api/users/:identifier", patch(update_user))
        .route("/api/users/:identifier", delete(disable_user))
        .route("/api/users/:identifier/enable", patch(enable_user))
        .route("/api/departments", post(create_department))
        .route("/api/departments/:identifier", patch(update_department))
        .route("/api/departments/:identifier", delete(disable_department))
        .route("/api/departments/:identifier/enable", patch(enable_department))
        .route_layer(middleware::from_fn(require_manager))
        .route_layer(middleware::from_fn_with_state(
            state.clone(),
            authenticate,
        ));

    let trace_layer = TraceLayer::new_for_http()
        .make_span_with(|request: &Request<Body>| {
            tracing::info_span!(
                "http_request",
                method = %request.method(),
                uri = %request.uri(),
            )
        })
        .on_request(|request: &Request<Body>, _span: &Span| {
            tracing::info!(
                method = %request.method(),
                uri = %request.uri(),
                "Request started"
            );
        })
        .on_response(
            |response: &Response<Body>, latency: Duration, _span: &Span| {
                tracing::info!(
                    status = response.status().as_u16(),
                    latency_ms = latency.as_millis(),
                    "Request completed"
                );
            },
        );

    Router::new()
        .merge(public_routes)
        .merge(authenticated_routes)
        .merge(manager_routes)
        .layer(trace_layer)
        .layer(CorsLayer::permissive())
        .with_state(state)
}
