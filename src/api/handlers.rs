//! HTTP request handlers for the payroll engine API.
//!
//! This module contains the router and the handler functions for all API
//! endpoints.

use axum::{
    Extension, Json, Router,
    extract::{
        Path, Query, State,
        rejection::{JsonRejection, PathRejection, QueryRejection},
    },
    http::StatusCode,
    middleware,
    response::IntoResponse,
    routing::{get, post, put},
};
use serde_json::json;
use tracing::{info, warn};
use uuid::Uuid;

use crate::calculation::parse_period;
use crate::models::{Employee, NewEmployee, NewLeave, PayrollItemOverride};

use super::auth::{Claims, check_credentials, issue_token, require_bearer};
use super::request::{
    CreateEmployeeRequest, CreateLeaveRequest, CreateRunRequest, ListEmployeesQuery,
    LoginRequest, UpdateStatusRequest,
};
use super::response::{
    ApiError, ApiErrorResponse, CalculateResponse, LoginResponse, PageResponse, RunItemsResponse,
};
use super::state::AppState;

type HandlerResult<T> = Result<T, ApiErrorResponse>;

/// Creates the API router with all endpoints.
///
/// `/health` and `/api/v1/auth/login` are public; every other route requires
/// a bearer token.
pub fn create_router(state: AppState) -> Router {
    let protected = Router::new()
        .route("/employees", get(list_employees).post(create_employee))
        .route("/employees/:id/status", put(update_employee_status))
        .route("/payroll/runs", post(create_run))
        .route("/payroll/runs/:id/calculate", post(calculate_run))
        .route("/payroll/runs/:id/items", get(list_run_items))
        .route("/payroll/runs/period/:period/items", get(list_items_by_period))
        .route("/payroll/items/:id", post(override_item))
        .route("/leave", get(list_leaves).post(create_leave))
        .route_layer(middleware::from_fn_with_state(state.clone(), require_bearer));

    let api = Router::new()
        .route("/auth/login", post(login))
        .merge(protected);

    Router::new()
        .route("/health", get(health))
        .nest("/api/v1", api)
        .with_state(state)
}

/// Unwraps a JSON body, mapping extractor failures to 400 responses.
fn json_body<T>(
    correlation_id: Uuid,
    payload: Result<Json<T>, JsonRejection>,
) -> HandlerResult<T> {
    match payload {
        Ok(Json(body)) => Ok(body),
        Err(rejection) => {
            let error = match rejection {
                JsonRejection::JsonDataError(err) => {
                    let body_text = err.body_text();
                    warn!(
                        correlation_id = %correlation_id,
                        error = %body_text,
                        "JSON data error"
                    );
                    if body_text.contains("missing field") {
                        ApiError::validation_error(body_text)
                    } else {
                        ApiError::malformed_json(body_text)
                    }
                }
                JsonRejection::JsonSyntaxError(err) => {
                    warn!(
                        correlation_id = %correlation_id,
                        error = %err,
                        "JSON syntax error"
                    );
                    ApiError::malformed_json(format!("Invalid JSON syntax: {}", err))
                }
                JsonRejection::MissingJsonContentType(_) => {
                    ApiError::new("MISSING_CONTENT_TYPE", "Content-Type must be application/json")
                }
                _ => ApiError::malformed_json("Failed to parse request body"),
            };
            Err(ApiErrorResponse::new(StatusCode::BAD_REQUEST, error))
        }
    }
}

/// Unwraps a numeric `:id` segment, mapping extractor failures to 400 responses.
fn path_id(correlation_id: Uuid, path: Result<Path<i64>, PathRejection>) -> HandlerResult<i64> {
    match path {
        Ok(Path(id)) => Ok(id),
        Err(rejection) => {
            let body_text = rejection.body_text();
            warn!(correlation_id = %correlation_id, error = %body_text, "Path rejected");
            Err(ApiErrorResponse::new(
                StatusCode::BAD_REQUEST,
                ApiError::new("INVALID_PATH", body_text),
            ))
        }
    }
}

/// Logs a failed operation and converts it into a response.
fn failure(correlation_id: Uuid, operation: &str, error: crate::error::EngineError) -> ApiErrorResponse {
    warn!(
        correlation_id = %correlation_id,
        operation,
        error = %error,
        "Request failed"
    );
    error.into()
}

/// Handler for GET /health.
async fn health() -> impl IntoResponse {
    Json(json!({ "status": "ok" }))
}

/// Handler for POST /api/v1/auth/login.
async fn login(
    State(state): State<AppState>,
    payload: Result<Json<LoginRequest>, JsonRejection>,
) -> HandlerResult<Json<LoginResponse>> {
    let correlation_id = Uuid::new_v4();
    let request = json_body(correlation_id, payload)?;

    let accepted = check_credentials(state.auth(), &request.email, &request.password)
        .map_err(|err| failure(correlation_id, "login", err))?;
    if !accepted {
        warn!(correlation_id = %correlation_id, "Login rejected");
        return Err(ApiErrorResponse::unauthorized("Invalid email or password"));
    }

    let (token, expires_in) = issue_token(state.auth(), state.auth().admin_email.as_str())
        .map_err(|err| failure(correlation_id, "login", err))?;

    info!(correlation_id = %correlation_id, "Login succeeded");
    Ok(Json(LoginResponse {
        token,
        token_type: "Bearer".to_string(),
        expires_in,
    }))
}

fn matches_search(employee: &Employee, term: &str) -> bool {
    [
        employee.code.as_str(),
        employee.full_name().as_str(),
        employee.department.as_str(),
    ]
    .iter()
    .any(|value| value.to_lowercase().contains(term))
}

/// Handler for GET /api/v1/employees.
async fn list_employees(
    State(state): State<AppState>,
    query: Result<Query<ListEmployeesQuery>, QueryRejection>,
) -> HandlerResult<Json<PageResponse<Employee>>> {
    let correlation_id = Uuid::new_v4();
    let Query(query) = query.map_err(|rejection| {
        warn!(correlation_id = %correlation_id, error = %rejection.body_text(), "Query rejected");
        ApiErrorResponse::new(
            StatusCode::BAD_REQUEST,
            ApiError::validation_error(rejection.body_text()),
        )
    })?;
    let employees = state
        .store()
        .list_employees()
        .await
        .map_err(|err| failure(correlation_id, "list_employees", err))?;

    let matching: Vec<Employee> = match query.search_term() {
        Some(term) => employees
            .into_iter()
            .filter(|employee| matches_search(employee, &term))
            .collect(),
        None => employees,
    };

    let total = matching.len();
    let (limit, offset) = (query.limit(), query.offset());
    let data = matching.into_iter().skip(offset).take(limit).collect();

    Ok(Json(PageResponse {
        data,
        total,
        limit,
        offset,
    }))
}

/// Handler for POST /api/v1/employees.
async fn create_employee(
    State(state): State<AppState>,
    payload: Result<Json<CreateEmployeeRequest>, JsonRejection>,
) -> HandlerResult<impl IntoResponse> {
    let correlation_id = Uuid::new_v4();
    let request = json_body(correlation_id, payload)?;

    let employee = NewEmployee::try_from(request)
        .map_err(|err| failure(correlation_id, "create_employee", err))?;
    let employee = state
        .store()
        .create_employee(employee)
        .await
        .map_err(|err| failure(correlation_id, "create_employee", err))?;

    info!(
        correlation_id = %correlation_id,
        employee_id = employee.id,
        code = %employee.code,
        "Employee created"
    );
    Ok((StatusCode::CREATED, Json(employee)))
}

/// Handler for PUT /api/v1/employees/:id/status.
async fn update_employee_status(
    State(state): State<AppState>,
    path: Result<Path<i64>, PathRejection>,
    payload: Result<Json<UpdateStatusRequest>, JsonRejection>,
) -> HandlerResult<Json<Employee>> {
    let correlation_id = Uuid::new_v4();
    let id = path_id(correlation_id, path)?;
    let request = json_body(correlation_id, payload)?;

    let terminated_on = request
        .termination_date()
        .map_err(|err| failure(correlation_id, "update_employee_status", err))?;
    let employee = state
        .store()
        .update_employee_status(id, request.status, terminated_on)
        .await
        .map_err(|err| failure(correlation_id, "update_employee_status", err))?;

    info!(
        correlation_id = %correlation_id,
        employee_id = employee.id,
        status = employee.status.as_str(),
        "Employee status updated"
    );
    Ok(Json(employee))
}

/// Handler for POST /api/v1/payroll/runs.
async fn create_run(
    State(state): State<AppState>,
    Extension(claims): Extension<Claims>,
    payload: Result<Json<CreateRunRequest>, JsonRejection>,
) -> HandlerResult<impl IntoResponse> {
    let correlation_id = Uuid::new_v4();
    let request = json_body(correlation_id, payload)?;

    let (year, month) = request
        .period()
        .map_err(|err| failure(correlation_id, "create_run", err))?;
    let run = state
        .materializer()
        .create_run(year, month)
        .await
        .map_err(|err| failure(correlation_id, "create_run", err))?;

    info!(
        correlation_id = %correlation_id,
        run_id = run.id,
        period = %run.period_label(),
        requested_by = %claims.sub,
        "Payroll run ready"
    );
    Ok((StatusCode::CREATED, Json(run)))
}

/// Handler for POST /api/v1/payroll/runs/:id/calculate.
async fn calculate_run(
    State(state): State<AppState>,
    Extension(claims): Extension<Claims>,
    path: Result<Path<i64>, PathRejection>,
) -> HandlerResult<Json<CalculateResponse>> {
    let correlation_id = Uuid::new_v4();
    let run_id = path_id(correlation_id, path)?;
    info!(
        correlation_id = %correlation_id,
        run_id,
        requested_by = %claims.sub,
        "Processing calculation request"
    );

    let calculated = state
        .materializer()
        .calculate(run_id)
        .await
        .map_err(|err| failure(correlation_id, "calculate", err))?;

    Ok(Json(CalculateResponse { calculated }))
}

/// Handler for GET /api/v1/payroll/runs/:id/items.
async fn list_run_items(
    State(state): State<AppState>,
    path: Result<Path<i64>, PathRejection>,
) -> HandlerResult<Json<Vec<crate::models::PayrollItem>>> {
    let correlation_id = Uuid::new_v4();
    let run_id = path_id(correlation_id, path)?;
    let items = state
        .materializer()
        .list_items(run_id)
        .await
        .map_err(|err| failure(correlation_id, "list_items", err))?;

    Ok(Json(items))
}

/// Handler for GET /api/v1/payroll/runs/period/:period/items.
async fn list_items_by_period(
    State(state): State<AppState>,
    Path(period): Path<String>,
) -> HandlerResult<Json<RunItemsResponse>> {
    let correlation_id = Uuid::new_v4();
    let (year, month) =
        parse_period(&period).map_err(|err| failure(correlation_id, "items_by_period", err))?;

    let (run, items) = state
        .materializer()
        .get_or_create_by_period(year, month)
        .await
        .map_err(|err| failure(correlation_id, "items_by_period", err))?;

    info!(
        correlation_id = %correlation_id,
        run_id = run.id,
        items = items.len(),
        "Listed payroll items by period"
    );
    Ok(Json(RunItemsResponse { run, items }))
}

/// Handler for POST /api/v1/payroll/items/:id.
async fn override_item(
    State(state): State<AppState>,
    path: Result<Path<i64>, PathRejection>,
    payload: Result<Json<PayrollItemOverride>, JsonRejection>,
) -> HandlerResult<Json<crate::models::PayrollItem>> {
    let correlation_id = Uuid::new_v4();
    let item_id = path_id(correlation_id, path)?;
    let changes = json_body(correlation_id, payload)?;

    let item = state
        .materializer()
        .override_item(item_id, changes)
        .await
        .map_err(|err| failure(correlation_id, "override_item", err))?;

    Ok(Json(item))
}

/// Handler for GET /api/v1/leave.
async fn list_leaves(State(state): State<AppState>) -> HandlerResult<impl IntoResponse> {
    let correlation_id = Uuid::new_v4();
    let leaves = state
        .store()
        .list_leaves()
        .await
        .map_err(|err| failure(correlation_id, "list_leaves", err))?;

    Ok(Json(leaves))
}

/// Handler for POST /api/v1/leave.
async fn create_leave(
    State(state): State<AppState>,
    payload: Result<Json<CreateLeaveRequest>, JsonRejection>,
) -> HandlerResult<impl IntoResponse> {
    let correlation_id = Uuid::new_v4();
    let request = json_body(correlation_id, payload)?;

    let leave = NewLeave::try_from(request)
        .map_err(|err| failure(correlation_id, "create_leave", err))?;
    let leave = state
        .store()
        .create_leave(leave)
        .await
        .map_err(|err| failure(correlation_id, "create_leave", err))?;

    info!(
        correlation_id = %correlation_id,
        leave_id = leave.id,
        employee_id = leave.employee_id,
        "Leave recorded"
    );
    Ok((StatusCode::CREATED, Json(leave)))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::{AuthConfig, DeductionConfig};
    use crate::models::{PayrollItem, PayrollRun};
    use crate::storage::{InMemoryStore, PayrollStore};
    use axum::{
        body::Body,
        http::{Request, header},
    };
    use chrono::NaiveDate;
    use rust_decimal::Decimal;
    use std::sync::Arc;
    use tower::ServiceExt;

    fn create_test_state() -> AppState {
        let store: Arc<dyn PayrollStore> = Arc::new(InMemoryStore::new());
        AppState::new(store, DeductionConfig::default(), AuthConfig::default())
    }

    fn bearer(state: &AppState) -> String {
        let (token, _) = issue_token(state.auth(), "admin@example.com").unwrap();
        format!("Bearer {}", token)
    }

    async fn seed_employee(state: &AppState, code: &str, salary: i64) -> Employee {
        state
            .store()
            .create_employee(NewEmployee::new(
                code,
                "Test",
                code,
                Decimal::new(salary, 0),
                NaiveDate::from_ymd_opt(2024, 1, 1).unwrap(),
            ))
            .await
            .unwrap()
    }

    async fn read_json<T: serde::de::DeserializeOwned>(response: axum::response::Response) -> T {
        let body = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        serde_json::from_slice(&body).unwrap()
    }

    #[tokio::test]
    async fn test_health_is_public() {
        let router = create_router(create_test_state());
        let response = router
            .oneshot(Request::builder().uri("/health").body(Body::empty()).unwrap())
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);
    }

    #[tokio::test]
    async fn test_missing_token_returns_401() {
        let router = create_router(create_test_state());
        let response = router
            .oneshot(
                Request::builder()
                    .uri("/api/v1/employees")
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::UNAUTHORIZED);

        let error: ApiError = read_json(response).await;
        assert_eq!(error.code, "UNAUTHORIZED");
    }

    #[tokio::test]
    async fn test_tampered_token_returns_401() {
        let state = create_test_state();
        let router = create_router(state.clone());
        let response = router
            .oneshot(
                Request::builder()
                    .uri("/api/v1/leave")
                    .header(header::AUTHORIZATION, format!("{}x", bearer(&state)))
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
    }

    #[tokio::test]
    async fn test_login_issues_usable_token() {
        let router = create_router(create_test_state());
        let response = router
            .clone()
            .oneshot(
                Request::builder()
                    .method("POST")
                    .uri("/api/v1/auth/login")
                    .header("Content-Type", "application/json")
                    .body(Body::from(
                        r#"{"email":"admin@example.com","password":"Admin@123"}"#,
                    ))
                    .unwrap(),
            )
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        let login: LoginResponse = read_json(response).await;

        let response = router
            .oneshot(
                Request::builder()
                    .uri("/api/v1/employees")
                    .header(header::AUTHORIZATION, format!("Bearer {}", login.token))
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);
    }

    #[tokio::test]
    async fn test_login_with_wrong_password_returns_401() {
        let router = create_router(create_test_state());
        let response = router
            .oneshot(
                Request::builder()
                    .method("POST")
                    .uri("/api/v1/auth/login")
                    .header("Content-Type", "application/json")
                    .body(Body::from(
                        r#"{"email":"admin@example.com","password":"nope"}"#,
                    ))
                    .unwrap(),
            )
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
    }

    #[tokio::test]
    async fn test_create_run_invalid_month_returns_400() {
        let state = create_test_state();
        let router = create_router(state.clone());
        let response = router
            .oneshot(
                Request::builder()
                    .method("POST")
                    .uri("/api/v1/payroll/runs")
                    .header("Content-Type", "application/json")
                    .header(header::AUTHORIZATION, bearer(&state))
                    .body(Body::from(r#"{"year":2025,"month":13}"#))
                    .unwrap(),
            )
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);

        let error: ApiError = read_json(response).await;
        assert_eq!(error.code, "INVALID_PERIOD");
    }

    #[tokio::test]
    async fn test_create_and_calculate_run() {
        let state = create_test_state();
        seed_employee(&state, "E001", 50000).await;
        seed_employee(&state, "E002", 45000).await;
        let router = create_router(state.clone());

        let response = router
            .clone()
            .oneshot(
                Request::builder()
                    .method("POST")
                    .uri("/api/v1/payroll/runs")
                    .header("Content-Type", "application/json")
                    .header(header::AUTHORIZATION, bearer(&state))
                    .body(Body::from(r#"{"pay_date":"2025-09-25"}"#))
                    .unwrap(),
            )
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::CREATED);
        let run: PayrollRun = read_json(response).await;
        assert_eq!((run.period_year, run.period_month), (2025, 9));

        let response = router
            .clone()
            .oneshot(
                Request::builder()
                    .method("POST")
                    .uri(format!("/api/v1/payroll/runs/{}/calculate", run.id))
                    .header(header::AUTHORIZATION, bearer(&state))
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        let calculated: CalculateResponse = read_json(response).await;
        assert_eq!(calculated.calculated, 2);

        let response = router
            .oneshot(
                Request::builder()
                    .uri(format!("/api/v1/payroll/runs/{}/items", run.id))
                    .header(header::AUTHORIZATION, bearer(&state))
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();
        let items: Vec<PayrollItem> = read_json(response).await;
        assert_eq!(items.len(), 2);
        assert_eq!(items[0].reference(), format!("RUN-{}", run.id));
    }

    #[tokio::test]
    async fn test_calculate_unknown_run_returns_404() {
        let state = create_test_state();
        let router = create_router(state.clone());
        let response = router
            .oneshot(
                Request::builder()
                    .method("POST")
                    .uri("/api/v1/payroll/runs/99/calculate")
                    .header(header::AUTHORIZATION, bearer(&state))
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn test_non_numeric_ids_return_json_400() {
        let state = create_test_state();
        let router = create_router(state.clone());
        let requests = [
            ("POST", "/api/v1/payroll/runs/abc/calculate"),
            ("GET", "/api/v1/payroll/runs/abc/items"),
        ];

        for (method, uri) in requests {
            let response = router
                .clone()
                .oneshot(
                    Request::builder()
                        .method(method)
                        .uri(uri)
                        .header(header::AUTHORIZATION, bearer(&state))
                        .body(Body::empty())
                        .unwrap(),
                )
                .await
                .unwrap();
            assert_eq!(response.status(), StatusCode::BAD_REQUEST, "{method} {uri}");

            let error: ApiError = read_json(response).await;
            assert_eq!(error.code, "INVALID_PATH");
            assert!(!error.message.is_empty());
        }
    }

    #[tokio::test]
    async fn test_non_numeric_employee_id_returns_json_400() {
        let state = create_test_state();
        let router = create_router(state.clone());
        let response = router
            .oneshot(
                Request::builder()
                    .method("PUT")
                    .uri("/api/v1/employees/99999999999999999999/status")
                    .header("Content-Type", "application/json")
                    .header(header::AUTHORIZATION, bearer(&state))
                    .body(Body::from(r#"{"status":"active"}"#))
                    .unwrap(),
            )
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);

        let error: ApiError = read_json(response).await;
        assert_eq!(error.code, "INVALID_PATH");
    }

    #[tokio::test]
    async fn test_bad_list_query_returns_json_400() {
        let state = create_test_state();
        let router = create_router(state.clone());
        let response = router
            .oneshot(
                Request::builder()
                    .uri("/api/v1/employees?limit=lots")
                    .header(header::AUTHORIZATION, bearer(&state))
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);

        let error: ApiError = read_json(response).await;
        assert_eq!(error.code, "VALIDATION_ERROR");
    }

    #[tokio::test]
    async fn test_items_by_period_bad_designator_returns_400() {
        let state = create_test_state();
        let router = create_router(state.clone());
        let response = router
            .oneshot(
                Request::builder()
                    .uri("/api/v1/payroll/runs/period/September/items")
                    .header(header::AUTHORIZATION, bearer(&state))
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn test_employee_search_and_paging() {
        let state = create_test_state();
        for code in ["E001", "E002", "X003"] {
            seed_employee(&state, code, 30000).await;
        }
        let router = create_router(state.clone());

        let response = router
            .oneshot(
                Request::builder()
                    .uri("/api/v1/employees?q=e00&limit=1&offset=1")
                    .header(header::AUTHORIZATION, bearer(&state))
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();
        let page: PageResponse<Employee> = read_json(response).await;
        assert_eq!(page.total, 2);
        assert_eq!(page.data.len(), 1);
        assert_eq!(page.data[0].code, "E002");
    }

    #[tokio::test]
    async fn test_create_employee_malformed_json_returns_400() {
        let state = create_test_state();
        let router = create_router(state.clone());
        let response = router
            .oneshot(
                Request::builder()
                    .method("POST")
                    .uri("/api/v1/employees")
                    .header("Content-Type", "application/json")
                    .header(header::AUTHORIZATION, bearer(&state))
                    .body(Body::from("{invalid json"))
                    .unwrap(),
            )
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
        let error: ApiError = read_json(response).await;
        assert_eq!(error.code, "MALFORMED_JSON");
    }
}
