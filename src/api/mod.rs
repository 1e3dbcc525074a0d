//! HTTP API module for the payroll engine.
//!
//! This module provides the REST endpoints for employees, leave, and payroll
//! runs, guarded by bearer-token authentication.

mod auth;
mod handlers;
mod request;
mod response;
mod state;

pub use auth::{Claims, hash_password, issue_token, verify_password, verify_token};
pub use handlers::create_router;
pub use request::{CreateEmployeeRequest, CreateLeaveRequest, CreateRunRequest};
pub use response::{ApiError, ApiErrorResponse, CalculateResponse, LoginResponse, RunItemsResponse};
pub use state::AppState;
