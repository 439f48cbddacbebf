use axum::{
    extract::{rejection::JsonRejection, State},
    http::StatusCode,
    Json,
};
use common::types::ApiResponse;
use service::portal::domain::{Account, ComplaintRefInput, Record, RegisterInput, SecretCodeInput, SubmitComplaintInput};

use super::AppState;
use crate::{errors::ApiError, metrics};

type Reply<T> = Result<(StatusCode, Json<ApiResponse<T>>), ApiError>;

fn reply<T>(status: StatusCode, message: &str, data: T) -> Reply<T> {
    Ok((status, Json(ApiResponse::ok(message, data))))
}

pub async fn register(State(state): State<AppState>, body: Result<Json<RegisterInput>, JsonRejection>) -> Reply<Account> {
    let Json(input) = body?;
    let user = state.portal.register(input)?;
    metrics::REGISTRATIONS_TOTAL.inc();
    metrics::observe(state.portal.stats());
    reply(StatusCode::CREATED, "User registered successfully", user)
}

pub async fn login(State(state): State<AppState>, body: Result<Json<SecretCodeInput>, JsonRejection>) -> Reply<Account> {
    let Json(input) = body?;
    let user = state.portal.login(input)?;
    reply(StatusCode::OK, "Login successful", user)
}

pub async fn submit_complaint(
    State(state): State<AppState>,
    body: Result<Json<SubmitComplaintInput>, JsonRejection>,
) -> Reply<Record> {
    let Json(input) = body?;
    let complaint = state.portal.submit_complaint(input)?;
    metrics::COMPLAINTS_SUBMITTED_TOTAL.inc();
    metrics::observe(state.portal.stats());
    reply(StatusCode::CREATED, "Complaint submitted successfully", complaint)
}

pub async fn complaints_for_user(
    State(state): State<AppState>,
    body: Result<Json<SecretCodeInput>, JsonRejection>,
) -> Reply<Vec<Record>> {
    let Json(input) = body?;
    let complaints = state.portal.complaints_for_user(input)?;
    reply(StatusCode::OK, "User complaints retrieved successfully", complaints)
}

pub async fn complaints_for_admin(
    State(state): State<AppState>,
    body: Result<Json<SecretCodeInput>, JsonRejection>,
) -> Reply<Vec<Record>> {
    let Json(input) = body?;
    let complaints = state.portal.complaints_for_admin(input)?;
    reply(StatusCode::OK, "All complaints retrieved successfully", complaints)
}

pub async fn view_complaint(
    State(state): State<AppState>,
    body: Result<Json<ComplaintRefInput>, JsonRejection>,
) -> Reply<Record> {
    let Json(input) = body?;
    let complaint = state.portal.view_complaint(input)?;
    reply(StatusCode::OK, "Complaint retrieved successfully", complaint)
}

pub async fn resolve_complaint(
    State(state): State<AppState>,
    body: Result<Json<ComplaintRefInput>, JsonRejection>,
) -> Reply<Record> {
    let Json(input) = body?;
    let complaint = state.portal.resolve_complaint(input)?;
    metrics::COMPLAINTS_RESOLVED_TOTAL.inc();
    metrics::observe(state.portal.stats());
    reply(StatusCode::OK, "Complaint resolved successfully", complaint)
}
