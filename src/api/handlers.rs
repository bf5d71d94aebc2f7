//! HTTP request handlers for the payroll API.
//!
//! This module contains the router and the handler functions for all
//! endpoints.

use axum::{
    Json, Router,
    extract::{Path, State, rejection::JsonRejection},
    http::{StatusCode, header},
    response::{IntoResponse, Response},
    routing::{delete, post, put},
};
use serde::Serialize;
use tracing::{info, warn};
use uuid::Uuid;

use crate::error::EngineError;

use super::request::{ContractorPayrollRequest, ContractorWeekRequest, PayrollRequest};
use super::response::{ApiError, ApiErrorResponse, BatchResponse, ContractorBatchResponse};
use super::state::AppState;

/// Creates the API router with all endpoints.
pub fn create_router(state: AppState) -> Router {
    Router::new()
        .route("/projects/:project_id/payroll/preview", post(preview_handler))
        .route(
            "/projects/:project_id/payroll/batches",
            post(create_batch_handler).get(list_batches_handler),
        )
        .route(
            "/projects/:project_id/payroll/batches/:batch_id",
            put(replace_batch_handler).delete(delete_batch_handler),
        )
        .route(
            "/projects/:project_id/contractor-payroll/batches",
            post(create_contractor_batch_handler).get(list_contractor_batches_handler),
        )
        .route(
            "/projects/:project_id/contractor-payroll/batches/:batch_id",
            delete(delete_contractor_batch_handler),
        )
        .route(
            "/projects/:project_id/contractors/:contractor_id/attendance",
            put(record_contractor_week_handler),
        )
        .with_state(state)
}

/// Handler for POST /projects/:project_id/payroll/preview.
///
/// Computes a batch and returns it with its audit trace; nothing is stored.
async fn preview_handler(
    State(state): State<AppState>,
    Path(project_id): Path<String>,
    payload: Result<Json<PayrollRequest>, JsonRejection>,
) -> Response {
    let correlation_id = Uuid::new_v4();
    info!(
        correlation_id = %correlation_id,
        project = %project_id,
        "Processing payroll preview"
    );

    let body = match parse_body(correlation_id, payload) {
        Ok(body) => body,
        Err(response) => return response,
    };
    let request = match body.into_batch_request(&project_id) {
        Ok(request) => request,
        Err(err) => return error_response(correlation_id, err),
    };

    match state.service().prepare_batch(&request).await {
        Ok(prepared) => json_response(StatusCode::OK, BatchResponse::from_prepared(prepared, false)),
        Err(err) => error_response(correlation_id, err),
    }
}

/// Handler for POST /projects/:project_id/payroll/batches.
async fn create_batch_handler(
    State(state): State<AppState>,
    Path(project_id): Path<String>,
    payload: Result<Json<PayrollRequest>, JsonRejection>,
) -> Response {
    let correlation_id = Uuid::new_v4();
    info!(
        correlation_id = %correlation_id,
        project = %project_id,
        "Processing payroll batch"
    );

    let body = match parse_body(correlation_id, payload) {
        Ok(body) => body,
        Err(response) => return response,
    };
    let request = match body.into_batch_request(&project_id) {
        Ok(request) => request,
        Err(err) => return error_response(correlation_id, err),
    };

    match state.service().create_batch(&request).await {
        Ok(prepared) => {
            info!(
                correlation_id = %correlation_id,
                batch_id = %prepared.batch.id,
                pay_date = %prepared.batch.pay_date,
                "Payroll batch created"
            );
            json_response(StatusCode::CREATED, BatchResponse::from_prepared(prepared, true))
        }
        Err(err) => error_response(correlation_id, err),
    }
}

/// Handler for PUT /projects/:project_id/payroll/batches/:batch_id.
///
/// Recomputes the batch from the body and replaces the stored one.
async fn replace_batch_handler(
    State(state): State<AppState>,
    Path((project_id, batch_id)): Path<(String, Uuid)>,
    payload: Result<Json<PayrollRequest>, JsonRejection>,
) -> Response {
    let correlation_id = Uuid::new_v4();
    info!(
        correlation_id = %correlation_id,
        project = %project_id,
        batch_id = %batch_id,
        "Processing payroll batch replacement"
    );

    let body = match parse_body(correlation_id, payload) {
        Ok(body) => body,
        Err(response) => return response,
    };
    let request = match body.into_batch_request(&project_id) {
        Ok(request) => request,
        Err(err) => return error_response(correlation_id, err),
    };

    match state.service().replace_batch(batch_id, &request).await {
        Ok(prepared) => json_response(StatusCode::OK, BatchResponse::from_prepared(prepared, true)),
        Err(err) => error_response(correlation_id, err),
    }
}

/// Handler for GET /projects/:project_id/payroll/batches.
async fn list_batches_handler(
    State(state): State<AppState>,
    Path(project_id): Path<String>,
) -> Response {
    let correlation_id = Uuid::new_v4();
    match state.service().list_batches(&project_id).await {
        Ok(batches) => json_response(StatusCode::OK, batches),
        Err(err) => error_response(correlation_id, err),
    }
}

/// Handler for DELETE /projects/:project_id/payroll/batches/:batch_id.
async fn delete_batch_handler(
    State(state): State<AppState>,
    Path((project_id, batch_id)): Path<(String, Uuid)>,
) -> Response {
    let correlation_id = Uuid::new_v4();
    match state.service().delete_batch(&project_id, batch_id).await {
        Ok(removed) => json_response(StatusCode::OK, removed),
        Err(err) => error_response(correlation_id, err),
    }
}

/// Handler for POST /projects/:project_id/contractor-payroll/batches.
async fn create_contractor_batch_handler(
    State(state): State<AppState>,
    Path(project_id): Path<String>,
    payload: Result<Json<ContractorPayrollRequest>, JsonRejection>,
) -> Response {
    let correlation_id = Uuid::new_v4();
    info!(
        correlation_id = %correlation_id,
        project = %project_id,
        "Processing contractor payroll batch"
    );

    let body = match parse_body(correlation_id, payload) {
        Ok(body) => body,
        Err(response) => return response,
    };
    let request = match body.into_batch_request(&project_id) {
        Ok(request) => request,
        Err(err) => return error_response(correlation_id, err),
    };

    match state.service().create_contractor_batch(&request).await {
        Ok(prepared) => json_response(
            StatusCode::CREATED,
            ContractorBatchResponse::from_prepared(prepared, true),
        ),
        Err(err) => error_response(correlation_id, err),
    }
}

/// Handler for GET /projects/:project_id/contractor-payroll/batches.
async fn list_contractor_batches_handler(
    State(state): State<AppState>,
    Path(project_id): Path<String>,
) -> Response {
    let correlation_id = Uuid::new_v4();
    match state.service().list_contractor_batches(&project_id).await {
        Ok(batches) => json_response(StatusCode::OK, batches),
        Err(err) => error_response(correlation_id, err),
    }
}

/// Handler for DELETE /projects/:project_id/contractor-payroll/batches/:batch_id.
async fn delete_contractor_batch_handler(
    State(state): State<AppState>,
    Path((project_id, batch_id)): Path<(String, Uuid)>,
) -> Response {
    let correlation_id = Uuid::new_v4();
    match state
        .service()
        .delete_contractor_batch(&project_id, batch_id)
        .await
    {
        Ok(removed) => json_response(StatusCode::OK, removed),
        Err(err) => error_response(correlation_id, err),
    }
}

/// Handler for PUT /projects/:project_id/contractors/:contractor_id/attendance.
///
/// Records a week of headcount for one contractor. A count above the
/// contractor's max personnel rejects the whole week.
async fn record_contractor_week_handler(
    State(state): State<AppState>,
    Path((project_id, contractor_id)): Path<(String, String)>,
    payload: Result<Json<ContractorWeekRequest>, JsonRejection>,
) -> Response {
    let correlation_id = Uuid::new_v4();
    info!(
        correlation_id = %correlation_id,
        project = %project_id,
        contractor_id = %contractor_id,
        "Recording contractor headcount"
    );

    let request = match parse_body(correlation_id, payload) {
        Ok(request) => request,
        Err(response) => return response,
    };

    match state
        .service()
        .record_contractor_week(&project_id, &contractor_id, request.week_of, &request.days)
        .await
    {
        Ok(records) => json_response(StatusCode::OK, records),
        Err(err) => error_response(correlation_id, err),
    }
}

/// Unwraps a JSON body or turns the rejection into an error response.
fn parse_body<T>(
    correlation_id: Uuid,
    payload: Result<Json<T>, JsonRejection>,
) -> Result<T, Response> {
    let rejection = match payload {
        Ok(Json(body)) => return Ok(body),
        Err(rejection) => rejection,
    };

    let error = match rejection {
        JsonRejection::JsonDataError(err) => {
            // The body text carries serde's detailed message
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
    Err(json_response(StatusCode::BAD_REQUEST, error))
}

fn error_response(correlation_id: Uuid, err: EngineError) -> Response {
    if err.is_validation() {
        info!(correlation_id = %correlation_id, error = %err, "Request rejected");
    } else {
        warn!(correlation_id = %correlation_id, error = %err, "Request failed");
    }
    let api_error: ApiErrorResponse = err.into();
    json_response(api_error.status, api_error.error)
}

fn json_response<T: Serialize>(status: StatusCode, body: T) -> Response {
    (
        status,
        [(header::CONTENT_TYPE, "application/json")],
        Json(body),
    )
        .into_response()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::PayrollConfig;
    use crate::service::PayrollService;
    use crate::store::MemoryStore;
    use axum::body::Body;
    use axum::http::Request;
    use std::sync::Arc;
    use tower::ServiceExt;

    fn create_test_state() -> AppState {
        let store = Arc::new(MemoryStore::new());
        AppState::new(PayrollService::new(
            PayrollConfig::default(),
            store.clone(),
            store.clone(),
            store.clone(),
            store,
        ))
    }

    async fn send(
        router: Router,
        method: &str,
        uri: &str,
        body: &str,
    ) -> (StatusCode, serde_json::Value) {
        let response = router
            .oneshot(
                Request::builder()
                    .method(method)
                    .uri(uri)
                    .header("Content-Type", "application/json")
                    .body(Body::from(body.to_string()))
                    .unwrap(),
            )
            .await
            .unwrap();

        let status = response.status();
        let body = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        (status, serde_json::from_slice(&body).unwrap())
    }

    #[tokio::test]
    async fn test_api_001_malformed_json_returns_400() {
        let router = create_router(create_test_state());
        let (status, json) =
            send(router, "POST", "/projects/proj_01/payroll/preview", "{ invalid").await;

        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(json["code"], "MALFORMED_JSON");
    }

    #[tokio::test]
    async fn test_api_002_missing_pay_date_returns_validation_error() {
        let router = create_router(create_test_state());
        let (status, json) = send(
            router,
            "POST",
            "/projects/proj_01/payroll/preview",
            r#"{"exchange_rate": "36"}"#,
        )
        .await;

        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(json["code"], "VALIDATION_ERROR");
    }

    #[tokio::test]
    async fn test_api_003_missing_exchange_rate_returns_400() {
        let router = create_router(create_test_state());
        let (status, json) = send(
            router,
            "POST",
            "/projects/proj_01/payroll/batches",
            r#"{"pay_date": "2026-01-16"}"#,
        )
        .await;

        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(json["code"], "VALIDATION_ERROR");
        assert_eq!(json["details"], "exchange_rate");
    }

    #[tokio::test]
    async fn test_api_004_empty_roster_is_unprocessable() {
        let router = create_router(create_test_state());
        let (status, json) = send(
            router,
            "POST",
            "/projects/proj_01/payroll/preview",
            r#"{"pay_date": "2026-01-16", "exchange_rate": "36"}"#,
        )
        .await;

        assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
        assert_eq!(json["code"], "NO_ELIGIBLE_EMPLOYEES");
    }

    #[tokio::test]
    async fn test_api_005_unknown_contractor_returns_404() {
        let router = create_router(create_test_state());
        let (status, json) = send(
            router,
            "PUT",
            "/projects/proj_01/contractors/ctr_99/attendance",
            r#"{"week_of": "2026-01-12", "days": {}}"#,
        )
        .await;

        assert_eq!(status, StatusCode::NOT_FOUND);
        assert_eq!(json["code"], "CONTRACTOR_NOT_FOUND");
    }
}
