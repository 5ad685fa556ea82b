// ==============================================================================
// handlers.rs - API Request Handlers
// ==============================================================================
// Description: HTTP handlers for the /result variant resource
// Author: Matt Barham
// Created: 2026-10-17
// Modified: 2026-10-17
// Version: 1.0.0
// ==============================================================================
//
// Every request loads the whole table from disk; mutating requests then write
// it back in full. All input checks run before the save, so a rejected request
// never changes the stored table.
//
// ==============================================================================

use axum::{
    body::Bytes,
    extract::{rejection::QueryRejection, Query, State},
    http::{header, HeaderMap, StatusCode},
    response::{IntoResponse, Response},
    Json,
};
use chrono::Utc;
use serde_json::{Map, Value};
use thiserror::Error;
use tracing::{debug, error, info};
use ::validator::Validate;

use crate::{
    conditional::{etag_value, fingerprint, is_unmodified},
    middleware::SharedSecret,
    models::*,
    negotiate::{negotiate, NegotiationError, MIME_JSON},
    query::{paginate, select, Page},
    state::AppState,
    store::StoreError,
    validator::{error_messages, unknown_fields, validate_record, ResultQuery},
};

/// Root endpoint - API information
pub async fn root() -> Json<ApiInfoResponse> {
    Json(ApiInfoResponse {
        service: "Variant Result API",
        version: env!("CARGO_PKG_VERSION"),
        endpoints: vec![
            "/health - Health check",
            "/ready - Readiness check",
            "/result?id=<rsID>&page=<n>&per_page=<n> - Query variants (GET)",
            "/result - Create variant (POST)",
            "/result?id=<rsID> - Update variants (PUT) or delete them (DELETE)",
        ],
    })
}

/// Health check endpoint
pub async fn health_check() -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "ok",
        version: env!("CARGO_PKG_VERSION"),
        timestamp: Utc::now(),
    })
}

/// Readiness check endpoint
pub async fn readiness_check(State(state): State<AppState>) -> impl IntoResponse {
    let config = state.store().config();
    let store = config.store_path.exists();
    let source = config.source_path.exists();
    let ready = state.store().is_available();

    let status = if ready {
        StatusCode::OK
    } else {
        StatusCode::SERVICE_UNAVAILABLE
    };

    (status, Json(ReadinessResponse { ready, store, source }))
}

/// Query variants by ID
///
/// A matching `If-None-Match` short-circuits before the store is touched.
pub async fn get_result(
    State(state): State<AppState>,
    headers: HeaderMap,
    query: Result<Query<ResultQuery>, QueryRejection>,
) -> Result<Response, AppError> {
    let Query(query) = query.map_err(|e| AppError::BadRequest(e.body_text()))?;
    query
        .validate()
        .map_err(|e| AppError::InvalidParameters(error_messages(&e)))?;

    let id = require_id(&query)?;
    let page = page_from(&query, state.config().default_per_page)?;

    let fingerprint = fingerprint(id, page.number, page.per_page);
    let validators = header_values(&headers, header::IF_NONE_MATCH);
    if is_unmodified(&fingerprint, validators) {
        debug!("Conditional GET hit for {}", fingerprint);
        return Ok((
            StatusCode::NOT_MODIFIED,
            [(header::ETAG, etag_value(&fingerprint))],
            Json(MessageResponse {
                message: "Not modified".to_string(),
            }),
        )
            .into_response());
    }

    let table = load_table(&state).await?;
    let matches = select(&table.rows, id);
    let (window, meta) = paginate(&matches, page);

    let envelope = ResultEnvelope {
        meta,
        data: record_data(window.iter().copied()),
    };

    let rendered = negotiate(header_values(&headers, header::ACCEPT), &envelope)?;

    if matches.is_empty() {
        return Err(AppError::NotFound(format!("No variant with ID '{}'", id)));
    }

    info!(
        "GET /result id={} page={} per_page={}: {} of {} matches",
        id,
        page.number,
        page.per_page,
        window.len(),
        matches.len()
    );

    Ok((
        StatusCode::OK,
        [
            (header::CONTENT_TYPE, rendered.mime_type.to_string()),
            (header::ETAG, etag_value(&fingerprint)),
        ],
        rendered.body,
    )
        .into_response())
}

/// Create a variant
pub async fn create_result(
    _auth: SharedSecret,
    State(state): State<AppState>,
    headers: HeaderMap,
    body: Bytes,
) -> Result<(StatusCode, Json<MutationResponse>), AppError> {
    let payload = json_payload(&headers, &body)?;
    check_record(&payload)?;

    let mut table = load_table(&state).await?;
    check_columns(&payload, &table)?;

    let placeholder = &state.config().placeholder;
    let fields = table
        .columns
        .iter()
        .map(|column| {
            let value = match payload.get(column) {
                Some(value) => FieldValue::from_json(column, value),
                None => FieldValue::Text(placeholder.clone()),
            };
            (column.clone(), value)
        })
        .collect();

    let record = VariantRecord {
        index: table.next_index(),
        fields,
    };
    table.rows.push(record.clone());

    save_table(&state, table).await?;
    info!("Created variant {} at index {}", id_of(&payload), record.index);

    Ok((
        StatusCode::CREATED,
        Json(MutationResponse {
            message: "Variant created".to_string(),
            data: record_data([&record]),
        }),
    ))
}

/// Overwrite fields on every variant with the given ID
pub async fn update_result(
    _auth: SharedSecret,
    State(state): State<AppState>,
    query: Result<Query<ResultQuery>, QueryRejection>,
    headers: HeaderMap,
    body: Bytes,
) -> Result<Json<MutationResponse>, AppError> {
    let Query(query) = query.map_err(|e| AppError::BadRequest(e.body_text()))?;
    let id = require_id(&query)?;
    let payload = json_payload(&headers, &body)?;
    check_record(&payload)?;

    let mut table = load_table(&state).await?;
    check_columns(&payload, &table)?;

    // Positions are collected first because the payload may change the ID
    let positions: Vec<usize> = table
        .rows
        .iter()
        .enumerate()
        .filter(|(_, row)| row.matches_id(id))
        .map(|(position, _)| position)
        .collect();

    if positions.is_empty() {
        return Err(AppError::NotFound(format!("No variant with ID '{}'", id)));
    }

    for &position in &positions {
        let row = &mut table.rows[position];
        for (column, value) in &payload {
            if let Some(field) = row.fields.get_mut(column) {
                *field = FieldValue::from_json(column, value);
            }
        }
    }

    let data = record_data(positions.iter().map(|&position| &table.rows[position]));
    save_table(&state, table).await?;
    info!("Updated {} variant(s) with ID {}", positions.len(), id);

    Ok(Json(MutationResponse {
        message: format!("Updated {} variant(s)", positions.len()),
        data,
    }))
}

/// Remove every variant with the given ID
pub async fn delete_result(
    _auth: SharedSecret,
    State(state): State<AppState>,
    query: Result<Query<ResultQuery>, QueryRejection>,
) -> Result<StatusCode, AppError> {
    let Query(query) = query.map_err(|e| AppError::BadRequest(e.body_text()))?;
    let id = require_id(&query)?;

    let mut table = load_table(&state).await?;
    let before = table.rows.len();
    table.rows.retain(|row| !row.matches_id(id));
    let removed = before - table.rows.len();

    if removed == 0 {
        return Err(AppError::NotFound(format!("No variant with ID '{}'", id)));
    }

    save_table(&state, table).await?;
    info!("Deleted {} variant(s) with ID {}", removed, id);

    Ok(StatusCode::NO_CONTENT)
}

fn require_id(query: &ResultQuery) -> Result<&str, AppError> {
    query
        .id
        .as_deref()
        .ok_or_else(|| AppError::BadRequest("Missing required query parameter 'id'".to_string()))
}

fn page_from(query: &ResultQuery, default_per_page: u32) -> Result<Page, AppError> {
    let to_usize = |value: i64, name: &str| {
        usize::try_from(value)
            .map_err(|_| AppError::BadRequest(format!("{} is out of range", name)))
    };

    Ok(Page {
        number: to_usize(query.page.unwrap_or(1), "page")?,
        per_page: to_usize(
            query.per_page.unwrap_or_else(|| i64::from(default_per_page)),
            "per_page",
        )?,
    })
}

fn header_values(headers: &HeaderMap, name: header::HeaderName) -> impl Iterator<Item = &str> {
    headers
        .get_all(name)
        .into_iter()
        .map(|value| value.to_str().unwrap_or_default())
}

/// Require a JSON content type and a JSON object body
fn json_payload(headers: &HeaderMap, body: &Bytes) -> Result<Map<String, Value>, AppError> {
    let content_type = headers
        .get(header::CONTENT_TYPE)
        .and_then(|value| value.to_str().ok())
        .unwrap_or_default();
    let mime = content_type.split(';').next().unwrap_or_default().trim();

    if !mime.eq_ignore_ascii_case(MIME_JSON) {
        return Err(AppError::BadRequest(format!(
            "Unsupported content type '{}', expected {}",
            content_type, MIME_JSON
        )));
    }

    match serde_json::from_slice::<Value>(body) {
        Ok(Value::Object(map)) => Ok(map),
        Ok(_) => Err(AppError::BadRequest(
            "Request body must be a JSON object".to_string(),
        )),
        Err(e) => Err(AppError::BadRequest(format!("Invalid JSON body: {}", e))),
    }
}

fn check_record(payload: &Map<String, Value>) -> Result<(), AppError> {
    validation_result(validate_record(payload))
}

/// Sample columns are only known once the table is loaded
fn check_columns(payload: &Map<String, Value>, table: &Table) -> Result<(), AppError> {
    validation_result(unknown_fields(payload, &table.columns))
}

fn validation_result(violations: Vec<String>) -> Result<(), AppError> {
    if violations.is_empty() {
        Ok(())
    } else {
        Err(AppError::Validation(violations))
    }
}

fn id_of(payload: &Map<String, Value>) -> &str {
    payload
        .get(ID_COLUMN)
        .and_then(Value::as_str)
        .unwrap_or_default()
}

async fn load_table(state: &AppState) -> Result<Table, AppError> {
    let store = state.store().clone();
    tokio::task::spawn_blocking(move || store.load())
        .await
        .map_err(|e| AppError::Internal(format!("Store task failed: {}", e)))?
        .map_err(AppError::from)
}

async fn save_table(state: &AppState, table: Table) -> Result<(), AppError> {
    let store = state.store().clone();
    tokio::task::spawn_blocking(move || store.save(&table))
        .await
        .map_err(|e| AppError::Internal(format!("Store task failed: {}", e)))?
        .map_err(AppError::from)
}

/// Application error type
///
/// Always rendered as JSON, whatever representation the request asked for.
#[derive(Debug, Error)]
pub enum AppError {
    #[error("Bad request: {0}")]
    BadRequest(String),

    #[error("Invalid query parameters")]
    InvalidParameters(Vec<String>),

    #[error("Validation failed")]
    Validation(Vec<String>),

    #[error("Permission denied")]
    Forbidden,

    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Not acceptable: {0}")]
    NotAcceptable(NegotiationError),

    #[error("Store error: {0}")]
    Store(#[from] StoreError),

    #[error("Internal error: {0}")]
    Internal(String),
}

impl From<NegotiationError> for AppError {
    fn from(err: NegotiationError) -> Self {
        match err {
            NegotiationError::Render(msg) => AppError::Internal(msg),
            other => AppError::NotAcceptable(other),
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let (status, body) = match self {
            AppError::BadRequest(msg) => (StatusCode::BAD_REQUEST, ErrorResponse::new("bad_request", msg)),
            AppError::InvalidParameters(messages) => (
                StatusCode::BAD_REQUEST,
                ErrorResponse::with_messages("invalid_parameters", messages),
            ),
            AppError::Validation(violations) => (
                StatusCode::BAD_REQUEST,
                ErrorResponse::with_messages("validation_failed", violations),
            ),
            AppError::Forbidden => (
                StatusCode::FORBIDDEN,
                ErrorResponse::new("forbidden", "Permission denied"),
            ),
            AppError::NotFound(msg) => (StatusCode::NOT_FOUND, ErrorResponse::new("not_found", msg)),
            AppError::NotAcceptable(err) => (
                StatusCode::NOT_ACCEPTABLE,
                ErrorResponse::new("not_acceptable", err.to_string()),
            ),
            AppError::Store(err) => {
                error!("Store error: {}", err);
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    ErrorResponse::new("internal", "Internal server error"),
                )
            }
            AppError::Internal(msg) => {
                error!("Internal error: {}", msg);
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    ErrorResponse::new("internal", "Internal server error"),
                )
            }
        };

        (status, Json(body)).into_response()
    }
}
