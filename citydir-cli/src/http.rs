/*!
HTTP adapter: maps routes onto `CityDirectory` operations and directory errors
onto status codes.
*/

use axum::extract::rejection::{JsonRejection, QueryRejection};
use axum::extract::{Path, Query, State};
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::routing::get;
use axum::{Json, Router};
use citydir_core::{City, CityDirectory, CityId, CityQuery, DirectoryError};
use serde::Serialize;
use std::sync::Arc;
use std::time::Duration;
use tower_http::normalize_path::NormalizePath;
use tower_http::timeout::TimeoutLayer;
use tower_http::trace::TraceLayer;
use tracing::error;

/// Shared handler state
pub type AppState = Arc<dyn CityDirectory>;

/// Error body returned by every failing route
#[derive(Debug, Serialize)]
struct ErrorBody {
    status: String,
    error: String,
}

/// A directory error paired with the status code it maps to
#[derive(Debug)]
pub struct ApiError {
    status: StatusCode,
    message: String,
}

impl ApiError {
    fn new(status: StatusCode, message: impl Into<String>) -> Self {
        Self {
            status,
            message: message.into(),
        }
    }

    fn bad_request(message: impl Into<String>) -> Self {
        Self::new(StatusCode::BAD_REQUEST, message)
    }
}

impl From<DirectoryError> for ApiError {
    fn from(err: DirectoryError) -> Self {
        let status = match &err {
            DirectoryError::NotFound(_) => StatusCode::NOT_FOUND,
            DirectoryError::AlreadyExists(_)
            | DirectoryError::MalformedRange(_)
            | DirectoryError::InvalidField(_) => StatusCode::BAD_REQUEST,
            _ => {
                error!(error = %err, "request failed");
                StatusCode::INTERNAL_SERVER_ERROR
            }
        };
        Self::new(status, err.to_string())
    }
}

impl From<JsonRejection> for ApiError {
    fn from(rejection: JsonRejection) -> Self {
        Self::bad_request(rejection.body_text())
    }
}

impl From<QueryRejection> for ApiError {
    fn from(rejection: QueryRejection) -> Self {
        Self::bad_request(rejection.body_text())
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let body = ErrorBody {
            status: self.message.clone(),
            error: self.message,
        };
        (self.status, Json(body)).into_response()
    }
}

/// Router wrapped so that `/cities/` and `/cities/1/` reach the same
/// handlers as their unslashed forms
pub fn app(directory: AppState, request_timeout: Duration) -> NormalizePath<Router> {
    NormalizePath::trim_trailing_slash(router(directory, request_timeout))
}

/// Build the router for the `/cities` resource
pub fn router(directory: AppState, request_timeout: Duration) -> Router {
    let cities = Router::new()
        .route("/cities", get(list_cities).post(create_city))
        .route("/cities/:id", get(get_city).delete(delete_city))
        .route(
            "/cities/:id/population",
            axum::routing::patch(update_population),
        )
        .with_state(directory);

    #[cfg(feature = "metrics")]
    let cities = cities.route("/metrics", get(metrics));

    cities
        .layer(TimeoutLayer::new(request_timeout))
        .layer(TraceLayer::new_for_http())
}

async fn list_cities(
    State(directory): State<AppState>,
    query: Result<Query<CityQuery>, QueryRejection>,
) -> Result<Json<Vec<City>>, ApiError> {
    let Query(query) = query?;
    Ok(Json(directory.list(&query)?))
}

async fn get_city(
    State(directory): State<AppState>,
    Path(id): Path<String>,
) -> Result<Json<City>, ApiError> {
    let id = parse_id(&id)?;
    Ok(Json(directory.get(id)?))
}

async fn create_city(
    State(directory): State<AppState>,
    payload: Result<Json<City>, JsonRejection>,
) -> Result<(StatusCode, Json<City>), ApiError> {
    let Json(city) = payload?;
    let created = directory.create(city)?;
    Ok((StatusCode::CREATED, Json(created)))
}

async fn delete_city(
    State(directory): State<AppState>,
    Path(id): Path<String>,
) -> Result<StatusCode, ApiError> {
    let id = parse_id(&id)?;
    if directory.delete(id) {
        Ok(StatusCode::NO_CONTENT)
    } else {
        Err(DirectoryError::NotFound(id).into())
    }
}

async fn update_population(
    State(directory): State<AppState>,
    Path(id): Path<String>,
    payload: Result<Json<serde_json::Value>, JsonRejection>,
) -> Result<Json<City>, ApiError> {
    let id = parse_id(&id)?;
    // Unknown ids are reported before the body is examined.
    directory.get(id)?;

    let Json(body) = payload?;
    let population = population_from_body(&body)?;
    Ok(Json(directory.update_population(id, population)?))
}

#[cfg(feature = "metrics")]
async fn metrics() -> Result<String, ApiError> {
    Ok(citydir_core::observability::DirectoryMetrics::global().gather_metrics()?)
}

fn parse_id(raw: &str) -> Result<CityId, ApiError> {
    raw.parse()
        .map_err(|e| ApiError::bad_request(format!("invalid city id `{raw}`: {e}")))
}

/// Extract the population from a `{"population": <number>}` body
///
/// Fractional numbers are truncated toward zero; negative counts are rejected.
fn population_from_body(body: &serde_json::Value) -> Result<i64, DirectoryError> {
    let value = body
        .get("population")
        .ok_or_else(|| DirectoryError::invalid_field("missing field population"))?;

    let population = match value {
        serde_json::Value::Number(n) => match n.as_i64() {
            Some(v) => v,
            None => n
                .as_f64()
                .filter(|f| f.is_finite() && f.abs() < i64::MAX as f64)
                .map(|f| f.trunc() as i64)
                .ok_or_else(|| DirectoryError::invalid_field("population is out of range"))?,
        },
        _ => return Err(DirectoryError::invalid_field("population should be a number")),
    };

    if population < 0 {
        return Err(DirectoryError::invalid_field(
            "population must not be negative",
        ));
    }
    Ok(population)
}
