//! HTTP routes exposing the boundary query service.
//!
//! Handlers translate query-string parameters into a [`RequestDescriptor`]
//! and run the synchronous query on Tokio's blocking pool. Storage failures
//! become `500` responses and malformed filters become `400`, both carrying
//! an `{"error": ...}` body. A CORS layer lets browser map clients on other
//! origins call the API.

use std::{fmt, sync::Arc};

use axum::{
    Json, Router,
    extract::{Query, State},
    http::{HeaderValue, StatusCode, header::InvalidHeaderValue},
    response::{IntoResponse, Response},
    routing::get,
};
use boundary_core::{
    BboxBounds, BoundaryStore, EntityId, EntityIdError, EntityKind, FeatureCollection,
    GeoQueryService, QueryError, RequestDescriptor,
};
use log::{error, warn};
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tower_http::cors::{self, CorsLayer};

/// Store handle shared by every request.
pub type SharedStore = Arc<dyn BoundaryStore + Send + Sync>;

/// State shared by the HTTP handlers.
#[derive(Clone)]
pub struct AppState {
    service: Arc<GeoQueryService<SharedStore>>,
}

impl AppState {
    /// Wrap `store` in a query service for the handlers.
    pub fn new(store: SharedStore) -> Self {
        Self {
            service: Arc::new(GeoQueryService::new(store)),
        }
    }

    async fn collection(&self, descriptor: RequestDescriptor) -> Result<FeatureCollection, ApiError> {
        let service = Arc::clone(&self.service);
        let collection =
            tokio::task::spawn_blocking(move || service.query_collection(&descriptor)).await??;
        Ok(collection)
    }
}

impl fmt::Debug for AppState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("AppState").finish_non_exhaustive()
    }
}

/// Query-string parameters accepted by the boundary endpoints.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
pub struct BoundaryParams {
    /// Whether to return real geometry. Defaults to `true`.
    #[serde(default)]
    pub include_geometry: Option<bool>,
    /// Explicit simplification tolerance in degrees.
    #[serde(default)]
    pub tolerance: Option<f64>,
    /// Map zoom level used when no tolerance is given.
    #[serde(default)]
    pub zoom_level: Option<i32>,
    /// Western edge of the viewport.
    #[serde(default)]
    pub min_lon: Option<f64>,
    /// Southern edge of the viewport.
    #[serde(default)]
    pub min_lat: Option<f64>,
    /// Eastern edge of the viewport.
    #[serde(default)]
    pub max_lon: Option<f64>,
    /// Northern edge of the viewport.
    #[serde(default)]
    pub max_lat: Option<f64>,
    /// Parent state filter; counties only.
    #[serde(default)]
    pub state_id: Option<String>,
}

impl BoundaryParams {
    /// Build the query descriptor for `kind`.
    pub fn into_descriptor(self, kind: EntityKind) -> Result<RequestDescriptor, ApiError> {
        let mut descriptor = RequestDescriptor::new(kind)
            .with_geometry(self.include_geometry.unwrap_or(true))
            .with_bbox(BboxBounds {
                min_lon: self.min_lon,
                min_lat: self.min_lat,
                max_lon: self.max_lon,
                max_lat: self.max_lat,
            });
        if let Some(tolerance) = self.tolerance {
            descriptor = descriptor.with_tolerance(tolerance);
        }
        if let Some(zoom_level) = self.zoom_level {
            descriptor = descriptor.with_zoom_level(zoom_level);
        }
        if let Some(state_id) = self.state_id {
            descriptor = descriptor.with_state_filter(EntityId::new(state_id)?);
        }
        Ok(descriptor)
    }
}

/// Failures reported by the boundary endpoints.
#[derive(Debug, Error)]
pub enum ApiError {
    /// The `state_id` parameter is not a valid identifier.
    #[error("invalid state_id: {0}")]
    InvalidStateId(#[from] EntityIdError),
    /// The query service rejected or failed the request.
    #[error(transparent)]
    Query(#[from] QueryError),
    /// The blocking query task panicked or was cancelled.
    #[error("query task failed: {0}")]
    Task(#[from] tokio::task::JoinError),
}

impl ApiError {
    /// HTTP status reported for this failure.
    #[must_use]
    pub const fn status(&self) -> StatusCode {
        match self {
            Self::InvalidStateId(_) | Self::Query(QueryError::StateFilterNotApplicable) => {
                StatusCode::BAD_REQUEST
            }
            Self::Query(QueryError::Store(_)) | Self::Task(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

#[derive(Debug, Serialize)]
struct ErrorBody {
    error: String,
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status();
        if status.is_server_error() {
            error!("boundary request failed: {self}");
        } else {
            warn!("boundary request rejected: {self}");
        }
        let body = ErrorBody {
            error: self.to_string(),
        };
        (status, Json(body)).into_response()
    }
}

/// Body of the root and health endpoints.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StatusMessage {
    /// Present on the health endpoint only.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub status: Option<String>,
    /// Human-readable message.
    pub message: String,
}

/// Origins allowed to call the API from a browser.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CorsOrigins {
    /// Any origin (`*`).
    Any,
    /// Only the listed origins; an empty list disables cross-origin access.
    List(Vec<HeaderValue>),
}

impl CorsOrigins {
    /// Parse `*` or a comma-separated list of origins.
    pub fn parse(raw: &str) -> Result<Self, InvalidHeaderValue> {
        let trimmed = raw.trim();
        if trimmed == "*" {
            return Ok(Self::Any);
        }
        trimmed
            .split(',')
            .map(str::trim)
            .filter(|origin| !origin.is_empty())
            .map(HeaderValue::from_str)
            .collect::<Result<Vec<_>, _>>()
            .map(Self::List)
    }

    fn layer(&self) -> CorsLayer {
        let layer = CorsLayer::new()
            .allow_methods(cors::Any)
            .allow_headers(cors::Any);
        match self {
            Self::Any => layer.allow_origin(cors::Any),
            Self::List(origins) => layer.allow_origin(origins.clone()),
        }
    }
}

/// Build the application router.
///
/// `api_prefix` is expected in normalised form (see
/// [`normalise_api_prefix`]); an empty prefix mounts the API at the root.
pub fn router(state: AppState, api_prefix: &str, cors_origins: &CorsOrigins) -> Router {
    let api = Router::new()
        .route("/geographic/health", get(health))
        .route("/geographic/states", get(states))
        .route("/geographic/counties", get(counties));
    let root = Router::new().route("/", get(welcome));
    let app = if api_prefix.is_empty() {
        root.merge(api)
    } else {
        root.nest(api_prefix, api)
    };
    app.layer(cors_origins.layer()).with_state(state)
}

/// Normalise an API prefix to a leading slash and no trailing slash.
///
/// A prefix made only of slashes collapses to the empty string.
pub fn normalise_api_prefix(raw: &str) -> String {
    let trimmed = raw.trim().trim_matches('/');
    if trimmed.is_empty() {
        String::new()
    } else {
        format!("/{trimmed}")
    }
}

pub(crate) async fn welcome() -> Json<StatusMessage> {
    Json(StatusMessage {
        status: None,
        message: "Welcome to the boundary API. Boundaries are served under /geographic."
            .to_owned(),
    })
}

pub(crate) async fn health() -> Json<StatusMessage> {
    Json(StatusMessage {
        status: Some("ok".to_owned()),
        message: "Geographic data service is running".to_owned(),
    })
}

pub(crate) async fn states(
    State(state): State<AppState>,
    Query(params): Query<BoundaryParams>,
) -> Result<Json<FeatureCollection>, ApiError> {
    let descriptor = params.into_descriptor(EntityKind::State)?;
    state.collection(descriptor).await.map(Json)
}

pub(crate) async fn counties(
    State(state): State<AppState>,
    Query(params): Query<BoundaryParams>,
) -> Result<Json<FeatureCollection>, ApiError> {
    let descriptor = params.into_descriptor(EntityKind::County)?;
    state.collection(descriptor).await.map(Json)
}
