//! REST API Handlers
//!
//! Binds HTTP requests to the aggregation views. Path segments select the
//! view, kind and namespaces; query parameters carry the data select query.

use super::metrics::{ApiMetrics, Outcome};
use crate::dataselect::DataSelectQuery;
use crate::domain::ports::{ClusterClient, ResourceKind};
use crate::error::{Error, Result};
use crate::resource::{
    get_cluster, get_config, get_detail, get_discovery, get_overview, get_workloads, list_kind,
    list_namespaces, Aggregated, NamespaceQuery,
};
use axum::{
    extract::{Path, Query, State},
    http::{header, StatusCode},
    response::{IntoResponse, Response},
    routing::get,
    Json, Router,
};
use serde::{Deserialize, Serialize};
use std::future::Future;
use std::sync::Arc;
use std::time::Instant;
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;
use tracing::{debug, error};

// =============================================================================
// Request/Response Types
// =============================================================================

/// Raw data select parameters.
///
/// Kept as strings so that malformed values degrade to "no sort", "no
/// filter" or "no pagination" instead of rejecting the request.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SelectParams {
    #[serde(default)]
    pub sort_by: Option<String>,
    #[serde(default)]
    pub filter_by: Option<String>,
    #[serde(default)]
    pub items_per_page: Option<String>,
    #[serde(default)]
    pub page: Option<String>,
}

impl SelectParams {
    pub fn to_query(&self) -> DataSelectQuery {
        DataSelectQuery::from_params(
            self.sort_by.as_deref(),
            self.filter_by.as_deref(),
            self.items_per_page.as_deref(),
            self.page.as_deref(),
        )
    }
}

/// API error response
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ApiErrorResponse {
    pub error: String,
    pub message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub details: Option<String>,
}

impl ApiErrorResponse {
    fn from_error(err: &Error) -> Self {
        let error = match err {
            Error::Api { code: 401, .. } => "unauthorized",
            Error::Api { code: 403, .. } => "forbidden",
            Error::Api { code: 404, .. } => "not_found",
            Error::UnknownKind(_) => "unknown_kind",
            _ => "internal_error",
        };
        let details = match err {
            Error::Api { reason, .. } if !reason.is_empty() => Some(reason.clone()),
            _ => None,
        };
        Self {
            error: error.into(),
            message: err.to_string(),
            details,
        }
    }
}

fn error_response(err: &Error) -> Response {
    let status = StatusCode::from_u16(err.status_code()).unwrap_or(StatusCode::INTERNAL_SERVER_ERROR);
    (status, Json(ApiErrorResponse::from_error(err))).into_response()
}

// =============================================================================
// REST Router
// =============================================================================

/// Shared application state
#[derive(Clone)]
pub struct AppState {
    pub client: Arc<dyn ClusterClient>,
    pub metrics: Arc<ApiMetrics>,
}

impl AppState {
    pub fn new(client: Arc<dyn ClusterClient>) -> Result<Self> {
        Ok(Self {
            client,
            metrics: Arc::new(ApiMetrics::new()?),
        })
    }
}

/// REST API router builder
pub struct RestRouter {
    state: AppState,
    cors: bool,
}

impl RestRouter {
    pub fn new(state: AppState) -> Self {
        Self { state, cors: false }
    }

    /// Allow cross-origin requests from any origin
    pub fn with_cors(mut self, cors: bool) -> Self {
        self.cors = cors;
        self
    }

    /// Build the Axum router
    pub fn build(self) -> Router {
        let router = Router::new()
            .route("/api/v1/namespace", get(namespaces))
            .route("/api/v1/cluster", get(cluster))
            .route("/api/v1/overview", get(overview))
            .route("/api/v1/overview/:namespace", get(overview))
            .route("/api/v1/workloads", get(workloads))
            .route("/api/v1/workloads/:namespace", get(workloads))
            .route("/api/v1/config", get(config))
            .route("/api/v1/config/:namespace", get(config))
            .route("/api/v1/discovery", get(discovery))
            .route("/api/v1/discovery/:namespace", get(discovery))
            .route("/api/v1/:kind", get(list_all))
            .route("/api/v1/:kind/:namespace", get(list_in))
            .route("/api/v1/:kind/:namespace/:name", get(detail))
            .route("/healthz", get(health_check))
            .route("/metrics", get(metrics))
            .with_state(self.state)
            .layer(TraceLayer::new_for_http());

        if self.cors {
            router.layer(CorsLayer::permissive())
        } else {
            router
        }
    }
}

// =============================================================================
// Handlers
// =============================================================================

fn namespace_query(namespace: Option<Path<String>>) -> NamespaceQuery {
    namespace.map_or_else(NamespaceQuery::all, |Path(raw)| NamespaceQuery::parse(&raw))
}

/// Run a view and turn its outcome into a response
async fn serve<T, F>(state: &AppState, view: &str, fut: F) -> Response
where
    T: Serialize + Aggregated,
    F: Future<Output = Result<T>>,
{
    let started = Instant::now();
    match fut.await {
        Ok(body) => {
            let warnings = body.non_critical_errors().len();
            state.metrics.observe(view, Outcome::Ok, started.elapsed(), warnings);
            debug!(view, warnings, "served");
            (StatusCode::OK, Json(body)).into_response()
        }
        Err(err) => {
            state.metrics.observe(view, Outcome::Failed, started.elapsed(), 0);
            error!(view, error = %err, "view failed");
            error_response(&err)
        }
    }
}

async fn namespaces(State(state): State<AppState>, Query(params): Query<SelectParams>) -> Response {
    let ds_query = params.to_query();
    serve(&state, "namespace", list_namespaces(state.client.clone(), &ds_query)).await
}

async fn cluster(State(state): State<AppState>, Query(params): Query<SelectParams>) -> Response {
    let ds_query = params.to_query();
    serve(&state, "cluster", get_cluster(state.client.clone(), &ds_query)).await
}

async fn overview(
    State(state): State<AppState>,
    namespace: Option<Path<String>>,
    Query(params): Query<SelectParams>,
) -> Response {
    let (ns_query, ds_query) = (namespace_query(namespace), params.to_query());
    serve(&state, "overview", get_overview(state.client.clone(), &ns_query, &ds_query)).await
}

async fn workloads(
    State(state): State<AppState>,
    namespace: Option<Path<String>>,
    Query(params): Query<SelectParams>,
) -> Response {
    let (ns_query, ds_query) = (namespace_query(namespace), params.to_query());
    serve(&state, "workloads", get_workloads(state.client.clone(), &ns_query, &ds_query)).await
}

async fn config(
    State(state): State<AppState>,
    namespace: Option<Path<String>>,
    Query(params): Query<SelectParams>,
) -> Response {
    let (ns_query, ds_query) = (namespace_query(namespace), params.to_query());
    serve(&state, "config", get_config(state.client.clone(), &ns_query, &ds_query)).await
}

async fn discovery(
    State(state): State<AppState>,
    namespace: Option<Path<String>>,
    Query(params): Query<SelectParams>,
) -> Response {
    let (ns_query, ds_query) = (namespace_query(namespace), params.to_query());
    serve(&state, "discovery", get_discovery(state.client.clone(), &ns_query, &ds_query)).await
}

async fn list_all(
    State(state): State<AppState>,
    Path(kind): Path<String>,
    Query(params): Query<SelectParams>,
) -> Response {
    list(state, kind, NamespaceQuery::all(), params).await
}

async fn list_in(
    State(state): State<AppState>,
    Path((kind, namespace)): Path<(String, String)>,
    Query(params): Query<SelectParams>,
) -> Response {
    list(state, kind, NamespaceQuery::parse(&namespace), params).await
}

async fn list(state: AppState, kind: String, ns_query: NamespaceQuery, params: SelectParams) -> Response {
    let kind = match kind.parse::<ResourceKind>() {
        Ok(kind) => kind,
        Err(err) => return error_response(&err),
    };
    let ds_query = params.to_query();
    serve(&state, kind.as_str(), list_kind(kind, state.client.clone(), &ns_query, &ds_query)).await
}

async fn detail(
    State(state): State<AppState>,
    Path((kind, namespace, name)): Path<(String, String, String)>,
    Query(params): Query<SelectParams>,
) -> Response {
    let kind = match kind.parse::<ResourceKind>() {
        Ok(kind) => kind,
        Err(err) => return error_response(&err),
    };
    let ds_query = params.to_query();
    let view = format!("{}_detail", kind);
    serve(
        &state,
        &view,
        get_detail(kind, state.client.clone(), &namespace, &name, &ds_query),
    )
    .await
}

async fn health_check() -> impl IntoResponse {
    (StatusCode::OK, "ok")
}

async fn metrics(State(state): State<AppState>) -> Response {
    match state.metrics.render() {
        Ok((content_type, body)) => (StatusCode::OK, [(header::CONTENT_TYPE, content_type)], body).into_response(),
        Err(err) => error_response(&err),
    }
}
