//! HTTP API for the dashboard front end.
//!
//! ```text
//! Browser (SPA)                 awsdash-web
//! ┌──────────────┐  GET /api/*  ┌──────────────────────────────┐
//! │ dashboard UI ├─────────────►│ router ─► CostService        │
//! └──────┬───────┘              │        ─► ResourceService    │──► aws CLI
//!        │ GET /, /assets/*     │        ─► ProfileManager     │
//!        └─────────────────────►│ static files (index.html)    │
//!                               └──────────────────────────────┘
//! ```
//!
//! Every error is a JSON body `{ "error": ..., "details": ... }`. Components
//! are injected through [`AppState`]; nothing here reaches for globals.

use crate::app::commands::{split_raw_args, CommandCatalogue, CommandError, PublicCommand};
use crate::app::cost_explorer::{CostError, CostOverview, CostReport, CostService, ServiceCost};
use crate::app::profiles::{NewProfile, ProfileManager, ProfileStatus};
use crate::app::resource_explorer::cache::TtlCache;
use crate::app::resource_explorer::resource_service::{summarize_resources, ResourceService};
use crate::app::resource_explorer::state::{ResourcesSummaryResponse, ServiceResources};
use axum::{
    extract::{rejection::JsonRejection, Path, Query, Request, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::{get, post},
    Json, Router,
};
use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use std::sync::Arc;
use tokio::net::TcpListener;
use tokio_util::sync::CancellationToken;
use tower::ServiceExt;
use tower_http::cors::{Any, CorsLayer};
use tower_http::services::{ServeDir, ServeFile};
use tower_http::trace::TraceLayer;
use tracing::{info, warn};

const COST_EXPLORER_DISABLED_DETAILS: &str =
    "AWS Cost Explorer is not enabled for this account. Enable it in the AWS console to view cost data.";

/// Response caches cleared together by `POST /api/cache/clear`
#[derive(Clone)]
pub struct CacheHandles {
    pub resources: TtlCache<ServiceResources>,
    pub costs: TtlCache<CostReport>,
}

impl CacheHandles {
    pub fn clear(&self) {
        self.resources.clear();
        self.costs.clear();
    }
}

/// Shared state passed to all request handlers
#[derive(Clone)]
pub struct AppState {
    pub costs: Arc<dyn CostService>,
    pub resources: Arc<dyn ResourceService>,
    pub profiles: Arc<ProfileManager>,
    pub commands: Arc<CommandCatalogue>,
    pub caches: CacheHandles,
    pub static_dir: Arc<PathBuf>,
    /// Cancelled on server shutdown; each request works under a child token
    pub shutdown: CancellationToken,
}

/// JSON error body
#[derive(Debug, Serialize, Deserialize)]
pub struct ErrorBody {
    pub error: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub details: Option<String>,
}

#[derive(Debug)]
pub struct ApiError {
    status: StatusCode,
    body: ErrorBody,
}

impl ApiError {
    fn new(status: StatusCode, error: &str, details: Option<String>) -> Self {
        Self {
            status,
            body: ErrorBody {
                error: error.to_string(),
                details,
            },
        }
    }

    fn bad_request(error: &str, details: impl Into<String>) -> Self {
        Self::new(StatusCode::BAD_REQUEST, error, Some(details.into()))
    }

    fn invalid_body(rejection: JsonRejection) -> Self {
        Self::bad_request("Invalid request body", rejection.body_text())
    }

    fn from_cost(error: CostError, failed: &str) -> Self {
        match error {
            CostError::ExplorerDisabled => Self::new(
                StatusCode::SERVICE_UNAVAILABLE,
                "Cost Explorer not enabled",
                Some(COST_EXPLORER_DISABLED_DETAILS.to_string()),
            ),
            other => Self::new(
                StatusCode::INTERNAL_SERVER_ERROR,
                failed,
                Some(other.to_string()),
            ),
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        (self.status, Json(self.body)).into_response()
    }
}

type ApiResult<T> = Result<Json<T>, ApiError>;

#[derive(Debug, Default, Deserialize)]
pub struct DateQuery {
    start: Option<String>,
    end: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
pub struct RegionQuery {
    region: Option<String>,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct CostResponse {
    pub overview: CostOverview,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct ServicesResponse {
    pub overview: CostOverview,
    pub services: Vec<ServiceCost>,
}

#[derive(Debug, Deserialize)]
struct SelectProfileRequest {
    #[serde(default)]
    id: String,
}

#[derive(Debug, Deserialize)]
struct ExecuteCommandRequest {
    #[serde(default)]
    id: String,
    #[serde(default)]
    region: String,
}

#[derive(Debug, Deserialize)]
struct ExecuteRawRequest {
    #[serde(default)]
    args: String,
}

/// Build the router with all API routes, static file fallback and layers.
pub fn router(state: AppState) -> Router {
    // The UI is served from elsewhere in development
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    Router::new()
        .route("/api/cost", get(get_cost))
        .route("/api/services", get(get_services))
        .route("/api/services/:service/resources", get(get_service_resources))
        .route("/api/resources/summary", get(get_resources_summary))
        .route("/api/profiles", get(get_profiles).post(add_profile))
        .route("/api/profiles/select", post(select_profile))
        .route("/api/cache/clear", post(clear_cache))
        .route("/api/commands", get(list_commands))
        .route("/api/commands/execute", post(execute_command))
        .route("/api/commands/execute-raw", post(execute_raw_command))
        .fallback(static_fallback)
        .with_state(state)
        .layer(TraceLayer::new_for_http())
        .layer(cors)
}

/// Serve `app` on `listener` until `shutdown` is cancelled.
pub async fn serve(
    listener: TcpListener,
    app: Router,
    shutdown: CancellationToken,
) -> anyhow::Result<()> {
    let addr = listener.local_addr()?;
    info!("Dashboard listening on http://{}", addr);

    axum::serve(listener, app)
        .with_graceful_shutdown(async move { shutdown.cancelled().await })
        .await?;

    info!("Dashboard server stopped");
    Ok(())
}

async fn get_cost(
    State(state): State<AppState>,
    Query(query): Query<DateQuery>,
) -> ApiResult<CostResponse> {
    let cancel = state.shutdown.child_token();
    let overview = state
        .costs
        .get_cost_overview(query.start.as_deref(), query.end.as_deref(), &cancel)
        .await
        .map_err(|e| ApiError::from_cost(e, "Failed to fetch cost overview"))?;

    Ok(Json(CostResponse { overview }))
}

async fn get_services(
    State(state): State<AppState>,
    Query(query): Query<DateQuery>,
) -> ApiResult<ServicesResponse> {
    let cancel = state.shutdown.child_token();
    let start = query.start.as_deref();
    let end = query.end.as_deref();

    let overview = state
        .costs
        .get_cost_overview(start, end, &cancel)
        .await
        .map_err(|e| ApiError::from_cost(e, "Failed to fetch cost overview"))?;
    let services = state
        .costs
        .get_service_costs(start, end, &cancel)
        .await
        .map_err(|e| ApiError::from_cost(e, "Failed to fetch service costs"))?;

    Ok(Json(ServicesResponse { overview, services }))
}

async fn get_service_resources(
    State(state): State<AppState>,
    Path(service): Path<String>,
    Query(query): Query<RegionQuery>,
) -> ApiResult<ServiceResources> {
    let cancel = state.shutdown.child_token();
    let region = query.region.unwrap_or_default();

    state
        .resources
        .get_resources(&service, &region, &cancel)
        .await
        .map(Json)
        .map_err(|e| {
            ApiError::new(
                StatusCode::INTERNAL_SERVER_ERROR,
                "Failed to fetch resources",
                Some(e.to_string()),
            )
        })
}

async fn get_resources_summary(State(state): State<AppState>) -> Json<ResourcesSummaryResponse> {
    let cancel = state.shutdown.child_token();
    Json(summarize_resources(state.resources.as_ref(), &cancel).await)
}

async fn get_profiles(State(state): State<AppState>) -> Json<ProfileStatus> {
    Json(state.profiles.status())
}

async fn add_profile(
    State(state): State<AppState>,
    body: Result<Json<NewProfile>, JsonRejection>,
) -> ApiResult<ProfileStatus> {
    let Json(new) = body.map_err(ApiError::invalid_body)?;

    state
        .profiles
        .add_and_activate(new)
        .await
        .map_err(|e| ApiError::bad_request("Failed to add profile", e.to_string()))?;

    // Responses cached under the previous profile stay keyed to it
    Ok(Json(state.profiles.status()))
}

async fn select_profile(
    State(state): State<AppState>,
    body: Result<Json<SelectProfileRequest>, JsonRejection>,
) -> ApiResult<ProfileStatus> {
    let Json(request) = body.map_err(ApiError::invalid_body)?;

    state
        .profiles
        .set_active(&request.id)
        .map_err(|e| ApiError::bad_request("Failed to select profile", e.to_string()))?;

    Ok(Json(state.profiles.status()))
}

async fn clear_cache(State(state): State<AppState>) -> StatusCode {
    state.caches.clear();
    StatusCode::NO_CONTENT
}

async fn list_commands(State(state): State<AppState>) -> Json<Vec<PublicCommand>> {
    Json(state.commands.list())
}

async fn execute_command(
    State(state): State<AppState>,
    body: Result<Json<ExecuteCommandRequest>, JsonRejection>,
) -> Result<Response, ApiError> {
    let Json(request) = body.map_err(ApiError::invalid_body)?;
    let cancel = state.shutdown.child_token();

    match state
        .commands
        .execute(&request.id, &request.region, &cancel)
        .await
    {
        Ok(output) => Ok(Json(output).into_response()),
        Err(e) if e.is_usage_error() => Err(ApiError::bad_request(
            "Invalid AWS command configuration",
            "The configured command is not a valid aws CLI command. Please check command-config.json.",
        )),
        Err(e) => {
            warn!("Command {} failed: {}", request.id, e);
            Err(ApiError::bad_request("Failed to execute command", e.to_string()))
        }
    }
}

async fn execute_raw_command(
    State(state): State<AppState>,
    body: Result<Json<ExecuteRawRequest>, JsonRejection>,
) -> Result<Response, ApiError> {
    let Json(request) = body.map_err(ApiError::invalid_body)?;
    let args = split_raw_args(&request.args);
    if args.is_empty() {
        return Err(ApiError::new(
            StatusCode::BAD_REQUEST,
            "No command provided",
            None,
        ));
    }

    let cancel = state.shutdown.child_token();
    match state.commands.execute_raw(args, &cancel).await {
        Ok(output) => Ok(Json(output).into_response()),
        Err(CommandError::Blocked) => Err(ApiError::bad_request(
            "Command blocked by safety filter",
            "Only read/list/describe operations are allowed from the dashboard.",
        )),
        Err(e) if e.is_usage_error() => Err(ApiError::bad_request(
            "Invalid AWS CLI syntax",
            "Use: <service> <operation> [parameters], e.g. 'ec2 describe-instances --region ap-south-1'.",
        )),
        Err(e) => Err(ApiError::bad_request("Failed to execute command", e.to_string())),
    }
}

/// Static files from the built front end. Unknown paths get `index.html`
/// so client-side routes survive a reload; unknown `/api/` paths are 404.
async fn static_fallback(State(state): State<AppState>, request: Request) -> Response {
    if request.uri().path().starts_with("/api/") {
        return ApiError::new(StatusCode::NOT_FOUND, "Not found", None).into_response();
    }

    let index = state.static_dir.join("index.html");
    let files = ServeDir::new(state.static_dir.as_path()).fallback(ServeFile::new(index));

    match files.oneshot(request).await {
        Ok(response) => response.into_response(),
        Err(never) => match never {},
    }
}
