pub mod api;
pub mod config;
pub mod infrastructure;
pub mod models;
pub mod services;
pub mod utils;

use crate::config::AppConfig;
use crate::services::artifact::ArtifactStore;
use crate::services::extraction::ExtractionService;
use crate::services::storage::Storage;
use axum::{
    Router,
    extract::DefaultBodyLimit,
    http::{HeaderValue, header},
    middleware::{from_fn, from_fn_with_state},
    routing::{get, post},
};
use std::sync::Arc;
use tower_http::cors::{AllowOrigin, Any, CorsLayer};
use utoipa::OpenApi;
use utoipa_swagger_ui::SwaggerUi;

#[derive(OpenApi)]
#[openapi(
    paths(
        api::handlers::extract::extract_gst,
        api::handlers::download::download_excel,
        api::handlers::history::download_history,
        api::handlers::dashboard::dashboard_stats,
        api::handlers::dashboard::gst_trends,
        api::handlers::dashboard::compliance,
        api::handlers::gst_returns::list_gst_returns,
        api::handlers::gst_returns::create_gst_return,
        api::handlers::gst_returns::update_gst_return,
        api::handlers::invoices::list_invoices,
        api::handlers::invoices::create_invoice,
        api::handlers::files::upload_files,
        api::handlers::files::list_files,
        api::handlers::users::get_me,
        api::handlers::users::update_me,
        api::handlers::health::health_check,
        api::handlers::health::get_upload_rules,
    ),
    components(
        schemas(
            api::handlers::extract::ExtractionResponse,
            api::handlers::dashboard::DashboardStats,
            api::handlers::dashboard::TrendChart,
            api::handlers::dashboard::ComplianceChart,
            api::handlers::gst_returns::GstReturnUpdate,
            api::handlers::files::UploadFilesResponse,
            api::handlers::users::ProfileUpdate,
            api::handlers::health::HealthResponse,
            services::extraction::ParseDiagnostics,
            utils::validation::UploadRules,
            models::User,
            models::ReturnStatus,
            models::GstReturn,
            models::NewGstReturn,
            models::Invoice,
            models::NewInvoice,
            models::FileStatus,
            models::UploadedFile,
            models::DownloadHistory,
        )
    ),
    tags(
        (name = "extraction", description = "Invoice extraction and spreadsheet download"),
        (name = "dashboard", description = "Returns, invoices and chart data"),
        (name = "files", description = "Uploaded file records"),
        (name = "users", description = "Session user profile"),
        (name = "system", description = "Health and upload rules")
    )
)]
pub struct ApiDoc;

#[derive(Clone)]
pub struct AppState {
    pub storage: Arc<dyn Storage>,
    pub extraction: Arc<ExtractionService>,
    pub artifact: Arc<ArtifactStore>,
    pub config: AppConfig,
}

impl AppState {
    pub fn new(storage: Arc<dyn Storage>, config: AppConfig) -> Self {
        let artifact = Arc::new(ArtifactStore::new(
            config.artifact_path.clone(),
            config.artifact_lock_timeout,
        ));
        let extraction = Arc::new(ExtractionService::new(config.clone(), artifact.clone()));
        Self {
            storage,
            extraction,
            artifact,
            config,
        }
    }
}

fn cors_layer(config: &AppConfig) -> CorsLayer {
    let origins: Vec<HeaderValue> = config
        .allowed_origins
        .iter()
        .filter_map(|origin| match origin.parse() {
            Ok(value) => Some(value),
            Err(_) => {
                tracing::warn!("Ignoring invalid CORS origin {}", origin);
                None
            }
        })
        .collect();

    let allow_origin = if origins.is_empty() {
        AllowOrigin::from(Any)
    } else {
        AllowOrigin::list(origins)
    };

    CorsLayer::new()
        .allow_origin(allow_origin)
        .allow_methods(Any)
        .allow_headers(Any)
        .expose_headers([header::CONTENT_DISPOSITION, header::CONTENT_LENGTH])
}

pub fn create_app(state: AppState) -> Router {
    let upload_limit = DefaultBodyLimit::max(state.config.max_request_size());

    Router::new()
        .merge(SwaggerUi::new("/swagger-ui").url("/api-docs/openapi.json", ApiDoc::openapi()))
        .route("/health", get(api::handlers::health::health_check))
        .route(
            "/api/system/upload-rules",
            get(api::handlers::health::get_upload_rules),
        )
        .route(
            "/api/extract-gst",
            post(api::handlers::extract::extract_gst).layer(upload_limit),
        )
        .route(
            "/api/download-excel",
            get(api::handlers::download::download_excel).layer(from_fn_with_state(
                state.clone(),
                api::middleware::session::session_middleware,
            )),
        )
        .route(
            "/api/download-history",
            get(api::handlers::history::download_history).layer(from_fn_with_state(
                state.clone(),
                api::middleware::session::session_middleware,
            )),
        )
        .route(
            "/api/users/me",
            get(api::handlers::users::get_me)
                .put(api::handlers::users::update_me)
                .layer(from_fn_with_state(
                    state.clone(),
                    api::middleware::session::session_middleware,
                )),
        )
        .route(
            "/api/dashboard/stats/:user_id",
            get(api::handlers::dashboard::dashboard_stats),
        )
        .route(
            "/api/charts/gst-trends/:user_id",
            get(api::handlers::dashboard::gst_trends),
        )
        .route(
            "/api/charts/compliance/:user_id",
            get(api::handlers::dashboard::compliance),
        )
        .route(
            "/api/gst-returns",
            post(api::handlers::gst_returns::create_gst_return),
        )
        .route(
            "/api/gst-returns/:id",
            get(api::handlers::gst_returns::list_gst_returns)
                .patch(api::handlers::gst_returns::update_gst_return),
        )
        .route(
            "/api/invoices",
            post(api::handlers::invoices::create_invoice),
        )
        .route(
            "/api/invoices/:user_id",
            get(api::handlers::invoices::list_invoices),
        )
        .route(
            "/api/files/upload",
            post(api::handlers::files::upload_files).layer(upload_limit),
        )
        .route("/api/files/:user_id", get(api::handlers::files::list_files))
        .layer(from_fn(api::middleware::request_id::request_id_middleware))
        .layer(cors_layer(&state.config))
        .with_state(state)
}
