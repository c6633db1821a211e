use std::sync::Arc;
use axum::{
    Router,
    body::Bytes,
    extract::{DefaultBodyLimit, Query, State},
    http::{header, StatusCode},
    response::{Html, IntoResponse, Json, Response},
    routing::{get, post},
};
use serde::Deserialize;
use tower_http::cors::CorsLayer;
use tower_http::services::ServeDir;
use tracing::{error, info};

use crate::config::Config;
use crate::dashboard::Dashboard;
use crate::error::DashError;
use crate::metrics;

/// Web UI server - サプライチェーン ダッシュボード
/// 件数サマリ、カテゴリ分布、supplier 信頼度、需要予測、注文マップを表示
pub struct WebServer {
    dashboard: Arc<Dashboard>,
    config: Arc<Config>,
}

#[derive(Clone)]
struct AppState {
    dashboard: Arc<Dashboard>,
}

#[derive(Deserialize)]
struct ProductQuery {
    category: Option<String>,
    limit: Option<usize>,
}

/// JSON error body with a status derived from the error kind
struct ApiError(DashError);

impl From<DashError> for ApiError {
    fn from(e: DashError) -> Self {
        ApiError(e)
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = if self.0.is_client_error() {
            StatusCode::BAD_REQUEST
        } else {
            error!("Request failed: {}", self.0);
            StatusCode::INTERNAL_SERVER_ERROR
        };
        (status, Json(serde_json::json!({ "error": self.0.to_string() }))).into_response()
    }
}

impl WebServer {
    pub fn new(dashboard: Arc<Dashboard>, config: Arc<Config>) -> Self {
        Self { dashboard, config }
    }

    pub fn router(&self) -> Router {
        let state = AppState {
            dashboard: self.dashboard.clone(),
        };

        let mut app = Router::new()
            .route("/", get(dashboard_page))
            .route("/api/dashboard", get(api_dashboard))
            .route("/api/products", get(api_products))
            .route("/api/categories", get(api_categories))
            .route("/api/suppliers/scores", get(api_supplier_scores))
            .route("/api/forecast", get(api_forecast))
            .route("/api/map", get(api_map))
            .route("/api/upload", post(api_upload))
            .route("/metrics", get(metrics_handler))
            .layer(DefaultBodyLimit::max(self.config.web.max_upload_bytes))
            .layer(CorsLayer::permissive())
            .with_state(state);

        if let Some(ref dir) = self.config.web.static_dir {
            app = app.nest_service("/static", ServeDir::new(dir));
        }
        app
    }

    pub async fn run(&self) -> anyhow::Result<()> {
        if !self.config.web.enabled {
            info!("Web UI disabled");
            return Ok(());
        }

        let app = self.router();
        let addr = format!("{}:{}", self.config.web.address, self.config.web.port);
        info!("🌐 Web UI listening on http://{}", addr);

        let listener = tokio::net::TcpListener::bind(&addr).await?;
        axum::serve(listener, app).await?;
        Ok(())
    }
}

/// Dashboard HTML - embedded single-page app
async fn dashboard_page() -> Html<&'static str> {
    Html(include_str!("../../static/dashboard.html"))
}

/// Summary counts + cache stats
async fn api_dashboard(State(state): State<AppState>) -> Json<serde_json::Value> {
    Json(state.dashboard.get_stats())
}

async fn api_products(
    State(state): State<AppState>,
    Query(params): Query<ProductQuery>,
) -> Json<serde_json::Value> {
    let products = state.dashboard.products(params.category.as_deref(), params.limit);
    Json(serde_json::json!({
        "count": products.len(),
        "products": products,
    }))
}

/// Category pie chart data
async fn api_categories(State(state): State<AppState>) -> Json<serde_json::Value> {
    Json(serde_json::json!({
        "categories": state.dashboard.categories(),
    }))
}

/// Supplier scoreboard: `{"status": "scored", top, bottom, all}` or `{"status": "no_data"}`
async fn api_supplier_scores(State(state): State<AppState>) -> Result<Json<serde_json::Value>, ApiError> {
    let board = state.dashboard.supplier_scores()?;
    Ok(Json(serde_json::json!(*board)))
}

async fn api_forecast(State(state): State<AppState>) -> Json<serde_json::Value> {
    Json(serde_json::json!(*state.dashboard.forecast()))
}

async fn api_map(State(state): State<AppState>) -> Json<serde_json::Value> {
    Json(serde_json::json!(state.dashboard.geo()))
}

/// Raw CSV upload. Parsing is CPU-bound, so it runs off the async workers.
async fn api_upload(State(state): State<AppState>, body: Bytes) -> Result<Json<serde_json::Value>, ApiError> {
    let dashboard = state.dashboard.clone();
    let report = tokio::task::spawn_blocking(move || dashboard.import_csv(body.as_ref()))
        .await
        .map_err(|e| ApiError(DashError::Io(std::io::Error::new(std::io::ErrorKind::Other, e))))??;
    Ok(Json(serde_json::json!(report)))
}

async fn metrics_handler(State(state): State<AppState>) -> impl IntoResponse {
    (
        [(header::CONTENT_TYPE, "text/plain; version=0.0.4; charset=utf-8")],
        metrics::render_metrics(&state.dashboard),
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_store_inconsistency_is_server_error() {
        let response = ApiError(DashError::UnknownSupplier(1)).into_response();
        assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
    }

    #[test]
    fn test_bad_upload_is_client_error() {
        let response = ApiError(DashError::import(3, "invalid order date ''")).into_response();
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);

        let response = ApiError(DashError::MissingColumn { column: "Product Name".into() }).into_response();
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    }
}
