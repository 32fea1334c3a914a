use std::{net::SocketAddr, sync::Arc};

use axum::{
    routing::{get, post},
    Router,
};
use tracing::info;
use utoipa::OpenApi;
use utoipa_swagger_ui::SwaggerUi;

use ticketgen_backend::{
    asset::LocalAssetStore, config::Config, openapi::ApiDoc, record::SqliteRecordStore, routes,
    state::AppState, ticket::TicketAssets,
};

#[tokio::main]
async fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .init();

    let cfg = Config::load();

    let records = SqliteRecordStore::open(&cfg.database_path).expect("failed to open record store");
    let assets = LocalAssetStore::new(&cfg.blob_dir).expect("failed to open asset store");
    let ticket = TicketAssets::load(&cfg.assets_dir).expect("failed to load ticket assets");

    let state = AppState {
        records: Arc::new(records),
        assets: Arc::new(assets),
        ticket: Arc::new(ticket),
        secret_key: cfg.secret_key.clone().into(),
    };

    let app = Router::new()
        // Swagger UI + OpenAPI schema
        .merge(SwaggerUi::new("/docs").url("/openapi.json", ApiDoc::openapi()))
        .route("/", get(routes::homepage))
        .route("/health", get(routes::health))
        .route("/api/register-student", post(routes::register_student))
        .with_state(state);

    let addr: SocketAddr = format!("{}:{}", cfg.host, cfg.port)
        .parse()
        .expect("bind addr");
    info!("Starting ticketgen-backend on http://{addr}");

    let listener = tokio::net::TcpListener::bind(addr).await.unwrap();
    axum::serve(listener, app).await.unwrap();
}
