//! Abidjan Commerce - dropshipping storefront and back-office service

use anyhow::Result;
use axum::routing::get;
use axum::Json;
use sqlx::postgres::PgPoolOptions;
use tower_http::{cors::CorsLayer, trace::TraceLayer};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use abidjan_commerce::{http, AppState};

#[tokio::main]
async fn main() -> Result<()> {
    dotenvy::dotenv().ok();
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "info".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let db = PgPoolOptions::new()
        .max_connections(10)
        .connect(&std::env::var("DATABASE_URL")?)
        .await?;
    sqlx::migrate!("./migrations").run(&db).await?;

    let nats = match std::env::var("NATS_URL") {
        Ok(url) => async_nats::connect(&url).await.ok(),
        Err(_) => None,
    };
    let shipping_fee = std::env::var("SHIPPING_FLAT_FEE")
        .ok()
        .and_then(|v| v.parse().ok())
        .unwrap_or(2500);
    let state = AppState {
        db,
        nats,
        shipping_fee,
    };

    let app = http::router(state)
        .route(
            "/health",
            get(|| async {
                Json(serde_json::json!({"status": "healthy", "service": "abidjan-commerce"}))
            }),
        )
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive());

    let port = std::env::var("PORT").unwrap_or_else(|_| "8083".to_string());
    tracing::info!("abidjan-commerce listening on 0.0.0.0:{}", port);
    axum::serve(
        tokio::net::TcpListener::bind(format!("0.0.0.0:{}", port)).await?,
        app,
    )
    .await?;
    Ok(())
}
