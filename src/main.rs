use std::net::SocketAddr;
use std::sync::Arc;

use dotenvy::dotenv;
use log::info;
use tower::ServiceBuilder;
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;

use cableserver::api_router::configure_api_routes;
use cableserver::config::AppConfig;
use cableserver::shared::state::AppState;
use cableserver::shared::utils::{create_conn, run_migrations};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenv().ok();
    env_logger::init_from_env(env_logger::Env::new().default_filter_or("info"));

    let config = AppConfig::from_env();
    let database_url =
        std::env::var("DATABASE_URL").unwrap_or_else(|_| config.database_url());

    let pool = create_conn(&database_url)?;

    info!("Running database migrations");
    run_migrations(&pool).map_err(|e| anyhow::anyhow!("{e}"))?;

    let state = Arc::new(AppState::new(pool, config.clone()));

    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    let app = configure_api_routes()
        .layer(
            ServiceBuilder::new()
                .layer(TraceLayer::new_for_http())
                .layer(cors),
        )
        .with_state(state);

    let addr: SocketAddr = format!("{}:{}", config.server.host, config.server.port).parse()?;
    info!("cableserver listening on {addr}");

    axum_server::bind(addr)
        .serve(app.into_make_service())
        .await?;

    Ok(())
}
