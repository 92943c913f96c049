use std::{env, sync::Arc};
use tokio::net::TcpListener;
use tower::ServiceBuilder;
use tower_http::{
    cors::{Any, CorsLayer},
    trace::TraceLayer,
};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use vocared_web::{
    config::Config, draft::FileDraftStore, gateway::ApiClient, routes, state::AppState,
};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();
    tracing_subscriber::registry()
        .with(tracing_subscriber::EnvFilter::new(
            env::var("RUST_LOG").unwrap_or_else(|_| "vocared_web=info,tower_http=info".into()),
        ))
        .with(tracing_subscriber::fmt::layer())
        .init();

    let config = Config::from_env()?;
    let api = ApiClient::new(&config.backend_url)?;
    let drafts = FileDraftStore::new(&config.draft_dir)?;
    tracing::info!(
        backend = %api.base_url(),
        drafts = %drafts.dir().display(),
        autosave_secs = config.autosave_every.as_secs(),
        session_idle_mins = config.session_idle.as_secs() / 60,
        "starting vocared-web"
    );

    let state = AppState::new(api, Arc::new(drafts), config.autosave_every);
    state.spawn_session_sweeper(config.session_idle);
    let app = routes::router(state, &config.static_dir).layer(
        ServiceBuilder::new()
            .layer(TraceLayer::new_for_http())
            .layer(CorsLayer::new().allow_origin(Any).allow_methods(Any).allow_headers(Any)),
    );

    let addr = format!("0.0.0.0:{}", config.port);
    let listener = TcpListener::bind(&addr).await?;
    tracing::info!("listening on http://{addr}");

    axum::serve(listener, app).await?;
    Ok(())
}
