use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use lumina_client::{config::AppConfig, db, paths, routes, state::AppState, sync};

#[tokio::main]
async fn main() {
  tracing_subscriber::registry()
    .with(
      tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| "lumina_client=debug,tower_http=debug".into()),
    )
    .with(tracing_subscriber::fmt::layer())
    .init();

  let config = AppConfig::load();

  let db_path = paths::client_db_path();
  let pool = match db::init_db(std::path::Path::new(&db_path)) {
    Ok(pool) => pool,
    Err(e) => {
      tracing::error!("Failed to open {}: {}. Using an in-memory store.", db_path, e);
      db::init_memory_db().expect("Failed to initialize in-memory database")
    }
  };

  let state = AppState::new(config, pool);
  let _sync_worker = sync::spawn_sync_worker(state.db.clone(), state.sync_interval(), state.api_resolver());

  let bind_addr = state.config.bind_addr();
  let listener = tokio::net::TcpListener::bind(&bind_addr)
    .await
    .unwrap_or_else(|_| panic!("Failed to bind to {}", bind_addr));

  tracing::info!("Server running on http://localhost:{}", state.config.server.port);

  axum::serve(listener, routes::app(state))
    .await
    .expect("Server failed to start");
}
