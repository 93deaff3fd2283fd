mod db;
mod routes;
mod services;
mod state;

#[tokio::main]
async fn main() {
    dotenvy::dotenv().ok();
    tracing_subscriber::fmt::init();

    let database_url = std::env::var("DATABASE_URL").expect("DATABASE_URL required");
    let port: u16 = std::env::var("PORT")
        .unwrap_or_else(|_| "3000".into())
        .parse()
        .expect("invalid PORT");

    let pool = db::init_pool(&database_url)
        .await
        .expect("database init failed");

    let uploads = services::upload::UploadStore::from_env();
    let state = state::AppState::new(pool, uploads);

    // Load the full creator catalog into memory before accepting traffic.
    services::creator::hydrate(&state)
        .await
        .expect("creator hydration failed");

    // Spawn background persistence task.
    let _persistence = services::persistence::spawn_flush_task(state.clone());

    let app = routes::app(state);
    let listener = tokio::net::TcpListener::bind(format!("0.0.0.0:{port}"))
        .await
        .expect("failed to bind");

    tracing::info!(%port, "creator-portal listening");
    axum::serve(listener, app).await.expect("server failed");
}
