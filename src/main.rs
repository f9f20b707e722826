use std::sync::Arc;

use anyhow::Context;
use axum::http::{
    header::{AUTHORIZATION, CONTENT_TYPE},
    HeaderValue, Method,
};
use tower_http::{
    cors::CorsLayer,
    services::{ServeDir, ServeFile},
};
use tracing_subscriber::EnvFilter;

use movie_rec_api::{
    api::{create_router, AppState},
    config::Config,
    db::{
        create_pool, create_redis_client, run_migrations, PgPreferencesStore, PgUserStore,
        PgWatchHistoryStore, RedisStateStore,
    },
    services::{providers::TmdbProvider, GoogleOAuth, TokenIssuer},
};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new("movie_rec_api=info,tower_http=info")),
        )
        .init();

    let config = Config::from_env()?;

    let pool = create_pool(&config.database_url)
        .await
        .context("Failed to connect to PostgreSQL")?;
    run_migrations(&pool).await?;

    let movies = Arc::new(TmdbProvider::new(
        config.tmdb_api_key.clone(),
        config.tmdb_api_url.clone(),
        config.tmdb_image_base_url.clone(),
    ));

    let google = match config.google_credentials() {
        Some((client_id, client_secret)) => {
            let redis_client = create_redis_client(&config.redis_url)
                .context("Failed to create Redis client")?;
            let states = Arc::new(RedisStateStore::new(redis_client));
            Some(GoogleOAuth::new(
                client_id,
                client_secret,
                &config.google_callback_url,
                states,
            )?)
        }
        None => {
            tracing::warn!("GOOGLE_CLIENT_ID/GOOGLE_CLIENT_SECRET not set, Google sign-in disabled");
            None
        }
    };

    let state = Arc::new(AppState::new(
        Arc::new(PgUserStore::new(pool.clone())),
        Arc::new(PgPreferencesStore::new(pool.clone())),
        Arc::new(PgWatchHistoryStore::new(pool)),
        movies,
        TokenIssuer::new(&config.jwt_secret, config.jwt_expiry_days),
        google,
        config.frontend_url.clone(),
    ));

    let frontend_origin = HeaderValue::from_str(config.frontend_url.trim_end_matches('/'))
        .context("FRONTEND_URL is not a valid origin")?;
    let cors = CorsLayer::new()
        .allow_origin(frontend_origin)
        .allow_methods([Method::GET, Method::POST, Method::PUT, Method::DELETE])
        .allow_headers([AUTHORIZATION, CONTENT_TYPE])
        .allow_credentials(true);

    // Unknown paths fall through to the single-page frontend
    let index = format!("{}/index.html", config.static_dir.trim_end_matches('/'));
    let static_files = ServeDir::new(&config.static_dir).fallback(ServeFile::new(index));

    let app = create_router(state)
        .fallback_service(static_files)
        .layer(cors);

    let addr = format!("{}:{}", config.host, config.port);
    let listener = tokio::net::TcpListener::bind(&addr)
        .await
        .with_context(|| format!("Failed to bind {}", addr))?;

    tracing::info!(address = %addr, "Server listening");
    axum::serve(listener, app).await?;

    Ok(())
}
