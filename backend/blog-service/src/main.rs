use actix_cors::Cors;
use anyhow::Context;
use actix_web::{http::header, web, App, HttpServer};
use blog_service::db::{self, PgCommentStore, PgPostStore, PgUserStore};
use blog_service::handlers;
use blog_service::jobs;
use blog_service::models::SystemClock;
use blog_service::services::{CloudinaryUploader, GeminiClient, Reconciler};
use blog_service::{AppState, Config, Stores};
use std::sync::Arc;
use std::time::Duration;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

fn init_tracing() {
    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| "info,actix_web=info,sqlx=warn".into());

    let json = std::env::var("LOG_FORMAT")
        .map(|v| v.eq_ignore_ascii_case("json"))
        .unwrap_or(false);

    if json {
        tracing_subscriber::registry()
            .with(filter)
            .with(tracing_subscriber::fmt::layer().json())
            .init();
    } else {
        tracing_subscriber::registry()
            .with(filter)
            .with(tracing_subscriber::fmt::layer())
            .init();
    }
}

async fn shutdown_signal() {
    #[cfg(unix)]
    {
        use tokio::signal::unix::{signal, SignalKind};

        match signal(SignalKind::terminate()) {
            Ok(mut terminate) => {
                tokio::select! {
                    _ = tokio::signal::ctrl_c() => {},
                    _ = terminate.recv() => {},
                }
            }
            Err(e) => {
                tracing::warn!(error = %e, "SIGTERM handler unavailable; waiting for Ctrl+C only");
                let _ = tokio::signal::ctrl_c().await;
            }
        }
    }

    #[cfg(not(unix))]
    {
        let _ = tokio::signal::ctrl_c().await;
    }
}

/// Blog Service
///
/// Serves the blog frontend: accounts and cookie sessions, posts with
/// uploaded images, comments embedded as summaries in their posts, and
/// AI-generated descriptions. A background job reconciles comments with
/// post summaries.
#[actix_web::main]
async fn main() -> anyhow::Result<()> {
    if let Err(e) = dotenvy::dotenv() {
        // Absent .env is normal outside development
        if !e.not_found() {
            eprintln!("WARN: failed to read .env: {}", e);
        }
    }

    init_tracing();

    let config = Config::from_env().context("Failed to load configuration")?;

    tracing::info!("Starting blog-service v{}", env!("CARGO_PKG_VERSION"));
    tracing::info!("Environment: {}", config.app.env);

    let db_pool = db::create_pool(&config.database)
        .await
        .context("Failed to create database pool")?;

    db::run_migrations(&db_pool)
        .await
        .context("Database migration failed")?;

    let store_timeout = Duration::from_millis(config.database.store_timeout_ms);
    let stores = Stores {
        comments: Arc::new(PgCommentStore::new(db_pool.clone(), store_timeout)),
        posts: Arc::new(PgPostStore::new(db_pool.clone(), store_timeout)),
        users: Arc::new(PgUserStore::new(db_pool.clone(), store_timeout)),
    };
    let clock = Arc::new(SystemClock);

    let uploader = CloudinaryUploader::new(config.media.clone(), clock.clone())
        .context("Failed to build media client")?;
    let gemini = GeminiClient::new(&config.ai).context("Failed to build AI client")?;

    if config.media.cloud_name.is_empty() {
        tracing::warn!("CLOUDINARY_CLOUD_NAME not set; /create-post uploads will fail");
    }
    if config.ai.api_key.is_empty() {
        tracing::warn!("GEMINI_API_KEY not set; /ai-discription will fail");
    }

    let state = web::Data::new(AppState::new(
        stores.clone(),
        Arc::new(uploader),
        Arc::new(gemini),
        clock.clone(),
        &config.auth,
        config.media.max_upload_bytes,
    ));

    let reconciler_handle = if config.reconcile.interval_secs > 0 {
        let reconciler = Arc::new(Reconciler::new(
            stores.comments.clone(),
            stores.posts.clone(),
            clock,
            chrono::Duration::seconds(config.reconcile.min_age_secs as i64),
        ));
        Some(tokio::spawn(jobs::start_reconciler(
            reconciler,
            Duration::from_secs(config.reconcile.interval_secs),
        )))
    } else {
        tracing::info!("Comment reconciler disabled (RECONCILE_INTERVAL_SECS=0)");
        None
    };

    let bind_address = format!("{}:{}", config.app.host, config.app.port);
    tracing::info!("Starting HTTP server at {}", bind_address);

    let origins = config.cors.origins();
    let server = HttpServer::new(move || {
        let mut cors = Cors::default()
            .supports_credentials()
            .allowed_methods(vec!["GET", "POST", "PUT", "DELETE"])
            .allowed_headers(vec![header::CONTENT_TYPE, header::AUTHORIZATION])
            .max_age(3600);
        for origin in &origins {
            if origin == "*" {
                cors = cors.allow_any_origin();
            } else {
                cors = cors.allowed_origin(origin);
            }
        }

        App::new()
            .app_data(state.clone())
            .wrap(cors)
            .wrap(tracing_actix_web::TracingLogger::default())
            .configure(handlers::configure_routes)
    })
    .bind(&bind_address)
    .with_context(|| format!("Failed to bind on {bind_address}"))?
    .disable_signals()
    .run();

    let handle = server.handle();
    let server_task = tokio::spawn(server);

    shutdown_signal().await;
    tracing::info!("Shutdown signal received; stopping HTTP server");

    if let Some(job) = reconciler_handle {
        job.abort();
    }
    handle.stop(true).await;

    server_task
        .await
        .context("HTTP server task failed")?
        .context("HTTP server error")?;

    Ok(())
}
