use actix_cors::Cors;
use actix_middleware::{CorrelationIdMiddleware, Logging, MetricsMiddleware};
use actix_web::{web, App, HttpServer};
use crypto_core::jwt::{self, VerifierSettings};
use socially_service::db::{Repositories, MIGRATOR};
use socially_service::handlers;
use socially_service::middleware::SessionAuthMiddleware;
use std::io;
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
                tracing::warn!("Failed to install SIGTERM handler: {}", e);
                let _ = tokio::signal::ctrl_c().await;
            }
        }
    }

    #[cfg(not(unix))]
    {
        let _ = tokio::signal::ctrl_c().await;
    }
}

/// Socially Service
///
/// Serves the `/api` routes for profiles, posts, comments, likes, follows
/// and notifications on top of PostgreSQL.
///
/// # Deployment
///
/// Binds `SOCIALLY_HOST:SOCIALLY_PORT` (default `0.0.0.0:8080`). Migrations
/// embedded in the binary run on startup.
#[actix_web::main]
async fn main() -> io::Result<()> {
    let _ = dotenvy::dotenv();

    init_tracing();

    // Load configuration
    let config = match socially_service::Config::from_env() {
        Ok(cfg) => cfg,
        Err(e) => {
            tracing::error!("Configuration loading failed: {}", e);
            eprintln!("ERROR: Failed to load configuration: {}", e);
            std::process::exit(1);
        }
    };

    tracing::info!("Starting socially-service v{}", env!("CARGO_PKG_VERSION"));
    tracing::info!("Environment: {}", config.app.env);

    let verifier_settings = VerifierSettings {
        issuer: config.identity.issuer.clone(),
        leeway_secs: config.identity.leeway_secs,
    };

    match jwt::load_validation_key() {
        Ok(public_key) => {
            if let Err(err) = jwt::initialize_session_verifier(&public_key, verifier_settings) {
                return Err(io::Error::new(
                    io::ErrorKind::Other,
                    format!("Failed to initialize session verifier: {err}"),
                ));
            }
        }
        Err(err) if config.app.is_production() => {
            return Err(io::Error::new(
                io::ErrorKind::Other,
                format!("Identity public key is required in production: {err}"),
            ));
        }
        Err(err) => {
            tracing::warn!(
                "Identity public key not configured ({err}); authenticated requests will be rejected"
            );
        }
    }

    config.database.log_config();
    let db_pool = match db_pool::create_pool(config.database.clone()).await {
        Ok(pool) => pool,
        Err(e) => {
            tracing::error!("Database pool creation failed: {:#}", e);
            eprintln!("ERROR: Failed to create database pool: {}", e);
            std::process::exit(1);
        }
    };

    if let Err(e) = db_pool::run_migrations(&db_pool, &MIGRATOR).await {
        tracing::error!("Database migrations failed: {:#}", e);
        return Err(io::Error::new(
            io::ErrorKind::Other,
            format!("Database migrations failed: {e}"),
        ));
    }

    let repos = web::Data::new(Repositories::postgres(db_pool));

    let bind_address = format!("{}:{}", config.app.host, config.app.port);
    tracing::info!("Starting HTTP server at {}", bind_address);

    let cors_config = config.cors.clone();
    let mut server = HttpServer::new(move || {
        let mut cors = Cors::default();
        for origin in cors_config.origins() {
            if origin == "*" {
                cors = cors.allow_any_origin();
            } else {
                cors = cors.allowed_origin(origin);
            }
        }
        cors = cors.allow_any_method().allow_any_header().max_age(3600);

        App::new()
            .app_data(repos.clone())
            .wrap(SessionAuthMiddleware)
            .wrap(MetricsMiddleware)
            .wrap(Logging)
            .wrap(CorrelationIdMiddleware)
            .wrap(tracing_actix_web::TracingLogger::default())
            .wrap(cors)
            .route(
                "/metrics",
                web::get().to(socially_service::metrics::serve_metrics),
            )
            .configure(handlers::configure)
    })
    .shutdown_timeout(30)
    .disable_signals();

    if let Some(workers) = config.app.workers {
        server = server.workers(workers);
    }

    let server = server.bind(&bind_address)?.run();
    let handle = server.handle();

    tokio::select! {
        result = server => result,
        _ = shutdown_signal() => {
            tracing::info!("Shutdown signal received, stopping HTTP server");
            handle.stop(true).await;
            Ok(())
        }
    }
}
