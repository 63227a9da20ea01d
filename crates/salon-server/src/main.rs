use anyhow::{Context, Result};
use salon_db::{create_pool_with_size, run_migrations, UserRepo};
use salon_server::auth::hash_password;
use salon_server::config::{load_config, InitialAdminConfig};
use salon_server::state::AppState;
use sqlx::PgPool;

#[tokio::main]
async fn main() -> Result<()> {
    // Initialize tracing
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .init();

    tracing::info!("Starting salon server");

    // Load configuration
    let config_path =
        std::env::var("SALON_CONFIG").unwrap_or_else(|_| "salon-config.yaml".to_string());

    tracing::info!("Loading config from: {}", config_path);
    let config = load_config(&config_path)?;
    tracing::info!("Config loaded successfully");

    // Create database pool
    tracing::info!("Connecting to database...");
    let pool = create_pool_with_size(&config.db.url, config.db.max_connections)
        .await
        .context("Failed to create database pool")?;

    // Run migrations
    tracing::info!("Running database migrations...");
    run_migrations(&pool)
        .await
        .context("Failed to run migrations")?;

    if let Some(admin) = &config.auth.initial_admin {
        seed_initial_admin(&pool, admin).await?;
    }

    let listen = config.listen.clone();
    let app = salon_server::web::build_router(AppState::new(pool, config));

    // Start server with graceful shutdown
    let listener = tokio::net::TcpListener::bind(&listen)
        .await
        .with_context(|| format!("Failed to bind to {}", listen))?;

    tracing::info!("Server listening on {}", listen);

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .context("Server error")?;

    Ok(())
}

/// Create the configured admin account, or promote it if it already exists.
async fn seed_initial_admin(pool: &PgPool, admin: &InitialAdminConfig) -> Result<()> {
    match UserRepo::get_by_email(pool, &admin.email).await? {
        Some(user) if user.is_admin => {
            tracing::info!("Initial admin '{}' already exists, skipping seed", admin.email);
        }
        Some(user) => {
            UserRepo::set_admin(pool, user.user_id, true)
                .await
                .context("Failed to promote initial admin")?;
            tracing::info!("Promoted existing user '{}' to admin", admin.email);
        }
        None => {
            let password_hash =
                hash_password(&admin.password).context("Failed to hash initial admin password")?;
            UserRepo::create(
                pool,
                uuid::Uuid::new_v4(),
                &admin.name,
                &admin.email,
                &password_hash,
                true,
            )
            .await
            .context("Failed to create initial admin")?;
            tracing::info!("Created initial admin: {}", admin.email);
        }
    }
    Ok(())
}

async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            tracing::error!("Failed to listen for Ctrl+C: {}", e);
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut sig) => {
                sig.recv().await;
            }
            Err(e) => {
                tracing::error!("Failed to install SIGTERM handler: {}", e);
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }

    tracing::info!("Shutdown signal received, stopping...");
}
