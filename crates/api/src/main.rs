use std::sync::Arc;

use anyhow::Context;

use userhub_api::app::build_app;
use userhub_api::config::Config;
use userhub_api::middleware::AuthState;
use userhub_auth::Hs256JwtValidator;
use userhub_users::{InMemoryUserRepository, PostgresUserRepository, UserRepository, UserService};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    userhub_observability::init();

    let config = Config::from_env().context("failed to load configuration")?;
    tracing::info!(?config, "configuration loaded");

    if config.jwt_secret_defaulted {
        tracing::warn!("JWT_SECRET not set; using insecure dev default");
    }

    let repository: Arc<dyn UserRepository> = match config.database_url.as_deref() {
        Some(url) => {
            let postgres = PostgresUserRepository::connect_lazy(url)
                .context("invalid database configuration")?;
            postgres
                .ensure_schema()
                .await
                .context("failed to prepare users table")?;
            Arc::new(postgres)
        }
        None => {
            tracing::warn!("no database configured; users are kept in memory");
            Arc::new(InMemoryUserRepository::new())
        }
    };

    let app = build_app(
        UserService::new(repository),
        AuthState::new(Arc::new(Hs256JwtValidator::new(&config.jwt_secret))),
    )?;

    let listener = tokio::net::TcpListener::bind(config.bind_address())
        .await
        .with_context(|| format!("failed to bind {}", config.bind_address()))?;

    tracing::info!("listening on {}", listener.local_addr()?);

    axum::serve(listener, app).await?;
    Ok(())
}
