//! Shelfwise server binary.

use anyhow::{Context, Result};
use clap::Parser;
use figment::Figment;
use figment::providers::{Env, Format, Toml};
use shelfwise_core::config::AppConfig;
use shelfwise_server::bootstrap::ensure_bootstrap_users;
use shelfwise_server::{AppState, create_router};
use std::net::SocketAddr;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

/// Shelfwise - library and shelving service for a social reading tracker
#[derive(Parser, Debug)]
#[command(name = "shelfwised")]
#[command(version, about, long_about = None)]
struct Args {
    /// Path to configuration file
    #[arg(
        short,
        long,
        env = "SHELFWISE_CONFIG",
        default_value = "config/server.toml"
    )]
    config: String,
}

/// Merge the optional config file with `SHELFWISE_` environment variables.
fn load_config(path: &str) -> Result<AppConfig> {
    let mut figment = Figment::new();
    if std::path::Path::new(path).exists() {
        tracing::info!(config_path = %path, "Loading configuration from file");
        figment = figment.merge(Toml::file(path));
    } else {
        tracing::info!(
            config_path = %path,
            "No config file found, using defaults and environment variables"
        );
    }

    let config: AppConfig = figment
        .merge(Env::prefixed("SHELFWISE_").split("__"))
        .extract()
        .context("failed to load configuration")?;

    config
        .metadata
        .validate()
        .map_err(anyhow::Error::msg)
        .context("invalid metadata configuration")?;

    Ok(config)
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();

    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "info,tower_http=info".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    tracing::info!("Shelfwise v{}", env!("CARGO_PKG_VERSION"));

    let config = load_config(&args.config)?;

    let metadata = shelfwise_metadata::from_config(&config.metadata)
        .await
        .context("failed to initialize metadata store")?;
    metadata
        .health_check()
        .await
        .context("metadata store health check failed")?;
    tracing::info!("Metadata store initialized");

    ensure_bootstrap_users(metadata.as_ref(), &config.bootstrap).await?;
    if config.bootstrap.users.is_empty() {
        tracing::warn!("No bootstrap users configured; every API call will be unauthenticated");
    }

    let addr: SocketAddr = config.server.bind.parse().context("invalid bind address")?;

    let state = AppState::new(config, metadata);
    let app = create_router(state);

    tracing::info!("Listening on {}", addr);

    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .with_context(|| format!("failed to bind to {}", addr))?;
    axum::serve(listener, app).await?;

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use shelfwise_core::config::MetadataConfig;

    #[test]
    fn load_config_from_file() {
        let temp = tempfile::tempdir().unwrap();
        let path = temp.path().join("server.toml");
        std::fs::write(
            &path,
            r#"
[server]
bind = "0.0.0.0:9090"
request_timeout_secs = 5

[metadata]
type = "sqlite"
path = "/var/lib/shelfwise/meta.db"

[[bootstrap.users]]
id = "user-1"
username = "reader"
token_hash = "sha256:0000000000000000000000000000000000000000000000000000000000000000"
"#,
        )
        .unwrap();

        let config = load_config(path.to_str().unwrap()).unwrap();
        assert_eq!(config.server.bind, "0.0.0.0:9090");
        assert_eq!(config.server.request_timeout_secs, 5);
        assert!(config.server.metrics_enabled);
        assert!(matches!(config.metadata, MetadataConfig::Sqlite { .. }));
        assert_eq!(config.bootstrap.users.len(), 1);
        assert_eq!(config.bootstrap.users[0].username, "reader");
    }

    #[test]
    fn load_config_rejects_incomplete_postgres() {
        let temp = tempfile::tempdir().unwrap();
        let path = temp.path().join("server.toml");
        std::fs::write(
            &path,
            r#"
[metadata]
type = "postgres"
host = "db"
"#,
        )
        .unwrap();

        assert!(load_config(path.to_str().unwrap()).is_err());
    }
}
