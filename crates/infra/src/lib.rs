mod config;
mod repos;
mod services;
mod system;

pub use config::{Config, EmailConfig, OneSignalConfig};
pub use repos::{
    IDoseRepo, INotificationRepo, InMemoryDoseRepo, InMemoryNotificationRepo, Repos,
};
pub use services::*;
use sqlx::postgres::PgPoolOptions;
use std::sync::Arc;
pub use system::ISys;
use system::RealSys;

#[derive(Clone)]
pub struct MedtrackContext {
    pub repos: Repos,
    pub channels: Channels,
    pub config: Config,
    pub sys: Arc<dyn ISys>,
}

struct ContextParams {
    pub postgres_connection_string: String,
}

impl MedtrackContext {
    async fn create(params: ContextParams) -> anyhow::Result<Self> {
        let config = Config::new();
        let repos = Repos::create_postgres(&params.postgres_connection_string).await?;
        let channels = Channels::create_http(&config)?;
        Ok(Self {
            repos,
            channels,
            config,
            sys: Arc::new(RealSys {}),
        })
    }

    /// Context backed by inmemory repositories and recording channels
    pub fn create_inmemory() -> Self {
        Self {
            repos: Repos::create_inmemory(),
            channels: Channels::create_inmemory(),
            config: Config::new(),
            sys: Arc::new(RealSys {}),
        }
    }
}

/// Will setup the infrastructure context given the environment
pub async fn setup_context() -> anyhow::Result<MedtrackContext> {
    MedtrackContext::create(ContextParams {
        postgres_connection_string: get_psql_connection_string()?,
    })
    .await
}

fn get_psql_connection_string() -> anyhow::Result<String> {
    const PSQL_CONNECTION_STRING: &str = "DATABASE_URL";

    std::env::var(PSQL_CONNECTION_STRING)
        .map_err(|_| anyhow::anyhow!("{} env var to be present.", PSQL_CONNECTION_STRING))
}

pub async fn run_migration() -> anyhow::Result<()> {
    let pool = PgPoolOptions::new()
        .max_connections(1)
        .connect(&get_psql_connection_string()?)
        .await?;

    sqlx::migrate!().run(&pool).await?;
    Ok(())
}
