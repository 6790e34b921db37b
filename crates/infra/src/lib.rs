mod config;
mod repos;
mod services;
mod system;

pub use config::{ApnsConfig, Config, FcmConfig, SmtpConfig};
pub use repos::{
    IReminderRepo, IUserRepo, InMemoryReminderRepo, InMemoryUserRepo, PostgresReminderRepo,
    PostgresUserRepo, Repos,
};
pub use services::{
    ApnsChannel, EmailErrorSink, FcmChannel, IErrorSink, IPushChannel, LogErrorSink, Notifiers,
    PushError,
};
use std::sync::Arc;
pub use system::ISys;
use system::RealSys;

#[derive(Clone)]
pub struct ChimeContext {
    pub repos: Repos,
    pub notifiers: Notifiers,
    pub config: Config,
    pub sys: Arc<dyn ISys>,
}

struct ContextParams {
    pub postgres_connection_string: String,
}

impl ChimeContext {
    async fn create(params: ContextParams) -> Self {
        let config = Config::new();
        let repos = Repos::create_postgres(
            &params.postgres_connection_string,
            config.localized_reminder_text,
        )
        .await
        .expect("Postgres credentials must be set and valid");
        let notifiers = Notifiers::create(&config);
        Self {
            repos,
            notifiers,
            config,
            sys: Arc::new(RealSys {}),
        }
    }

    /// Context backed by in-memory repositories, used by tests
    pub fn create_inmemory() -> Self {
        let config = Config::new();
        let notifiers = Notifiers::create(&config);
        Self {
            repos: Repos::create_inmemory(),
            notifiers,
            config,
            sys: Arc::new(RealSys {}),
        }
    }
}

/// Will setup the infrastructure context given the environment
pub async fn setup_context() -> ChimeContext {
    ChimeContext::create(ContextParams {
        postgres_connection_string: get_psql_connection_string(),
    })
    .await
}

fn get_psql_connection_string() -> String {
    const PSQL_CONNECTION_STRING: &str = "DATABASE_URL";

    std::env::var(PSQL_CONNECTION_STRING)
        .unwrap_or_else(|_| panic!("{} env var to be present.", PSQL_CONNECTION_STRING))
}
