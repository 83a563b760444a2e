use std::sync::Arc;

use anyhow::Context;

use schoolhouse_auth::{BcryptPasswords, Hs256TokenCodec, TokenCodec};
use schoolhouse_infra::{
    AccountService, ClassService, InMemorySchoolStore, PostgresSchoolStore, SchoolStore, ensure_schema,
};

use crate::config::AppConfig;

/// Everything a handler needs, shared behind one `Arc`.
pub struct AppServices {
    pub accounts: AccountService,
    pub classes: ClassService,
}

/// Services plus the token codec the auth middleware validates with.
pub struct Wiring {
    pub services: Arc<AppServices>,
    pub tokens: Arc<dyn TokenCodec>,
}

pub async fn build_services(config: &AppConfig) -> anyhow::Result<Wiring> {
    let store = build_store(config).await?;
    wire(config, store)
}

/// Wire services over a caller-provided store.
pub fn wire(config: &AppConfig, store: Arc<dyn SchoolStore>) -> anyhow::Result<Wiring> {
    let tokens: Arc<dyn TokenCodec> = Arc::new(
        Hs256TokenCodec::new(&config.jwt_secret, config.jwt_ttl).context("invalid JWT configuration")?,
    );
    let passwords = Arc::new(BcryptPasswords::new(config.bcrypt_cost).context("invalid BCRYPT_COST")?);

    let accounts = AccountService::new(store.clone(), passwords, tokens.clone())
        .context("failed to initialise account service")?;
    let classes = ClassService::new(store);

    Ok(Wiring {
        services: Arc::new(AppServices { accounts, classes }),
        tokens,
    })
}

async fn build_store(config: &AppConfig) -> anyhow::Result<Arc<dyn SchoolStore>> {
    let Some(database) = &config.database else {
        tracing::warn!("DATABASE_URL not set, falling back to in-memory store");
        return Ok(Arc::new(InMemorySchoolStore::new()));
    };

    let pool = database.connect().await.context("failed to connect to Postgres")?;
    ensure_schema(&pool).await.context("failed to prepare database schema")?;
    tracing::info!(max_connections = database.max_connections, "using Postgres store");

    Ok(Arc::new(PostgresSchoolStore::new(pool)))
}
