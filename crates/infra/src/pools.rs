//! Connection-pool construction: one `PgPool`, one `clickhouse::Client`,
//! one Redis `ConnectionManager`, built once at startup and shared as
//! process-wide singletons (mirrors the pool-construction shape the
//! teacher's Postgres-backed stores expect to be handed).

use redis::aio::ConnectionManager;
use sqlx::postgres::PgPoolOptions;
use sqlx::PgPool;

use errly_core::{ErrlyError, ErrlyResult};

use crate::config::Config;

pub async fn connect_postgres(config: &Config) -> ErrlyResult<PgPool> {
    PgPoolOptions::new()
        .max_connections(10)
        .idle_timeout(config.idle_timeout)
        .connect(&config.postgres_url)
        .await
        .map_err(|e| ErrlyError::unavailable(format!("failed to connect to postgres: {e}")))
}

pub fn connect_clickhouse(config: &Config) -> clickhouse::Client {
    let mut client = clickhouse::Client::default()
        .with_url(&config.clickhouse_url)
        .with_user(&config.clickhouse_user)
        .with_database(&config.clickhouse_database);

    if !config.clickhouse_password.is_empty() {
        client = client.with_password(&config.clickhouse_password);
    }

    client
}

pub async fn connect_redis(config: &Config) -> ErrlyResult<ConnectionManager> {
    let client = redis::Client::open(config.redis_url.clone())
        .map_err(|e| ErrlyError::unavailable(format!("invalid redis url: {e}")))?;

    client
        .get_connection_manager()
        .await
        .map_err(|e| ErrlyError::unavailable(format!("failed to connect to redis: {e}")))
}
