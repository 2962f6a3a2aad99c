use sqlx::postgres::{PgConnectOptions, PgPoolOptions};
use sqlx::{Pool, Postgres};
use std::str::FromStr;
use std::time::Duration;
use tracing::info;

pub type DbPool = Pool<Postgres>;

/// `acquire_timeout` bounds how long a query waits for a free connection, so
/// an exhausted pool surfaces as an error instead of a hung request.
pub async fn connect_to_db(
    connection_string: &str,
    acquire_timeout: Duration,
) -> Result<DbPool, sqlx::Error> {
    let options =
        PgConnectOptions::from_str(connection_string)?.application_name("upload-pipeline");

    let pool = PgPoolOptions::new()
        .max_connections(20)
        .min_connections(2)
        .acquire_timeout(acquire_timeout)
        .idle_timeout(Duration::from_secs(600))
        .connect_with(options)
        .await?;

    info!("✅ Connected to PostgreSQL");
    Ok(pool)
}
