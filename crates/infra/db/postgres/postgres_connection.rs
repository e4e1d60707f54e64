use std::time::Duration;

use anyhow::{Context, Result};
use diesel::{
    Connection, PgConnection, RunQueryDsl,
    connection::CacheSize,
    r2d2::{ConnectionManager, CustomizeConnection, Error as R2d2Error, Pool},
    sql_query,
};

/// The hosted Postgres sits behind a transaction-mode pooler, which does not keep
/// prepared statements between checkouts.
#[derive(Debug, Default)]
struct DisablePreparedStatements;

impl CustomizeConnection<PgConnection, R2d2Error> for DisablePreparedStatements {
    fn on_acquire(&self, conn: &mut PgConnection) -> std::result::Result<(), R2d2Error> {
        conn.set_prepared_statement_cache_size(CacheSize::Disabled);
        Ok(())
    }
}

pub type PgPoolSquad = Pool<ConnectionManager<PgConnection>>;

pub fn establish_connection(database_url: &str, max_connections: u32) -> Result<PgPoolSquad> {
    let manager = ConnectionManager::<PgConnection>::new(database_url);

    Pool::builder()
        .max_size(max_connections)
        .connection_timeout(Duration::from_secs(10))
        .connection_customizer(Box::new(DisablePreparedStatements))
        .build(manager)
        .context("failed to build postgres connection pool")
}

/// Round-trips a trivial query so readiness probes can tell a dead database apart.
pub fn check_connection(db_pool: &PgPoolSquad) -> Result<()> {
    let mut conn = db_pool.get().context("failed to check out connection")?;
    sql_query("SELECT 1")
        .execute(&mut conn)
        .context("database ping failed")?;
    Ok(())
}
