// Copyright 2023 Remi Bernotavicius

use crate::{Error, Result};
use diesel::connection::SimpleConnection as _;
use diesel::prelude::Connection as _;
use diesel_migrations::{embed_migrations, EmbeddedMigrations, MigrationHarness};
use std::path::Path;

pub mod models;
pub mod query;
pub mod schema;

pub type Connection = diesel::sqlite::SqliteConnection;

pub const MIGRATIONS: EmbeddedMigrations = embed_migrations!();

/// SQLite leaves foreign keys off per connection, and `ON DELETE CASCADE` depends on them.
fn configure(conn: &mut Connection) -> diesel::QueryResult<()> {
    conn.batch_execute("PRAGMA foreign_keys = ON; PRAGMA busy_timeout = 5000;")
}

pub fn establish_connection(path: impl AsRef<Path>) -> Result<Connection> {
    let mut connection = Connection::establish(&path.as_ref().to_string_lossy())?;
    configure(&mut connection)?;
    connection
        .run_pending_migrations(MIGRATIONS)
        .map_err(Error::Migration)?;
    Ok(connection)
}

/// Pooled access for the HTTP side. Diesel work is blocking, so every closure runs on the
/// pool's blocking executor through `interact`.
#[derive(Clone)]
pub struct Database {
    pool: deadpool_diesel::sqlite::Pool,
}

impl Database {
    pub fn open(path: impl AsRef<Path>, max_size: usize) -> Result<Self> {
        // Run migrations once on a dedicated connection before handing out pooled ones.
        establish_connection(&path)?;

        let manager = deadpool_diesel::sqlite::Manager::new(
            path.as_ref().to_string_lossy(),
            deadpool_diesel::Runtime::Tokio1,
        );
        let pool = deadpool_diesel::sqlite::Pool::builder(manager)
            .max_size(max_size)
            .build()
            .map_err(|e| Error::Pool(e.to_string()))?;
        Ok(Self { pool })
    }

    pub async fn interact<F, T>(&self, f: F) -> Result<T>
    where
        F: FnOnce(&mut Connection) -> Result<T> + Send + 'static,
        T: Send + 'static,
    {
        let conn = self
            .pool
            .get()
            .await
            .map_err(|e| Error::Pool(e.to_string()))?;
        conn.interact(move |conn| {
            configure(conn)?;
            f(conn)
        })
        .await
        .map_err(|e| Error::Pool(e.to_string()))?
    }
}

#[cfg(test)]
pub fn test_connection() -> Connection {
    establish_connection(":memory:").unwrap()
}

#[test]
fn migrations() {
    let mut conn = test_connection();
    conn.revert_all_migrations(MIGRATIONS).unwrap();
    conn.run_pending_migrations(MIGRATIONS).unwrap();
    assert!(!conn.has_pending_migration(MIGRATIONS).unwrap());
}

#[test]
fn foreign_keys_enabled() {
    use diesel::RunQueryDsl as _;

    #[derive(diesel::QueryableByName)]
    struct Pragma {
        #[diesel(sql_type = diesel::sql_types::Integer)]
        foreign_keys: i32,
    }

    let mut conn = test_connection();
    let pragma: Pragma = diesel::sql_query("PRAGMA foreign_keys")
        .get_result(&mut conn)
        .unwrap();
    assert_eq!(pragma.foreign_keys, 1);
}
