pub mod connection;
pub mod health;

pub use connection::{ConnectionPool, DatabaseConfig, DatabaseConnection};
pub use health::HealthChecker;

use sqlx::{PgPool, Postgres, Transaction};

pub type DbPool = PgPool;
pub type DbTransaction<'a> = Transaction<'a, Postgres>;
pub type DbResult<T> = Result<T, sqlx::Error>;
