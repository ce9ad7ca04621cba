pub mod config;
pub mod database;
pub mod error;
pub mod events;

pub use config::AppConfig;
pub use database::{ConnectionPool, DatabaseConfig, DatabaseConnection, DbPool, DbResult};
pub use error::{Error, ErrorExt, ErrorResponse, Result};
pub use events::{DomainEvent, EventPublisher};
