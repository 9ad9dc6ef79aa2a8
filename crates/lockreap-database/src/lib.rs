//! # lockreap-database
//!
//! PostgreSQL connection pool management, migrations, and repository
//! implementations for LockReap.

pub mod connection;
pub mod migration;
pub mod repositories;

pub use connection::DatabasePool;
