// larder/server/src/db/mod.rs

//! PostgreSQL implementations of the larder stores.

mod pg_store;

pub use pg_store::PgStore;
