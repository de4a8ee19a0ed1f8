//! Infrastructure layer: storage adapters behind the `jobboard-core` store traits.

pub mod memory;
pub mod postgres;
pub mod sqlx_errors;

pub use memory::InMemoryStore;
pub use postgres::PostgresStore;
pub use sqlx_errors::{classify_pg_code, from_sqlx};
