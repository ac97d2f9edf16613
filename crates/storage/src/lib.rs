pub mod db;
pub mod error;
pub mod memory;
pub mod sqlite;

pub use db::{create_db, create_in_memory_db, DbPool};
pub use error::Error;
pub use memory::MemoryBackend;
pub use sqlite::SqliteBackend;
