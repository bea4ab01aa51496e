//! Infrastructure layer - Directory adapters
//!
//! - `memory`: process-local tree with call journal and fault injection
//! - `sqlite`: directory files on disk

pub mod memory;

#[cfg(feature = "sqlite")]
pub mod sqlite;

pub use memory::{DirectoryCall, InMemoryDirectory};

#[cfg(feature = "sqlite")]
pub use sqlite::{SqliteDirectory, SqliteLocator};
