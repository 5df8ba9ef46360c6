//! Conversation persistence.

mod libsql_backend;
mod traits;

pub use libsql_backend::LibSqlBackend;
pub use traits::{Database, StoredMessage};
