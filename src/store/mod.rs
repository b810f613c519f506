pub mod sqlite;

use crate::app::Result;

pub use sqlite::SqliteStore;

/// Durable key/value records. Each value is an opaque document written
/// and read whole.
pub trait Store: Send + Sync {
    fn load(&self, key: &str) -> Result<Option<String>>;
    fn save(&self, key: &str, value: &str) -> Result<()>;
    fn remove(&self, key: &str) -> Result<()>;
}
