//! The store database as commands see it.

use tienda_db::Database;

/// Shared by every command. `Database` clones its pool handle, so no lock.
#[derive(Debug)]
pub struct DbState {
    db: Database,
}

impl DbState {
    pub fn new(db: Database) -> Self {
        DbState { db }
    }

    pub fn inner(&self) -> &Database {
        &self.db
    }
}
