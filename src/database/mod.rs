//! Database layer.
//!
//! Provides SQLite connection management and schema migrations for
//! [`SqliteStore`](crate::storage::SqliteStore).
//!
//! # Usage
//!
//! ```no_run
//! use route_history::database::Database;
//!
//! // Open a persistent database
//! let db = Database::open("route_history.db").expect("failed to open database");
//!
//! // Or use an in-memory database for testing
//! let db = Database::open_in_memory().expect("failed to open in-memory database");
//!
//! let conn = db.connection();
//! ```

pub mod connection;
pub mod migrations;

pub use connection::Database;
