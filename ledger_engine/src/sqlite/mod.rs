//! SQLite backend for the cabinet ledger.
mod sqlite_impl;

pub mod db;
pub use sqlite_impl::SqliteDatabase;
