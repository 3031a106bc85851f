//! Persistence of bookings.
//!
//! A [`Store`] keeps the current bookings in memory and mirrors every change
//! to a pluggable [`Persistence`] backend, rolling the in-memory state back if
//! the backend write fails.

mod backend;
/// A JSON file backend.
pub mod json_file;
/// An in-memory backend.
pub mod memory;
mod store;

pub use backend::{Persistence, PersistError, Row};
pub use json_file::JsonFile;
pub use memory::MemoryTable;
pub use store::Store;
