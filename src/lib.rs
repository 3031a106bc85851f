//! Lab Slot Booking
//!
//! Students reserve (equipment, day, shift) slots in a shared lab. A booking
//! can be cancelled with its own password or with the administrator secret.

pub mod domain;
pub use domain::{Booking, Catalog, Config, SlotId};

/// The booking state machine.
pub mod engine;
pub use engine::{Engine, Outcome, SlotState};

/// Booking persistence: the in-memory store and its backends.
pub mod storage;
pub use storage::{JsonFile, MemoryTable, Persistence, Store};
