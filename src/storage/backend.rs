use crate::domain::{Booking, SlotId};

/// A persisted booking as read back from a backend.
///
/// The key is kept as a raw string; turning it back into a [`SlotId`] is the
/// store's job, so a backend never has to reject rows it cannot interpret.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Row {
    /// The slot key.
    pub id: String,
    /// The student's name.
    pub student_name: String,
    /// The stored (possibly sealed) password.
    pub password: String,
}

impl Row {
    /// Builds a row from a slot and its booking.
    #[must_use]
    pub fn new(id: &SlotId, booking: &Booking) -> Self {
        Self {
            id: id.to_string(),
            student_name: booking.student_name().to_string(),
            password: booking.password().to_string(),
        }
    }
}

/// Errors reported by a persistence backend.
#[derive(Debug, Clone, thiserror::Error, PartialEq, Eq)]
pub enum PersistError {
    /// The backing storage could not be read or written.
    #[error("Storage unavailable: {0}")]
    Unavailable(String),

    /// The backend already holds a booking for this slot.
    ///
    /// Backends that enforce slot uniqueness report this on insert, which is
    /// how a stale in-memory view learns that another client got there first.
    #[error("Slot '{0}' is already booked.")]
    Duplicate(SlotId),
}

/// Durable storage for bookings, keyed by slot.
///
/// Implementations must reject an [`insert`](Self::insert) for a slot that
/// is already stored with [`PersistError::Duplicate`].
pub trait Persistence {
    /// Reads every stored booking.
    ///
    /// # Errors
    ///
    /// Returns [`PersistError::Unavailable`] if the storage cannot be read.
    fn read_all(&self) -> Result<Vec<Row>, PersistError>;

    /// Stores a new booking.
    ///
    /// # Errors
    ///
    /// Returns [`PersistError::Duplicate`] if the slot is already stored, or
    /// [`PersistError::Unavailable`] if the write fails.
    fn insert(&mut self, id: &SlotId, booking: &Booking) -> Result<(), PersistError>;

    /// Deletes the booking for a slot. Deleting an absent slot succeeds.
    ///
    /// # Errors
    ///
    /// Returns [`PersistError::Unavailable`] if the write fails.
    fn delete_by_id(&mut self, id: &SlotId) -> Result<(), PersistError>;

    /// Deletes every booking.
    ///
    /// # Errors
    ///
    /// Returns [`PersistError::Unavailable`] if the write fails.
    fn delete_all(&mut self) -> Result<(), PersistError>;
}
