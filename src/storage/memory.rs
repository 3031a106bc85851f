//! A backend that keeps bookings in a map.
//!
//! Nothing survives the process. Useful for tests and for embedding the
//! engine where another layer owns durability.

use std::collections::BTreeMap;

use crate::{
    domain::{Booking, SlotId},
    storage::{PersistError, Persistence, Row},
};

/// A [`Persistence`] backend held entirely in memory.
#[derive(Debug, Default, Clone)]
pub struct MemoryTable {
    rows: BTreeMap<String, Row>,
    unavailable: bool,
}

impl MemoryTable {
    /// Creates an empty table.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates a table pre-populated with raw rows.
    ///
    /// Later rows with the same key replace earlier ones.
    #[must_use]
    pub fn with_rows(rows: impl IntoIterator<Item = Row>) -> Self {
        Self {
            rows: rows.into_iter().map(|row| (row.id.clone(), row)).collect(),
            unavailable: false,
        }
    }

    /// Simulates an outage: while set, every operation fails with
    /// [`PersistError::Unavailable`].
    pub const fn set_unavailable(&mut self, unavailable: bool) {
        self.unavailable = unavailable;
    }

    /// Number of stored rows.
    #[must_use]
    pub fn len(&self) -> usize {
        self.rows.len()
    }

    /// Whether the table holds no rows.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    fn check_available(&self) -> Result<(), PersistError> {
        if self.unavailable {
            Err(PersistError::Unavailable("memory table is offline".to_string()))
        } else {
            Ok(())
        }
    }
}

impl Persistence for MemoryTable {
    fn read_all(&self) -> Result<Vec<Row>, PersistError> {
        self.check_available()?;
        Ok(self.rows.values().cloned().collect())
    }

    fn insert(&mut self, id: &SlotId, booking: &Booking) -> Result<(), PersistError> {
        self.check_available()?;
        let row = Row::new(id, booking);
        if self.rows.contains_key(&row.id) {
            return Err(PersistError::Duplicate(id.clone()));
        }
        self.rows.insert(row.id.clone(), row);
        Ok(())
    }

    fn delete_by_id(&mut self, id: &SlotId) -> Result<(), PersistError> {
        self.check_available()?;
        self.rows.remove(&id.to_string());
        Ok(())
    }

    fn delete_all(&mut self) -> Result<(), PersistError> {
        self.check_available()?;
        self.rows.clear();
        Ok(())
    }
}
