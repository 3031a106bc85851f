use std::collections::BTreeMap;

use crate::{
    domain::{Booking, SlotId},
    storage::{PersistError, Persistence, Row},
};

/// The in-memory view of all bookings, mirrored to a [`Persistence`] backend.
///
/// Every mutation is applied to memory first and then written to the
/// backend. If the write fails the in-memory change is reverted before the
/// error is returned, so memory never drifts from durable state.
#[derive(Debug)]
pub struct Store<P> {
    bookings: BTreeMap<SlotId, Booking>,
    backend: P,
}

impl<P: Persistence> Store<P> {
    /// Creates an empty store over the given backend. Nothing is read until
    /// [`load`](Self::load) is called.
    #[must_use]
    pub const fn new(backend: P) -> Self {
        Self {
            bookings: BTreeMap::new(),
            backend,
        }
    }

    /// Replaces the in-memory bookings with everything the backend holds.
    ///
    /// Rows whose key is not a valid slot id, or whose fields are blank, are
    /// skipped with a warning. Returns the number of bookings loaded.
    ///
    /// # Errors
    ///
    /// Propagates [`PersistError::Unavailable`] from the backend, leaving the
    /// in-memory bookings untouched.
    pub fn load(&mut self) -> Result<usize, PersistError> {
        let rows = self.backend.read_all()?;
        let mut bookings = BTreeMap::new();
        for row in rows {
            if let Some((id, booking)) = parse_row(row) {
                bookings.insert(id, booking);
            }
        }
        tracing::debug!("loaded {} bookings", bookings.len());
        self.bookings = bookings;
        Ok(self.bookings.len())
    }

    /// Inserts a booking, replacing any existing booking for the slot.
    ///
    /// A replacement is written to the backend as a delete followed by an
    /// insert.
    ///
    /// # Errors
    ///
    /// Returns the backend error after restoring the previous in-memory entry.
    pub fn put(&mut self, id: SlotId, booking: Booking) -> Result<(), PersistError> {
        let previous = self.bookings.insert(id.clone(), booking.clone());

        let result = match &previous {
            None => self.backend.insert(&id, &booking),
            Some(old) => self.replace_durable(&id, old, &booking),
        };

        if let Err(e) = result {
            tracing::debug!("rolling back put of {id}: {e}");
            match previous {
                Some(old) => self.bookings.insert(id, old),
                None => self.bookings.remove(&id),
            };
            return Err(e);
        }
        Ok(())
    }

    fn replace_durable(
        &mut self,
        id: &SlotId,
        old: &Booking,
        new: &Booking,
    ) -> Result<(), PersistError> {
        self.backend.delete_by_id(id)?;
        if let Err(e) = self.backend.insert(id, new) {
            if let Err(restore) = self.backend.insert(id, old) {
                tracing::warn!("failed to restore {id} after a failed replace: {restore}");
            }
            return Err(e);
        }
        Ok(())
    }

    /// Removes the booking for a slot, returning it. Removing a free slot is
    /// a no-op and touches no storage.
    ///
    /// # Errors
    ///
    /// Returns the backend error after restoring the in-memory entry.
    pub fn remove(&mut self, id: &SlotId) -> Result<Option<Booking>, PersistError> {
        let Some(old) = self.bookings.remove(id) else {
            return Ok(None);
        };

        if let Err(e) = self.backend.delete_by_id(id) {
            tracing::debug!("rolling back remove of {id}: {e}");
            self.bookings.insert(id.clone(), old);
            return Err(e);
        }
        Ok(Some(old))
    }

    /// Removes every booking, returning how many were removed.
    ///
    /// # Errors
    ///
    /// Returns the backend error after restoring every in-memory entry.
    pub fn clear(&mut self) -> Result<usize, PersistError> {
        let snapshot = std::mem::take(&mut self.bookings);

        if let Err(e) = self.backend.delete_all() {
            tracing::debug!("rolling back clear: {e}");
            self.bookings = snapshot;
            return Err(e);
        }
        Ok(snapshot.len())
    }
}

impl<P> Store<P> {
    /// The booking for a slot, if it is booked.
    #[must_use]
    pub fn get(&self, id: &SlotId) -> Option<&Booking> {
        self.bookings.get(id)
    }

    /// All bookings, ordered by slot id.
    pub fn iter(&self) -> impl Iterator<Item = (&SlotId, &Booking)> {
        self.bookings.iter()
    }

    /// Number of booked slots.
    #[must_use]
    pub fn len(&self) -> usize {
        self.bookings.len()
    }

    /// Whether no slot is booked.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.bookings.is_empty()
    }

    /// The persistence backend.
    #[must_use]
    pub const fn backend(&self) -> &P {
        &self.backend
    }

    /// Mutable access to the persistence backend.
    pub const fn backend_mut(&mut self) -> &mut P {
        &mut self.backend
    }
}

fn parse_row(row: Row) -> Option<(SlotId, Booking)> {
    let id = match row.id.parse::<SlotId>() {
        Ok(id) => id,
        Err(e) => {
            tracing::warn!("skipping stored booking: {e}");
            return None;
        }
    };
    match Booking::new(&row.student_name, &row.password) {
        Ok(booking) => Some((id, booking)),
        Err(e) => {
            tracing::warn!("skipping stored booking for {id}: {e}");
            None
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::storage::MemoryTable;

    fn slot(key: &str) -> SlotId {
        key.parse().unwrap()
    }

    fn booking(name: &str, password: &str) -> Booking {
        Booking::new(name, password).unwrap()
    }

    fn store() -> Store<MemoryTable> {
        Store::new(MemoryTable::new())
    }

    fn reloaded(store: &Store<MemoryTable>) -> Store<MemoryTable> {
        let mut fresh = Store::new(store.backend().clone());
        fresh.load().unwrap();
        fresh
    }

    #[test]
    fn put_then_load_returns_record_verbatim() {
        let mut store = store();
        let id = slot("Silva (S)-Seg-Manhã");
        store.put(id.clone(), booking("Ana Silva", "1234")).unwrap();

        let fresh = reloaded(&store);

        assert_eq!(fresh.get(&id), Some(&booking("Ana Silva", "1234")));
        assert_eq!(fresh.len(), 1);
    }

    #[test]
    fn remove_then_load_omits_record() {
        let mut store = store();
        let id = slot("Silva (S)-Seg-Manhã");
        store.put(id.clone(), booking("Ana Silva", "1234")).unwrap();

        let removed = store.remove(&id).unwrap();

        assert_eq!(removed, Some(booking("Ana Silva", "1234")));
        assert!(reloaded(&store).get(&id).is_none());
    }

    #[test]
    fn remove_absent_is_noop() {
        let mut store = store();
        store.backend_mut().set_unavailable(true);

        assert_eq!(store.remove(&slot("PC 01-Seg-Manhã")), Ok(None));
    }

    #[test]
    fn put_overwrites_existing_entry() {
        let mut store = store();
        let id = slot("PC 01-Seg-Manhã");
        store.put(id.clone(), booking("Ana", "1")).unwrap();
        store.put(id.clone(), booking("Rui", "2")).unwrap();

        assert_eq!(store.get(&id), Some(&booking("Rui", "2")));
        assert_eq!(reloaded(&store).get(&id), Some(&booking("Rui", "2")));
    }

    #[test]
    fn failed_put_rolls_back() {
        let mut store = store();
        let id = slot("PC 01-Seg-Manhã");
        store.backend_mut().set_unavailable(true);

        let err = store.put(id.clone(), booking("Ana", "1")).unwrap_err();

        assert!(matches!(err, PersistError::Unavailable(_)));
        assert!(store.get(&id).is_none());
        assert!(store.is_empty());
    }

    #[test]
    fn failed_overwrite_restores_previous_entry() {
        let mut store = store();
        let id = slot("PC 01-Seg-Manhã");
        store.put(id.clone(), booking("Ana", "1")).unwrap();
        store.backend_mut().set_unavailable(true);

        store.put(id.clone(), booking("Rui", "2")).unwrap_err();

        assert_eq!(store.get(&id), Some(&booking("Ana", "1")));
    }

    #[test]
    fn failed_remove_rolls_back() {
        let mut store = store();
        let id = slot("PC 01-Seg-Manhã");
        store.put(id.clone(), booking("Ana", "1")).unwrap();
        store.backend_mut().set_unavailable(true);

        store.remove(&id).unwrap_err();

        assert_eq!(store.get(&id), Some(&booking("Ana", "1")));
    }

    #[test]
    fn failed_clear_rolls_back() {
        let mut store = store();
        store.put(slot("PC 01-Seg-Manhã"), booking("Ana", "1")).unwrap();
        store.put(slot("PC 02-Seg-Manhã"), booking("Rui", "2")).unwrap();
        store.backend_mut().set_unavailable(true);

        store.clear().unwrap_err();

        assert_eq!(store.len(), 2);
    }

    #[test]
    fn clear_empties_memory_and_backend() {
        let mut store = store();
        store.put(slot("PC 01-Seg-Manhã"), booking("Ana", "1")).unwrap();
        store.put(slot("PC 02-Seg-Manhã"), booking("Rui", "2")).unwrap();

        assert_eq!(store.clear().unwrap(), 2);
        assert!(store.is_empty());
        assert!(store.backend().is_empty());
    }

    #[test]
    fn load_failure_leaves_memory_untouched() {
        let mut store = store();
        store.put(slot("PC 01-Seg-Manhã"), booking("Ana", "1")).unwrap();
        store.backend_mut().set_unavailable(true);

        assert!(store.load().is_err());
        assert_eq!(store.len(), 1);
    }

    #[test]
    fn load_skips_unparseable_rows() {
        let table = MemoryTable::with_rows([
            Row {
                id: "no separators here".to_string(),
                student_name: "Ana".to_string(),
                password: "1".to_string(),
            },
            Row {
                id: "PC 01-Seg-Manhã".to_string(),
                student_name: "  ".to_string(),
                password: "1".to_string(),
            },
            Row {
                id: "PC 02-Seg-Manhã".to_string(),
                student_name: "Rui".to_string(),
                password: "2".to_string(),
            },
        ]);
        let mut store = Store::new(table);

        assert_eq!(store.load().unwrap(), 1);
        assert_eq!(
            store.get(&slot("PC 02-Seg-Manhã")),
            Some(&booking("Rui", "2"))
        );
    }
}
