//! The booking state machine.
//!
//! Each slot is either free or booked. [`Engine::book`] moves a free slot to
//! booked, [`Engine::unbook`] moves it back, and [`Engine::reset`] frees every
//! slot at once. Every transition is validated against the current store and
//! written through to the persistence backend before it is reported as done.

use std::fmt;

use tracing::instrument;

use crate::{
    domain::{
        AuthChecker, Booking, CatalogError, Config, PasswordScheme, SlotId, ValidationError,
    },
    storage::{PersistError, Persistence, Store},
};

/// Errors returned by engine operations.
///
/// The display text is the message shown to the user.
#[derive(Debug, Clone, thiserror::Error, PartialEq, Eq)]
pub enum Error {
    /// The request was malformed.
    #[error(transparent)]
    Validation(#[from] ValidationError),

    /// The slot is already booked.
    #[error("Slot '{0}' is already booked.")]
    Conflict(SlotId),

    /// The slot is not booked.
    #[error("Slot '{0}' is not booked.")]
    NotFound(SlotId),

    /// The password did not authorize the operation.
    #[error(transparent)]
    Auth(#[from] AuthError),

    /// The persistence backend failed; nothing was changed.
    #[error("Storage unavailable: {0}")]
    StoreUnavailable(String),
}

/// Which credential check failed.
#[derive(Debug, Clone, Copy, thiserror::Error, PartialEq, Eq)]
pub enum AuthError {
    /// Neither the booking password nor the administrator secret matched.
    #[error(
        "Incorrect password. Only the person who booked this slot or an administrator can \
         cancel it."
    )]
    Unbook,

    /// The administrator secret did not match.
    #[error("Incorrect administrator password. Operation cancelled.")]
    Reset,
}

impl From<PersistError> for Error {
    fn from(err: PersistError) -> Self {
        match err {
            PersistError::Unavailable(reason) => Self::StoreUnavailable(reason),
            PersistError::Duplicate(id) => Self::Conflict(id),
        }
    }
}

impl From<CatalogError> for Error {
    fn from(err: CatalogError) -> Self {
        Self::Validation(ValidationError::Catalog(err))
    }
}

/// The state of one slot, as seen by [`Engine::inspect`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SlotState<'a> {
    /// Nobody holds the slot.
    Free,
    /// The slot is held by this booking.
    Booked(&'a Booking),
}

impl<'a> SlotState<'a> {
    /// Whether the slot is free.
    #[must_use]
    pub const fn is_free(&self) -> bool {
        matches!(self, Self::Free)
    }

    /// The booking holding the slot, if any.
    #[must_use]
    pub const fn booking(&self) -> Option<&'a Booking> {
        match self {
            Self::Free => None,
            Self::Booked(booking) => Some(booking),
        }
    }
}

/// The result of a successful state change.
///
/// The display text is the success message shown to the user.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Outcome {
    /// The slot was booked.
    Booked(SlotId),

    /// The slot was freed.
    Unbooked {
        /// The freed slot.
        slot: SlotId,
        /// Whether the administrator secret was used instead of the booking
        /// password.
        by_admin: bool,
    },

    /// Every slot was freed.
    Reset {
        /// How many bookings were removed.
        cleared: usize,
    },
}

impl fmt::Display for Outcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Booked(_) => f.write_str("Booking confirmed."),
            Self::Unbooked { .. } => f.write_str("Booking removed."),
            Self::Reset { .. } => f.write_str("All bookings have been reset."),
        }
    }
}

/// The booking engine.
///
/// Owns the configuration, the booking store and the password checker. The
/// checker defaults to the scheme selected in the configuration.
#[derive(Debug)]
pub struct Engine<P, A = PasswordScheme> {
    config: Config,
    store: Store<P>,
    auth: A,
    load_warning: Option<PersistError>,
}

impl<P: Persistence> Engine<P> {
    /// Opens the engine with the password scheme from the configuration.
    ///
    /// See [`with_auth`](Self::with_auth).
    #[must_use]
    pub fn open(config: Config, backend: P) -> Self {
        let auth = config.password_scheme();
        Self::with_auth(config, backend, auth)
    }
}

impl<P: Persistence, A: AuthChecker> Engine<P, A> {
    /// Opens the engine with an explicit password checker and loads every
    /// stored booking.
    ///
    /// If the backend cannot be read the engine starts with no bookings and
    /// keeps the failure available through
    /// [`load_warning`](Self::load_warning).
    #[must_use]
    pub fn with_auth(config: Config, backend: P, auth: A) -> Self {
        let mut engine = Self {
            config,
            store: Store::new(backend),
            auth,
            load_warning: None,
        };
        if let Err(e) = engine.store.load() {
            tracing::warn!("starting with no bookings: {e}");
            engine.load_warning = Some(e);
        }
        engine
    }

    /// Reloads every booking from the backend, clearing any load warning.
    ///
    /// # Errors
    ///
    /// Returns [`Error::StoreUnavailable`] if the backend cannot be read; the
    /// current bookings are kept.
    pub fn refresh(&mut self) -> Result<usize, Error> {
        let count = self.store.load()?;
        self.load_warning = None;
        Ok(count)
    }

    /// Books a free slot.
    ///
    /// The name and password are trimmed; the password is sealed by the
    /// checker before it is stored.
    ///
    /// # Errors
    ///
    /// - [`Error::Validation`] if the slot is outside the catalog or a field
    ///   is blank
    /// - [`Error::Conflict`] if the slot is already booked, here or in the
    ///   backend
    /// - [`Error::StoreUnavailable`] if the write fails
    #[instrument(level = "debug", skip(self, student_name, password))]
    pub fn book(
        &mut self,
        slot: &SlotId,
        student_name: &str,
        password: &str,
    ) -> Result<Outcome, Error> {
        self.ensure_known(slot)?;
        let booking = Booking::new(student_name, password)?;

        if self.store.get(slot).is_some() {
            return Err(Error::Conflict(slot.clone()));
        }

        let booking = booking.sealed(&self.auth)?;
        match self.store.put(slot.clone(), booking) {
            Ok(()) => {}
            Err(PersistError::Duplicate(id)) => {
                tracing::warn!("{id} was booked elsewhere, reloading");
                if let Err(e) = self.store.load() {
                    tracing::warn!("reload after conflict failed: {e}");
                }
                return Err(Error::Conflict(id));
            }
            Err(e) => return Err(e.into()),
        }

        tracing::info!("booked {slot}");
        Ok(Outcome::Booked(slot.clone()))
    }

    /// Frees a booked slot.
    ///
    /// The attempt is trimmed, then accepted if it matches the booking's
    /// password or the administrator secret.
    ///
    /// # Errors
    ///
    /// - [`Error::NotFound`] if the slot is free
    /// - [`Error::Auth`] if the attempt matches neither credential
    /// - [`Error::StoreUnavailable`] if the write fails
    #[instrument(level = "debug", skip(self, attempt))]
    pub fn unbook(&mut self, slot: &SlotId, attempt: &str) -> Result<Outcome, Error> {
        let Some(booking) = self.store.get(slot) else {
            return Err(Error::NotFound(slot.clone()));
        };

        let attempt = attempt.trim();
        let by_owner = self.auth.verify(booking.password(), attempt);
        let by_admin = !by_owner && self.config.admin_secret().matches(attempt);
        if !by_owner && !by_admin {
            tracing::info!("rejected unbook of {slot}");
            return Err(AuthError::Unbook.into());
        }

        self.store.remove(slot)?;

        tracing::info!(by_admin, "unbooked {slot}");
        Ok(Outcome::Unbooked {
            slot: slot.clone(),
            by_admin,
        })
    }

    /// Frees every slot.
    ///
    /// # Errors
    ///
    /// - [`Error::Auth`] if the (trimmed) attempt is not the administrator
    ///   secret
    /// - [`Error::StoreUnavailable`] if the write fails
    #[instrument(level = "debug", skip(self, attempt))]
    pub fn reset(&mut self, attempt: &str) -> Result<Outcome, Error> {
        if !self.config.admin_secret().matches(attempt.trim()) {
            tracing::info!("rejected reset");
            return Err(AuthError::Reset.into());
        }

        let cleared = self.store.clear()?;

        tracing::info!(cleared, "reset all bookings");
        Ok(Outcome::Reset { cleared })
    }
}

impl<P, A> Engine<P, A> {
    /// Reports whether a slot is free or booked. Never mutates anything.
    #[must_use]
    pub fn inspect(&self, slot: &SlotId) -> SlotState<'_> {
        self.store
            .get(slot)
            .map_or(SlotState::Free, SlotState::Booked)
    }

    /// Looks up a slot by its exact catalog labels.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Validation`] if a label is not in the catalog.
    pub fn slot(&self, equipment: &str, day: &str, shift: &str) -> Result<SlotId, Error> {
        Ok(self.config.catalog().slot(equipment, day, shift)?)
    }

    /// Every slot of the catalog with its state, in grid order.
    pub fn schedule(&self) -> impl Iterator<Item = (SlotId, SlotState<'_>)> + '_ {
        self.config.catalog().slots().map(move |slot| {
            let state = self.inspect(&slot);
            (slot, state)
        })
    }

    /// Every booked slot, ordered by slot id.
    pub fn bookings(&self) -> impl Iterator<Item = (&SlotId, &Booking)> {
        self.store.iter()
    }

    /// The configuration the engine was opened with.
    #[must_use]
    pub const fn config(&self) -> &Config {
        &self.config
    }

    /// Why the initial load failed, if it did.
    #[must_use]
    pub const fn load_warning(&self) -> Option<&PersistError> {
        self.load_warning.as_ref()
    }

    /// The underlying store.
    #[must_use]
    pub const fn store(&self) -> &Store<P> {
        &self.store
    }

    /// Mutable access to the underlying store's backend.
    pub const fn backend_mut(&mut self) -> &mut P {
        self.store.backend_mut()
    }

    fn ensure_known(&self, slot: &SlotId) -> Result<(), Error> {
        if self.config.catalog().contains(slot) {
            Ok(())
        } else {
            Err(ValidationError::UnknownSlot(slot.clone()).into())
        }
    }
}

#[cfg(test)]
mod tests {
    use test_case::test_case;

    use super::*;
    use crate::{
        domain::{AdminSecret, Catalog, PlainText, SaltedSha256},
        storage::MemoryTable,
    };

    const ADMIN: &str = "lab-admin";

    fn config() -> Config {
        Config::new(
            Catalog::default(),
            AdminSecret::new(ADMIN.to_string()).unwrap(),
        )
    }

    fn engine() -> Engine<MemoryTable, PlainText> {
        Engine::with_auth(config(), MemoryTable::new(), PlainText)
    }

    fn slot(engine: &Engine<MemoryTable, impl AuthChecker>, e: &str, d: &str, s: &str) -> SlotId {
        engine.slot(e, d, s).unwrap()
    }

    fn booked(engine: &mut Engine<MemoryTable, PlainText>, password: &str) -> SlotId {
        let id = slot(engine, "PC 01", "Ter", "Tarde");
        engine.book(&id, "Ana Silva", password).unwrap();
        id
    }

    #[test]
    fn every_slot_starts_free() {
        let engine = engine();
        assert_eq!(engine.schedule().count(), 135);
        assert!(engine.schedule().all(|(_, state)| state.is_free()));
    }

    #[test]
    fn scenario_book_reject_unbook() {
        let mut engine = engine();
        let id = slot(&engine, "Silva (S)", "Seg", "Manhã");

        let outcome = engine.book(&id, "Ana Silva", "1234").unwrap();
        assert_eq!(outcome.to_string(), "Booking confirmed.");
        assert_eq!(
            engine.inspect(&id).booking().map(Booking::student_name),
            Some("Ana Silva")
        );

        let err = engine.unbook(&id, "wrong").unwrap_err();
        assert_eq!(err, Error::Auth(AuthError::Unbook));
        assert!(!engine.inspect(&id).is_free());

        let outcome = engine.unbook(&id, "1234").unwrap();
        assert_eq!(
            outcome,
            Outcome::Unbooked {
                slot: id.clone(),
                by_admin: false
            }
        );
        assert!(engine.inspect(&id).is_free());
    }

    #[test]
    fn book_stores_trimmed_record() {
        let mut engine = engine();
        let id = slot(&engine, "PC 02", "Qui", "Noite");

        engine.book(&id, "  Rui Costa ", " pw ").unwrap();

        assert_eq!(
            engine.inspect(&id),
            SlotState::Booked(&Booking::new("Rui Costa", "pw").unwrap())
        );
        assert_eq!(engine.store().backend().len(), 1);
    }

    #[test_case("", "1234"; "empty name")]
    #[test_case("   ", "1234"; "blank name")]
    #[test_case("Ana", ""; "empty password")]
    #[test_case("Ana", "\t"; "blank password")]
    fn book_rejects_blank_input(name: &str, password: &str) {
        let mut engine = engine();
        let id = slot(&engine, "PC 01", "Seg", "Manhã");

        let err = engine.book(&id, name, password).unwrap_err();

        assert!(matches!(err, Error::Validation(_)));
        assert_eq!(err.to_string(), "Name and password are required.");
        assert!(engine.inspect(&id).is_free());
    }

    #[test]
    fn book_rejects_slot_outside_catalog() {
        let mut engine = engine();
        let id: SlotId = "PC 99-Seg-Manhã".parse().unwrap();

        let err = engine.book(&id, "Ana", "1").unwrap_err();

        assert_eq!(err, Error::Validation(ValidationError::UnknownSlot(id)));
    }

    #[test]
    fn book_on_booked_slot_conflicts_and_keeps_record() {
        let mut engine = engine();
        let id = booked(&mut engine, "1234");

        let err = engine.book(&id, "Rui", "9999").unwrap_err();

        assert_eq!(err, Error::Conflict(id.clone()));
        assert_eq!(
            engine.inspect(&id).booking(),
            Some(&Booking::new("Ana Silva", "1234").unwrap())
        );
    }

    #[test]
    fn book_conflicts_with_booking_made_by_another_client() {
        let shared = MemoryTable::new();
        let mut alice = Engine::with_auth(config(), shared, PlainText);
        let id = slot(&alice, "PC 01", "Seg", "Manhã");

        // A second client booked the slot after this engine loaded.
        alice
            .backend_mut()
            .insert(&id, &Booking::new("Rui", "9").unwrap())
            .unwrap();

        let err = alice.book(&id, "Ana", "1").unwrap_err();

        assert_eq!(err, Error::Conflict(id.clone()));
        assert_eq!(
            alice.inspect(&id).booking().map(Booking::student_name),
            Some("Rui")
        );
    }

    #[test_case("12345"; "longer")]
    #[test_case("123"; "shorter")]
    #[test_case("LAB-ADMIN"; "admin secret in wrong case")]
    #[test_case(""; "empty")]
    fn unbook_with_wrong_password_is_rejected(attempt: &str) {
        let mut engine = engine();
        let id = booked(&mut engine, "1234");

        let err = engine.unbook(&id, attempt).unwrap_err();

        assert_eq!(err, Error::Auth(AuthError::Unbook));
        assert_eq!(
            engine.inspect(&id).booking(),
            Some(&Booking::new("Ana Silva", "1234").unwrap())
        );
    }

    #[test]
    fn unbook_attempt_is_trimmed_like_stored_password() {
        let mut engine = engine();
        let id = booked(&mut engine, " 1234 ");

        engine.unbook(&id, "1234  ").unwrap();

        assert!(engine.inspect(&id).is_free());
    }

    #[test]
    fn admin_secret_overrides_any_booking_password() {
        let mut engine = engine();
        let id = booked(&mut engine, "whatever");

        let outcome = engine.unbook(&id, ADMIN).unwrap();

        assert_eq!(
            outcome,
            Outcome::Unbooked {
                slot: id.clone(),
                by_admin: true
            }
        );
        assert!(engine.inspect(&id).is_free());
    }

    #[test]
    fn second_unbook_is_not_found() {
        let mut engine = engine();
        let id = booked(&mut engine, "1234");
        engine.unbook(&id, "1234").unwrap();

        let err = engine.unbook(&id, "1234").unwrap_err();

        assert_eq!(err, Error::NotFound(id));
        assert!(engine.store().is_empty());
    }

    #[test]
    fn reset_with_admin_secret_frees_everything() {
        let mut engine = engine();
        for (e, d, s) in [("PC 01", "Seg", "Manhã"), ("PC 02", "Sex", "Noite")] {
            let id = slot(&engine, e, d, s);
            engine.book(&id, "Ana", "1").unwrap();
        }

        let outcome = engine.reset(ADMIN).unwrap();

        assert_eq!(outcome, Outcome::Reset { cleared: 2 });
        assert_eq!(outcome.to_string(), "All bookings have been reset.");
        assert!(engine.schedule().all(|(_, state)| state.is_free()));
        assert!(engine.store().backend().is_empty());
    }

    #[test]
    fn reset_with_wrong_secret_changes_nothing() {
        let mut engine = engine();
        let id = booked(&mut engine, "1234");

        let err = engine.reset("1234").unwrap_err();

        assert_eq!(err, Error::Auth(AuthError::Reset));
        assert_eq!(
            err.to_string(),
            "Incorrect administrator password. Operation cancelled."
        );
        assert!(!engine.inspect(&id).is_free());
    }

    #[test]
    fn storage_failure_rolls_back_every_mutation() {
        let mut engine = engine();
        let held = booked(&mut engine, "1234");
        let free = slot(&engine, "PC 02", "Seg", "Manhã");
        engine.backend_mut().set_unavailable(true);

        assert!(matches!(
            engine.book(&free, "Rui", "2"),
            Err(Error::StoreUnavailable(_))
        ));
        assert!(matches!(
            engine.unbook(&held, "1234"),
            Err(Error::StoreUnavailable(_))
        ));
        assert!(matches!(
            engine.reset(ADMIN),
            Err(Error::StoreUnavailable(_))
        ));

        assert!(engine.inspect(&free).is_free());
        assert!(!engine.inspect(&held).is_free());
        assert_eq!(engine.store().len(), 1);

        // The engine stays usable once storage recovers.
        engine.backend_mut().set_unavailable(false);
        engine.unbook(&held, "1234").unwrap();
        assert!(engine.store().is_empty());
    }

    #[test]
    fn open_falls_back_to_empty_when_storage_is_down() {
        let mut table = MemoryTable::new();
        let id: SlotId = "PC 01-Seg-Manhã".parse().unwrap();
        table.insert(&id, &Booking::new("Ana", "1").unwrap()).unwrap();
        table.set_unavailable(true);

        let mut engine = Engine::open(config(), table);

        assert!(matches!(
            engine.load_warning(),
            Some(PersistError::Unavailable(_))
        ));
        assert!(engine.inspect(&id).is_free());

        engine.backend_mut().set_unavailable(false);
        assert_eq!(engine.refresh().unwrap(), 1);
        assert!(engine.load_warning().is_none());
        assert!(!engine.inspect(&id).is_free());
    }

    #[test_case(PasswordScheme::Plain, PasswordScheme::SaltedSha256; "plain to salted")]
    #[test_case(PasswordScheme::SaltedSha256, PasswordScheme::Plain; "salted to plain")]
    fn owner_can_unbook_after_scheme_change(before: PasswordScheme, after: PasswordScheme) {
        let mut engine = Engine::open(config().with_password_scheme(before), MemoryTable::new());
        let id = engine.slot("PC 01", "Seg", "Manhã").unwrap();
        engine.book(&id, "Ana", "1234").unwrap();
        let table = engine.store().backend().clone();

        let mut engine = Engine::open(config().with_password_scheme(after), table);

        assert_eq!(
            engine.unbook(&id, "4321").unwrap_err(),
            Error::Auth(AuthError::Unbook)
        );
        engine.unbook(&id, "1234").unwrap();
        assert!(engine.inspect(&id).is_free());
    }

    #[test]
    fn salted_scheme_hides_password_but_still_authorizes() {
        let mut engine = Engine::with_auth(config(), MemoryTable::new(), SaltedSha256);
        let id = engine.slot("PC 01", "Seg", "Manhã").unwrap();

        engine.book(&id, "Ana", "1234").unwrap();
        let stored = engine.inspect(&id).booking().unwrap().password().to_string();
        assert_ne!(stored, "1234");

        assert!(engine.unbook(&id, "4321").is_err());
        engine.unbook(&id, "1234").unwrap();
        assert!(engine.inspect(&id).is_free());
    }

    #[test]
    fn slot_lookup_rejects_unknown_labels() {
        let engine = engine();
        assert!(matches!(
            engine.slot("PC 01", "Sab", "Manhã"),
            Err(Error::Validation(ValidationError::Catalog(_)))
        ));
    }
}
