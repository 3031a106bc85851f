use std::fmt;

use non_empty_string::NonEmptyString;

use crate::domain::{auth::AuthChecker, CatalogError, SlotId};

/// A reservation of one slot by one student.
///
/// The password is whatever the active [`AuthChecker`] produced when the
/// booking was made: the plain text itself, or a salted hash.
#[derive(Clone, PartialEq, Eq)]
pub struct Booking {
    student_name: NonEmptyString,
    password: NonEmptyString,
}

impl Booking {
    /// Creates a booking record from user input.
    ///
    /// Both values are trimmed before validation and storage.
    ///
    /// # Errors
    ///
    /// Returns a [`ValidationError`] if either value is blank.
    pub fn new(student_name: &str, password: &str) -> Result<Self, ValidationError> {
        let student_name = NonEmptyString::new(student_name.trim().to_string())
            .map_err(|_| ValidationError::BlankName)?;
        let password = NonEmptyString::new(password.trim().to_string())
            .map_err(|_| ValidationError::BlankPassword)?;
        Ok(Self {
            student_name,
            password,
        })
    }

    /// Replaces the password with its sealed form.
    ///
    /// # Errors
    ///
    /// Returns [`ValidationError::BlankPassword`] if the checker sealed the
    /// password to an empty string.
    pub fn sealed<A: AuthChecker + ?Sized>(self, auth: &A) -> Result<Self, ValidationError> {
        let password = NonEmptyString::new(auth.seal(self.password.as_str()))
            .map_err(|_| ValidationError::BlankPassword)?;
        Ok(Self { password, ..self })
    }

    /// The name of the student holding the slot.
    #[must_use]
    pub fn student_name(&self) -> &str {
        self.student_name.as_str()
    }

    /// The first word of the student's name, used where space is tight.
    #[must_use]
    pub fn first_name(&self) -> &str {
        self.student_name()
            .split_whitespace()
            .next()
            .unwrap_or_else(|| self.student_name())
    }

    /// The stored password, as sealed by the active [`AuthChecker`].
    #[must_use]
    pub fn password(&self) -> &str {
        self.password.as_str()
    }
}

impl fmt::Debug for Booking {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Booking")
            .field("student_name", &self.student_name.as_str())
            .field("password", &"<redacted>")
            .finish()
    }
}

/// Malformed booking input.
#[derive(Debug, Clone, thiserror::Error, PartialEq, Eq)]
pub enum ValidationError {
    /// The student name was empty or whitespace.
    #[error("Name and password are required.")]
    BlankName,

    /// The password was empty or whitespace.
    #[error("Name and password are required.")]
    BlankPassword,

    /// The slot is not part of the configured catalog.
    #[error("Slot '{0}' is not part of the schedule.")]
    UnknownSlot(SlotId),

    /// A label did not match the catalog.
    #[error(transparent)]
    Catalog(#[from] CatalogError),
}

#[cfg(test)]
mod tests {
    use test_case::test_case;

    use super::*;
    use crate::domain::auth::PlainText;

    #[test]
    fn new_trims_both_fields() {
        let booking = Booking::new("  Ana Silva ", " 1234\t").unwrap();
        assert_eq!(booking.student_name(), "Ana Silva");
        assert_eq!(booking.password(), "1234");
    }

    #[test_case("", "1234", ValidationError::BlankName; "empty name")]
    #[test_case("   ", "1234", ValidationError::BlankName; "blank name")]
    #[test_case("Ana", "", ValidationError::BlankPassword; "empty password")]
    #[test_case("Ana", " \n ", ValidationError::BlankPassword; "blank password")]
    fn new_rejects_blank_fields(name: &str, password: &str, expected: ValidationError) {
        assert_eq!(Booking::new(name, password).unwrap_err(), expected);
    }

    #[test]
    fn first_name_is_first_word() {
        let booking = Booking::new("Ana Maria Silva", "x").unwrap();
        assert_eq!(booking.first_name(), "Ana");

        let booking = Booking::new("Ana", "x").unwrap();
        assert_eq!(booking.first_name(), "Ana");
    }

    #[test]
    fn debug_never_prints_password() {
        let booking = Booking::new("Ana", "hunter2").unwrap();
        let debug = format!("{booking:?}");
        assert!(debug.contains("Ana"));
        assert!(!debug.contains("hunter2"));
    }

    #[test]
    fn plain_text_sealing_keeps_password() {
        let booking = Booking::new("Ana", "1234").unwrap().sealed(&PlainText).unwrap();
        assert_eq!(booking.password(), "1234");
    }
}
