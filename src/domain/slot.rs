use std::{fmt, str::FromStr};

use non_empty_string::NonEmptyString;

/// The separator joining the three labels of a [`SlotId`].
///
/// Catalog labels may never contain it, which keeps slot keys
/// collision-free and lets them be parsed back into their parts.
pub const SEPARATOR: char = '-';

/// A validated catalog label (an equipment name, a day or a shift).
///
/// Labels are non-empty, carry no surrounding whitespace and never contain
/// the [`SEPARATOR`].
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord)]
pub struct Label(NonEmptyString);

impl Label {
    /// Creates a new `Label` from a string.
    ///
    /// # Errors
    ///
    /// Returns `InvalidLabelError` if the string is empty, has leading or
    /// trailing whitespace, or contains the slot separator.
    pub fn new(s: String) -> Result<Self, InvalidLabelError> {
        if s.trim() != s || s.contains(SEPARATOR) {
            return Err(InvalidLabelError(s));
        }
        let non_empty = NonEmptyString::new(s).map_err(InvalidLabelError)?;
        Ok(Self(non_empty))
    }

    /// Returns the string slice.
    #[must_use]
    pub fn as_str(&self) -> &str {
        self.0.as_str()
    }
}

impl TryFrom<&str> for Label {
    type Error = InvalidLabelError;

    fn try_from(value: &str) -> Result<Self, Self::Error> {
        Self::new(value.to_string())
    }
}

impl AsRef<str> for Label {
    fn as_ref(&self) -> &str {
        self.as_str()
    }
}

impl fmt::Display for Label {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Error returned when a string is not a valid catalog label.
#[derive(Debug, Clone, thiserror::Error, PartialEq, Eq)]
#[error("Invalid label '{0}': must be non-empty, trimmed and must not contain '-'")]
pub struct InvalidLabelError(String);

/// The identifier of a bookable slot: one (equipment, day, shift) triple.
///
/// Its string form is the three labels joined by [`SEPARATOR`], for example
/// `Silva (S)-Seg-Manhã`. That string is the persistence primary key, so it
/// must stay stable across releases.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord)]
pub struct SlotId {
    equipment: Label,
    day: Label,
    shift: Label,
}

impl SlotId {
    /// Derives the slot identifier for the given labels.
    #[must_use]
    pub const fn new(equipment: Label, day: Label, shift: Label) -> Self {
        Self {
            equipment,
            day,
            shift,
        }
    }

    /// The equipment label.
    #[must_use]
    pub const fn equipment(&self) -> &Label {
        &self.equipment
    }

    /// The day label.
    #[must_use]
    pub const fn day(&self) -> &Label {
        &self.day
    }

    /// The shift label.
    #[must_use]
    pub const fn shift(&self) -> &Label {
        &self.shift
    }
}

impl fmt::Display for SlotId {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(
            f,
            "{}{SEPARATOR}{}{SEPARATOR}{}",
            self.equipment, self.day, self.shift
        )
    }
}

/// Errors that can occur when parsing a slot key.
#[derive(Debug, thiserror::Error, PartialEq, Eq)]
pub enum Error {
    /// The key does not have exactly three segments.
    #[error("Invalid slot key '{0}': expected EQUIPMENT{SEPARATOR}DAY{SEPARATOR}SHIFT")]
    Syntax(String),

    /// One of the segments is not a valid label.
    #[error(transparent)]
    Label(#[from] InvalidLabelError),
}

impl FromStr for SlotId {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let parts: Vec<&str> = s.split(SEPARATOR).collect();
        let [equipment, day, shift] = parts.as_slice() else {
            return Err(Error::Syntax(s.to_string()));
        };

        Ok(Self::new(
            Label::try_from(*equipment)?,
            Label::try_from(*day)?,
            Label::try_from(*shift)?,
        ))
    }
}

impl TryFrom<&str> for SlotId {
    type Error = Error;

    fn try_from(value: &str) -> Result<Self, Self::Error> {
        value.parse()
    }
}
