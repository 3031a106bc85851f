//! The fixed set of bookable slots.
//!
//! A [`Catalog`] is three ordered, non-empty label sequences: equipment, days
//! and shifts. Every valid [`SlotId`] is an element of their Cartesian
//! product.

use nonempty::NonEmpty;

use crate::domain::slot::{InvalidLabelError, Label, SlotId};

/// Which of the three catalog sequences a label belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Dimension {
    /// Equipment names.
    Equipment,
    /// Day labels.
    Day,
    /// Shift labels.
    Shift,
}

impl std::fmt::Display for Dimension {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Equipment => f.write_str("equipment"),
            Self::Day => f.write_str("day"),
            Self::Shift => f.write_str("shift"),
        }
    }
}

/// Errors raised while building or querying a catalog.
#[derive(Debug, Clone, thiserror::Error, PartialEq, Eq)]
pub enum CatalogError {
    /// A catalog sequence was empty.
    #[error("the {0} list must not be empty")]
    Empty(Dimension),

    /// A label appears twice in the same sequence.
    #[error("duplicate {0} '{1}'")]
    Duplicate(Dimension, String),

    /// A label is not valid.
    #[error(transparent)]
    Label(#[from] InvalidLabelError),

    /// A label is not part of the catalog.
    #[error("unknown {0} '{1}'")]
    Unknown(Dimension, String),
}

/// The equipment, day and shift sequences that make up the booking grid.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Catalog {
    equipment: NonEmpty<Label>,
    days: NonEmpty<Label>,
    shifts: NonEmpty<Label>,
}

impl Default for Catalog {
    fn default() -> Self {
        Self::new(
            DEFAULT_EQUIPMENT.iter().map(ToString::to_string).collect(),
            DEFAULT_DAYS.iter().map(ToString::to_string).collect(),
            DEFAULT_SHIFTS.iter().map(ToString::to_string).collect(),
        )
        .unwrap_or_else(|e| unreachable!("default catalog is valid: {e}"))
    }
}

/// Equipment available in the lab out of the box.
pub const DEFAULT_EQUIPMENT: &[&str] = &[
    "Silva (S)",
    "Lafferty (L)",
    "Takemoto (T)",
    "Moravec (M)",
    "Kritsky (K)",
    "Microscopio Leica",
    "Microscopio Zeiss",
    "PC 01",
    "PC 02",
];

/// Working days, Monday to Friday.
pub const DEFAULT_DAYS: &[&str] = &["Seg", "Ter", "Qua", "Qui", "Sex"];

/// Shifts within a day.
pub const DEFAULT_SHIFTS: &[&str] = &["Manhã", "Tarde", "Noite"];

impl Catalog {
    /// Builds a catalog from raw label sequences.
    ///
    /// # Errors
    ///
    /// Fails if any sequence is empty, contains an invalid label, or repeats a
    /// label.
    pub fn new(
        equipment: Vec<String>,
        days: Vec<String>,
        shifts: Vec<String>,
    ) -> Result<Self, CatalogError> {
        Ok(Self {
            equipment: labels(Dimension::Equipment, equipment)?,
            days: labels(Dimension::Day, days)?,
            shifts: labels(Dimension::Shift, shifts)?,
        })
    }

    /// The equipment names, in display order.
    pub fn equipment(&self) -> impl Iterator<Item = &Label> {
        self.equipment.iter()
    }

    /// The day labels, in display order.
    pub fn days(&self) -> impl Iterator<Item = &Label> {
        self.days.iter()
    }

    /// The shift labels, in display order.
    pub fn shifts(&self) -> impl Iterator<Item = &Label> {
        self.shifts.iter()
    }

    /// Total number of slots in the grid.
    #[must_use]
    pub fn len(&self) -> usize {
        self.equipment.len() * self.days.len() * self.shifts.len()
    }

    /// A catalog always holds at least one slot.
    #[must_use]
    pub const fn is_empty(&self) -> bool {
        false
    }

    /// Every slot in the grid, ordered by equipment, then day, then shift.
    pub fn slots(&self) -> impl Iterator<Item = SlotId> + '_ {
        self.equipment().flat_map(move |equipment| {
            self.days().flat_map(move |day| {
                self.shifts()
                    .map(move |shift| SlotId::new(equipment.clone(), day.clone(), shift.clone()))
            })
        })
    }

    /// Whether all three labels of the slot belong to this catalog.
    #[must_use]
    pub fn contains(&self, slot: &SlotId) -> bool {
        self.equipment.contains(slot.equipment())
            && self.days.contains(slot.day())
            && self.shifts.contains(slot.shift())
    }

    /// Looks up a slot by its labels, matching exactly.
    ///
    /// # Errors
    ///
    /// Returns [`CatalogError::Unknown`] for the first label not in the
    /// catalog.
    pub fn slot(&self, equipment: &str, day: &str, shift: &str) -> Result<SlotId, CatalogError> {
        Ok(SlotId::new(
            find(&self.equipment, Dimension::Equipment, equipment, exact_eq)?,
            find(&self.days, Dimension::Day, day, exact_eq)?,
            find(&self.shifts, Dimension::Shift, shift, exact_eq)?,
        ))
    }

    /// Looks up a slot by its labels, ignoring case and surrounding
    /// whitespace.
    ///
    /// # Errors
    ///
    /// Returns [`CatalogError::Unknown`] for the first label not in the
    /// catalog.
    pub fn resolve(&self, equipment: &str, day: &str, shift: &str) -> Result<SlotId, CatalogError> {
        Ok(SlotId::new(
            self.resolve_equipment(equipment)?,
            self.resolve_day(day)?,
            find(&self.shifts, Dimension::Shift, shift, loose_eq)?,
        ))
    }

    /// Looks up an equipment name, ignoring case and surrounding whitespace.
    ///
    /// # Errors
    ///
    /// Returns [`CatalogError::Unknown`] if no equipment matches.
    pub fn resolve_equipment(&self, equipment: &str) -> Result<Label, CatalogError> {
        find(&self.equipment, Dimension::Equipment, equipment, loose_eq)
    }

    /// Looks up a day label, ignoring case and surrounding whitespace.
    ///
    /// # Errors
    ///
    /// Returns [`CatalogError::Unknown`] if no day matches.
    pub fn resolve_day(&self, day: &str) -> Result<Label, CatalogError> {
        find(&self.days, Dimension::Day, day, loose_eq)
    }
}

fn exact_eq(label: &str, input: &str) -> bool {
    label == input
}

fn loose_eq(label: &str, input: &str) -> bool {
    label.to_lowercase() == input.trim().to_lowercase()
}

fn find(
    labels: &NonEmpty<Label>,
    dimension: Dimension,
    input: &str,
    matches: impl Fn(&str, &str) -> bool,
) -> Result<Label, CatalogError> {
    labels
        .iter()
        .find(|label| matches(label.as_str(), input))
        .cloned()
        .ok_or_else(|| CatalogError::Unknown(dimension, input.to_string()))
}

fn labels(dimension: Dimension, raw: Vec<String>) -> Result<NonEmpty<Label>, CatalogError> {
    let mut out: Vec<Label> = Vec::with_capacity(raw.len());
    for s in raw {
        let label = Label::new(s)?;
        if out.contains(&label) {
            return Err(CatalogError::Duplicate(dimension, label.to_string()));
        }
        out.push(label);
    }
    NonEmpty::from_vec(out).ok_or(CatalogError::Empty(dimension))
}
