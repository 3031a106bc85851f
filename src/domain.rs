//! Domain models for lab slot booking.
//!
//! This module contains the core domain types: slot identifiers, the slot
//! catalog, booking records, password checking and configuration.

/// Password sealing, verification and the administrator secret.
pub mod auth;
pub use auth::{AdminSecret, AuthChecker, PasswordScheme, PlainText, SaltedSha256};

mod booking;
pub use booking::{Booking, ValidationError};

/// The fixed grid of bookable slots.
pub mod catalog;
pub use catalog::{Catalog, CatalogError};

mod config;
pub use config::{Config, ConfigError};

/// Slot identifiers and catalog labels.
pub mod slot;
pub use slot::{Error as SlotIdError, Label, SlotId};
