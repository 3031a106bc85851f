use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::domain::{
    auth::{AdminSecret, InvalidSecretError, PasswordScheme},
    catalog::{Catalog, CatalogError, DEFAULT_DAYS, DEFAULT_EQUIPMENT, DEFAULT_SHIFTS},
    slot::Label,
};

/// Configuration for a booking deployment.
///
/// Holds the slot catalog, the administrator secret and the storage settings.
/// It is immutable once handed to the engine.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "Versions", into = "Versions")]
pub struct Config {
    /// The equipment, days and shifts that can be booked.
    catalog: Catalog,

    /// Overrides any booking password and authorizes resets.
    admin_secret: AdminSecret,

    /// How booking passwords are stored and compared.
    password_scheme: PasswordScheme,

    /// Where the JSON file backend keeps the bookings.
    ///
    /// Relative paths are resolved against the configuration directory.
    bookings_file: PathBuf,
}

/// Errors raised while loading, validating or saving a configuration.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    /// The configuration file could not be read.
    #[error("Failed to read config file: {0}")]
    Read(#[source] std::io::Error),

    /// The configuration file could not be written.
    #[error("Failed to write config file: {0}")]
    Write(#[source] std::io::Error),

    /// The configuration file is not valid TOML or misses required keys.
    #[error("Failed to parse config file: {0}")]
    Parse(#[from] toml::de::Error),

    /// The configuration could not be serialized.
    #[error("Failed to serialize config: {0}")]
    Serialize(#[from] toml::ser::Error),

    /// The catalog is invalid.
    #[error("Invalid catalog: {0}")]
    Catalog(#[from] CatalogError),

    /// The administrator secret is invalid.
    #[error(transparent)]
    AdminSecret(#[from] InvalidSecretError),
}

impl Config {
    /// Creates a configuration with the given catalog and secret, the plain
    /// text password scheme and the default bookings file.
    #[must_use]
    pub fn new(catalog: Catalog, admin_secret: AdminSecret) -> Self {
        Self {
            catalog,
            admin_secret,
            password_scheme: PasswordScheme::default(),
            bookings_file: default_bookings_file(),
        }
    }

    /// Loads the configuration from a TOML file at the given path.
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be read, if the TOML content is
    /// invalid, or if the catalog or secret fail validation.
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path).map_err(ConfigError::Read)?;
        Ok(toml::from_str(&content)?)
    }

    /// Saves the configuration to a TOML file at the given path.
    ///
    /// # Errors
    ///
    /// Returns an error if the configuration cannot be serialized to TOML or if
    /// the file cannot be written.
    pub fn save(&self, path: &Path) -> Result<(), ConfigError> {
        let content = toml::to_string_pretty(self)?;
        std::fs::write(path, content).map_err(ConfigError::Write)
    }

    /// Returns the slot catalog.
    #[must_use]
    pub const fn catalog(&self) -> &Catalog {
        &self.catalog
    }

    /// Returns the administrator secret.
    #[must_use]
    pub const fn admin_secret(&self) -> &AdminSecret {
        &self.admin_secret
    }

    /// Returns the password scheme.
    #[must_use]
    pub const fn password_scheme(&self) -> PasswordScheme {
        self.password_scheme
    }

    /// Returns the bookings file path as configured.
    #[must_use]
    pub fn bookings_file(&self) -> &Path {
        &self.bookings_file
    }

    /// Sets the password scheme.
    #[must_use]
    pub const fn with_password_scheme(mut self, scheme: PasswordScheme) -> Self {
        self.password_scheme = scheme;
        self
    }

    /// Sets the bookings file path.
    #[must_use]
    pub fn with_bookings_file(mut self, path: PathBuf) -> Self {
        self.bookings_file = path;
        self
    }

    /// Replaces the administrator secret.
    #[must_use]
    pub fn with_admin_secret(mut self, secret: AdminSecret) -> Self {
        self.admin_secret = secret;
        self
    }
}

fn default_bookings_file() -> PathBuf {
    PathBuf::from("bookings.json")
}

fn default_equipment() -> Vec<String> {
    DEFAULT_EQUIPMENT.iter().map(ToString::to_string).collect()
}

fn default_days() -> Vec<String> {
    DEFAULT_DAYS.iter().map(ToString::to_string).collect()
}

fn default_shifts() -> Vec<String> {
    DEFAULT_SHIFTS.iter().map(ToString::to_string).collect()
}

fn label_strings<'a>(labels: impl Iterator<Item = &'a Label>) -> Vec<String> {
    labels.map(ToString::to_string).collect()
}

/// The serialized versions of the configuration.
/// This allows for future changes to the configuration format and to the domain
/// type without breaking compatibility.
#[derive(Debug, Serialize, Deserialize)]
#[serde(tag = "_version")]
enum Versions {
    #[serde(rename = "1")]
    V1 {
        #[serde(default = "default_equipment")]
        equipment: Vec<String>,

        #[serde(default = "default_days")]
        days: Vec<String>,

        #[serde(default = "default_shifts")]
        shifts: Vec<String>,

        admin_secret: String,

        #[serde(default)]
        password_scheme: PasswordScheme,

        #[serde(default = "default_bookings_file")]
        bookings_file: PathBuf,
    },
}

impl TryFrom<Versions> for Config {
    type Error = ConfigError;

    fn try_from(versions: Versions) -> Result<Self, Self::Error> {
        match versions {
            Versions::V1 {
                equipment,
                days,
                shifts,
                admin_secret,
                password_scheme,
                bookings_file,
            } => Ok(Self {
                catalog: Catalog::new(equipment, days, shifts)?,
                admin_secret: AdminSecret::new(admin_secret)?,
                password_scheme,
                bookings_file,
            }),
        }
    }
}

impl From<Config> for Versions {
    fn from(config: Config) -> Self {
        Self::V1 {
            equipment: label_strings(config.catalog.equipment()),
            days: label_strings(config.catalog.days()),
            shifts: label_strings(config.catalog.shifts()),
            admin_secret: config.admin_secret.expose().to_string(),
            password_scheme: config.password_scheme,
            bookings_file: config.bookings_file,
        }
    }
}
