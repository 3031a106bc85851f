//! Password sealing and verification.
//!
//! The engine never compares booking passwords itself. It asks an
//! [`AuthChecker`], so a deployment can move from plain text to salted hashes
//! without touching the booking rules.

use non_empty_string::NonEmptyString;
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use uuid::Uuid;

/// Seals passwords for storage and checks attempts against stored values.
pub trait AuthChecker {
    /// Transforms a (trimmed, non-empty) password into its stored form.
    ///
    /// Must return a non-empty string.
    fn seal(&self, password: &str) -> String;

    /// Whether `attempt` matches a value previously produced by
    /// [`seal`](Self::seal).
    fn verify(&self, stored: &str, attempt: &str) -> bool;
}

/// Stores passwords as given and compares them by exact string equality.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct PlainText;

impl AuthChecker for PlainText {
    fn seal(&self, password: &str) -> String {
        password.to_string()
    }

    fn verify(&self, stored: &str, attempt: &str) -> bool {
        stored == attempt
    }
}

/// Stores `sha256$<salt>$<hex digest of salt + password>`.
///
/// The salt is a fresh random UUID per booking.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SaltedSha256;

const SHA256_TAG: &str = "sha256";

impl SaltedSha256 {
    /// Whether a stored value was produced by this checker.
    fn is_sealed(stored: &str) -> bool {
        stored
            .strip_prefix(SHA256_TAG)
            .is_some_and(|rest| rest.starts_with('$'))
    }

    fn digest(salt: &str, password: &str) -> String {
        let mut hasher = Sha256::new();
        hasher.update(salt.as_bytes());
        hasher.update(password.as_bytes());
        format!("{:x}", hasher.finalize())
    }
}

impl AuthChecker for SaltedSha256 {
    fn seal(&self, password: &str) -> String {
        let salt = Uuid::new_v4().simple().to_string();
        let digest = Self::digest(&salt, password);
        format!("{SHA256_TAG}${salt}${digest}")
    }

    fn verify(&self, stored: &str, attempt: &str) -> bool {
        let mut parts = stored.splitn(3, '$');
        let (Some(SHA256_TAG), Some(salt), Some(expected)) =
            (parts.next(), parts.next(), parts.next())
        else {
            tracing::warn!("stored password is not in salted-sha256 format");
            return false;
        };
        constant_time_eq(Self::digest(salt, attempt).as_bytes(), expected.as_bytes())
    }
}

fn constant_time_eq(a: &[u8], b: &[u8]) -> bool {
    a.len() == b.len() && a.iter().zip(b).fold(0u8, |acc, (x, y)| acc | (x ^ y)) == 0
}

/// The password scheme selected in the configuration file.
///
/// The scheme only decides how new passwords are sealed. Verification follows
/// the format of the stored value, so bookings made before the scheme was
/// changed can still be cancelled by their owners.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum PasswordScheme {
    /// See [`PlainText`].
    #[default]
    Plain,
    /// See [`SaltedSha256`].
    SaltedSha256,
}

impl AuthChecker for PasswordScheme {
    fn seal(&self, password: &str) -> String {
        match self {
            Self::Plain => PlainText.seal(password),
            Self::SaltedSha256 => SaltedSha256.seal(password),
        }
    }

    fn verify(&self, stored: &str, attempt: &str) -> bool {
        if SaltedSha256::is_sealed(stored) {
            SaltedSha256.verify(stored, attempt)
        } else {
            PlainText.verify(stored, attempt)
        }
    }
}

/// The shared administrator credential.
///
/// It overrides any booking password on unbook and is the only credential
/// accepted by reset. It is compared by exact string equality and never
/// printed by `Debug`.
#[derive(Clone, PartialEq, Eq)]
pub struct AdminSecret(NonEmptyString);

impl AdminSecret {
    /// Creates a new `AdminSecret`.
    ///
    /// # Errors
    ///
    /// Returns `InvalidSecretError` if the secret is empty or has leading or
    /// trailing whitespace.
    pub fn new(secret: String) -> Result<Self, InvalidSecretError> {
        if secret.trim() != secret {
            return Err(InvalidSecretError);
        }
        NonEmptyString::new(secret)
            .map(Self)
            .map_err(|_| InvalidSecretError)
    }

    /// Generates a random secret.
    #[must_use]
    pub fn generate() -> Self {
        let secret = Uuid::new_v4().simple().to_string();
        Self(NonEmptyString::new(secret).unwrap_or_else(|_| unreachable!("uuid is never empty")))
    }

    /// Whether the attempt is exactly this secret.
    #[must_use]
    pub fn matches(&self, attempt: &str) -> bool {
        constant_time_eq(self.0.as_str().as_bytes(), attempt.as_bytes())
    }

    /// Exposes the secret, for writing it to the configuration file.
    #[must_use]
    pub fn expose(&self) -> &str {
        self.0.as_str()
    }
}

impl std::fmt::Debug for AdminSecret {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str("AdminSecret(<redacted>)")
    }
}

/// Error returned for an unusable administrator secret.
#[derive(Debug, thiserror::Error, PartialEq, Eq)]
#[error("the administrator secret must be non-empty and must not start or end with whitespace")]
pub struct InvalidSecretError;
