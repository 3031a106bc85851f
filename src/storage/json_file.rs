//! A backend that stores all bookings in one JSON document.
//!
//! The document is an object keyed by slot id:
//!
//! ```json
//! {
//!   "PC 01-Seg-Manhã": { "studentName": "Ana Silva", "password": "1234" }
//! }
//! ```
//!
//! Every write re-reads the file, applies one change and atomically replaces
//! the file, so clients sharing the file only race within a single write.

use std::{
    collections::BTreeMap,
    fs,
    io::{self, Write as _},
    path::{Path, PathBuf},
};

use serde::{Deserialize, Serialize};
use tempfile::NamedTempFile;

use crate::{
    domain::{Booking, SlotId},
    storage::{PersistError, Persistence, Row},
};

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
struct Entry {
    student_name: String,
    password: String,
}

type Document = BTreeMap<String, Entry>;

/// A [`Persistence`] backend backed by a JSON file.
///
/// A missing file reads as an empty set of bookings; it is created on the
/// first write, along with any missing parent directories.
#[derive(Debug, Clone)]
pub struct JsonFile {
    path: PathBuf,
}

impl JsonFile {
    /// Opens (without reading) the file at `path`.
    #[must_use]
    pub const fn new(path: PathBuf) -> Self {
        Self { path }
    }

    /// The path of the backing file.
    #[must_use]
    pub fn path(&self) -> &Path {
        &self.path
    }

    fn unavailable(&self, action: &str, e: impl std::fmt::Display) -> PersistError {
        PersistError::Unavailable(format!(
            "failed to {action} {}: {e}",
            self.path.display()
        ))
    }

    fn read(&self) -> Result<Document, PersistError> {
        let content = match fs::read_to_string(&self.path) {
            Ok(content) => content,
            Err(e) if e.kind() == io::ErrorKind::NotFound => {
                tracing::debug!("{} does not exist yet", self.path.display());
                return Ok(Document::new());
            }
            Err(e) => return Err(self.unavailable("read", e)),
        };
        if content.trim().is_empty() {
            return Ok(Document::new());
        }
        serde_json::from_str(&content).map_err(|e| self.unavailable("parse", e))
    }

    fn write(&self, document: &Document) -> Result<(), PersistError> {
        let content =
            serde_json::to_string_pretty(document).map_err(|e| self.unavailable("encode", e))?;

        let parent = match self.path.parent() {
            Some(parent) if !parent.as_os_str().is_empty() => parent,
            _ => Path::new("."),
        };
        fs::create_dir_all(parent).map_err(|e| self.unavailable("create directory for", e))?;

        // Each write gets its own temporary file next to the target, so
        // concurrent writers never share a partially written file.
        let mut tmp = NamedTempFile::new_in(parent).map_err(|e| self.unavailable("write", e))?;
        tmp.write_all(content.as_bytes())
            .map_err(|e| self.unavailable("write", e))?;
        tmp.persist(&self.path)
            .map_err(|e| self.unavailable("replace", e))?;
        tracing::debug!("wrote {} bookings to {}", document.len(), self.path.display());
        Ok(())
    }
}

impl Persistence for JsonFile {
    fn read_all(&self) -> Result<Vec<Row>, PersistError> {
        Ok(self
            .read()?
            .into_iter()
            .map(|(id, entry)| Row {
                id,
                student_name: entry.student_name,
                password: entry.password,
            })
            .collect())
    }

    fn insert(&mut self, id: &SlotId, booking: &Booking) -> Result<(), PersistError> {
        let mut document = self.read()?;
        let key = id.to_string();
        if document.contains_key(&key) {
            return Err(PersistError::Duplicate(id.clone()));
        }
        document.insert(
            key,
            Entry {
                student_name: booking.student_name().to_string(),
                password: booking.password().to_string(),
            },
        );
        self.write(&document)
    }

    fn delete_by_id(&mut self, id: &SlotId) -> Result<(), PersistError> {
        let mut document = self.read()?;
        if document.remove(&id.to_string()).is_none() {
            return Ok(());
        }
        self.write(&document)
    }

    fn delete_all(&mut self) -> Result<(), PersistError> {
        self.write(&Document::new())
    }
}
