//! File-per-assertion store.
//!
//! Each assertion lives in `<root>/<slug>.sql`:
//!
//! ```text
//! -- Test: <name>
//!
//! <body, byte-for-byte>
//! ```
//!
//! Writes go to a temporary file in the same directory which is then renamed
//! over the target, so readers never observe a partially written assertion.
//! Two names with the same slug share a file: the last save wins.

use std::fs;
use std::io::Write as _;
use std::path::{Path, PathBuf};

use dqbot_core::{StoredAssertion, slugify, sql};

use crate::error::StorageError;

/// First-line marker carrying the assertion name.
const HEADER_PREFIX: &str = "-- Test: ";

const EXTENSION: &str = "sql";

/// Result of scanning the store directory.
#[derive(Debug, Default)]
pub struct Listing {
    /// Readable assertions, ordered by file name.
    pub assertions: Vec<StoredAssertion>,
    /// Files that could not be read, keyed by file stem.
    pub unreadable: Vec<(String, StorageError)>,
}

#[derive(Debug, Clone)]
pub struct AssertionStore {
    root: PathBuf,
}

impl AssertionStore {
    #[must_use]
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    #[must_use]
    pub fn root(&self) -> &Path {
        &self.root
    }

    /// File an assertion with this name is stored in.
    ///
    /// # Errors
    /// Returns `InvalidName` if the name is blank or spans several lines.
    pub fn location_for(&self, name: &str) -> Result<PathBuf, StorageError> {
        let name = checked_name(name)?;
        Ok(self.root.join(format!("{}.{EXTENSION}", slugify(name))))
    }

    /// Persists `body` under `name`, replacing any assertion with the same slug.
    ///
    /// # Errors
    /// Returns `InvalidName` for a blank or multi-line name, `Io` if the root
    /// cannot be created or written.
    pub fn save(&self, name: &str, body: &str) -> Result<PathBuf, StorageError> {
        let path = self.location_for(name)?;
        let name = checked_name(name)?;

        fs::create_dir_all(&self.root).map_err(|e| StorageError::io(&self.root, e))?;

        let mut tmp = tempfile::Builder::new()
            .prefix(".pending-")
            .suffix(".tmp")
            .tempfile_in(&self.root)
            .map_err(|e| StorageError::io(&self.root, e))?;
        tmp.write_all(render(name, body).as_bytes())
            .and_then(|()| tmp.as_file().sync_all())
            .map_err(|e| StorageError::io(tmp.path(), e))?;
        tmp.persist(&path).map_err(|e| StorageError::io(&path, e.error))?;

        tracing::info!(name, path = %path.display(), "assertion saved");
        Ok(path)
    }

    /// Like [`save`](Self::save), but rejects a body that is not a single
    /// well-formed SQL statement before touching disk.
    ///
    /// # Errors
    /// Returns `InvalidSql` for a malformed body, otherwise as [`save`](Self::save).
    pub fn save_validated(&self, name: &str, body: &str) -> Result<PathBuf, StorageError> {
        sql::validate(body).map_err(|e| StorageError::InvalidSql(e.to_string()))?;
        self.save(name, body)
    }

    /// Every readable assertion, ordered by file name. Unreadable files are
    /// logged and skipped.
    ///
    /// # Errors
    /// Returns `Io` if the directory itself cannot be read.
    pub fn list(&self) -> Result<Vec<StoredAssertion>, StorageError> {
        let listing = self.scan()?;
        for (stem, e) in &listing.unreadable {
            tracing::warn!(%stem, error = %e, "skipping unreadable assertion file");
        }
        Ok(listing.assertions)
    }

    /// Reads every `.sql` file under the root. A file that cannot be read
    /// (permissions, invalid UTF-8) is reported in [`Listing::unreadable`]
    /// and does not hide the others.
    ///
    /// A missing root is an empty store.
    ///
    /// # Errors
    /// Returns `Io` if the directory itself cannot be read.
    pub fn scan(&self) -> Result<Listing, StorageError> {
        let entries = match fs::read_dir(&self.root) {
            Ok(entries) => entries,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(Listing::default()),
            Err(e) => return Err(StorageError::io(&self.root, e)),
        };

        let mut paths = Vec::new();
        for entry in entries {
            let path = entry.map_err(|e| StorageError::io(&self.root, e))?.path();
            if path.is_file() && path.extension().is_some_and(|ext| ext == EXTENSION) {
                paths.push(path);
            }
        }
        paths.sort();

        let mut listing = Listing::default();
        for path in paths {
            match fs::read_to_string(&path) {
                Ok(content) => listing.assertions.push(parse(&path, &content)),
                Err(e) => listing.unreadable.push((file_stem(&path), StorageError::io(&path, e))),
            }
        }
        Ok(listing)
    }
}

/// Accepts the name as given; only blank and multi-line names are refused.
fn checked_name(name: &str) -> Result<&str, StorageError> {
    if name.trim().is_empty() {
        return Err(StorageError::InvalidName("assertion name is empty".to_owned()));
    }
    if name.contains(['\n', '\r']) {
        return Err(StorageError::InvalidName(format!("assertion name spans lines: {name:?}")));
    }
    Ok(name)
}

fn file_stem(path: &Path) -> String {
    path.file_stem().map(|s| s.to_string_lossy().into_owned()).unwrap_or_default()
}

fn render(name: &str, body: &str) -> String {
    format!("{HEADER_PREFIX}{name}\n\n{body}")
}

fn parse(path: &Path, content: &str) -> StoredAssertion {
    if let Some(rest) = content.strip_prefix(HEADER_PREFIX) {
        let (name, after) = rest.split_once('\n').unwrap_or((rest, ""));
        let body = after.strip_prefix('\n').unwrap_or(after);
        return StoredAssertion::new(name.trim_end_matches('\r'), body);
    }
    // Hand-written file without a header: the file stem is the name.
    StoredAssertion::new(file_stem(path), content)
}
