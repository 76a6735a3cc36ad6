//! Loading sales files into a date-indexed [`SalesTable`].
//!
//! A source is read into a [`RawTable`] by the reader matching its extension,
//! then normalized: the date column is located, parsed and turned into the
//! index, and the numeric columns become the products.

pub mod cache;
pub mod dates;
pub mod error;
pub mod normalize;
pub mod raw;
pub mod validate;

pub use cache::{CacheKey, IngestCache};
pub use dates::{find_date_column, DateColumnMatch};
pub use error::{ErrorKind, FormatError, IngestError};
pub use normalize::normalize;
pub use raw::{read_raw, FileKind, RawCell, RawTable};
pub use validate::{
    file_format_requirements, validate_file_format, FormatRequirements, FormatValidation,
    ValidationWarning,
};

use crate::sales_table::SalesTable;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tracing::{debug, info, warn};

/// Bundled demo file used when no source is given.
pub const DEFAULT_DATA_PATH: &str = "data/sample_sales_data.csv";

/// Where a sales table comes from.
#[derive(Debug, Clone, PartialEq)]
pub enum SalesSource {
    /// The bundled default file
    Default,
    /// A file on the local filesystem
    Path(PathBuf),
    /// File contents handed over by a client, with its client-side file name
    Upload { filename: String, bytes: Vec<u8> },
}

impl SalesSource {
    pub fn upload(filename: impl Into<String>, bytes: Vec<u8>) -> Self {
        SalesSource::Upload {
            filename: filename.into(),
            bytes,
        }
    }
}

/// Input bytes resolved from a source, ready for a reader.
struct ResolvedSource<'a> {
    label: String,
    filename: String,
    bytes: std::borrow::Cow<'a, [u8]>,
}

/// Reads raw bytes for `source`, mapping missing files to the right error.
fn resolve_source<'a>(
    source: &'a SalesSource,
    default_path: &Path,
) -> Result<ResolvedSource<'a>, IngestError> {
    match source {
        SalesSource::Upload { filename, bytes } => Ok(ResolvedSource {
            label: format!("upload:{}", filename),
            filename: filename.clone(),
            bytes: std::borrow::Cow::Borrowed(bytes.as_slice()),
        }),
        SalesSource::Path(path) => {
            if !path.exists() {
                return Err(IngestError::NotFound(path.display().to_string()));
            }
            read_file(path)
        }
        SalesSource::Default => {
            if !default_path.exists() {
                return Err(IngestError::NoDataSupplied);
            }
            read_file(default_path)
        }
    }
}

fn read_file<'a>(path: &Path) -> Result<ResolvedSource<'a>, IngestError> {
    let bytes = std::fs::read(path).map_err(|e| match e.kind() {
        std::io::ErrorKind::NotFound => IngestError::NotFound(path.display().to_string()),
        _ => IngestError::Io(format!("{}: {}", path.display(), e)),
    })?;
    Ok(ResolvedSource {
        label: format!("path:{}", path.display()),
        filename: path.display().to_string(),
        bytes: std::borrow::Cow::Owned(bytes),
    })
}

/// Loads and normalizes a sales table without caching.
///
/// # Errors
/// - `IngestError::NotFound` if an explicit path does not exist
/// - `IngestError::NoDataSupplied` if the default file is requested but absent
/// - `IngestError::Format` for unsupported extensions or unusable contents
pub fn load_sales_data(source: &SalesSource, default_path: &Path) -> Result<SalesTable, IngestError> {
    let resolved = resolve_source(source, default_path)?;
    FileKind::from_filename(&resolved.filename)?;
    let raw = read_raw(&resolved.filename, &resolved.bytes)?;
    Ok(normalize(&raw)?)
}

/// Reads a source into a raw table, for validation before normalizing.
pub fn load_raw(source: &SalesSource, default_path: &Path) -> Result<RawTable, IngestError> {
    let resolved = resolve_source(source, default_path)?;
    Ok(read_raw(&resolved.filename, &resolved.bytes)?)
}

/// Result of [`Ingestor::load_validated`].
#[derive(Debug)]
pub struct ValidatedLoad {
    /// Cache entry holding the table, for later invalidation
    pub key: CacheKey,
    pub validation: FormatValidation,
    pub table: Result<Arc<SalesTable>, IngestError>,
}

/// Ingestion component that owns the result cache.
#[derive(Debug)]
pub struct Ingestor {
    default_path: PathBuf,
    cache: IngestCache,
}

impl Default for Ingestor {
    fn default() -> Self {
        Ingestor::new(DEFAULT_DATA_PATH)
    }
}

impl Ingestor {
    pub fn new(default_path: impl Into<PathBuf>) -> Self {
        Ingestor {
            default_path: default_path.into(),
            cache: IngestCache::new(),
        }
    }

    pub fn default_path(&self) -> &Path {
        &self.default_path
    }

    /// Loads `source`, reusing the cached table when the same bytes from the
    /// same source were parsed before.
    pub fn load(&mut self, source: &SalesSource) -> Result<Arc<SalesTable>, IngestError> {
        let resolved = resolve_source(source, &self.default_path)?;
        FileKind::from_filename(&resolved.filename)?;

        let key = CacheKey::new(resolved.label.clone(), &resolved.bytes);
        if let Some(table) = self.cache.get(&key) {
            debug!("Reusing cached table for {}", resolved.label);
            return Ok(table);
        }

        let raw = read_raw(&resolved.filename, &resolved.bytes)?;
        self.normalize_into_cache(key, &raw)
    }

    /// Reads `source` once, validates the raw table and then normalizes it
    /// (or reuses the cached table).
    ///
    /// The outer error covers failures before a raw table exists: missing
    /// files, unsupported extensions and unreadable bytes. A table that was
    /// read but cannot be normalized is reported in [`ValidatedLoad::table`]
    /// next to its validation report.
    pub fn load_validated(&mut self, source: &SalesSource) -> Result<ValidatedLoad, IngestError> {
        let resolved = resolve_source(source, &self.default_path)?;
        let raw = read_raw(&resolved.filename, &resolved.bytes)?;
        let validation = validate_file_format(&raw);
        let key = CacheKey::new(resolved.label.clone(), &resolved.bytes);

        let table = match self.cache.get(&key) {
            Some(table) => Ok(table),
            None => self.normalize_into_cache(key.clone(), &raw),
        };
        Ok(ValidatedLoad {
            key,
            validation,
            table,
        })
    }

    fn normalize_into_cache(
        &mut self,
        key: CacheKey,
        raw: &RawTable,
    ) -> Result<Arc<SalesTable>, IngestError> {
        let table = Arc::new(normalize(raw)?);
        info!(
            "Loaded {} rows x {} columns from {}",
            table.len(),
            table.columns().len(),
            key.source()
        );
        self.cache.insert(key, Arc::clone(&table));
        Ok(table)
    }

    /// Like [`Ingestor::load`] but never fails: on error an empty table is
    /// returned together with a message for the user.
    pub fn load_or_empty(&mut self, source: &SalesSource) -> (Arc<SalesTable>, Option<String>) {
        match self.load(source) {
            Ok(table) => (table, None),
            Err(err) => {
                warn!("Failed to load sales data: {}", err);
                (
                    Arc::new(SalesTable::empty()),
                    Some(format!("Error loading data: {}", err)),
                )
            }
        }
    }

    pub fn cache(&self) -> &IngestCache {
        &self.cache
    }

    pub fn cache_mut(&mut self) -> &mut IngestCache {
        &mut self.cache
    }
}
