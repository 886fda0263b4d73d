use std::path::PathBuf;
use std::sync::{Arc, Mutex, PoisonError};
use std::time::SystemTime;

use chrono::NaiveDate;
use tracing::{debug, info};

use custodia_core::config::SourceConfig;
use custodia_core::RecordSet;

use crate::csv_import::CsvImporter;
use crate::error::DataLoadError;

/// Identity of one loaded snapshot. Any change reloads.
///
/// Contents are not hashed: a same-length rewrite inside one mtime tick
/// (coarse-mtime filesystems) keeps serving the old snapshot until
/// [`RecordCache::invalidate`] is called.
#[derive(Debug, Clone, PartialEq, Eq)]
struct CacheKey {
    path: PathBuf,
    modified: Option<SystemTime>,
    len: u64,
    /// Custody days depend on the as-of date, so a new day is a new snapshot.
    as_of: NaiveDate,
}

struct CachedRecords {
    key: CacheKey,
    records: Arc<RecordSet>,
}

/// Read cache for the reporting view, keyed by source file identity.
#[derive(Default)]
pub struct RecordCache {
    entry: Mutex<Option<CachedRecords>>,
}

impl RecordCache {
    pub fn new() -> Self {
        Self::default()
    }

    /// Return the cached set when the file is unchanged, otherwise reload.
    pub fn get_or_load(
        &self,
        config: &SourceConfig,
        as_of: NaiveDate,
    ) -> Result<Arc<RecordSet>, DataLoadError> {
        let key = Self::key_for(config, as_of)?;

        let mut entry = self.entry.lock().unwrap_or_else(PoisonError::into_inner);
        if let Some(cached) = entry.as_ref() {
            if cached.key == key {
                debug!(path = %key.path.display(), "record cache hit");
                return Ok(cached.records.clone());
            }
        }

        info!(path = %key.path.display(), "record cache miss; loading source");
        let records = Arc::new(CsvImporter::import(&key.path, config, as_of)?);
        *entry = Some(CachedRecords {
            key,
            records: records.clone(),
        });
        Ok(records)
    }

    /// Drop the cached snapshot; the next read reloads from disk.
    pub fn invalidate(&self) {
        let mut entry = self.entry.lock().unwrap_or_else(PoisonError::into_inner);
        if entry.take().is_some() {
            info!("record cache invalidated");
        }
    }

    fn key_for(config: &SourceConfig, as_of: NaiveDate) -> Result<CacheKey, DataLoadError> {
        let io_err = |source: std::io::Error| DataLoadError::Io {
            path: config.data_file.clone(),
            source,
        };
        let path = std::fs::canonicalize(&config.data_file).map_err(io_err)?;
        let meta = std::fs::metadata(&path).map_err(io_err)?;
        Ok(CacheKey {
            path,
            modified: meta.modified().ok(),
            len: meta.len(),
            as_of,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    const HEADER: &str = "SECCIONAL,DEPENDENCIA PADRE,NOMBRE RESPESPONSABLE,NRO PROCESO,PLACA SIAF,FECHA ENTRADA\n";

    fn as_of() -> NaiveDate {
        NaiveDate::from_ymd_opt(2024, 7, 19).unwrap()
    }

    fn write_source(dir: &tempfile::TempDir, rows: &[&str]) -> SourceConfig {
        let path = dir.path().join("vehiculos.csv");
        let mut file = std::fs::File::create(&path).unwrap();
        file.write_all(HEADER.as_bytes()).unwrap();
        for row in rows {
            writeln!(file, "{row}").unwrap();
        }
        SourceConfig {
            data_file: path,
            ..SourceConfig::default()
        }
    }

    #[test]
    fn unchanged_file_is_served_from_cache() {
        let dir = tempfile::tempdir().unwrap();
        let config = write_source(&dir, &["Caldas,Patio,Smith,1,S1,01/01/2024"]);
        let cache = RecordCache::new();

        let first = cache.get_or_load(&config, as_of()).unwrap();
        let second = cache.get_or_load(&config, as_of()).unwrap();
        assert!(Arc::ptr_eq(&first, &second));
    }

    #[test]
    fn modified_file_is_reloaded() {
        let dir = tempfile::tempdir().unwrap();
        let config = write_source(&dir, &["Caldas,Patio,Smith,1,S1,01/01/2024"]);
        let cache = RecordCache::new();
        let first = cache.get_or_load(&config, as_of()).unwrap();
        assert_eq!(first.len(), 1);

        write_source(
            &dir,
            &["Caldas,Patio,Smith,1,S1,01/01/2024", "Risaralda,Patio,Lopez,2,S2,01/02/2024"],
        );
        let second = cache.get_or_load(&config, as_of()).unwrap();
        assert_eq!(second.len(), 2);
        assert!(!Arc::ptr_eq(&first, &second));
    }

    #[test]
    fn new_as_of_date_reloads() {
        let dir = tempfile::tempdir().unwrap();
        let config = write_source(&dir, &["Caldas,Patio,Smith,1,S1,01/01/2024"]);
        let cache = RecordCache::new();
        let today = cache.get_or_load(&config, as_of()).unwrap();
        let tomorrow = cache
            .get_or_load(&config, as_of().succ_opt().unwrap())
            .unwrap();
        assert_eq!(today.records()[0].custody_days(), Some(200));
        assert_eq!(tomorrow.records()[0].custody_days(), Some(201));
    }

    #[test]
    fn invalidate_forces_reload() {
        let dir = tempfile::tempdir().unwrap();
        let config = write_source(&dir, &["Caldas,Patio,Smith,1,S1,01/01/2024"]);
        let cache = RecordCache::new();
        let first = cache.get_or_load(&config, as_of()).unwrap();
        cache.invalidate();
        let second = cache.get_or_load(&config, as_of()).unwrap();
        assert!(!Arc::ptr_eq(&first, &second));
    }

    #[test]
    fn invalidate_picks_up_same_length_rewrite() {
        let dir = tempfile::tempdir().unwrap();
        let config = write_source(&dir, &["Caldas,Patio,Smith,1,S1,01/01/2024"]);
        let cache = RecordCache::new();
        let first = cache.get_or_load(&config, as_of()).unwrap();
        let modified = std::fs::metadata(&config.data_file).unwrap().modified().unwrap();

        write_source(&dir, &["Caldas,Patio,Lopez,1,S1,01/01/2024"]);
        let file = std::fs::File::options().write(true).open(&config.data_file).unwrap();
        file.set_modified(modified).unwrap();

        let stale = cache.get_or_load(&config, as_of()).unwrap();
        assert!(Arc::ptr_eq(&first, &stale));

        cache.invalidate();
        let fresh = cache.get_or_load(&config, as_of()).unwrap();
        assert_eq!(fresh.records()[0].responsible_party.as_deref(), Some("Lopez"));
    }

    #[test]
    fn missing_file_is_a_load_error() {
        let dir = tempfile::tempdir().unwrap();
        let config = SourceConfig {
            data_file: dir.path().join("absent.csv"),
            ..SourceConfig::default()
        };
        let err = RecordCache::new().get_or_load(&config, as_of()).unwrap_err();
        assert!(matches!(err, DataLoadError::Io { .. }));
    }
}
