use std::sync::Arc;

use chrono::NaiveDate;

use custodia_core::{Config, RecordSet};
use custodia_ingest::{DataLoadError, RecordCache};

pub struct AppState {
    pub config: Config,
    pub cache: RecordCache,
    /// Fixed reference date; `None` follows the local calendar.
    pinned_date: Option<NaiveDate>,
}

impl AppState {
    pub fn new(config: Config, pinned_date: Option<NaiveDate>) -> Self {
        Self {
            config,
            cache: RecordCache::new(),
            pinned_date,
        }
    }

    pub fn as_of(&self) -> NaiveDate {
        self.pinned_date
            .unwrap_or_else(|| chrono::Local::now().date_naive())
    }

    /// Current record set, reloaded only when the source file changed.
    pub fn records(&self) -> Result<Arc<RecordSet>, DataLoadError> {
        self.cache.get_or_load(&self.config.source, self.as_of())
    }
}
