use crate::cache::TtlCache;
use crate::engine::CalculatedFieldEngine;
use crate::error::{Result, TrackerError};
use crate::normalizer::{canonical_header, NormalizationWarning, SchemaNormalizer};
use crate::schema::{Field, HistoricalDataset, TrainingSession};
use crate::table::SheetTable;
use log::{debug, info, warn};
use serde::{Deserialize, Serialize};
use std::cell::RefCell;
use std::fs::{self, OpenOptions};
use std::path::{Path, PathBuf};
use std::rc::Rc;
use std::time::Duration;

/// The external rows-of-cells store. The first row is the header.
pub trait TabularStore {
    /// Human-readable location, used in logs and as the cache key.
    fn locator(&self) -> String;

    fn read_all(&self) -> Result<Vec<Vec<String>>>;

    fn append_row(&mut self, row: &[String]) -> Result<()>;

    fn overwrite_all(&mut self, rows: &[Vec<String>]) -> Result<()>;
}

impl<T: TabularStore + ?Sized> TabularStore for Box<T> {
    fn locator(&self) -> String {
        (**self).locator()
    }

    fn read_all(&self) -> Result<Vec<Vec<String>>> {
        (**self).read_all()
    }

    fn append_row(&mut self, row: &[String]) -> Result<()> {
        (**self).append_row(row)
    }

    fn overwrite_all(&mut self, rows: &[Vec<String>]) -> Result<()> {
        (**self).overwrite_all(rows)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum LoadStatus {
    Loaded,
    /// The store was reached and holds no sessions yet.
    Empty,
    /// The store could not be reached; the dataset is empty.
    Unreachable(String),
}

/// What read-only consumers render: always a dataset, plus why it may be empty.
#[derive(Debug, Clone, PartialEq)]
pub struct DatasetView {
    pub dataset: HistoricalDataset,
    pub status: LoadStatus,
}

#[derive(Debug, Clone)]
struct Snapshot {
    header: Vec<String>,
    dataset: HistoricalDataset,
}

/// Load/append/replace over a [`TabularStore`], with a short-lived read cache.
///
/// Every load runs the normalizer and the calculated-field engine; every write recomputes
/// before saving and drops the cache so the next load sees it. Writes are single attempts.
pub struct RecordStore<S> {
    store: S,
    normalizer: SchemaNormalizer,
    engine: CalculatedFieldEngine,
    cache: TtlCache<String, Snapshot>,
    read_only: bool,
    last_warnings: Vec<NormalizationWarning>,
}

impl<S: TabularStore> RecordStore<S> {
    pub fn new(store: S, cache_ttl: Duration) -> Self {
        Self {
            store,
            normalizer: SchemaNormalizer::new(),
            engine: CalculatedFieldEngine::new(),
            cache: TtlCache::new(cache_ttl),
            read_only: false,
            last_warnings: Vec::new(),
        }
    }

    pub fn read_only(mut self, read_only: bool) -> Self {
        self.read_only = read_only;
        self
    }

    pub fn is_read_only(&self) -> bool {
        self.read_only
    }

    pub fn store(&self) -> &S {
        &self.store
    }

    /// Warnings from the most recent uncached load.
    pub fn last_warnings(&self) -> &[NormalizationWarning] {
        &self.last_warnings
    }

    /// Full dataset, normalized and recomputed. Served from cache while fresh.
    ///
    /// An empty store is an empty dataset; an unreachable one is `StoreUnavailable`.
    pub fn load(&mut self) -> Result<HistoricalDataset> {
        Ok(self.snapshot()?.dataset)
    }

    /// Like [`load`](Self::load), but never fails: connectivity problems become
    /// [`LoadStatus::Unreachable`] with an empty dataset.
    pub fn load_for_view(&mut self) -> DatasetView {
        match self.load() {
            Ok(dataset) if dataset.is_empty() => DatasetView {
                dataset,
                status: LoadStatus::Empty,
            },
            Ok(dataset) => DatasetView {
                dataset,
                status: LoadStatus::Loaded,
            },
            Err(e) => {
                warn!("Showing empty dataset, store unreachable: {}", e);
                DatasetView {
                    dataset: HistoricalDataset::default(),
                    status: LoadStatus::Unreachable(e.to_string()),
                }
            }
        }
    }

    /// Appends one session, laid out under the store's own header row.
    pub fn append(&mut self, session: &TrainingSession) -> Result<()> {
        self.ensure_writable()?;

        let mut session = session.clone();
        self.engine.recompute_session(&mut session);

        let result = self.append_under_header(&session);
        self.invalidate_cache();

        match &result {
            Ok(()) => info!("Appended session to {}", self.store.locator()),
            Err(e) => warn!("Append to {} failed: {}", self.store.locator(), e),
        }
        result
    }

    /// Overwrites the whole store with `dataset` under the canonical header.
    pub fn replace(&mut self, dataset: &HistoricalDataset) -> Result<()> {
        self.ensure_writable()?;

        let mut dataset = dataset.clone();
        self.engine.recompute_dataset(&mut dataset);
        let rows = SchemaNormalizer::to_table(&dataset).into_rows();

        let result = self.store.overwrite_all(&rows);
        self.invalidate_cache();

        match &result {
            Ok(()) => info!(
                "Replaced {} with {} sessions",
                self.store.locator(),
                dataset.len()
            ),
            Err(e) => warn!("Replace of {} failed: {}", self.store.locator(), e),
        }
        result
    }

    pub fn invalidate_cache(&mut self) {
        self.cache.invalidate(&self.store.locator());
    }

    fn ensure_writable(&self) -> Result<()> {
        if self.read_only {
            return Err(TrackerError::ReadOnly);
        }
        Ok(())
    }

    fn snapshot(&mut self) -> Result<Snapshot> {
        let key = self.store.locator();
        if let Some(snapshot) = self.cache.get(&key) {
            return Ok(snapshot);
        }

        debug!("Cache miss, reading {}", key);
        let table = SheetTable::from_rows(self.store.read_all()?);
        let normalized = self.normalizer.normalize(&table);
        let mut dataset = normalized.dataset;
        self.engine.recompute_dataset(&mut dataset);

        info!("Loaded {} sessions from {}", dataset.len(), key);
        self.last_warnings = normalized.warnings;

        let snapshot = Snapshot {
            header: table.header,
            dataset,
        };
        self.cache.insert(key, snapshot.clone());
        Ok(snapshot)
    }

    fn append_under_header(&mut self, session: &TrainingSession) -> Result<()> {
        // The header may have been edited since the last load.
        self.invalidate_cache();
        let mut header = self.snapshot()?.header;

        if header.iter().all(|h| h.trim().is_empty()) {
            header = canonical_header();
            self.store.append_row(&header)?;
        }

        let (mapping, _) = self.normalizer.header_map(&header);
        for field in Field::ALL {
            if session.get(field).is_some() && !mapping.contains(&Some(field)) {
                warn!("Store has no column for {}, value not saved", field);
            }
        }

        let row = self.normalizer.row_for_header(session, &header);
        self.store.append_row(&row)
    }
}

/// In-process store. Clones share the same rows, so a test can inspect what was written.
#[derive(Debug, Clone)]
pub struct MemoryStore {
    state: Rc<RefCell<MemoryState>>,
}

#[derive(Debug)]
struct MemoryState {
    rows: Vec<Vec<String>>,
    reachable: bool,
    reads: usize,
}

impl Default for MemoryStore {
    fn default() -> Self {
        Self::new()
    }
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::with_rows(Vec::new())
    }

    pub fn with_rows(rows: Vec<Vec<String>>) -> Self {
        Self {
            state: Rc::new(RefCell::new(MemoryState {
                rows,
                reachable: true,
                reads: 0,
            })),
        }
    }

    /// Simulates the store going offline (or coming back).
    pub fn set_reachable(&self, reachable: bool) {
        self.state.borrow_mut().reachable = reachable;
    }

    pub fn rows(&self) -> Vec<Vec<String>> {
        self.state.borrow().rows.clone()
    }

    /// Number of `read_all` calls served so far.
    pub fn read_count(&self) -> usize {
        self.state.borrow().reads
    }

    fn check_reachable(&self) -> Result<()> {
        if self.state.borrow().reachable {
            Ok(())
        } else {
            Err(TrackerError::StoreUnavailable(
                "in-memory store is offline".to_string(),
            ))
        }
    }
}

impl TabularStore for MemoryStore {
    fn locator(&self) -> String {
        "memory".to_string()
    }

    fn read_all(&self) -> Result<Vec<Vec<String>>> {
        self.check_reachable()?;
        let mut state = self.state.borrow_mut();
        state.reads += 1;
        Ok(state.rows.clone())
    }

    fn append_row(&mut self, row: &[String]) -> Result<()> {
        self.check_reachable()
            .map_err(|e| TrackerError::StoreWrite(e.to_string()))?;
        self.state.borrow_mut().rows.push(row.to_vec());
        Ok(())
    }

    fn overwrite_all(&mut self, rows: &[Vec<String>]) -> Result<()> {
        self.check_reachable()
            .map_err(|e| TrackerError::StoreWrite(e.to_string()))?;
        self.state.borrow_mut().rows = rows.to_vec();
        Ok(())
    }
}

/// A header-row CSV file. A file that does not exist yet is an empty store.
#[derive(Debug, Clone)]
pub struct CsvStore {
    path: PathBuf,
}

impl CsvStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn write_error(&self, e: impl std::fmt::Display) -> TrackerError {
        TrackerError::StoreWrite(format!("{}: {}", self.path.display(), e))
    }
}

impl TabularStore for CsvStore {
    fn locator(&self) -> String {
        format!("csv:{}", self.path.display())
    }

    fn read_all(&self) -> Result<Vec<Vec<String>>> {
        if !self.path.exists() {
            debug!("{} does not exist yet, treating as empty", self.path.display());
            return Ok(Vec::new());
        }

        let mut reader = csv::ReaderBuilder::new()
            .has_headers(false)
            .flexible(true)
            .from_path(&self.path)
            .map_err(|e| {
                TrackerError::StoreUnavailable(format!("{}: {}", self.path.display(), e))
            })?;

        let mut rows = Vec::new();
        for record in reader.records() {
            let record = record?;
            rows.push(record.iter().map(str::to_string).collect());
        }
        Ok(rows)
    }

    fn append_row(&mut self, row: &[String]) -> Result<()> {
        let file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(&self.path)
            .map_err(|e| self.write_error(e))?;

        let mut writer = csv::WriterBuilder::new()
            .flexible(true)
            .from_writer(file);
        writer.write_record(row).map_err(|e| self.write_error(e))?;
        writer.flush().map_err(|e| self.write_error(e))?;
        Ok(())
    }

    fn overwrite_all(&mut self, rows: &[Vec<String>]) -> Result<()> {
        if let Some(parent) = self.path.parent().filter(|p| !p.as_os_str().is_empty()) {
            fs::create_dir_all(parent).map_err(|e| self.write_error(e))?;
        }

        let mut writer = csv::WriterBuilder::new()
            .flexible(true)
            .from_path(&self.path)
            .map_err(|e| self.write_error(e))?;
        for row in rows {
            writer.write_record(row).map_err(|e| self.write_error(e))?;
        }
        writer.flush().map_err(|e| self.write_error(e))?;
        Ok(())
    }
}
