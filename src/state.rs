use std::collections::{BTreeMap, BTreeSet};
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use crate::data::cache::{Clock, SystemClock, TableCache};
use crate::data::fetcher::{CsvFileFetcher, TableFetcher};
use crate::data::filter::{FilterSet, Filtered};
use crate::data::model::{Capabilities, CellValue, Column, Record, Table};
use crate::data::summary::{distinct_values, numeric_bounds, Summary};

/// Year-range bounds offered when the sheet has no publication years.
pub const FALLBACK_YEAR_BOUNDS: (i64, i64) = (2000, 2025);

/// Multi-select filters, in the order they narrow the results.
pub const CATEGORY_FILTERS: [Column; 3] = [Column::School, Column::Department, Column::Degree];

// ---------------------------------------------------------------------------
// Search mode
// ---------------------------------------------------------------------------

/// Which text column the search box targets.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SearchMode {
    #[default]
    Title,
    Researcher,
    Advisor,
}

impl SearchMode {
    pub const ALL: [SearchMode; 3] = [SearchMode::Title, SearchMode::Researcher, SearchMode::Advisor];

    pub fn column(self) -> Column {
        match self {
            SearchMode::Title => Column::Title,
            SearchMode::Researcher => Column::Researcher,
            SearchMode::Advisor => Column::Advisor,
        }
    }
}

// ---------------------------------------------------------------------------
// Selections
// ---------------------------------------------------------------------------

/// Everything the user has chosen in the search and filter widgets.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Selections {
    pub mode: SearchMode,
    /// Keyword typed into the search box.
    pub query: String,
    /// Value picked from the drop-down of the search column.
    pub exact: Option<CellValue>,
    /// Per-column multi-select choices. Empty or absent means no filter.
    pub chosen: BTreeMap<Column, BTreeSet<CellValue>>,
    /// Inclusive publication-year range, when the user enabled it.
    pub year_range: Option<(i64, i64)>,
}

// ---------------------------------------------------------------------------
// Application state
// ---------------------------------------------------------------------------

/// The full UI state, independent of rendering.
pub struct AppState {
    cache: TableCache<Box<dyn TableFetcher>, Box<dyn Clock>>,

    /// Table currently shown (shared with the cache).
    pub table: Arc<Table>,

    /// Known columns present in `table`.
    pub caps: Capabilities,

    pub selections: Selections,

    /// Sorted values of the current search column, for the exact-pick list.
    pub search_values: Vec<CellValue>,

    /// Options per multi-select, drawn from the records still in play at
    /// that stage of the pipeline.
    pub options: BTreeMap<Column, BTreeSet<CellValue>>,

    /// Publication-year extent of the records reaching the year filter.
    pub year_bounds: (i64, i64),

    /// Indices of records passing the current filters.
    pub visible_indices: Vec<usize>,

    /// Chart data for the visible records.
    pub summary: Summary,

    /// Whether the overview charts are shown.
    pub show_overview: bool,

    /// Error from the refresh that produced `table`, if it failed.
    pub fetch_error: Option<String>,
}

impl AppState {
    pub fn new(fetcher: Box<dyn TableFetcher>, ttl: Duration) -> Self {
        AppState::with_clock(fetcher, Box::new(SystemClock), ttl)
    }

    pub fn with_clock(fetcher: Box<dyn TableFetcher>, clock: Box<dyn Clock>, ttl: Duration) -> Self {
        AppState {
            cache: TableCache::with_clock(fetcher, clock, ttl),
            table: Arc::new(Table::empty()),
            caps: Capabilities::default(),
            selections: Selections::default(),
            search_values: Vec::new(),
            options: BTreeMap::new(),
            year_bounds: FALLBACK_YEAR_BOUNDS,
            visible_indices: Vec::new(),
            summary: Summary::default(),
            show_overview: false,
            fetch_error: None,
        }
    }

    /// Read through the cache; adopt the table if the cache replaced it.
    /// Called once per interaction, and cheap while the entry is fresh.
    pub fn refresh(&mut self) {
        let read = self.cache.get();
        let table = read.table;
        let error = read.error.map(|e| e.to_string());

        if !Arc::ptr_eq(&table, &self.table) {
            self.fetch_error = error;
            self.set_table(table);
        }
    }

    /// Drop the cached table and fetch again.
    pub fn reload(&mut self) {
        self.cache.invalidate();
        self.refresh();
    }

    /// Switch the data source to a local CSV snapshot.
    pub fn open_snapshot(&mut self, path: PathBuf) {
        log::info!("Switching data source to {}", path.display());
        self.cache.set_fetcher(Box::new(CsvFileFetcher::new(path)));
        self.refresh();
    }

    pub fn source_description(&self) -> String {
        self.cache.fetcher().describe()
    }

    /// Ingest a newly loaded table: introspect its schema once, then refilter.
    pub fn set_table(&mut self, table: Arc<Table>) {
        self.caps = Capabilities::detect(&table);
        let missing = self.caps.missing();
        if !table.columns.is_empty() && !missing.is_empty() {
            log::warn!("Sheet lacks columns {missing:?}; related filters and charts are hidden");
        }
        self.table = table;
        self.rebuild_search_values();
        self.refilter();
    }

    pub fn set_search_mode(&mut self, mode: SearchMode) {
        if self.selections.mode == mode {
            return;
        }
        self.selections.mode = mode;
        self.selections.query.clear();
        self.selections.exact = None;
        self.rebuild_search_values();
        self.refilter();
    }

    pub fn set_query(&mut self, query: impl Into<String>) {
        self.selections.query = query.into();
        self.refilter();
    }

    pub fn set_exact(&mut self, value: Option<CellValue>) {
        self.selections.exact = value;
        self.refilter();
    }

    /// Toggle a single value in a column's multi-select.
    pub fn toggle_choice(&mut self, column: Column, value: &CellValue) {
        let chosen = self.selections.chosen.entry(column).or_default();
        if !chosen.remove(value) {
            chosen.insert(value.clone());
        }
        self.refilter();
    }

    /// Clear a column's multi-select (no filter on that column).
    pub fn clear_choices(&mut self, column: Column) {
        self.selections.chosen.remove(&column);
        self.refilter();
    }

    pub fn set_year_range(&mut self, range: Option<(i64, i64)>) {
        self.selections.year_range = range.map(|(lo, hi)| (lo.min(hi), lo.max(hi)));
        self.refilter();
    }

    /// Whether the search box has a column to search in.
    pub fn search_available(&self) -> bool {
        self.caps.has(self.selections.mode.column())
    }

    pub fn visible_records(&self) -> impl Iterator<Item = &Record> + '_ {
        self.visible_indices.iter().map(|&i| &self.table.records[i])
    }

    /// The search-box predicates: keyword and exact pick on the mode column.
    fn search_filters(&self) -> FilterSet {
        let column = self.selections.mode.column();
        if !self.caps.has(column) {
            return FilterSet::new();
        }
        let header = column.header();
        let mut set = FilterSet::new().contains(header, &self.selections.query);
        if let Some(value) = &self.selections.exact {
            set = set.one_of(header, &BTreeSet::from([value.clone()]));
        }
        set
    }

    fn category_filter(&self, column: Column) -> FilterSet {
        match self.selections.chosen.get(&column) {
            Some(chosen) if self.caps.has(column) => FilterSet::new().one_of(column.header(), chosen),
            _ => FilterSet::new(),
        }
    }

    fn year_filter(&self) -> FilterSet {
        match self.selections.year_range {
            Some((lo, hi)) if self.caps.has(Column::PubYear) => {
                FilterSet::new().in_range(Column::PubYear.header(), lo as f64, hi as f64)
            }
            _ => FilterSet::new(),
        }
    }

    /// Every active predicate, in pipeline order.
    pub fn filter_set(&self) -> FilterSet {
        CATEGORY_FILTERS
            .into_iter()
            .fold(self.search_filters(), |set, c| set.and(self.category_filter(c)))
            .and(self.year_filter())
    }

    /// Re-run the pipeline: search, then each multi-select, then the year
    /// range, each stage narrowing what the previous one left. The options of
    /// every widget are taken from the records reaching its stage.
    pub fn refilter(&mut self) {
        let table = Arc::clone(&self.table);

        let mut filtered = Filtered::all(&table).narrow(&self.search_filters());

        for column in CATEGORY_FILTERS {
            if self.caps.has(column) {
                self.options
                    .insert(column, distinct_values(filtered.records(), column.header()));
                filtered = filtered.narrow(&self.category_filter(column));
            } else {
                self.options.remove(&column);
            }
        }

        self.year_bounds = numeric_bounds(filtered.records(), Column::PubYear.header())
            .map(|(lo, hi)| (lo.floor() as i64, hi.ceil() as i64))
            .unwrap_or(FALLBACK_YEAR_BOUNDS);
        let filtered = filtered.narrow(&self.year_filter());

        let rows: Vec<&Record> = filtered.records().collect();
        self.summary = Summary::compute(rows.iter().copied(), &self.caps);
        self.visible_indices = filtered.into_indices();

        log::debug!(
            "{} of {} records match",
            self.visible_indices.len(),
            self.table.len()
        );
    }

    fn rebuild_search_values(&mut self) {
        let column = self.selections.mode.column();
        self.search_values = if self.caps.has(column) {
            distinct_values(&self.table.records, column.header())
                .into_iter()
                .collect()
        } else {
            Vec::new()
        };
    }
}
