use std::sync::Arc;
use std::time::{Duration, Instant};

use super::fetcher::{FetchError, TableFetcher};
use super::model::Table;
use super::normalize::normalize;

/// How long a fetched table stays fresh unless configured otherwise.
pub const DEFAULT_TTL: Duration = Duration::from_secs(600);

/// Source of "now" for expiry checks.
pub trait Clock {
    fn now(&self) -> Instant;
}

impl<T: Clock + ?Sized> Clock for Box<T> {
    fn now(&self) -> Instant {
        (**self).now()
    }
}

#[derive(Debug, Clone, Copy, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> Instant {
        Instant::now()
    }
}

struct Entry {
    table: Arc<Table>,
    fetched_at: Instant,
    error: Option<FetchError>,
}

/// What a [`TableCache::get`] hands back: the current table and, when the
/// refresh that produced it failed, the reason. A failed refresh yields an
/// empty table.
#[derive(Debug)]
pub struct CacheRead<'a> {
    pub table: Arc<Table>,
    pub error: Option<&'a FetchError>,
}

/// Holds the single normalized table for `ttl`, then refetches lazily on the
/// next read. Failed fetches are cached too (as an empty table), so a broken
/// source is not hammered within one ttl window.
pub struct TableCache<F, C = SystemClock> {
    fetcher: F,
    clock: C,
    ttl: Duration,
    entry: Option<Entry>,
}

impl<F: TableFetcher> TableCache<F, SystemClock> {
    pub fn new(fetcher: F, ttl: Duration) -> Self {
        TableCache::with_clock(fetcher, SystemClock, ttl)
    }
}

impl<F: TableFetcher, C: Clock> TableCache<F, C> {
    pub fn with_clock(fetcher: F, clock: C, ttl: Duration) -> Self {
        TableCache {
            fetcher,
            clock,
            ttl,
            entry: None,
        }
    }

    /// Current table, refetching first when the entry is missing or stale.
    pub fn get(&mut self) -> CacheRead<'_> {
        let now = self.clock.now();
        let fresh = self
            .entry
            .as_ref()
            .is_some_and(|e| now.saturating_duration_since(e.fetched_at) < self.ttl);

        if !fresh {
            self.entry = Some(self.refresh(now));
        }

        match &self.entry {
            Some(e) => CacheRead {
                table: Arc::clone(&e.table),
                error: e.error.as_ref(),
            },
            None => CacheRead {
                table: Arc::new(Table::empty()),
                error: None,
            },
        }
    }

    /// Drop the cached entry; the next [`get`](Self::get) refetches.
    pub fn invalidate(&mut self) {
        if self.entry.take().is_some() {
            log::debug!("Cache invalidated");
        }
    }

    /// Swap the data source. The cached entry belongs to the old source and is dropped.
    pub fn set_fetcher(&mut self, fetcher: F) {
        self.fetcher = fetcher;
        self.invalidate();
    }

    pub fn fetcher(&self) -> &F {
        &self.fetcher
    }

    pub fn ttl(&self) -> Duration {
        self.ttl
    }

    fn refresh(&self, now: Instant) -> Entry {
        log::debug!("Cache miss; fetching from {}", self.fetcher.describe());
        match self.fetcher.fetch() {
            Ok(raw) => {
                let table = normalize(raw);
                log::info!(
                    "Loaded {} records with columns {:?}",
                    table.len(),
                    table.columns
                );
                Entry {
                    table: Arc::new(table),
                    fetched_at: now,
                    error: None,
                }
            }
            Err(e) => {
                log::error!("Failed to fetch {}: {e}", self.fetcher.describe());
                Entry {
                    table: Arc::new(Table::empty()),
                    fetched_at: now,
                    error: Some(e),
                }
            }
        }
    }
}

#[cfg(test)]
pub(crate) mod testing {
    use std::cell::{Cell, RefCell};
    use std::rc::Rc;
    use std::time::{Duration, Instant};

    use super::Clock;
    use crate::data::fetcher::{FetchError, TableFetcher};
    use crate::data::model::Table;

    /// Manually advanced clock.
    #[derive(Clone)]
    pub struct FakeClock {
        now: Rc<Cell<Instant>>,
    }

    impl FakeClock {
        pub fn new() -> Self {
            FakeClock {
                now: Rc::new(Cell::new(Instant::now())),
            }
        }

        pub fn advance(&self, by: Duration) {
            self.now.set(self.now.get() + by);
        }
    }

    impl Clock for FakeClock {
        fn now(&self) -> Instant {
            self.now.get()
        }
    }

    /// Serves a scripted sequence of results and counts calls. Once the
    /// script runs out the last table is served again.
    #[derive(Clone)]
    pub struct FakeFetcher {
        script: Rc<RefCell<Vec<Result<Table, String>>>>,
        last: Rc<RefCell<Table>>,
        calls: Rc<Cell<usize>>,
    }

    impl FakeFetcher {
        pub fn serving(table: Table) -> Self {
            FakeFetcher::scripted(vec![Ok(table)])
        }

        pub fn scripted(mut script: Vec<Result<Table, String>>) -> Self {
            script.reverse();
            FakeFetcher {
                script: Rc::new(RefCell::new(script)),
                last: Rc::new(RefCell::new(Table::empty())),
                calls: Rc::new(Cell::new(0)),
            }
        }

        pub fn calls(&self) -> usize {
            self.calls.get()
        }
    }

    impl TableFetcher for FakeFetcher {
        fn describe(&self) -> String {
            "fake".to_string()
        }

        fn fetch(&self) -> Result<Table, FetchError> {
            self.calls.set(self.calls.get() + 1);
            match self.script.borrow_mut().pop() {
                Some(Ok(table)) => {
                    *self.last.borrow_mut() = table.clone();
                    Ok(table)
                }
                Some(Err(msg)) => Err(FetchError::NotFound(msg)),
                None => Ok(self.last.borrow().clone()),
            }
        }
    }
}
