//! Cursor pagination over a fetch-by-cursor data source.

use std::future::Future;

use crate::error::{Error, Result};
use crate::models::{Cursor, Page};

/// Fetch-by-cursor provider of ordered pages.
///
/// `None` requests the first page. Calling twice with the same cursor must
/// return the same page. Transport errors are returned as-is.
pub trait PageSource<T> {
    fn fetch_page(&self, cursor: Option<&Cursor>) -> impl Future<Output = Result<Page<T>>> + Send;
}

/// How fetched pages are laid out in [`CursorPagination::items`]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Arrangement {
    /// Pages appended in delivery order (newest first)
    AsDelivered,
    /// Each page reversed and prepended, giving chronological order
    Chronological,
}

/// Permission to run one fetch, tied to the pagination generation that issued it
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FetchTicket {
    cursor: Option<Cursor>,
    generation: u64,
}

impl FetchTicket {
    pub const fn cursor(&self) -> Option<&Cursor> {
        self.cursor.as_ref()
    }

    pub const fn generation(&self) -> u64 {
        self.generation
    }
}

/// Consumer-side pagination state.
///
/// Only one fetch may be in flight. Results issued under an older generation
/// are rejected with [`Error::StaleResult`].
#[derive(Debug, Clone)]
pub struct CursorPagination<T> {
    arrangement: Arrangement,
    items: Vec<T>,
    next: Option<Cursor>,
    generation: u64,
    pages_loaded: usize,
    in_flight: bool,
    exhausted: bool,
}

impl<T> CursorPagination<T> {
    pub const fn new(arrangement: Arrangement) -> Self {
        Self {
            arrangement,
            items: Vec::new(),
            next: None,
            generation: 0,
            pages_loaded: 0,
            in_flight: false,
            exhausted: false,
        }
    }

    /// Start a fetch unless one is in flight or the source is exhausted
    pub fn begin_fetch(&mut self) -> Option<FetchTicket> {
        if self.in_flight || self.exhausted {
            return None;
        }
        self.in_flight = true;
        Some(FetchTicket {
            cursor: self.next.clone(),
            generation: self.generation,
        })
    }

    /// Apply the outcome of a fetch started with `ticket`.
    ///
    /// Returns the number of items added. On error the cursor is kept so the
    /// same page is requested next time.
    pub fn complete(&mut self, ticket: &FetchTicket, result: Result<Page<T>>) -> Result<usize> {
        if ticket.generation != self.generation {
            return Err(Error::StaleResult);
        }
        self.in_flight = false;

        let page = result?;
        let added = page.items.len();
        match self.arrangement {
            Arrangement::AsDelivered => self.items.extend(page.items),
            Arrangement::Chronological => {
                self.items.splice(0..0, page.items.into_iter().rev());
            }
        }
        self.exhausted = page.next.is_none();
        self.next = page.next;
        self.pages_loaded += 1;
        tracing::debug!(
            added,
            total = self.items.len(),
            exhausted = self.exhausted,
            "Applied fetched page"
        );
        Ok(added)
    }

    /// Fetch and apply the next page from `source`
    pub async fn fetch_next<S>(&mut self, source: &S) -> Result<usize>
    where
        S: PageSource<T>,
    {
        let Some(ticket) = self.begin_fetch() else {
            return Ok(0);
        };
        let result = source.fetch_page(ticket.cursor()).await;
        self.complete(&ticket, result)
    }

    /// Drop everything and invalidate fetches in flight
    pub fn reset(&mut self) {
        self.generation += 1;
        self.items.clear();
        self.next = None;
        self.pages_loaded = 0;
        self.in_flight = false;
        self.exhausted = false;
    }

    pub fn items(&self) -> &[T] {
        &self.items
    }

    pub fn items_mut(&mut self) -> &mut Vec<T> {
        &mut self.items
    }

    /// True until a page without a next cursor has been applied
    pub const fn has_next(&self) -> bool {
        !self.exhausted
    }

    pub const fn is_in_flight(&self) -> bool {
        self.in_flight
    }

    /// Whether at least one page has been applied since the last reset
    pub const fn is_first_fetch_done(&self) -> bool {
        self.pages_loaded > 0
    }

    pub const fn generation(&self) -> u64 {
        self.generation
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use std::sync::atomic::{AtomicUsize, Ordering};

    /// Serves `pages` in order, keyed by cursor `"p{index}"`
    struct VecSource {
        pages: Vec<Vec<u32>>,
        calls: AtomicUsize,
        fail_on: Option<usize>,
    }

    impl VecSource {
        fn new(pages: Vec<Vec<u32>>) -> Self {
            Self {
                pages,
                calls: AtomicUsize::new(0),
                fail_on: None,
            }
        }
    }

    impl PageSource<u32> for VecSource {
        async fn fetch_page(&self, cursor: Option<&Cursor>) -> Result<Page<u32>> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            let index = cursor
                .map(|cursor| cursor.as_str()[1..].parse::<usize>().unwrap())
                .unwrap_or(0);
            if self.fail_on == Some(index) {
                return Err(Error::Api("HTTP 503".to_string()));
            }
            let next = (index + 1 < self.pages.len()).then(|| Cursor::new(format!("p{}", index + 1)));
            Ok(Page::new(self.pages[index].clone(), next))
        }
    }

    #[tokio::test]
    async fn fetches_until_exhausted() {
        let source = VecSource::new(vec![vec![6, 5, 4], vec![3, 2], vec![1]]);
        let mut pagination = CursorPagination::new(Arrangement::Chronological);

        assert_eq!(pagination.fetch_next(&source).await.unwrap(), 3);
        assert_eq!(pagination.items(), &[4, 5, 6]);
        assert_eq!(pagination.fetch_next(&source).await.unwrap(), 2);
        assert_eq!(pagination.fetch_next(&source).await.unwrap(), 1);
        assert_eq!(pagination.items(), &[1, 2, 3, 4, 5, 6]);
        assert!(!pagination.has_next());

        assert_eq!(pagination.fetch_next(&source).await.unwrap(), 0);
        assert_eq!(source.calls.load(Ordering::SeqCst), 3);
    }

    #[tokio::test]
    async fn as_delivered_appends_pages() {
        let source = VecSource::new(vec![vec![9, 8], vec![7]]);
        let mut pagination = CursorPagination::new(Arrangement::AsDelivered);
        pagination.fetch_next(&source).await.unwrap();
        pagination.fetch_next(&source).await.unwrap();
        assert_eq!(pagination.items(), &[9, 8, 7]);
    }

    #[test]
    fn refuses_concurrent_fetches() {
        let mut pagination = CursorPagination::<u32>::new(Arrangement::AsDelivered);
        let ticket = pagination.begin_fetch().unwrap();
        assert!(pagination.is_in_flight());
        assert!(pagination.begin_fetch().is_none());

        pagination
            .complete(&ticket, Ok(Page::new(vec![1], Some(Cursor::new("p1")))))
            .unwrap();
        assert!(pagination.begin_fetch().is_some());
    }

    #[test]
    fn reset_makes_in_flight_results_stale() {
        let mut pagination = CursorPagination::<u32>::new(Arrangement::AsDelivered);
        let ticket = pagination.begin_fetch().unwrap();
        pagination.reset();

        let error = pagination
            .complete(&ticket, Ok(Page::last(vec![1, 2])))
            .unwrap_err();
        assert!(error.is_stale());
        assert!(pagination.items().is_empty());
        assert!(pagination.has_next());
    }

    #[tokio::test]
    async fn failed_fetch_retries_same_cursor() {
        let mut source = VecSource::new(vec![vec![3], vec![2], vec![1]]);
        source.fail_on = Some(1);
        let mut pagination = CursorPagination::new(Arrangement::AsDelivered);

        pagination.fetch_next(&source).await.unwrap();
        assert!(pagination.fetch_next(&source).await.unwrap_err().is_transport());
        assert!(!pagination.is_in_flight());

        let ticket = pagination.begin_fetch().unwrap();
        assert_eq!(ticket.cursor(), Some(&Cursor::new("p1")));
    }
}
