//! Paginated collection state shared by every list-backed screen.
//!
//! # Design
//! `PagedList` is synchronous state: callers ask it for a `PageTicket`,
//! perform the request themselves and hand the result back with
//! `complete`. Every ticket carries the generation it was issued in;
//! `begin_refresh` bumps the generation, so a page that lands after a
//! newer refresh is dropped instead of appended. There is no transport
//! abort. Stale completions are ignored.
//!
//! `ListHandle` wraps a `PagedList` in a mutex and drives it from async
//! code. The lock is only held between awaits, never across one, so a
//! refresh can start while a load-more is still on the wire.

use std::future::Future;
use std::sync::Mutex;

use tokio::sync::watch;
use tracing::debug;

use crate::error::SlError;
use crate::session::{Credentials, Session};
use crate::types::Record;

use super::lock;

/// Where a list is in its fetch cycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Phase {
    Idle,
    /// First page in flight, nothing shown yet.
    Loading,
    Refreshing,
    LoadingMore,
    Loaded,
    /// Failed with nothing to show.
    Errored,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FetchMode {
    More,
    Refresh,
}

/// Permission to fetch one page, tagged with the generation it belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PageTicket {
    generation: u64,
    page: u32,
    mode: FetchMode,
}

impl PageTicket {
    pub fn generation(&self) -> u64 {
        self.generation
    }

    pub fn page(&self) -> u32 {
        self.page
    }

    pub fn mode(&self) -> FetchMode {
        self.mode
    }
}

/// What a list-backed screen renders.
#[derive(Debug, Clone, PartialEq)]
pub struct ListSnapshot<T> {
    pub items: Vec<T>,
    pub phase: Phase,
    pub has_more: bool,
    /// A single-item mutation is on the wire.
    pub is_updating: bool,
    pub error: Option<SlError>,
}

impl<T> ListSnapshot<T> {
    pub fn is_loading(&self) -> bool {
        matches!(self.phase, Phase::Loading | Phase::LoadingMore)
    }

    pub fn is_refreshing(&self) -> bool {
        self.phase == Phase::Refreshing
    }
}

#[derive(Debug)]
pub struct PagedList<T: Record> {
    items: Vec<T>,
    next_page: u32,
    has_more: bool,
    loaded: bool,
    generation: u64,
    in_flight: Option<PageTicket>,
    phase: Phase,
    pending_mutations: usize,
    error: Option<SlError>,
    /// `None` for lists the server returns in one response.
    page_size: Option<usize>,
    publisher: watch::Sender<ListSnapshot<T>>,
}

impl<T: Record> PagedList<T> {
    pub fn paginated(page_size: usize) -> Self {
        Self::new(Some(page_size))
    }

    pub fn single_page() -> Self {
        Self::new(None)
    }

    fn new(page_size: Option<usize>) -> Self {
        let (publisher, _) = watch::channel(ListSnapshot {
            items: Vec::new(),
            phase: Phase::Idle,
            has_more: true,
            is_updating: false,
            error: None,
        });
        Self {
            items: Vec::new(),
            next_page: 0,
            has_more: true,
            loaded: false,
            generation: 0,
            in_flight: None,
            phase: Phase::Idle,
            pending_mutations: 0,
            error: None,
            page_size,
            publisher,
        }
    }

    pub fn subscribe(&self) -> watch::Receiver<ListSnapshot<T>> {
        self.publisher.subscribe()
    }

    pub fn snapshot(&self) -> ListSnapshot<T> {
        ListSnapshot {
            items: self.items.clone(),
            phase: self.phase,
            has_more: self.has_more,
            is_updating: self.pending_mutations > 0,
            error: self.error.clone(),
        }
    }

    pub fn items(&self) -> &[T] {
        &self.items
    }

    pub fn phase(&self) -> Phase {
        self.phase
    }

    pub fn has_more(&self) -> bool {
        self.has_more
    }

    pub fn next_page(&self) -> u32 {
        self.next_page
    }

    pub fn generation(&self) -> u64 {
        self.generation
    }

    /// At least one fetch has succeeded since creation.
    pub fn is_loaded(&self) -> bool {
        self.loaded
    }

    pub fn error(&self) -> Option<&SlError> {
        self.error.as_ref()
    }

    pub fn is_fetching(&self) -> bool {
        self.in_flight.is_some()
    }

    /// Ticket for the next page, or `None` when a fetch is already in
    /// flight or the server has no more pages.
    pub fn begin_fetch_more(&mut self) -> Option<PageTicket> {
        if self.in_flight.is_some() || !self.has_more {
            return None;
        }
        let ticket = PageTicket {
            generation: self.generation,
            page: self.next_page,
            mode: FetchMode::More,
        };
        self.in_flight = Some(ticket);
        self.phase = if self.loaded {
            Phase::LoadingMore
        } else {
            Phase::Loading
        };
        self.publish();
        Some(ticket)
    }

    /// Whether rendering the record keyed `current` should pull the next
    /// page. `None` means the screen just appeared.
    pub fn needs_more(&self, current: Option<&T::Key>, prefetch_distance: usize) -> bool {
        if self.in_flight.is_some() || !self.has_more {
            return false;
        }
        match current {
            None => !self.loaded,
            Some(key) => self
                .items
                .iter()
                .position(|item| &item.key() == key)
                .is_some_and(|index| index + prefetch_distance >= self.items.len()),
        }
    }

    /// Start over from page 0. Supersedes whatever is in flight.
    pub fn begin_refresh(&mut self) -> PageTicket {
        self.generation += 1;
        let ticket = PageTicket {
            generation: self.generation,
            page: 0,
            mode: FetchMode::Refresh,
        };
        self.in_flight = Some(ticket);
        self.phase = if self.loaded {
            Phase::Refreshing
        } else {
            Phase::Loading
        };
        self.publish();
        ticket
    }

    /// Apply a finished fetch. Returns `false` when the ticket is stale and
    /// the result was discarded.
    pub fn complete(&mut self, ticket: PageTicket, result: Result<Vec<T>, SlError>) -> bool {
        if ticket.generation != self.generation || self.in_flight != Some(ticket) {
            debug!(
                ticket_generation = ticket.generation,
                current_generation = self.generation,
                page = ticket.page,
                "discarding stale page"
            );
            return false;
        }
        self.in_flight = None;

        match result {
            Ok(page) => {
                self.has_more = match self.page_size {
                    Some(size) => page.len() >= size,
                    None => false,
                };
                match ticket.mode {
                    FetchMode::Refresh => self.items = page,
                    FetchMode::More if !T::DEDUPLICATE => self.items.extend(page),
                    FetchMode::More => {
                        for item in page {
                            let key = item.key();
                            if !self.items.iter().any(|existing| existing.key() == key) {
                                self.items.push(item);
                            }
                        }
                    }
                }
                self.next_page = ticket.page + 1;
                self.loaded = true;
                self.phase = Phase::Loaded;
            }
            Err(err) => {
                self.phase = if self.loaded {
                    Phase::Loaded
                } else {
                    Phase::Errored
                };
                self.error = Some(err);
            }
        }
        self.publish();
        true
    }

    pub fn begin_mutation(&mut self) {
        self.pending_mutations += 1;
        self.publish();
    }

    /// Finish a mutation started with `begin_mutation`. On success `apply`
    /// edits the collection; on failure the collection stays as it was and
    /// the error is published.
    pub fn finish_mutation<V>(
        &mut self,
        result: Result<V, SlError>,
        apply: impl FnOnce(&mut Vec<T>, V),
    ) {
        self.pending_mutations = self.pending_mutations.saturating_sub(1);
        match result {
            Ok(value) => apply(&mut self.items, value),
            Err(err) => self.error = Some(err),
        }
        self.publish();
    }

    pub fn set_error(&mut self, err: SlError) {
        self.error = Some(err);
        self.publish();
    }

    /// Acknowledge the published error.
    pub fn clear_error(&mut self) {
        if self.error.take().is_some() {
            self.publish();
        }
    }

    fn publish(&self) {
        self.publisher.send_replace(self.snapshot());
    }
}

/// Replace the record keyed `key` in place with `f` applied.
pub fn update_where<T: Record>(items: &mut [T], key: &T::Key, f: impl FnOnce(&mut T)) {
    if let Some(item) = items.iter_mut().find(|item| &item.key() == key) {
        f(item);
    }
}

pub fn remove_where<T: Record>(items: &mut Vec<T>, key: &T::Key) {
    items.retain(|item| &item.key() != key);
}

/// Async driver around a `PagedList`.
#[derive(Debug)]
pub struct ListHandle<T: Record> {
    list: Mutex<PagedList<T>>,
    prefetch_distance: usize,
}

impl<T: Record> ListHandle<T> {
    pub fn new(list: PagedList<T>, prefetch_distance: usize) -> Self {
        Self {
            list: Mutex::new(list),
            prefetch_distance,
        }
    }

    pub fn subscribe(&self) -> watch::Receiver<ListSnapshot<T>> {
        lock(&self.list).subscribe()
    }

    pub fn snapshot(&self) -> ListSnapshot<T> {
        lock(&self.list).snapshot()
    }

    pub fn is_loaded(&self) -> bool {
        lock(&self.list).is_loaded()
    }

    pub fn clear_error(&self) {
        lock(&self.list).clear_error();
    }

    pub fn set_error(&self, err: SlError) {
        lock(&self.list).set_error(err);
    }

    pub async fn fetch_more<F, Fut>(&self, session: &Session, fetch: F)
    where
        F: FnOnce(Credentials, u32) -> Fut,
        Fut: Future<Output = Result<Vec<T>, SlError>>,
    {
        let ticket = lock(&self.list).begin_fetch_more();
        if let Some(ticket) = ticket {
            self.run(ticket, session, fetch).await;
        }
    }

    pub async fn fetch_more_if_needed<F, Fut>(
        &self,
        current: Option<&T::Key>,
        session: &Session,
        fetch: F,
    ) where
        F: FnOnce(Credentials, u32) -> Fut,
        Fut: Future<Output = Result<Vec<T>, SlError>>,
    {
        let ticket = {
            let mut list = lock(&self.list);
            if list.needs_more(current, self.prefetch_distance) {
                list.begin_fetch_more()
            } else {
                None
            }
        };
        if let Some(ticket) = ticket {
            self.run(ticket, session, fetch).await;
        }
    }

    pub async fn refresh<F, Fut>(&self, session: &Session, fetch: F)
    where
        F: FnOnce(Credentials, u32) -> Fut,
        Fut: Future<Output = Result<Vec<T>, SlError>>,
    {
        let ticket = lock(&self.list).begin_refresh();
        self.run(ticket, session, fetch).await;
    }

    /// Load page 0 unless the list is already loaded or a fetch is in
    /// flight.
    pub async fn load<F, Fut>(&self, session: &Session, fetch: F)
    where
        F: FnOnce(Credentials, u32) -> Fut,
        Fut: Future<Output = Result<Vec<T>, SlError>>,
    {
        let ticket = {
            let mut list = lock(&self.list);
            if list.is_loaded() || list.is_fetching() {
                None
            } else {
                Some(list.begin_refresh())
            }
        };
        if let Some(ticket) = ticket {
            self.run(ticket, session, fetch).await;
        }
    }

    async fn run<F, Fut>(&self, ticket: PageTicket, session: &Session, fetch: F)
    where
        F: FnOnce(Credentials, u32) -> Fut,
        Fut: Future<Output = Result<Vec<T>, SlError>>,
    {
        let result = match session.credentials() {
            Some(credentials) => fetch(credentials, ticket.page()).await,
            None => Err(SlError::InvalidApiKey),
        };
        lock(&self.list).complete(ticket, result);
    }

    /// Run a single-item mutation and apply it only once the server
    /// confirms.
    pub async fn mutate<V, F, Fut>(
        &self,
        session: &Session,
        call: F,
        apply: impl FnOnce(&mut Vec<T>, V),
    ) -> bool
    where
        F: FnOnce(Credentials) -> Fut,
        Fut: Future<Output = Result<V, SlError>>,
    {
        let Some(credentials) = session.credentials() else {
            self.set_error(SlError::InvalidApiKey);
            return false;
        };
        lock(&self.list).begin_mutation();
        let result = call(credentials).await;
        let succeeded = result.is_ok();
        lock(&self.list).finish_mutation(result, apply);
        succeeded
    }
}
