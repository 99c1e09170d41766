//! The debounced search-and-paginate list controller.
//!
//! # Design
//! `ListController` is a synchronous state machine owned by one screen. User
//! actions go in as explicit calls (`on_search`, `on_filter_change`,
//! `on_page_change`, `on_reset`, `on_refresh`) and, when they warrant a
//! request, come back out as a `FetchTicket`. The host performs the round
//! trip and reports the result with `on_response` or `on_failure`, quoting
//! the ticket's epoch.
//!
//! Every ticket gets a fresh, strictly increasing `RequestEpoch`. Only a
//! completion carrying the latest issued epoch is applied; anything older is
//! reported as `Outcome::Stale` and leaves state untouched, whatever order
//! the completions arrive in. After `unmount` every completion is reported
//! as `Outcome::Unmounted` and no further tickets are issued.
//!
//! Search input never fetches directly. It arms the debouncer, and the host
//! calls `poll` once `debounce_deadline` has passed.

use std::sync::Arc;

use tokio::time::Instant;
use tracing::{debug, info, trace, warn};

use crate::client::{Resource, ResourceClient};
use crate::config::ControllerConfig;
use crate::debounce::Debouncer;
use crate::error::{ApiError, Feedback};
use crate::http::{HttpRequest, HttpResponse};
use crate::pagination::PaginationState;
use crate::permissions::{Action, PermissionSnapshot};
use crate::query::{FilterState, FilterValue, Query, QueryBuilder};
use crate::records::RecordCollection;
use crate::types::PaginationMeta;

/// Identifies one issued list request. Later requests compare greater.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct RequestEpoch(u64);

impl RequestEpoch {
    pub fn get(self) -> u64 {
        self.0
    }
}

/// A list request the host must execute and report back on.
#[derive(Debug, Clone)]
pub struct FetchTicket {
    pub epoch: RequestEpoch,
    pub query: Query,
    pub request: HttpRequest,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Phase {
    Idle,
    Loading,
}

/// What a completion did to the screen.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Outcome {
    /// Latest response applied. `added` counts records new to the collection.
    Applied { received: usize, added: usize },
    /// Latest request failed; displayed data kept. Show the feedback.
    Failed(Feedback),
    /// A newer request was issued after this one.
    Stale,
    /// The screen is gone.
    Unmounted,
}

pub struct ListController<R: Resource> {
    client: ResourceClient<R>,
    config: ControllerConfig,
    permissions: Arc<PermissionSnapshot>,
    initial_filters: FilterState,
    filters: FilterState,
    search_term: String,
    debounced_term: String,
    debouncer: Debouncer<String>,
    records: RecordCollection<R::Record>,
    pagination: PaginationState,
    next_epoch: u64,
    latest: Option<RequestEpoch>,
    loading: bool,
    mounted: bool,
}

impl<R: Resource> ListController<R> {
    pub fn new(
        client: ResourceClient<R>,
        initial_filters: FilterState,
        config: ControllerConfig,
        permissions: Arc<PermissionSnapshot>,
    ) -> Self {
        let initial_term = initial_term(&initial_filters, &config.search_key);
        Self {
            client,
            debouncer: Debouncer::new(config.quiet_period),
            pagination: PaginationState::new(config.per_page, config.paginate),
            filters: initial_filters.clone(),
            initial_filters,
            search_term: initial_term.clone(),
            debounced_term: initial_term,
            records: RecordCollection::new(),
            config,
            permissions,
            next_epoch: 0,
            latest: None,
            loading: false,
            mounted: true,
        }
    }

    /// Initial load with the screen's starting filters. `None` once unmounted.
    pub fn mount(&mut self) -> Option<FetchTicket> {
        self.issue()
    }

    /// Record a keystroke. The fetch waits for the quiet period.
    pub fn on_search(&mut self, term: &str, now: Instant) {
        if !self.mounted {
            return;
        }
        self.search_term = term.to_string();
        self.debouncer.input(term.to_string(), now);
    }

    pub fn debounce_deadline(&self) -> Option<Instant> {
        if self.mounted {
            self.debouncer.deadline()
        } else {
            None
        }
    }

    /// Apply a settled search term, if any, and fetch with it.
    pub fn poll(&mut self, now: Instant) -> Option<FetchTicket> {
        if !self.mounted {
            return None;
        }
        let term = self.debouncer.poll(now)?;
        if term == self.debounced_term {
            return None;
        }
        self.filters.set(&self.config.search_key, term.as_str());
        self.debounced_term = term;
        self.pagination.rewind();
        self.issue()
    }

    pub fn on_filter_change(&mut self, name: &str, value: impl Into<FilterValue>) -> Option<FetchTicket> {
        if !self.mounted {
            return None;
        }
        let value = value.into();
        if name == self.config.search_key {
            let term = value.as_text().unwrap_or_default().to_string();
            self.debouncer.cancel();
            self.search_term = term.clone();
            self.debounced_term = term;
        }
        self.filters.set(name, value);
        self.pagination.rewind();
        self.issue()
    }

    /// Back to the initial filters and an empty first page.
    pub fn on_reset(&mut self) -> Option<FetchTicket> {
        if !self.mounted {
            return None;
        }
        info!(resource = R::PATH, "resetting list filters");
        let term = initial_term(&self.initial_filters, &self.config.search_key);
        self.filters = self.initial_filters.clone();
        self.search_term = term.clone();
        self.debounced_term = term;
        self.debouncer.cancel();
        self.records.clear();
        self.pagination.reset(self.config.per_page, self.config.paginate);
        self.issue()
    }

    pub fn on_page_change(&mut self, page: u32, per_page: u32) -> Option<FetchTicket> {
        if !self.mounted {
            return None;
        }
        self.pagination.change_page(page, per_page);
        self.issue()
    }

    /// Repeat the current query, e.g. after a failed load or a saved form.
    pub fn on_refresh(&mut self) -> Option<FetchTicket> {
        self.issue()
    }

    pub fn on_response(&mut self, epoch: RequestEpoch, response: HttpResponse) -> Outcome {
        if let Some(outcome) = self.gate(epoch) {
            return outcome;
        }
        match self.client.parse_list(response) {
            Ok(page) => {
                self.loading = false;
                let received = page.data.len();
                let added = self.records.apply(self.config.merge_mode, page.data);
                self.pagination.apply(page.meta);
                debug!(resource = R::PATH, epoch = epoch.0, received, added, "list fetch applied");
                Outcome::Applied { received, added }
            }
            Err(error) => self.fail(epoch, error),
        }
    }

    pub fn on_failure(&mut self, epoch: RequestEpoch, error: ApiError) -> Outcome {
        if let Some(outcome) = self.gate(epoch) {
            return outcome;
        }
        self.fail(epoch, error)
    }

    /// Suppress every later completion and event.
    pub fn unmount(&mut self) {
        self.mounted = false;
        self.loading = false;
        self.debouncer.cancel();
    }

    pub fn filters(&self) -> &FilterState {
        &self.filters
    }

    pub fn search_term(&self) -> &str {
        &self.search_term
    }

    pub fn debounced_term(&self) -> &str {
        &self.debounced_term
    }

    pub fn records(&self) -> &[R::Record] {
        self.records.as_slice()
    }

    pub fn meta(&self) -> PaginationMeta {
        self.pagination.meta()
    }

    pub fn is_loading(&self) -> bool {
        self.loading
    }

    pub fn phase(&self) -> Phase {
        if self.loading {
            Phase::Loading
        } else {
            Phase::Idle
        }
    }

    pub fn latest_epoch(&self) -> Option<RequestEpoch> {
        self.latest
    }

    /// Whether the UI should offer `action` on this resource.
    pub fn can(&self, action: Action) -> bool {
        self.permissions.allows(R::PATH, action)
    }

    fn issue(&mut self) -> Option<FetchTicket> {
        if !self.mounted {
            return None;
        }
        self.next_epoch += 1;
        let epoch = RequestEpoch(self.next_epoch);
        self.latest = Some(epoch);
        self.loading = true;

        let query = QueryBuilder::build(&self.filters, self.pagination.request());
        let request = self.client.build_list(&query);
        debug!(resource = R::PATH, epoch = epoch.0, query = %query.encode(), "issuing list fetch");
        Some(FetchTicket {
            epoch,
            query,
            request,
        })
    }

    /// `Some` when the completion must not touch state.
    fn gate(&self, epoch: RequestEpoch) -> Option<Outcome> {
        if !self.mounted {
            trace!(resource = R::PATH, epoch = epoch.0, "dropping completion after unmount");
            return Some(Outcome::Unmounted);
        }
        if self.latest != Some(epoch) {
            trace!(resource = R::PATH, epoch = epoch.0, "dropping stale completion");
            return Some(Outcome::Stale);
        }
        None
    }

    fn fail(&mut self, epoch: RequestEpoch, error: ApiError) -> Outcome {
        self.loading = false;
        self.pagination.revert();
        warn!(resource = R::PATH, epoch = epoch.0, error = %error, "list fetch failed");
        Outcome::Failed(error.feedback())
    }
}

fn initial_term(filters: &FilterState, search_key: &str) -> String {
    filters
        .get(search_key)
        .and_then(FilterValue::as_text)
        .unwrap_or_default()
        .to_string()
}
