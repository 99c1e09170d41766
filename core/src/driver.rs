//! Async host for a `ListController`.
//!
//! # Design
//! `spawn_screen` moves the controller into one tokio task that plays the
//! role of the UI event loop. The task waits on three sources at once: user
//! events from the `ScreenHandle`, the debounce deadline, and completions of
//! fetches running in a `JoinSet`. All controller calls happen on that one
//! task, so the controller itself needs no locking. After every transition a
//! `ScreenState` snapshot is published on a watch channel.
//!
//! Closing the handle ends the loop. The controller is unmounted and the
//! `JoinSet` is dropped, which aborts whatever is still in flight, so nothing
//! is published for a screen that is gone.
//!
//! Failure notices queue on a channel holding at most `NOTICE_CAPACITY`
//! entries. A host that never drains it loses the newest notices, not memory.

use std::collections::HashMap;
use std::sync::Arc;

use async_trait::async_trait;
use tokio::sync::{mpsc, watch};
use tokio::task::{self, JoinHandle, JoinSet};
use tokio::time::{sleep_until, Instant};
use tracing::{debug, warn};

use crate::client::{KeyOf, Resource};
use crate::controller::{FetchTicket, ListController, Outcome, RequestEpoch};
use crate::error::{ApiError, Feedback};
use crate::http::{HttpRequest, HttpResponse};
use crate::query::{FilterState, FilterValue};
use crate::types::PaginationMeta;

/// Undrained failure notices kept per screen.
pub const NOTICE_CAPACITY: usize = 16;

/// Executes one HTTP round trip for the driver.
///
/// Non-2xx statuses are data, not errors: return them as an `HttpResponse`
/// and reserve `Err` for requests that never completed.
#[async_trait]
pub trait Transport: Send + Sync + 'static {
    async fn execute(&self, request: HttpRequest) -> Result<HttpResponse, ApiError>;
}

/// A user action on the screen.
#[derive(Debug, Clone)]
pub enum Event {
    Search(String),
    Filter { name: String, value: FilterValue },
    Reset,
    Page { page: u32, per_page: u32 },
    Refresh,
}

/// Everything the rendering layer needs after a transition.
#[derive(Debug, Clone)]
pub struct ScreenState<T> {
    pub records: Vec<T>,
    pub meta: PaginationMeta,
    pub loading: bool,
    pub filters: FilterState,
    pub search_term: String,
    pub debounced_term: String,
}

impl<T: Clone> ScreenState<T> {
    fn capture<R: Resource<Record = T>>(controller: &ListController<R>) -> Self {
        Self {
            records: controller.records().to_vec(),
            meta: controller.meta(),
            loading: controller.is_loading(),
            filters: controller.filters().clone(),
            search_term: controller.search_term().to_string(),
            debounced_term: controller.debounced_term().to_string(),
        }
    }
}

pub struct ScreenHandle<T> {
    events: mpsc::UnboundedSender<Event>,
    state: watch::Receiver<ScreenState<T>>,
    notices: mpsc::Receiver<Feedback>,
    task: JoinHandle<()>,
}

impl<T: Clone> ScreenHandle<T> {
    pub fn search(&self, term: &str) {
        self.send(Event::Search(term.to_string()));
    }

    pub fn filter(&self, name: &str, value: impl Into<FilterValue>) {
        self.send(Event::Filter {
            name: name.to_string(),
            value: value.into(),
        });
    }

    pub fn reset(&self) {
        self.send(Event::Reset);
    }

    pub fn change_page(&self, page: u32, per_page: u32) {
        self.send(Event::Page { page, per_page });
    }

    pub fn refresh(&self) {
        self.send(Event::Refresh);
    }

    /// Latest published snapshot.
    pub fn state(&self) -> ScreenState<T> {
        self.state.borrow().clone()
    }

    /// A receiver for rendering layers that want to await changes.
    pub fn subscribe(&self) -> watch::Receiver<ScreenState<T>> {
        self.state.clone()
    }

    /// Next failure to show as a notification, if any is queued.
    pub fn try_notice(&mut self) -> Option<Feedback> {
        self.notices.try_recv().ok()
    }

    pub async fn next_notice(&mut self) -> Option<Feedback> {
        self.notices.recv().await
    }

    /// Tear the screen down and wait for its loop to finish.
    pub async fn unmount(self) {
        let Self { events, task, .. } = self;
        drop(events);
        if let Err(e) = task.await {
            warn!(error = %e, "screen loop ended abnormally");
        }
    }

    fn send(&self, event: Event) {
        if self.events.send(event).is_err() {
            debug!("event sent to an unmounted screen");
        }
    }
}

/// Mount `controller` on a new task and issue its initial fetch.
pub fn spawn_screen<R, T>(controller: ListController<R>, transport: Arc<T>) -> ScreenHandle<R::Record>
where
    R: Resource + 'static,
    R::Record: Clone + Send + Sync + 'static,
    KeyOf<R>: Send + Sync + 'static,
    T: Transport,
{
    let (events_tx, events_rx) = mpsc::unbounded_channel();
    let (notice_tx, notice_rx) = mpsc::channel(NOTICE_CAPACITY);
    let (state_tx, state_rx) = watch::channel(ScreenState::capture(&controller));

    let task = tokio::spawn(run(controller, transport, events_rx, state_tx, notice_tx));

    ScreenHandle {
        events: events_tx,
        state: state_rx,
        notices: notice_rx,
        task,
    }
}

type Completion = (RequestEpoch, Result<HttpResponse, ApiError>);

struct InFlight<T> {
    transport: Arc<T>,
    tasks: JoinSet<Completion>,
    epochs: HashMap<task::Id, RequestEpoch>,
}

impl<T: Transport> InFlight<T> {
    fn spawn(&mut self, ticket: Option<FetchTicket>) {
        let Some(ticket) = ticket else {
            return;
        };
        let transport = Arc::clone(&self.transport);
        let epoch = ticket.epoch;
        let handle = self.tasks.spawn(async move {
            let result = transport.execute(ticket.request).await;
            (epoch, result)
        });
        self.epochs.insert(handle.id(), epoch);
    }
}

async fn run<R, T>(
    mut controller: ListController<R>,
    transport: Arc<T>,
    mut events: mpsc::UnboundedReceiver<Event>,
    state: watch::Sender<ScreenState<R::Record>>,
    notices: mpsc::Sender<Feedback>,
) where
    R: Resource,
    R::Record: Clone,
    T: Transport,
{
    let mut inflight = InFlight {
        transport,
        tasks: JoinSet::new(),
        epochs: HashMap::new(),
    };
    let ticket = controller.mount();
    inflight.spawn(ticket);
    state.send_replace(ScreenState::capture(&controller));

    loop {
        let deadline = controller.debounce_deadline();
        tokio::select! {
            event = events.recv() => {
                let Some(event) = event else {
                    break;
                };
                let ticket = match event {
                    Event::Search(term) => {
                        controller.on_search(&term, Instant::now());
                        None
                    }
                    Event::Filter { name, value } => controller.on_filter_change(&name, value),
                    Event::Reset => controller.on_reset(),
                    Event::Page { page, per_page } => controller.on_page_change(page, per_page),
                    Event::Refresh => controller.on_refresh(),
                };
                inflight.spawn(ticket);
            }
            _ = sleep_until(deadline.unwrap_or_else(Instant::now)), if deadline.is_some() => {
                let ticket = controller.poll(Instant::now());
                inflight.spawn(ticket);
            }
            Some(joined) = inflight.tasks.join_next_with_id(), if !inflight.tasks.is_empty() => {
                let outcome = match joined {
                    Ok((id, (epoch, result))) => {
                        inflight.epochs.remove(&id);
                        match result {
                            Ok(response) => controller.on_response(epoch, response),
                            Err(error) => controller.on_failure(epoch, error),
                        }
                    }
                    Err(e) => match inflight.epochs.remove(&e.id()) {
                        Some(epoch) => controller.on_failure(epoch, ApiError::Transport(e.to_string())),
                        None => continue,
                    },
                };
                if let Outcome::Failed(feedback) = outcome {
                    if notices.try_send(feedback).is_err() {
                        debug!(resource = R::PATH, "notice queue full, dropping failure notice");
                    }
                }
            }
        }
        state.send_replace(ScreenState::capture(&controller));
    }

    controller.unmount();
    debug!(resource = R::PATH, in_flight = inflight.tasks.len(), "screen unmounted");
}
