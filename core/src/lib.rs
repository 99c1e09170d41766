//! List-screen core for the brokerage back office.
//!
//! # Overview
//! Every back-office list screen (locations, FAQs, credit packages, leave
//! types, ...) runs the same loop: search input is debounced, filters are
//! stripped into a query, the list endpoint is fetched, and the result either
//! replaces the table or is merged into an option picker. `ListController`
//! implements that loop once, for any `Resource`.
//!
//! # Design
//! - Host does I/O. `ResourceClient` and `ListController` build
//!   `HttpRequest` values and consume `HttpResponse` values; the caller runs
//!   the round trip. `driver::spawn_screen` is a ready-made tokio host.
//! - Requests carry a `RequestEpoch`; only the latest one is ever applied.
//! - Permissions arrive as a read-only `Arc<PermissionSnapshot>`.
//! - DTOs are defined independently from the mock-server crate; integration
//!   tests catch schema drift.

pub mod client;
pub mod config;
pub mod controller;
pub mod debounce;
pub mod driver;
pub mod error;
pub mod http;
pub mod pagination;
pub mod permissions;
pub mod query;
pub mod records;
pub mod types;

pub use client::{Faqs, Locations, Resource, ResourceClient};
pub use config::ControllerConfig;
pub use controller::{FetchTicket, ListController, Outcome, Phase, RequestEpoch};
pub use debounce::Debouncer;
pub use driver::{spawn_screen, NOTICE_CAPACITY, ScreenHandle, ScreenState, Transport};
pub use error::{ApiError, Feedback, FieldError, FieldErrors};
pub use http::{HttpMethod, HttpRequest, HttpResponse};
pub use pagination::PaginationState;
pub use permissions::{Action, AuthSession, PermissionSnapshot};
pub use query::{FilterState, FilterValue, PageRequest, Query, QueryBuilder, Scalar};
pub use records::{MergeMode, RecordCollection};
pub use types::{Faq, FaqUpdate, Identified, Location, LocationUpdate, NewFaq, NewLocation, Page, PaginationMeta};
