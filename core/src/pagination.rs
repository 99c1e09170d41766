//! Page/offset bookkeeping for one list screen.

use crate::query::PageRequest;
use crate::types::PaginationMeta;

/// What the screen displays plus what the next request asks for.
///
/// `meta` is replaced wholesale by each applied response. `requested` is the
/// offset the next fetch will carry and may run ahead of `meta` while a page
/// change is in flight.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PaginationState {
    enabled: bool,
    requested: PageRequest,
    meta: PaginationMeta,
}

impl PaginationState {
    pub fn new(per_page: u32, enabled: bool) -> Self {
        let requested = PageRequest { page: 1, per_page };
        Self {
            enabled,
            requested,
            meta: PaginationMeta {
                page: 1,
                per_page,
                total: 0,
            },
        }
    }

    pub fn meta(&self) -> PaginationMeta {
        self.meta
    }

    /// Offsets for the next request, or `None` when this screen does not page.
    pub fn request(&self) -> Option<PageRequest> {
        self.enabled.then_some(self.requested)
    }

    pub fn change_page(&mut self, page: u32, per_page: u32) {
        self.enabled = true;
        self.requested = PageRequest {
            page: page.max(1),
            per_page: per_page.max(1),
        };
    }

    /// Back to the first page, keeping the page size.
    pub fn rewind(&mut self) {
        self.requested.page = 1;
    }

    /// Point the next request back at the displayed page after a failure.
    pub fn revert(&mut self) {
        self.requested = PageRequest {
            page: self.meta.page.max(1),
            per_page: self.meta.per_page.max(1),
        };
    }

    pub fn reset(&mut self, per_page: u32, enabled: bool) {
        *self = Self::new(per_page, enabled);
    }

    pub fn apply(&mut self, meta: PaginationMeta) {
        self.meta = meta;
    }
}
