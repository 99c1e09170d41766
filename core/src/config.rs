//! Per-screen controller settings.

use std::time::Duration;

use crate::debounce::DEFAULT_QUIET_PERIOD;
use crate::records::MergeMode;

pub const DEFAULT_PER_PAGE: u32 = 10;
pub const DEFAULT_SEARCH_KEY: &str = "name";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ControllerConfig {
    pub quiet_period: Duration,
    pub per_page: u32,
    /// Send `page`/`perPage` with every request.
    pub paginate: bool,
    pub merge_mode: MergeMode,
    /// Filter that receives the debounced search term.
    pub search_key: String,
}

impl Default for ControllerConfig {
    fn default() -> Self {
        Self::table()
    }
}

impl ControllerConfig {
    /// A paged data table: offsets on every request, batches replace rows.
    pub fn table() -> Self {
        Self {
            quiet_period: DEFAULT_QUIET_PERIOD,
            per_page: DEFAULT_PER_PAGE,
            paginate: true,
            merge_mode: MergeMode::Replace,
            search_key: DEFAULT_SEARCH_KEY.to_string(),
        }
    }

    /// A search-as-you-type option list: no offsets, batches accumulate.
    pub fn picker() -> Self {
        Self {
            paginate: false,
            merge_mode: MergeMode::Merge,
            ..Self::table()
        }
    }

    pub fn with_quiet_period(mut self, quiet_period: Duration) -> Self {
        self.quiet_period = quiet_period;
        self
    }

    pub fn with_per_page(mut self, per_page: u32) -> Self {
        self.per_page = per_page.max(1);
        self
    }

    pub fn with_merge_mode(mut self, merge_mode: MergeMode) -> Self {
        self.merge_mode = merge_mode;
        self
    }

    pub fn with_search_key(mut self, search_key: &str) -> Self {
        self.search_key = search_key.to_string();
        self
    }
}
