//! Application constants and configuration

use std::time::Duration;

pub const APP_VERSION: &str = env!("CARGO_PKG_VERSION");

/// Fallback backend address when neither settings nor environment provide one
pub const DEFAULT_API_BASE_URL: &str = "http://localhost:8000";

/// Environment override for the backend base URL
pub const API_URL_ENV: &str = "WORDBOOK_API_URL";

/// How many test weeks to request for the pill strips and dropdowns
pub const TEST_WEEK_FETCH_LIMIT: usize = 10;

/// Page size for the per-date vocabulary listing
pub const VOCAB_PAGE_LIMIT: usize = 100;

/// Fixed interval between test-availability re-checks
pub const AVAILABILITY_POLL_INTERVAL: Duration = Duration::from_secs(60);
