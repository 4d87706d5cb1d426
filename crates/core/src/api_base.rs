//! Backend base URL resolution.
//!
//! An explicit override always wins. Without one, release builds talk to the
//! hosted backend and debug builds to a backend on localhost.

use crate::constants::{LOCAL_API_URL, PRODUCTION_API_URL};

/// Returns true when compiled without debug assertions.
pub fn is_production_build() -> bool {
    !cfg!(debug_assertions)
}

/// Resolve the backend base URL.
///
/// Blank overrides are ignored. Trailing slashes are stripped so callers can
/// append `/api/...` paths directly.
pub fn resolve_api_base_url(override_url: Option<&str>, production: bool) -> String {
    let chosen = match override_url.map(str::trim) {
        Some(url) if !url.is_empty() => url,
        _ if production => PRODUCTION_API_URL,
        _ => LOCAL_API_URL,
    };
    chosen.trim_end_matches('/').to_string()
}
