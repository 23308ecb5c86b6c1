//! General utility helper functions
//!
//! Blob path construction, URI cleanup and timestamp formatting shared by
//! the transfer client, the resource broker and the in-memory transport.

use crate::error::{BlobRelayError, Result};
use chrono::{DateTime, SecondsFormat, Utc};
use url::Url;

/// Reject identifiers that are empty or whitespace only.
///
/// Anything else is left for the storage service to judge.
pub fn validate_identifier(kind: &str, value: &str) -> Result<()> {
    if value.trim().is_empty() {
        return Err(BlobRelayError::invalid_argument(format!(
            "{kind} must not be empty"
        )));
    }
    Ok(())
}

/// Reject names containing `.` or `..` path segments.
///
/// URL resolution collapses those segments (percent-encoded or not), so the
/// request would address a different blob than the one named.
pub fn validate_path_segments(kind: &str, value: &str) -> Result<()> {
    if value.split('/').any(|segment| segment == "." || segment == "..") {
        return Err(BlobRelayError::invalid_argument(format!(
            "{kind} '{value}' must not contain '.' or '..' path segments"
        )));
    }
    Ok(())
}

/// Build the relative `container/blob` path with every segment percent-encoded.
///
/// Slashes inside the blob name are kept as path separators so virtual
/// directories survive.
pub fn blob_path(container: &str, name: &str) -> String {
    let mut url = match Url::parse("http://blob.invalid/") {
        Ok(url) => url,
        Err(_) => return format!("{container}/{name}"),
    };

    if let Ok(mut segments) = url.path_segments_mut() {
        segments.pop_if_empty().push(container);
        segments.extend(name.split('/'));
    }

    url.path().trim_start_matches('/').to_string()
}

/// Drop query and fragment from a URI, e.g. a SAS signature.
pub fn strip_query(uri: &str) -> Result<String> {
    let mut url = Url::parse(uri)?;
    url.set_query(None);
    url.set_fragment(None);
    Ok(url.to_string())
}

/// Expiry format accepted by the blob service: UTC, whole seconds, `Z` suffix.
pub fn format_expiry(at: DateTime<Utc>) -> String {
    at.to_rfc3339_opts(SecondsFormat::Secs, true)
}

/// Whether `path` is an absolute http(s) URL rather than an endpoint-relative path.
pub fn is_absolute_url(path: &str) -> bool {
    Url::parse(path)
        .map(|url| matches!(url.scheme(), "http" | "https"))
        .unwrap_or(false)
}
