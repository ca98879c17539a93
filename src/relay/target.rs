//! Target resolution.
//!
//! The inbound path is `/<mount_prefix>/<percent-encoded absolute URL>`.
//! Everything after the prefix, slashes included, is the encoded target.
//! Resolution is a pure function of the request URI.

use std::fmt;

use axum::http::Uri;
use percent_encoding::percent_decode_str;
use url::{Position, Url};

use crate::relay::error::RelayError;

/// Upstream location derived from one inbound request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResolvedTarget {
    url: Url,
}

impl ResolvedTarget {
    /// `http` or `https`.
    pub fn scheme(&self) -> &str {
        self.url.scheme()
    }

    /// Host, plus the port when it is not the scheme's default.
    pub fn authority(&self) -> String {
        let host = self.url.host_str().unwrap_or_default();
        match self.url.port() {
            Some(port) => format!("{host}:{port}"),
            None => host.to_string(),
        }
    }

    /// Path and query as sent on the upstream request line.
    pub fn path_and_query(&self) -> &str {
        &self.url[Position::BeforePath..Position::AfterQuery]
    }

    /// `scheme://authority`, used to name the upstream in messages.
    pub fn origin(&self) -> String {
        format!("{}://{}", self.scheme(), self.authority())
    }

    pub fn url(&self) -> &Url {
        &self.url
    }
}

impl fmt::Display for ResolvedTarget {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.url.as_str())
    }
}

/// Resolve the upstream target encoded in `uri`'s path under `mount_prefix`.
///
/// A raw query on the inbound URI is appended to the target's own query.
pub fn resolve(mount_prefix: &str, uri: &Uri) -> Result<ResolvedTarget, RelayError> {
    let path = uri.path();
    let raw = strip_mount(mount_prefix, path)
        .ok_or_else(|| RelayError::InvalidTarget(path.to_string()))?;

    let invalid = || RelayError::InvalidTarget(raw.to_string());

    if !has_valid_escapes(raw) {
        return Err(invalid());
    }
    let decoded = percent_decode_str(raw)
        .decode_utf8()
        .map_err(|_| invalid())?;

    if !has_http_scheme(&decoded) {
        return Err(invalid());
    }

    let mut url = Url::parse(&decoded).map_err(|_| invalid())?;
    if url.host_str().map_or(true, str::is_empty) {
        return Err(invalid());
    }
    url.set_fragment(None);

    if let Some(extra) = uri.query().filter(|q| !q.is_empty()) {
        let merged = match url.query() {
            Some(existing) if !existing.is_empty() => format!("{existing}&{extra}"),
            _ => extra.to_string(),
        };
        url.set_query(Some(&merged));
    }

    Ok(ResolvedTarget { url })
}

/// Returns the raw suffix after `/<prefix>/`, or `None` when the path is not
/// under the mount point at all.
fn strip_mount<'a>(prefix: &str, path: &'a str) -> Option<&'a str> {
    let rest = path.strip_prefix('/')?.strip_prefix(prefix)?;
    if rest.is_empty() {
        return Some(rest);
    }
    rest.strip_prefix('/')
}

/// Every `%` must introduce exactly two hex digits.
fn has_valid_escapes(raw: &str) -> bool {
    let bytes = raw.as_bytes();
    let mut i = 0;
    while i < bytes.len() {
        if bytes[i] == b'%' {
            let hex = bytes.get(i + 1..i + 3);
            if !hex.is_some_and(|h| h.iter().all(u8::is_ascii_hexdigit)) {
                return false;
            }
            i += 3;
        } else {
            i += 1;
        }
    }
    true
}

fn has_http_scheme(decoded: &str) -> bool {
    let bytes = decoded.as_bytes();
    let starts_with = |scheme: &[u8]| {
        bytes.len() >= scheme.len() && bytes[..scheme.len()].eq_ignore_ascii_case(scheme)
    };
    starts_with(b"http://") || starts_with(b"https://")
}
