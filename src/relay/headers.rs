//! Hop-by-hop header handling.
//!
//! Hop-by-hop headers describe a single connection segment, so they are
//! stripped in both directions. Headers listed in a `Connection` header are
//! hop-by-hop as well.

use axum::http::{header, HeaderMap, HeaderName};

/// Standard hop-by-hop headers (RFC 9110 §7.6.1) plus the legacy
/// `Proxy-Connection`.
static HOP_BY_HOP: [HeaderName; 9] = [
    header::CONNECTION,
    HeaderName::from_static("keep-alive"),
    HeaderName::from_static("proxy-connection"),
    header::PROXY_AUTHENTICATE,
    header::PROXY_AUTHORIZATION,
    header::TE,
    header::TRAILER,
    header::TRANSFER_ENCODING,
    header::UPGRADE,
];

pub fn is_hop_by_hop(name: &HeaderName) -> bool {
    HOP_BY_HOP.contains(name)
}

/// Copy `headers`, leaving out hop-by-hop entries and anything nominated by
/// the `Connection` header. Repeated values keep their order.
pub fn end_to_end(headers: &HeaderMap) -> HeaderMap {
    let nominated: Vec<HeaderName> = headers
        .get_all(header::CONNECTION)
        .iter()
        .filter_map(|v| v.to_str().ok())
        .flat_map(|v| v.split(','))
        .filter_map(|token| HeaderName::from_bytes(token.trim().as_bytes()).ok())
        .collect();

    let mut out = HeaderMap::with_capacity(headers.len());
    for (name, value) in headers {
        if is_hop_by_hop(name) || nominated.contains(name) {
            continue;
        }
        out.append(name.clone(), value.clone());
    }
    out
}
