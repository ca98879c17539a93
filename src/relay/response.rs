//! Response relay: upstream head and body back to the caller.
//!
//! The body is handed to hyper as a stream, so each upstream chunk is
//! written to the caller as soon as it arrives. When the caller goes away
//! hyper drops the body, which drops the upstream stream and closes its
//! connection.

use axum::{body::Body, response::Response};
use futures_util::TryStreamExt;
use hyper::body::Incoming;

use crate::relay::headers::end_to_end;

/// Turn an upstream response into the caller's response without buffering.
pub fn relay_response(upstream: hyper::Response<Incoming>) -> Response {
    let (parts, body) = upstream.into_parts();
    let headers = end_to_end(&parts.headers);

    let stream = Body::new(body).into_data_stream().inspect_err(|e| {
        tracing::debug!(error = %e, "Upstream body ended early, closing caller stream");
    });

    let mut response = Response::new(Body::from_stream(stream));
    *response.status_mut() = parts.status;
    *response.headers_mut() = headers;
    response
}
