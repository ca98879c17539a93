//! Outbound request construction and dispatch.
//!
//! # Responsibilities
//! - Mirror the inbound method, headers and body onto the resolved target
//! - Rewrite `Host` to the target authority and drop hop-by-hop headers
//! - Stream the inbound body upstream without collecting it
//! - Bound the wait for upstream response headers
//!
//! # Design Decisions
//! - One attempt per request; failures surface immediately
//! - One process-wide client, so the TLS trust policy never varies between
//!   pooled connections
//! - Redirects are returned to the caller, never followed
//! - The client adds no headers of its own (no `Accept`, no `User-Agent`)

use std::error::Error as StdError;
use std::time::{Duration, Instant};

use axum::{
    body::Body,
    http::{header, HeaderValue, Request, Response, Uri},
};
use hyper::body::Incoming;
use hyper_rustls::{HttpsConnector, HttpsConnectorBuilder};
use hyper_util::{
    client::legacy::{connect::HttpConnector, Client},
    rt::TokioExecutor,
};

use crate::config::UpstreamConfig;
use crate::observability::metrics;
use crate::relay::error::RelayError;
use crate::relay::headers::end_to_end;
use crate::relay::target::ResolvedTarget;
use crate::relay::tls;

type UpstreamClient = Client<HttpsConnector<HttpConnector>, Body>;

/// Sends relayed requests upstream.
#[derive(Debug, Clone)]
pub struct Forwarder {
    client: UpstreamClient,
    first_byte_timeout: Duration,
    first_byte_timeout_ms: u64,
    connect_timeout_ms: u64,
}

impl Forwarder {
    /// Build the upstream client from configuration.
    pub fn new(config: &UpstreamConfig) -> Result<Self, RelayError> {
        if !config.verify_upstream_tls {
            tracing::debug!("Upstream TLS certificate validation is disabled");
        }

        let tls = tls::client_config(config.verify_upstream_tls)
            .map_err(|e| RelayError::InternalFailure(error_chain(&e)))?;

        let mut http = HttpConnector::new();
        http.enforce_http(false);
        http.set_connect_timeout(Some(config.connect_timeout()));

        let https = HttpsConnectorBuilder::new()
            .with_tls_config(tls)
            .https_or_http()
            .enable_http1()
            .enable_http2()
            .wrap_connector(http);

        let client = Client::builder(TokioExecutor::new()).build(https);

        Ok(Self {
            client,
            first_byte_timeout: config.first_byte_timeout(),
            first_byte_timeout_ms: config.first_byte_timeout_ms,
            connect_timeout_ms: config.connect_timeout_ms,
        })
    }

    /// Forward `request` to `target` and wait for the upstream response head.
    ///
    /// Nothing is added to the caller's headers except the rewritten `Host`.
    /// Dropping the returned future aborts the upstream request.
    pub async fn forward(
        &self,
        target: &ResolvedTarget,
        request: Request<Body>,
    ) -> Result<Response<Incoming>, RelayError> {
        let (parts, body) = request.into_parts();

        let mut headers = end_to_end(&parts.headers);
        let host = HeaderValue::from_str(&target.authority())
            .map_err(|e| RelayError::InternalFailure(e.to_string()))?;
        headers.insert(header::HOST, host);

        let uri: Uri = target
            .url()
            .as_str()
            .parse()
            .map_err(|e: axum::http::uri::InvalidUri| RelayError::InternalFailure(e.to_string()))?;

        let mut outbound = Request::new(body);
        *outbound.method_mut() = parts.method;
        *outbound.uri_mut() = uri;
        *outbound.headers_mut() = headers;

        tracing::debug!(path = %target.path_and_query(), "Forwarding upstream");

        let started = Instant::now();
        let response =
            match tokio::time::timeout(self.first_byte_timeout, self.client.request(outbound)).await {
                Ok(Ok(response)) => response,
                Ok(Err(e)) => return Err(self.classify(target, &e)),
                Err(_) => {
                    return Err(RelayError::UpstreamTimeout {
                        target: target.origin(),
                        timeout_ms: self.first_byte_timeout_ms,
                    })
                }
            };
        metrics::record_first_byte(started.elapsed());

        tracing::debug!(
            status = %response.status(),
            elapsed = ?started.elapsed(),
            "Upstream responded"
        );
        Ok(response)
    }

    fn classify(
        &self,
        target: &ResolvedTarget,
        error: &hyper_util::client::legacy::Error,
    ) -> RelayError {
        if !error.is_connect() {
            return RelayError::InternalFailure(error_chain(error));
        }
        if timed_out(error) {
            RelayError::UpstreamTimeout {
                target: target.origin(),
                timeout_ms: self.connect_timeout_ms,
            }
        } else {
            RelayError::UpstreamUnreachable {
                target: target.origin(),
                detail: error_chain(error),
            }
        }
    }
}

/// True when any error in the chain is an I/O timeout.
fn timed_out(error: &(dyn StdError + 'static)) -> bool {
    let mut current = Some(error);
    while let Some(e) = current {
        if e
            .downcast_ref::<std::io::Error>()
            .is_some_and(|io| io.kind() == std::io::ErrorKind::TimedOut)
        {
            return true;
        }
        current = e.source();
    }
    false
}

/// Render an error with all of its sources, `outer: inner: root`.
pub(crate) fn error_chain(error: &dyn StdError) -> String {
    let mut out = error.to_string();
    let mut source = error.source();
    while let Some(cause) = source {
        out.push_str(": ");
        out.push_str(&cause.to_string());
        source = cause.source();
    }
    out
}
