//! HTTP boundary adapters.
//!
//! # Responsibilities
//! - Extract inbound correlation headers into a log context
//! - Inject correlation headers on outbound requests
//! - Provide an axum middleware entering the context around a handler
//!
//! # Design Decisions
//! - These adapters stay outside the core: they only call `enter` and
//!   `current_value`, plus identifier generation
//! - Whether a missing identifier is regenerated is a per-carrier policy,
//!   not hard-coded: servers default to minting a span id only, clients to
//!   minting a trace id as well

use axum::{extract::Request, middleware::Next, response::Response};
use http::HeaderMap;

use crate::context::{current_value, generate_trace_id, FutureExt, LogContext};

pub const TRACE_ID_HEADER: &str = "trace-id";
pub const SPAN_ID_HEADER: &str = "span-id";
pub const USER_ID_HEADER: &str = "user-id";

/// Policy for identifiers missing at a request boundary.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TracePolicy {
    pub generate_missing_trace_id: bool,
    pub generate_missing_span_id: bool,
}

impl TracePolicy {
    /// Inbound requests: a request without a trace id stays without one
    /// (the caller owns the trace), but every request gets its own span id.
    pub fn server() -> Self {
        Self {
            generate_missing_trace_id: false,
            generate_missing_span_id: true,
        }
    }

    /// Outbound requests: start a fresh trace when none is in flight.
    pub fn client() -> Self {
        Self {
            generate_missing_trace_id: true,
            generate_missing_span_id: true,
        }
    }
}

/// Build a context layer from inbound correlation headers.
pub fn context_from_headers(headers: &HeaderMap, policy: &TracePolicy) -> LogContext {
    let mut context = LogContext::new();

    match header_str(headers, TRACE_ID_HEADER) {
        Some(trace_id) => context = context.with_value("trace_id", trace_id),
        None if policy.generate_missing_trace_id => {
            context = context.with_value("trace_id", generate_trace_id());
        }
        None => {}
    }

    match header_str(headers, SPAN_ID_HEADER) {
        Some(span_id) => context = context.with_value("span_id", span_id),
        None if policy.generate_missing_span_id => {
            context = context.with_value("span_id", generate_trace_id());
        }
        None => {}
    }

    if let Some(user_id) = header_str(headers, USER_ID_HEADER) {
        context = context.with_value("user_id", user_id);
    }

    context
}

/// Write correlation headers on an outbound request from the current
/// context. Headers already present are left alone.
pub fn inject_trace_headers(headers: &mut HeaderMap, policy: &TracePolicy) {
    if !headers.contains_key(TRACE_ID_HEADER) {
        let trace_id = current_value("trace_id")
            .map(|v| v.to_plain_string())
            .or_else(|| policy.generate_missing_trace_id.then(generate_trace_id));
        if let Some(trace_id) = trace_id {
            insert_header(headers, TRACE_ID_HEADER, &trace_id);
        }
    }

    if !headers.contains_key(SPAN_ID_HEADER) {
        let span_id = current_value("span_id")
            .map(|v| v.to_plain_string())
            .or_else(|| policy.generate_missing_span_id.then(generate_trace_id));
        if let Some(span_id) = span_id {
            insert_header(headers, SPAN_ID_HEADER, &span_id);
        }
    }

    if let Some(user_id) = current_value("user_id") {
        if !headers.contains_key(USER_ID_HEADER) {
            insert_header(headers, USER_ID_HEADER, &user_id.to_plain_string());
        }
    }
}

/// Axum middleware: enter the extracted context, log the request line, run
/// the rest of the stack inside the context.
pub async fn trace_context_middleware(request: Request, next: Next) -> Response {
    let context = context_from_headers(request.headers(), &TracePolicy::server());

    let method = request.method().clone();
    let path = request.uri().path().to_owned();
    let query = request.uri().query().unwrap_or("").to_owned();

    async move {
        log::info!(query_params = query.as_str(); "{} {}", method, path);
        next.run(request).await
    }
    .in_log_context(context)
    .await
}

fn header_str(headers: &HeaderMap, name: &str) -> Option<String> {
    headers
        .get(name)
        .and_then(|v| v.to_str().ok())
        .map(str::to_owned)
}

fn insert_header(headers: &mut HeaderMap, name: &'static str, value: &str) {
    if let Ok(value) = http::HeaderValue::from_str(value) {
        headers.insert(name, value);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::value::ContextValue;

    fn layer_value(context: &LogContext, key: &str) -> Option<ContextValue> {
        let _guard = context.clone().enter();
        current_value(key)
    }

    #[test]
    fn inbound_trace_id_is_picked_up() {
        let mut headers = HeaderMap::new();
        headers.insert(TRACE_ID_HEADER, "123abc".parse().unwrap());

        let context = context_from_headers(&headers, &TracePolicy::server());
        assert_eq!(
            layer_value(&context, "trace_id"),
            Some(ContextValue::from("123abc"))
        );
    }

    #[test]
    fn server_policy_mints_span_but_not_trace() {
        let headers = HeaderMap::new();
        let context = context_from_headers(&headers, &TracePolicy::server());

        assert_eq!(layer_value(&context, "trace_id"), None);
        let span = layer_value(&context, "span_id").expect("span id generated");
        assert_eq!(span.to_plain_string().len(), 32);
    }

    #[test]
    fn outbound_trace_id_comes_from_context() {
        let _guard = LogContext::new().with_value("trace_id", "abc123").enter();
        let mut headers = HeaderMap::new();
        inject_trace_headers(&mut headers, &TracePolicy::client());

        assert_eq!(headers.get(TRACE_ID_HEADER).unwrap(), "abc123");
    }

    #[test]
    fn outbound_trace_id_is_generated_when_missing() {
        let mut headers = HeaderMap::new();
        inject_trace_headers(&mut headers, &TracePolicy::client());

        let trace_id = headers.get(TRACE_ID_HEADER).unwrap().to_str().unwrap();
        assert_eq!(trace_id.len(), 32);
        assert!(trace_id.chars().all(|c| c.is_ascii_hexdigit()));
    }

    #[test]
    fn existing_outbound_headers_are_preserved() {
        let mut headers = HeaderMap::new();
        headers.insert(TRACE_ID_HEADER, "keep-me".parse().unwrap());
        inject_trace_headers(&mut headers, &TracePolicy::client());

        assert_eq!(headers.get(TRACE_ID_HEADER).unwrap(), "keep-me");
    }
}
