//! # Middleware System
//!
//! Request/response interception for logging and timing.
//! Middlewares run in registration order before the handler, and in reverse
//! order after it.

use crate::request::HttpRequest;
use crate::server::HttpResponse;
use std::sync::Arc;
use tracing::{debug, info, warn};

/// Middleware trait for request/response interception
pub trait Middleware: Send + Sync {
    /// Called before the request handler
    ///
    /// Can return early with a response.
    fn before_request(&self, _req: &HttpRequest) -> MiddlewareResult {
        MiddlewareResult::Continue
    }

    /// Called after the request handler
    ///
    /// Can modify the response or perform logging.
    fn after_response(&self, _req: &HttpRequest, _res: &mut HttpResponse) {}

    /// Middleware name for logging
    fn name(&self) -> &'static str {
        "Unknown"
    }
}

/// Result of middleware execution
#[derive(Debug)]
pub enum MiddlewareResult {
    /// Continue to next middleware/handler
    Continue,
    /// Short-circuit with this response (skip handler)
    Respond(HttpResponse),
}

/// Middleware chain for processing requests
#[derive(Default, Clone)]
pub struct MiddlewareChain {
    middlewares: Vec<Arc<dyn Middleware>>,
}

impl MiddlewareChain {
    /// Create a new empty middleware chain
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a middleware to the chain
    pub fn add<M: Middleware + 'static>(&mut self, middleware: M) {
        self.middlewares.push(Arc::new(middleware));
    }

    /// Execute `before_request` for all middlewares
    pub fn run_before(&self, req: &HttpRequest) -> MiddlewareResult {
        for mw in &self.middlewares {
            if let MiddlewareResult::Respond(resp) = mw.before_request(req) {
                debug!(middleware = mw.name(), "Middleware short-circuited request");
                return MiddlewareResult::Respond(resp);
            }
        }
        MiddlewareResult::Continue
    }

    /// Execute `after_response` for all middlewares (in reverse order)
    pub fn run_after(&self, req: &HttpRequest, res: &mut HttpResponse) {
        for mw in self.middlewares.iter().rev() {
            mw.after_response(req, res);
        }
    }

    /// Get the number of middlewares
    #[must_use]
    pub fn len(&self) -> usize {
        self.middlewares.len()
    }

    /// Check if chain is empty
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.middlewares.is_empty()
    }
}

/// Logging middleware - structured request/response events
#[derive(Default)]
pub struct LoggingMiddleware;

impl LoggingMiddleware {
    /// Create a new logging middleware
    #[must_use]
    pub const fn new() -> Self {
        Self
    }
}

impl Middleware for LoggingMiddleware {
    fn before_request(&self, req: &HttpRequest) -> MiddlewareResult {
        let request_id = req.header("x-request-id").unwrap_or("-");
        info!(
            method = %req.method,
            path = %req.path,
            request_id = %request_id,
            "Request received"
        );
        MiddlewareResult::Continue
    }

    fn after_response(&self, req: &HttpRequest, res: &mut HttpResponse) {
        let request_id = req.header("x-request-id").unwrap_or("-");
        if res.status >= 500 {
            warn!(
                method = %req.method,
                path = %req.path,
                status = res.status,
                request_id = %request_id,
                "Response sent"
            );
        } else {
            info!(
                method = %req.method,
                path = %req.path,
                status = res.status,
                request_id = %request_id,
                "Response sent"
            );
        }
    }

    fn name(&self) -> &'static str {
        "LoggingMiddleware"
    }
}

/// Timing middleware - measures request duration
///
/// Duration is taken from the request's own receive instant, so nothing is
/// kept between `before_request` and `after_response`.
#[derive(Default)]
pub struct TimingMiddleware;

impl TimingMiddleware {
    /// Create a new timing middleware
    #[must_use]
    pub const fn new() -> Self {
        Self
    }
}

impl Middleware for TimingMiddleware {
    fn after_response(&self, req: &HttpRequest, res: &mut HttpResponse) {
        let duration = req.received_at().elapsed();
        res.set_header("x-response-time-ms", &duration.as_millis().to_string());
        debug!(
            method = %req.method,
            path = %req.path,
            request_id = req.header("x-request-id").unwrap_or("-"),
            duration_ms = %duration.as_millis(),
            "Request timing"
        );
    }

    fn name(&self) -> &'static str {
        "TimingMiddleware"
    }
}
