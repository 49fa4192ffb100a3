//! # HTTP Server
//!
//! HTTP server built on Hyper and Tokio.
//! Implements graceful shutdown with signal handling.
//!
//! ## Key Features
//!
//! - One Tokio task per connection
//! - Graceful shutdown on Ctrl-C with a bounded drain
//! - Request ids propagated through `x-request-id`
//! - Errors returned by handlers rendered as `{"detail": ...}` JSON

use crate::error::{Error, Result};
use crate::middleware::{Middleware, MiddlewareChain, MiddlewareResult};
use crate::request::HttpRequest;
use crate::router::{Match, Method, Router};
use http_body_util::Full;
pub use hyper::body::Bytes;
use hyper::server::conn::http1;
use hyper::service::service_fn;
use hyper::{Request, Response, StatusCode};
use hyper_util::rt::TokioIo;
use serde::Serialize;
use std::collections::HashMap;
use std::future::Future;
use std::net::SocketAddr;
use std::pin::Pin;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tracing::{error, info};

/// HTTP Server configuration
#[derive(Debug, Clone)]
pub struct ServerConfig {
    /// Address to bind the server to
    pub address: SocketAddr,
    /// Enable keep-alive connections
    pub keep_alive: bool,
    /// Shutdown timeout for graceful shutdown (default: 30 seconds)
    pub shutdown_timeout: Duration,
    /// Max request body size in bytes
    pub max_body_size: usize,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            address: ([127, 0, 0, 1], 8000).into(),
            keep_alive: true,
            shutdown_timeout: Duration::from_secs(30),
            max_body_size: 1024 * 1024,
        }
    }
}

/// HTTP response produced by handlers and middleware
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HttpResponse {
    /// HTTP status code
    pub status: u16,
    /// Response body
    pub body: String,
    /// Content type
    pub content_type: String,
    /// Response headers
    pub headers: HashMap<String, String>,
}

impl Default for HttpResponse {
    fn default() -> Self {
        Self {
            status: 200,
            body: String::new(),
            content_type: "application/json".to_string(),
            headers: HashMap::new(),
        }
    }
}

impl HttpResponse {
    /// Create a JSON response from an already-encoded body
    #[must_use]
    pub fn json(body: impl Into<String>) -> Self {
        Self {
            body: body.into(),
            ..Self::default()
        }
    }

    /// Serialize `value` into a 200 JSON response
    ///
    /// # Errors
    ///
    /// Returns `Error::Json` if serialization fails.
    pub fn ok<T: Serialize>(value: &T) -> Result<Self> {
        crate::json::to_json(value).map(Self::json)
    }

    /// Render an error as its status and `{"detail": ...}` body
    #[must_use]
    pub fn from_error(err: &Error) -> Self {
        Self::json(err.to_body().to_string()).with_status(err.status_code().as_u16())
    }

    /// Set status code
    #[must_use]
    pub fn with_status(mut self, status: u16) -> Self {
        self.status = status;
        self
    }

    /// Set header
    #[must_use]
    pub fn with_header(mut self, key: &str, value: &str) -> Self {
        self.set_header(key, value);
        self
    }

    /// Set or override a header
    pub fn set_header(&mut self, key: &str, value: &str) {
        if key.eq_ignore_ascii_case("content-type") {
            self.content_type = value.to_string();
        } else {
            self.headers.insert(key.to_ascii_lowercase(), value.to_string());
        }
    }

    /// Get a header by (case-insensitive) name
    #[must_use]
    pub fn header(&self, key: &str) -> Option<&str> {
        if key.eq_ignore_ascii_case("content-type") {
            return Some(&self.content_type);
        }
        self.headers
            .get(&key.to_ascii_lowercase())
            .map(String::as_str)
    }

    /// Convert to hyper Response
    fn into_hyper(self) -> Response<Full<Bytes>> {
        let status = StatusCode::from_u16(self.status).unwrap_or(StatusCode::INTERNAL_SERVER_ERROR);
        let mut builder = Response::builder()
            .status(status)
            .header("Content-Type", &self.content_type);
        for (k, v) in &self.headers {
            builder = builder.header(k.as_str(), v.as_str());
        }

        builder
            .body(Full::new(Bytes::from(self.body)))
            .unwrap_or_else(|e| {
                error!("Invalid response header: {}", e);
                let mut fallback = Response::new(Full::new(Bytes::from_static(
                    br#"{"detail":"Internal Server Error"}"#,
                )));
                *fallback.status_mut() = StatusCode::INTERNAL_SERVER_ERROR;
                fallback
            })
    }
}

/// Boxed future returned by a handler
pub type HandlerFuture = Pin<Box<dyn Future<Output = Result<HttpResponse>> + Send>>;

/// Handler function type (async)
pub type Handler = Arc<dyn Fn(&HttpRequest, &Match) -> HandlerFuture + Send + Sync>;

/// Box an async closure into a [`Handler`]
pub fn handler<F, Fut>(f: F) -> Handler
where
    F: Fn(&HttpRequest, &Match) -> Fut + Send + Sync + 'static,
    Fut: Future<Output = Result<HttpResponse>> + Send + 'static,
{
    Arc::new(move |req: &HttpRequest, matched: &Match| -> HandlerFuture {
        Box::pin(f(req, matched))
    })
}

/// HTTP server: router, handlers and middleware
pub struct Server {
    config: ServerConfig,
    router: Router,
    handlers: Vec<Handler>,
    middleware: MiddlewareChain,
}

impl Server {
    /// Create a new Server instance
    #[must_use]
    pub fn new(config: ServerConfig) -> Self {
        Self {
            config,
            router: Router::new(),
            handlers: Vec::new(),
            middleware: MiddlewareChain::new(),
        }
    }

    /// Active configuration
    #[must_use]
    pub const fn config(&self) -> &ServerConfig {
        &self.config
    }

    /// Add a middleware to the chain
    pub fn add_middleware<M: Middleware + 'static>(&mut self, middleware: M) {
        self.middleware.add(middleware);
    }

    /// Add a route and its handler
    ///
    /// # Errors
    ///
    /// Returns `Error::InvalidRoutePattern` if the route is malformed or
    /// conflicts with one already registered.
    pub fn add_route(&mut self, method: Method, path: &str, handler: Handler) -> Result<()> {
        self.router.add_route(method, path)?;
        self.handlers.push(handler);
        Ok(())
    }

    /// Serve until Ctrl-C
    ///
    /// # Errors
    ///
    /// Returns `Error::BindError` if the listener cannot be set up.
    pub async fn serve(&self) -> Result<()> {
        self.serve_with_shutdown(shutdown_signal()).await
    }

    /// Serve until `signal` resolves, then drain in-flight connections
    ///
    /// # Errors
    ///
    /// Returns `Error::BindError` if the listener cannot be set up. Failed
    /// accepts are logged and retried after a short pause.
    pub async fn serve_with_shutdown(&self, signal: impl Future<Output = ()>) -> Result<()> {
        let addr = self.config.address;
        let bind_error = |source| Error::BindError {
            address: addr.to_string(),
            source,
        };

        let socket = if addr.is_ipv4() {
            tokio::net::TcpSocket::new_v4()
        } else {
            tokio::net::TcpSocket::new_v6()
        }
        .map_err(bind_error)?;
        socket.set_reuseaddr(true).map_err(bind_error)?;
        socket.bind(addr).map_err(bind_error)?;
        let listener = socket.listen(1024).map_err(bind_error)?;

        info!("Server listening on http://{}", addr);

        let router = Arc::new(self.router.clone());
        let handlers = Arc::new(self.handlers.clone());
        let middleware = Arc::new(self.middleware.clone());
        let active = Arc::new(AtomicUsize::new(0));
        let max_body_size = self.config.max_body_size;
        let keep_alive = self.config.keep_alive;

        tokio::pin!(signal);
        loop {
            tokio::select! {
                accept_result = listener.accept() => {
                    let Some((stream, remote_addr)) = accepted(accept_result).await else {
                        continue;
                    };
                    let io = TokioIo::new(stream);

                    let router = router.clone();
                    let handlers = handlers.clone();
                    let middleware = middleware.clone();
                    let active = active.clone();

                    active.fetch_add(1, Ordering::Relaxed);
                    tokio::task::spawn(async move {
                        let service = service_fn(move |req| {
                            let router = router.clone();
                            let handlers = handlers.clone();
                            let middleware = middleware.clone();
                            async move {
                                let method = req.method().clone();
                                let path = req.uri().path().to_string();
                                let version = req.version();

                                let response = handle_request(
                                    req,
                                    &router,
                                    &handlers,
                                    &middleware,
                                    remote_addr,
                                    max_body_size,
                                )
                                .await;

                                info!("    {} - \"{} {} {:?}\" {}",
                                    remote_addr,
                                    method,
                                    path,
                                    version,
                                    response.status()
                                );
                                Ok::<_, std::convert::Infallible>(response)
                            }
                        });

                        if let Err(err) = http1::Builder::new()
                            .keep_alive(keep_alive)
                            .serve_connection(io, service)
                            .await
                        {
                            error!("Error serving connection: {:?}", err);
                        }
                        active.fetch_sub(1, Ordering::Relaxed);
                    });
                }
                () = &mut signal => {
                    info!("Shutdown signal received, stopping server...");
                    break;
                }
            }
        }

        let timeout = self.config.shutdown_timeout;
        let drain = async {
            while active.load(Ordering::Relaxed) > 0 {
                tokio::time::sleep(Duration::from_millis(50)).await;
            }
        };
        if tokio::time::timeout(timeout, drain).await.is_err() {
            info!(
                remaining = active.load(Ordering::Relaxed),
                "Shutdown timeout elapsed with connections still open"
            );
        }
        Ok(())
    }

    /// Execute a request directly without the network stack
    pub async fn test_request(
        &self,
        method: Method,
        path: &str,
        headers: HashMap<String, String>,
        body: Option<Bytes>,
    ) -> HttpResponse {
        if let Some(b) = body.as_ref() {
            if b.len() > self.config.max_body_size {
                return HttpResponse::from_error(&Error::PayloadTooLarge {
                    limit: self.config.max_body_size,
                    actual: b.len(),
                });
            }
        }
        let mut req = HttpRequest::new(method, path, headers, body);
        req.set_header("x-client-ip", "test");

        process_request(&mut req, &self.router, &self.handlers, &self.middleware).await
    }
}

const ACCEPT_BACKOFF: Duration = Duration::from_millis(100);

/// Unwrap an accept result, pausing briefly on failure (e.g. EMFILE)
async fn accepted<T>(result: std::io::Result<T>) -> Option<T> {
    match result {
        Ok(conn) => Some(conn),
        Err(e) => {
            error!("Failed to accept connection: {}", e);
            tokio::time::sleep(ACCEPT_BACKOFF).await;
            None
        }
    }
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        error!("Failed to install Ctrl-C handler: {}", e);
        std::future::pending::<()>().await;
    }
}

/// Core request processing logic (network agnostic)
async fn process_request(
    req: &mut HttpRequest,
    router: &Router,
    handlers: &[Handler],
    middleware: &MiddlewareChain,
) -> HttpResponse {
    if req.header("x-request-id").is_none() {
        let request_id = generate_request_id();
        req.set_header("x-request-id", &request_id);
    }

    let mut response = match middleware.run_before(req) {
        MiddlewareResult::Continue => dispatch(req, router, handlers).await,
        MiddlewareResult::Respond(resp) => resp,
    };

    if let Some(request_id) = req.header("x-request-id") {
        response.set_header("x-request-id", request_id);
    }
    middleware.run_after(req, &mut response);
    response
}

async fn dispatch(req: &mut HttpRequest, router: &Router, handlers: &[Handler]) -> HttpResponse {
    let result = match router.match_route(req.method, &req.path) {
        Ok(matched) => {
            req.typed_params.clone_from(&matched.typed_params);
            match handlers.get(matched.handler_id) {
                Some(handler) => handler(&*req, &matched).await,
                None => Err(Error::RouteNotFound {
                    path: req.path.clone(),
                }),
            }
        }
        Err(e) => Err(e),
    };

    result.unwrap_or_else(|e| {
        if e.is_server_error() {
            error!(
                method = %req.method,
                path = %req.path,
                request_id = req.header("x-request-id").unwrap_or("-"),
                "Request failed: {}", e
            );
        }
        HttpResponse::from_error(&e)
    })
}

async fn handle_request(
    req: Request<hyper::body::Incoming>,
    router: &Router,
    handlers: &[Handler],
    middleware: &MiddlewareChain,
    remote_addr: SocketAddr,
    max_body_size: usize,
) -> Response<Full<Bytes>> {
    let mut request = match HttpRequest::from_hyper_with_limit(req, max_body_size).await {
        Ok(r) => r,
        Err(e) => {
            if e.is_server_error() {
                error!("Failed to read request: {}", e);
            }
            return HttpResponse::from_error(&e).into_hyper();
        }
    };

    request.set_header("x-client-ip", &remote_addr.ip().to_string());
    process_request(&mut request, router, handlers, middleware)
        .await
        .into_hyper()
}

static REQUEST_COUNTER: AtomicUsize = AtomicUsize::new(1);

fn generate_request_id() -> String {
    use std::time::{SystemTime, UNIX_EPOCH};
    let now = SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .unwrap_or_default();
    let counter = REQUEST_COUNTER.fetch_add(1, Ordering::Relaxed);
    format!("{:x}-{:x}", now.as_nanos(), counter)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::document::DocumentId;
    use crate::middleware::TimingMiddleware;
    use std::time::Instant;

    fn ping_server() -> Server {
        let mut server = Server::new(ServerConfig::default());
        server
            .add_route(
                Method::Get,
                "/ping",
                handler(|_req, _m| async { Ok(HttpResponse::json(r#"{"pong":true}"#)) }),
            )
            .unwrap();
        server
            .add_route(
                Method::Get,
                "/things/{thing_id:id}",
                handler(|_req, m| {
                    let id = m.id("thing_id");
                    async move { HttpResponse::ok(&id?.to_string()) }
                }),
            )
            .unwrap();
        server
    }

    #[test]
    fn test_http_response_json() {
        let resp = HttpResponse::json(r#"{"status": "ok"}"#);
        assert_eq!(resp.status, 200);
        assert_eq!(resp.content_type, "application/json");
    }

    #[test]
    fn test_http_response_from_error() {
        let resp = HttpResponse::from_error(&Error::NotFound { resource: "Book" });
        assert_eq!(resp.status, 404);
        assert_eq!(resp.body, r#"{"detail":"Book not found"}"#);
    }

    #[test]
    fn test_http_response_headers() {
        let resp = HttpResponse::default()
            .with_header("X-Request-Id", "abc")
            .with_header("Content-Type", "text/plain");
        assert_eq!(resp.header("x-request-id"), Some("abc"));
        assert_eq!(resp.content_type, "text/plain");
    }

    #[test]
    fn test_server_config_default() {
        let config = ServerConfig::default();
        assert_eq!(config.address.port(), 8000);
        assert!(config.keep_alive);
        assert_eq!(config.max_body_size, 1024 * 1024);
    }

    #[tokio::test]
    async fn test_request_dispatch_and_request_id() {
        let server = ping_server();
        let resp = server
            .test_request(Method::Get, "/ping", HashMap::new(), None)
            .await;
        assert_eq!(resp.status, 200);
        assert_eq!(resp.body, r#"{"pong":true}"#);
        assert!(resp.header("x-request-id").is_some());

        let mut headers = HashMap::new();
        headers.insert("x-request-id".to_string(), "req-42".to_string());
        let resp = server.test_request(Method::Get, "/ping", headers, None).await;
        assert_eq!(resp.header("x-request-id"), Some("req-42"));
    }

    #[tokio::test]
    async fn test_request_routing_errors() {
        let server = ping_server();

        let resp = server
            .test_request(Method::Get, "/missing", HashMap::new(), None)
            .await;
        assert_eq!(resp.status, 404);

        let resp = server
            .test_request(Method::Post, "/ping", HashMap::new(), None)
            .await;
        assert_eq!(resp.status, 405);

        let resp = server
            .test_request(Method::Get, "/things/nope", HashMap::new(), None)
            .await;
        assert_eq!(resp.status, 400);

        let id = DocumentId::generate();
        let resp = server
            .test_request(Method::Get, &format!("/things/{id}"), HashMap::new(), None)
            .await;
        assert_eq!(resp.status, 200);
        assert_eq!(resp.body, format!("\"{id}\""));
    }

    #[tokio::test]
    async fn test_request_payload_too_large() {
        let server = Server::new(ServerConfig {
            max_body_size: 4,
            ..ServerConfig::default()
        });
        let resp = server
            .test_request(
                Method::Post,
                "/ping",
                HashMap::new(),
                Some(Bytes::from_static(b"0123456789")),
            )
            .await;
        assert_eq!(resp.status, 413);
    }

    #[tokio::test]
    async fn test_serve_with_shutdown_stops() {
        let server = Server::new(ServerConfig {
            address: ([127, 0, 0, 1], 0).into(),
            ..ServerConfig::default()
        });
        let result = server.serve_with_shutdown(async {}).await;
        assert!(result.is_ok());
    }

    #[tokio::test]
    async fn test_accept_error_is_retried() {
        let started = Instant::now();
        let err = std::io::Error::from(std::io::ErrorKind::ConnectionAborted);
        assert!(accepted::<()>(Err(err)).await.is_none());
        assert!(started.elapsed() >= ACCEPT_BACKOFF);

        assert_eq!(accepted(Ok(7)).await, Some(7));
    }

    fn slow_server() -> Server {
        let mut server = Server::new(ServerConfig::default());
        server.add_middleware(TimingMiddleware::new());
        server
            .add_route(
                Method::Get,
                "/slow",
                handler(|_req, _m| async {
                    tokio::time::sleep(Duration::from_millis(50)).await;
                    Ok(HttpResponse::json("{}"))
                }),
            )
            .unwrap();
        server
    }

    #[test]
    fn test_timing_with_cancelled_and_concurrent_requests() {
        tokio_test::block_on(async {
            let server = slow_server();

            for _ in 0..20 {
                let request = server.test_request(Method::Get, "/slow", HashMap::new(), None);
                let cancelled = tokio::time::timeout(Duration::from_millis(1), request).await;
                assert!(cancelled.is_err());
            }

            let same_id = || {
                let mut headers = HashMap::new();
                headers.insert("x-request-id".to_string(), "same".to_string());
                headers
            };
            let (a, b) = tokio::join!(
                server.test_request(Method::Get, "/slow", same_id(), None),
                server.test_request(Method::Get, "/slow", same_id(), None),
            );
            for resp in [&a, &b] {
                assert_eq!(resp.status, 200);
                let ms: u128 = resp
                    .header("x-response-time-ms")
                    .and_then(|v| v.parse().ok())
                    .unwrap();
                assert!(ms >= 50);
            }
        });
    }
}
