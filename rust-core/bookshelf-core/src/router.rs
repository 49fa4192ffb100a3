//! # Router
//!
//! Radix-trie based router using `matchit`.
//!
//! ## Features
//!
//! - Path parameter extraction (`/books/{slug}`)
//! - Typed parameters (`/books/{book_id:id}`), rejected at match time when
//!   malformed
//! - Trailing-slash tolerant matching (`/books` finds `/books/`)
//! - 405 detection when a path exists under another method

use crate::document::DocumentId;
use crate::error::{Error, Result};
use crate::route::RouteInfo;
use crate::types::{convert_param, ParamValue};
use matchit::Router as MatchitRouter;
use std::collections::HashMap;

/// HTTP methods supported by the router
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Method {
    /// HTTP GET
    Get,
    /// HTTP POST
    Post,
    /// HTTP PUT
    Put,
    /// HTTP DELETE
    Delete,
    /// HTTP PATCH
    Patch,
    /// HTTP HEAD
    Head,
    /// HTTP OPTIONS
    Options,
}

impl Method {
    /// Map a hyper method; `None` for extension methods we never route
    #[must_use]
    pub fn from_hyper(method: &hyper::Method) -> Option<Self> {
        match *method {
            hyper::Method::GET => Some(Self::Get),
            hyper::Method::POST => Some(Self::Post),
            hyper::Method::PUT => Some(Self::Put),
            hyper::Method::DELETE => Some(Self::Delete),
            hyper::Method::PATCH => Some(Self::Patch),
            hyper::Method::HEAD => Some(Self::Head),
            hyper::Method::OPTIONS => Some(Self::Options),
            _ => None,
        }
    }
}

impl std::fmt::Display for Method {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Get => write!(f, "GET"),
            Self::Post => write!(f, "POST"),
            Self::Put => write!(f, "PUT"),
            Self::Delete => write!(f, "DELETE"),
            Self::Patch => write!(f, "PATCH"),
            Self::Head => write!(f, "HEAD"),
            Self::Options => write!(f, "OPTIONS"),
        }
    }
}

/// Route handler identifier
pub type HandlerId = usize;

/// Matched route with extracted and converted parameters
#[derive(Debug, Clone)]
pub struct Match {
    /// The handler ID for this route
    pub handler_id: HandlerId,
    /// Raw extracted path parameters
    pub params: HashMap<String, String>,
    /// Typed path parameters
    pub typed_params: HashMap<String, ParamValue>,
}

impl Match {
    /// Get a typed parameter by name
    #[must_use]
    pub fn get_typed(&self, name: &str) -> Option<&ParamValue> {
        self.typed_params.get(name)
    }

    /// Get an `{name:id}` parameter as a `DocumentId`
    ///
    /// # Errors
    ///
    /// Returns `Error::InvalidIdentifier` if the route did not declare the
    /// parameter as an id, or it is absent.
    pub fn id(&self, name: &str) -> Result<DocumentId> {
        self.get_typed(name)
            .and_then(ParamValue::as_id)
            .ok_or_else(|| Error::InvalidIdentifier {
                value: self.params.get(name).cloned().unwrap_or_default(),
                reason: format!("path parameter '{name}' is not an id"),
            })
    }
}

/// Per-method storage for routes
#[derive(Clone)]
struct MethodRoutes {
    /// Matchit router for path matching
    router: MatchitRouter<HandlerId>,
    /// Route metadata indexed by handler ID
    routes: Vec<RouteInfo>,
}

impl MethodRoutes {
    fn new() -> Self {
        Self {
            router: MatchitRouter::new(),
            routes: Vec::new(),
        }
    }

    /// Exact match, then the same path with its trailing slash toggled
    fn lookup(&self, path: &str) -> Option<(&RouteInfo, HashMap<String, String>)> {
        let toggled = match path.strip_suffix('/') {
            Some(stripped) if !stripped.is_empty() => stripped.to_string(),
            Some(_) => return self.lookup_exact(path),
            None => format!("{path}/"),
        };
        self.lookup_exact(path).or_else(|| self.lookup_exact(&toggled))
    }

    fn lookup_exact(&self, path: &str) -> Option<(&RouteInfo, HashMap<String, String>)> {
        let matched = self.router.at(path).ok()?;
        let handler_id = *matched.value;
        let info = self.routes.iter().find(|r| r.handler_id == handler_id)?;
        let params = matched
            .params
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        Some((info, params))
    }
}

/// HTTP router using radix trie
#[derive(Clone, Default)]
pub struct Router {
    /// Per-method routers for efficient matching
    method_routes: HashMap<Method, MethodRoutes>,
    /// Counter for generating handler IDs
    next_handler_id: HandlerId,
}

impl Router {
    /// Create a new empty router
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a route with the given method and path pattern
    ///
    /// Supports typed parameters: `/books/{book_id:id}`
    ///
    /// # Returns
    ///
    /// The handler ID assigned to this route. IDs are assigned sequentially
    /// across all methods, starting at 0.
    ///
    /// # Errors
    ///
    /// Returns `Error::InvalidRoutePattern` if the pattern is malformed or
    /// conflicts with an existing route.
    pub fn add_route(&mut self, method: Method, path: &str) -> Result<HandlerId> {
        let handler_id = self.next_handler_id;

        let route_info = RouteInfo::new(handler_id, path);
        let match_pattern = route_info.match_pattern.clone();

        let method_routes = self
            .method_routes
            .entry(method)
            .or_insert_with(MethodRoutes::new);

        method_routes
            .router
            .insert(match_pattern, handler_id)
            .map_err(|e| Error::InvalidRoutePattern {
                pattern: path.to_string(),
                reason: e.to_string(),
            })?;

        method_routes.routes.push(route_info);
        self.next_handler_id += 1;

        Ok(handler_id)
    }

    /// Match a request path against registered routes
    ///
    /// # Errors
    ///
    /// - `Error::RouteNotFound` if no route matches the path under any method
    /// - `Error::MethodNotAllowed` if the path matches under another method
    /// - `Error::InvalidIdentifier` if a typed parameter fails to convert
    pub fn match_route(&self, method: Method, path: &str) -> Result<Match> {
        let Some((route_info, params)) = self
            .method_routes
            .get(&method)
            .and_then(|routes| routes.lookup(path))
        else {
            let other_method = self
                .method_routes
                .iter()
                .any(|(m, routes)| *m != method && routes.lookup(path).is_some());
            return Err(if other_method {
                Error::MethodNotAllowed {
                    method: method.to_string(),
                    path: path.to_string(),
                }
            } else {
                Error::RouteNotFound {
                    path: path.to_string(),
                }
            });
        };

        let mut typed_params = HashMap::with_capacity(params.len());
        for (name, value) in &params {
            let typed_value = convert_param(value, route_info.get_param_type(name))?;
            typed_params.insert(name.clone(), typed_value);
        }

        Ok(Match {
            handler_id: route_info.handler_id,
            params,
            typed_params,
        })
    }
}
