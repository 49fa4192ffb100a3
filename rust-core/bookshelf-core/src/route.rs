//! # Route Metadata
//!
//! Holds what the router needs to know about one registered route: the
//! pattern as written, the pattern matchit understands, and parameter types.

use crate::router::HandlerId;
use crate::types::ParamType;
use std::collections::HashMap;

/// Route metadata containing handler and type information
#[derive(Debug, Clone)]
pub struct RouteInfo {
    /// Unique handler identifier
    pub handler_id: HandlerId,
    /// Original path pattern (e.g., "/books/{book_id:id}")
    pub path_pattern: String,
    /// Normalized path for matchit (e.g., "/books/{book_id}")
    pub match_pattern: String,
    /// Parameter name to type mapping
    pub param_types: HashMap<String, ParamType>,
}

impl RouteInfo {
    /// Create a new `RouteInfo` from a path pattern
    ///
    /// Parses the pattern to extract parameter types and creates
    /// a normalized pattern for matchit routing.
    #[must_use]
    pub fn new(handler_id: HandlerId, path: &str) -> Self {
        let (match_pattern, param_types) = Self::parse_path_pattern(path);

        Self {
            handler_id,
            path_pattern: path.to_string(),
            match_pattern,
            param_types,
        }
    }

    /// Converts `{name:type}` to `{name}` for matchit and builds the
    /// `param_types` map. A trailing slash is kept.
    fn parse_path_pattern(path: &str) -> (String, HashMap<String, ParamType>) {
        let mut param_types = HashMap::new();
        let mut normalized_parts = Vec::new();

        for segment in path.split('/') {
            if segment.is_empty() {
                continue;
            }

            if let Some((name, param_type)) = crate::types::parse_param_pattern(segment) {
                param_types.insert(name.clone(), param_type);
                normalized_parts.push(format!("{{{name}}}"));
            } else {
                normalized_parts.push(segment.to_string());
            }
        }

        let normalized = if normalized_parts.is_empty() {
            "/".to_string()
        } else if path.ends_with('/') {
            format!("/{}/", normalized_parts.join("/"))
        } else {
            format!("/{}", normalized_parts.join("/"))
        };

        (normalized, param_types)
    }

    /// Get the type for a parameter by name
    ///
    /// Returns `ParamType::String` if parameter not found
    #[must_use]
    pub fn get_param_type(&self, name: &str) -> ParamType {
        self.param_types.get(name).copied().unwrap_or_default()
    }
}
