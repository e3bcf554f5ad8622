//! Request context
//!
//! Query parameters and headers of an inbound request, reduced to their first
//! value per name.

use hyper::header::{HeaderMap, ORIGIN};
use hyper::Uri;
use std::collections::HashMap;

/// First-value view of the request inputs the resolver reads
#[derive(Debug, Clone, Default)]
pub struct RequestContext {
    query: HashMap<String, String>,
    /// Keyed by lowercase header name
    headers: HashMap<String, String>,
}

impl RequestContext {
    /// Build the context from a request URI and header map
    ///
    /// Query values are percent-decoded. A bare key without `=` carries no
    /// value and is treated as absent. Headers whose value is not valid
    /// visible ASCII are treated as absent.
    pub fn from_parts(uri: &Uri, headers: &HeaderMap) -> Self {
        let mut query = HashMap::new();
        if let Some(raw) = uri.query() {
            for pair in raw.split('&').filter(|pair| pair.contains('=')) {
                for (name, value) in url::form_urlencoded::parse(pair.as_bytes()) {
                    query
                        .entry(name.into_owned())
                        .or_insert_with(|| value.into_owned());
                }
            }
        }

        let mut header_values = HashMap::new();
        for name in headers.keys() {
            // HeaderMap::get returns the first value for repeated headers
            if let Some(value) = headers.get(name).and_then(|v| v.to_str().ok()) {
                header_values.insert(name.as_str().to_string(), value.to_string());
            }
        }

        Self {
            query,
            headers: header_values,
        }
    }

    pub fn query(&self, name: &str) -> Option<&str> {
        self.query.get(name).map(String::as_str)
    }

    /// Header lookup, case-insensitive on the name
    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers
            .get(&name.to_ascii_lowercase())
            .map(String::as_str)
    }

    /// `Origin` header, only when non-empty
    pub fn origin(&self) -> Option<&str> {
        self.header(ORIGIN.as_str()).filter(|v| !v.is_empty())
    }

    #[cfg(test)]
    pub fn with_query(mut self, name: &str, value: &str) -> Self {
        self.query.insert(name.to_string(), value.to_string());
        self
    }

    #[cfg(test)]
    pub fn with_header(mut self, name: &str, value: &str) -> Self {
        self.headers
            .insert(name.to_ascii_lowercase(), value.to_string());
        self
    }
}
