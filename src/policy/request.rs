//! Intercepted-request descriptor

use hyper::Uri;

/// Information about an intercepted request, supplied by the proxy engine
/// before any bytes are forwarded.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RequestInfo<'a> {
    pub method: &'a str,
    pub scheme: &'a str,
    pub host: &'a str,
    pub port: Option<u16>,
    pub path: &'a str,
    pub query: Option<&'a str>,
}

impl<'a> RequestInfo<'a> {
    /// Create a new RequestInfo from its components
    pub fn new(
        method: &'a str,
        scheme: &'a str,
        host: &'a str,
        port: Option<u16>,
        path: &'a str,
        query: Option<&'a str>,
    ) -> Self {
        Self {
            method,
            scheme,
            host,
            port,
            path,
            query,
        }
    }

    /// Build a descriptor from an absolute-form request URI.
    ///
    /// Missing components are left empty rather than rejected: a URI without
    /// an authority yields an empty host, which no allow-list entry matches.
    pub fn from_uri(method: &'a str, uri: &'a Uri) -> Self {
        let path = match uri.path() {
            "" => "/",
            p => p,
        };
        Self {
            method,
            scheme: uri.scheme_str().unwrap_or("http"),
            host: uri.host().unwrap_or(""),
            port: uri.port_u16(),
            path,
            query: uri.query(),
        }
    }

    /// Get the full URL for logging
    pub fn full_url(&self) -> String {
        let port_str = match (self.scheme, self.port) {
            ("https", Some(443)) | ("https", None) => String::new(),
            ("http", Some(80)) | ("http", None) => String::new(),
            (_, Some(p)) => format!(":{}", p),
            (_, None) => String::new(),
        };

        match self.query {
            Some(q) => format!(
                "{}://{}{}{}?{}",
                self.scheme, self.host, port_str, self.path, q
            ),
            None => format!("{}://{}{}{}", self.scheme, self.host, port_str, self.path),
        }
    }
}
