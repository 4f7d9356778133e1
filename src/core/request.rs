//! Request Context
//!
//! The slice of the current HTTP request the token helpers need.

use std::collections::HashMap;
use url::Url;

use crate::core::HttpMethod;
use crate::types::CookieOptions;

/// Current request as seen by the token helpers.
///
/// Cookie reads see the incoming request; writes and deletes are queued for the
/// response. Implementations reflect their own writes in later reads.
pub trait RequestContext: Send + Sync {
    /// Request method.
    fn method(&self) -> HttpMethod;

    /// Absolute URL of the current request.
    fn absolute_url(&self) -> &Url;

    /// First query parameter with this name.
    fn query_param(&self, name: &str) -> Option<String> {
        self.absolute_url()
            .query_pairs()
            .find(|(key, _)| key == name)
            .map(|(_, value)| value.into_owned())
    }

    /// Cookie value by name.
    fn cookie(&self, name: &str) -> Option<String>;

    /// Write a cookie to the response.
    fn set_cookie(&mut self, name: &str, value: String, options: CookieOptions);

    /// Expire a cookie on the response.
    fn delete_cookie(&mut self, name: &str);
}

/// Cookie write recorded by [`InMemoryRequestContext`].
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum CookieWrite {
    Set {
        name: String,
        value: String,
        options: CookieOptions,
    },
    Delete {
        name: String,
    },
}

/// In-memory request context.
///
/// Useful as an adapter target for web frameworks and as the fake in tests:
/// it keeps every cookie write in order.
pub struct InMemoryRequestContext {
    method: HttpMethod,
    url: Url,
    cookies: HashMap<String, String>,
    writes: Vec<CookieWrite>,
}

impl InMemoryRequestContext {
    /// Create a context for a request.
    pub fn new(method: HttpMethod, url: Url) -> Self {
        Self {
            method,
            url,
            cookies: HashMap::new(),
            writes: Vec::new(),
        }
    }

    /// Create a `GET` context for an absolute URL string.
    pub fn get(url: &str) -> Result<Self, url::ParseError> {
        Ok(Self::new(HttpMethod::Get, Url::parse(url)?))
    }

    /// Add an incoming cookie.
    pub fn with_cookie(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.cookies.insert(name.into(), value.into());
        self
    }

    /// Start the next request of the same client: keep the cookie jar, change
    /// the method and URL, forget the recorded writes.
    pub fn next_request(&mut self, method: HttpMethod, url: Url) {
        self.method = method;
        self.url = url;
        self.writes.clear();
    }

    /// Cookie writes in the order they were made.
    pub fn writes(&self) -> &[CookieWrite] {
        &self.writes
    }

    /// Names of cookies currently in the jar.
    pub fn cookie_names(&self) -> Vec<String> {
        let mut names: Vec<String> = self.cookies.keys().cloned().collect();
        names.sort();
        names
    }

    /// Options of the last write to a cookie, if it was a set.
    pub fn last_set_options(&self, name: &str) -> Option<&CookieOptions> {
        self.writes.iter().rev().find_map(|write| match write {
            CookieWrite::Set {
                name: n, options, ..
            } if n == name => Some(options),
            _ => None,
        })
    }
}

impl RequestContext for InMemoryRequestContext {
    fn method(&self) -> HttpMethod {
        self.method
    }

    fn absolute_url(&self) -> &Url {
        &self.url
    }

    fn cookie(&self, name: &str) -> Option<String> {
        self.cookies.get(name).cloned()
    }

    fn set_cookie(&mut self, name: &str, value: String, options: CookieOptions) {
        self.cookies.insert(name.to_string(), value.clone());
        self.writes.push(CookieWrite::Set {
            name: name.to_string(),
            value,
            options,
        });
    }

    fn delete_cookie(&mut self, name: &str) {
        self.cookies.remove(name);
        self.writes.push(CookieWrite::Delete {
            name: name.to_string(),
        });
    }
}
