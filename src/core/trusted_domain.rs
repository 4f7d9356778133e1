//! Trusted Domains
//!
//! Allow-list checks for redirect targets.

use std::collections::HashSet;
use std::sync::Mutex;
use url::Url;

/// Answers whether an absolute URI points at a trusted host.
pub trait TrustedDomainResolver: Send + Sync {
    fn is_trusted_domain(&self, uri: &Url) -> bool;
}

/// Allow-list of hosts, compared case-insensitively.
#[derive(Clone, Debug, Default)]
pub struct AllowListDomainResolver {
    hosts: HashSet<String>,
    allow_subdomains: bool,
    require_https: bool,
}

impl AllowListDomainResolver {
    /// Create a resolver trusting exactly these hosts.
    pub fn new<I, S>(hosts: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        Self {
            hosts: hosts
                .into_iter()
                .map(|h| h.as_ref().trim().trim_end_matches('.').to_ascii_lowercase())
                .filter(|h| !h.is_empty())
                .collect(),
            allow_subdomains: false,
            require_https: false,
        }
    }

    /// Also trust any subdomain of a listed host.
    pub fn allow_subdomains(mut self, allow: bool) -> Self {
        self.allow_subdomains = allow;
        self
    }

    /// Only trust `https` URIs.
    pub fn require_https(mut self, require: bool) -> Self {
        self.require_https = require;
        self
    }

    fn host_matches(&self, host: &str) -> bool {
        if self.hosts.contains(host) {
            return true;
        }
        self.allow_subdomains
            && self.hosts.iter().any(|trusted| {
                host.len() > trusted.len()
                    && host.ends_with(trusted.as_str())
                    && host.as_bytes()[host.len() - trusted.len() - 1] == b'.'
            })
    }
}

impl TrustedDomainResolver for AllowListDomainResolver {
    fn is_trusted_domain(&self, uri: &Url) -> bool {
        match uri.scheme() {
            "https" => {}
            "http" if !self.require_https => {}
            _ => return false,
        }

        match uri.host_str() {
            Some(host) => {
                let host = host.trim_end_matches('.').to_ascii_lowercase();
                self.host_matches(&host)
            }
            None => false,
        }
    }
}

/// Mock resolver for testing.
pub struct MockTrustedDomainResolver {
    trusted: bool,
    history: Mutex<Vec<Url>>,
}

impl MockTrustedDomainResolver {
    /// Create a resolver answering `trusted` for every URI.
    pub fn new(trusted: bool) -> Self {
        Self {
            trusted,
            history: Mutex::new(Vec::new()),
        }
    }

    /// URIs checked so far.
    pub fn get_history(&self) -> Vec<Url> {
        self.history.lock().unwrap().clone()
    }
}

impl TrustedDomainResolver for MockTrustedDomainResolver {
    fn is_trusted_domain(&self, uri: &Url) -> bool {
        self.history.lock().unwrap().push(uri.clone());
        self.trusted
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn url(s: &str) -> Url {
        Url::parse(s).unwrap()
    }

    #[test]
    fn test_exact_hosts() {
        let resolver = AllowListDomainResolver::new(["App.Example.com", "localhost"]);

        assert!(resolver.is_trusted_domain(&url("https://app.example.com/a?b=c")));
        assert!(resolver.is_trusted_domain(&url("http://LOCALHOST:5000/a/b")));
        assert!(!resolver.is_trusted_domain(&url("https://evil.com/?next=app.example.com")));
        assert!(!resolver.is_trusted_domain(&url("https://sub.app.example.com/")));
    }

    #[test]
    fn test_subdomains() {
        let resolver = AllowListDomainResolver::new(["example.com"]).allow_subdomains(true);

        assert!(resolver.is_trusted_domain(&url("https://app.example.com/")));
        assert!(resolver.is_trusted_domain(&url("https://example.com/")));
        assert!(!resolver.is_trusted_domain(&url("https://badexample.com/")));
    }

    #[test]
    fn test_scheme_rules() {
        let resolver = AllowListDomainResolver::new(["example.com"]);
        assert!(!resolver.is_trusted_domain(&url("javascript://example.com/%0aalert(1)")));
        assert!(!resolver.is_trusted_domain(&url("ftp://example.com/")));

        let resolver = resolver.require_https(true);
        assert!(!resolver.is_trusted_domain(&url("http://example.com/")));
        assert!(resolver.is_trusted_domain(&url("https://example.com/")));
    }

    #[test]
    fn test_mock_records_history() {
        let resolver = MockTrustedDomainResolver::new(false);
        assert!(!resolver.is_trusted_domain(&url("http://localhost/a/b")));
        assert_eq!(resolver.get_history().len(), 1);
    }
}
