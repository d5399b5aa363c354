//! Page identity for page-scoped variables.

use std::fmt;

/// Identity of the page serving the current request.
///
/// Used as the namespace for page-scoped operations called without an
/// explicit page. Built once per request by the host.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct PageId(String);

impl PageId {
    /// Use `page` verbatim.
    pub fn new(page: impl Into<String>) -> Self {
        Self(page.into())
    }

    /// Derive the page identity from a raw request target.
    ///
    /// Drops the query string and fragment and guarantees a leading `/`,
    /// so `/cart?item=3` and `/cart#summary` share one page namespace.
    pub fn from_request_path(target: &str) -> Self {
        let end = target.find(['?', '#']).unwrap_or(target.len());
        let path = &target[..end];

        if path.starts_with('/') {
            Self(path.to_string())
        } else {
            Self(format!("/{}", path))
        }
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for PageId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl AsRef<str> for PageId {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

impl From<&str> for PageId {
    fn from(page: &str) -> Self {
        Self::new(page)
    }
}

impl From<String> for PageId {
    fn from(page: String) -> Self {
        Self(page)
    }
}
