//! Cache Key Module
//!
//! Structured cache keys and the patterns used to invalidate them.
//!
//! Keys are rendered as `{resource}:{params}`, so every key for a given
//! resource shares a common prefix. Invalidation after a write to a resource
//! matches on that structural prefix rather than an ad hoc regex.

use std::fmt;

// == Cache Key ==
/// Structured cache key: the resource a query targets plus a deterministic
/// encoding of the query parameters.
///
/// Two queries with identical resource and parameters render to the same key;
/// any parameter change renders to a different key.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct CacheKey {
    resource: String,
    params: String,
}

impl CacheKey {
    /// Creates a key for `resource` with an already-encoded parameter string.
    pub fn new(resource: impl Into<String>, params: impl Into<String>) -> Self {
        Self {
            resource: resource.into(),
            params: params.into(),
        }
    }

    /// The resource this key belongs to.
    pub fn resource(&self) -> &str {
        &self.resource
    }

    /// Renders the key to its string form, `{resource}:{params}`.
    pub fn render(&self) -> String {
        format!("{}:{}", self.resource, self.params)
    }
}

impl fmt::Display for CacheKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.resource, self.params)
    }
}

// == Key Pattern ==
/// Pattern for coarse cache invalidation.
///
/// Only prefix and substring matching are supported; resource-level
/// invalidation uses [`KeyPattern::resource`], which anchors on the
/// `{resource}:` prefix every structured key starts with.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum KeyPattern {
    /// Matches keys that start with the given string
    Prefix(String),
    /// Matches keys that contain the given string anywhere
    Contains(String),
}

impl KeyPattern {
    /// Pattern matching every key belonging to `resource`.
    pub fn resource(resource: &str) -> Self {
        KeyPattern::Prefix(format!("{}:", resource))
    }

    /// Checks whether a rendered key matches this pattern.
    pub fn matches(&self, key: &str) -> bool {
        match self {
            KeyPattern::Prefix(prefix) => key.starts_with(prefix.as_str()),
            KeyPattern::Contains(needle) => key.contains(needle.as_str()),
        }
    }
}

// == Unit Tests ==
#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_key_render() {
        let key = CacheKey::new("orders", "p1:s10");
        assert_eq!(key.render(), "orders:p1:s10");
        assert_eq!(key.to_string(), "orders:p1:s10");
        assert_eq!(key.resource(), "orders");
    }

    #[test]
    fn test_identical_params_identical_key() {
        let a = CacheKey::new("orders", "p2:s10");
        let b = CacheKey::new("orders", "p2:s10");
        assert_eq!(a, b);
        assert_eq!(a.render(), b.render());
    }

    #[test]
    fn test_different_params_different_key() {
        let a = CacheKey::new("orders", "p2:s10");
        let b = CacheKey::new("orders", "p3:s10");
        assert_ne!(a.render(), b.render());
    }

    #[test]
    fn test_resource_pattern_matches_own_prefix() {
        let pattern = KeyPattern::resource("orders");
        assert!(pattern.matches("orders:p1:s10"));
        assert!(!pattern.matches("suppliers:p1:s10"));
        // "ordersextra" must not match: the pattern anchors on "orders:"
        assert!(!pattern.matches("ordersextra:p1:s10"));
    }

    #[test]
    fn test_contains_pattern() {
        let pattern = KeyPattern::Contains("s10".to_string());
        assert!(pattern.matches("orders:p1:s10"));
        assert!(pattern.matches("suppliers:p2:s10"));
        assert!(!pattern.matches("fabrics:p1:s25"));
    }
}
