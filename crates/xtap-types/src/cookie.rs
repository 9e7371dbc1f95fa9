use serde::{Deserialize, Serialize};
use std::fmt;

/// Ordered set of cookie sub-values.
///
/// Keeps the order in which names were first seen so the serialized
/// composite is stable across merges.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CookieMap {
    pairs: Vec<(String, String)>,
}

impl CookieMap {
    pub fn new() -> Self {
        Self::default()
    }

    /// Parse a `Cookie` header value (`a=1; b=2`).
    ///
    /// Segments without `=` are ignored. Names and values are trimmed; a value
    /// may itself contain `=`.
    pub fn parse(header: &str) -> Self {
        let mut map = Self::new();
        for segment in header.split(';') {
            if let Some((name, value)) = segment.split_once('=') {
                let name = name.trim();
                if name.is_empty() {
                    continue;
                }
                map.set(name, value.trim());
            }
        }
        map
    }

    pub fn get(&self, name: &str) -> Option<&str> {
        self.pairs
            .iter()
            .find(|(k, _)| k == name)
            .map(|(_, v)| v.as_str())
    }

    pub fn contains(&self, name: &str) -> bool {
        self.get(name).is_some()
    }

    /// Insert or replace a sub-value, keeping its original position
    pub fn set(&mut self, name: &str, value: &str) {
        match self.pairs.iter_mut().find(|(k, _)| k == name) {
            Some((_, existing)) => *existing = value.to_string(),
            None => self.pairs.push((name.to_string(), value.to_string())),
        }
    }

    /// Names from `required` that are not present
    pub fn missing<'a, S: AsRef<str>>(&self, required: &'a [S]) -> Vec<&'a str> {
        required
            .iter()
            .map(|s| s.as_ref())
            .filter(|name| !self.contains(name))
            .collect()
    }

    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.pairs.iter().map(|(k, _)| k.as_str())
    }

    pub fn len(&self) -> usize {
        self.pairs.len()
    }

    pub fn is_empty(&self) -> bool {
        self.pairs.is_empty()
    }
}

impl fmt::Display for CookieMap {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (idx, (name, value)) in self.pairs.iter().enumerate() {
            if idx > 0 {
                f.write_str("; ")?;
            }
            write!(f, "{}={}", name, value)?;
        }
        Ok(())
    }
}

/// Name and value of a single `Set-Cookie` directive (attributes dropped)
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SetCookie {
    pub name: String,
    pub value: String,
}

/// Parse a `Set-Cookie` directive.
///
/// The value is cut at the first attribute delimiter, so
/// `gt=123; Max-Age=9000; Domain=.x.com` yields `gt` / `123`.
pub fn parse_set_cookie(directive: &str) -> Option<SetCookie> {
    let (name, rest) = directive.split_once('=')?;
    let name = name.trim();
    if name.is_empty() {
        return None;
    }
    let value = rest.split(';').next().unwrap_or_default().trim();
    Some(SetCookie {
        name: name.to_string(),
        value: value.to_string(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_cookie_header() {
        let map = CookieMap::parse("auth_token=abc; ct0=def;gt=123 ; junk; =empty");
        assert_eq!(map.len(), 3);
        assert_eq!(map.get("auth_token"), Some("abc"));
        assert_eq!(map.get("ct0"), Some("def"));
        assert_eq!(map.get("gt"), Some("123"));
        assert!(!map.contains("junk"));
    }

    #[test]
    fn test_value_may_contain_equals() {
        let map = CookieMap::parse("twid=u%3D42; kdt=a=b=c");
        assert_eq!(map.get("kdt"), Some("a=b=c"));
    }

    #[test]
    fn test_set_replaces_in_place() {
        let mut map = CookieMap::parse("a=1; gt=old; b=2");
        map.set("gt", "new");
        map.set("c", "3");
        assert_eq!(map.to_string(), "a=1; gt=new; b=2; c=3");
    }

    #[test]
    fn test_display_round_trips_through_parse() {
        let map = CookieMap::parse("auth_token=abc; ct0=def; gt=123");
        assert_eq!(CookieMap::parse(&map.to_string()), map);
    }

    #[test]
    fn test_missing_reports_absent_names() {
        let map = CookieMap::parse("auth_token=abc");
        assert_eq!(map.missing(&["auth_token", "ct0", "gt"]), vec!["ct0", "gt"]);
    }

    #[test]
    fn test_parse_set_cookie() {
        let cookie = parse_set_cookie("gt=1866; Max-Age=10800; Domain=.x.com; Path=/; Secure").unwrap();
        assert_eq!(cookie.name, "gt");
        assert_eq!(cookie.value, "1866");

        let bare = parse_set_cookie(" guest_id = v1%3A17 ").unwrap();
        assert_eq!(bare.name, "guest_id");
        assert_eq!(bare.value, "v1%3A17");

        assert!(parse_set_cookie("no-delimiter").is_none());
        assert!(parse_set_cookie("=orphan").is_none());
    }
}
