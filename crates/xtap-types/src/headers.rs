use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Header list with case-insensitive lookup.
///
/// Names are lowercased on insert. Repeated headers (`set-cookie`) are kept
/// in arrival order.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(from = "HeaderList", into = "Vec<(String, String)>")]
pub struct HeaderMap {
    entries: Vec<(String, String)>,
}

impl HeaderMap {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn append(&mut self, name: &str, value: impl Into<String>) {
        self.entries
            .push((name.trim().to_ascii_lowercase(), value.into()));
    }

    /// First value for `name`
    pub fn get(&self, name: &str) -> Option<&str> {
        let name = name.to_ascii_lowercase();
        self.entries
            .iter()
            .find(|(k, _)| *k == name)
            .map(|(_, v)| v.as_str())
    }

    /// All values for `name`, in arrival order
    pub fn get_all<'a>(&'a self, name: &'a str) -> impl Iterator<Item = &'a str> + 'a {
        let name = name.to_ascii_lowercase();
        self.entries
            .iter()
            .filter(move |(k, _)| *k == name)
            .map(|(_, v)| v.as_str())
    }

    pub fn contains(&self, name: &str) -> bool {
        self.get(name).is_some()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.entries.iter().map(|(k, v)| (k.as_str(), v.as_str()))
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// JSON object for the raw call log; repeated names keep the last value
    pub fn to_json(&self) -> serde_json::Value {
        let map: BTreeMap<&str, &str> = self.iter().collect();
        serde_json::json!(map)
    }
}

impl<K: AsRef<str>, V: Into<String>> FromIterator<(K, V)> for HeaderMap {
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        let mut map = HeaderMap::new();
        for (k, v) in iter {
            map.append(k.as_ref(), v);
        }
        map
    }
}

/// Wire shapes accepted when deserializing: a list of pairs or a plain object
#[derive(Deserialize)]
#[serde(untagged)]
enum HeaderList {
    Pairs(Vec<(String, String)>),
    Object(BTreeMap<String, String>),
}

impl From<HeaderList> for HeaderMap {
    fn from(list: HeaderList) -> Self {
        match list {
            HeaderList::Pairs(pairs) => pairs.into_iter().collect(),
            HeaderList::Object(map) => map.into_iter().collect(),
        }
    }
}

impl From<HeaderMap> for Vec<(String, String)> {
    fn from(map: HeaderMap) -> Self {
        map.entries
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_lookup_is_case_insensitive() {
        let headers: HeaderMap = [("Authorization", "Bearer AAA"), ("X-Csrf-Token", "c1")]
            .into_iter()
            .collect();
        assert_eq!(headers.get("authorization"), Some("Bearer AAA"));
        assert_eq!(headers.get("x-csrf-token"), Some("c1"));
        assert_eq!(headers.get("X-CSRF-TOKEN"), Some("c1"));
        assert!(!headers.contains("cookie"));
    }

    #[test]
    fn test_repeated_headers_are_kept() {
        let headers: HeaderMap = [
            ("Set-Cookie", "gt=1; Path=/"),
            ("content-type", "application/json"),
            ("set-cookie", "guest_id=v1; Path=/"),
        ]
        .into_iter()
        .collect();
        let cookies: Vec<&str> = headers.get_all("set-cookie").collect();
        assert_eq!(cookies, vec!["gt=1; Path=/", "guest_id=v1; Path=/"]);
    }

    #[test]
    fn test_deserialize_object_and_pairs() {
        let from_object: HeaderMap =
            serde_json::from_str(r#"{"Cookie": "a=1", "Authorization": "Bearer x"}"#).unwrap();
        assert_eq!(from_object.get("cookie"), Some("a=1"));

        let from_pairs: HeaderMap =
            serde_json::from_str(r#"[["Set-Cookie", "a=1"], ["set-cookie", "b=2"]]"#).unwrap();
        assert_eq!(from_pairs.get_all("set-cookie").count(), 2);
    }
}
