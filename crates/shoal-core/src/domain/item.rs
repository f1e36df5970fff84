//! Item - fetch 結果と、その取得元アドレス（Source）

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Where an item is fetched from (URL, path, ...). Opaque to the core.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Source(String);

impl Source {
    pub fn new(s: impl Into<String>) -> Self {
        Self(s.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for Source {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.0.fmt(f)
    }
}

impl From<&str> for Source {
    fn from(s: &str) -> Self {
        Self::new(s)
    }
}

impl From<String> for Source {
    fn from(s: String) -> Self {
        Self(s)
    }
}

/// A value produced by a successful fetch.
///
/// Identity is the source address; content is the decoded payload.
/// Items are never mutated after construction, so the store can hand out
/// shared references freely.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Item {
    source: Source,
    payload: Vec<u8>,
    fetched_at: DateTime<Utc>,
}

impl Item {
    pub fn new(source: Source, payload: Vec<u8>) -> Self {
        Self::with_fetched_at(source, payload, Utc::now())
    }

    pub fn with_fetched_at(source: Source, payload: Vec<u8>, fetched_at: DateTime<Utc>) -> Self {
        Self {
            source,
            payload,
            fetched_at,
        }
    }

    pub fn source(&self) -> &Source {
        &self.source
    }

    pub fn payload(&self) -> &[u8] {
        &self.payload
    }

    pub fn fetched_at(&self) -> DateTime<Utc> {
        self.fetched_at
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn source_displays_its_address() {
        let source = Source::from("https://i.imgur.com/UvqEgCv.png");
        assert_eq!(source.to_string(), "https://i.imgur.com/UvqEgCv.png");
        assert_eq!(source.as_str(), "https://i.imgur.com/UvqEgCv.png");
    }

    #[test]
    fn item_keeps_source_and_payload() {
        let at = Utc::now();
        let item = Item::with_fetched_at(Source::new("a.png"), vec![1, 2, 3], at);
        assert_eq!(item.source().as_str(), "a.png");
        assert_eq!(item.payload(), &[1, 2, 3]);
        assert_eq!(item.fetched_at(), at);
    }
}
