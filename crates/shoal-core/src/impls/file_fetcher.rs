//! FileFetcher - ローカルファイルを読む Fetcher

use std::path::PathBuf;

use async_trait::async_trait;

use crate::domain::{FetchError, Item, Source};
use crate::ports::Fetcher;

/// Treats each source as a filesystem path, optionally relative to `root`.
#[derive(Debug, Clone, Default)]
pub struct FileFetcher {
    root: Option<PathBuf>,
}

impl FileFetcher {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_root(root: impl Into<PathBuf>) -> Self {
        Self {
            root: Some(root.into()),
        }
    }

    fn resolve(&self, source: &Source) -> PathBuf {
        match &self.root {
            Some(root) => root.join(source.as_str()),
            None => PathBuf::from(source.as_str()),
        }
    }
}

#[async_trait]
impl Fetcher for FileFetcher {
    async fn fetch(&self, source: &Source) -> Result<Item, FetchError> {
        let path = self.resolve(source);
        match tokio::fs::read(&path).await {
            Ok(bytes) => Ok(Item::new(source.clone(), bytes)),
            Err(e) => Err(FetchError::failed(
                source.clone(),
                format!("{}: {e}", path.display()),
            )),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use ulid::Ulid;

    #[tokio::test]
    async fn reads_file_relative_to_root() {
        let dir = std::env::temp_dir().join(format!("shoal-file-fetcher-{}", Ulid::new()));
        std::fs::create_dir_all(&dir).unwrap();
        std::fs::write(dir.join("kid.png"), b"not really a png").unwrap();

        let fetcher = FileFetcher::with_root(&dir);
        let item = fetcher.fetch(&Source::new("kid.png")).await.unwrap();
        assert_eq!(item.payload(), b"not really a png");
        assert_eq!(item.source().as_str(), "kid.png");

        std::fs::remove_dir_all(&dir).unwrap();
    }

    #[tokio::test]
    async fn missing_file_is_fetch_failed() {
        let fetcher = FileFetcher::with_root(std::env::temp_dir());
        let source = Source::new(format!("missing-{}.png", Ulid::new()));
        let err = fetcher.fetch(&source).await.unwrap_err();
        assert_eq!(err.address(), &source);
    }
}
