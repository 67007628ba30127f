//! The product catalog collaborator: lists selectable frame assets.

use std::path::{Path, PathBuf};
use std::time::Duration;

use super::asset::FrameAsset;

const DEFAULT_TIMEOUT: Duration = Duration::from_secs(15);

#[derive(Debug, thiserror::Error)]
pub enum CatalogError {
    #[error("Catalog request failed: {0}")]
    Http(#[from] reqwest::Error),

    #[error("Catalog returned HTTP {status}: {body}")]
    Status { status: u16, body: String },

    #[error("Failed to read catalog '{path}': {source}")]
    Io {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("Failed to parse catalog '{path}': {source}")]
    Parse {
        path: PathBuf,
        source: serde_json::Error,
    },

    #[error("No catalog configured. Pass --catalog-url or --catalog-path, or set [catalog] in the config file")]
    NotConfigured,
}

/// Read-only, ordered listing of frame assets.
#[allow(async_fn_in_trait)]
pub trait CatalogSource {
    async fn list_frame_assets(&self, limit: usize) -> Result<Vec<FrameAsset>, CatalogError>;
}

/// Catalog served over HTTP as `GET {base}/frames?limit=N` returning a JSON
/// array of assets.
#[derive(Debug, Clone)]
pub struct HttpCatalog {
    base_url: String,
    http_client: reqwest::Client,
}

impl HttpCatalog {
    pub fn new(base_url: impl Into<String>) -> Result<Self, CatalogError> {
        let http_client = reqwest::Client::builder()
            .timeout(DEFAULT_TIMEOUT)
            .build()?;
        Ok(Self {
            base_url: base_url.into().trim_end_matches('/').to_string(),
            http_client,
        })
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }
}

impl CatalogSource for HttpCatalog {
    async fn list_frame_assets(&self, limit: usize) -> Result<Vec<FrameAsset>, CatalogError> {
        let url = format!("{}/frames", self.base_url);
        log::debug!("fetching catalog from {} (limit {})", url, limit);

        let response = self
            .http_client
            .get(&url)
            .query(&[("limit", limit)])
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(CatalogError::Status {
                status: status.as_u16(),
                body,
            });
        }

        // Relative image URLs are relative to the listing, as in a browser
        let listing_url = response.url().clone();
        let mut assets: Vec<FrameAsset> = response.json().await?;
        assets.truncate(limit);
        for asset in &mut assets {
            asset.image_url = resolve_remote(&listing_url, &asset.image_url);
        }
        log::info!("catalog listed {} frame(s)", assets.len());
        Ok(assets)
    }
}

fn resolve_remote(listing_url: &reqwest::Url, image_url: &str) -> String {
    match listing_url.join(image_url) {
        Ok(url) => url.to_string(),
        Err(e) => {
            log::warn!("keeping unresolvable image url '{}': {}", image_url, e);
            image_url.to_string()
        }
    }
}

/// Catalog read from a local JSON manifest. Relative image paths resolve
/// against the manifest's directory.
#[derive(Debug, Clone)]
pub struct FileCatalog {
    path: PathBuf,
}

impl FileCatalog {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn resolve(&self, image_url: &str) -> String {
        if image_url.contains("://") || Path::new(image_url).is_absolute() {
            return image_url.to_string();
        }
        let base = self.path.parent().unwrap_or_else(|| Path::new("."));
        base.join(image_url).display().to_string()
    }
}

impl CatalogSource for FileCatalog {
    async fn list_frame_assets(&self, limit: usize) -> Result<Vec<FrameAsset>, CatalogError> {
        let content =
            tokio::fs::read_to_string(&self.path)
                .await
                .map_err(|source| CatalogError::Io {
                    path: self.path.clone(),
                    source,
                })?;
        let assets: Vec<FrameAsset> =
            serde_json::from_str(&content).map_err(|source| CatalogError::Parse {
                path: self.path.clone(),
                source,
            })?;

        Ok(assets
            .into_iter()
            .take(limit)
            .map(|mut asset| {
                asset.image_url = self.resolve(&asset.image_url);
                asset
            })
            .collect())
    }
}

/// Whichever catalog the configuration selected.
#[derive(Debug, Clone)]
pub enum Catalog {
    Http(HttpCatalog),
    File(FileCatalog),
}

impl CatalogSource for Catalog {
    async fn list_frame_assets(&self, limit: usize) -> Result<Vec<FrameAsset>, CatalogError> {
        match self {
            Catalog::Http(c) => c.list_frame_assets(limit).await,
            Catalog::File(c) => c.list_frame_assets(limit).await,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[tokio::test]
    async fn test_file_catalog_resolves_relative_paths() {
        let dir = TempDir::new().unwrap();
        let manifest = dir.path().join("frames.json");
        std::fs::write(
            &manifest,
            r#"[
                {"id":"1","image_url":"img/round.png","display_name":"Round"},
                {"id":"2","image_url":"https://cdn.example/cat.png","display_name":"Cat eye"},
                {"id":"3","image_url":"/abs/square.png","display_name":"Square"}
            ]"#,
        )
        .unwrap();

        let assets = FileCatalog::new(&manifest).list_frame_assets(10).await.unwrap();
        assert_eq!(assets.len(), 3);
        assert_eq!(
            assets[0].image_url,
            dir.path().join("img/round.png").display().to_string()
        );
        assert_eq!(assets[1].image_url, "https://cdn.example/cat.png");
        assert_eq!(assets[2].image_url, "/abs/square.png");
    }

    #[tokio::test]
    async fn test_file_catalog_respects_limit_and_order() {
        let dir = TempDir::new().unwrap();
        let manifest = dir.path().join("frames.json");
        std::fs::write(
            &manifest,
            r#"[{"id":"a","image":"a.png","name":"A"},{"id":"b","image":"b.png","name":"B"}]"#,
        )
        .unwrap();

        let assets = FileCatalog::new(&manifest).list_frame_assets(1).await.unwrap();
        assert_eq!(assets.len(), 1);
        assert_eq!(assets[0].id, "a");
    }

    #[tokio::test]
    async fn test_file_catalog_errors() {
        let dir = TempDir::new().unwrap();
        let missing = FileCatalog::new(dir.path().join("nope.json"));
        assert!(matches!(
            missing.list_frame_assets(5).await,
            Err(CatalogError::Io { .. })
        ));

        let bad = dir.path().join("bad.json");
        std::fs::write(&bad, "{not json").unwrap();
        assert!(matches!(
            FileCatalog::new(bad).list_frame_assets(5).await,
            Err(CatalogError::Parse { .. })
        ));
    }

    #[test]
    fn test_remote_image_urls_resolve_against_listing() {
        let listing = reqwest::Url::parse("http://shop.local/api/frames?limit=5").unwrap();
        assert_eq!(
            resolve_remote(&listing, "/img/a.png"),
            "http://shop.local/img/a.png"
        );
        assert_eq!(
            resolve_remote(&listing, "img/b.png"),
            "http://shop.local/api/img/b.png"
        );
        assert_eq!(
            resolve_remote(&listing, "https://cdn.example/c.png"),
            "https://cdn.example/c.png"
        );
    }

    #[test]
    fn test_http_catalog_trims_trailing_slash() {
        let catalog = HttpCatalog::new("http://shop.local/api/").unwrap();
        assert_eq!(catalog.base_url(), "http://shop.local/api");
    }
}
