//! Image asset loading over HTTP and from data URLs.

use crate::client::ApiClient;
use base64::{Engine, engine::general_purpose::STANDARD};
use certcanvas_core::bridge::{AssetError, AssetLoader};
use certcanvas_core::shapes::ImageAsset;
use certcanvas_core::storage::BoxFuture;
use image::ImageReader;
use std::io::Cursor;

/// Resolves `http(s)://` sources and `data:` URLs to their pixel size.
#[derive(Debug, Clone)]
pub struct HttpAssetLoader {
    http: reqwest::Client,
}

impl HttpAssetLoader {
    pub fn new(http: reqwest::Client) -> Self {
        Self { http }
    }

    /// Share the API client's connection pool and timeout.
    pub fn from_client(client: &ApiClient) -> Self {
        Self::new(client.http().clone())
    }

    async fn fetch(&self, src: &str) -> Result<Vec<u8>, AssetError> {
        let fetch_error = |reason: String| AssetError::Fetch {
            src: src.to_string(),
            reason,
        };
        let response = self
            .http
            .get(src)
            .send()
            .await
            .map_err(|e| fetch_error(e.to_string()))?;
        if !response.status().is_success() {
            return Err(fetch_error(format!("HTTP {}", response.status())));
        }
        let bytes = response
            .bytes()
            .await
            .map_err(|e| fetch_error(e.to_string()))?;
        Ok(bytes.to_vec())
    }
}

/// Decode the payload of a `data:<mime>;base64,<payload>` URL.
fn decode_data_url(src: &str) -> Result<Vec<u8>, AssetError> {
    let decode_error = |reason: &str| AssetError::Decode {
        src: truncate(src),
        reason: reason.to_string(),
    };
    let (header, payload) = src
        .strip_prefix("data:")
        .and_then(|rest| rest.split_once(','))
        .ok_or_else(|| decode_error("invalid data URL"))?;
    if !header.ends_with(";base64") {
        return Err(decode_error("data URL is not base64 encoded"));
    }
    STANDARD
        .decode(payload.trim())
        .map_err(|e| decode_error(&e.to_string()))
}

/// Data URLs can be huge; keep error messages short.
fn truncate(src: &str) -> String {
    match src.char_indices().nth(48) {
        Some((end, _)) => format!("{}...", &src[..end]),
        None => src.to_string(),
    }
}

fn dimensions(src: &str, bytes: &[u8]) -> Result<(u32, u32), AssetError> {
    let decode_error = |reason: String| AssetError::Decode {
        src: truncate(src),
        reason,
    };
    ImageReader::new(Cursor::new(bytes))
        .with_guessed_format()
        .map_err(|e| decode_error(e.to_string()))?
        .into_dimensions()
        .map_err(|e| decode_error(e.to_string()))
}

impl AssetLoader for HttpAssetLoader {
    fn load<'a>(&'a self, src: &'a str) -> BoxFuture<'a, Result<ImageAsset, AssetError>> {
        Box::pin(async move {
            let bytes = if src.starts_with("data:") {
                decode_data_url(src)?
            } else {
                self.fetch(src).await?
            };
            let (width, height) = dimensions(src, &bytes)?;
            log::debug!("Loaded image {} ({width}x{height})", truncate(src));
            Ok(ImageAsset::new(src, width, height))
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::client::tests::{client, init_logger, serve_once};
    use image::{ImageFormat, RgbaImage};

    fn png(width: u32, height: u32) -> Vec<u8> {
        let mut bytes = Vec::new();
        RgbaImage::new(width, height)
            .write_to(&mut Cursor::new(&mut bytes), ImageFormat::Png)
            .unwrap();
        bytes
    }

    #[tokio::test]
    async fn test_data_url_dimensions() {
        let src = format!("data:image/png;base64,{}", STANDARD.encode(png(3, 2)));
        let loader = HttpAssetLoader::new(reqwest::Client::new());
        let asset = loader.load(&src).await.unwrap();
        assert_eq!((asset.width, asset.height), (3, 2));
        assert_eq!(asset.src, src);
    }

    #[tokio::test]
    async fn test_bad_data_url() {
        let loader = HttpAssetLoader::new(reqwest::Client::new());
        assert!(matches!(
            loader.load("data:image/png,notbase64").await,
            Err(AssetError::Decode { .. })
        ));
        assert!(matches!(
            loader.load("data:image/png;base64,AAAA").await,
            Err(AssetError::Decode { .. })
        ));
    }

    #[tokio::test]
    async fn test_http_image() {
        let (url, _server) = serve_once(200, "image/png", png(5, 4)).await;
        let loader = HttpAssetLoader::from_client(&client(&url));
        let asset = loader.load(&format!("{url}/bg.png")).await.unwrap();
        assert_eq!((asset.width, asset.height), (5, 4));
    }

    #[tokio::test]
    async fn test_http_error() {
        init_logger();
        let (url, _server) = serve_once(404, "text/plain", b"missing".to_vec()).await;
        let loader = HttpAssetLoader::new(reqwest::Client::new());
        assert!(matches!(
            loader.load(&format!("{url}/bg.png")).await,
            Err(AssetError::Fetch { .. })
        ));
    }
}
