//! Image reference resolution.
//!
//! A reference can be an http(s) URL, a `data:image/...;base64,` inline
//! payload, or a local filesystem path. All paths normalize to 3-channel
//! RGB and are downsampled so the longer edge never exceeds
//! [`MAX_IMAGE_EDGE`] pixels.

use std::{path::PathBuf, time::Duration};

use base64::Engine;
use image::{imageops::FilterType, DynamicImage, GenericImageView, RgbImage};
use tracing::debug;

use super::error::{MediaError, MediaResult};

/// Upper bound on the longer image edge after resolution.
pub const MAX_IMAGE_EDGE: u32 = 720;

/// A classified image reference.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ImageSource {
    /// http(s) URL fetched over the network
    Url(String),
    /// `data:image/...;base64,` inline payload
    DataUrl(String),
    /// Local filesystem path
    Path(PathBuf),
}

impl ImageSource {
    /// Classify a raw reference string.
    pub fn classify(reference: &str) -> Self {
        match url::Url::parse(reference) {
            Ok(parsed) if parsed.scheme() == "http" || parsed.scheme() == "https" => {
                ImageSource::Url(reference.to_string())
            }
            Ok(parsed) if parsed.scheme() == "data" => ImageSource::DataUrl(reference.to_string()),
            _ => ImageSource::Path(PathBuf::from(reference)),
        }
    }
}

/// A decoded bitmap ready for the generation runtime.
#[derive(Debug, Clone)]
pub struct ResolvedImage {
    pub image: RgbImage,
    pub width: u32,
    pub height: u32,
}

impl ResolvedImage {
    fn from_dynamic(image: DynamicImage, max_edge: u32) -> Self {
        let rgb = bound_longer_edge(image, max_edge);
        let (width, height) = rgb.dimensions();
        Self {
            image: rgb,
            width,
            height,
        }
    }

    /// Re-encode as a `data:image/png;base64,` URL for transport to the
    /// generation worker.
    pub fn to_png_data_url(&self) -> MediaResult<String> {
        let mut buf = Vec::new();
        DynamicImage::ImageRgb8(self.image.clone())
            .write_to(&mut std::io::Cursor::new(&mut buf), image::ImageFormat::Png)?;
        let encoded = base64::engine::general_purpose::STANDARD.encode(&buf);
        Ok(format!("data:image/png;base64,{encoded}"))
    }
}

#[derive(Debug, Clone)]
pub struct MediaConnectorConfig {
    /// Per-fetch network timeout
    pub fetch_timeout: Duration,
    /// Longer-edge bound applied after decoding
    pub max_edge: u32,
}

impl Default for MediaConnectorConfig {
    fn default() -> Self {
        Self {
            fetch_timeout: Duration::from_secs(30),
            max_edge: MAX_IMAGE_EDGE,
        }
    }
}

/// Fetches and decodes image references.
///
/// Resolution is idempotent and side-effect-free beyond the network or
/// file read itself; independent resolutions may run concurrently.
pub struct MediaConnector {
    client: reqwest::Client,
    config: MediaConnectorConfig,
}

impl MediaConnector {
    pub fn new(client: reqwest::Client, config: MediaConnectorConfig) -> Self {
        Self { client, config }
    }

    /// Resolve a reference into a decoded, bounded RGB bitmap.
    pub async fn resolve(&self, source: &ImageSource) -> MediaResult<ResolvedImage> {
        let image = match source {
            ImageSource::Url(url) => self.fetch_http(url).await?,
            ImageSource::DataUrl(url) => decode_data_url(url)?,
            ImageSource::Path(path) => {
                let bytes =
                    tokio::fs::read(path)
                        .await
                        .map_err(|source| MediaError::Io {
                            path: path.display().to_string(),
                            source,
                        })?;
                image::load_from_memory(&bytes)?
            }
        };

        let resolved = ResolvedImage::from_dynamic(image, self.config.max_edge);
        debug!(
            width = resolved.width,
            height = resolved.height,
            "Resolved image"
        );
        Ok(resolved)
    }

    async fn fetch_http(&self, url: &str) -> MediaResult<DynamicImage> {
        let response = self
            .client
            .get(url)
            .timeout(self.config.fetch_timeout)
            .send()
            .await
            .map_err(|source| MediaError::Fetch {
                url: url.to_string(),
                source,
            })?;

        let status = response.status();
        if !status.is_success() {
            return Err(MediaError::HttpStatus {
                url: url.to_string(),
                status,
            });
        }

        let bytes = response
            .bytes()
            .await
            .map_err(|source| MediaError::Fetch {
                url: url.to_string(),
                source,
            })?;
        Ok(image::load_from_memory(&bytes)?)
    }
}

/// Decode a `data:image/...;base64,` URL into an image.
fn decode_data_url(url: &str) -> MediaResult<DynamicImage> {
    let rest = url
        .strip_prefix("data:")
        .ok_or_else(|| MediaError::InvalidDataUrl("missing 'data:' prefix".to_string()))?;

    let (media_type, payload) = rest
        .split_once(";base64,")
        .ok_or_else(|| MediaError::InvalidDataUrl("missing ';base64,' marker".to_string()))?;

    if !media_type.starts_with("image/") {
        return Err(MediaError::InvalidDataUrl(format!(
            "unsupported media type '{media_type}'"
        )));
    }

    let bytes = base64::engine::general_purpose::STANDARD.decode(payload)?;
    Ok(image::load_from_memory(&bytes)?)
}

/// Downsample so the longer edge becomes exactly `max_edge`, preserving
/// aspect ratio. Images already within the bound pass through unchanged.
fn bound_longer_edge(image: DynamicImage, max_edge: u32) -> RgbImage {
    let (width, height) = image.dimensions();
    let longer = width.max(height);
    if longer <= max_edge {
        return image.to_rgb8();
    }

    let scale = f64::from(max_edge) / f64::from(longer);
    let (new_width, new_height) = if width >= height {
        (max_edge, scaled_dim(height, scale))
    } else {
        (scaled_dim(width, scale), max_edge)
    };

    image
        .resize_exact(new_width, new_height, FilterType::CatmullRom)
        .to_rgb8()
}

fn scaled_dim(dim: u32, scale: f64) -> u32 {
    ((f64::from(dim) * scale).round() as u32).max(1)
}

#[cfg(test)]
mod tests {
    use std::io::Cursor;

    use image::Rgb;

    use super::*;

    fn png_bytes(width: u32, height: u32) -> Vec<u8> {
        let img = RgbImage::from_pixel(width, height, Rgb([40, 80, 120]));
        let mut buf = Vec::new();
        DynamicImage::ImageRgb8(img)
            .write_to(&mut Cursor::new(&mut buf), image::ImageFormat::Png)
            .unwrap();
        buf
    }

    fn data_url(width: u32, height: u32) -> String {
        let encoded = base64::engine::general_purpose::STANDARD.encode(png_bytes(width, height));
        format!("data:image/png;base64,{encoded}")
    }

    fn connector() -> MediaConnector {
        MediaConnector::new(reqwest::Client::new(), MediaConnectorConfig::default())
    }

    #[test]
    fn classify_detects_all_reference_kinds() {
        assert!(matches!(
            ImageSource::classify("https://example.com/cat.jpg"),
            ImageSource::Url(_)
        ));
        assert!(matches!(
            ImageSource::classify("http://example.com/cat.jpg"),
            ImageSource::Url(_)
        ));
        assert!(matches!(
            ImageSource::classify("data:image/png;base64,AAAA"),
            ImageSource::DataUrl(_)
        ));
        assert!(matches!(
            ImageSource::classify("/tmp/cat.png"),
            ImageSource::Path(_)
        ));
        assert!(matches!(
            ImageSource::classify("relative/cat.png"),
            ImageSource::Path(_)
        ));
    }

    #[tokio::test]
    async fn data_url_resolves_to_rgb() {
        let source = ImageSource::classify(&data_url(32, 16));
        let resolved = connector().resolve(&source).await.unwrap();
        assert_eq!((resolved.width, resolved.height), (32, 16));
        assert_eq!(resolved.image.get_pixel(0, 0), &Rgb([40, 80, 120]));
    }

    #[tokio::test]
    async fn wide_image_downsampled_to_longer_edge() {
        let source = ImageSource::classify(&data_url(1440, 720));
        let resolved = connector().resolve(&source).await.unwrap();
        assert_eq!((resolved.width, resolved.height), (720, 360));
    }

    #[tokio::test]
    async fn tall_image_downsampled_to_longer_edge() {
        let source = ImageSource::classify(&data_url(600, 1200));
        let resolved = connector().resolve(&source).await.unwrap();
        assert_eq!((resolved.width, resolved.height), (360, 720));
    }

    #[tokio::test]
    async fn small_image_passes_through_unchanged() {
        let source = ImageSource::classify(&data_url(720, 405));
        let resolved = connector().resolve(&source).await.unwrap();
        assert_eq!((resolved.width, resolved.height), (720, 405));
    }

    #[tokio::test]
    async fn aspect_ratio_preserved_within_rounding() {
        let source = ImageSource::classify(&data_url(1013, 771));
        let resolved = connector().resolve(&source).await.unwrap();
        assert_eq!(resolved.width.max(resolved.height), 720);
        let expected = f64::from(771) * 720.0 / 1013.0;
        assert!((f64::from(resolved.height) - expected).abs() <= 1.0);
    }

    #[tokio::test]
    async fn malformed_base64_is_an_error() {
        let source = ImageSource::classify("data:image/png;base64,!!!notbase64!!!");
        let err = connector().resolve(&source).await.unwrap_err();
        assert!(matches!(err, MediaError::Base64(_)));
    }

    #[tokio::test]
    async fn non_image_media_type_is_an_error() {
        let source = ImageSource::classify("data:text/plain;base64,aGVsbG8=");
        let err = connector().resolve(&source).await.unwrap_err();
        assert!(matches!(err, MediaError::InvalidDataUrl(_)));
    }

    #[tokio::test]
    async fn non_image_payload_is_an_error() {
        let encoded = base64::engine::general_purpose::STANDARD.encode(b"not an image");
        let source = ImageSource::classify(&format!("data:image/png;base64,{encoded}"));
        let err = connector().resolve(&source).await.unwrap_err();
        assert!(matches!(err, MediaError::Decode(_)));
    }

    #[tokio::test]
    async fn missing_file_is_an_error() {
        let source = ImageSource::classify("/nonexistent/definitely-missing.png");
        let err = connector().resolve(&source).await.unwrap_err();
        assert!(matches!(err, MediaError::Io { .. }));
    }

    #[tokio::test]
    async fn local_path_resolves() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("fixture.png");
        std::fs::write(&path, png_bytes(64, 48)).unwrap();

        let source = ImageSource::classify(path.to_str().unwrap());
        let resolved = connector().resolve(&source).await.unwrap();
        assert_eq!((resolved.width, resolved.height), (64, 48));
    }
}
