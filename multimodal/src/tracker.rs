//! Parallel, order-preserving image resolution for a single request.

use std::sync::Arc;

use tokio::task::JoinHandle;
use tracing::warn;

use super::{
    error::MediaResult,
    media::{ImageSource, MediaConnector, ResolvedImage},
};

type PendingTask = JoinHandle<MediaResult<ResolvedImage>>;

/// Result of resolving every image reference collected for a request.
#[derive(Debug)]
pub struct TrackerOutput {
    /// Number of references pushed, successful or not
    pub requested: usize,
    /// Successfully resolved images, in push order
    pub images: Vec<ResolvedImage>,
}

impl TrackerOutput {
    /// True when at least one image was requested but none resolved.
    pub fn all_failed(&self) -> bool {
        self.requested > 0 && self.images.is_empty()
    }
}

/// Collects image references in encounter order and resolves them
/// concurrently. Per-image failures are logged and omitted; aggregate
/// failure policy is the caller's decision via [`TrackerOutput`].
pub struct ImageTracker {
    connector: Arc<MediaConnector>,
    pending: Vec<PendingTask>,
}

impl ImageTracker {
    pub fn new(connector: Arc<MediaConnector>) -> Self {
        Self {
            connector,
            pending: Vec::new(),
        }
    }

    /// Queue a raw reference for resolution. Fetching starts immediately.
    pub fn push(&mut self, reference: &str) {
        let source = ImageSource::classify(reference);
        let connector = Arc::clone(&self.connector);
        let handle = tokio::spawn(async move { connector.resolve(&source).await });
        self.pending.push(handle);
    }

    /// Await every queued resolution, preserving push order.
    pub async fn finalize(self) -> TrackerOutput {
        let requested = self.pending.len();
        let mut images = Vec::with_capacity(requested);

        for (index, task) in self.pending.into_iter().enumerate() {
            match task.await {
                Ok(Ok(image)) => images.push(image),
                Ok(Err(err)) => {
                    warn!(index, error = %err, "Image resolution failed; omitting image");
                }
                Err(err) => {
                    warn!(index, error = %err, "Image resolution task panicked; omitting image");
                }
            }
        }

        TrackerOutput { requested, images }
    }
}

#[cfg(test)]
mod tests {
    use std::io::Cursor;

    use base64::Engine;
    use image::{DynamicImage, Rgb, RgbImage};

    use super::*;
    use crate::media::MediaConnectorConfig;

    fn data_url_with_color(color: [u8; 3]) -> String {
        let img = RgbImage::from_pixel(8, 8, Rgb(color));
        let mut buf = Vec::new();
        DynamicImage::ImageRgb8(img)
            .write_to(&mut Cursor::new(&mut buf), image::ImageFormat::Png)
            .unwrap();
        let encoded = base64::engine::general_purpose::STANDARD.encode(&buf);
        format!("data:image/png;base64,{encoded}")
    }

    fn tracker() -> ImageTracker {
        let connector = Arc::new(MediaConnector::new(
            reqwest::Client::new(),
            MediaConnectorConfig::default(),
        ));
        ImageTracker::new(connector)
    }

    #[tokio::test]
    async fn resolves_in_push_order() {
        let mut tracker = tracker();
        tracker.push(&data_url_with_color([1, 0, 0]));
        tracker.push(&data_url_with_color([2, 0, 0]));
        tracker.push(&data_url_with_color([3, 0, 0]));

        let output = tracker.finalize().await;
        assert_eq!(output.requested, 3);
        let reds: Vec<u8> = output
            .images
            .iter()
            .map(|img| img.image.get_pixel(0, 0)[0])
            .collect();
        assert_eq!(reds, vec![1, 2, 3]);
    }

    #[tokio::test]
    async fn failed_image_is_omitted_not_fatal() {
        let mut tracker = tracker();
        tracker.push(&data_url_with_color([9, 0, 0]));
        tracker.push("/nonexistent/missing.png");

        let output = tracker.finalize().await;
        assert_eq!(output.requested, 2);
        assert_eq!(output.images.len(), 1);
        assert!(!output.all_failed());
    }

    #[tokio::test]
    async fn all_failures_are_reported_in_aggregate() {
        let mut tracker = tracker();
        tracker.push("/nonexistent/a.png");
        tracker.push("/nonexistent/b.png");

        let output = tracker.finalize().await;
        assert!(output.all_failed());
    }

    #[tokio::test]
    async fn empty_tracker_is_not_a_failure() {
        let output = tracker().finalize().await;
        assert_eq!(output.requested, 0);
        assert!(!output.all_failed());
    }
}
