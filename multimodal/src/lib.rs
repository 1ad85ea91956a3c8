pub mod error;
pub mod media;
pub mod tracker;

pub use error::{MediaError, MediaResult};
pub use media::{ImageSource, MediaConnector, MediaConnectorConfig, ResolvedImage, MAX_IMAGE_EDGE};
pub use tracker::{ImageTracker, TrackerOutput};
