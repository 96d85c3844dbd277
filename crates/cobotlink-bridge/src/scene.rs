//! Camera frame decoding and the frame-rate estimate.

use std::path::Path;
use std::time::Instant;

use base64::Engine;
use base64::engine::general_purpose::STANDARD;
use chrono::{DateTime, Utc};
use cobotlink_types::BridgeError;
use image::{ImageFormat, RgbImage};

use crate::protocol::CompressedImageMsg;

/// The most recently decoded camera frame.
#[derive(Debug, Clone)]
pub struct Scene {
    /// 3-channel RGB raster.
    pub image: RgbImage,
    /// Encoding hint reported by the publisher, if any.
    pub format: Option<String>,
    /// Wall-clock time the frame was decoded.
    pub received_at: DateTime<Utc>,
    /// Frames per second derived from the gap to the previous frame; `0.0`
    /// for the first frame.
    pub fps: f64,
}

impl Scene {
    pub fn width(&self) -> u32 {
        self.image.width()
    }

    pub fn height(&self) -> u32 {
        self.image.height()
    }

    /// Write the frame to `path` as PNG.
    pub fn save_png(&self, path: impl AsRef<Path>) -> Result<(), BridgeError> {
        let path = path.as_ref();
        self.image
            .save_with_format(path, ImageFormat::Png)
            .map_err(|e| BridgeError::Serialization(format!("{}: {e}", path.display())))
    }
}

/// Decode a `sensor_msgs/CompressedImage` body into an RGB raster.
///
/// # Errors
///
/// Returns [`BridgeError::Decode`] when the payload is not valid base64 or
/// not an image any enabled codec understands.
pub fn decode_frame(msg: &CompressedImageMsg) -> Result<RgbImage, BridgeError> {
    let bytes = STANDARD
        .decode(msg.data.trim())
        .map_err(|e| BridgeError::Decode(format!("base64: {e}")))?;
    let image = image::load_from_memory(&bytes)
        .map_err(|e| BridgeError::Decode(format!("codec: {e}")))?;
    Ok(image.to_rgb8())
}

/// Tracks the instant of the previous successful frame.
#[derive(Debug, Default)]
pub struct FrameClock {
    last: Option<Instant>,
}

impl FrameClock {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record a frame at `now` and return the instantaneous rate.
    pub fn tick(&mut self, now: Instant) -> f64 {
        let fps = match self.last {
            Some(prev) => {
                let elapsed = now.saturating_duration_since(prev).as_secs_f64();
                if elapsed > 0.0 { 1.0 / elapsed } else { 0.0 }
            }
            None => 0.0,
        };
        self.last = Some(now);
        fps
    }
}
