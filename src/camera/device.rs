//! Hardware seam for the camera scanner.
//!
//! A [`CameraBackend`] opens devices by index; the returned
//! [`CaptureDevice`] is the live hardware handle. Dropping the device
//! releases it.

use crate::error::CameraError;
use image::RgbImage;
use serde::{Deserialize, Serialize};
use tracing::debug;

/// Number of device indices probed by [`list_cameras`]
pub const MAX_PROBED_DEVICES: u32 = 10;

/// Negotiated device settings
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct CameraInfo {
    /// Device index
    pub id: u32,
    /// Frame width
    pub width: u32,
    /// Frame height
    pub height: u32,
    /// Frame rate
    pub fps: f64,
}

/// An open camera
pub trait CaptureDevice {
    /// Request a frame size and rate; returns what the device settled on
    fn configure(&mut self, width: u32, height: u32, fps: u32) -> Result<CameraInfo, CameraError>;

    /// Block until the next frame is available
    fn read(&mut self) -> Result<RgbImage, CameraError>;

    /// Current settings
    fn info(&self) -> CameraInfo;
}

/// Opens camera devices
pub trait CameraBackend {
    /// Device handle type
    type Device: CaptureDevice;

    /// Acquire the device at `device_id`
    fn open(&self, device_id: u32) -> Result<Self::Device, CameraError>;
}

/// Probe the first [`MAX_PROBED_DEVICES`] indices and report the ones that open.
///
/// Each probed device is released before the next is tried.
pub fn list_cameras<B: CameraBackend>(backend: &B) -> Vec<CameraInfo> {
    (0..MAX_PROBED_DEVICES)
        .filter_map(|id| match backend.open(id) {
            Ok(device) => Some(device.info()),
            Err(err) => {
                debug!(device_id = id, error = %err, "camera probe failed");
                None
            }
        })
        .collect()
}
