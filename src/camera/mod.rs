//! Camera capture state machine.
//!
//! [`CameraScanner`] owns at most one open device handle and moves between
//! [`CameraState`]s on explicit calls. Invalid transitions are ignored.
//! Frames are only read when the caller asks: either one at a time through
//! [`CameraScanner::read_frame`] / [`CameraScanner::scan_frame`], or by
//! draining the lazy [`ScanStream`] returned from
//! [`CameraScanner::scan_continuous`].

pub mod config;
pub mod device;
pub mod fps;
pub mod overlay;
#[cfg(feature = "v4l")]
pub mod v4l_device;

pub use config::CameraConfig;
pub use device::{CameraBackend, CameraInfo, CaptureDevice, MAX_PROBED_DEVICES, list_cameras};
pub use fps::FpsCounter;
#[cfg(feature = "v4l")]
pub use v4l_device::{V4lBackend, V4lDevice};

use crate::decoder::DecoderOptions;
use crate::models::DecodedSymbol;
use crate::pipeline::BarcodeDecoder;
use crate::region::{extract_roi, remap};
use crate::temporal::DuplicateFilter;
use image::RgbImage;
use serde::{Deserialize, Serialize};
use std::fmt;
use tracing::{debug, error, info, trace, warn};

/// Frames discarded by [`CameraScanner::capture_image`] while exposure settles
pub const WARMUP_FRAMES: usize = 10;

/// A scan stream logs an error once per this many consecutive failed reads
pub const READ_FAILURE_LOG_INTERVAL: usize = 100;

/// Camera session state
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CameraState {
    /// No device handle held
    Stopped,
    /// Handle open, frames are decoded
    Running,
    /// Handle open, frames pass through undecoded
    Paused,
    /// The last attempt to open the device failed
    Error,
}

impl CameraState {
    /// True when a device handle is held
    pub fn is_active(&self) -> bool {
        matches!(self, Self::Running | Self::Paused)
    }

    /// Lowercase name
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Stopped => "stopped",
            Self::Running => "running",
            Self::Paused => "paused",
            Self::Error => "error",
        }
    }
}

impl fmt::Display for CameraState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Called synchronously for every detection that survives duplicate filtering
pub type DetectionCallback = Box<dyn FnMut(&DecodedSymbol)>;

/// Live barcode scanner over one camera device
pub struct CameraScanner<B: CameraBackend> {
    backend: B,
    config: CameraConfig,
    device: Option<B::Device>,
    state: CameraState,
    decoder: BarcodeDecoder,
    duplicates: DuplicateFilter,
    fps: FpsCounter,
    on_detect: Option<DetectionCallback>,
}

impl<B: CameraBackend> CameraScanner<B> {
    /// Scanner using the default decoder with rotations disabled
    pub fn new(backend: B, config: CameraConfig) -> Self {
        let decoder = BarcodeDecoder::new().with_options(DecoderOptions {
            try_rotations: false,
            ..DecoderOptions::default()
        });
        let duplicates = DuplicateFilter::new(config.duplicate_timeout());
        debug!(?config, "camera scanner created");
        Self {
            backend,
            config,
            device: None,
            state: CameraState::Stopped,
            decoder,
            duplicates,
            fps: FpsCounter::new(),
            on_detect: None,
        }
    }

    /// Replace the decoder
    pub fn with_decoder(mut self, decoder: BarcodeDecoder) -> Self {
        self.decoder = decoder;
        self
    }

    /// Install the detection callback
    pub fn on_detect<F>(mut self, callback: F) -> Self
    where
        F: FnMut(&DecodedSymbol) + 'static,
    {
        self.on_detect = Some(Box::new(callback));
        self
    }

    /// Settings this scanner was built with
    pub fn config(&self) -> &CameraConfig {
        &self.config
    }

    /// Current state
    pub fn state(&self) -> CameraState {
        self.state
    }

    /// True while running (not paused)
    pub fn is_running(&self) -> bool {
        self.state == CameraState::Running
    }

    /// Latest frames-per-second estimate
    pub fn current_fps(&self) -> f64 {
        self.fps.fps()
    }

    /// Payloads currently held by the duplicate filter
    pub fn tracked_codes(&self) -> usize {
        self.duplicates.len()
    }

    /// Settings of the open device, if any
    pub fn camera_info(&self) -> Option<CameraInfo> {
        self.device.as_ref().map(|d| d.info())
    }

    /// Open and configure the device.
    ///
    /// Returns true when a handle is held afterwards. Already running or
    /// paused is a no-op. An open failure leaves no handle and moves to
    /// [`CameraState::Error`].
    pub fn start(&mut self) -> bool {
        if self.state.is_active() {
            debug!(state = %self.state, "camera already started");
            return true;
        }

        let device_id = self.config.device_id;
        let mut device = match self.backend.open(device_id) {
            Ok(device) => device,
            Err(err) => {
                error!(device_id, error = %err, "failed to open camera");
                self.device = None;
                self.state = CameraState::Error;
                return false;
            }
        };

        let info = match device.configure(self.config.width, self.config.height, self.config.target_fps) {
            Ok(info) => info,
            Err(err) => {
                warn!(device_id, error = %err, "camera rejected settings, using device defaults");
                device.info()
            }
        };
        info!(
            device_id,
            width = info.width,
            height = info.height,
            fps = info.fps,
            "camera started"
        );

        self.device = Some(device);
        self.state = CameraState::Running;
        self.fps.reset();
        self.duplicates.reset();
        true
    }

    /// Release the device handle, if any. Safe to call in every state.
    pub fn stop(&mut self) {
        if let Some(device) = self.device.take() {
            drop(device);
            info!(device_id = self.config.device_id, "camera stopped");
        }
        self.state = CameraState::Stopped;
    }

    /// Keep the handle but stop decoding
    pub fn pause(&mut self) {
        if self.state == CameraState::Running {
            self.state = CameraState::Paused;
            debug!("camera paused");
        }
    }

    /// Resume decoding after [`pause`](Self::pause)
    pub fn resume(&mut self) {
        if self.state == CameraState::Paused {
            self.state = CameraState::Running;
            debug!("camera resumed");
        }
    }

    /// Read one frame; `None` without a handle or when the read fails
    pub fn read_frame(&mut self) -> Option<RgbImage> {
        let device = self.device.as_mut()?;
        match device.read() {
            Ok(frame) => Some(frame),
            Err(err) => {
                warn!(error = %err, "failed to read frame from camera");
                None
            }
        }
    }

    /// Decode one frame with the fast ladder.
    ///
    /// Crops to the region of interest when configured, drops payloads
    /// reported within the duplicate window, maps coordinates back to the
    /// full frame and runs the callback for each survivor. Returns an
    /// annotated copy of the frame alongside the results.
    pub fn scan_frame(&mut self, frame: &RgbImage) -> (RgbImage, Vec<DecodedSymbol>) {
        let (decoded, roi) = if self.config.use_roi {
            let (crop, roi) = extract_roi(frame, self.config.roi_ratio);
            let found = if roi.is_empty() {
                Vec::new()
            } else {
                self.decoder.decode_frame(&crop)
            };
            (found, Some(roi))
        } else {
            (self.decoder.decode_frame(frame), None)
        };

        let mut results = Vec::with_capacity(decoded.len());
        for symbol in decoded {
            if self.duplicates.is_duplicate(symbol.data()) {
                trace!(data = symbol.data(), "suppressed repeat detection");
                continue;
            }
            let symbol = match &roi {
                Some(roi) => remap(&symbol, roi),
                None => symbol,
            };
            info!(data = symbol.data(), symbology = %symbol.symbology(), checksum_valid = symbol.checksum_valid(), "barcode detected");
            if let Some(callback) = self.on_detect.as_mut() {
                callback(&symbol);
            }
            results.push(symbol);
        }

        let mut output = match &roi {
            Some(roi) if self.config.show_roi_overlay => overlay::draw_roi_guide(frame, roi),
            _ => frame.clone(),
        };
        if !results.is_empty() {
            output = overlay::draw_detections(&output, &results);
        }

        if let Some(fps) = self.fps.tick() {
            self.duplicates.cleanup();
            if self.config.debug_mode {
                debug!(fps, frames = self.fps.total_frames(), state = %self.state, "camera stats");
            }
        }
        if self.config.debug_mode {
            output = overlay::draw_debug_strip(&output, self.fps.fps(), self.config.target_fps);
        }

        (output, results)
    }

    /// Lazy, infinite sequence of scanned frames.
    ///
    /// The camera is started on the first pull. Failed reads are skipped
    /// without changing state. Dropping the stream, or
    /// calling [`ScanStream::stop`], releases the device.
    pub fn scan_continuous(&mut self) -> ScanStream<'_, B> {
        ScanStream {
            scanner: self,
            started: false,
            finished: false,
        }
    }

    /// Grab one settled frame.
    ///
    /// Starts the camera if needed, discards [`WARMUP_FRAMES`] frames and
    /// returns the next one. A camera that was stopped beforehand is
    /// stopped again.
    pub fn capture_image(&mut self) -> Option<RgbImage> {
        let was_active = self.state.is_active();
        if !was_active && !self.start() {
            return None;
        }

        for _ in 0..WARMUP_FRAMES {
            let _ = self.read_frame();
        }
        let frame = self.read_frame();

        if !was_active {
            self.stop();
        }
        frame
    }
}

/// Pull-driven scan loop borrowed from a [`CameraScanner`]
pub struct ScanStream<'a, B: CameraBackend> {
    scanner: &'a mut CameraScanner<B>,
    started: bool,
    finished: bool,
}

impl<B: CameraBackend> ScanStream<'_, B> {
    /// Current scanner state
    pub fn state(&self) -> CameraState {
        self.scanner.state()
    }

    /// Pause decoding; frames keep flowing with empty results
    pub fn pause(&mut self) {
        self.scanner.pause();
    }

    /// Resume decoding
    pub fn resume(&mut self) {
        self.scanner.resume();
    }

    /// Release the camera and end the sequence
    pub fn stop(&mut self) {
        self.finish();
    }

    /// Latest frames-per-second estimate
    pub fn current_fps(&self) -> f64 {
        self.scanner.current_fps()
    }

    fn finish(&mut self) {
        if !self.finished {
            self.finished = true;
            if self.started {
                self.scanner.stop();
            }
        }
    }
}

impl<B: CameraBackend> Iterator for ScanStream<'_, B> {
    type Item = (RgbImage, Vec<DecodedSymbol>);

    fn next(&mut self) -> Option<Self::Item> {
        if self.finished {
            return None;
        }
        if !self.started {
            if !self.scanner.start() {
                self.finished = true;
                return None;
            }
            self.started = true;
        }

        let mut failures = 0usize;
        while self.scanner.state().is_active() {
            let Some(frame) = self.scanner.read_frame() else {
                failures += 1;
                if failures % READ_FAILURE_LOG_INTERVAL == 0 {
                    error!(failures, "camera keeps failing to deliver frames");
                }
                continue;
            };
            if self.scanner.state() == CameraState::Paused {
                return Some((frame, Vec::new()));
            }
            return Some(self.scanner.scan_frame(&frame));
        }

        self.finish();
        None
    }
}

impl<B: CameraBackend> Drop for ScanStream<'_, B> {
    fn drop(&mut self) {
        self.finish();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_state_names() {
        assert_eq!(CameraState::Running.to_string(), "running");
        assert!(CameraState::Paused.is_active());
        assert!(!CameraState::Error.is_active());
        assert_eq!(serde_json::to_string(&CameraState::Stopped).unwrap(), "\"stopped\"");
    }
}
