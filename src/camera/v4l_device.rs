//! Linux V4L2 capture backend.
//!
//! Frames are streamed through memory-mapped buffers. YUYV is preferred
//! since it needs no decompression; MJPG is the fallback for devices that
//! only offer compressed output at the requested size.

use super::device::{CameraBackend, CameraInfo, CaptureDevice};
use crate::error::CameraError;
use image::{ImageFormat, RgbImage};
use tracing::{debug, info};
use v4l::buffer::Type;
use v4l::io::mmap::Stream;
use v4l::io::traits::CaptureStream;
use v4l::prelude::*;
use v4l::video::Capture;
use v4l::video::capture::Parameters;
use v4l::{Format, FourCC};

const BUFFER_COUNT: u32 = 4;

fn yuyv() -> FourCC {
    FourCC::new(b"YUYV")
}

fn mjpg() -> FourCC {
    FourCC::new(b"MJPG")
}

/// Opens `/dev/videoN` devices
#[derive(Debug, Clone, Copy, Default)]
pub struct V4lBackend;

impl CameraBackend for V4lBackend {
    type Device = V4lDevice;

    fn open(&self, device_id: u32) -> Result<V4lDevice, CameraError> {
        let open_failed = |reason: String| CameraError::OpenFailed { device_id, reason };
        let dev = Device::new(device_id as usize).map_err(|e| open_failed(e.to_string()))?;
        let format = dev.format().map_err(|e| open_failed(e.to_string()))?;
        let fps = dev.params().map(|p| interval_fps(&p)).unwrap_or(0.0);
        debug!(device_id, width = format.width, height = format.height, fourcc = ?format.fourcc, "v4l device opened");
        Ok(V4lDevice {
            id: device_id,
            dev,
            format,
            fps,
            stream: None,
        })
    }
}

fn interval_fps(params: &Parameters) -> f64 {
    let interval = params.interval;
    if interval.numerator == 0 {
        0.0
    } else {
        interval.denominator as f64 / interval.numerator as f64
    }
}

/// An open V4L2 device
pub struct V4lDevice {
    id: u32,
    dev: Device,
    format: Format,
    fps: f64,
    stream: Option<Stream<'static>>,
}

impl V4lDevice {
    fn stream(&mut self) -> Result<&mut Stream<'static>, CameraError> {
        if self.stream.is_none() {
            let stream = Stream::with_buffers(&self.dev, Type::VideoCapture, BUFFER_COUNT)
                .map_err(|e| CameraError::ReadFailed(format!("failed to create stream: {e}")))?;
            self.stream = Some(stream);
        }
        self.stream
            .as_mut()
            .ok_or_else(|| CameraError::ReadFailed("stream unavailable".to_string()))
    }
}

impl CaptureDevice for V4lDevice {
    fn configure(&mut self, width: u32, height: u32, fps: u32) -> Result<CameraInfo, CameraError> {
        // Buffers must be released before the format can change
        self.stream = None;

        let format = match self.dev.set_format(&Format::new(width, height, yuyv())) {
            Ok(f) if f.fourcc == yuyv() => f,
            _ => self
                .dev
                .set_format(&Format::new(width, height, mjpg()))
                .map_err(|e| CameraError::ConfigureFailed(e.to_string()))?,
        };
        if format.fourcc != yuyv() && format.fourcc != mjpg() {
            return Err(CameraError::UnsupportedFormat(format!("{:?}", format.fourcc)));
        }
        self.format = format;

        self.fps = match self.dev.set_params(&Parameters::with_fps(fps)) {
            Ok(params) => interval_fps(&params),
            Err(err) => {
                debug!(error = %err, "device rejected frame rate");
                self.fps
            }
        };

        let info = self.info();
        info!(
            device_id = info.id,
            width = info.width,
            height = info.height,
            fps = info.fps,
            fourcc = ?self.format.fourcc,
            "camera configured"
        );
        Ok(info)
    }

    fn read(&mut self) -> Result<RgbImage, CameraError> {
        let (width, height, fourcc) = (self.format.width, self.format.height, self.format.fourcc);
        let stream = self.stream()?;
        let (buf, meta) = stream
            .next()
            .map_err(|e| CameraError::ReadFailed(e.to_string()))?;
        let used = (meta.bytesused as usize).min(buf.len());
        let data = if used == 0 { buf } else { &buf[..used] };

        if fourcc == yuyv() {
            yuyv_to_rgb(data, width, height)
        } else if fourcc == mjpg() {
            image::load_from_memory_with_format(data, ImageFormat::Jpeg)
                .map(|img| img.to_rgb8())
                .map_err(|e| CameraError::ReadFailed(e.to_string()))
        } else {
            Err(CameraError::UnsupportedFormat(format!("{fourcc:?}")))
        }
    }

    fn info(&self) -> CameraInfo {
        CameraInfo {
            id: self.id,
            width: self.format.width,
            height: self.format.height,
            fps: self.fps,
        }
    }
}

/// YUYV 4:2:2 (Y0 U Y1 V per pixel pair) to packed RGB, BT.601
fn yuyv_to_rgb(data: &[u8], width: u32, height: u32) -> Result<RgbImage, CameraError> {
    let pixel_count = width as usize * height as usize;
    if data.len() < pixel_count * 2 {
        return Err(CameraError::ReadFailed(format!(
            "short YUYV frame: {} bytes for {}x{}",
            data.len(),
            width,
            height
        )));
    }

    let mut rgb = Vec::with_capacity(pixel_count * 3);
    for chunk in data[..pixel_count * 2].chunks_exact(4) {
        let u = chunk[1] as f32 - 128.0;
        let v = chunk[3] as f32 - 128.0;
        for y in [chunk[0] as f32, chunk[2] as f32] {
            rgb.push((y + 1.402 * v).clamp(0.0, 255.0) as u8);
            rgb.push((y - 0.344 * u - 0.714 * v).clamp(0.0, 255.0) as u8);
            rgb.push((y + 1.772 * u).clamp(0.0, 255.0) as u8);
        }
    }
    RgbImage::from_raw(width, height, rgb)
        .ok_or_else(|| CameraError::ReadFailed("odd frame width".to_string()))
}
