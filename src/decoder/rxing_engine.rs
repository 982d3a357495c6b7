use super::{DecodeEngine, RawDetection};
use crate::error::EngineError;
use crate::models::Point;
use image::GrayImage;
use tracing::debug;

/// Multi-format 1D/2D engine (EAN, UPC, Code 128, Code 39, QR, ...)
#[derive(Debug, Clone, Copy, Default)]
pub struct RxingEngine;

impl RxingEngine {
    /// Create the engine
    pub fn new() -> Self {
        Self
    }
}

impl DecodeEngine for RxingEngine {
    fn name(&self) -> &str {
        "rxing"
    }

    fn decode(&self, image: &GrayImage) -> Result<Vec<RawDetection>, EngineError> {
        let (width, height) = image.dimensions();
        if width == 0 || height == 0 {
            return Ok(Vec::new());
        }

        let results =
            match rxing::helpers::detect_multiple_in_luma(image.as_raw().clone(), width, height) {
                Ok(results) => results,
                Err(rxing::Exceptions::NotFoundException(_)) => return Ok(Vec::new()),
                Err(err) => {
                    return Err(EngineError::Backend {
                        engine: "rxing",
                        message: err.to_string(),
                    });
                }
            };

        let detections = results
            .iter()
            .map(|result| {
                // 1D readers report the two ends of the scan line
                let polygon = result
                    .getPoints()
                    .iter()
                    .map(|p| Point::new(p.x.round() as i32, p.y.round() as i32))
                    .collect();
                let format = format!("{:?}", result.getBarcodeFormat());
                debug!(engine = "rxing", format = %format, "symbol decoded");
                RawDetection::from_polygon(result.getText().as_bytes().to_vec(), format, polygon)
            })
            .collect();
        Ok(detections)
    }
}
