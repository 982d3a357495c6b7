use super::{DecodeEngine, RawDetection};
use crate::error::EngineError;
use crate::models::Point;
use image::GrayImage;
use rqrr::PreparedImage;
use tracing::debug;

/// QR-only engine backed by `rqrr`
#[derive(Debug, Clone, Copy, Default)]
pub struct QrEngine;

impl QrEngine {
    /// Create the engine
    pub fn new() -> Self {
        Self
    }
}

impl DecodeEngine for QrEngine {
    fn name(&self) -> &str {
        "rqrr"
    }

    fn decode(&self, image: &GrayImage) -> Result<Vec<RawDetection>, EngineError> {
        let (width, height) = image.dimensions();
        let (w, h) = (width as usize, height as usize);
        if w == 0 || h == 0 {
            return Ok(Vec::new());
        }
        let raw = image.as_raw();
        if raw.len() < w * h {
            return Err(EngineError::MalformedBuffer(format!(
                "{} bytes for {}x{}",
                raw.len(),
                width,
                height
            )));
        }

        let mut prepared = PreparedImage::prepare_from_greyscale(w, h, |x, y| raw[y * w + x]);
        let grids = prepared.detect_grids();

        let mut detections = Vec::with_capacity(grids.len());
        for grid in grids {
            match grid.decode() {
                Ok((_meta, content)) => {
                    let polygon = grid.bounds.iter().map(|p| Point::new(p.x, p.y)).collect();
                    detections.push(RawDetection::from_polygon(
                        content.into_bytes(),
                        "QR_CODE",
                        polygon,
                    ));
                }
                Err(err) => debug!(engine = "rqrr", error = %err, "grid failed to decode"),
            }
        }
        Ok(detections)
    }
}

/// Tries engines in order and returns the first non-empty result.
///
/// An engine error is remembered but does not stop the chain; it is
/// returned only when no engine produced anything.
pub struct ChainEngine {
    engines: Vec<Box<dyn DecodeEngine>>,
}

impl ChainEngine {
    /// Chain of the given engines
    pub fn new(engines: Vec<Box<dyn DecodeEngine>>) -> Self {
        Self { engines }
    }

    /// Append an engine at the end of the chain
    pub fn push(&mut self, engine: Box<dyn DecodeEngine>) {
        self.engines.push(engine);
    }

    /// Number of engines in the chain
    pub fn len(&self) -> usize {
        self.engines.len()
    }

    /// True when the chain has no engines
    pub fn is_empty(&self) -> bool {
        self.engines.is_empty()
    }
}

impl DecodeEngine for ChainEngine {
    fn name(&self) -> &str {
        "chain"
    }

    fn decode(&self, image: &GrayImage) -> Result<Vec<RawDetection>, EngineError> {
        let mut last_error = None;
        for engine in &self.engines {
            match engine.decode(image) {
                Ok(found) if !found.is_empty() => return Ok(found),
                Ok(_) => {}
                Err(err) => {
                    debug!(engine = engine.name(), error = %err, "engine failed in chain");
                    last_error = Some(err);
                }
            }
        }
        match last_error {
            Some(err) => Err(err),
            None => Ok(Vec::new()),
        }
    }
}

/// Engine used when the caller doesn't supply one: the rxing multi-format
/// reader when compiled in, followed by rqrr.
pub fn default_engine() -> Box<dyn DecodeEngine> {
    #[cfg(feature = "rxing")]
    {
        Box::new(ChainEngine::new(vec![
            Box::new(super::RxingEngine::new()),
            Box::new(QrEngine::new()),
        ]))
    }
    #[cfg(not(feature = "rxing"))]
    {
        Box::new(QrEngine::new())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::Rect;
    use std::sync::atomic::{AtomicUsize, Ordering};

    struct Fixed {
        result: Result<Vec<RawDetection>, EngineError>,
        calls: AtomicUsize,
    }

    impl Fixed {
        fn new(result: Result<Vec<RawDetection>, EngineError>) -> Self {
            Self {
                result,
                calls: AtomicUsize::new(0),
            }
        }
    }

    impl DecodeEngine for Fixed {
        fn name(&self) -> &str {
            "fixed"
        }

        fn decode(&self, _image: &GrayImage) -> Result<Vec<RawDetection>, EngineError> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            self.result.clone()
        }
    }

    fn hit(data: &str) -> RawDetection {
        RawDetection {
            data: data.as_bytes().to_vec(),
            symbology_name: "EAN13".into(),
            rect: Rect::new(1, 2, 3, 4),
            polygon: Vec::new(),
        }
    }

    #[test]
    fn test_qr_engine_blank_image() {
        let img = GrayImage::from_pixel(64, 64, image::Luma([255]));
        assert_eq!(QrEngine.decode(&img), Ok(Vec::new()));
        assert_eq!(QrEngine.decode(&GrayImage::new(0, 0)), Ok(Vec::new()));
    }

    #[test]
    fn test_chain_returns_first_non_empty() {
        let chain = ChainEngine::new(vec![
            Box::new(Fixed::new(Ok(Vec::new()))),
            Box::new(Fixed::new(Ok(vec![hit("4006381333931")]))),
            Box::new(Fixed::new(Ok(vec![hit("0000000000000")]))),
        ]);
        let img = GrayImage::new(4, 4);
        let found = chain.decode(&img).unwrap();
        assert_eq!(found, vec![hit("4006381333931")]);
    }

    #[test]
    fn test_chain_error_only_when_nothing_found() {
        let err = EngineError::MalformedBuffer("bad".into());
        let chain = ChainEngine::new(vec![
            Box::new(Fixed::new(Err(err.clone()))),
            Box::new(Fixed::new(Ok(vec![hit("12345678")]))),
        ]);
        assert_eq!(chain.decode(&GrayImage::new(4, 4)).unwrap().len(), 1);

        let chain = ChainEngine::new(vec![
            Box::new(Fixed::new(Err(err.clone()))),
            Box::new(Fixed::new(Ok(Vec::new()))),
        ]);
        assert_eq!(chain.decode(&GrayImage::new(4, 4)), Err(err));
        assert!(ChainEngine::new(Vec::new()).is_empty());
    }

    #[test]
    fn test_from_polygon_bounds() {
        let det = RawDetection::from_polygon(
            b"x".to_vec(),
            "QR_CODE",
            vec![Point::new(5, 5), Point::new(25, 6), Point::new(24, 30), Point::new(4, 29)],
        );
        assert_eq!(det.rect, Rect::new(4, 5, 21, 25));
    }
}
