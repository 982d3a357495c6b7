use crate::decoder::engine::default_engine;
use crate::decoder::{DecodeEngine, DecoderOptions, FAST_LADDER, STILL_LADDER, Stage, run_ladder};
use crate::error::Result;
use crate::models::DecodedSymbol;
use crate::preprocess::{rgb_frame_to_gray, to_gray};
use crate::region::{extract_roi, remap_all};
use crate::validation;
use image::{DynamicImage, GrayImage, RgbImage};
use std::path::Path;
use std::time::Instant;
use tracing::{debug, warn};

/// Decode API: the retry ladders plus validation around one Decode Engine
pub struct BarcodeDecoder {
    engine: Box<dyn DecodeEngine>,
    options: DecoderOptions,
}

impl BarcodeDecoder {
    /// Decoder with the default engine and options
    pub fn new() -> Self {
        Self {
            engine: default_engine(),
            options: DecoderOptions::default(),
        }
    }

    /// Decoder around a caller-supplied engine
    pub fn with_engine<E: DecodeEngine + 'static>(engine: E) -> Self {
        Self {
            engine: Box::new(engine),
            options: DecoderOptions::default(),
        }
    }

    /// Replace the options
    pub fn with_options(mut self, options: DecoderOptions) -> Self {
        self.options = options;
        self
    }

    /// Active options
    pub fn options(&self) -> &DecoderOptions {
        &self.options
    }

    /// Name of the underlying engine
    pub fn engine_name(&self) -> &str {
        self.engine.name()
    }

    /// Exhaustive decode of a still image
    pub fn decode_image(&self, image: &DynamicImage) -> Vec<DecodedSymbol> {
        self.decode_gray(&to_gray(image))
    }

    /// Exhaustive decode of a grayscale image
    pub fn decode_gray(&self, gray: &GrayImage) -> Vec<DecodedSymbol> {
        self.run(gray, STILL_LADDER)
    }

    /// Fast two-stage decode for live frames
    pub fn decode_frame(&self, frame: &RgbImage) -> Vec<DecodedSymbol> {
        self.decode_frame_gray(&rgb_frame_to_gray(frame))
    }

    /// Fast two-stage decode of a grayscale frame
    pub fn decode_frame_gray(&self, gray: &GrayImage) -> Vec<DecodedSymbol> {
        self.run(gray, FAST_LADDER)
    }

    /// Exhaustive decode restricted to the centred region covering `ratio`
    /// of each side; coordinates refer to the full image
    pub fn decode_image_in_roi(&self, image: &DynamicImage, ratio: f64) -> Vec<DecodedSymbol> {
        let (roi_gray, roi) = extract_roi(&to_gray(image), ratio);
        if roi.is_empty() {
            return Vec::new();
        }
        remap_all(&self.decode_gray(&roi_gray), &roi)
    }

    /// Load an image file and decode it exhaustively
    pub fn decode_path<P: AsRef<Path>>(&self, path: P) -> Result<Vec<DecodedSymbol>> {
        let image = image::open(path.as_ref())?;
        Ok(self.decode_image(&image))
    }

    fn run(&self, gray: &GrayImage, ladder: &[Stage]) -> Vec<DecodedSymbol> {
        let (width, height) = gray.dimensions();
        if width == 0 || height == 0 {
            warn!("empty image provided");
            return Vec::new();
        }

        let start = Instant::now();
        let outcome = run_ladder(self.engine.as_ref(), gray, ladder, &self.options);
        let symbols = validation::process(outcome.detections, self.options.validate_checksum);
        debug!(
            engine = self.engine.name(),
            stage = outcome.stage.unwrap_or("none"),
            attempts = outcome.attempts,
            count = symbols.len(),
            elapsed_ms = start.elapsed().as_secs_f64() * 1000.0,
            "decode finished"
        );
        symbols
    }
}

impl Default for BarcodeDecoder {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Debug for BarcodeDecoder {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("BarcodeDecoder")
            .field("engine", &self.engine.name())
            .field("options", &self.options)
            .finish()
    }
}
