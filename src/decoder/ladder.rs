//! Decode retry ladder.
//!
//! A ladder is an ordered table of [`Stage`]s, each a short list of
//! [`Step`]s applied to the grayscale frame before the engine is called.
//! [`run_ladder`] walks the table once and returns at the first stage whose
//! engine call yields at least one detection. Detections are projected back
//! through any upscale or rotation so coordinates always refer to the frame
//! that was passed in.

use super::config::{adaptive_block, adaptive_c, pixel_floor, upscale_target};
use super::{DecodeEngine, DecoderOptions, RawDetection};
use crate::models::{Point, Rect};
use crate::preprocess::{self, Rotation, binarization, filter, scale};
use image::GrayImage;
use std::collections::HashMap;
use std::time::Instant;
use tracing::{debug, trace, warn};

/// How far an upscale step enlarges the frame
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Scale {
    /// Bring the shorter side to the pixel floor, at least 2x
    ToFloor,
    /// Bring the shorter side to the upscale target, at least 2x
    ToTarget,
}

/// One transform applied ahead of an engine call
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Step {
    /// Cubic upscale
    Upscale(Scale),
    /// Global Otsu threshold
    Otsu,
    /// Denoise, equalize, adaptive threshold, open, close
    Enhance,
    /// 3x3 Gaussian blur
    Blur,
    /// Adaptive local-mean threshold
    Adaptive,
    /// Quarter-turn rotation
    Rotate(Rotation),
}

/// A named entry in a ladder
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Stage {
    /// Name reported in logs and outcomes
    pub name: &'static str,
    /// Transforms applied to the grayscale frame, in order
    pub steps: &'static [Step],
    /// Only run when the frame's shorter side is below the pixel floor
    pub only_below_floor: bool,
    /// Skipped when preprocessing is disabled
    pub needs_preprocessing: bool,
    /// Skipped when rotations are disabled
    pub needs_rotations: bool,
}

impl Stage {
    const fn new(name: &'static str, steps: &'static [Step]) -> Self {
        Self {
            name,
            steps,
            only_below_floor: false,
            needs_preprocessing: false,
            needs_rotations: false,
        }
    }

    const fn below_floor(self) -> Self {
        Self {
            only_below_floor: true,
            ..self
        }
    }

    const fn preprocessing(self) -> Self {
        Self {
            needs_preprocessing: true,
            ..self
        }
    }

    const fn rotations(self) -> Self {
        Self {
            needs_rotations: true,
            ..self
        }
    }

    /// Whether this stage runs for a `width` x `height` frame under `options`
    pub fn enabled(&self, options: &DecoderOptions, width: u32, height: u32, floor: u32) -> bool {
        if self.only_below_floor && !scale::below_floor(width, height, floor) {
            return false;
        }
        if self.needs_preprocessing && !options.use_preprocessing {
            return false;
        }
        if self.needs_rotations && !options.try_rotations {
            return false;
        }
        true
    }
}

use Step::{Adaptive, Blur, Enhance, Otsu, Rotate, Upscale};

/// Exhaustive ladder for still images
pub const STILL_LADDER: &[Stage] = &[
    Stage::new("direct", &[]),
    Stage::new("upscale", &[Upscale(Scale::ToFloor)]).below_floor(),
    Stage::new("otsu", &[Otsu]),
    Stage::new("upscale_otsu", &[Upscale(Scale::ToTarget), Otsu]),
    Stage::new("enhance", &[Enhance]).preprocessing(),
    Stage::new("upscale_enhance", &[Upscale(Scale::ToTarget), Enhance]).preprocessing(),
    Stage::new("rotate_90", &[Rotate(Rotation::Deg90)]).rotations(),
    Stage::new("rotate_180", &[Rotate(Rotation::Deg180)]).rotations(),
    Stage::new("rotate_270", &[Rotate(Rotation::Deg270)]).rotations(),
    Stage::new("enhance_rotate_90", &[Enhance, Rotate(Rotation::Deg90)])
        .preprocessing()
        .rotations(),
    Stage::new("enhance_rotate_180", &[Enhance, Rotate(Rotation::Deg180)])
        .preprocessing()
        .rotations(),
    Stage::new("enhance_rotate_270", &[Enhance, Rotate(Rotation::Deg270)])
        .preprocessing()
        .rotations(),
];

/// Two-stage subset for live frames
pub const FAST_LADDER: &[Stage] = &[
    Stage::new("direct", &[]),
    Stage::new("blur_adaptive", &[Blur, Adaptive]).preprocessing(),
];

#[derive(Debug, Clone, Copy, PartialEq)]
enum Warp {
    Scale { fx: f64, fy: f64 },
    Rotate { rotation: Rotation, width: u32, height: u32 },
}

/// Geometric transforms applied to a frame, recorded so engine coordinates
/// can be mapped back to the source frame
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Geometry {
    warps: Vec<Warp>,
}

impl Geometry {
    /// True when no geometric transform has been applied
    pub fn is_identity(&self) -> bool {
        self.warps.is_empty()
    }

    fn push_scale(&mut self, from: (u32, u32), to: (u32, u32)) {
        if from == to || from.0 == 0 || from.1 == 0 {
            return;
        }
        self.warps.push(Warp::Scale {
            fx: to.0 as f64 / from.0 as f64,
            fy: to.1 as f64 / from.1 as f64,
        });
    }

    fn push_rotation(&mut self, rotation: Rotation, width: u32, height: u32) {
        self.warps.push(Warp::Rotate {
            rotation,
            width,
            height,
        });
    }

    fn to_source(&self, x: f64, y: f64) -> (f64, f64) {
        self.warps.iter().rev().fold((x, y), |(x, y), warp| match *warp {
            Warp::Scale { fx, fy } => (x / fx, y / fy),
            Warp::Rotate {
                rotation,
                width,
                height,
            } => rotation.unrotate_point(x, y, width, height),
        })
    }

    /// Map a point from transformed space back to the source frame
    pub fn map_point(&self, p: Point) -> Point {
        let (x, y) = self.to_source(p.x as f64, p.y as f64);
        Point::new(x.round() as i32, y.round() as i32)
    }

    /// Map a rectangle back to the source frame; the result is the axis
    /// aligned box around the mapped corners
    pub fn map_rect(&self, rect: Rect) -> Rect {
        if self.is_identity() {
            return rect;
        }
        let corners = rect.corners().map(|c| self.map_point(c));
        Rect::bounding(&corners).unwrap_or(rect)
    }

    /// Map a detection back to the source frame
    pub fn map_detection(&self, detection: RawDetection) -> RawDetection {
        if self.is_identity() {
            return detection;
        }
        RawDetection {
            rect: self.map_rect(detection.rect),
            polygon: detection.polygon.iter().map(|&p| self.map_point(p)).collect(),
            ..detection
        }
    }
}

/// Result of one ladder run
#[derive(Debug, Clone, Default, PartialEq)]
pub struct LadderOutcome {
    /// Stage that produced the detections, `None` when every stage failed
    pub stage: Option<&'static str>,
    /// Detections in source-frame coordinates
    pub detections: Vec<RawDetection>,
    /// Number of engine invocations made
    pub attempts: usize,
}

impl LadderOutcome {
    /// True when no stage found anything
    pub fn is_empty(&self) -> bool {
        self.detections.is_empty()
    }
}

fn apply_step(step: Step, gray: &GrayImage, geometry: &mut Geometry) -> GrayImage {
    let (width, height) = gray.dimensions();
    match step {
        Upscale(kind) => {
            let factor = match kind {
                Scale::ToFloor => scale::floor_factor(width, height, pixel_floor()),
                Scale::ToTarget => scale::target_factor(width, height, upscale_target()),
            };
            let out = scale::upscale(gray, factor);
            geometry.push_scale((width, height), out.dimensions());
            out
        }
        Otsu => binarization::otsu_binarize(gray),
        Enhance => preprocess::enhance(gray, adaptive_block(), adaptive_c()),
        Blur => filter::gaussian_blur_3x3(gray),
        Adaptive => binarization::adaptive_binarize(gray, adaptive_block(), adaptive_c()),
        Rotate(rotation) => {
            geometry.push_rotation(rotation, width, height);
            preprocess::rotate(gray, rotation)
        }
    }
}

/// Intermediate images keyed by the step prefix that produced them, so
/// stages sharing a prefix (for example the enhance + rotate sweep) only
/// pay for it once per run
#[derive(Default)]
struct PrefixCache {
    entries: HashMap<Vec<Step>, (GrayImage, Geometry)>,
}

impl PrefixCache {
    fn build(&mut self, source: &GrayImage, steps: &[Step]) -> (GrayImage, Geometry) {
        let mut start = 0;
        let mut current: Option<(GrayImage, Geometry)> = None;
        for len in (1..steps.len()).rev() {
            if let Some(hit) = self.entries.get(&steps[..len]) {
                current = Some(hit.clone());
                start = len;
                break;
            }
        }

        let (mut image, mut geometry) = current.unwrap_or_else(|| (source.clone(), Geometry::default()));
        for (i, &step) in steps.iter().enumerate().skip(start) {
            image = apply_step(step, &image, &mut geometry);
            // Only intermediates are reused; a stage's final image never is
            if i + 1 < steps.len() {
                self.entries
                    .insert(steps[..=i].to_vec(), (image.clone(), geometry.clone()));
            }
        }
        (image, geometry)
    }
}

/// Walk `ladder` over `gray`, stopping at the first stage with detections.
///
/// Engine errors are logged and count as an empty stage. A zero-size frame
/// yields an empty outcome without calling the engine.
pub fn run_ladder(
    engine: &dyn DecodeEngine,
    gray: &GrayImage,
    ladder: &[Stage],
    options: &DecoderOptions,
) -> LadderOutcome {
    let (width, height) = gray.dimensions();
    let mut outcome = LadderOutcome::default();
    if width == 0 || height == 0 {
        return outcome;
    }

    let floor = pixel_floor();
    let mut cache = PrefixCache::default();
    for stage in ladder {
        if !stage.enabled(options, width, height, floor) {
            trace!(stage = stage.name, "stage skipped");
            continue;
        }

        let start = Instant::now();
        let (image, geometry) = if stage.steps.is_empty() {
            (gray.clone(), Geometry::default())
        } else {
            cache.build(gray, stage.steps)
        };

        outcome.attempts += 1;
        let found = match engine.decode(&image) {
            Ok(found) => found,
            Err(err) => {
                warn!(stage = stage.name, engine = engine.name(), error = %err, "decode engine error");
                Vec::new()
            }
        };
        debug!(
            stage = stage.name,
            count = found.len(),
            elapsed_ms = start.elapsed().as_secs_f64() * 1000.0,
            "ladder stage finished"
        );

        if !found.is_empty() {
            outcome.stage = Some(stage.name);
            outcome.detections = found
                .into_iter()
                .map(|d| geometry.map_detection(d))
                .collect();
            return outcome;
        }
    }
    outcome
}
