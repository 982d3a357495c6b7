#![allow(clippy::items_after_test_module)]

use crate::models::DecodedSymbol;
use crate::pipeline::BarcodeDecoder;
use image::{DynamicImage, GenericImageView};
use std::env;
use std::fs;
use std::path::{Path, PathBuf};
use std::time::{Duration, Instant};

fn max_dim_from_env() -> Option<u32> {
    match env::var("BARSCAN_MAX_DIM") {
        Ok(value) => match value.trim().parse::<u32>() {
            Ok(0) => None,
            Ok(v) => Some(v),
            Err(_) => None,
        },
        Err(_) => None,
    }
}

/// Load an image, shrinking it to `BARSCAN_MAX_DIM` on its longest side when set.
pub fn load_image<P: AsRef<Path>>(path: P) -> Result<DynamicImage, image::ImageError> {
    let img = image::open(path)?;
    if let Some(max_dim) = max_dim_from_env() {
        let (orig_w, orig_h) = img.dimensions();
        if orig_w.max(orig_h) > max_dim {
            return Ok(img.resize(max_dim, max_dim, image::imageops::FilterType::Triangle));
        }
    }
    Ok(img)
}

/// Default dataset root from environment variables.
pub fn dataset_root_from_env() -> PathBuf {
    env::var("BARSCAN_DATASET_ROOT")
        .map(PathBuf::from)
        .unwrap_or_else(|_| PathBuf::from("benches/images"))
}

/// Default bench limit from environment variables.
///
/// Returns `None` (full dataset) when `BARSCAN_BENCH_LIMIT` is unset or `0`.
pub fn bench_limit_from_env() -> Option<usize> {
    match env::var("BARSCAN_BENCH_LIMIT") {
        Ok(value) => value
            .parse::<usize>()
            .ok()
            .and_then(|v| if v == 0 { None } else { Some(v) }),
        Err(_) => None,
    }
}

/// Smoke test flag from environment variables.
pub fn smoke_from_env() -> bool {
    matches!(
        env::var("BARSCAN_SMOKE").as_deref(),
        Ok("1") | Ok("true") | Ok("TRUE") | Ok("yes") | Ok("YES")
    )
}

/// Expected payloads from the label file next to an image.
///
/// `shelf_01.jpg` is labelled by `shelf_01.txt`, one payload per line.
/// Blank lines and `#` comments are skipped. Returns `None` when the image
/// has no label file.
pub fn expected_payloads<P: AsRef<Path>>(image_path: P) -> Option<Vec<String>> {
    let content = fs::read_to_string(image_path.as_ref().with_extension("txt")).ok()?;
    Some(
        content
            .lines()
            .map(str::trim)
            .filter(|line| !line.is_empty() && !line.starts_with('#'))
            .map(str::to_string)
            .collect(),
    )
}

/// True when every expected payload is among the decoded symbols.
///
/// An empty expectation is satisfied only by decoding nothing.
pub fn matches_expected(decoded: &[DecodedSymbol], expected: &[String]) -> bool {
    if expected.is_empty() {
        return decoded.is_empty();
    }
    expected
        .iter()
        .all(|want| decoded.iter().any(|s| s.data() == want))
}

/// Outcome of decoding one labelled image.
#[derive(Debug, Clone)]
pub struct ImageScore {
    /// Image path
    pub path: PathBuf,
    /// All expected payloads were found
    pub hit: bool,
    /// Number of symbols decoded
    pub found: usize,
    /// Decode time, excluding image loading
    pub elapsed: Duration,
}

/// Decode one image and compare it with its label file.
///
/// Returns `None` for unlabelled images; load failures count as misses.
pub fn score_image(decoder: &BarcodeDecoder, path: &Path) -> Option<ImageScore> {
    let expected = expected_payloads(path)?;
    let Ok(image) = load_image(path) else {
        return Some(ImageScore {
            path: path.to_path_buf(),
            hit: false,
            found: 0,
            elapsed: Duration::ZERO,
        });
    };

    let start = Instant::now();
    let decoded = decoder.decode_image(&image);
    let elapsed = start.elapsed();
    Some(ImageScore {
        path: path.to_path_buf(),
        hit: matches_expected(&decoded, &expected),
        found: decoded.len(),
        elapsed,
    })
}

/// Running totals for a reading-rate run.
#[derive(Debug, Clone, Copy, Default)]
pub struct ReadingStats {
    /// Labelled images attempted
    pub total: usize,
    /// Images where every expected payload was found
    pub hits: usize,
    /// Summed decode time
    pub elapsed: Duration,
}

impl ReadingStats {
    /// Fold one image into the totals.
    pub fn record(&mut self, score: &ImageScore) {
        self.total += 1;
        if score.hit {
            self.hits += 1;
        }
        self.elapsed += score.elapsed;
    }

    /// Hit rate in percent, zero when nothing was attempted.
    pub fn rate(&self) -> f64 {
        if self.total == 0 {
            0.0
        } else {
            self.hits as f64 / self.total as f64 * 100.0
        }
    }

    /// Mean decode time per image in milliseconds.
    pub fn avg_ms(&self) -> f64 {
        if self.total == 0 {
            0.0
        } else {
            self.elapsed.as_secs_f64() * 1000.0 / self.total as f64
        }
    }
}


/// Iterate dataset image paths with optional smoke list and limit.
pub fn dataset_iter<P: AsRef<Path>>(
    root: P,
    limit: Option<usize>,
    smoke: bool,
) -> impl Iterator<Item = PathBuf> {
    let root = root.as_ref();
    let mut images = if smoke {
        load_smoke_list(root).unwrap_or_else(|| collect_images(root))
    } else {
        collect_images(root)
    };

    images.sort();
    if let Some(limit) = limit {
        images.truncate(limit);
    }
    images.into_iter()
}

fn load_smoke_list(root: &Path) -> Option<Vec<PathBuf>> {
    let contents = fs::read_to_string(root.join("_smoke.txt")).ok()?;
    let paths: Vec<PathBuf> = contents
        .lines()
        .map(str::trim)
        .filter(|line| !line.is_empty() && !line.starts_with('#'))
        .map(|line| {
            let candidate = Path::new(line);
            if candidate.is_absolute() {
                candidate.to_path_buf()
            } else {
                root.join(candidate)
            }
        })
        .filter(|path| path.exists())
        .collect();
    if paths.is_empty() { None } else { Some(paths) }
}

fn collect_images(root: &Path) -> Vec<PathBuf> {
    let mut stack = vec![root.to_path_buf()];
    let mut images = Vec::new();

    while let Some(dir) = stack.pop() {
        let entries = match fs::read_dir(&dir) {
            Ok(entries) => entries,
            Err(_) => continue,
        };

        for entry in entries.flatten() {
            let path = entry.path();
            if path.is_dir() {
                stack.push(path);
                continue;
            }
            if let Some(ext) = path.extension() {
                let ext = ext.to_string_lossy().to_lowercase();
                if matches!(ext.as_str(), "png" | "jpg" | "jpeg" | "gif" | "bmp") {
                    images.push(path);
                }
            }
        }
    }

    images
}
