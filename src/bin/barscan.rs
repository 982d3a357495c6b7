use anyhow::{Context, Result, bail};
use barscan::camera::CameraConfig;
use barscan::decoder::DecoderOptions;
use barscan::tools::{
    ReadingStats, bench_limit_from_env, dataset_iter, dataset_root_from_env, load_image, score_image,
    smoke_from_env,
};
use barscan::{BarcodeDecoder, DecodedSymbol};
use clap::{Args, Parser, Subcommand};
use image::GenericImageView;
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "barscan", version, about = "Retail barcode scanner")]
struct Cli {
    /// Log at debug level regardless of RUST_LOG
    #[arg(long, global = true, env = "BARSCAN_DEBUG")]
    debug: bool,
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Decode barcodes in one or more image files
    Scan {
        #[arg(required = true)]
        images: Vec<PathBuf>,
        /// Print results as JSON
        #[arg(long)]
        json: bool,
        /// Only decode the centred region covering this fraction of each side
        #[arg(long)]
        roi: Option<f64>,
        #[command(flatten)]
        decode: DecodeArgs,
    },
    /// List cameras that can be opened
    Cameras {
        #[arg(long)]
        json: bool,
    },
    /// Scan frames from a camera and print each new barcode
    Live {
        #[command(flatten)]
        camera: CameraArgs,
        /// Stop after this many frames
        #[arg(long)]
        frames: Option<usize>,
        /// Save the last annotated frame here on exit
        #[arg(long)]
        snapshot: Option<PathBuf>,
        #[arg(long)]
        json: bool,
    },
    /// Capture one settled frame from a camera
    Capture {
        #[command(flatten)]
        camera: CameraArgs,
        /// Output image path
        #[arg(long, short)]
        output: PathBuf,
    },
    /// Compute reading rate over a labelled image directory
    ReadingRate {
        #[arg(long)]
        root: Option<PathBuf>,
        #[arg(long)]
        limit: Option<usize>,
        #[arg(long)]
        smoke: bool,
    },
}

#[derive(Args)]
struct DecodeArgs {
    /// Skip the preprocessing stages
    #[arg(long)]
    no_preprocess: bool,
    /// Skip the rotation stages
    #[arg(long)]
    no_rotate: bool,
    /// Do not flag EAN/UPC check digit mismatches
    #[arg(long)]
    no_checksum: bool,
}

impl DecodeArgs {
    fn options(&self) -> DecoderOptions {
        DecoderOptions {
            validate_checksum: !self.no_checksum,
            use_preprocessing: !self.no_preprocess,
            try_rotations: !self.no_rotate,
        }
    }
}

#[derive(Args)]
struct CameraArgs {
    /// JSON camera config; individual flags override it
    #[arg(long, env = "BARSCAN_CONFIG")]
    config: Option<PathBuf>,
    #[arg(long, env = "BARSCAN_DEVICE")]
    device: Option<u32>,
    #[arg(long)]
    width: Option<u32>,
    #[arg(long)]
    height: Option<u32>,
    #[arg(long)]
    fps: Option<u32>,
    #[arg(long)]
    roi_ratio: Option<f64>,
    /// Decode the whole frame
    #[arg(long)]
    no_roi: bool,
    /// Do not draw the region guide
    #[arg(long)]
    no_overlay: bool,
    /// Seconds before the same barcode is reported again
    #[arg(long)]
    duplicate_timeout: Option<f64>,
}

impl CameraArgs {
    fn resolve(&self, debug: bool) -> Result<CameraConfig> {
        let mut config = match &self.config {
            Some(path) => CameraConfig::from_json_file(path)
                .with_context(|| format!("failed to load camera config {}", path.display()))?,
            None => CameraConfig::default(),
        };
        if let Some(device) = self.device {
            config.device_id = device;
        }
        if let Some(width) = self.width {
            config.width = width;
        }
        if let Some(height) = self.height {
            config.height = height;
        }
        if let Some(fps) = self.fps {
            config.target_fps = fps;
        }
        if let Some(ratio) = self.roi_ratio {
            config.roi_ratio = ratio;
        }
        if let Some(timeout) = self.duplicate_timeout {
            config.duplicate_timeout_seconds = timeout;
        }
        config.use_roi &= !self.no_roi;
        config.show_roi_overlay &= !self.no_overlay;
        config.debug_mode |= debug;
        config.validate().context("invalid camera settings")?;
        Ok(config)
    }
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    init_tracing(cli.debug);

    match cli.command {
        Command::Scan {
            images,
            json,
            roi,
            decode,
        } => scan_cmd(&images, json, roi, &decode),
        Command::Cameras { json } => cameras_cmd(json),
        Command::Live {
            camera,
            frames,
            snapshot,
            json,
        } => live_cmd(camera.resolve(cli.debug)?, frames, snapshot.as_deref(), json),
        Command::Capture { camera, output } => capture_cmd(camera.resolve(cli.debug)?, &output),
        Command::ReadingRate { root, limit, smoke } => reading_rate_cmd(root, limit, smoke),
    }
}

fn init_tracing(debug: bool) {
    let filter = if debug {
        EnvFilter::new("debug")
    } else {
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"))
    };
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}

fn print_symbol(symbol: &DecodedSymbol, json: bool) {
    if json {
        match serde_json::to_string(symbol) {
            Ok(line) => println!("{line}"),
            Err(err) => eprintln!("Failed to serialize result: {err}"),
        }
    } else {
        let rect = symbol.bounding_rect();
        println!(
            "  {} {} at ({}, {}) {}x{}{}",
            symbol.symbology(),
            symbol.data(),
            rect.x,
            rect.y,
            rect.width,
            rect.height,
            if symbol.checksum_valid() { "" } else { " [bad check digit]" }
        );
    }
}

fn scan_cmd(images: &[PathBuf], json: bool, roi: Option<f64>, decode: &DecodeArgs) -> Result<()> {
    let decoder = BarcodeDecoder::new().with_options(decode.options());
    let mut report = Vec::with_capacity(images.len());

    for path in images {
        let image = load_image(path).with_context(|| format!("failed to load image {}", path.display()))?;
        let symbols = match roi {
            Some(ratio) => decoder.decode_image_in_roi(&image, ratio),
            None => decoder.decode_image(&image),
        };

        if json {
            report.push(serde_json::json!({
                "path": path.display().to_string(),
                "symbols": symbols,
            }));
        } else {
            let (width, height) = image.dimensions();
            println!("Image: {} ({}x{})", path.display(), width, height);
            println!("Found {} barcodes", symbols.len());
            for symbol in &symbols {
                print_symbol(symbol, false);
            }
        }
    }

    if json {
        println!("{}", serde_json::to_string_pretty(&report)?);
    }
    Ok(())
}

#[cfg(feature = "v4l")]
fn cameras_cmd(json: bool) -> Result<()> {
    let cameras = barscan::camera::list_cameras(&barscan::camera::V4lBackend);
    if json {
        println!("{}", serde_json::to_string_pretty(&cameras)?);
        return Ok(());
    }
    if cameras.is_empty() {
        println!("No cameras found");
    }
    for info in cameras {
        println!("Camera {}: {}x{} @ {:.1} fps", info.id, info.width, info.height, info.fps);
    }
    Ok(())
}

#[cfg(feature = "v4l")]
fn live_cmd(config: CameraConfig, frames: Option<usize>, snapshot: Option<&Path>, json: bool) -> Result<()> {
    use barscan::camera::{CameraScanner, CameraState, V4lBackend};

    let device_id = config.device_id;
    let mut scanner = CameraScanner::new(V4lBackend, config).on_detect(move |symbol| print_symbol(symbol, json));

    let mut seen = 0usize;
    let mut last = None;
    {
        let mut stream = scanner.scan_continuous();
        for (frame, _results) in stream.by_ref() {
            seen += 1;
            last = Some(frame);
            if frames.is_some_and(|limit| seen >= limit) {
                break;
            }
        }
    }

    if scanner.state() == CameraState::Error {
        bail!("failed to start camera {device_id}");
    }
    if let (Some(path), Some(frame)) = (snapshot, last) {
        frame
            .save(path)
            .with_context(|| format!("failed to save snapshot {}", path.display()))?;
    }
    eprintln!("Scanned {seen} frames");
    Ok(())
}

#[cfg(feature = "v4l")]
fn capture_cmd(config: CameraConfig, output: &Path) -> Result<()> {
    use barscan::camera::{CameraScanner, V4lBackend};

    let device_id = config.device_id;
    let mut scanner = CameraScanner::new(V4lBackend, config);
    let Some(frame) = scanner.capture_image() else {
        bail!("failed to capture a frame from camera {device_id}");
    };
    frame
        .save(output)
        .with_context(|| format!("failed to save {}", output.display()))?;
    println!("Saved {}x{} frame to {}", frame.width(), frame.height(), output.display());
    Ok(())
}

#[cfg(not(feature = "v4l"))]
fn cameras_cmd(_json: bool) -> Result<()> {
    bail!("camera support not compiled in; rebuild with --features v4l")
}

#[cfg(not(feature = "v4l"))]
fn live_cmd(_config: CameraConfig, _frames: Option<usize>, _snapshot: Option<&Path>, _json: bool) -> Result<()> {
    bail!("camera support not compiled in; rebuild with --features v4l")
}

#[cfg(not(feature = "v4l"))]
fn capture_cmd(_config: CameraConfig, _output: &Path) -> Result<()> {
    bail!("camera support not compiled in; rebuild with --features v4l")
}

fn reading_rate_cmd(root: Option<PathBuf>, limit: Option<usize>, smoke: bool) -> Result<()> {
    let root = root.unwrap_or_else(dataset_root_from_env);
    let limit = limit.or_else(bench_limit_from_env);
    let smoke = smoke || smoke_from_env();

    if !root.exists() {
        bail!("dataset root not found: {}", root.display());
    }

    let images: Vec<PathBuf> = dataset_iter(&root, limit, smoke).collect();
    if images.is_empty() {
        println!("No images found under {}", root.display());
        return Ok(());
    }

    println!("barscan Reading Rate Benchmark");
    println!("==============================\n");

    let decoder = BarcodeDecoder::new();
    let mut overall = ReadingStats::default();
    let mut categories: BTreeMap<String, ReadingStats> = BTreeMap::new();

    for path in &images {
        let Some(score) = score_image(&decoder, path) else {
            continue;
        };
        overall.record(&score);
        println!(
            "  [{}] {} -> {} ({:.2?})",
            overall.total,
            path.display(),
            if score.hit { "hit" } else { "miss" },
            score.elapsed
        );

        let category = path
            .strip_prefix(&root)
            .ok()
            .and_then(|rel| rel.parent())
            .and_then(|parent| parent.components().next())
            .map(|c| c.as_os_str().to_string_lossy().into_owned())
            .unwrap_or_else(|| ".".to_string());
        categories.entry(category).or_default().record(&score);
    }

    if overall.total == 0 {
        println!("No labelled images found under {}", root.display());
        return Ok(());
    }

    if categories.len() > 1 {
        println!();
        for (name, stats) in &categories {
            println!(
                "  {}: {}/{} = {:.2}% ({:.1} ms avg)",
                name,
                stats.hits,
                stats.total,
                stats.rate(),
                stats.avg_ms()
            );
        }
    }

    println!("\n==============================");
    println!(
        "Reading rate: {}/{} = {:.2}% ({:.1} ms avg)",
        overall.hits,
        overall.total,
        overall.rate(),
        overall.avg_ms()
    );
    println!("==============================");
    Ok(())
}
