use std::sync::OnceLock;

fn parse_env_u32(name: &str, default: u32) -> u32 {
    std::env::var(name)
        .ok()
        .and_then(|v| v.trim().parse::<u32>().ok())
        .unwrap_or(default)
}

fn parse_env_i32(name: &str, default: i32) -> i32 {
    std::env::var(name)
        .ok()
        .and_then(|v| v.trim().parse::<i32>().ok())
        .unwrap_or(default)
}

/// Shorter-side floor below which stage 2 upscales
pub const DEFAULT_PIXEL_FLOOR: u32 = 500;
/// Shorter-side target for the aggressive upscale stages
pub const DEFAULT_UPSCALE_TARGET: u32 = 600;
/// Adaptive threshold window
pub const DEFAULT_ADAPTIVE_BLOCK: u32 = 11;
/// Adaptive threshold offset
pub const DEFAULT_ADAPTIVE_C: i32 = 2;

static PIXEL_FLOOR: OnceLock<u32> = OnceLock::new();

pub(crate) fn pixel_floor() -> u32 {
    *PIXEL_FLOOR
        .get_or_init(|| parse_env_u32("BARSCAN_PIXEL_FLOOR", DEFAULT_PIXEL_FLOOR).clamp(16, 8192))
}

static UPSCALE_TARGET: OnceLock<u32> = OnceLock::new();

pub(crate) fn upscale_target() -> u32 {
    *UPSCALE_TARGET.get_or_init(|| {
        parse_env_u32("BARSCAN_UPSCALE_TARGET", DEFAULT_UPSCALE_TARGET).clamp(16, 8192)
    })
}

static ADAPTIVE_BLOCK: OnceLock<u32> = OnceLock::new();

/// Always odd, within `3..=51`
pub(crate) fn adaptive_block() -> u32 {
    *ADAPTIVE_BLOCK.get_or_init(|| {
        let block = parse_env_u32("BARSCAN_ADAPTIVE_BLOCK", DEFAULT_ADAPTIVE_BLOCK).clamp(3, 51);
        if block % 2 == 0 { block + 1 } else { block }
    })
}

static ADAPTIVE_C: OnceLock<i32> = OnceLock::new();

pub(crate) fn adaptive_c() -> i32 {
    *ADAPTIVE_C
        .get_or_init(|| parse_env_i32("BARSCAN_ADAPTIVE_C", DEFAULT_ADAPTIVE_C).clamp(-64, 64))
}
