//! Region-of-interest cropping and the inverse coordinate mapping

pub mod remap;
pub mod roi;

pub use remap::{remap, remap_all};
pub use roi::{Roi, extract_roi};
