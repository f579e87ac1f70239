//! Oriented region-of-interest derivation and expansion.

mod derive;
mod expand;

pub use derive::{detections_to_rects, RectConfig};
pub use expand::{expand_rect, expand_rects, ExpandConfig};
