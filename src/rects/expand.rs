//! Rect expansion into a generous region of interest.

use crate::detection::{ImageSize, NormalizedRect};

/// Geometric parameters of the expansion stage.
#[derive(Clone, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct ExpandConfig {
    /// Width multiplier.
    pub scale_x: f32,
    /// Height multiplier.
    pub scale_y: f32,
    /// Center shift along the rect's own x-axis, in final widths.
    pub shift_x: f32,
    /// Center shift along the rect's own y-axis, in final heights.
    pub shift_y: f32,
    /// Squares the rect to its longer pixel side after scaling.
    pub square_long: bool,
}

impl Default for ExpandConfig {
    /// Pose detector ROI expansion.
    fn default() -> Self {
        Self {
            scale_x: 2.6,
            scale_y: 2.6,
            shift_x: 0.0,
            shift_y: -0.5,
            square_long: true,
        }
    }
}

/// Expands and shifts a rect in place.
///
/// Order of operations: scale, square to the longer pixel side, then shift
/// the center along the rect's rotated axes using the final dimensions. The
/// shift uses pixel-aspect-corrected axes so a rotated rect shifts along its
/// own sides even on non-square frames.
pub fn expand_rect(rect: &mut NormalizedRect, image_size: ImageSize, cfg: &ExpandConfig) {
    let image_width = image_size.width as f32;
    let image_height = image_size.height as f32;

    let mut width = rect.width * cfg.scale_x;
    let mut height = rect.height * cfg.scale_y;

    if cfg.square_long {
        let long_side = (width * image_width).max(height * image_height);
        width = long_side / image_width;
        height = long_side / image_height;
    }

    if rect.rotation == 0.0 {
        rect.x_center += width * cfg.shift_x;
        rect.y_center += height * cfg.shift_y;
    } else {
        let (sin, cos) = rect.rotation.sin_cos();
        let x_shift = (image_width * width * cfg.shift_x * cos
            - image_height * height * cfg.shift_y * sin)
            / image_width;
        let y_shift = (image_width * width * cfg.shift_x * sin
            + image_height * height * cfg.shift_y * cos)
            / image_height;
        rect.x_center += x_shift;
        rect.y_center += y_shift;
    }

    rect.width = width;
    rect.height = height;
}

/// Expands a rect sequence, returning the expanded copies.
pub fn expand_rects(
    rects: &[NormalizedRect],
    image_size: ImageSize,
    cfg: &ExpandConfig,
) -> Vec<NormalizedRect> {
    rects
        .iter()
        .map(|rect| {
            let mut expanded = *rect;
            expand_rect(&mut expanded, image_size, cfg);
            expanded
        })
        .collect()
}
