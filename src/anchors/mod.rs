//! SSD prior-box ("anchor") grid generation.
//!
//! The anchor table is generated once at pipeline construction and shared
//! read-only with the tensor decoder for every frame. Generation is fully
//! deterministic: the same configuration always yields the same ordered
//! sequence, with `anchors[i]` aligned to box row `i` of the model output.

use crate::util::{PoseDetError, PoseDetResult};

/// Configuration for the multi-scale anchor grid.
///
/// Mirrors the SSD anchor scheme: one feature-map layer per stride, each cell
/// of a layer emitting one anchor per aspect ratio plus an optional
/// interpolated-scale anchor. Consecutive layers sharing a stride are merged
/// into a single grid pass with the scales of all merged layers.
#[derive(Clone, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct AnchorConfig {
    /// Number of feature-map layers; must equal `strides.len()`.
    pub num_layers: usize,
    /// Scale of the anchors on the first layer.
    pub min_scale: f32,
    /// Scale of the anchors on the last layer.
    pub max_scale: f32,
    /// Model input tensor height in pixels.
    pub input_size_height: u32,
    /// Model input tensor width in pixels.
    pub input_size_width: u32,
    /// Horizontal anchor offset within a grid cell, in cell units.
    pub anchor_offset_x: f32,
    /// Vertical anchor offset within a grid cell, in cell units.
    pub anchor_offset_y: f32,
    /// Stride per layer in pixels.
    pub strides: Vec<u32>,
    /// Aspect ratios (width / height) emitted per cell.
    pub aspect_ratios: Vec<f32>,
    /// Forces width = height = 1.0 on every anchor.
    pub fixed_anchor_size: bool,
    /// Aspect ratio of the extra anchor interpolated between consecutive
    /// layer scales; disabled when not positive.
    pub interpolated_scale_aspect_ratio: f32,
    /// Replaces the first layer's anchors with the reduced 3-anchor set.
    pub reduce_boxes_in_lowest_layer: bool,
}

impl Default for AnchorConfig {
    /// Grid used by the 224x224 pose detection model (2254 anchors).
    fn default() -> Self {
        Self {
            num_layers: 5,
            min_scale: 0.1484375,
            max_scale: 0.75,
            input_size_height: 224,
            input_size_width: 224,
            anchor_offset_x: 0.5,
            anchor_offset_y: 0.5,
            strides: vec![8, 16, 32, 32, 32],
            aspect_ratios: vec![1.0],
            fixed_anchor_size: true,
            interpolated_scale_aspect_ratio: 1.0,
            reduce_boxes_in_lowest_layer: false,
        }
    }
}

/// One prior box, normalized to the model input size.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Anchor {
    /// Horizontal center in [0, 1].
    pub x_center: f32,
    /// Vertical center in [0, 1].
    pub y_center: f32,
    /// Anchor width.
    pub width: f32,
    /// Anchor height.
    pub height: f32,
}

/// Immutable ordered anchor sequence, generated once per pipeline.
pub struct AnchorTable {
    anchors: Vec<Anchor>,
}

impl AnchorTable {
    /// Generates the anchor table for a grid configuration.
    pub fn generate(cfg: &AnchorConfig) -> PoseDetResult<Self> {
        if cfg.num_layers == 0 {
            return Err(PoseDetError::InvalidConfig {
                context: "anchor",
                reason: "num_layers must be positive",
            });
        }
        if cfg.strides.len() != cfg.num_layers {
            return Err(PoseDetError::InvalidConfig {
                context: "anchor",
                reason: "strides length must equal num_layers",
            });
        }
        if cfg.aspect_ratios.is_empty()
            && !cfg.reduce_boxes_in_lowest_layer
            && cfg.interpolated_scale_aspect_ratio <= 0.0
        {
            return Err(PoseDetError::InvalidConfig {
                context: "anchor",
                reason: "no aspect ratios configured",
            });
        }

        let mut anchors = Vec::new();
        let mut layer_id = 0;
        while layer_id < cfg.num_layers {
            let mut anchor_heights = Vec::new();
            let mut anchor_widths = Vec::new();

            // Merge consecutive layers with the same stride into one grid
            // pass carrying every merged layer's scales.
            let mut last_same_stride_layer = layer_id;
            while last_same_stride_layer < cfg.num_layers
                && cfg.strides[last_same_stride_layer] == cfg.strides[layer_id]
            {
                let scale = calculate_scale(
                    cfg.min_scale,
                    cfg.max_scale,
                    last_same_stride_layer,
                    cfg.num_layers,
                );
                if last_same_stride_layer == 0 && cfg.reduce_boxes_in_lowest_layer {
                    for (aspect_ratio, scale) in [(1.0, 0.1), (2.0, scale), (0.5, scale)] {
                        push_dims(&mut anchor_widths, &mut anchor_heights, scale, aspect_ratio);
                    }
                } else {
                    for &aspect_ratio in &cfg.aspect_ratios {
                        push_dims(&mut anchor_widths, &mut anchor_heights, scale, aspect_ratio);
                    }
                    if cfg.interpolated_scale_aspect_ratio > 0.0 {
                        let scale_next = if last_same_stride_layer == cfg.num_layers - 1 {
                            1.0
                        } else {
                            calculate_scale(
                                cfg.min_scale,
                                cfg.max_scale,
                                last_same_stride_layer + 1,
                                cfg.num_layers,
                            )
                        };
                        push_dims(
                            &mut anchor_widths,
                            &mut anchor_heights,
                            (scale * scale_next).sqrt(),
                            cfg.interpolated_scale_aspect_ratio,
                        );
                    }
                }
                last_same_stride_layer += 1;
            }

            let stride = cfg.strides[layer_id];
            let feature_map_height = cfg.input_size_height.div_ceil(stride);
            let feature_map_width = cfg.input_size_width.div_ceil(stride);

            for y in 0..feature_map_height {
                for x in 0..feature_map_width {
                    for anchor_id in 0..anchor_heights.len() {
                        let x_center = (x as f32 + cfg.anchor_offset_x) / feature_map_width as f32;
                        let y_center = (y as f32 + cfg.anchor_offset_y) / feature_map_height as f32;
                        let (width, height) = if cfg.fixed_anchor_size {
                            (1.0, 1.0)
                        } else {
                            (anchor_widths[anchor_id], anchor_heights[anchor_id])
                        };
                        anchors.push(Anchor {
                            x_center,
                            y_center,
                            width,
                            height,
                        });
                    }
                }
            }
            layer_id = last_same_stride_layer;
        }

        Ok(Self { anchors })
    }

    /// Number of anchors in the table.
    pub fn len(&self) -> usize {
        self.anchors.len()
    }

    /// Whether the table is empty.
    pub fn is_empty(&self) -> bool {
        self.anchors.is_empty()
    }

    /// The ordered anchor sequence.
    pub fn as_slice(&self) -> &[Anchor] {
        &self.anchors
    }
}

fn push_dims(widths: &mut Vec<f32>, heights: &mut Vec<f32>, scale: f32, aspect_ratio: f32) {
    let ratio_sqrt = aspect_ratio.sqrt();
    widths.push(scale * ratio_sqrt);
    heights.push(scale / ratio_sqrt);
}

fn calculate_scale(min_scale: f32, max_scale: f32, stride_index: usize, num_strides: usize) -> f32 {
    if num_strides == 1 {
        (min_scale + max_scale) / 2.0
    } else {
        min_scale + (max_scale - min_scale) * stride_index as f32 / (num_strides - 1) as f32
    }
}
