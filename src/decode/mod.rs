//! Decoding of raw SSD regressor/score tensors into detections.
//!
//! Each box row holds 4 box deltas followed by keypoint deltas, all relative
//! to the row's anchor. Rows are independent, so the decode loop optionally
//! runs on the rayon pool when the `rayon` feature is enabled and the
//! `parallel` flag is set; sequential and parallel decoding produce
//! identical output.

use crate::anchors::{Anchor, AnchorTable};
use crate::detection::{BoundingBox, Detection, Keypoint, RawTensors};
use crate::util::math::sigmoid;
use crate::util::{PoseDetError, PoseDetResult};

#[cfg(feature = "rayon")]
use rayon::prelude::*;

/// Configuration of the tensor-to-detection decoding step.
#[derive(Clone, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct DecoderConfig {
    /// Number of classes in the score tensor.
    pub num_classes: usize,
    /// Number of box rows; must match the anchor table length.
    pub num_boxes: usize,
    /// Values per box row (box deltas plus keypoint deltas).
    pub num_coords: usize,
    /// Offset of the 4 box deltas within a row.
    pub box_coord_offset: usize,
    /// Offset of the keypoint deltas within a row.
    pub keypoint_coord_offset: usize,
    /// Number of keypoints per detection.
    pub num_keypoints: usize,
    /// Values per keypoint (2 for x/y).
    pub num_values_per_keypoint: usize,
    /// Applies the logistic sigmoid to raw scores.
    pub sigmoid_score: bool,
    /// Clamps raw scores to this magnitude before the sigmoid.
    pub score_clipping_thresh: Option<f32>,
    /// Coordinate order is `[x, y, w, h]` when set, `[y, x, h, w]` otherwise.
    pub reverse_output_order: bool,
    /// Detections scoring below this threshold are dropped.
    pub min_score_thresh: f32,
    /// Per-axis normalization constant for x deltas.
    pub x_scale: f32,
    /// Per-axis normalization constant for y deltas.
    pub y_scale: f32,
    /// Per-axis normalization constant for width deltas.
    pub w_scale: f32,
    /// Per-axis normalization constant for height deltas.
    pub h_scale: f32,
    /// Decodes width/height as `anchor.dim * exp(delta / scale)` instead of
    /// the linear `anchor.dim * delta / scale`.
    pub apply_exponential_on_box_size: bool,
    /// Mirrors all y coordinates (`y -> 1 - y`).
    pub flip_vertically: bool,
    /// Decodes rows on the rayon pool when the `rayon` feature is enabled.
    pub parallel: bool,
}

impl Default for DecoderConfig {
    /// Decoding constants of the 224x224 pose detection model.
    fn default() -> Self {
        Self {
            num_classes: 1,
            num_boxes: 2254,
            num_coords: 12,
            box_coord_offset: 0,
            keypoint_coord_offset: 4,
            num_keypoints: 4,
            num_values_per_keypoint: 2,
            sigmoid_score: true,
            score_clipping_thresh: Some(100.0),
            reverse_output_order: true,
            min_score_thresh: 0.5,
            x_scale: 224.0,
            y_scale: 224.0,
            w_scale: 224.0,
            h_scale: 224.0,
            apply_exponential_on_box_size: false,
            flip_vertically: false,
            parallel: false,
        }
    }
}

/// Decodes raw tensors against an anchor table.
pub struct TensorDecoder {
    cfg: DecoderConfig,
}

impl TensorDecoder {
    /// Creates a decoder, validating the row layout.
    pub fn new(cfg: DecoderConfig) -> PoseDetResult<Self> {
        if cfg.box_coord_offset + 4 > cfg.num_coords {
            return Err(PoseDetError::InvalidConfig {
                context: "decoder",
                reason: "box coordinates exceed num_coords",
            });
        }
        if cfg.keypoint_coord_offset + cfg.num_keypoints * cfg.num_values_per_keypoint
            > cfg.num_coords
        {
            return Err(PoseDetError::InvalidConfig {
                context: "decoder",
                reason: "keypoint coordinates exceed num_coords",
            });
        }
        if cfg.num_values_per_keypoint < 2 && cfg.num_keypoints > 0 {
            return Err(PoseDetError::InvalidConfig {
                context: "decoder",
                reason: "num_values_per_keypoint must be at least 2",
            });
        }
        if cfg.num_classes == 0 {
            return Err(PoseDetError::InvalidConfig {
                context: "decoder",
                reason: "num_classes must be positive",
            });
        }
        Ok(Self { cfg })
    }

    /// Returns the decoder configuration.
    pub fn config(&self) -> &DecoderConfig {
        &self.cfg
    }

    /// Decodes one frame of raw tensors into score-filtered detections.
    ///
    /// Output follows tensor row order. Rows below `min_score_thresh` are
    /// skipped; an all-quiet frame yields an empty vector, not an error.
    pub fn decode(
        &self,
        anchors: &AnchorTable,
        tensors: &RawTensors<'_>,
    ) -> PoseDetResult<Vec<Detection>> {
        let cfg = &self.cfg;
        let expected_boxes = cfg.num_boxes * cfg.num_coords;
        if tensors.boxes.len() != expected_boxes {
            return Err(PoseDetError::TensorSizeMismatch {
                context: "boxes",
                expected: expected_boxes,
                got: tensors.boxes.len(),
            });
        }
        let expected_scores = cfg.num_boxes * cfg.num_classes;
        if tensors.scores.len() != expected_scores {
            return Err(PoseDetError::TensorSizeMismatch {
                context: "scores",
                expected: expected_scores,
                got: tensors.scores.len(),
            });
        }
        if anchors.len() != cfg.num_boxes {
            return Err(PoseDetError::AnchorCountMismatch {
                anchors: anchors.len(),
                num_boxes: cfg.num_boxes,
            });
        }

        #[cfg(feature = "rayon")]
        if cfg.parallel {
            return Ok((0..cfg.num_boxes)
                .into_par_iter()
                .filter_map(|row| self.decode_row(row, anchors.as_slice(), tensors))
                .collect());
        }

        Ok((0..cfg.num_boxes)
            .filter_map(|row| self.decode_row(row, anchors.as_slice(), tensors))
            .collect())
    }

    /// Decodes a single box row, or `None` when it fails the score threshold.
    fn decode_row(
        &self,
        row: usize,
        anchors: &[Anchor],
        tensors: &RawTensors<'_>,
    ) -> Option<Detection> {
        let cfg = &self.cfg;

        let score = self.row_score(&tensors.scores[row * cfg.num_classes..][..cfg.num_classes]);
        if score < cfg.min_score_thresh {
            return None;
        }

        let raw = &tensors.boxes[row * cfg.num_coords..][..cfg.num_coords];
        let anchor = &anchors[row];

        let b = &raw[cfg.box_coord_offset..];
        let (dx, dy, dw, dh) = if cfg.reverse_output_order {
            (b[0], b[1], b[2], b[3])
        } else {
            (b[1], b[0], b[3], b[2])
        };

        let x_center = dx / cfg.x_scale * anchor.width + anchor.x_center;
        let mut y_center = dy / cfg.y_scale * anchor.height + anchor.y_center;
        let (width, height) = if cfg.apply_exponential_on_box_size {
            (
                (dw / cfg.w_scale).exp() * anchor.width,
                (dh / cfg.h_scale).exp() * anchor.height,
            )
        } else {
            (
                dw / cfg.w_scale * anchor.width,
                dh / cfg.h_scale * anchor.height,
            )
        };
        if cfg.flip_vertically {
            y_center = 1.0 - y_center;
        }

        let mut keypoints = Vec::with_capacity(cfg.num_keypoints);
        for k in 0..cfg.num_keypoints {
            let offset = cfg.keypoint_coord_offset + k * cfg.num_values_per_keypoint;
            let (kx, ky) = if cfg.reverse_output_order {
                (raw[offset], raw[offset + 1])
            } else {
                (raw[offset + 1], raw[offset])
            };
            let x = kx / cfg.x_scale * anchor.width + anchor.x_center;
            let mut y = ky / cfg.y_scale * anchor.height + anchor.y_center;
            if cfg.flip_vertically {
                y = 1.0 - y;
            }
            keypoints.push(Keypoint { x, y });
        }

        Some(Detection {
            score,
            bounding_box: BoundingBox {
                x_center,
                y_center,
                width,
                height,
            },
            keypoints,
        })
    }

    /// Activated score for a row: max over classes, clipped sigmoid when
    /// configured.
    fn row_score(&self, class_scores: &[f32]) -> f32 {
        let cfg = &self.cfg;
        let mut best = f32::NEG_INFINITY;
        for &raw in class_scores {
            let score = if cfg.sigmoid_score {
                let clipped = match cfg.score_clipping_thresh {
                    Some(thresh) => raw.clamp(-thresh, thresh),
                    None => raw,
                };
                sigmoid(clipped)
            } else {
                raw
            };
            if score > best {
                best = score;
            }
        }
        best
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn keypoint_layout_past_row_end_is_rejected() {
        let cfg = DecoderConfig {
            num_coords: 10,
            num_keypoints: 4,
            keypoint_coord_offset: 4,
            ..DecoderConfig::default()
        };
        assert_eq!(
            TensorDecoder::new(cfg).err().unwrap(),
            PoseDetError::InvalidConfig {
                context: "decoder",
                reason: "keypoint coordinates exceed num_coords",
            }
        );
    }
}
