//! Detection-to-rect conversion with keypoint-derived rotation.

use crate::detection::{Detection, ImageSize, NormalizedRect};
use crate::util::math::normalize_radians;
use crate::util::{PoseDetError, PoseDetResult};

/// Configuration of the rect derivation stage.
#[derive(Clone, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct RectConfig {
    /// Keypoint at the tail of the rotation vector.
    pub start_keypoint_index: usize,
    /// Keypoint at the head of the rotation vector.
    pub end_keypoint_index: usize,
    /// Rotation the keypoint vector should end up at, in degrees.
    pub target_angle_degrees: f32,
    /// Emit a single all-zero rect for an empty frame instead of an empty
    /// list, so fixed-arity consumers downstream always receive one rect.
    pub output_zero_rect_for_empty_detections: bool,
}

impl Default for RectConfig {
    /// Pose detector settings: rotate so hip midpoint-to-head keypoints end
    /// up vertical.
    fn default() -> Self {
        Self {
            start_keypoint_index: 0,
            end_keypoint_index: 2,
            target_angle_degrees: 90.0,
            output_zero_rect_for_empty_detections: true,
        }
    }
}

/// Derives one oriented rect per detection.
///
/// The rect copies the detection's box center and size. Rotation is
/// `target_angle - atan2(dy, dx)` of the configured keypoint pair, with the
/// deltas scaled to pixels first so non-square frames do not skew the angle,
/// normalized into [-pi, pi).
pub fn detections_to_rects(
    detections: &[Detection],
    image_size: ImageSize,
    cfg: &RectConfig,
) -> PoseDetResult<Vec<NormalizedRect>> {
    if detections.is_empty() {
        if cfg.output_zero_rect_for_empty_detections {
            return Ok(vec![NormalizedRect::zero()]);
        }
        return Ok(Vec::new());
    }

    let mut rects = Vec::with_capacity(detections.len());
    for det in detections {
        rects.push(detection_to_rect(det, image_size, cfg)?);
    }
    Ok(rects)
}

fn detection_to_rect(
    det: &Detection,
    image_size: ImageSize,
    cfg: &RectConfig,
) -> PoseDetResult<NormalizedRect> {
    let rotation = compute_rotation(det, image_size, cfg)?;
    Ok(NormalizedRect {
        x_center: det.bounding_box.x_center,
        y_center: det.bounding_box.y_center,
        width: det.bounding_box.width,
        height: det.bounding_box.height,
        rotation,
    })
}

fn compute_rotation(
    det: &Detection,
    image_size: ImageSize,
    cfg: &RectConfig,
) -> PoseDetResult<f32> {
    let len = det.keypoints.len();
    let start = *det.keypoints.get(cfg.start_keypoint_index).ok_or(
        PoseDetError::KeypointIndexOutOfRange {
            index: cfg.start_keypoint_index,
            len,
        },
    )?;
    let end =
        *det.keypoints
            .get(cfg.end_keypoint_index)
            .ok_or(PoseDetError::KeypointIndexOutOfRange {
                index: cfg.end_keypoint_index,
                len,
            })?;

    let dx = (end.x - start.x) * image_size.width as f32;
    let dy = (end.y - start.y) * image_size.height as f32;
    let target = cfg.target_angle_degrees.to_radians();
    Ok(normalize_radians(target - dy.atan2(dx)))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::detection::{BoundingBox, Keypoint};

    #[test]
    fn missing_keypoint_index_is_fatal() {
        let det = Detection {
            score: 0.9,
            bounding_box: BoundingBox {
                x_center: 0.5,
                y_center: 0.5,
                width: 0.1,
                height: 0.1,
            },
            keypoints: vec![Keypoint { x: 0.0, y: 0.0 }],
        };
        let cfg = RectConfig::default();
        let err = detections_to_rects(&[det], ImageSize::new(100, 100), &cfg)
            .err()
            .unwrap();
        assert_eq!(err, PoseDetError::KeypointIndexOutOfRange { index: 2, len: 1 });
    }
}
