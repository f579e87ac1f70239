//! Projection of detections from tensor space back into image space.
//!
//! The upstream crop/resize step records its inverse as an affine matrix.
//! Boxes are still axis-aligned here, so the projection maps all four box
//! corners and takes the axis-aligned bounding box of the images; keypoints
//! are mapped directly. Scores and keypoint counts are untouched and no
//! detection is added or dropped.

use crate::detection::{BoundingBox, Detection, ProjectionMatrix};

/// Rewrites every detection in place from tensor-normalized coordinates into
/// image-normalized coordinates.
pub fn project_detections(detections: &mut [Detection], matrix: &ProjectionMatrix) {
    for det in detections.iter_mut() {
        let bb = det.bounding_box;
        let corners = [
            matrix.project_point(bb.x_min(), bb.y_min()),
            matrix.project_point(bb.x_max(), bb.y_min()),
            matrix.project_point(bb.x_max(), bb.y_max()),
            matrix.project_point(bb.x_min(), bb.y_max()),
        ];
        let mut x_min = f32::INFINITY;
        let mut y_min = f32::INFINITY;
        let mut x_max = f32::NEG_INFINITY;
        let mut y_max = f32::NEG_INFINITY;
        for (x, y) in corners {
            x_min = x_min.min(x);
            y_min = y_min.min(y);
            x_max = x_max.max(x);
            y_max = y_max.max(y);
        }
        det.bounding_box = BoundingBox::from_corners(x_min, y_min, x_max, y_max);

        for kp in &mut det.keypoints {
            let (x, y) = matrix.project_point(kp.x, kp.y);
            kp.x = x;
            kp.y = y;
        }
    }
}
