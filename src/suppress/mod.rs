//! Overlap-based duplicate suppression.
//!
//! Detections are clustered greedily around descending-score seeds; a
//! cluster absorbs every remaining detection whose axis-aligned overlap with
//! the seed reaches the threshold. Rotation never enters the overlap metric:
//! boxes are still axis-aligned at this point in the pipeline.

use crate::detection::{BoundingBox, Detection, Keypoint};

/// Overlap metric used to compare a candidate against a cluster seed.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum OverlapType {
    /// Intersection over the area of the union rect.
    Jaccard,
    /// Intersection over the candidate's own area.
    ModifiedJaccard,
    /// Intersection over union of both areas.
    IntersectionOverUnion,
}

/// Cluster output policy.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum NmsAlgorithm {
    /// Keep the seed detection untouched.
    Default,
    /// Replace the seed's box and keypoints by the score-weighted average
    /// over the cluster; the seed's score is retained.
    Weighted,
}

/// Configuration of the suppression stage.
#[derive(Clone, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct NmsConfig {
    /// Overlap at or above which a candidate joins the seed's cluster.
    pub min_suppression_threshold: f32,
    /// Overlap metric.
    pub overlap_type: OverlapType,
    /// Cluster output policy.
    pub algorithm: NmsAlgorithm,
}

impl Default for NmsConfig {
    fn default() -> Self {
        Self {
            min_suppression_threshold: 0.3,
            overlap_type: OverlapType::IntersectionOverUnion,
            algorithm: NmsAlgorithm::Weighted,
        }
    }
}

/// Deduplicates detections, one output per cluster in seed-selection order.
///
/// Empty input yields empty output. Input order is otherwise irrelevant:
/// candidates are ranked by descending score with the original index as a
/// stable tie-break.
pub fn non_max_suppression(detections: Vec<Detection>, cfg: &NmsConfig) -> Vec<Detection> {
    if detections.is_empty() {
        return detections;
    }

    let mut order: Vec<usize> = (0..detections.len()).collect();
    order.sort_by(|&a, &b| {
        detections[b]
            .score
            .total_cmp(&detections[a].score)
            .then_with(|| a.cmp(&b))
    });

    let mut out = Vec::new();
    let mut remaining = order;
    while !remaining.is_empty() {
        let seed = remaining[0];
        let seed_box = detections[seed].bounding_box;
        let (cluster, rest): (Vec<usize>, Vec<usize>) = remaining.into_iter().partition(|&i| {
            i == seed
                || overlap_similarity(&seed_box, &detections[i].bounding_box, cfg.overlap_type)
                    >= cfg.min_suppression_threshold
        });
        remaining = rest;

        match cfg.algorithm {
            NmsAlgorithm::Default => out.push(detections[seed].clone()),
            NmsAlgorithm::Weighted => out.push(weighted_merge(&detections, seed, &cluster)),
        }
    }
    out
}

/// Score-weighted average of a cluster's boxes and keypoints.
///
/// The seed's score is kept as-is; only geometry is averaged.
fn weighted_merge(detections: &[Detection], seed: usize, cluster: &[usize]) -> Detection {
    let mut total_score = 0.0f32;
    let mut x_min = 0.0f32;
    let mut y_min = 0.0f32;
    let mut x_max = 0.0f32;
    let mut y_max = 0.0f32;
    let num_keypoints = detections[seed].keypoints.len();
    let mut keypoints = vec![Keypoint { x: 0.0, y: 0.0 }; num_keypoints];

    for &i in cluster {
        let det = &detections[i];
        let w = det.score;
        total_score += w;
        x_min += det.bounding_box.x_min() * w;
        y_min += det.bounding_box.y_min() * w;
        x_max += det.bounding_box.x_max() * w;
        y_max += det.bounding_box.y_max() * w;
        for (avg, kp) in keypoints.iter_mut().zip(&det.keypoints) {
            avg.x += kp.x * w;
            avg.y += kp.y * w;
        }
    }

    if total_score <= 0.0 {
        return detections[seed].clone();
    }
    for kp in &mut keypoints {
        kp.x /= total_score;
        kp.y /= total_score;
    }
    Detection {
        score: detections[seed].score,
        bounding_box: BoundingBox::from_corners(
            x_min / total_score,
            y_min / total_score,
            x_max / total_score,
            y_max / total_score,
        ),
        keypoints,
    }
}

fn overlap_similarity(a: &BoundingBox, b: &BoundingBox, overlap_type: OverlapType) -> f32 {
    let intersection = a.intersection_area(b);
    if intersection <= 0.0 {
        return 0.0;
    }
    let normalization = match overlap_type {
        OverlapType::Jaccard => {
            let x_min = a.x_min().min(b.x_min());
            let y_min = a.y_min().min(b.y_min());
            let x_max = a.x_max().max(b.x_max());
            let y_max = a.y_max().max(b.y_max());
            (x_max - x_min) * (y_max - y_min)
        }
        OverlapType::ModifiedJaccard => b.area(),
        OverlapType::IntersectionOverUnion => a.area() + b.area() - intersection,
    };
    if normalization > 0.0 {
        intersection / normalization
    } else {
        0.0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn det(x: f32, y: f32, size: f32, score: f32) -> Detection {
        Detection {
            score,
            bounding_box: BoundingBox {
                x_center: x,
                y_center: y,
                width: size,
                height: size,
            },
            keypoints: Vec::new(),
        }
    }

    #[test]
    fn zero_area_boxes_form_their_own_clusters() {
        let input = vec![det(0.5, 0.5, 0.0, 0.9), det(0.5, 0.5, 0.0, 0.8)];
        let out = non_max_suppression(input, &NmsConfig::default());
        assert_eq!(out.len(), 2);
    }

    #[test]
    fn modified_jaccard_normalizes_by_candidate_area() {
        let a = BoundingBox::from_corners(0.0, 0.0, 0.4, 0.4);
        let b = BoundingBox::from_corners(0.2, 0.0, 0.4, 0.4);
        let sim = overlap_similarity(&a, &b, OverlapType::ModifiedJaccard);
        assert!((sim - 1.0).abs() < 1e-6);
    }
}
