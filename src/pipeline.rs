//! The per-frame detection pipeline.
//!
//! `PoseDetector` owns the anchor table (generated once at construction,
//! immutable afterwards) and chains the per-frame stages by value: decode,
//! suppress, project, limit, derive rects, expand rects. `detect` takes
//! `&self` and touches no shared mutable state, so frames may be processed
//! from multiple threads concurrently.

use crate::anchors::{AnchorConfig, AnchorTable};
use crate::decode::{DecoderConfig, TensorDecoder};
use crate::detection::{
    detections_to_pixels, Detection, ImageSize, NormalizedRect, ProjectionMatrix, RawTensors,
};
use crate::project::project_detections;
use crate::rects::{detections_to_rects, expand_rects, ExpandConfig, RectConfig};
use crate::suppress::{non_max_suppression, NmsConfig};
use crate::trace::{trace_event, trace_span};
use crate::util::{PoseDetError, PoseDetResult};

/// Full pipeline configuration, supplied once at construction.
#[derive(Clone, Debug, Default, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct DetectorConfig {
    /// Anchor grid parameters.
    pub anchors: AnchorConfig,
    /// Tensor decoding constants.
    pub decoder: DecoderConfig,
    /// Suppression threshold and algorithm.
    pub nms: NmsConfig,
    /// Rotation keypoints and empty-frame policy.
    pub rect: RectConfig,
    /// ROI expansion geometry.
    pub expand: ExpandConfig,
    /// Caps the detection count after projection when set.
    pub max_poses: Option<usize>,
}

/// Outputs of one processed frame.
#[derive(Clone, Debug)]
pub struct FrameOutput {
    /// Detections in pixel coordinates of the original frame.
    pub detections: Vec<Detection>,
    /// Per-detection oriented rects in normalized image coordinates.
    pub pose_rects: Vec<NormalizedRect>,
    /// Expanded rects, sized to contain the whole subject; the crop windows
    /// for a downstream landmark model.
    pub expanded_rects: Vec<NormalizedRect>,
}

/// Detection post-processing pipeline with a cached anchor table.
pub struct PoseDetector {
    anchors: AnchorTable,
    decoder: TensorDecoder,
    cfg: DetectorConfig,
}

impl PoseDetector {
    /// Builds the pipeline, generating and validating the anchor table.
    pub fn new(cfg: DetectorConfig) -> PoseDetResult<Self> {
        let anchors = AnchorTable::generate(&cfg.anchors)?;
        if anchors.len() != cfg.decoder.num_boxes {
            return Err(PoseDetError::AnchorCountMismatch {
                anchors: anchors.len(),
                num_boxes: cfg.decoder.num_boxes,
            });
        }
        let decoder = TensorDecoder::new(cfg.decoder.clone())?;
        Ok(Self {
            anchors,
            decoder,
            cfg,
        })
    }

    /// The cached anchor table.
    pub fn anchors(&self) -> &AnchorTable {
        &self.anchors
    }

    /// Processes one frame of raw model output.
    ///
    /// `matrix` is the affine transform recorded by the upstream crop/resize
    /// step; `image_size` is the original frame size in pixels. A frame with
    /// no surviving detections is a valid result: the detection lists come
    /// back empty and the rect lists hold the single zero rect when the
    /// empty-frame policy is enabled.
    pub fn detect(
        &self,
        tensors: &RawTensors<'_>,
        matrix: &ProjectionMatrix,
        image_size: ImageSize,
    ) -> PoseDetResult<FrameOutput> {
        let _span = trace_span!("detect_frame").entered();

        let decoded = self.decoder.decode(&self.anchors, tensors)?;
        trace_event!("decoded", count = decoded.len());

        let mut detections = non_max_suppression(decoded, &self.cfg.nms);
        trace_event!("suppressed", count = detections.len());

        project_detections(&mut detections, matrix);
        clip_detections(&mut detections, self.cfg.max_poses);

        let pose_rects = detections_to_rects(&detections, image_size, &self.cfg.rect)?;
        let expanded_rects = expand_rects(&pose_rects, image_size, &self.cfg.expand);
        let pixel_detections = detections_to_pixels(&detections, image_size);

        Ok(FrameOutput {
            detections: pixel_detections,
            pose_rects,
            expanded_rects,
        })
    }
}

/// Truncates an already priority-ordered detection list to `max_poses`.
///
/// Pass-through when the limit is unset or not exceeded; never re-sorts.
pub fn clip_detections(detections: &mut Vec<Detection>, max_poses: Option<usize>) {
    if let Some(max) = max_poses {
        if detections.len() > max {
            detections.truncate(max);
        }
    }
}
