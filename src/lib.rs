//! Posedet is the post-processing core of an SSD-style body-pose detector.
//!
//! Given raw box-regressor and score tensors plus a fixed anchor grid, the
//! crate decodes scored detections, suppresses duplicates with weighted NMS,
//! projects the survivors back into original-image coordinates and derives
//! expanded, oriented regions of interest for a downstream landmark model.
//! Preprocessing, inference and image handling stay with the host; only the
//! geometry between "raw tensor" and "usable crop window" lives here.

pub mod anchors;
pub mod decode;
pub mod detection;
pub mod pipeline;
pub mod project;
pub mod rects;
pub mod suppress;
mod trace;
pub mod util;

pub use anchors::{Anchor, AnchorConfig, AnchorTable};
pub use decode::{DecoderConfig, TensorDecoder};
pub use detection::{
    detections_to_pixels, BoundingBox, Detection, ImageSize, Keypoint, NormalizedRect,
    ProjectionMatrix, RawTensors,
};
pub use pipeline::{clip_detections, DetectorConfig, FrameOutput, PoseDetector};
pub use project::project_detections;
pub use rects::{detections_to_rects, expand_rect, expand_rects, ExpandConfig, RectConfig};
pub use suppress::{non_max_suppression, NmsAlgorithm, NmsConfig, OverlapType};
pub use util::{PoseDetError, PoseDetResult};
