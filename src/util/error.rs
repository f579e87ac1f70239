//! Error types for posedet.

use thiserror::Error;

/// Result alias for posedet operations.
pub type PoseDetResult<T> = std::result::Result<T, PoseDetError>;

/// Errors that can occur when configuring or running the detection pipeline.
///
/// All variants are fatal configuration or input-shape errors. Empty frames
/// and degenerate (zero-area) geometry are valid states, not errors.
#[derive(Debug, Error, PartialEq)]
pub enum PoseDetError {
    /// A configuration value or combination of values is inconsistent.
    #[error("invalid {context} configuration: {reason}")]
    InvalidConfig {
        /// Which configuration struct is at fault.
        context: &'static str,
        /// Human-readable description of the inconsistency.
        reason: &'static str,
    },
    /// A raw tensor does not have the declared number of elements.
    #[error("tensor size mismatch for {context}: expected {expected} elements, got {got}")]
    TensorSizeMismatch {
        /// Which tensor is at fault.
        context: &'static str,
        /// Expected element count per the decoder configuration.
        expected: usize,
        /// Actual element count supplied.
        got: usize,
    },
    /// The anchor table length does not match the configured box count.
    #[error("anchor table has {anchors} anchors but decoder expects {num_boxes} boxes")]
    AnchorCountMismatch {
        /// Number of anchors in the generated table.
        anchors: usize,
        /// `num_boxes` declared in the decoder configuration.
        num_boxes: usize,
    },
    /// A rotation keypoint index refers past the end of a detection's keypoints.
    #[error("keypoint index {index} out of range for {len} keypoints")]
    KeypointIndexOutOfRange {
        /// The offending keypoint index.
        index: usize,
        /// Number of keypoints available on the detection.
        len: usize,
    },
}
