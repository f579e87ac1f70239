//! Core data types shared by the pipeline stages.
//!
//! Boxes and keypoints are kept in normalized coordinates throughout the
//! pipeline; pixel coordinates only appear in the final
//! [`Detection::to_pixels`] conversion. Boxes use center form because both
//! anchor decoding and the weighted suppression average operate on centers;
//! corner accessors are derived on demand.

/// Size of the original input frame in pixels.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct ImageSize {
    /// Frame width in pixels.
    pub width: u32,
    /// Frame height in pixels.
    pub height: u32,
}

impl ImageSize {
    /// Creates a new image size.
    pub fn new(width: u32, height: u32) -> Self {
        Self { width, height }
    }
}

/// A single 2D keypoint.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Keypoint {
    /// Horizontal coordinate.
    pub x: f32,
    /// Vertical coordinate.
    pub y: f32,
}

/// Axis-aligned bounding box in center form.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct BoundingBox {
    /// Horizontal center.
    pub x_center: f32,
    /// Vertical center.
    pub y_center: f32,
    /// Box width, non-negative.
    pub width: f32,
    /// Box height, non-negative.
    pub height: f32,
}

impl BoundingBox {
    /// Rebuilds a center-form box from min/max corners.
    pub fn from_corners(x_min: f32, y_min: f32, x_max: f32, y_max: f32) -> Self {
        Self {
            x_center: (x_min + x_max) / 2.0,
            y_center: (y_min + y_max) / 2.0,
            width: x_max - x_min,
            height: y_max - y_min,
        }
    }

    /// Left edge.
    pub fn x_min(&self) -> f32 {
        self.x_center - self.width / 2.0
    }

    /// Right edge.
    pub fn x_max(&self) -> f32 {
        self.x_center + self.width / 2.0
    }

    /// Top edge.
    pub fn y_min(&self) -> f32 {
        self.y_center - self.height / 2.0
    }

    /// Bottom edge.
    pub fn y_max(&self) -> f32 {
        self.y_center + self.height / 2.0
    }

    /// Box area.
    pub fn area(&self) -> f32 {
        self.width * self.height
    }

    /// Area of the intersection with another box, zero when disjoint.
    pub fn intersection_area(&self, other: &BoundingBox) -> f32 {
        let x_overlap = (self.x_max().min(other.x_max()) - self.x_min().max(other.x_min())).max(0.0);
        let y_overlap = (self.y_max().min(other.y_max()) - self.y_min().max(other.y_min())).max(0.0);
        x_overlap * y_overlap
    }
}

/// One decoded detection with its score and keypoints.
///
/// The keypoint count is fixed by the decoder configuration and preserved by
/// every later stage.
#[derive(Clone, Debug, PartialEq)]
pub struct Detection {
    /// Detection confidence in [0, 1] after score activation.
    pub score: f32,
    /// Bounding box in normalized coordinates.
    pub bounding_box: BoundingBox,
    /// Keypoints in normalized coordinates, decoder-configured count.
    pub keypoints: Vec<Keypoint>,
}

impl Detection {
    /// Converts the detection to pixel coordinates for the given frame size.
    pub fn to_pixels(&self, image_size: ImageSize) -> Detection {
        let w = image_size.width as f32;
        let h = image_size.height as f32;
        Detection {
            score: self.score,
            bounding_box: BoundingBox {
                x_center: self.bounding_box.x_center * w,
                y_center: self.bounding_box.y_center * h,
                width: self.bounding_box.width * w,
                height: self.bounding_box.height * h,
            },
            keypoints: self
                .keypoints
                .iter()
                .map(|kp| Keypoint {
                    x: kp.x * w,
                    y: kp.y * h,
                })
                .collect(),
        }
    }
}

/// Converts a slice of normalized detections to pixel coordinates.
pub fn detections_to_pixels(detections: &[Detection], image_size: ImageSize) -> Vec<Detection> {
    detections.iter().map(|d| d.to_pixels(image_size)).collect()
}

/// Oriented rectangle in normalized image coordinates.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct NormalizedRect {
    /// Horizontal center in [0, 1].
    pub x_center: f32,
    /// Vertical center in [0, 1].
    pub y_center: f32,
    /// Rect width, non-negative.
    pub width: f32,
    /// Rect height, non-negative.
    pub height: f32,
    /// Rotation in radians, counter-clockwise.
    pub rotation: f32,
}

impl NormalizedRect {
    /// The all-zero rect emitted for empty frames.
    pub fn zero() -> Self {
        Self {
            x_center: 0.0,
            y_center: 0.0,
            width: 0.0,
            height: 0.0,
            rotation: 0.0,
        }
    }
}

/// Row-major 4x4 affine transform from tensor-normalized space back into
/// image-normalized space, as recorded by the upstream crop/resize step.
///
/// Only the 2D affine part is consulted: rows 0 and 1, columns 0, 1 and 3.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct ProjectionMatrix {
    m: [[f32; 4]; 4],
}

impl ProjectionMatrix {
    /// Wraps a row-major 4x4 matrix.
    pub fn from_rows(m: [[f32; 4]; 4]) -> Self {
        Self { m }
    }

    /// Identity transform; projection leaves points unchanged.
    pub fn identity() -> Self {
        let mut m = [[0.0; 4]; 4];
        for (i, row) in m.iter_mut().enumerate() {
            row[i] = 1.0;
        }
        Self { m }
    }

    /// Pure translation by `(tx, ty)`.
    pub fn translation(tx: f32, ty: f32) -> Self {
        let mut mat = Self::identity();
        mat.m[0][3] = tx;
        mat.m[1][3] = ty;
        mat
    }

    /// Applies the affine map to a point.
    pub fn project_point(&self, x: f32, y: f32) -> (f32, f32) {
        (
            self.m[0][0] * x + self.m[0][1] * y + self.m[0][3],
            self.m[1][0] * x + self.m[1][1] * y + self.m[1][3],
        )
    }
}

/// Raw model output for one frame.
///
/// `boxes` is row-major `(num_boxes, num_coords)`; `scores` is row-major
/// `(num_boxes, num_classes)`. Both are borrowed from the inference runtime
/// and consumed exactly once per frame.
#[derive(Clone, Copy, Debug)]
pub struct RawTensors<'a> {
    /// Box regressor tensor.
    pub boxes: &'a [f32],
    /// Class score tensor.
    pub scores: &'a [f32],
}
