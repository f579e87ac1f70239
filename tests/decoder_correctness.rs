use posedet::{
    AnchorConfig, AnchorTable, DecoderConfig, PoseDetError, RawTensors, TensorDecoder,
};

/// Single anchor centered at (0.5, 0.5) with unit dimensions.
fn single_anchor() -> AnchorTable {
    AnchorTable::generate(&AnchorConfig {
        num_layers: 1,
        min_scale: 0.5,
        max_scale: 0.5,
        input_size_height: 64,
        input_size_width: 64,
        anchor_offset_x: 0.5,
        anchor_offset_y: 0.5,
        strides: vec![64],
        aspect_ratios: vec![1.0],
        fixed_anchor_size: true,
        interpolated_scale_aspect_ratio: 0.0,
        reduce_boxes_in_lowest_layer: false,
    })
    .unwrap()
}

fn single_box_config() -> DecoderConfig {
    DecoderConfig {
        num_classes: 1,
        num_boxes: 1,
        num_coords: 12,
        box_coord_offset: 0,
        keypoint_coord_offset: 4,
        num_keypoints: 4,
        num_values_per_keypoint: 2,
        sigmoid_score: true,
        score_clipping_thresh: Some(100.0),
        reverse_output_order: true,
        min_score_thresh: 0.5,
        x_scale: 128.0,
        y_scale: 128.0,
        w_scale: 128.0,
        h_scale: 128.0,
        apply_exponential_on_box_size: false,
        flip_vertically: false,
        parallel: false,
    }
}

fn sigmoid(x: f32) -> f32 {
    1.0 / (1.0 + (-x).exp())
}

#[test]
fn decoded_score_is_clipped_sigmoid() {
    let anchors = single_anchor();
    let decoder = TensorDecoder::new(single_box_config()).unwrap();

    let boxes = vec![0.0f32; 12];
    let scores = vec![0.8f32];
    let dets = decoder
        .decode(&anchors, &RawTensors { boxes: &boxes, scores: &scores })
        .unwrap();
    assert_eq!(dets.len(), 1);
    assert_eq!(dets[0].score, sigmoid(0.8));

    // A raw score past the clipping threshold saturates at sigmoid(100).
    let scores = vec![250.0f32];
    let dets = decoder
        .decode(&anchors, &RawTensors { boxes: &boxes, scores: &scores })
        .unwrap();
    assert_eq!(dets[0].score, sigmoid(100.0));
}

#[test]
fn decoded_center_is_anchor_plus_scaled_delta() {
    let anchors = single_anchor();
    let decoder = TensorDecoder::new(single_box_config()).unwrap();

    let mut boxes = vec![0.0f32; 12];
    boxes[0] = 16.0; // dx
    boxes[1] = -32.0; // dy
    boxes[2] = 25.6; // dw
    boxes[3] = 12.8; // dh
    let scores = vec![5.0f32];
    let dets = decoder
        .decode(&anchors, &RawTensors { boxes: &boxes, scores: &scores })
        .unwrap();
    let bb = dets[0].bounding_box;
    assert!((bb.x_center - (0.5 + 16.0 / 128.0)).abs() < 1e-6);
    assert!((bb.y_center - (0.5 - 32.0 / 128.0)).abs() < 1e-6);
    assert!((bb.width - 0.2).abs() < 1e-6);
    assert!((bb.height - 0.1).abs() < 1e-6);
}

#[test]
fn rows_below_threshold_never_appear() {
    let anchors = single_anchor();
    let decoder = TensorDecoder::new(single_box_config()).unwrap();

    let boxes = vec![0.0f32; 12];
    // sigmoid(-1.0) is about 0.27, below the 0.5 threshold.
    let scores = vec![-1.0f32];
    let dets = decoder
        .decode(&anchors, &RawTensors { boxes: &boxes, scores: &scores })
        .unwrap();
    assert!(dets.is_empty());
}

#[test]
fn coordinate_order_flag_swaps_axes() {
    let anchors = single_anchor();
    let decoder = TensorDecoder::new(DecoderConfig {
        reverse_output_order: false,
        ..single_box_config()
    })
    .unwrap();

    let mut boxes = vec![0.0f32; 12];
    boxes[0] = -32.0; // dy first
    boxes[1] = 16.0; // then dx
    boxes[4] = 12.8; // keypoint 0: y first
    boxes[5] = 6.4; // then x
    let scores = vec![5.0f32];
    let dets = decoder
        .decode(&anchors, &RawTensors { boxes: &boxes, scores: &scores })
        .unwrap();
    let bb = dets[0].bounding_box;
    assert!((bb.x_center - (0.5 + 16.0 / 128.0)).abs() < 1e-6);
    assert!((bb.y_center - (0.5 - 32.0 / 128.0)).abs() < 1e-6);
    let kp = dets[0].keypoints[0];
    assert!((kp.x - (0.5 + 6.4 / 128.0)).abs() < 1e-6);
    assert!((kp.y - (0.5 + 12.8 / 128.0)).abs() < 1e-6);
}

#[test]
fn exponential_size_policy_exponentiates_deltas() {
    let anchors = single_anchor();
    let decoder = TensorDecoder::new(DecoderConfig {
        apply_exponential_on_box_size: true,
        ..single_box_config()
    })
    .unwrap();

    let mut boxes = vec![0.0f32; 12];
    boxes[2] = 128.0; // dw / w_scale = 1.0
    boxes[3] = 0.0;
    let scores = vec![5.0f32];
    let dets = decoder
        .decode(&anchors, &RawTensors { boxes: &boxes, scores: &scores })
        .unwrap();
    let bb = dets[0].bounding_box;
    assert!((bb.width - std::f32::consts::E).abs() < 1e-5);
    assert!((bb.height - 1.0).abs() < 1e-6);
}

#[test]
fn keypoints_decode_against_the_anchor() {
    let anchors = single_anchor();
    let decoder = TensorDecoder::new(single_box_config()).unwrap();

    let mut boxes = vec![0.0f32; 12];
    for k in 0..4 {
        boxes[4 + 2 * k] = 12.8 * (k as f32 + 1.0); // x delta
        boxes[4 + 2 * k + 1] = -12.8; // y delta
    }
    let scores = vec![5.0f32];
    let dets = decoder
        .decode(&anchors, &RawTensors { boxes: &boxes, scores: &scores })
        .unwrap();
    assert_eq!(dets[0].keypoints.len(), 4);
    for (k, kp) in dets[0].keypoints.iter().enumerate() {
        assert!((kp.x - (0.5 + 0.1 * (k as f32 + 1.0))).abs() < 1e-6);
        assert!((kp.y - 0.4).abs() < 1e-6);
    }
}

#[test]
fn flip_vertically_mirrors_y() {
    let anchors = single_anchor();
    let decoder = TensorDecoder::new(DecoderConfig {
        flip_vertically: true,
        ..single_box_config()
    })
    .unwrap();

    let mut boxes = vec![0.0f32; 12];
    boxes[1] = -32.0; // y center lands at 0.25 before the flip
    let scores = vec![5.0f32];
    let dets = decoder
        .decode(&anchors, &RawTensors { boxes: &boxes, scores: &scores })
        .unwrap();
    assert!((dets[0].bounding_box.y_center - 0.75).abs() < 1e-6);
    assert!((dets[0].keypoints[0].y - 0.5).abs() < 1e-6);
}

#[test]
fn tensor_shape_mismatches_are_fatal() {
    let anchors = single_anchor();
    let decoder = TensorDecoder::new(single_box_config()).unwrap();

    let boxes = vec![0.0f32; 11];
    let scores = vec![0.0f32];
    let err = decoder
        .decode(&anchors, &RawTensors { boxes: &boxes, scores: &scores })
        .err()
        .unwrap();
    assert_eq!(
        err,
        PoseDetError::TensorSizeMismatch {
            context: "boxes",
            expected: 12,
            got: 11,
        }
    );

    let boxes = vec![0.0f32; 12];
    let scores = vec![0.0f32; 3];
    let err = decoder
        .decode(&anchors, &RawTensors { boxes: &boxes, scores: &scores })
        .err()
        .unwrap();
    assert_eq!(
        err,
        PoseDetError::TensorSizeMismatch {
            context: "scores",
            expected: 1,
            got: 3,
        }
    );
}

#[test]
fn anchor_count_mismatch_is_fatal() {
    let anchors = single_anchor();
    let decoder = TensorDecoder::new(DecoderConfig {
        num_boxes: 2,
        ..single_box_config()
    })
    .unwrap();

    let boxes = vec![0.0f32; 24];
    let scores = vec![0.0f32; 2];
    let err = decoder
        .decode(&anchors, &RawTensors { boxes: &boxes, scores: &scores })
        .err()
        .unwrap();
    assert_eq!(err, PoseDetError::AnchorCountMismatch { anchors: 1, num_boxes: 2 });
}
