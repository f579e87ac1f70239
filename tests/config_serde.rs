#![cfg(feature = "serde")]

use posedet::{DetectorConfig, NmsAlgorithm, OverlapType};

#[test]
fn detector_config_round_trips_through_json() {
    let cfg = DetectorConfig {
        max_poses: Some(2),
        ..DetectorConfig::default()
    };
    let json = serde_json::to_string(&cfg).unwrap();
    let back: DetectorConfig = serde_json::from_str(&json).unwrap();
    assert_eq!(back, cfg);
}

#[test]
fn enums_serialize_as_variant_names() {
    let json = serde_json::to_string(&OverlapType::IntersectionOverUnion).unwrap();
    assert_eq!(json, "\"IntersectionOverUnion\"");
    let algo: NmsAlgorithm = serde_json::from_str("\"Weighted\"").unwrap();
    assert_eq!(algo, NmsAlgorithm::Weighted);
}
