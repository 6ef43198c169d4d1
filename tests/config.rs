use serde_json::json;
use snemo_trigger::{ConfigError, TriggerConfig};
use std::fs;
use tempfile::tempdir;

#[test]
fn partial_documents_fall_back_to_defaults() {
    let config = TriggerConfig::from_json_str(
        &json!({
            "coincidence": { "calorimeter_gate_size": 3 },
            "calo": { "threshold_total_multiplicity": 2 }
        })
        .to_string(),
    )
    .unwrap();
    assert_eq!(config.calorimeter_gate_size(), 3);
    assert_eq!(config.threshold_total_multiplicity(), 2);
    assert_eq!(config.previous_event_buffer_depth(), 10);
    assert_eq!(config.coincidence.delayed_window_1600ns, 625);
    assert_eq!(config.coincidence.l2_decision_gate_1600ns, 5);
    assert_eq!(config.high_threshold(), 0.15);
    assert_eq!(config.low_threshold(), 0.05);
    assert_eq!(config.calo.circular_buffer_depth, 4);
    assert_eq!(config.tracker.min_layer_multiplicity, 3);
    assert!(!config.inhibit_single_side_coinc());
    assert!(!config.inhibit_both_side_coinc());
    assert_eq!(TriggerConfig::from_json_str("{}").unwrap(), TriggerConfig::default());
}

#[test]
fn rejects_inconsistent_values() {
    let cases = [
        (
            json!({ "encoder": { "low_threshold": 0.2, "high_threshold": 0.2 } }),
            "low_threshold",
        ),
        (json!({ "calo": { "circular_buffer_depth": 0 } }), "circular_buffer_depth"),
        (
            json!({ "tracker": { "min_layer_multiplicity": 6 } }),
            "min_layer_multiplicity",
        ),
        (
            json!({ "tracker": { "near_source_layer_limit": 0 } }),
            "near_source_layer_limit",
        ),
        (
            json!({ "coincidence": { "previous_event_buffer_depth": 0 } }),
            "previous_event_buffer_depth",
        ),
        (
            json!({ "coincidence": { "delayed_min_gap_1600ns": 700 } }),
            "delayed_min_gap_1600ns",
        ),
    ];
    for (document, expected) in cases {
        match TriggerConfig::from_json_str(&document.to_string()) {
            Err(ConfigError::Invalid { field, .. }) => assert_eq!(field, expected),
            other => panic!("unexpected result for {document}: {:?}", other),
        }
    }
}

#[test]
fn rejects_malformed_json() {
    let err = TriggerConfig::from_json_str("{ \"calo\": ").unwrap_err();
    assert!(matches!(err, ConfigError::Parse(_)));
    let err = TriggerConfig::from_json_str(r#"{ "calo": { "circular_buffer_depth": -1 } }"#)
        .unwrap_err();
    assert!(matches!(err, ConfigError::Parse(_)));
}

#[test]
fn loads_from_disk() {
    let dir = tempdir().unwrap();
    let path = dir.path().join("trigger.json");
    fs::write(
        &path,
        json!({ "coincidence": { "calorimeter_only": true } }).to_string(),
    )
    .unwrap();
    let config = TriggerConfig::load(&path).unwrap();
    assert!(config.coincidence.calorimeter_only);

    let missing = dir.path().join("missing.json");
    match TriggerConfig::load(&missing) {
        Err(ConfigError::Io { path, .. }) => assert_eq!(path, missing),
        other => panic!("unexpected result: {:?}", other),
    }
}
