use snemo_trigger::{
    CaloSummaryRecord, CoincidenceEventRecord, GeigerMatrix, TrackerTriggerAlgorithm,
    TrackerTriggerConfig, TriggerMode, TriggerView, NROWS,
};

#[test]
fn geiger_matrix_meets_at_the_source_foil() {
    let mut matrix = GeigerMatrix::new(12);
    matrix.set(0, 0, 26);
    matrix.set(1, 8, 0);
    let text = matrix.render();
    let lines: Vec<&str> = text.lines().collect();
    assert_eq!(lines.len(), 20);
    assert_eq!(lines[0], "geiger_matrix ct1600=12");
    assert!(lines[1..].iter().all(|line| line.len() == NROWS));
    // side 0 layer 0 sits right above the separator
    assert_eq!(lines[9].find('*'), Some(26));
    assert_eq!(lines[10], "=".repeat(NROWS));
    assert_eq!(lines[19].find('*'), Some(0));
    assert_eq!(text.matches('*').count(), 2);
    assert_eq!(matrix.label(), "geiger_matrix");
    assert_eq!(matrix.clocktick(), 12);
}

#[test]
fn tracker_record_lists_zone_bits() {
    let algorithm = TrackerTriggerAlgorithm::new(&TrackerTriggerConfig::default()).unwrap();
    let mut matrix = GeigerMatrix::new(3);
    for layer in 0..3 {
        matrix.set(0, layer, 26);
    }
    let text = algorithm.build_record(&matrix).render();
    let lines: Vec<&str> = text.lines().collect();
    assert_eq!(lines[0], "tracker_record ct1600=3 decision=1");
    let empty = "0000000";
    let expected_zones = [empty, empty, "1001001", empty, empty, empty, empty, empty, empty, empty];
    assert_eq!(
        lines[1],
        format!(
            "side 0 [{}] pattern=0000000100 near_source=0000000100",
            expected_zones.join(" ")
        )
    );
    assert!(lines[2].starts_with("side 1 [0000000 "));
}

#[test]
fn calo_summary_shows_both_walls_and_gveto() {
    let mut record = CaloSummaryRecord::new(640);
    record.zoning_word = [0b100, 0];
    record.total_multiplicity_side_0 = 1;
    record.decision = true;
    record.total_multiplicity_threshold = true;
    let text = record.render();
    let lines: Vec<&str> = text.lines().collect();
    assert_eq!(lines[0], "calo_summary ct25=640 decision=1 threshold=1");
    assert_eq!(lines[1], "side 0 zoning=0000000100 htm=1 lto=0");
    assert_eq!(lines[2], "side 1 zoning=0000000000 htm=0 lto=0");
    assert_eq!(lines[3], "gveto  zoning=0000 htm=0 lto=0 xt_info=000000");
    assert_eq!(record.clocktick(), 640);
}

#[test]
fn coincidence_event_header_and_words() {
    let mut record = CoincidenceEventRecord::new(20);
    record.delayed_decision = true;
    record.decision = true;
    record.trigger_mode = TriggerMode::Ape;
    record.tracker_zoning_word_pattern = [0b100, 0];
    let text = record.render();
    let lines: Vec<&str> = text.lines().collect();
    assert_eq!(
        lines[0],
        "coincidence_event ct1600=20 mode=APE prompt=0 delayed=1 decision=1"
    );
    assert_eq!(
        lines[1],
        "side 0 calo=0000000000 tracker=0000000100 coincidence=0000000000"
    );
    assert_eq!(lines.len(), 3);
}
