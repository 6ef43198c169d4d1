use snemo_trigger::{
    encode_htm, AmplitudeLevel, CaloThresholds, CaloTp, CaloTpEncoder, GeigerTp,
    GeigerTpEncoder, GeomId, SignalRecord, TpCollection, TriggerError, TriggerPrimitive,
};

fn block(column: u8, row: u8) -> GeomId {
    GeomId::CaloMainWall {
        side: 0,
        column,
        row,
    }
}

fn cell(layer: u8, row: u8) -> GeomId {
    GeomId::GeigerCell {
        side: 1,
        layer,
        row,
    }
}

fn thresholds() -> CaloThresholds {
    CaloThresholds {
        low: 0.05,
        high: 0.15,
    }
}

#[test]
fn htm_encoding_saturates_on_two_bits() {
    assert_eq!(encode_htm(0), 0b00);
    assert_eq!(encode_htm(1), 0b01);
    assert_eq!(encode_htm(2), 0b10);
    assert_eq!(encode_htm(3), 0b11);
    assert_eq!(encode_htm(17), 0b11);
}

#[test]
fn amplitude_classification_follows_thresholds() {
    let thr = thresholds();
    assert_eq!(AmplitudeLevel::classify(0.2, &thr), AmplitudeLevel::High);
    assert_eq!(AmplitudeLevel::classify(0.15, &thr), AmplitudeLevel::LowOnly);
    assert_eq!(AmplitudeLevel::classify(0.05, &thr), AmplitudeLevel::LowOnly);
    assert_eq!(AmplitudeLevel::classify(0.01, &thr), AmplitudeLevel::BelowLow);
}

#[test]
fn update_data_accumulates_multiplicity() {
    let mut tp = CaloTp::new();
    tp.set_header(1, block(3, 4), 10).unwrap();
    tp.set_data(AmplitudeLevel::High, false, false).unwrap();
    assert_eq!(tp.htm_multiplicity(), 1);
    tp.update_data(AmplitudeLevel::High, false, false).unwrap();
    tp.update_data(AmplitudeLevel::LowOnly, true, false).unwrap();
    assert_eq!(tp.htm_multiplicity(), 2);
    assert!(tp.is_lto());
    assert!(tp.is_xt());
    tp.update_data(AmplitudeLevel::High, false, false).unwrap();
    tp.update_data(AmplitudeLevel::High, false, false).unwrap();
    assert_eq!(tp.htm_bits(), 0b11);

    tp.set_data(AmplitudeLevel::LowOnly, false, false).unwrap();
    assert_eq!(tp.htm_multiplicity(), 0);
    assert!(tp.is_lto());
}

#[test]
fn second_lock_fails_and_mutators_are_rejected() {
    let mut tp = CaloTp::new();
    tp.set_header(1, block(0, 0), 4).unwrap();
    tp.set_data(AmplitudeLevel::High, false, false).unwrap();
    tp.lock().unwrap();
    assert!(tp.is_locked());

    assert!(matches!(tp.lock(), Err(TriggerError::InvalidState(_))));
    assert!(matches!(
        tp.set_header(2, block(1, 1), 5),
        Err(TriggerError::InvalidState(_))
    ));
    assert!(matches!(
        tp.set_data(AmplitudeLevel::LowOnly, false, false),
        Err(TriggerError::InvalidState(_))
    ));
    assert!(matches!(
        tp.update_data(AmplitudeLevel::High, false, false),
        Err(TriggerError::InvalidState(_))
    ));
    assert!(matches!(
        tp.set_htm_multiplicity(2),
        Err(TriggerError::InvalidState(_))
    ));

    tp.unlock().unwrap();
    tp.update_data(AmplitudeLevel::High, false, false).unwrap();
    assert_eq!(tp.htm_multiplicity(), 2);
    tp.reset();
    assert!(!tp.is_locked());
    assert!(!tp.is_valid());
}

#[test]
fn incomplete_primitive_cannot_be_locked() {
    let mut tp = CaloTp::new();
    assert!(matches!(tp.lock(), Err(TriggerError::InvalidRecord(_))));
    let mut geiger = GeigerTp::new();
    assert!(matches!(geiger.lock(), Err(TriggerError::InvalidRecord(_))));
    assert!(matches!(geiger.unlock(), Err(TriggerError::InvalidState(_))));
}

#[test]
fn headers_reject_the_wrong_detector() {
    let mut calo = CaloTp::new();
    assert!(matches!(
        calo.set_header(1, cell(0, 0), 0),
        Err(TriggerError::InvalidRecord(_))
    ));
    let mut geiger = GeigerTp::new();
    assert!(matches!(
        geiger.set_header(1, block(0, 0), 0),
        Err(TriggerError::InvalidRecord(_))
    ));
}

#[test]
fn htm_bits_overflow_is_rejected() {
    let mut tp = CaloTp::new();
    assert!(matches!(
        tp.set_htm_bits(4),
        Err(TriggerError::InvalidMultiplicity { width: 2, .. })
    ));
    tp.set_htm_bits(3).unwrap();
    assert_eq!(tp.htm_multiplicity(), 3);
}

#[test]
fn duplicate_channel_fails_collection_lock() {
    let mut collection = TpCollection::new();
    for hit_id in 0..2 {
        let mut tp = CaloTp::new();
        tp.set_header(hit_id, block(5, 5), 40).unwrap();
        tp.set_data(AmplitudeLevel::High, false, false).unwrap();
        collection.push(tp).unwrap();
    }
    let err = collection.lock().unwrap_err();
    match err {
        TriggerError::DuplicateChannel { geom_id, clocktick } => {
            assert_eq!(geom_id, block(5, 5));
            assert_eq!(clocktick, 40);
        }
        other => panic!("unexpected error: {other}"),
    }
    assert!(!collection.is_locked());
}

#[test]
fn locked_collection_is_sorted_and_frozen() {
    let mut collection = TpCollection::new();
    for (hit_id, clocktick) in [(0u32, 9u32), (1, 3), (2, 6)] {
        let mut tp = GeigerTp::new();
        tp.set_header(hit_id, cell(2, hit_id as u8), clocktick).unwrap();
        collection.push(tp).unwrap();
    }
    collection.lock().unwrap();
    let ticks: Vec<u32> = collection.iter().filter_map(|tp| tp.clocktick()).collect();
    assert_eq!(ticks, vec![3, 6, 9]);
    assert!(collection.iter().all(|tp| tp.is_locked()));
    assert_eq!(collection.clocktick_range(), Some((3, 9)));
    assert!(matches!(
        collection.push(GeigerTp::new()),
        Err(TriggerError::InvalidState(_))
    ));
    assert!(matches!(collection.lock(), Err(TriggerError::InvalidState(_))));
    collection.unlock().unwrap();
    assert!(collection.iter().all(|tp| !tp.is_locked()));
}

#[test]
fn calo_encoder_merges_and_skips() {
    let signals = vec![
        SignalRecord::calo(0, block(2, 2), 100.0, 0.3),
        SignalRecord::calo(1, block(2, 2), 110.0, 0.4),
        SignalRecord::calo(2, block(4, 1), 120.0, 0.08),
        SignalRecord::calo(3, block(6, 1), 130.0, 0.01),
        SignalRecord::geiger(4, cell(0, 10), 140.0),
    ];
    let encoder = CaloTpEncoder::new(thresholds(), 0);
    let mut collection = TpCollection::new();
    let report = encoder.process(&signals, &mut collection).unwrap();
    assert_eq!(report.signals, 4);
    assert_eq!(report.created, 2);
    assert_eq!(report.merged, 1);
    assert_eq!(report.below_threshold, 1);

    collection.lock().unwrap();
    let merged: Vec<&CaloTp> = collection.at_clocktick(4).collect();
    assert_eq!(merged.len(), 2);
    let high = merged
        .iter()
        .find(|tp| tp.geom_id() == Some(block(2, 2)))
        .unwrap();
    assert_eq!(high.htm_multiplicity(), 2);
    let low = merged
        .iter()
        .find(|tp| tp.geom_id() == Some(block(4, 1)))
        .unwrap();
    assert_eq!(low.htm_multiplicity(), 0);
    assert!(low.is_lto());
}

#[test]
fn geiger_encoder_merges_repeated_cells() {
    let signals = vec![
        SignalRecord::geiger(0, cell(1, 20), 100.0),
        SignalRecord::geiger(1, cell(1, 20), 500.0),
        SignalRecord::geiger(2, cell(1, 20), 900.0),
    ];
    let encoder = GeigerTpEncoder::new(0);
    let mut collection = TpCollection::new();
    let report = encoder.process(&signals, &mut collection).unwrap();
    assert_eq!(report.created, 2);
    assert_eq!(report.merged, 1);
    collection.lock().unwrap();
    assert_eq!(collection.clocktick_range(), Some((0, 1)));
}

#[test]
fn raw_amplitudes_are_discriminated_on_the_primitive() {
    let thr = thresholds();
    let mut tp = CaloTp::new();
    tp.set_header(1, block(3, 4), 10).unwrap();
    tp.set_amplitude(0.3, &thr, false, false).unwrap();
    assert_eq!(tp.htm_multiplicity(), 1);
    tp.update_amplitude(0.2, &thr, false, false).unwrap();
    tp.update_amplitude(0.08, &thr, true, false).unwrap();
    tp.update_amplitude(0.01, &thr, false, false).unwrap();
    assert_eq!(tp.htm_multiplicity(), 2);
    assert!(tp.is_lto());
    assert!(tp.is_xt());

    tp.set_amplitude(0.08, &thr, false, false).unwrap();
    assert_eq!(tp.htm_multiplicity(), 0);

    tp.lock().unwrap();
    assert!(matches!(
        tp.update_amplitude(0.3, &thr, false, false),
        Err(TriggerError::InvalidState(_))
    ));
}

#[test]
fn lookup_follows_the_primitives_across_relocking() {
    let mut collection = TpCollection::new();
    for (hit_id, clocktick) in [(0u32, 9u32), (1, 3), (2, 6)] {
        let mut tp = GeigerTp::new();
        tp.set_header(hit_id, cell(2, hit_id as u8), clocktick).unwrap();
        collection.push(tp).unwrap();
    }
    for (row, clocktick) in [(0u8, 9u32), (1, 3), (2, 6)] {
        let found = collection.find_mut(&cell(2, row), clocktick).unwrap().unwrap();
        assert_eq!(found.hit_id(), Some(u32::from(row)));
    }
    assert!(collection.find_mut(&cell(2, 0), 3).unwrap().is_none());
    assert!(collection.find_mut(&cell(3, 0), 9).unwrap().is_none());

    collection.lock().unwrap();
    assert!(matches!(
        collection.find_mut(&cell(2, 0), 9),
        Err(TriggerError::InvalidState(_))
    ));

    // sorting moved every primitive
    collection.unlock().unwrap();
    for (row, clocktick) in [(0u8, 9u32), (1, 3), (2, 6)] {
        let found = collection.find_mut(&cell(2, row), clocktick).unwrap().unwrap();
        assert_eq!(found.geom_id(), Some(cell(2, row)));
        assert_eq!(found.clocktick(), Some(clocktick));
    }
    let mut late = GeigerTp::new();
    late.set_header(3, cell(4, 4), 12).unwrap();
    collection.push(late).unwrap();
    assert_eq!(
        collection.find_mut(&cell(4, 4), 12).unwrap().unwrap().hit_id(),
        Some(3)
    );
}

#[test]
fn geiger_encoder_merges_a_long_burst() {
    let signals: Vec<SignalRecord> = (0..500u32)
        .map(|hit_id| SignalRecord::geiger(hit_id, cell(1, (hit_id % 5) as u8), 100.0))
        .collect();
    let mut collection = TpCollection::new();
    let report = GeigerTpEncoder::new(0)
        .process(&signals, &mut collection)
        .unwrap();
    assert_eq!(report.signals, 500);
    assert_eq!(report.created, 5);
    assert_eq!(report.merged, 495);
    assert_eq!(collection.len(), 5);
}
