use snemo_trigger::{
    board_index, calo_zone, check_signal_order, clocktick_25ns, clocktick_800ns, ct25_to_ct1600,
    ct800_to_ct1600, ClocktickGuard, ElectronicId, ElectronicMapping, GeomId, SignalRecord,
    TableMapping, TriggerError,
};

#[test]
fn full_table_covers_every_channel() {
    let mapping = TableMapping::full();
    // per side: 20x13 main wall, 2x16 gamma veto, 9x113 cells
    assert_eq!(mapping.len(), 2 * (260 + 32 + 1017));
}

#[test]
fn cabling_rules() {
    let mapping = TableMapping::full();
    let cases = [
        (
            GeomId::CaloMainWall {
                side: 1,
                column: 12,
                row: 3,
            },
            ElectronicId::new(3, 1, 13, 3),
        ),
        (
            GeomId::Gveto {
                side: 1,
                wall: 0,
                column: 5,
            },
            ElectronicId::new(3, 2, 2, 5),
        ),
        (
            GeomId::GeigerCell {
                side: 1,
                layer: 3,
                row: 77,
            },
            ElectronicId::new(2, 2, 0, 30),
        ),
        (
            GeomId::GeigerCell {
                side: 0,
                layer: 0,
                row: 20,
            },
            ElectronicId::new(2, 0, 11, 0),
        ),
    ];
    for (geom, electronic) in cases {
        assert_eq!(mapping.to_electronic(&geom), Some(electronic), "{geom}");
        assert_eq!(mapping.to_geometric(&electronic), Some(geom), "{electronic}");
    }
}

#[test]
fn masked_channels_disappear_both_ways() {
    let cell = GeomId::GeigerCell {
        side: 0,
        layer: 1,
        row: 26,
    };
    let mut mapping = TableMapping::full();
    let electronic = mapping.remove(&cell).unwrap();
    assert_eq!(mapping.to_electronic(&cell), None);
    assert_eq!(mapping.to_geometric(&electronic), None);
    assert!(mapping.remove(&cell).is_none());
    assert!(TableMapping::new().is_empty());
}

#[test]
fn identifiers_display_with_type_codes() {
    let block = GeomId::CaloMainWall {
        side: 1,
        column: 12,
        row: 3,
    };
    assert_eq!(block.to_string(), "[1302:0.1.12.3]");
    assert_eq!(block.type_code(), GeomId::CALO_MAIN_WALL_TYPE);
    assert!(block.is_calorimeter());
    let cell = GeomId::GeigerCell {
        side: 0,
        layer: 8,
        row: 112,
    };
    assert_eq!(cell.to_string(), "[1204:0.0.8.112]");
    assert!(cell.is_in_detector());
    assert!(!GeomId::GeigerCell {
        side: 0,
        layer: 8,
        row: 113
    }
    .is_in_detector());
    assert_eq!(ElectronicId::new(3, 1, 13, 3).to_string(), "[3.1.13.3]");
}

#[test]
fn board_slots_skip_the_control_board() {
    assert_eq!(board_index(3), Some(3));
    assert_eq!(board_index(10), None);
    assert_eq!(board_index(11), Some(10));
    assert_eq!(calo_zone(4), 2);
    assert_eq!(calo_zone(19), 9);
}

#[test]
fn sampling_and_rescaling_clockticks() {
    assert_eq!(clocktick_25ns(16_000.0, 0).unwrap(), 640);
    assert_eq!(clocktick_25ns(24.9, 0).unwrap(), 0);
    assert_eq!(clocktick_25ns(16_000.0, 5).unwrap(), 645);
    assert_eq!(clocktick_800ns(1_599.0, 0).unwrap(), 1);
    assert!(matches!(
        clocktick_25ns(-1.0, 0),
        Err(TriggerError::InvalidRecord(_))
    ));
    assert!(clocktick_800ns(f64::NAN, 0).is_err());

    // both clocks latch on the tick after the 1600 ns window of the hit
    assert_eq!(ct25_to_ct1600(0), 1);
    assert_eq!(ct25_to_ct1600(639), 10);
    assert_eq!(ct25_to_ct1600(640), 11);
    assert_eq!(ct25_to_ct1600(644), 11);
    assert_eq!(ct800_to_ct1600(20), 11);
    assert_eq!(ct800_to_ct1600(21), 11);
    assert_eq!(ct800_to_ct1600(22), 12);
    for time_ns in [16_000.0, 16_100.0, 16_700.0, 17_500.0] {
        assert_eq!(
            ct25_to_ct1600(clocktick_25ns(time_ns, 0).unwrap()),
            ct800_to_ct1600(clocktick_800ns(time_ns, 0).unwrap()),
            "{time_ns} ns"
        );
    }
}

#[test]
fn clocktick_guards() {
    let mut relaxed = ClocktickGuard::non_decreasing("ctw");
    relaxed.observe(4).unwrap();
    relaxed.observe(4).unwrap();
    assert!(relaxed.observe(3).is_err());
    assert_eq!(relaxed.last(), Some(4));

    let mut strict = ClocktickGuard::strict("records");
    strict.observe(4).unwrap();
    assert!(matches!(
        strict.observe(4),
        Err(TriggerError::OrderingViolation {
            stream: "records",
            previous: 4,
            current: 4
        })
    ));
}

#[test]
fn signal_streams_must_be_time_ordered() {
    let cell = |row| GeomId::GeigerCell {
        side: 0,
        layer: 0,
        row,
    };
    let ordered = [
        SignalRecord::geiger(0, cell(0), 10.0),
        SignalRecord::geiger(1, cell(1), 10.0),
        SignalRecord::geiger(2, cell(2), 11.0),
    ];
    check_signal_order(&ordered).unwrap();
    check_signal_order(&[]).unwrap();
    let negative = [SignalRecord::geiger(0, cell(0), -5.0)];
    assert!(matches!(
        check_signal_order(&negative),
        Err(TriggerError::InvalidRecord(_))
    ));
}

#[test]
fn signals_read_from_json_lines() {
    let line = r#"{"hit_id":7,"geom_id":{"kind":"geiger_cell","side":1,"layer":2,"row":40},"time_ns":800.0}"#;
    let signal: SignalRecord = serde_json::from_str(line).unwrap();
    assert_eq!(
        signal,
        SignalRecord::geiger(
            7,
            GeomId::GeigerCell {
                side: 1,
                layer: 2,
                row: 40
            },
            800.0
        )
    );
    assert!(!signal.is_calorimeter());
}
