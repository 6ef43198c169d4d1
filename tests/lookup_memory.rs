use snemo_trigger::{
    GeigerMatrix, LookupMemory, MemoryError, TrackerTriggerAlgorithm, TrackerTriggerConfig,
    TriggerError,
};
use tempfile::tempdir;

#[test]
fn minimum_multiplicity_memory() {
    let memory = LookupMemory::min_multiplicity(4, 2).unwrap();
    assert_eq!(memory.entries(), 16);
    assert_eq!(memory.fetch(0b0101), 1);
    assert_eq!(memory.fetch(0b0100), 0);
    assert_eq!(memory.fetch(0b1111), 1);
}

#[test]
fn layer_memory_splits_inner_and_outer_halves() {
    let memory = LookupMemory::layer_io(3).unwrap();
    assert_eq!(memory.address_size(), 9);
    assert_eq!(memory.data_size(), 2);
    assert_eq!(memory.fetch(0b0_0000_0111), 0b01);
    assert_eq!(memory.fetch(0b1_1100_0000), 0b10);
    // layer 4 belongs to both halves
    assert_eq!(memory.fetch(0b0_0111_1100), 0b11);
    assert_eq!(memory.fetch(0b0_0111_0000), 0b10);
    assert_eq!(memory.fetch(0b0_0001_1100), 0b01);
    assert_eq!(memory.fetch(0b1_0000_0011), 0b00);
}

#[test]
fn row_memory_sections() {
    let memory = LookupMemory::row_sections(12).unwrap();
    assert_eq!(memory.fetch(1), 0b100);
    assert_eq!(memory.fetch(1 << 5), 0b010);
    assert_eq!(memory.fetch(1 << 11), 0b001);
    assert_eq!(memory.fetch((1 << 3) | (1 << 4)), 0b110);
    assert_eq!(memory.fetch(0), 0);
    assert!(matches!(
        LookupMemory::row_sections(13),
        Err(MemoryError::OutOfRange { .. })
    ));
}

#[test]
fn push_checks_bus_widths_and_fetch_masks_addresses() {
    let mut memory = LookupMemory::new(3, 2, 0b01).unwrap();
    assert_eq!(memory.fetch(5), 0b01);
    memory.push(5, 0b10).unwrap();
    assert_eq!(memory.fetch(5), 0b10);
    assert_eq!(memory.fetch(5 | 0b1000), 0b10);
    assert!(matches!(
        memory.push(8, 0),
        Err(MemoryError::OutOfRange { .. })
    ));
    assert!(matches!(
        memory.push(0, 0b100),
        Err(MemoryError::OutOfRange { .. })
    ));
    assert!(matches!(
        LookupMemory::new(0, 1, 0),
        Err(MemoryError::Geometry { .. })
    ));
}

#[test]
fn text_image_omits_default_entries() {
    let mut memory = LookupMemory::new(2, 1, 0).unwrap();
    memory.set_description("toy");
    memory.push(3, 1).unwrap();
    let text = memory.to_text();
    assert_eq!(
        text,
        "#@description = toy\n#@address_size = 2\n#@data_size = 1\n#@default_data = 0\n11 1\n"
    );
    let parsed = LookupMemory::from_text(&text).unwrap();
    assert_eq!(parsed, memory);
}

#[test]
fn store_then_load_reproduces_every_entry() {
    let dir = tempdir().unwrap();
    let path = dir.path().join("layer.mem");
    let memory = LookupMemory::layer_io(2).unwrap();
    memory.store(&path).unwrap();
    let loaded = LookupMemory::load(&path).unwrap();
    assert_eq!(loaded.description(), memory.description());
    for address in 0..memory.entries() {
        assert_eq!(loaded.fetch(address), memory.fetch(address));
    }
}

#[test]
fn malformed_images_are_rejected() {
    assert!(matches!(
        LookupMemory::from_text("#@data_size = 1\n0 1\n"),
        Err(MemoryError::Format { line: 2, .. })
    ));
    assert!(matches!(
        LookupMemory::from_text("#@address_size = 2\n#@data_size = 1\n011 1\n"),
        Err(MemoryError::Format { line: 3, .. })
    ));
    assert!(matches!(
        LookupMemory::from_text("#@address_size = 2\n#@data_size = 1\n01 1\n#@default_data = 1\n"),
        Err(MemoryError::Format { line: 4, .. })
    ));
    assert!(matches!(
        LookupMemory::from_text("#@address_size = x\n"),
        Err(MemoryError::Format { line: 1, .. })
    ));
    assert!(matches!(
        LookupMemory::load("/nonexistent/snemo/layer.mem"),
        Err(MemoryError::Io { .. })
    ));
}

#[test]
fn tracker_config_can_replace_the_layer_memory() {
    let dir = tempdir().unwrap();
    let path = dir.path().join("layer.mem");
    // a two-layer threshold instead of the default three
    LookupMemory::layer_io(2).unwrap().store(&path).unwrap();

    let config = TrackerTriggerConfig {
        layer_memory_file: Some(path),
        ..TrackerTriggerConfig::default()
    };
    let algorithm = TrackerTriggerAlgorithm::new(&config).unwrap();
    let mut matrix = GeigerMatrix::new(0);
    matrix.set(0, 0, 30);
    matrix.set(0, 1, 30);
    assert!(algorithm.build_record(&matrix).decision);
}

#[test]
fn memory_with_the_wrong_geometry_is_refused() {
    let dir = tempdir().unwrap();
    let path = dir.path().join("rows.mem");
    LookupMemory::min_multiplicity(4, 1).unwrap().store(&path).unwrap();
    let config = TrackerTriggerConfig {
        row_memory_file: Some(path),
        ..TrackerTriggerConfig::default()
    };
    assert!(matches!(
        TrackerTriggerAlgorithm::new(&config),
        Err(TriggerError::Memory(MemoryError::Geometry { .. }))
    ));
}
