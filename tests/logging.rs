use serde_json::Value;
use snemo_trigger::{JsonLineLogger, LogLevel, LogRotationPolicy, LoggingError};

#[test]
fn json_logger_serializes_entries() {
    let policy = LogRotationPolicy {
        max_bytes: 256,
        max_files: 2,
    };
    let mut logger = JsonLineLogger::new(policy);
    logger
        .log(640, LogLevel::Info, "snemo_trigger::test", "l2", "first entry")
        .unwrap();
    let lines: Vec<_> = logger
        .files()
        .flat_map(|file| file.lines().iter())
        .collect();
    assert_eq!(lines.len(), 1);
    let parsed: Value = serde_json::from_str(lines[0]).unwrap();
    assert_eq!(parsed["ts"], 640);
    assert_eq!(parsed["level"], "INFO");
    assert_eq!(parsed["module"], "snemo_trigger::test");
    assert_eq!(parsed["stage"], "l2");
    assert_eq!(parsed["index"], 0);
    assert_eq!(parsed["message"], "first entry");
}

#[test]
fn loglevel_override_filters_entries() {
    let policy = LogRotationPolicy {
        max_bytes: 512,
        max_files: 1,
    };
    let mut logger = JsonLineLogger::new(policy);
    logger.set_level(LogLevel::Warn);
    assert_eq!(logger.level(), LogLevel::Warn);
    logger
        .log(0, LogLevel::Info, "snemo_trigger", "encode", "info suppressed")
        .unwrap();
    logger
        .log(1, LogLevel::Warn, "snemo_trigger", "aggregate", "warn visible")
        .unwrap();
    let lines: Vec<_> = logger
        .files()
        .flat_map(|file| file.lines().iter())
        .collect();
    assert_eq!(lines.len(), 1);
    let parsed: Value = serde_json::from_str(lines[0]).unwrap();
    assert_eq!(parsed["level"], "WARN");
    assert_eq!(parsed["message"], "warn visible");
    // suppressed lines do not consume an index
    assert_eq!(parsed["index"], 0);
}

#[test]
fn rotation_discards_old_segments() {
    let policy = LogRotationPolicy {
        max_bytes: 64,
        max_files: 2,
    };
    let mut logger = JsonLineLogger::new(policy);
    for tick in 0..10 {
        logger
            .log(tick, LogLevel::Info, "module", "l2", "payload")
            .unwrap();
    }
    // every line is longer than a segment, so each one rotates
    let segments: Vec<_> = logger.files().collect();
    assert_eq!(segments.len(), 3);
    assert!(segments.iter().all(|file| file.lines().len() == 1));

    let kept: Vec<u64> = logger
        .drain_lines()
        .iter()
        .map(|line| {
            let parsed: Value = serde_json::from_str(line).unwrap();
            parsed["index"].as_u64().unwrap()
        })
        .collect();
    assert_eq!(kept, vec![7, 8, 9]);
    assert_eq!(logger.files().count(), 1);
    assert!(logger.drain_lines().is_empty());
}

#[test]
fn drain_keeps_the_sequence_running() {
    let mut logger = JsonLineLogger::default();
    logger.log(1, LogLevel::Error, "m", "s", "one").unwrap();
    assert_eq!(logger.drain_lines().len(), 1);
    logger.log(2, LogLevel::Error, "m", "s", "two").unwrap();
    let lines = logger.drain_lines();
    let parsed: Value = serde_json::from_str(&lines[0]).unwrap();
    assert_eq!(parsed["index"], 1);
    assert_eq!(parsed["ts"], 2);
}

#[test]
fn log_levels_parse_case_insensitively() {
    assert_eq!("debug".parse::<LogLevel>().unwrap(), LogLevel::Debug);
    assert_eq!("WARN".parse::<LogLevel>().unwrap(), LogLevel::Warn);
    assert_eq!(LogLevel::Trace.to_string(), "TRACE");
    assert!(LogLevel::Trace < LogLevel::Error);
    assert!(matches!(
        "loud".parse::<LogLevel>(),
        Err(LoggingError::UnknownLevel(level)) if level == "loud"
    ));
}
