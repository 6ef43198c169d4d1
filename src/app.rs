use crate::config::TriggerConfig;
use crate::mapping::TableMapping;
use crate::observability::LogLevel;
use crate::pipeline::TriggerPipeline;
use crate::signal::SignalRecord;
use anyhow::{anyhow, Context, Result};
use std::env;
use std::fs;
use std::io::{self, Write};
use std::path::{Path, PathBuf};

const USAGE: &str =
    "usage: snemo-trigger --input <signals.jsonl> [--config <config.json>] [--log-level <level>]";

#[derive(Debug)]
struct Args {
    input: PathBuf,
    config: Option<PathBuf>,
    log_level: LogLevel,
}

/// Replays a signal file through the trigger and prints accepted events.
pub fn run() -> Result<()> {
    let Some(args) = parse_args(env::args().skip(1))? else {
        return Ok(());
    };
    let config = match &args.config {
        Some(path) => TriggerConfig::load(path)
            .with_context(|| format!("unable to load config {}", path.display()))?,
        None => TriggerConfig::default(),
    };
    let signals = read_signals(&args.input)?;

    let mut pipeline = TriggerPipeline::new(config).context("invalid trigger configuration")?;
    pipeline.logger_mut().set_level(args.log_level);
    let output = pipeline
        .process(&signals, &TableMapping::full())
        .with_context(|| format!("trigger replay of {} failed", args.input.display()))?;

    let stdout = io::stdout();
    let mut out = stdout.lock();
    for record in output.accepted() {
        writeln!(out, "{}", serde_json::to_string(record)?)?;
    }
    for decision in &output.l2_decisions {
        writeln!(out, "{}", serde_json::to_string(decision)?)?;
    }
    out.flush()?;

    let stderr = io::stderr();
    let mut err = stderr.lock();
    for line in pipeline.logger_mut().drain_lines() {
        writeln!(err, "{line}")?;
    }
    Ok(())
}

fn parse_args(mut args: impl Iterator<Item = String>) -> Result<Option<Args>> {
    let mut input = None;
    let mut config = None;
    let mut log_level = LogLevel::Info;
    while let Some(arg) = args.next() {
        match arg.as_str() {
            "--input" => {
                let path = args
                    .next()
                    .ok_or_else(|| anyhow!("--input requires a path"))?;
                input = Some(PathBuf::from(path));
            }
            "--config" => {
                let path = args
                    .next()
                    .ok_or_else(|| anyhow!("--config requires a path"))?;
                config = Some(PathBuf::from(path));
            }
            "--log-level" => {
                let level = args
                    .next()
                    .ok_or_else(|| anyhow!("--log-level requires a level"))?;
                log_level = level.parse()?;
            }
            "--help" | "-h" => {
                eprintln!("{USAGE}");
                return Ok(None);
            }
            other => return Err(anyhow!("unknown argument: {other}")),
        }
    }
    let input = input.ok_or_else(|| anyhow!("--input is required\n{USAGE}"))?;
    Ok(Some(Args {
        input,
        config,
        log_level,
    }))
}

fn read_signals(path: &Path) -> Result<Vec<SignalRecord>> {
    let payload = fs::read_to_string(path)
        .with_context(|| format!("unable to read {}", path.display()))?;
    payload
        .lines()
        .enumerate()
        .filter(|(_, line)| !line.trim().is_empty())
        .map(|(idx, line)| {
            serde_json::from_str(line)
                .with_context(|| format!("{}:{}: invalid signal record", path.display(), idx + 1))
        })
        .collect()
}
