use crate::calo_trigger::{CaloSummaryRecord, CaloTriggerAlgorithm};
use crate::clock::{ct25_to_ct1600, ct800_to_ct1600};
use crate::coincidence::{
    CoincidenceEventRecord, CoincidenceTriggerAlgorithm, L2Decision, TriggerMode,
};
use crate::config::TriggerConfig;
use crate::ctw::calo::{CaloCtwAggregator, CaloCtwData, WallType};
use crate::ctw::geiger::{GeigerCtwAggregator, GeigerCtwData};
use crate::ctw::AggregationReport;
use crate::error::TriggerError;
use crate::mapping::{
    ElectronicMapping, GeomId, GEIGER_CRATES, GEIGER_ROWS_PER_CRATE, GVETO_CRATE_ID,
};
use crate::observability::telemetry::bump;
use crate::observability::{JsonLineLogger, LogLevel, PipelineTelemetry};
use crate::primitive::calo::CaloTp;
use crate::primitive::collection::TpCollection;
use crate::primitive::encoder::{CaloTpEncoder, GeigerTpEncoder};
use crate::primitive::geiger::GeigerTp;
use crate::signal::{check_signal_order, SignalRecord};
use crate::tracker::algorithm::{GeigerMatrix, TrackerRecord, TrackerTriggerAlgorithm};
use std::collections::BTreeSet;

const MODULE: &str = "snemo_trigger::pipeline";

/// Calorimeter crates: two main-wall sides and the gamma-veto crate.
const CALO_CRATES: [(u8, WallType); 3] = [
    (0, WallType::MainWall),
    (1, WallType::MainWall),
    (GVETO_CRATE_ID, WallType::GammaVeto),
];

/// Every stream produced by one pipeline run.
#[derive(Debug, Clone)]
pub struct TriggerOutput {
    pub calo_tps: TpCollection<CaloTp>,
    pub geiger_tps: TpCollection<GeigerTp>,
    pub calo_ctws: CaloCtwData,
    pub geiger_ctws: GeigerCtwData,
    pub calo_records: Vec<CaloSummaryRecord>,
    pub geiger_matrices: Vec<GeigerMatrix>,
    pub tracker_records: Vec<TrackerRecord>,
    pub coincidence_records: Vec<CoincidenceEventRecord>,
    pub l2_decisions: Vec<L2Decision>,
    pub telemetry: PipelineTelemetry,
}

impl TriggerOutput {
    /// Coincidence records whose latched decision is true.
    pub fn accepted(&self) -> impl Iterator<Item = &CoincidenceEventRecord> {
        self.coincidence_records.iter().filter(|record| record.decision)
    }
}

/// Signals in, level-two decisions out.
///
/// Each call to [`TriggerPipeline::process`] is a self-contained replay: the
/// algorithm histories are reset, only the log keeps growing.
#[derive(Debug)]
pub struct TriggerPipeline {
    config: TriggerConfig,
    calo_encoder: CaloTpEncoder,
    geiger_encoder: GeigerTpEncoder,
    calo_trigger: CaloTriggerAlgorithm,
    tracker_trigger: TrackerTriggerAlgorithm,
    coincidence_trigger: CoincidenceTriggerAlgorithm,
    logger: JsonLineLogger,
}

impl TriggerPipeline {
    pub fn new(config: TriggerConfig) -> Result<Self, TriggerError> {
        config.validate()?;
        Ok(Self {
            calo_encoder: CaloTpEncoder::new(
                config.encoder.thresholds(),
                config.encoder.clocktick_reference_25ns,
            ),
            geiger_encoder: GeigerTpEncoder::new(config.encoder.clocktick_reference_800ns),
            calo_trigger: CaloTriggerAlgorithm::new(config.calo.clone())?,
            tracker_trigger: TrackerTriggerAlgorithm::new(&config.tracker)?,
            coincidence_trigger: CoincidenceTriggerAlgorithm::new(config.coincidence.clone())?,
            logger: JsonLineLogger::default(),
            config,
        })
    }

    pub fn config(&self) -> &TriggerConfig {
        &self.config
    }

    pub fn logger(&self) -> &JsonLineLogger {
        &self.logger
    }

    pub fn logger_mut(&mut self) -> &mut JsonLineLogger {
        &mut self.logger
    }

    pub fn process(
        &mut self,
        signals: &[SignalRecord],
        mapping: &dyn ElectronicMapping,
    ) -> Result<TriggerOutput, TriggerError> {
        check_signal_order(signals)?;
        let mut telemetry = PipelineTelemetry {
            signals: signals.len() as u64,
            ..PipelineTelemetry::default()
        };

        let mut calo_tps = TpCollection::new();
        let calo_report = self.calo_encoder.process(signals, &mut calo_tps)?;
        calo_tps.lock()?;
        let mut geiger_tps = TpCollection::new();
        let geiger_report = self.geiger_encoder.process(signals, &mut geiger_tps)?;
        geiger_tps.lock()?;
        bump(&mut telemetry.calo_tps, calo_tps.len() as u64);
        bump(&mut telemetry.geiger_tps, geiger_tps.len() as u64);
        self.logger.log(
            0,
            LogLevel::Debug,
            MODULE,
            "encode",
            &format!(
                "calo signals={} tps={} merged={} below_threshold={}; geiger signals={} tps={} merged={}",
                calo_report.signals,
                calo_tps.len(),
                calo_report.merged,
                calo_report.below_threshold,
                geiger_report.signals,
                geiger_tps.len(),
                geiger_report.merged
            ),
        )?;

        let mut unmapped = BTreeSet::new();
        let mut calo_ctws = CaloCtwData::new();
        for (crate_id, wall) in CALO_CRATES {
            let report =
                CaloCtwAggregator::new(crate_id, wall).process(&calo_tps, mapping, &mut calo_ctws)?;
            self.drop_unmapped(&report, ct25_to_ct1600, &mut unmapped, &mut telemetry)?;
        }
        let mut geiger_ctws = GeigerCtwData::new();
        for crate_id in 0..GEIGER_CRATES {
            let report = GeigerCtwAggregator::new(crate_id).process(
                &geiger_tps,
                mapping,
                &mut geiger_ctws,
            )?;
            self.drop_unmapped(&report, ct800_to_ct1600, &mut unmapped, &mut telemetry)?;
        }
        bump(&mut telemetry.calo_ctws, calo_ctws.len() as u64);
        bump(&mut telemetry.geiger_ctws, geiger_ctws.len() as u64);
        self.logger.log(
            0,
            LogLevel::Debug,
            MODULE,
            "aggregate",
            &format!(
                "calo ctws={} geiger ctws={} unmapped={}",
                calo_ctws.len(),
                geiger_ctws.len(),
                telemetry.unmapped_channels
            ),
        )?;

        let calo_records = self.calo_trigger.process(&calo_ctws)?;
        let passes = calo_records.iter().filter(|record| record.decision).count();
        bump(&mut telemetry.calo_l1_passes, passes as u64);
        self.logger.log(
            0,
            LogLevel::Debug,
            MODULE,
            "calo_l1",
            &format!("records={} passes={passes}", calo_records.len()),
        )?;

        let geiger_matrices = self.tracker_trigger.build_matrices(&geiger_ctws, mapping)?;
        let tracker_records: Vec<TrackerRecord> = geiger_matrices
            .iter()
            .map(|matrix| self.tracker_trigger.build_record(matrix))
            .collect();
        bump(&mut telemetry.tracker_records, tracker_records.len() as u64);
        self.logger.log(
            0,
            LogLevel::Debug,
            MODULE,
            "tracker_l1",
            &format!(
                "records={} with_pattern={}",
                tracker_records.len(),
                tracker_records.iter().filter(|record| record.decision).count()
            ),
        )?;

        let coincidence = self
            .coincidence_trigger
            .process(&calo_records, &tracker_records)?;
        for record in coincidence.records.iter().filter(|record| record.decision) {
            match record.trigger_mode {
                TriggerMode::Caraco => bump(&mut telemetry.prompt_decisions, 1),
                TriggerMode::Ape => bump(&mut telemetry.ape_decisions, 1),
                TriggerMode::Dave => bump(&mut telemetry.dave_decisions, 1),
                TriggerMode::CaloOnly | TriggerMode::Invalid => {}
            }
        }
        for decision in &coincidence.l2_decisions {
            if decision.mode == TriggerMode::CaloOnly {
                bump(&mut telemetry.calo_only_decisions, 1);
            }
            bump(&mut telemetry.l2_decisions, 1);
            self.logger.log(
                decision.clocktick_1600ns,
                LogLevel::Info,
                MODULE,
                "l2",
                &format!("L2 decision mode={}", decision.mode),
            )?;
        }
        self.logger.log(
            coincidence
                .records
                .last()
                .map_or(0, |record| record.clocktick_1600ns),
            LogLevel::Debug,
            MODULE,
            "l2",
            &format!(
                "records={} accepted={} issued={}",
                coincidence.records.len(),
                telemetry.accepted(),
                telemetry.l2_decisions
            ),
        )?;

        Ok(TriggerOutput {
            calo_tps,
            geiger_tps,
            calo_ctws,
            geiger_ctws,
            calo_records,
            geiger_matrices,
            tracker_records,
            coincidence_records: coincidence.records,
            l2_decisions: coincidence.l2_decisions,
            telemetry,
        })
    }

    /// Every aggregator reports the unmapped primitives it skipped; each one is
    /// counted and logged once.
    fn drop_unmapped(
        &mut self,
        report: &AggregationReport,
        to_ct1600: fn(u32) -> u32,
        seen: &mut BTreeSet<(GeomId, u32)>,
        telemetry: &mut PipelineTelemetry,
    ) -> Result<(), TriggerError> {
        for &(geom_id, clocktick) in &report.unmapped {
            if !seen.insert((geom_id, clocktick)) {
                continue;
            }
            let crate_label = nominal_crate(&geom_id);
            telemetry.record_unmapped(&crate_label);
            self.logger.log(
                to_ct1600(clocktick),
                LogLevel::Warn,
                MODULE,
                "aggregate",
                &format!(
                    "{}; dropped from {crate_label}",
                    TriggerError::UnmappedChannel(geom_id)
                ),
            )?;
        }
        Ok(())
    }
}

/// Crate a channel is cabled to in the nominal detector layout.
fn nominal_crate(geom_id: &GeomId) -> String {
    match *geom_id {
        GeomId::CaloMainWall { side, .. } => format!("calo.{side}"),
        GeomId::Gveto { .. } => format!("calo.{GVETO_CRATE_ID}"),
        GeomId::GeigerCell { row, .. } => {
            format!("geiger.{}", usize::from(row) / GEIGER_ROWS_PER_CRATE)
        }
    }
}
