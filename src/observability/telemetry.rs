use serde::Serialize;
use std::collections::BTreeMap;

/// Counters accumulated over one pipeline run.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct PipelineTelemetry {
    pub signals: u64,
    pub calo_tps: u64,
    pub geiger_tps: u64,
    pub calo_ctws: u64,
    pub geiger_ctws: u64,
    pub unmapped_channels: u64,
    /// Unmapped channels keyed by the crate label they were dropped from.
    pub unmapped_per_crate: BTreeMap<String, u64>,
    pub calo_l1_passes: u64,
    pub tracker_records: u64,
    pub prompt_decisions: u64,
    pub ape_decisions: u64,
    pub dave_decisions: u64,
    pub calo_only_decisions: u64,
    pub l2_decisions: u64,
}

impl PipelineTelemetry {
    pub fn record_unmapped(&mut self, crate_label: &str) {
        self.unmapped_channels = self.unmapped_channels.saturating_add(1);
        let slot = self
            .unmapped_per_crate
            .entry(crate_label.to_string())
            .or_default();
        *slot = slot.saturating_add(1);
    }

    /// Count of unmapped channels dropped by one crate.
    pub fn unmapped_in(&self, crate_label: &str) -> u64 {
        self.unmapped_per_crate
            .get(crate_label)
            .copied()
            .unwrap_or_default()
    }

    /// Level-two decisions latched true, prompt and delayed.
    pub fn accepted(&self) -> u64 {
        self.prompt_decisions
            .saturating_add(self.ape_decisions)
            .saturating_add(self.dave_decisions)
    }
}

pub(crate) fn bump(counter: &mut u64, by: u64) {
    *counter = counter.saturating_add(by);
}
