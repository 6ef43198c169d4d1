//! Read-only ASCII views of trigger records.

use crate::calo_trigger::CaloSummaryRecord;
use crate::coincidence::records::CoincidenceEventRecord;
use crate::mapping::{NLAYERS, NROWS, NSIDES, NZONES};
use crate::tracker::algorithm::{GeigerMatrix, TrackerRecord};
use std::fmt::Write as _;

/// Deterministic display of one record.
pub trait TriggerView {
    fn label(&self) -> &'static str;

    /// Clocktick the record belongs to, in its own time base.
    fn clocktick(&self) -> u32;

    fn render(&self) -> String;
}

impl TriggerView for GeigerMatrix {
    fn label(&self) -> &'static str {
        "geiger_matrix"
    }

    fn clocktick(&self) -> u32 {
        self.clocktick_1600ns
    }

    /// Side 0 is drawn outer layer first so both sides meet at the source foil.
    fn render(&self) -> String {
        let mut out = String::new();
        let _ = writeln!(out, "{} ct1600={}", self.label(), self.clocktick_1600ns);
        for layer in (0..NLAYERS).rev() {
            push_layer(&mut out, self, 0, layer);
        }
        out.push_str(&"=".repeat(NROWS));
        out.push('\n');
        for layer in 0..NLAYERS {
            push_layer(&mut out, self, 1, layer);
        }
        out
    }
}

fn push_layer(out: &mut String, matrix: &GeigerMatrix, side: usize, layer: usize) {
    for row in 0..NROWS {
        out.push(if matrix.is_hit(side, layer, row) { '*' } else { '.' });
    }
    out.push('\n');
}

impl TriggerView for TrackerRecord {
    fn label(&self) -> &'static str {
        "tracker_record"
    }

    fn clocktick(&self) -> u32 {
        self.clocktick_1600ns
    }

    fn render(&self) -> String {
        let mut out = String::new();
        let _ = writeln!(
            out,
            "{} ct1600={} decision={}",
            self.label(),
            self.clocktick_1600ns,
            u8::from(self.decision)
        );
        for side in 0..NSIDES {
            let zones: Vec<String> = (0..NZONES)
                .map(|zone| self.zone(side, zone).to_string())
                .collect();
            let _ = writeln!(
                out,
                "side {side} [{}] pattern={:010b} near_source={:010b}",
                zones.join(" "),
                self.zoning_word_pattern[side],
                self.zoning_word_near_source[side]
            );
        }
        out
    }
}

impl TriggerView for CaloSummaryRecord {
    fn label(&self) -> &'static str {
        "calo_summary"
    }

    fn clocktick(&self) -> u32 {
        self.clocktick_25ns
    }

    fn render(&self) -> String {
        let mut out = String::new();
        let _ = writeln!(
            out,
            "{} ct25={} decision={} threshold={}",
            self.label(),
            self.clocktick_25ns,
            u8::from(self.decision),
            u8::from(self.total_multiplicity_threshold)
        );
        let _ = writeln!(
            out,
            "side 0 zoning={:010b} htm={} lto={}",
            self.zoning_word[0],
            self.total_multiplicity_side_0,
            u8::from(self.lto_side_0)
        );
        let _ = writeln!(
            out,
            "side 1 zoning={:010b} htm={} lto={}",
            self.zoning_word[1],
            self.total_multiplicity_side_1,
            u8::from(self.lto_side_1)
        );
        let _ = writeln!(
            out,
            "gveto  zoning={:04b} htm={} lto={} xt_info={:06b}",
            self.zoning_gveto,
            self.total_multiplicity_gveto,
            u8::from(self.lto_gveto),
            self.xt_info
        );
        out
    }
}

impl TriggerView for CoincidenceEventRecord {
    fn label(&self) -> &'static str {
        "coincidence_event"
    }

    fn clocktick(&self) -> u32 {
        self.clocktick_1600ns
    }

    fn render(&self) -> String {
        let mut out = String::new();
        let _ = writeln!(
            out,
            "{} ct1600={} mode={} prompt={} delayed={} decision={}",
            self.label(),
            self.clocktick_1600ns,
            self.trigger_mode,
            u8::from(self.prompt_decision),
            u8::from(self.delayed_decision),
            u8::from(self.decision)
        );
        for side in 0..NSIDES {
            let _ = writeln!(
                out,
                "side {side} calo={:010b} tracker={:010b} coincidence={:010b}",
                self.calo_zoning_word[side],
                self.tracker_zoning_word_pattern[side],
                self.coincidence_zoning_word[side]
            );
        }
        out
    }
}
