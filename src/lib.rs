//! Emulator of the two-level SuperNEMO trigger: calorimeter and tracker
//! primitives, crate words, level-one summaries and level-two coincidences.

pub mod app;
pub mod calo_trigger;
pub mod clock;
pub mod coincidence;
pub mod config;
pub mod ctw;
pub mod error;
pub mod mapping;
pub mod observability;
pub mod pipeline;
pub mod primitive;
pub mod ring;
pub mod signal;
pub mod tracker;
pub mod view;

pub use calo_trigger::{CaloSummaryRecord, CaloTriggerAlgorithm, InfoBit, INFO_BITSET_SIZE};
pub use clock::{
    clocktick_25ns, clocktick_800ns, ct25_to_ct1600, ct800_to_ct1600, ClocktickGuard,
    GEIGER_CLOCKTICK_NS, MAIN_CLOCKTICK_NS, SHIFT_COMPUTING_CLOCKTICK_1600NS,
    TICKS_25NS_PER_1600NS, TICKS_800NS_PER_1600NS, TRIGGER_CLOCKTICK_NS,
};
pub use coincidence::{
    CoincidenceCaloRecord, CoincidenceEventRecord, CoincidenceOutput,
    CoincidenceTriggerAlgorithm, DecisionLatch, L2Decision, PreviousEventRecord, TriggerMode,
};
pub use config::{
    CaloTriggerConfig, CoincidenceConfig, ConfigError, EncoderConfig, TrackerTriggerConfig,
    TriggerConfig,
};
pub use ctw::calo::{
    CaloCtw, CaloCtwAggregator, CaloCtwData, WallType, CTW_FULL_SIZE, GVETO_ZONING_SIZE,
    MAIN_ZONING_SIZE,
};
pub use ctw::geiger::{GeigerCtw, GeigerCtwAggregator, GeigerCtwData};
pub use ctw::{AggregationReport, CrateWord, CtwData};
pub use error::TriggerError;
pub use mapping::{
    board_index, calo_zone, ElectronicId, ElectronicMapping, GeomId, TableMapping, NLAYERS,
    NROWS, NSIDES, NZONES,
};
pub use observability::{
    JsonLineLogger, LogFile, LogLevel, LogRotationPolicy, LoggingError, PipelineTelemetry,
};
pub use pipeline::{TriggerOutput, TriggerPipeline};
pub use primitive::calo::{
    encode_htm, AmplitudeLevel, CaloThresholds, CaloTp, CaloTpBit, HTM_MAX,
};
pub use primitive::collection::TpCollection;
pub use primitive::encoder::{CaloTpEncoder, EncodingReport, GeigerTpEncoder};
pub use primitive::geiger::GeigerTp;
pub use primitive::TriggerPrimitive;
pub use ring::RingBuffer;
pub use signal::{check_signal_order, SignalRecord};
pub use tracker::algorithm::{
    GeigerMatrix, TrackerMemories, TrackerRecord, TrackerTriggerAlgorithm,
};
pub use tracker::memory::{LookupMemory, MemoryError};
pub use tracker::zone::{zone_of_row, zone_start_row, zone_stop_row, zone_width, ZoneBit, ZoneData};
pub use view::TriggerView;
