//! Level-two coincidence trigger between the calorimeter and the tracker.

pub mod algorithm;
pub mod records;

pub use algorithm::{CoincidenceOutput, CoincidenceTriggerAlgorithm};
pub use records::{
    CoincidenceCaloRecord, CoincidenceEventRecord, DecisionLatch, L2Decision,
    PreviousEventRecord, TriggerMode,
};
