//! Level-one tracker trigger: geiger matrix, zone layout and lookup memories.

pub mod algorithm;
pub mod memory;
pub mod zone;
