pub mod analysis;
pub mod dataset;
pub mod events;
pub mod stats;
