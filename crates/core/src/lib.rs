//! Festival transit demand engine.
//!
//! Pure, synchronous building blocks that turn performance records and a
//! set of transit stops into per-stop passenger allocations, an underserved
//! zone index (UZI) per venue, time-binned ingress/egress flows and tiered
//! operator recommendations. No I/O lives here: ingestion and serving are
//! the job of `festflow-sources` and `festflow-api`.

pub mod attendance;
pub mod config;
pub mod dataset;
pub mod distance;
pub mod distribution;
pub mod error;
pub mod frequency;
pub mod model;
pub mod peak_flow;
pub mod pipeline;
pub mod recommendation;
pub mod search;
pub mod stats;
pub mod types;
pub mod underserved;

#[cfg(test)]
pub(crate) mod test_support;
