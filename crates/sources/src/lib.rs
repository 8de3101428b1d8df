//! Ingestion boundary for the festival transit engine.
//!
//! Turns vendor payloads (event feeds, stop lists, timetables) into the
//! flattened records `festflow-core` works on. Defaults for missing fields
//! are applied here; anything unreadable resolves to an empty but valid
//! input so a broken upstream never aborts a pipeline run.

pub mod error;
pub mod events;
pub mod json;
pub mod stops;
pub mod timestamps;
pub mod timetable;

pub use error::SourceError;
