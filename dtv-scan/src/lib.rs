//! Transponder scanning on top of [`dtv_si`] table decoding.
//!
//! The engine is I/O-agnostic: callers provide a [`SectionSource`]
//! that delivers raw section images from a tuned frontend, and
//! [`scan_transponder`] drives it through the table sequence a channel
//! scan needs, deduplicating the transponders the NIT announces along
//! the way.

pub mod config;
pub mod error;
pub mod frontend;
pub mod scan;
pub mod section_reader;
pub mod transponder;

pub use config::{ScanConfig, VersionChangePolicy};
pub use error::ScanError;
pub use frontend::SectionSource;
pub use scan::{scan_transponder, FrontendCheck, ScanResult};
pub use section_reader::{read_table, ReadOptions};
pub use transponder::{DeliverySystem, Polarization, TransponderEntry};
