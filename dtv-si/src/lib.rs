//! Digital TV Service Information (PSI/SI) decoding.
//!
//! This crate decodes the broadcast metadata tables carried in MPEG
//! transport streams: the MPEG PSI tables (PAT, CAT, PMT), the DVB SI
//! tables (NIT, SDT, EIT) and their ATSC counterparts (VCT, MGT, EIT),
//! plus the raw MPEG-TS packet and PES headers. All decoders are pure,
//! synchronous functions over byte buffers; nothing here performs I/O.
//!
//! Decoded tables own their data. Descriptors attached to tables and
//! table entries are decoded through a tag-dispatched descriptor layer
//! that preserves unknown tags as raw bytes instead of dropping them.

pub mod crc;
pub mod cursor;
pub mod descriptors;
pub mod error;
pub mod section;
pub mod tables;
pub mod text;
pub mod time;

pub use cursor::Cursor;
pub use error::SiError;
pub use section::SectionHeader;
