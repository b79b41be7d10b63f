//! Conditional Access Table (CAT).

use crate::descriptors::{parse_descriptors, Descriptor};
use crate::error::SiError;
use crate::section::{table_id, SectionHeader};
use crate::tables::{open_section, SiTable};

/// Conditional Access Table, carrying the CA descriptors that point at
/// the EMM streams of the multiplex.
#[derive(Debug, Clone, PartialEq)]
pub struct Cat {
    pub header: SectionHeader,
    pub descriptors: Vec<Descriptor>,
    /// Set when the descriptor loop was cut short; the descriptors
    /// decoded before the cut are kept.
    pub truncated: Option<SiError>,
}

impl SiTable for Cat {
    const NAME: &'static str = "cat";

    fn matches(tid: u8) -> bool {
        tid == table_id::CAT
    }

    fn decode(buf: &[u8], existing: Option<Self>) -> Result<(usize, Self), SiError> {
        let (header, payload, consumed) = open_section(buf, Self::NAME, Self::matches)?;

        let mut table = existing.unwrap_or(Cat {
            header,
            descriptors: Vec::new(),
            truncated: None,
        });

        let (mut descriptors, truncated) = parse_descriptors(payload.rest());
        table.descriptors.append(&mut descriptors);
        if table.truncated.is_none() {
            table.truncated = truncated;
        }

        Ok((consumed, table))
    }

    fn header(&self) -> &SectionHeader {
        &self.header
    }
}
