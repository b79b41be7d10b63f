//! Network Information Table (NIT).

use crate::descriptors::{parse_descriptors, Descriptor};
use crate::error::SiError;
use crate::section::{table_id, SectionHeader};
use crate::tables::{open_section, SiTable};

/// One transport stream entry of the NIT.
#[derive(Debug, Clone, PartialEq)]
pub struct NitTransport {
    pub transport_id: u16,
    pub original_network_id: u16,
    /// Transport descriptors, including the delivery system descriptor
    /// the scan engine reads tuning parameters from.
    pub descriptors: Vec<Descriptor>,
}

/// Network Information Table, describing the transponders of a network.
///
/// The network id is the section header's extension id.
#[derive(Debug, Clone, PartialEq)]
pub struct Nit {
    pub header: SectionHeader,
    /// Network-level descriptors (network name and the like).
    pub descriptors: Vec<Descriptor>,
    pub transports: Vec<NitTransport>,
    /// Set when a descriptor loop was cut short; decoded entries kept.
    pub truncated: Option<SiError>,
}

impl Nit {
    /// The network id this table describes.
    pub fn network_id(&self) -> u16 {
        self.header.extension_id
    }
}

impl SiTable for Nit {
    const NAME: &'static str = "nit";

    fn matches(tid: u8) -> bool {
        tid == table_id::NIT || tid == table_id::NIT_OTHER
    }

    fn decode(buf: &[u8], existing: Option<Self>) -> Result<(usize, Self), SiError> {
        let (header, mut payload, consumed) = open_section(buf, Self::NAME, Self::matches)?;

        let mut table = existing.unwrap_or(Nit {
            header,
            descriptors: Vec::new(),
            transports: Vec::new(),
            truncated: None,
        });

        let net_desc_len = (payload.read_u16()? & 0x0FFF) as usize;
        let net_desc = payload.take_declared(net_desc_len)?;
        let (mut descriptors, desc_err) = parse_descriptors(net_desc.rest());
        table.descriptors.append(&mut descriptors);
        if table.truncated.is_none() {
            table.truncated = desc_err;
        }

        let ts_loop_len = (payload.read_u16()? & 0x0FFF) as usize;
        let mut ts_loop = payload.take_declared(ts_loop_len)?;

        while ts_loop.remaining() >= 6 {
            let transport_id = ts_loop.read_u16()?;
            let original_network_id = ts_loop.read_u16()?;
            let desc_len = (ts_loop.read_u16()? & 0x0FFF) as usize;
            let desc = ts_loop.take_declared(desc_len)?;
            let (descriptors, desc_err) = parse_descriptors(desc.rest());
            if table.truncated.is_none() {
                table.truncated = desc_err;
            }
            table.transports.push(NitTransport {
                transport_id,
                original_network_id,
                descriptors,
            });
        }

        Ok((consumed, table))
    }

    fn header(&self) -> &SectionHeader {
        &self.header
    }
}
