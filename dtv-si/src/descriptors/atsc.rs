//! ATSC-specific descriptors.

use crate::cursor::Cursor;
use crate::error::SiError;

/// One elementary stream entry of a service location descriptor.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct AtscServiceLocationElement {
    pub stream_type: u8,
    /// Elementary PID (13 bits).
    pub elementary_pid: u16,
    /// Three-letter language code; empty when unset on the wire.
    pub language: String,
}

/// ATSC service location descriptor (0xA1), carried in VCT channel
/// entries in place of a PMT reference.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct AtscServiceLocationDescriptor {
    /// PCR PID (13 bits).
    pub pcr_pid: u16,
    pub elements: Vec<AtscServiceLocationElement>,
}

impl AtscServiceLocationDescriptor {
    pub fn parse(data: &[u8]) -> Result<Self, SiError> {
        let mut c = Cursor::new(data);
        let pcr_pid = c.read_u16()? & 0x1FFF;
        let count = c.read_u8()? as usize;
        let mut elements = Vec::with_capacity(count);
        for _ in 0..count {
            let stream_type = c.read_u8()?;
            let elementary_pid = c.read_u16()? & 0x1FFF;
            let lang = c.read_fixed(3)?;
            let language = if lang == [0, 0, 0] {
                String::new()
            } else {
                String::from_utf8_lossy(lang).into_owned()
            };
            elements.push(AtscServiceLocationElement {
                stream_type,
                elementary_pid,
                language,
            });
        }
        Ok(AtscServiceLocationDescriptor { pcr_pid, elements })
    }
}
