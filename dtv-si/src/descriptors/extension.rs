//! Extension descriptor (0x7F) and its sub-tag dispatch.
//!
//! The extension descriptor's payload starts with a second tag byte
//! selecting the actual format. Sub-tags without a typed decoder keep
//! their raw payload, mirroring the first-level dispatch policy.

use log::warn;

use crate::cursor::Cursor;
use crate::error::SiError;

/// Extension descriptor sub-tags with a typed decoder.
pub mod ext_tag {
    pub const T2_DELIVERY: u8 = 0x04;
}

/// Extension descriptor (0x7F) with its dispatched payload.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExtensionDescriptor {
    /// The sub-tag selecting the payload format.
    pub ext_tag: u8,
    pub payload: ExtensionPayload,
}

/// Dispatched extension payload.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ExtensionPayload {
    T2Delivery(T2DeliveryDescriptor),
    /// Sub-tag without a decoder; raw bytes preserved.
    Unknown(Vec<u8>),
}

impl ExtensionDescriptor {
    pub fn parse(data: &[u8]) -> Result<Self, SiError> {
        let mut c = Cursor::new(data);
        let ext_tag = c.read_u8()?;
        let body = c.rest();

        let payload = match ext_tag {
            ext_tag::T2_DELIVERY => match T2DeliveryDescriptor::parse(body) {
                Ok(d) => ExtensionPayload::T2Delivery(d),
                Err(e) => {
                    warn!("extension 0x{:02x}: {}, keeping raw payload", ext_tag, e);
                    ExtensionPayload::Unknown(body.to_vec())
                }
            },
            _ => ExtensionPayload::Unknown(body.to_vec()),
        };

        Ok(ExtensionDescriptor { ext_tag, payload })
    }
}

/// T2 delivery system descriptor (extension sub-tag 0x04).
///
/// Comes in a short form carrying only the PLP and system ids, and a
/// long form adding modulation parameters and the cell frequency loop.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct T2DeliveryDescriptor {
    /// Physical layer pipe id; doubles as the stream id when tuning.
    pub plp_id: u8,
    pub system_id: u16,
    pub extended: Option<T2DeliveryExtended>,
}

/// Long-form fields of the T2 delivery descriptor.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct T2DeliveryExtended {
    pub siso_miso: u8,
    pub bandwidth: u8,
    pub guard_interval: u8,
    pub transmission_mode: u8,
    pub other_frequency: bool,
    pub tfs: bool,
    /// Centre frequencies in Hz (wire value is in 10 Hz units). Copied
    /// out of the wire buffer, never borrowed.
    pub centre_frequencies: Vec<u64>,
    pub subcells: Vec<T2Subcell>,
}

/// One sub-cell entry of the long form.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct T2Subcell {
    pub cell_id_extension: u8,
    pub transposer_frequency: u16,
}

impl T2DeliveryDescriptor {
    pub fn parse(data: &[u8]) -> Result<Self, SiError> {
        let mut c = Cursor::new(data);
        let plp_id = c.read_u8()?;
        let system_id = c.read_u16()?;

        // Short form: nothing after the system id.
        if c.is_empty() {
            return Ok(T2DeliveryDescriptor {
                plp_id,
                system_id,
                extended: None,
            });
        }

        let word = c.read_u16()?;
        let tfs = word & 0x0001 != 0;

        // With TFS arrangement there is exactly one centre frequency
        // and no loop count on the wire.
        let loop_len = if tfs { 1 } else { c.read_u8()? as usize };
        let mut centre_frequencies = Vec::with_capacity(loop_len);
        for _ in 0..loop_len {
            centre_frequencies.push(c.read_u32()? as u64 * 10);
        }

        let subcell_len = c.read_u8()? as usize;
        let mut subcells = Vec::with_capacity(subcell_len);
        for _ in 0..subcell_len {
            subcells.push(T2Subcell {
                cell_id_extension: c.read_u8()?,
                transposer_frequency: c.read_u16()?,
            });
        }

        Ok(T2DeliveryDescriptor {
            plp_id,
            system_id,
            extended: Some(T2DeliveryExtended {
                siso_miso: ((word >> 14) & 0x03) as u8,
                bandwidth: ((word >> 10) & 0x0F) as u8,
                guard_interval: ((word >> 5) & 0x07) as u8,
                transmission_mode: ((word >> 2) & 0x07) as u8,
                other_frequency: word & 0x0002 != 0,
                tfs,
                centre_frequencies,
                subcells,
            }),
        })
    }
}
