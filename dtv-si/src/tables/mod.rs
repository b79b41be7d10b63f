//! Table decoders for PSI/SI sections.
//!
//! Each decoder consumes one section image covering the table id byte
//! through the end of the payload; the trailing CRC-32 is verified and
//! stripped by the section reader before decode. Multi-section tables
//! are accumulated by passing the previously decoded value back in as
//! `existing`, which appends the new section's entries.

pub mod atsc_eit;
pub mod cat;
pub mod eit;
pub mod mgt;
pub mod nit;
pub mod pat;
pub mod pes;
pub mod pmt;
pub mod sdt;
pub mod ts_packet;
pub mod vct;

use crate::cursor::Cursor;
use crate::error::SiError;
use crate::section::SectionHeader;

pub use atsc_eit::AtscEit;
pub use cat::Cat;
pub use eit::Eit;
pub use mgt::Mgt;
pub use nit::Nit;
pub use pat::Pat;
pub use pes::Pes;
pub use pmt::Pmt;
pub use sdt::Sdt;
pub use ts_packet::TsPacket;
pub use vct::Vct;

/// A decodable PSI/SI table.
pub trait SiTable: Sized {
    /// Short name used in errors and log lines.
    const NAME: &'static str;

    /// Whether this decoder handles sections with the given table id.
    fn matches(table_id: u8) -> bool;

    /// Decode one section, appending to `existing` when given.
    ///
    /// Returns the bytes consumed and the (possibly merged) table.
    fn decode(buf: &[u8], existing: Option<Self>) -> Result<(usize, Self), SiError>;

    /// Header of the most recently merged section.
    fn header(&self) -> &SectionHeader;
}

/// Parse the section header and hand back a cursor bounded to the
/// section payload (everything between the long header and the CRC).
///
/// The section length field counts the long header tail (5 bytes) and
/// the CRC-32 (4 bytes) that the reader already stripped, so both are
/// subtracted from the payload bound.
pub(crate) fn open_section<'a>(
    buf: &'a [u8],
    decoder: &'static str,
    matches: fn(u8) -> bool,
) -> Result<(SectionHeader, Cursor<'a>, usize), SiError> {
    let mut cursor = Cursor::new(buf);
    let header = SectionHeader::parse(&mut cursor)?;
    if !matches(header.table_id) {
        return Err(SiError::WrongTableId {
            decoder,
            found: header.table_id,
        });
    }
    let overhead = if header.syntax { 9 } else { 0 };
    let payload_len = (header.section_length as usize).saturating_sub(overhead);
    let payload = cursor.take_declared(payload_len)?;
    let consumed = cursor.position();
    Ok((header, payload, consumed))
}

#[cfg(test)]
pub(crate) mod testutil {
    //! Builders for hand-made section images used across table tests.

    /// Wrap `payload` in a long section header. The section length
    /// accounts for the CRC even though the returned image omits it,
    /// matching what decoders receive from the section reader.
    pub fn long_section(
        table_id: u8,
        extension_id: u16,
        version: u8,
        section_number: u8,
        last_section_number: u8,
        payload: &[u8],
    ) -> Vec<u8> {
        let section_length = (payload.len() + 5 + 4) as u16;
        let mut out = Vec::with_capacity(8 + payload.len());
        out.push(table_id);
        out.extend_from_slice(&(0xB000 | (section_length & 0x0FFF)).to_be_bytes());
        out.extend_from_slice(&extension_id.to_be_bytes());
        out.push(0xC0 | (version << 1) | 0x01);
        out.push(section_number);
        out.push(last_section_number);
        out.extend_from_slice(payload);
        out
    }
}
