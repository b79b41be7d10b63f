//! MPEG Packetized Elementary Stream header.

use log::warn;

use crate::cursor::Cursor;
use crate::error::SiError;

/// Stream id values with special handling.
pub mod stream_id {
    pub const MAP: u8 = 0xBC;
    pub const PADDING: u8 = 0xBE;
    pub const PRIVATE_2: u8 = 0x5F;
    pub const ECM: u8 = 0x70;
    pub const EMM: u8 = 0x71;
    pub const DIRECTORY: u8 = 0xFF;
    pub const DSMCC: u8 = 0x7A;
    pub const H222E: u8 = 0xF8;
}

/// Optional PES header fields.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct PesOptional {
    pub scrambling_control: u8,
    pub priority: bool,
    pub data_alignment: bool,
    pub copyright: bool,
    pub original_or_copy: bool,
    /// Remaining optional header length declared on the wire.
    pub header_length: u8,
    /// Presentation timestamp (33 bits, 90 kHz units).
    pub pts: Option<u64>,
    /// Decoding timestamp (33 bits, 90 kHz units).
    pub dts: Option<u64>,
}

/// Parsed PES packet header.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Pes {
    pub stream_id: u8,
    /// Packet length field; 0 means unbounded (video).
    pub length: u16,
    /// Absent for padding streams.
    pub optional: Option<PesOptional>,
}

/// Read one 5-byte 33-bit timestamp, checking the marker bits.
fn read_timestamp(cursor: &mut Cursor, what: &str) -> Result<Option<u64>, SiError> {
    let b0 = cursor.read_u8()?;
    let w1 = cursor.read_u16()?;
    let w2 = cursor.read_u16()?;
    if b0 & 0x01 != 1 || w1 & 0x0001 != 1 || w2 & 0x0001 != 1 {
        warn!("pes: invalid {} marker bits", what);
        return Ok(None);
    }
    let bits30 = ((b0 >> 1) & 0x07) as u64;
    let bits15 = (w1 >> 1) as u64;
    let bits00 = (w2 >> 1) as u64;
    Ok(Some((bits30 << 30) | (bits15 << 15) | bits00))
}

impl Pes {
    /// Decode a PES header from the start of `buf`.
    pub fn decode(buf: &[u8]) -> Result<(usize, Self), SiError> {
        let mut cursor = Cursor::new(buf);

        let sync = cursor.read_u24()?;
        if sync != 0x000001 {
            return Err(SiError::InvalidSyncByte((sync & 0xFF) as u8));
        }
        let stream_id = cursor.read_u8()?;
        let length = cursor.read_u16()?;

        if stream_id == stream_id::PADDING {
            warn!("pes: padding stream ignored");
            return Ok((
                cursor.position(),
                Pes {
                    stream_id,
                    length,
                    optional: None,
                },
            ));
        }

        match stream_id {
            stream_id::MAP
            | stream_id::PRIVATE_2
            | stream_id::ECM
            | stream_id::EMM
            | stream_id::DIRECTORY
            | stream_id::DSMCC
            | stream_id::H222E => return Err(SiError::UnsupportedStream(stream_id)),
            _ => {}
        }

        let flags = cursor.read_u16()?;
        let header_length = cursor.read_u8()?;
        let pts_dts = (flags >> 6) & 0x03;

        let pts = if pts_dts & 0x02 != 0 {
            read_timestamp(&mut cursor, "pts")?
        } else {
            None
        };
        let dts = if pts_dts & 0x01 != 0 {
            read_timestamp(&mut cursor, "dts")?
        } else {
            None
        };

        Ok((
            cursor.position(),
            Pes {
                stream_id,
                length,
                optional: Some(PesOptional {
                    scrambling_control: ((flags >> 12) & 0x03) as u8,
                    priority: flags & 0x0800 != 0,
                    data_alignment: flags & 0x0400 != 0,
                    copyright: flags & 0x0200 != 0,
                    original_or_copy: flags & 0x0100 != 0,
                    header_length,
                    pts,
                    dts,
                }),
            },
        ))
    }
}
