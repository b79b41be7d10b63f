//! MPEG transport stream packet header.

use crate::cursor::Cursor;
use crate::error::SiError;

/// Fixed size of a transport stream packet.
pub const TS_PACKET_SIZE: usize = 188;

/// Sync byte opening every TS packet.
pub const TS_SYNC_BYTE: u8 = 0x47;

/// Adaptation field flags (the field body itself is skipped).
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct AdaptationField {
    pub length: u8,
    pub discontinuity: bool,
    pub random_access: bool,
    pub es_priority: bool,
    pub pcr_present: bool,
    pub opcr_present: bool,
    pub splicing_point: bool,
    pub private_data: bool,
    pub extension: bool,
}

/// One parsed 188-byte transport stream packet.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TsPacket {
    pub transport_error: bool,
    pub payload_unit_start: bool,
    pub priority: bool,
    /// Packet PID (13 bits).
    pub pid: u16,
    pub scrambling: u8,
    pub continuity_counter: u8,
    pub adaptation: Option<AdaptationField>,
    /// Payload bytes after the header and adaptation field.
    pub payload: Vec<u8>,
}

impl TsPacket {
    /// Decode one packet from the start of `buf`.
    ///
    /// Consumes exactly [`TS_PACKET_SIZE`] bytes, or the whole buffer
    /// for a trailing partial packet.
    pub fn decode(buf: &[u8]) -> Result<(usize, Self), SiError> {
        let packet = &buf[..buf.len().min(TS_PACKET_SIZE)];
        let mut cursor = Cursor::new(packet);

        let sync = cursor.read_u8()?;
        if sync != TS_SYNC_BYTE {
            return Err(SiError::InvalidSyncByte(sync));
        }

        let word = cursor.read_u16()?;
        let flags = cursor.read_u8()?;
        let has_adaptation = flags & 0x20 != 0;
        let has_payload = flags & 0x10 != 0;

        let adaptation = if has_adaptation {
            let length = cursor.read_u8()?;
            if length > 0 {
                let mut body = cursor.take_declared(length as usize)?;
                let af = body.read_u8()?;
                Some(AdaptationField {
                    length,
                    discontinuity: af & 0x80 != 0,
                    random_access: af & 0x40 != 0,
                    es_priority: af & 0x20 != 0,
                    pcr_present: af & 0x10 != 0,
                    opcr_present: af & 0x08 != 0,
                    splicing_point: af & 0x04 != 0,
                    private_data: af & 0x02 != 0,
                    extension: af & 0x01 != 0,
                })
            } else {
                Some(AdaptationField {
                    length: 0,
                    ..Default::default()
                })
            }
        } else {
            None
        };

        let payload = if has_payload {
            cursor.rest().to_vec()
        } else {
            Vec::new()
        };

        Ok((
            packet.len(),
            TsPacket {
                transport_error: word & 0x8000 != 0,
                payload_unit_start: word & 0x4000 != 0,
                priority: word & 0x2000 != 0,
                pid: word & 0x1FFF,
                scrambling: (flags >> 6) & 0x03,
                continuity_counter: flags & 0x0F,
                adaptation,
                payload,
            },
        ))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn packet(pid: u16, flags: u8) -> Vec<u8> {
        let mut p = vec![TS_SYNC_BYTE];
        p.extend_from_slice(&(0x4000 | pid).to_be_bytes()); // unit start set
        p.push(flags);
        p.resize(TS_PACKET_SIZE, 0xFF);
        p
    }

    #[test]
    fn test_decode_payload_only() {
        let raw = packet(0x100, 0x15); // payload, cc = 5
        let (consumed, ts) = TsPacket::decode(&raw).unwrap();
        assert_eq!(consumed, TS_PACKET_SIZE);
        assert_eq!(ts.pid, 0x100);
        assert!(ts.payload_unit_start);
        assert!(!ts.transport_error);
        assert_eq!(ts.continuity_counter, 5);
        assert!(ts.adaptation.is_none());
        assert_eq!(ts.payload.len(), TS_PACKET_SIZE - 4);
    }

    #[test]
    fn test_decode_adaptation_field() {
        let mut raw = packet(0x1FFF, 0x30); // adaptation + payload
        raw[4] = 0x02; // adaptation length
        raw[5] = 0x50; // random access + PCR flag
        let (_, ts) = TsPacket::decode(&raw).unwrap();
        let af = ts.adaptation.unwrap();
        assert_eq!(af.length, 2);
        assert!(af.random_access);
        assert!(af.pcr_present);
        assert!(!af.discontinuity);
        assert_eq!(ts.payload.len(), TS_PACKET_SIZE - 4 - 1 - 2);
    }

    #[test]
    fn test_bad_sync_byte() {
        let mut raw = packet(0, 0x10);
        raw[0] = 0x48;
        assert_eq!(
            TsPacket::decode(&raw).unwrap_err(),
            SiError::InvalidSyncByte(0x48)
        );
    }
}
