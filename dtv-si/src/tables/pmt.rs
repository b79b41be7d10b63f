//! Program Map Table (PMT).

use log::warn;

use crate::descriptors::{parse_descriptors, Descriptor};
use crate::error::SiError;
use crate::section::{table_id, SectionHeader};
use crate::tables::{open_section, SiTable};

/// One elementary stream entry of the PMT.
#[derive(Debug, Clone, PartialEq)]
pub struct PmtStream {
    pub stream_type: u8,
    /// Elementary PID (13 bits).
    pub elementary_pid: u16,
    pub descriptors: Vec<Descriptor>,
}

impl PmtStream {
    /// Human-readable stream type name.
    pub fn stream_type_name(&self) -> &'static str {
        stream_type_name(self.stream_type)
    }
}

/// Name for an MPEG stream type code.
pub fn stream_type_name(stream_type: u8) -> &'static str {
    match stream_type {
        0x01 => "Video MPEG1",
        0x02 => "Video MPEG2",
        0x03 => "Audio MPEG1",
        0x04 => "Audio MPEG2",
        0x05 => "Private Sections",
        0x06 => "Private Data",
        0x0F => "Audio AAC (ADTS)",
        0x10 => "Video MPEG4",
        0x11 => "Audio AAC (LATM)",
        0x1B => "Video H.264",
        0x24 => "Video H.265",
        0x81 => "Audio AC-3",
        0x00..=0x7F => "Reserved",
        _ => "User Private",
    }
}

/// Program Map Table for one service, listing its elementary streams.
///
/// The service id is the section header's extension id.
#[derive(Debug, Clone, PartialEq)]
pub struct Pmt {
    pub header: SectionHeader,
    /// PID carrying the program clock reference (13 bits).
    pub pcr_pid: u16,
    /// Program-level descriptors.
    pub descriptors: Vec<Descriptor>,
    pub streams: Vec<PmtStream>,
    /// Set when a declared length overran the section; the entries
    /// decoded before the overrun are kept.
    pub truncated: Option<SiError>,
}

impl Pmt {
    /// The service id this PMT describes.
    pub fn service_id(&self) -> u16 {
        self.header.extension_id
    }
}

impl SiTable for Pmt {
    const NAME: &'static str = "pmt";

    fn matches(tid: u8) -> bool {
        tid == table_id::PMT
    }

    fn decode(buf: &[u8], existing: Option<Self>) -> Result<(usize, Self), SiError> {
        let (header, mut payload, consumed) = open_section(buf, Self::NAME, Self::matches)?;

        let pcr_pid = payload.read_u16()? & 0x1FFF;
        let prog_info_len = (payload.read_u16()? & 0x0FFF) as usize;

        let mut table = existing.unwrap_or(Pmt {
            header,
            pcr_pid,
            descriptors: Vec::new(),
            streams: Vec::new(),
            truncated: None,
        });

        // A length field overrunning the section clamps to what is
        // there, keeps everything decoded so far and records the error.
        let clamped = prog_info_len.min(payload.remaining());
        if clamped < prog_info_len {
            warn!(
                "pmt: program info length {} exceeds section, clamping to {}",
                prog_info_len, clamped
            );
            table.truncated = Some(SiError::Truncated {
                declared: prog_info_len,
                remaining: clamped,
            });
        }
        let prog_info = payload.take_declared(clamped)?;
        let (mut descriptors, desc_err) = parse_descriptors(prog_info.rest());
        table.descriptors.append(&mut descriptors);
        if table.truncated.is_none() {
            table.truncated = desc_err;
        }

        while payload.remaining() >= 5 {
            let stream_type = payload.read_u8()?;
            let elementary_pid = payload.read_u16()? & 0x1FFF;
            let es_info_len = (payload.read_u16()? & 0x0FFF) as usize;

            let clamped = es_info_len.min(payload.remaining());
            if clamped < es_info_len {
                warn!(
                    "pmt: ES info length {} for PID 0x{:04x} exceeds section, clamping to {}",
                    es_info_len, elementary_pid, clamped
                );
                if table.truncated.is_none() {
                    table.truncated = Some(SiError::Truncated {
                        declared: es_info_len,
                        remaining: clamped,
                    });
                }
            }
            let es_info = payload.take_declared(clamped)?;
            let (descriptors, desc_err) = parse_descriptors(es_info.rest());
            if table.truncated.is_none() {
                table.truncated = desc_err;
            }

            table.streams.push(PmtStream {
                stream_type,
                elementary_pid,
                descriptors,
            });
        }

        Ok((consumed, table))
    }

    fn header(&self) -> &SectionHeader {
        &self.header
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::descriptors::tag;
    use crate::tables::testutil::long_section;

    fn sample_payload() -> Vec<u8> {
        let mut payload = Vec::new();
        payload.extend_from_slice(&0xE1FFu16.to_be_bytes()); // pcr_pid = 0x1FF
        payload.extend_from_slice(&0xF000u16.to_be_bytes()); // no program info
        // H.264 video on 0x100
        payload.push(0x1B);
        payload.extend_from_slice(&0xE100u16.to_be_bytes());
        payload.extend_from_slice(&0xF000u16.to_be_bytes());
        // AAC audio on 0x101 with a language descriptor
        payload.push(0x0F);
        payload.extend_from_slice(&0xE101u16.to_be_bytes());
        payload.extend_from_slice(&0xF006u16.to_be_bytes());
        payload.extend_from_slice(&[tag::ISO639_LANGUAGE, 0x04, b'e', b'n', b'g', 0x00]);
        payload
    }

    #[test]
    fn test_decode_pmt() {
        let image = long_section(table_id::PMT, 0x0065, 0, 0, 0, &sample_payload());

        let (consumed, pmt) = Pmt::decode(&image, None).unwrap();
        assert_eq!(consumed, image.len());
        assert_eq!(pmt.service_id(), 0x65);
        assert_eq!(pmt.pcr_pid, 0x1FF);
        assert!(pmt.truncated.is_none());
        assert_eq!(pmt.streams.len(), 2);
        assert_eq!(pmt.streams[0].stream_type_name(), "Video H.264");
        assert_eq!(stream_type_name(0x34), "Reserved");
        assert_eq!(stream_type_name(0x90), "User Private");
        assert_eq!(pmt.streams[1].elementary_pid, 0x101);
        assert_eq!(pmt.streams[1].descriptors.len(), 1);
    }

    #[test]
    fn test_es_length_overrun_keeps_streams() {
        let mut payload = Vec::new();
        payload.extend_from_slice(&0xE1FFu16.to_be_bytes());
        payload.extend_from_slice(&0xF000u16.to_be_bytes());
        // Good stream first.
        payload.push(0x02);
        payload.extend_from_slice(&0xE100u16.to_be_bytes());
        payload.extend_from_slice(&0xF000u16.to_be_bytes());
        // Second stream declares more descriptor bytes than remain.
        payload.push(0x04);
        payload.extend_from_slice(&0xE101u16.to_be_bytes());
        payload.extend_from_slice(&0xF0FFu16.to_be_bytes());

        let image = long_section(table_id::PMT, 1, 0, 0, 0, &payload);
        let (_, pmt) = Pmt::decode(&image, None).unwrap();

        // Both entries survive; the overrun is reported alongside.
        assert_eq!(pmt.streams.len(), 2);
        assert_eq!(pmt.streams[0].elementary_pid, 0x100);
        assert_eq!(pmt.streams[1].elementary_pid, 0x101);
        assert!(matches!(
            pmt.truncated,
            Some(SiError::Truncated { declared: 0xFF, .. })
        ));
    }

    #[test]
    fn test_decode_rejects_other_table() {
        let image = long_section(table_id::PAT, 1, 0, 0, 0, &[]);
        assert!(matches!(
            Pmt::decode(&image, None),
            Err(SiError::WrongTableId { decoder: "pmt", .. })
        ));
    }
}
