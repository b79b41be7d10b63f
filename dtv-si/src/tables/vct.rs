//! ATSC Virtual Channel Table (TVCT/CVCT).

use crate::descriptors::{parse_descriptors, Descriptor};
use crate::error::SiError;
use crate::section::{table_id, SectionHeader};
use crate::tables::{open_section, SiTable};

/// One virtual channel entry of the VCT.
#[derive(Debug, Clone, PartialEq)]
pub struct VctChannel {
    /// Channel short name (up to 7 UTF-16 code units on the wire).
    pub short_name: String,
    pub major_channel_number: u16,
    pub minor_channel_number: u16,
    pub modulation_mode: u8,
    pub carrier_frequency: u32,
    pub channel_tsid: u16,
    pub program_number: u16,
    pub etm_location: u8,
    pub access_controlled: bool,
    pub hidden: bool,
    /// CVCT only; always false in a TVCT.
    pub path_select: bool,
    /// CVCT only; always false in a TVCT.
    pub out_of_band: bool,
    pub hide_guide: bool,
    pub service_type: u8,
    pub source_id: u16,
    pub descriptors: Vec<Descriptor>,
}

/// Virtual Channel Table, the ATSC channel line-up.
///
/// Table id 0xC8 is the terrestrial variant, 0xC9 the cable one; both
/// share the same layout. The transport stream id is the section
/// header's extension id.
#[derive(Debug, Clone, PartialEq)]
pub struct Vct {
    pub header: SectionHeader,
    pub protocol_version: u8,
    pub channels: Vec<VctChannel>,
    /// Table-level descriptors following the channel loop.
    pub descriptors: Vec<Descriptor>,
    /// Set when a descriptor loop was cut short; decoded entries kept.
    pub truncated: Option<SiError>,
}

impl Vct {
    /// Whether this is the cable variant.
    pub fn is_cable(&self) -> bool {
        self.header.table_id == table_id::ATSC_CVCT
    }
}

impl SiTable for Vct {
    const NAME: &'static str = "vct";

    fn matches(tid: u8) -> bool {
        tid == table_id::ATSC_TVCT || tid == table_id::ATSC_CVCT
    }

    fn decode(buf: &[u8], existing: Option<Self>) -> Result<(usize, Self), SiError> {
        let (header, mut payload, consumed) = open_section(buf, Self::NAME, Self::matches)?;

        let protocol_version = payload.read_u8()?;
        let num_channels = payload.read_u8()? as usize;

        let mut table = existing.unwrap_or(Vct {
            header,
            protocol_version,
            channels: Vec::new(),
            descriptors: Vec::new(),
            truncated: None,
        });

        for _ in 0..num_channels {
            if payload.is_empty() {
                break;
            }
            let name_raw = payload.read_fixed(14)?;
            let mut units = [0u16; 7];
            for (i, pair) in name_raw.chunks_exact(2).enumerate() {
                units[i] = u16::from_be_bytes([pair[0], pair[1]]);
            }
            let len = units.iter().position(|&u| u == 0).unwrap_or(7);
            let short_name = String::from_utf16_lossy(&units[..len]);

            let word = payload.read_u32()?;
            let carrier_frequency = payload.read_u32()?;
            let channel_tsid = payload.read_u16()?;
            let program_number = payload.read_u16()?;
            let flags = payload.read_u16()?;
            let source_id = payload.read_u16()?;
            let desc_len = (payload.read_u16()? & 0x03FF) as usize;
            let desc = payload.take_declared(desc_len)?;
            let (descriptors, desc_err) = parse_descriptors(desc.rest());
            if table.truncated.is_none() {
                table.truncated = desc_err;
            }

            table.channels.push(VctChannel {
                short_name,
                major_channel_number: ((word >> 18) & 0x03FF) as u16,
                minor_channel_number: ((word >> 8) & 0x03FF) as u16,
                modulation_mode: (word & 0xFF) as u8,
                carrier_frequency,
                channel_tsid,
                program_number,
                etm_location: ((flags >> 14) & 0x03) as u8,
                access_controlled: flags & 0x2000 != 0,
                hidden: flags & 0x1000 != 0,
                path_select: flags & 0x0800 != 0,
                out_of_band: flags & 0x0400 != 0,
                hide_guide: flags & 0x0200 != 0,
                service_type: (flags & 0x003F) as u8,
                source_id,
                descriptors,
            });
        }

        if payload.remaining() >= 2 {
            let desc_len = (payload.read_u16()? & 0x03FF) as usize;
            let desc = payload.take_declared(desc_len)?;
            let (mut descriptors, desc_err) = parse_descriptors(desc.rest());
            table.descriptors.append(&mut descriptors);
            if table.truncated.is_none() {
                table.truncated = desc_err;
            }
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

    fn channel_entry(name: &str, major: u16, minor: u16, program: u16) -> Vec<u8> {
        let mut entry = Vec::new();
        let mut units: Vec<u16> = name.encode_utf16().collect();
        units.resize(7, 0);
        for u in units {
            entry.extend_from_slice(&u.to_be_bytes());
        }
        let word = 0xF000_0000u32
            | ((major as u32 & 0x3FF) << 18)
            | ((minor as u32 & 0x3FF) << 8)
            | 0x04; // 8-VSB
        entry.extend_from_slice(&word.to_be_bytes());
        entry.extend_from_slice(&0u32.to_be_bytes()); // carrier (unused)
        entry.extend_from_slice(&0x0301u16.to_be_bytes()); // channel TSID
        entry.extend_from_slice(&program.to_be_bytes());
        entry.extend_from_slice(&0x0002u16.to_be_bytes()); // digital TV service
        entry.extend_from_slice(&0x0007u16.to_be_bytes()); // source id
        // One service location descriptor with a single video stream.
        let mut desc = vec![tag::ATSC_SERVICE_LOCATION, 0x09];
        desc.extend_from_slice(&[0xE0, 0x31, 0x01, 0x02, 0xE0, 0x31, 0x00, 0x00, 0x00]);
        entry.extend_from_slice(&(0xFC00 | desc.len() as u16).to_be_bytes());
        entry.extend_from_slice(&desc);
        entry
    }

    #[test]
    fn test_decode_tvct() {
        let mut payload = vec![0x00, 0x02]; // protocol version, 2 channels
        payload.extend_from_slice(&channel_entry("KTST", 7, 1, 3));
        payload.extend_from_slice(&channel_entry("KTST-SD", 7, 2, 4));
        payload.extend_from_slice(&0xFC00u16.to_be_bytes()); // no extra descriptors
        let image = long_section(table_id::ATSC_TVCT, 0x0301, 0, 0, 0, &payload);

        let (consumed, vct) = Vct::decode(&image, None).unwrap();
        assert_eq!(consumed, image.len());
        assert!(!vct.is_cable());
        assert!(vct.truncated.is_none());
        assert_eq!(vct.channels.len(), 2);

        let ch = &vct.channels[0];
        assert_eq!(ch.short_name, "KTST");
        assert_eq!(ch.major_channel_number, 7);
        assert_eq!(ch.minor_channel_number, 1);
        assert_eq!(ch.modulation_mode, 0x04);
        assert_eq!(ch.program_number, 3);
        assert_eq!(ch.service_type, 0x02);
        assert_eq!(ch.source_id, 7);
        assert!(!ch.hidden);
        assert_eq!(ch.descriptors.len(), 1);
        assert_eq!(vct.channels[1].short_name, "KTST-SD");
    }

    #[test]
    fn test_hidden_flag() {
        let mut entry = channel_entry("HID", 8, 1, 5);
        // Flags word sits 8 bytes before the descriptor length word.
        let flags_at = 14 + 4 + 4 + 2 + 2;
        entry[flags_at] |= 0x10; // hidden bit in the high byte
        let mut payload = vec![0x00, 0x01];
        payload.extend_from_slice(&entry);
        payload.extend_from_slice(&0xFC00u16.to_be_bytes());
        let image = long_section(table_id::ATSC_TVCT, 1, 0, 0, 0, &payload);

        let (_, vct) = Vct::decode(&image, None).unwrap();
        assert!(vct.channels[0].hidden);
    }
}
