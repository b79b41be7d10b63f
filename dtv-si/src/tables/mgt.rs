//! ATSC Master Guide Table (MGT).

use crate::descriptors::{parse_descriptors, Descriptor};
use crate::error::SiError;
use crate::section::{table_id, SectionHeader};
use crate::tables::{open_section, SiTable};

/// Well-known MGT table type values.
pub mod table_type {
    pub const TVCT_CURRENT: u16 = 0x0000;
    pub const TVCT_NEXT: u16 = 0x0001;
    pub const CVCT_CURRENT: u16 = 0x0002;
    pub const CVCT_NEXT: u16 = 0x0003;
    pub const CHANNEL_ETT: u16 = 0x0004;
    /// EIT-0 .. EIT-127 occupy 0x0100-0x017F.
    pub const EIT_0: u16 = 0x0100;
    /// ETT-0 .. ETT-127 occupy 0x0200-0x027F.
    pub const ETT_0: u16 = 0x0200;
}

/// One table entry of the MGT.
#[derive(Debug, Clone, PartialEq)]
pub struct MgtTable {
    pub table_type: u16,
    /// PID the announced table is carried on (13 bits).
    pub pid: u16,
    pub type_version: u8,
    pub number_bytes: u32,
    pub descriptors: Vec<Descriptor>,
}

/// Master Guide Table, announcing where the other ATSC tables live.
///
/// The scan engine reads it to find the EIT PIDs.
#[derive(Debug, Clone, PartialEq)]
pub struct Mgt {
    pub header: SectionHeader,
    pub protocol_version: u8,
    pub tables: Vec<MgtTable>,
    /// Table-level descriptors following the entry loop.
    pub descriptors: Vec<Descriptor>,
    /// Set when a descriptor loop was cut short; decoded entries kept.
    pub truncated: Option<SiError>,
}

impl Mgt {
    /// PIDs carrying EIT tables, in announcement order.
    pub fn eit_pids(&self) -> Vec<u16> {
        self.tables
            .iter()
            .filter(|t| (table_type::EIT_0..table_type::EIT_0 + 0x80).contains(&t.table_type))
            .map(|t| t.pid)
            .collect()
    }
}

impl SiTable for Mgt {
    const NAME: &'static str = "mgt";

    fn matches(tid: u8) -> bool {
        tid == table_id::ATSC_MGT
    }

    fn decode(buf: &[u8], existing: Option<Self>) -> Result<(usize, Self), SiError> {
        let (header, mut payload, consumed) = open_section(buf, Self::NAME, Self::matches)?;

        let protocol_version = payload.read_u8()?;
        let num_tables = payload.read_u16()? as usize;

        let mut table = existing.unwrap_or(Mgt {
            header,
            protocol_version,
            tables: Vec::new(),
            descriptors: Vec::new(),
            truncated: None,
        });

        for _ in 0..num_tables {
            if payload.is_empty() {
                break;
            }
            let table_type = payload.read_u16()?;
            let pid = payload.read_u16()? & 0x1FFF;
            let type_version = payload.read_u8()? & 0x1F;
            let number_bytes = payload.read_u32()?;
            let desc_len = (payload.read_u16()? & 0x0FFF) as usize;
            let desc = payload.take_declared(desc_len)?;
            let (descriptors, desc_err) = parse_descriptors(desc.rest());
            if table.truncated.is_none() {
                table.truncated = desc_err;
            }
            table.tables.push(MgtTable {
                table_type,
                pid,
                type_version,
                number_bytes,
                descriptors,
            });
        }

        if payload.remaining() >= 2 {
            let desc_len = (payload.read_u16()? & 0x0FFF) as usize;
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
    use crate::tables::testutil::long_section;

    fn mgt_entry(table_type: u16, pid: u16, version: u8) -> Vec<u8> {
        let mut entry = Vec::new();
        entry.extend_from_slice(&table_type.to_be_bytes());
        entry.extend_from_slice(&(0xE000 | pid).to_be_bytes());
        entry.push(0xE0 | version);
        entry.extend_from_slice(&4096u32.to_be_bytes());
        entry.extend_from_slice(&0xF000u16.to_be_bytes()); // no descriptors
        entry
    }

    #[test]
    fn test_decode_mgt() {
        let mut payload = vec![0x00]; // protocol version
        payload.extend_from_slice(&3u16.to_be_bytes());
        payload.extend_from_slice(&mgt_entry(table_type::TVCT_CURRENT, 0x1FFB, 2));
        payload.extend_from_slice(&mgt_entry(table_type::EIT_0, 0x1D00, 1));
        payload.extend_from_slice(&mgt_entry(table_type::EIT_0 + 1, 0x1D01, 1));
        payload.extend_from_slice(&0xF000u16.to_be_bytes()); // no extra descriptors
        let image = long_section(table_id::ATSC_MGT, 0, 0, 0, 0, &payload);

        let (consumed, mgt) = Mgt::decode(&image, None).unwrap();
        assert_eq!(consumed, image.len());
        assert!(mgt.truncated.is_none());
        assert_eq!(mgt.tables.len(), 3);
        assert_eq!(mgt.tables[0].table_type, table_type::TVCT_CURRENT);
        assert_eq!(mgt.tables[0].pid, 0x1FFB);
        assert_eq!(mgt.tables[0].type_version, 2);
        assert_eq!(mgt.tables[0].number_bytes, 4096);
        assert_eq!(mgt.eit_pids(), vec![0x1D00, 0x1D01]);
    }
}
