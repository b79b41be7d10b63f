//! Section header parsing and table id / PID constants.
//!
//! Every PSI/SI section starts with the same 3-byte header: table id
//! plus a 12-bit section length. Long sections (syntax flag set) add a
//! 16-bit extension id whose meaning depends on the table kind
//! (transport stream id, network id, program number, service id or
//! ATSC source id), a 5-bit version, a current/next flag and the
//! section number pair used for multi-section reassembly.

use crate::cursor::Cursor;
use crate::error::SiError;

/// Well-known table id values.
pub mod table_id {
    pub const PAT: u8 = 0x00;
    pub const CAT: u8 = 0x01;
    pub const PMT: u8 = 0x02;
    pub const NIT: u8 = 0x40;
    pub const NIT_OTHER: u8 = 0x41;
    pub const SDT: u8 = 0x42;
    pub const SDT_OTHER: u8 = 0x46;
    pub const EIT_PF: u8 = 0x4E;
    pub const EIT_PF_OTHER: u8 = 0x4F;
    pub const EIT_SCHEDULE: u8 = 0x50;
    pub const EIT_SCHEDULE_OTHER: u8 = 0x60;
    pub const ATSC_MGT: u8 = 0xC7;
    pub const ATSC_TVCT: u8 = 0xC8;
    pub const ATSC_CVCT: u8 = 0xC9;
    pub const ATSC_EIT: u8 = 0xCB;
}

/// Fixed PIDs on which the standard tables are carried.
pub mod pid {
    pub const PAT: u16 = 0x0000;
    pub const CAT: u16 = 0x0001;
    pub const NIT: u16 = 0x0010;
    pub const SDT: u16 = 0x0011;
    pub const EIT: u16 = 0x0012;
    /// ATSC base PID carrying MGT/VCT.
    pub const ATSC_BASE: u16 = 0x1FFB;
    /// Fixed PMT PID of the ISDB-T 1seg partial-reception service.
    pub const ISDBT_1SEG_PMT: u16 = 0x1FC8;
}

/// Parsed section header, common to all tables.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SectionHeader {
    /// Table ID.
    pub table_id: u8,
    /// Section syntax indicator (long header present).
    pub syntax: bool,
    /// Section length (12 bits), counted after the length field.
    pub section_length: u16,
    /// Table ID extension. Zero for short sections.
    pub extension_id: u16,
    /// Version number (5 bits).
    pub version: u8,
    /// Current/next indicator.
    pub current_next: bool,
    /// Section number.
    pub section_number: u8,
    /// Last section number of this logical table.
    pub last_section_number: u8,
}

impl SectionHeader {
    /// Parse a section header from the cursor, advancing past it.
    pub fn parse(cursor: &mut Cursor) -> Result<Self, SiError> {
        let table_id = cursor.read_u8()?;
        let word = cursor.read_u16()?;
        let syntax = word & 0x8000 != 0;
        let section_length = word & 0x0FFF;

        if !syntax {
            return Ok(SectionHeader {
                table_id,
                syntax,
                section_length,
                extension_id: 0,
                version: 0,
                current_next: true,
                section_number: 0,
                last_section_number: 0,
            });
        }

        let extension_id = cursor.read_u16()?;
        let vb = cursor.read_u8()?;
        let section_number = cursor.read_u8()?;
        let last_section_number = cursor.read_u8()?;

        Ok(SectionHeader {
            table_id,
            syntax,
            section_length,
            extension_id,
            version: (vb >> 1) & 0x1F,
            current_next: vb & 0x01 != 0,
            section_number,
            last_section_number,
        })
    }
}
