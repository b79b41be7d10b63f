//! DVB Event Information Table (EIT).

use chrono::NaiveDateTime;

use crate::descriptors::{find_descriptor, parse_descriptors, tag, Descriptor};
use crate::error::SiError;
use crate::section::{table_id, SectionHeader};
use crate::tables::{open_section, SiTable};
use crate::time::{bcd_duration, dvb_time};

/// One event entry of the EIT.
#[derive(Debug, Clone, PartialEq)]
pub struct EitEvent {
    pub event_id: u16,
    /// Event start in UTC; `None` for the undefined time (all 0xFF),
    /// used by NVOD reference events.
    pub start: Option<NaiveDateTime>,
    /// Duration in seconds.
    pub duration: u32,
    /// Running status (3 bits; 4 = running).
    pub running_status: u8,
    pub free_ca: bool,
    pub descriptors: Vec<Descriptor>,
}

impl EitEvent {
    /// The event name from the short event descriptor, if present.
    pub fn name(&self) -> Option<&str> {
        match find_descriptor(&self.descriptors, tag::SHORT_EVENT) {
            Some(Descriptor::ShortEvent(e)) => Some(&e.name.text),
            _ => None,
        }
    }
}

/// Event Information Table for one service.
///
/// The service id is the section header's extension id. Table ids
/// 0x4E/0x4F carry present/following, 0x50-0x6F the schedule.
#[derive(Debug, Clone, PartialEq)]
pub struct Eit {
    pub header: SectionHeader,
    pub transport_stream_id: u16,
    pub original_network_id: u16,
    pub segment_last_section_number: u8,
    pub last_table_id: u8,
    pub events: Vec<EitEvent>,
    /// Set when a descriptor loop was cut short; decoded entries kept.
    pub truncated: Option<SiError>,
}

impl Eit {
    /// The service id these events belong to.
    pub fn service_id(&self) -> u16 {
        self.header.extension_id
    }
}

impl SiTable for Eit {
    const NAME: &'static str = "eit";

    fn matches(tid: u8) -> bool {
        tid == table_id::EIT_PF
            || tid == table_id::EIT_PF_OTHER
            || (table_id::EIT_SCHEDULE..table_id::EIT_SCHEDULE_OTHER + 0x10).contains(&tid)
    }

    fn decode(buf: &[u8], existing: Option<Self>) -> Result<(usize, Self), SiError> {
        let (header, mut payload, consumed) = open_section(buf, Self::NAME, Self::matches)?;

        let transport_stream_id = payload.read_u16()?;
        let original_network_id = payload.read_u16()?;
        let segment_last_section_number = payload.read_u8()?;
        let last_table_id = payload.read_u8()?;

        let mut table = existing.unwrap_or(Eit {
            header,
            transport_stream_id,
            original_network_id,
            segment_last_section_number,
            last_table_id,
            events: Vec::new(),
            truncated: None,
        });

        while payload.remaining() >= 12 {
            let event_id = payload.read_u16()?;
            let s = payload.read_fixed(5)?;
            let start_raw = [s[0], s[1], s[2], s[3], s[4]];
            let d = payload.read_fixed(3)?;
            let duration_raw = [d[0], d[1], d[2]];
            let word = payload.read_u16()?;
            let desc_len = (word & 0x0FFF) as usize;
            let desc = payload.take_declared(desc_len)?;
            let (descriptors, desc_err) = parse_descriptors(desc.rest());
            if table.truncated.is_none() {
                table.truncated = desc_err;
            }
            table.events.push(EitEvent {
                event_id,
                start: dvb_time(start_raw),
                duration: bcd_duration(duration_raw),
                running_status: ((word >> 13) & 0x07) as u8,
                free_ca: word & 0x1000 != 0,
                descriptors,
            });
        }

        Ok((consumed, table))
    }

    fn header(&self) -> &SectionHeader {
        &self.header
    }
}
