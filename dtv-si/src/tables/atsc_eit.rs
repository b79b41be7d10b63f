//! ATSC Event Information Table.

use chrono::NaiveDateTime;

use crate::descriptors::{parse_descriptors, Descriptor};
use crate::error::SiError;
use crate::section::{table_id, SectionHeader};
use crate::tables::{open_section, SiTable};
use crate::time::atsc_time;

/// One event entry of an ATSC EIT.
#[derive(Debug, Clone, PartialEq)]
pub struct AtscEitEvent {
    /// Event id (14 bits).
    pub event_id: u16,
    /// Event start in UTC, converted from GPS seconds.
    pub start: NaiveDateTime,
    pub etm_location: u8,
    /// Duration in seconds (20 bits).
    pub duration: u32,
    /// Title in the raw multiple-string-structure encoding.
    pub title: Vec<u8>,
    pub descriptors: Vec<Descriptor>,
}

/// ATSC Event Information Table for one source.
///
/// The source id is the section header's extension id; the MGT says
/// which PID carries which EIT instance.
#[derive(Debug, Clone, PartialEq)]
pub struct AtscEit {
    pub header: SectionHeader,
    pub protocol_version: u8,
    pub events: Vec<AtscEitEvent>,
    /// Set when a descriptor loop was cut short; decoded entries kept.
    pub truncated: Option<SiError>,
}

impl AtscEit {
    /// The VCT source id these events belong to.
    pub fn source_id(&self) -> u16 {
        self.header.extension_id
    }
}

impl SiTable for AtscEit {
    const NAME: &'static str = "atsc_eit";

    fn matches(tid: u8) -> bool {
        tid == table_id::ATSC_EIT
    }

    fn decode(buf: &[u8], existing: Option<Self>) -> Result<(usize, Self), SiError> {
        let (header, mut payload, consumed) = open_section(buf, Self::NAME, Self::matches)?;

        let protocol_version = payload.read_u8()?;
        let num_events = payload.read_u8()? as usize;

        let mut table = existing.unwrap_or(AtscEit {
            header,
            protocol_version,
            events: Vec::new(),
            truncated: None,
        });

        for _ in 0..num_events {
            if payload.is_empty() {
                break;
            }
            let event_id = payload.read_u16()? & 0x3FFF;
            let start = atsc_time(payload.read_u32()?);
            let word = payload.read_u32()?;
            // title_length counts one byte beyond the title text.
            let title_length = (word & 0xFF) as usize;
            let title = payload.read_fixed(title_length.saturating_sub(1))?.to_vec();
            let desc_len = (payload.read_u16()? & 0x0FFF) as usize;
            let desc = payload.take_declared(desc_len)?;
            let (descriptors, desc_err) = parse_descriptors(desc.rest());
            if table.truncated.is_none() {
                table.truncated = desc_err;
            }
            table.events.push(AtscEitEvent {
                event_id,
                start,
                etm_location: ((word >> 28) & 0x03) as u8,
                duration: (word >> 8) & 0x000F_FFFF,
                title,
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
    use crate::tables::testutil::long_section;

    #[test]
    fn test_decode_atsc_eit() {
        let title = b"\x01\x00\x00"; // empty multiple-string structure
        let mut payload = vec![0x00, 0x01]; // protocol version, one event
        payload.extend_from_slice(&0xC123u16.to_be_bytes()); // event id (top bits masked)
        payload.extend_from_slice(&86401u32.to_be_bytes()); // 1980-01-07 00:00:01
        // etm 1, duration 1800s, title length (one past the text)
        let word = (1u32 << 28) | (1800 << 8) | (title.len() as u32 + 1);
        payload.extend_from_slice(&word.to_be_bytes());
        payload.extend_from_slice(title);
        payload.extend_from_slice(&0xF000u16.to_be_bytes()); // no descriptors
        let image = long_section(table_id::ATSC_EIT, 0x0007, 0, 0, 0, &payload);

        let (consumed, eit) = AtscEit::decode(&image, None).unwrap();
        assert_eq!(consumed, image.len());
        assert_eq!(eit.source_id(), 7);
        assert!(eit.truncated.is_none());
        assert_eq!(eit.events.len(), 1);

        let event = &eit.events[0];
        assert_eq!(event.event_id, 0x0123);
        assert_eq!(event.start.to_string(), "1980-01-07 00:00:01");
        assert_eq!(event.etm_location, 1);
        assert_eq!(event.duration, 1800);
        assert_eq!(event.title, title.to_vec());
    }

    #[test]
    fn test_title_followed_by_descriptors() {
        let title = b"\x01eng\x01\x00\x05Title";
        let mut payload = vec![0x00, 0x01];
        payload.extend_from_slice(&0x0001u16.to_be_bytes());
        payload.extend_from_slice(&0u32.to_be_bytes());
        let word = (1800u32 << 8) | (title.len() as u32 + 1);
        payload.extend_from_slice(&word.to_be_bytes());
        payload.extend_from_slice(title);
        payload.extend_from_slice(&0xF004u16.to_be_bytes());
        payload.extend_from_slice(&[0x99, 0x02, 0xAA, 0xBB]); // one unknown descriptor

        let image = long_section(table_id::ATSC_EIT, 1, 0, 0, 0, &payload);
        let (_, eit) = AtscEit::decode(&image, None).unwrap();
        assert_eq!(eit.events.len(), 1);
        assert_eq!(eit.events[0].title, title.to_vec());
        assert_eq!(eit.events[0].descriptors.len(), 1);
    }

    #[test]
    fn test_short_event_entry() {
        let payload = vec![0x00, 0x01, 0xC1]; // truncated mid event id
        let image = long_section(table_id::ATSC_EIT, 1, 0, 0, 0, &payload);
        assert!(matches!(
            AtscEit::decode(&image, None),
            Err(SiError::ShortRead { .. })
        ));
    }
}
