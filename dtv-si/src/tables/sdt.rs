//! Service Description Table (SDT).

use crate::descriptors::{find_descriptor, parse_descriptors, tag, Descriptor};
use crate::error::SiError;
use crate::section::{table_id, SectionHeader};
use crate::tables::{open_section, SiTable};

/// One service entry of the SDT.
#[derive(Debug, Clone, PartialEq)]
pub struct SdtService {
    pub service_id: u16,
    pub eit_schedule: bool,
    pub eit_present_following: bool,
    /// Running status (3 bits; 4 = running).
    pub running_status: u8,
    pub free_ca: bool,
    pub descriptors: Vec<Descriptor>,
}

impl SdtService {
    /// The service name from the service descriptor, if one is present.
    pub fn name(&self) -> Option<&str> {
        match find_descriptor(&self.descriptors, tag::SERVICE) {
            Some(Descriptor::Service(s)) => Some(&s.name.text),
            _ => None,
        }
    }
}

/// Name for a running status code (shared with EIT events).
pub fn running_status_name(status: u8) -> &'static str {
    match status {
        0 => "undefined",
        1 => "not running",
        2 => "starts soon",
        3 => "pausing",
        4 => "running",
        5 => "off-air",
        _ => "reserved",
    }
}

/// Service Description Table, naming the services of a transport stream.
///
/// The transport stream id is the section header's extension id.
#[derive(Debug, Clone, PartialEq)]
pub struct Sdt {
    pub header: SectionHeader,
    pub original_network_id: u16,
    pub services: Vec<SdtService>,
    /// Set when a descriptor loop was cut short; decoded entries kept.
    pub truncated: Option<SiError>,
}

impl Sdt {
    /// The transport stream id this table describes.
    pub fn transport_stream_id(&self) -> u16 {
        self.header.extension_id
    }
}

impl SiTable for Sdt {
    const NAME: &'static str = "sdt";

    fn matches(tid: u8) -> bool {
        tid == table_id::SDT || tid == table_id::SDT_OTHER
    }

    fn decode(buf: &[u8], existing: Option<Self>) -> Result<(usize, Self), SiError> {
        let (header, mut payload, consumed) = open_section(buf, Self::NAME, Self::matches)?;

        let original_network_id = payload.read_u16()?;
        payload.skip(1)?; // reserved

        let mut table = existing.unwrap_or(Sdt {
            header,
            original_network_id,
            services: Vec::new(),
            truncated: None,
        });

        while payload.remaining() >= 5 {
            let service_id = payload.read_u16()?;
            let flags = payload.read_u8()?;
            let word = payload.read_u16()?;
            let desc_len = (word & 0x0FFF) as usize;
            let desc = payload.take_declared(desc_len)?;
            let (descriptors, desc_err) = parse_descriptors(desc.rest());
            if table.truncated.is_none() {
                table.truncated = desc_err;
            }
            table.services.push(SdtService {
                service_id,
                eit_schedule: flags & 0x02 != 0,
                eit_present_following: flags & 0x01 != 0,
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

#[cfg(test)]
mod tests {
    use super::*;
    use crate::tables::testutil::long_section;

    fn service_entry(service_id: u16, name: &str) -> Vec<u8> {
        let mut service_desc = vec![tag::SERVICE, (3 + name.len()) as u8, 0x01, 0x00];
        service_desc.push(name.len() as u8);
        service_desc.extend_from_slice(name.as_bytes());

        let mut entry = Vec::new();
        entry.extend_from_slice(&service_id.to_be_bytes());
        entry.push(0xFB); // EIT schedule + present/following
        // running (4) + free_ca clear + length
        entry.extend_from_slice(&(0x8000 | service_desc.len() as u16).to_be_bytes());
        entry.extend_from_slice(&service_desc);
        entry
    }

    #[test]
    fn test_decode_sdt() {
        let mut payload = vec![0x20, 0x01, 0xFF]; // original network id + reserved
        payload.extend_from_slice(&service_entry(0x65, "First"));
        payload.extend_from_slice(&service_entry(0x66, "Second"));
        let image = long_section(table_id::SDT, 0x0101, 3, 0, 0, &payload);

        let (consumed, sdt) = Sdt::decode(&image, None).unwrap();
        assert_eq!(consumed, image.len());
        assert_eq!(sdt.transport_stream_id(), 0x0101);
        assert_eq!(sdt.original_network_id, 0x2001);
        assert!(sdt.truncated.is_none());
        assert_eq!(sdt.services.len(), 2);

        let svc = &sdt.services[0];
        assert_eq!(svc.service_id, 0x65);
        assert!(svc.eit_schedule);
        assert!(svc.eit_present_following);
        assert_eq!(svc.running_status, 4);
        assert_eq!(running_status_name(svc.running_status), "running");
        assert!(!svc.free_ca);
        assert_eq!(svc.name(), Some("First"));
        assert_eq!(sdt.services[1].name(), Some("Second"));
    }

    #[test]
    fn test_decode_accepts_other_ts() {
        let payload = vec![0x20, 0x01, 0xFF];
        let image = long_section(table_id::SDT_OTHER, 0x0202, 0, 0, 0, &payload);
        let (_, sdt) = Sdt::decode(&image, None).unwrap();
        assert_eq!(sdt.transport_stream_id(), 0x0202);
        assert!(sdt.services.is_empty());
    }
}
