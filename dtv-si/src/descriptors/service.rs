//! Service, CA, language and naming descriptors.

use crate::cursor::Cursor;
use crate::error::SiError;
use crate::text::{decode_text, DvbString};

/// Hierarchy descriptor (0x04).
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct HierarchyDescriptor {
    pub hierarchy_type: u8,
    pub layer_index: u8,
    pub embedded_layer_index: u8,
    pub channel: u8,
}

impl HierarchyDescriptor {
    pub fn parse(data: &[u8]) -> Result<Self, SiError> {
        let mut c = Cursor::new(data);
        let b0 = c.read_u8()?;
        let layer_index = c.read_u8()? & 0x3F;
        let embedded_layer_index = c.read_u8()? & 0x3F;
        let channel = c.read_u8()? & 0x3F;
        Ok(HierarchyDescriptor {
            hierarchy_type: b0 & 0x0F,
            layer_index,
            embedded_layer_index,
            channel,
        })
    }
}

/// Conditional access descriptor (0x09).
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CaDescriptor {
    /// CA system id.
    pub ca_id: u16,
    /// PID carrying the ECM/EMM stream (13 bits).
    pub ca_pid: u16,
    /// CA-system private bytes.
    pub private_data: Vec<u8>,
}

impl CaDescriptor {
    pub fn parse(data: &[u8]) -> Result<Self, SiError> {
        let mut c = Cursor::new(data);
        let ca_id = c.read_u16()?;
        let ca_pid = c.read_u16()? & 0x1FFF;
        Ok(CaDescriptor {
            ca_id,
            ca_pid,
            private_data: c.rest().to_vec(),
        })
    }
}

/// ISO 639 language descriptor (0x0A).
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Iso639LanguageDescriptor {
    /// Three-letter language code.
    pub language: String,
    pub audio_type: u8,
}

impl Iso639LanguageDescriptor {
    pub fn parse(data: &[u8]) -> Result<Self, SiError> {
        let mut c = Cursor::new(data);
        let lang = c.read_fixed(3)?;
        let audio_type = c.read_u8()?;
        Ok(Iso639LanguageDescriptor {
            language: String::from_utf8_lossy(lang).into_owned(),
            audio_type,
        })
    }
}

/// Network name descriptor (0x40).
#[derive(Debug, Clone, Default, PartialEq)]
pub struct NetworkNameDescriptor {
    pub name: DvbString,
}

impl NetworkNameDescriptor {
    pub fn parse(data: &[u8]) -> Result<Self, SiError> {
        Ok(NetworkNameDescriptor {
            name: decode_text(data),
        })
    }
}

/// Service list descriptor (0x41).
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ServiceListDescriptor {
    /// (service id, service type) pairs in wire order.
    pub services: Vec<(u16, u8)>,
}

impl ServiceListDescriptor {
    pub fn parse(data: &[u8]) -> Result<Self, SiError> {
        let mut c = Cursor::new(data);
        let mut services = Vec::with_capacity(data.len() / 3);
        while c.remaining() >= 3 {
            let service_id = c.read_u16()?;
            let service_type = c.read_u8()?;
            services.push((service_id, service_type));
        }
        Ok(ServiceListDescriptor { services })
    }
}

/// Service descriptor (0x48).
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ServiceDescriptor {
    pub service_type: u8,
    pub provider: DvbString,
    pub name: DvbString,
}

impl ServiceDescriptor {
    pub fn parse(data: &[u8]) -> Result<Self, SiError> {
        let mut c = Cursor::new(data);
        let service_type = c.read_u8()?;
        let provider_len = c.read_u8()? as usize;
        let provider = decode_text(c.read_fixed(provider_len)?);
        let name_len = c.read_u8()? as usize;
        let name = decode_text(c.read_fixed(name_len)?);
        Ok(ServiceDescriptor {
            service_type,
            provider,
            name,
        })
    }

    /// Human-readable service type name.
    pub fn service_type_name(&self) -> &'static str {
        service_type_name(self.service_type)
    }
}

/// Name for a DVB service type code.
pub fn service_type_name(service_type: u8) -> &'static str {
    match service_type {
        0x01 => "Digital TV",
        0x02 => "Digital Radio",
        0x03 => "Teletext",
        0x0C => "Data Service",
        0x11 => "Digital TV MPEG2-HD",
        0x16 => "Digital TV SD (AVC)",
        0x19 => "Digital TV HD (AVC)",
        0x1F => "Digital TV (HEVC)",
        0xC0 => "1seg (ISDB)",
        _ => "Unknown",
    }
}

/// CA identifier descriptor (0x53).
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CaIdentifierDescriptor {
    pub ca_ids: Vec<u16>,
}

impl CaIdentifierDescriptor {
    pub fn parse(data: &[u8]) -> Result<Self, SiError> {
        let mut c = Cursor::new(data);
        let mut ca_ids = Vec::with_capacity(data.len() / 2);
        while c.remaining() >= 2 {
            ca_ids.push(c.read_u16()?);
        }
        Ok(CaIdentifierDescriptor { ca_ids })
    }
}

/// One entry of a logical channel descriptor.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LogicalChannel {
    pub service_id: u16,
    pub visible: bool,
    /// Channel number as presented to the viewer (10 bits).
    pub logical_channel_number: u16,
}

/// Logical channel descriptor (0x83, private but near-universal).
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct LogicalChannelDescriptor {
    pub channels: Vec<LogicalChannel>,
}

impl LogicalChannelDescriptor {
    pub fn parse(data: &[u8]) -> Result<Self, SiError> {
        let mut c = Cursor::new(data);
        let mut channels = Vec::with_capacity(data.len() / 4);
        while c.remaining() >= 4 {
            let service_id = c.read_u16()?;
            let word = c.read_u16()?;
            channels.push(LogicalChannel {
                service_id,
                visible: word & 0x8000 != 0,
                logical_channel_number: word & 0x03FF,
            });
        }
        Ok(LogicalChannelDescriptor { channels })
    }
}

/// TS information descriptor (0xCD, ISDB).
#[derive(Debug, Clone, Default, PartialEq)]
pub struct TsInformationDescriptor {
    pub remote_control_key_id: u8,
    pub name: DvbString,
}

impl TsInformationDescriptor {
    pub fn parse(data: &[u8]) -> Result<Self, SiError> {
        let mut c = Cursor::new(data);
        let remote_control_key_id = c.read_u8()?;
        let name_len = (c.read_u8()? >> 2) as usize;
        let name = decode_text(c.read_fixed(name_len)?);
        Ok(TsInformationDescriptor {
            remote_control_key_id,
            name,
        })
    }
}
