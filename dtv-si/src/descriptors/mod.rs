//! Descriptor parsing for PSI/SI tables.
//!
//! Descriptors are TLV records (1-byte tag, 1-byte length, payload)
//! attached to tables and table entries. Decoding dispatches on the
//! tag over the full 8-bit tag space; tags without a typed decoder
//! become [`Descriptor::Unknown`], carrying the raw payload so nothing
//! is ever silently dropped. The extension descriptor (0x7F) carries a
//! second tag byte dispatched one level deeper, with the same policy.

pub mod atsc;
pub mod delivery;
pub mod event;
pub mod extension;
pub mod service;

use log::warn;

use crate::cursor::Cursor;
use crate::error::SiError;

pub use atsc::AtscServiceLocationDescriptor;
pub use delivery::{
    CableDeliveryDescriptor, FrequencyListDescriptor, IsdbtDeliveryDescriptor,
    PartialReceptionDescriptor, SatelliteDeliveryDescriptor, TerrestrialDeliveryDescriptor,
};
pub use event::{ExtendedEventDescriptor, ShortEventDescriptor};
pub use extension::{ExtensionDescriptor, T2DeliveryDescriptor};
pub use service::{
    CaDescriptor, CaIdentifierDescriptor, HierarchyDescriptor, Iso639LanguageDescriptor,
    LogicalChannelDescriptor, NetworkNameDescriptor, ServiceDescriptor, ServiceListDescriptor,
    TsInformationDescriptor,
};

/// Descriptor tag values with a typed decoder.
pub mod tag {
    pub const HIERARCHY: u8 = 0x04;
    pub const CA: u8 = 0x09;
    pub const ISO639_LANGUAGE: u8 = 0x0A;
    pub const NETWORK_NAME: u8 = 0x40;
    pub const SERVICE_LIST: u8 = 0x41;
    pub const SATELLITE_DELIVERY: u8 = 0x43;
    pub const CABLE_DELIVERY: u8 = 0x44;
    pub const SERVICE: u8 = 0x48;
    pub const SHORT_EVENT: u8 = 0x4D;
    pub const EXTENDED_EVENT: u8 = 0x4E;
    pub const CA_IDENTIFIER: u8 = 0x53;
    pub const TERRESTRIAL_DELIVERY: u8 = 0x5A;
    pub const FREQUENCY_LIST: u8 = 0x62;
    pub const EXTENSION: u8 = 0x7F;
    pub const LOGICAL_CHANNEL: u8 = 0x83;
    pub const ATSC_SERVICE_LOCATION: u8 = 0xA1;
    pub const TS_INFORMATION: u8 = 0xCD;
    pub const ISDBT_DELIVERY: u8 = 0xFA;
    pub const PARTIAL_RECEPTION: u8 = 0xFB;
    /// ISDB stuffing; ends a descriptor loop early.
    pub const STUFFING: u8 = 0xFF;
}

/// One decoded descriptor.
///
/// The variant set covers every tag the scan engine and the table
/// consumers need; all other tags land in `Unknown` with their payload
/// preserved byte for byte.
#[derive(Debug, Clone, PartialEq)]
pub enum Descriptor {
    Hierarchy(HierarchyDescriptor),
    Ca(CaDescriptor),
    Iso639Language(Iso639LanguageDescriptor),
    NetworkName(NetworkNameDescriptor),
    ServiceList(ServiceListDescriptor),
    SatelliteDelivery(SatelliteDeliveryDescriptor),
    CableDelivery(CableDeliveryDescriptor),
    Service(ServiceDescriptor),
    ShortEvent(ShortEventDescriptor),
    ExtendedEvent(ExtendedEventDescriptor),
    CaIdentifier(CaIdentifierDescriptor),
    TerrestrialDelivery(TerrestrialDeliveryDescriptor),
    FrequencyList(FrequencyListDescriptor),
    Extension(ExtensionDescriptor),
    LogicalChannel(LogicalChannelDescriptor),
    AtscServiceLocation(AtscServiceLocationDescriptor),
    TsInformation(TsInformationDescriptor),
    IsdbtDelivery(IsdbtDeliveryDescriptor),
    PartialReception(PartialReceptionDescriptor),
    Unknown { tag: u8, data: Vec<u8> },
}

impl Descriptor {
    /// The wire tag of this descriptor.
    pub fn tag(&self) -> u8 {
        match self {
            Descriptor::Hierarchy(_) => tag::HIERARCHY,
            Descriptor::Ca(_) => tag::CA,
            Descriptor::Iso639Language(_) => tag::ISO639_LANGUAGE,
            Descriptor::NetworkName(_) => tag::NETWORK_NAME,
            Descriptor::ServiceList(_) => tag::SERVICE_LIST,
            Descriptor::SatelliteDelivery(_) => tag::SATELLITE_DELIVERY,
            Descriptor::CableDelivery(_) => tag::CABLE_DELIVERY,
            Descriptor::Service(_) => tag::SERVICE,
            Descriptor::ShortEvent(_) => tag::SHORT_EVENT,
            Descriptor::ExtendedEvent(_) => tag::EXTENDED_EVENT,
            Descriptor::CaIdentifier(_) => tag::CA_IDENTIFIER,
            Descriptor::TerrestrialDelivery(_) => tag::TERRESTRIAL_DELIVERY,
            Descriptor::FrequencyList(_) => tag::FREQUENCY_LIST,
            Descriptor::Extension(_) => tag::EXTENSION,
            Descriptor::LogicalChannel(_) => tag::LOGICAL_CHANNEL,
            Descriptor::AtscServiceLocation(_) => tag::ATSC_SERVICE_LOCATION,
            Descriptor::TsInformation(_) => tag::TS_INFORMATION,
            Descriptor::IsdbtDelivery(_) => tag::ISDBT_DELIVERY,
            Descriptor::PartialReception(_) => tag::PARTIAL_RECEPTION,
            Descriptor::Unknown { tag, .. } => *tag,
        }
    }

    /// Decode one descriptor from the start of `buf`.
    ///
    /// Returns the decoded descriptor and the bytes consumed
    /// (`2 + length`). A declared length overrunning `buf` is a
    /// [`SiError::Truncated`] error; a payload that fails its typed
    /// decoder degrades to `Unknown` with a warning, since real
    /// broadcasts carry occasional malformed descriptors and one bad
    /// descriptor must not reject the whole table.
    pub fn decode_one(buf: &[u8]) -> Result<(usize, Descriptor), SiError> {
        let mut cursor = Cursor::new(buf);
        let tag = cursor.read_u8()?;
        let length = cursor.read_u8()? as usize;
        let remaining = cursor.remaining();
        if length > remaining {
            return Err(SiError::Truncated {
                declared: length,
                remaining,
            });
        }
        let payload = cursor.read_fixed(length)?;
        Ok((2 + length, Self::dispatch(tag, payload)))
    }

    fn dispatch(tag_value: u8, payload: &[u8]) -> Descriptor {
        let result = match tag_value {
            tag::HIERARCHY => HierarchyDescriptor::parse(payload).map(Descriptor::Hierarchy),
            tag::CA => CaDescriptor::parse(payload).map(Descriptor::Ca),
            tag::ISO639_LANGUAGE => {
                Iso639LanguageDescriptor::parse(payload).map(Descriptor::Iso639Language)
            }
            tag::NETWORK_NAME => {
                NetworkNameDescriptor::parse(payload).map(Descriptor::NetworkName)
            }
            tag::SERVICE_LIST => {
                ServiceListDescriptor::parse(payload).map(Descriptor::ServiceList)
            }
            tag::SATELLITE_DELIVERY => {
                SatelliteDeliveryDescriptor::parse(payload).map(Descriptor::SatelliteDelivery)
            }
            tag::CABLE_DELIVERY => {
                CableDeliveryDescriptor::parse(payload).map(Descriptor::CableDelivery)
            }
            tag::SERVICE => ServiceDescriptor::parse(payload).map(Descriptor::Service),
            tag::SHORT_EVENT => ShortEventDescriptor::parse(payload).map(Descriptor::ShortEvent),
            tag::EXTENDED_EVENT => {
                ExtendedEventDescriptor::parse(payload).map(Descriptor::ExtendedEvent)
            }
            tag::CA_IDENTIFIER => {
                CaIdentifierDescriptor::parse(payload).map(Descriptor::CaIdentifier)
            }
            tag::TERRESTRIAL_DELIVERY => {
                TerrestrialDeliveryDescriptor::parse(payload).map(Descriptor::TerrestrialDelivery)
            }
            tag::FREQUENCY_LIST => {
                FrequencyListDescriptor::parse(payload).map(Descriptor::FrequencyList)
            }
            tag::EXTENSION => ExtensionDescriptor::parse(payload).map(Descriptor::Extension),
            tag::LOGICAL_CHANNEL => {
                LogicalChannelDescriptor::parse(payload).map(Descriptor::LogicalChannel)
            }
            tag::ATSC_SERVICE_LOCATION => {
                AtscServiceLocationDescriptor::parse(payload).map(Descriptor::AtscServiceLocation)
            }
            tag::TS_INFORMATION => {
                TsInformationDescriptor::parse(payload).map(Descriptor::TsInformation)
            }
            tag::ISDBT_DELIVERY => {
                IsdbtDeliveryDescriptor::parse(payload).map(Descriptor::IsdbtDelivery)
            }
            tag::PARTIAL_RECEPTION => {
                PartialReceptionDescriptor::parse(payload).map(Descriptor::PartialReception)
            }
            _ => {
                return Descriptor::Unknown {
                    tag: tag_value,
                    data: payload.to_vec(),
                }
            }
        };

        match result {
            Ok(desc) => desc,
            Err(e) => {
                warn!(
                    "descriptor 0x{:02x}: {}, keeping raw payload",
                    tag_value, e
                );
                Descriptor::Unknown {
                    tag: tag_value,
                    data: payload.to_vec(),
                }
            }
        }
    }
}

/// Decode a whole descriptor loop.
///
/// Descriptors decoded before an error are always returned; the error,
/// if any, rides alongside (partial-result policy). A stuffing tag
/// (0xFF) ends the loop early with a warning.
pub fn parse_descriptors(data: &[u8]) -> (Vec<Descriptor>, Option<SiError>) {
    let mut descriptors = Vec::new();
    let mut offset = 0;

    while offset < data.len() {
        if data[offset] == tag::STUFFING {
            warn!("descriptor loop: stuffing tag at offset {}, stopping", offset);
            break;
        }
        match Descriptor::decode_one(&data[offset..]) {
            Ok((consumed, desc)) => {
                descriptors.push(desc);
                offset += consumed;
            }
            Err(e) => {
                warn!("descriptor loop: {}", e);
                return (descriptors, Some(e));
            }
        }
    }

    (descriptors, None)
}

/// Find the first descriptor with the given tag.
pub fn find_descriptor(descriptors: &[Descriptor], tag: u8) -> Option<&Descriptor> {
    descriptors.iter().find(|d| d.tag() == tag)
}
