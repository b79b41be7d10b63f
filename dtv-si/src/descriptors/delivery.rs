//! Delivery system descriptors.
//!
//! These carry the tuning parameters of a transponder inside NIT
//! transport entries; the scan engine walks them to discover new
//! transponders. BCD-coded frequencies and symbol rates are converted
//! to plain integers at decode time.

use crate::cursor::Cursor;
use crate::error::SiError;
use crate::time::bcd32;

/// Satellite delivery system descriptor (0x43).
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SatelliteDeliveryDescriptor {
    /// Frequency in kHz.
    pub frequency: u32,
    /// Orbital position in tenths of a degree.
    pub orbital_position: u16,
    /// False = west, true = east.
    pub west_east: bool,
    /// Polarization code (0 H, 1 V, 2 L, 3 R).
    pub polarization: u8,
    /// Roll-off code (S2 only).
    pub roll_off: u8,
    /// 0 = DVB-S, 1 = DVB-S2.
    pub modulation_system: u8,
    pub modulation_type: u8,
    /// Symbol rate in symbols/s.
    pub symbol_rate: u32,
    pub fec_inner: u8,
}

impl SatelliteDeliveryDescriptor {
    pub fn parse(data: &[u8]) -> Result<Self, SiError> {
        let mut c = Cursor::new(data);
        let frequency = bcd32(c.read_u32()?) * 10;
        let orbital_position = bcd32(c.read_u16()? as u32) as u16;
        let b = c.read_u8()?;
        let word = c.read_u32()?;
        Ok(SatelliteDeliveryDescriptor {
            frequency,
            orbital_position,
            west_east: b & 0x80 != 0,
            polarization: (b >> 5) & 0x03,
            roll_off: (b >> 3) & 0x03,
            modulation_system: (b >> 2) & 0x01,
            modulation_type: b & 0x03,
            symbol_rate: bcd32(word >> 4) * 100,
            fec_inner: (word & 0x0F) as u8,
        })
    }
}

/// Cable delivery system descriptor (0x44).
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CableDeliveryDescriptor {
    /// Frequency in Hz.
    pub frequency: u32,
    pub fec_outer: u8,
    pub modulation: u8,
    /// Symbol rate in symbols/s.
    pub symbol_rate: u32,
    pub fec_inner: u8,
}

impl CableDeliveryDescriptor {
    pub fn parse(data: &[u8]) -> Result<Self, SiError> {
        let mut c = Cursor::new(data);
        let frequency = bcd32(c.read_u32()?) * 100;
        let fec_outer = (c.read_u16()? & 0x000F) as u8;
        let modulation = c.read_u8()?;
        let word = c.read_u32()?;
        Ok(CableDeliveryDescriptor {
            frequency,
            fec_outer,
            modulation,
            symbol_rate: bcd32(word >> 4) * 100,
            fec_inner: (word & 0x0F) as u8,
        })
    }
}

/// Terrestrial delivery system descriptor (0x5A, DVB-T).
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TerrestrialDeliveryDescriptor {
    /// Centre frequency in Hz (wire value is in 10 Hz units).
    pub centre_frequency: u64,
    pub bandwidth: u8,
    pub priority: bool,
    pub time_slicing: bool,
    pub mpe_fec: bool,
    pub constellation: u8,
    pub hierarchy: u8,
    pub code_rate_hp: u8,
    pub code_rate_lp: u8,
    pub guard_interval: u8,
    pub transmission_mode: u8,
    pub other_frequency: bool,
}

impl TerrestrialDeliveryDescriptor {
    pub fn parse(data: &[u8]) -> Result<Self, SiError> {
        let mut c = Cursor::new(data);
        let centre_frequency = c.read_u32()? as u64 * 10;
        let b0 = c.read_u8()?;
        let b1 = c.read_u8()?;
        let b2 = c.read_u8()?;
        // 4 trailing reserved bytes are ignored if present.
        Ok(TerrestrialDeliveryDescriptor {
            centre_frequency,
            bandwidth: b0 >> 5,
            priority: b0 & 0x10 != 0,
            time_slicing: b0 & 0x08 != 0,
            mpe_fec: b0 & 0x04 != 0,
            constellation: b1 >> 6,
            hierarchy: (b1 >> 3) & 0x07,
            code_rate_hp: b1 & 0x07,
            code_rate_lp: b2 >> 5,
            guard_interval: (b2 >> 3) & 0x03,
            transmission_mode: (b2 >> 1) & 0x03,
            other_frequency: b2 & 0x01 != 0,
        })
    }
}

/// ISDB-T terrestrial delivery system descriptor (0xFA).
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct IsdbtDeliveryDescriptor {
    pub area_code: u16,
    pub guard_interval: u8,
    pub transmission_mode: u8,
    /// Frequencies in Hz (wire value is in 1/7 MHz units).
    pub frequencies: Vec<u32>,
}

impl IsdbtDeliveryDescriptor {
    pub fn parse(data: &[u8]) -> Result<Self, SiError> {
        let mut c = Cursor::new(data);
        let word = c.read_u16()?;
        let mut frequencies = Vec::with_capacity(c.remaining() / 2);
        while c.remaining() >= 2 {
            let raw = c.read_u16()? as u64;
            frequencies.push((raw * 1_000_000 / 7) as u32);
        }
        Ok(IsdbtDeliveryDescriptor {
            area_code: word >> 4,
            guard_interval: ((word >> 2) & 0x03) as u8,
            transmission_mode: (word & 0x03) as u8,
            frequencies,
        })
    }
}

/// ISDB-T partial reception descriptor (0xFB).
///
/// Lists the service ids receivable in the 1seg partial-reception
/// segment of the multiplex.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PartialReceptionDescriptor {
    pub service_ids: Vec<u16>,
}

impl PartialReceptionDescriptor {
    pub fn parse(data: &[u8]) -> Result<Self, SiError> {
        let mut c = Cursor::new(data);
        let mut service_ids = Vec::with_capacity(data.len() / 2);
        while c.remaining() >= 2 {
            service_ids.push(c.read_u16()?);
        }
        Ok(PartialReceptionDescriptor { service_ids })
    }
}

/// Frequency list descriptor (0x62).
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FrequencyListDescriptor {
    /// Coding type: 1 satellite, 2 cable, 3 terrestrial.
    pub coding_type: u8,
    /// Frequencies normalized the same way as the matching delivery
    /// descriptor (kHz for satellite, Hz otherwise).
    pub frequencies: Vec<u64>,
}

impl FrequencyListDescriptor {
    pub fn parse(data: &[u8]) -> Result<Self, SiError> {
        let mut c = Cursor::new(data);
        let coding_type = c.read_u8()? & 0x03;
        let mut frequencies = Vec::with_capacity(c.remaining() / 4);
        while c.remaining() >= 4 {
            let raw = c.read_u32()?;
            let freq = match coding_type {
                1 => bcd32(raw) as u64 * 10,
                2 => bcd32(raw) as u64 * 100,
                3 => raw as u64 * 10,
                _ => raw as u64,
            };
            frequencies.push(freq);
        }
        Ok(FrequencyListDescriptor {
            coding_type,
            frequencies,
        })
    }
}

/// Channel bandwidth in Hz for a DVB-T/T2 bandwidth code.
///
/// `None` for reserved codes; callers usually fall back to 8 MHz.
pub fn bandwidth_hz(code: u8) -> Option<u32> {
    match code {
        0 => Some(8_000_000),
        1 => Some(7_000_000),
        2 => Some(6_000_000),
        3 => Some(5_000_000),
        4 => Some(10_000_000),
        5 => Some(1_712_000),
        _ => None,
    }
}

/// Name for an inner FEC code (satellite/cable delivery descriptors).
pub fn fec_inner_name(code: u8) -> &'static str {
    match code {
        0x0 => "undefined",
        0x1 => "1/2",
        0x2 => "2/3",
        0x3 => "3/4",
        0x4 => "5/6",
        0x5 => "7/8",
        0x6 => "8/9",
        0x7 => "3/5",
        0x8 => "4/5",
        0x9 => "9/10",
        0xF => "none",
        _ => "reserved",
    }
}

/// Name for a terrestrial constellation code.
pub fn constellation_name(code: u8) -> &'static str {
    match code {
        0 => "QPSK",
        1 => "16-QAM",
        2 => "64-QAM",
        _ => "reserved",
    }
}

/// Guard interval as a fraction string, for terrestrial codes.
pub fn guard_interval_name(code: u8) -> &'static str {
    match code {
        0 => "1/32",
        1 => "1/16",
        2 => "1/8",
        _ => "1/4",
    }
}

/// Name for a terrestrial transmission mode code.
pub fn transmission_mode_name(code: u8) -> &'static str {
    match code {
        0 => "2k",
        1 => "8k",
        2 => "4k",
        _ => "reserved",
    }
}

/// Name for a cable modulation code.
pub fn cable_modulation_name(code: u8) -> &'static str {
    match code {
        0x01 => "16-QAM",
        0x02 => "32-QAM",
        0x03 => "64-QAM",
        0x04 => "128-QAM",
        0x05 => "256-QAM",
        _ => "undefined",
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_satellite_delivery() {
        // 11.738 GHz, 19.2E, H, DVB-S QPSK, 27500 ksym/s FEC 3/4
        let data = [
            0x01, 0x17, 0x38, 0x00, // frequency BCD 01173800 -> 11738000 kHz
            0x01, 0x92, // orbit 19.2
            0xA1, // east, polarization V(1), modulation type 1
            0x02, 0x75, 0x00, 0x03, // symbol rate BCD 0275000, fec 3
        ];
        let desc = SatelliteDeliveryDescriptor::parse(&data).unwrap();
        assert_eq!(desc.frequency, 11_738_000);
        assert_eq!(desc.orbital_position, 192);
        assert!(desc.west_east);
        assert_eq!(desc.polarization, 1);
        assert_eq!(desc.symbol_rate, 27_500_000);
        assert_eq!(desc.fec_inner, 3);
    }

    #[test]
    fn test_parse_cable_delivery() {
        let data = [
            0x03, 0x46, 0x00, 0x00, // frequency BCD 03460000 -> 346 MHz
            0xFF, 0xF0, // fec_outer 0
            0x03, // 64QAM
            0x00, 0x69, 0x00, 0x00, // symbol rate BCD 0069000 -> 6.9 Msym/s
        ];
        let desc = CableDeliveryDescriptor::parse(&data).unwrap();
        assert_eq!(desc.frequency, 346_000_000);
        assert_eq!(desc.fec_outer, 0);
        assert_eq!(desc.modulation, 3);
        assert_eq!(desc.symbol_rate, 6_900_000);
        assert_eq!(desc.fec_inner, 0);
    }

    #[test]
    fn test_parse_terrestrial_delivery() {
        // 474 MHz = 47400000 * 10 Hz
        let freq: u32 = 47_400_000;
        let mut data = freq.to_be_bytes().to_vec();
        data.push(0b0011_0100); // bandwidth 1 (7 MHz), priority set
        data.push(0b0100_1010); // constellation 1, hierarchy 1, hp rate 2
        data.push(0b0101_1010); // lp rate 2, guard 3, mode 1, no other freq
        data.extend_from_slice(&[0xFF; 4]);

        let desc = TerrestrialDeliveryDescriptor::parse(&data).unwrap();
        assert_eq!(desc.centre_frequency, 474_000_000);
        assert_eq!(desc.bandwidth, 1);
        assert!(desc.priority);
        assert_eq!(desc.constellation, 1);
        assert_eq!(desc.hierarchy, 1);
        assert_eq!(desc.code_rate_hp, 2);
        assert_eq!(desc.code_rate_lp, 2);
        assert_eq!(desc.guard_interval, 3);
        assert_eq!(desc.transmission_mode, 1);
        assert!(!desc.other_frequency);
    }

    #[test]
    fn test_parse_isdbt_delivery() {
        // One frequency: channel value 3213 -> 3213 * 1e6 / 7 Hz
        let data = [0x01, 0x2E, 0x0C, 0x8D];
        let desc = IsdbtDeliveryDescriptor::parse(&data).unwrap();
        assert_eq!(desc.area_code, 0x012);
        assert_eq!(desc.guard_interval, 3);
        assert_eq!(desc.transmission_mode, 2);
        assert_eq!(desc.frequencies, vec![0x0C8D as u32 * 1_000_000 / 7]);
    }

    #[test]
    fn test_parse_frequency_list_terrestrial() {
        let mut data = vec![0x03];
        data.extend_from_slice(&47_400_000u32.to_be_bytes());
        data.extend_from_slice(&48_200_000u32.to_be_bytes());
        let desc = FrequencyListDescriptor::parse(&data).unwrap();
        assert_eq!(desc.coding_type, 3);
        assert_eq!(desc.frequencies, vec![474_000_000, 482_000_000]);
    }

    #[test]
    fn test_parameter_lookups() {
        assert_eq!(bandwidth_hz(1), Some(7_000_000));
        assert_eq!(bandwidth_hz(5), Some(1_712_000));
        assert_eq!(bandwidth_hz(7), None);
        assert_eq!(fec_inner_name(0x3), "3/4");
        assert_eq!(fec_inner_name(0xF), "none");
        assert_eq!(constellation_name(2), "64-QAM");
        assert_eq!(guard_interval_name(0), "1/32");
        assert_eq!(transmission_mode_name(1), "8k");
        assert_eq!(cable_modulation_name(0x05), "256-QAM");
    }

    #[test]
    fn test_short_satellite_delivery() {
        assert!(matches!(
            SatelliteDeliveryDescriptor::parse(&[0x01, 0x17]),
            Err(SiError::ShortRead { .. })
        ));
    }
}
