//! Transponder bookkeeping and duplicate detection.
//!
//! Frequencies announced in the NIT rarely match the tuned frequency
//! exactly, so the duplicate check works within an estimated shift
//! derived from the channel bandwidth (or the symbol rate, for systems
//! that have no bandwidth parameter).

use serde::{Deserialize, Serialize};

/// Delivery system of a transponder.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum DeliverySystem {
    DvbT,
    DvbT2,
    DvbC,
    DvbS,
    DvbS2,
    Atsc,
    IsdbT,
    IsdbS,
}

impl DeliverySystem {
    /// Whether the system carries DVB SI tables (as opposed to ATSC).
    pub fn is_dvb_si(&self) -> bool {
        !matches!(self, DeliverySystem::Atsc)
    }
}

/// Satellite signal polarization.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum Polarization {
    Horizontal,
    Vertical,
    CircularLeft,
    CircularRight,
}

impl Polarization {
    /// From the 2-bit code of the satellite delivery descriptor.
    pub fn from_code(code: u8) -> Self {
        match code & 0x03 {
            0 => Polarization::Horizontal,
            1 => Polarization::Vertical,
            2 => Polarization::CircularLeft,
            _ => Polarization::CircularRight,
        }
    }
}

/// One transponder: what to tune and what was announced about it.
///
/// Frequency is in kHz for the satellite systems and in Hz for
/// everything else, matching the units of the delivery descriptors.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TransponderEntry {
    pub delivery: DeliverySystem,
    pub frequency: u64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub polarization: Option<Polarization>,
    /// Symbols per second, for cable and satellite.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub symbol_rate: Option<u32>,
    /// Channel bandwidth in Hz, for terrestrial systems.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub bandwidth: Option<u32>,
    /// Substream selector: T2 PLP id, or the ISDB-S transport id.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub stream_id: Option<u16>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub modulation: Option<u8>,
    /// Satellite roll-off code, used for the frequency shift estimate.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub roll_off: Option<u8>,
}

impl TransponderEntry {
    pub fn new(delivery: DeliverySystem, frequency: u64) -> Self {
        TransponderEntry {
            delivery,
            frequency,
            polarization: None,
            symbol_rate: None,
            bandwidth: None,
            stream_id: None,
            modulation: None,
            roll_off: None,
        }
    }

    /// Estimate how far an announced frequency may drift from this
    /// entry while still meaning the same transponder.
    ///
    /// The estimate is an eighth of the occupied bandwidth. Satellite
    /// values come out in kHz to match the frequency unit.
    pub fn estimate_freq_shift(&self) -> u64 {
        let bandwidth = match self.delivery {
            DeliverySystem::DvbT
            | DeliverySystem::DvbT2
            | DeliverySystem::Atsc
            | DeliverySystem::IsdbT => self.bandwidth.unwrap_or(8_000_000) as u64,
            DeliverySystem::DvbC => self.symbol_rate.unwrap_or(0) as u64 * 115 / 100,
            DeliverySystem::DvbS | DeliverySystem::IsdbS => {
                self.symbol_rate.unwrap_or(0) as u64 * 135 / 100_000
            }
            DeliverySystem::DvbS2 => {
                let rolloff = match self.roll_off {
                    Some(2) => 120,
                    Some(1) => 125,
                    _ => 135,
                };
                self.symbol_rate.unwrap_or(0) as u64 * rolloff / 100_000
            }
        };
        bandwidth / 8
    }

    /// Whether this entry names a transponder absent from `known`.
    ///
    /// An entry is a duplicate only when a known entry sits within the
    /// frequency shift estimate AND has the same polarization and
    /// stream id; either differing makes it a distinct transponder.
    pub fn new_entry_is_needed(&self, known: &[TransponderEntry]) -> bool {
        let shift = self.estimate_freq_shift();
        !known.iter().any(|other| {
            self.frequency.abs_diff(other.frequency) <= shift
                && self.polarization == other.polarization
                && self.stream_id == other.stream_id
        })
    }
}
