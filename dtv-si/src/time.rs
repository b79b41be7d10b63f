//! Broadcast timestamp and BCD decoding.
//!
//! DVB start times are a 16-bit Modified Julian Date followed by three
//! BCD bytes (ETSI EN 300 468 annex C). ATSC start times count seconds
//! from the GPS epoch, 1980-01-06 00:00:00 UTC. Both are decoded
//! eagerly at table-decode time into naive UTC timestamps.

use chrono::{Duration, NaiveDate, NaiveDateTime};

/// Decode one BCD byte (two digits).
pub fn bcd(byte: u8) -> u32 {
    ((byte >> 4) as u32) * 10 + (byte & 0x0F) as u32
}

/// Decode a whole BCD-coded word, most significant nibble first.
pub fn bcd32(mut value: u32) -> u32 {
    let mut result = 0u32;
    let mut mult = 1u32;
    while value != 0 {
        result += mult * (value & 0x0F);
        value >>= 4;
        mult = mult.saturating_mul(10);
    }
    result
}

/// Decode the 5-byte DVB start time (MJD + BCD hh:mm:ss) to UTC.
///
/// Returns `None` for the all-ones "undefined" pattern and for MJD
/// values that do not map to a valid calendar date.
pub fn dvb_time(data: [u8; 5]) -> Option<NaiveDateTime> {
    if data == [0xFF; 5] {
        return None;
    }

    let mjd = u16::from_be_bytes([data[0], data[1]]) as f64;
    let hour = bcd(data[2]);
    let min = bcd(data[3]);
    let sec = bcd(data[4]);

    // EN 300 468 V1.4.1 annex C conversion.
    let mut year = ((mjd - 15078.2) / 365.25) as i32;
    let mut month = ((mjd - 14956.1 - (year as f64 * 365.25).trunc()) / 30.6001) as i32;
    let day = mjd as i32 - 14956 - (year as f64 * 365.25) as i32 - (month as f64 * 30.6001) as i32;
    let k = if month == 14 || month == 15 { 1 } else { 0 };
    year += k;
    month = month - 1 - k * 12;

    NaiveDate::from_ymd_opt(1900 + year, month as u32, day as u32)?
        .and_hms_opt(hour, min, sec)
}

/// Decode the 3-byte BCD duration (hh:mm:ss) into seconds.
pub fn bcd_duration(data: [u8; 3]) -> u32 {
    bcd(data[0]) * 3600 + bcd(data[1]) * 60 + bcd(data[2])
}

/// Decode an ATSC start time (seconds since 1980-01-06 00:00:00 UTC).
pub fn atsc_time(start_time: u32) -> NaiveDateTime {
    // The GPS epoch always exists, so the unwraps cannot fire.
    let epoch = NaiveDate::from_ymd_opt(1980, 1, 6)
        .unwrap()
        .and_hms_opt(0, 0, 0)
        .unwrap();
    epoch + Duration::seconds(start_time as i64)
}
