//! CRC-32/MPEG-2 over full section images.

/// Calculate CRC32 for MPEG-2 (polynomial 0x04C11DB7).
///
/// Sections are transmitted so that the CRC over the entire section,
/// trailing CRC bytes included, comes out zero.
pub fn crc32_mpeg2(data: &[u8]) -> u32 {
    static CRC_TABLE: [u32; 256] = {
        let mut table = [0u32; 256];
        let mut i = 0;
        while i < 256 {
            let mut crc = (i as u32) << 24;
            let mut j = 0;
            while j < 8 {
                if crc & 0x8000_0000 != 0 {
                    crc = (crc << 1) ^ 0x04C1_1DB7;
                } else {
                    crc <<= 1;
                }
                j += 1;
            }
            table[i] = crc;
            i += 1;
        }
        table
    };

    let mut crc = 0xFFFF_FFFFu32;
    for &byte in data {
        let index = ((crc >> 24) ^ byte as u32) as usize;
        crc = (crc << 8) ^ CRC_TABLE[index];
    }
    crc
}

/// Check the CRC of a complete section image (header through the four
/// trailing CRC bytes).
pub fn section_crc_ok(section: &[u8]) -> bool {
    if section.len() < 4 {
        return false;
    }
    crc32_mpeg2(section) == 0
}
