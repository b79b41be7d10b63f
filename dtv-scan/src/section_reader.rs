//! Multi-section table accumulation.
//!
//! A logical table arrives as up to 256 sections per extension id,
//! cycling on its PID. The reader pulls sections from the source until
//! every announced section number has been merged, the per-table
//! timeout expires, or the abort flag is raised. Sections with a bad
//! CRC are dropped; a version bump mid collection is handled per the
//! configured policy.

use std::collections::{BTreeMap, HashMap};
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::{Duration, Instant};

use log::{debug, warn};

use dtv_si::crc::section_crc_ok;
use dtv_si::tables::SiTable;
use dtv_si::{Cursor, SectionHeader};

use crate::config::VersionChangePolicy;
use crate::error::ScanError;
use crate::frontend::SectionSource;

/// Presence map over the 256 possible section numbers of one
/// extension id.
#[derive(Debug, Clone, Copy, Default)]
struct SectionBitmap {
    words: [u64; 4],
    last: u8,
}

impl SectionBitmap {
    /// Mark section `n` seen; returns whether it already was.
    fn set(&mut self, n: u8) -> bool {
        let word = &mut self.words[(n >> 6) as usize];
        let bit = 1u64 << (n & 0x3F);
        let repeat = *word & bit != 0;
        *word |= bit;
        repeat
    }

    fn is_complete(&self) -> bool {
        (0..=self.last).all(|n| self.words[(n >> 6) as usize] & (1u64 << (n & 0x3F)) != 0)
    }
}

/// Options controlling one table read.
#[derive(Debug, Clone, Copy, Default)]
pub struct ReadOptions {
    /// Finish at the first repeated section instead of requiring every
    /// section number. EIT section numbering is sparse by design, so
    /// waiting for completeness there would always run out the clock.
    pub gaps_allowed: bool,
    pub version_policy: VersionChangePolicy,
    /// Accept only this exact table id. The decoder's `matches` can
    /// span several ids (NIT own and other share one decoder), so the
    /// scan pins the id when the distinction matters.
    pub table_id: Option<u8>,
}

/// Accumulate one logical table from `pid`.
///
/// Returns whatever was collected when the timeout expires; `None`
/// means not a single usable section arrived. Only an abort raises an
/// error.
pub fn read_table<T, S>(
    source: &mut S,
    pid: u16,
    timeout: Duration,
    options: &ReadOptions,
    abort: &AtomicBool,
) -> Result<Option<T>, ScanError>
where
    T: SiTable,
    S: SectionSource + ?Sized,
{
    source.open_filter(pid)?;
    let result = read_table_inner(source, pid, timeout, options, abort);
    source.close_filter();
    result
}

fn read_table_inner<T, S>(
    source: &mut S,
    pid: u16,
    timeout: Duration,
    options: &ReadOptions,
    abort: &AtomicBool,
) -> Result<Option<T>, ScanError>
where
    T: SiTable,
    S: SectionSource + ?Sized,
{
    let deadline = Instant::now() + timeout;
    // Section images keyed by (extension id, section number). Decoding
    // is deferred to the end so entries merge in section-number order
    // even when the scan joins a cycle midway.
    let mut sections = BTreeMap::new();
    let mut versions: HashMap<u16, u8> = HashMap::new();
    let mut bitmaps: HashMap<u16, SectionBitmap> = HashMap::new();

    loop {
        if abort.load(Ordering::Relaxed) {
            return Err(ScanError::Aborted);
        }

        let remaining = deadline.saturating_duration_since(Instant::now());
        if remaining.is_zero() {
            debug!("{}: timeout on PID 0x{:04x}", T::NAME, pid);
            break;
        }

        let image = match source.read_section(remaining) {
            Ok(image) => image,
            Err(ScanError::Timeout(_)) => {
                debug!("{}: timeout on PID 0x{:04x}", T::NAME, pid);
                break;
            }
            Err(e) => return Err(e),
        };

        if !section_crc_ok(&image) {
            warn!("{}: dropping section with bad CRC", T::NAME);
            continue;
        }

        let mut cursor = Cursor::new(&image);
        let header = match SectionHeader::parse(&mut cursor) {
            Ok(header) => header,
            Err(e) => {
                warn!("{}: dropping malformed section: {}", T::NAME, e);
                continue;
            }
        };
        if !T::matches(header.table_id) {
            // Another table sharing the PID (a BAT next to the SDT).
            continue;
        }
        if options.table_id.is_some_and(|tid| tid != header.table_id) {
            continue;
        }
        if !header.current_next {
            continue;
        }

        let image_len = 3 + header.section_length as usize;
        let crc_len = if header.syntax { 4 } else { 0 };
        if image.len() < image_len || image_len < crc_len {
            warn!("{}: dropping short section image", T::NAME);
            continue;
        }
        let data = image.slice(..image_len - crc_len);

        match versions.get(&header.extension_id) {
            Some(&version) if version != header.version => match options.version_policy {
                VersionChangePolicy::Restart => {
                    debug!(
                        "{}: version changed {} -> {}, restarting",
                        T::NAME,
                        version,
                        header.version
                    );
                    sections.clear();
                    versions.clear();
                    bitmaps.clear();
                }
                VersionChangePolicy::Keep => continue,
            },
            _ => {}
        }
        versions.insert(header.extension_id, header.version);

        let bitmap = bitmaps.entry(header.extension_id).or_default();
        bitmap.last = header.last_section_number;
        if bitmap.set(header.section_number) {
            if options.gaps_allowed {
                debug!("{}: section cycle wrapped, done", T::NAME);
                break;
            }
            continue;
        }

        sections.insert((header.extension_id, header.section_number), data);
        debug!(
            "{}: collected section {}/{} of extension 0x{:04x}",
            T::NAME,
            header.section_number,
            header.last_section_number,
            header.extension_id
        );

        if !options.gaps_allowed && bitmaps.values().all(SectionBitmap::is_complete) {
            break;
        }
    }

    let mut table: Option<T> = None;
    for ((extension_id, number), data) in &sections {
        match T::decode(data, table.take()) {
            Ok((_, merged)) => table = Some(merged),
            Err(e) => warn!(
                "{}: dropping undecodable section {} of extension 0x{:04x}: {}",
                T::NAME,
                number,
                extension_id,
                e
            ),
        }
    }
    Ok(table)
}

#[cfg(test)]
mod tests {
    use super::*;

    use dtv_si::section::table_id;
    use dtv_si::tables::{Nit, Pat};

    use crate::frontend::mock::MockSource;

    fn pat_section(version: u8, number: u8, last: u8, programs: &[(u16, u16)]) -> Vec<u8> {
        let mut payload = Vec::new();
        for &(service_id, pid) in programs {
            payload.extend_from_slice(&service_id.to_be_bytes());
            payload.extend_from_slice(&(0xE000 | pid).to_be_bytes());
        }
        let mut image = vec![table_id::PAT];
        let section_length = (payload.len() + 5 + 4) as u16;
        image.extend_from_slice(&(0xB000 | section_length).to_be_bytes());
        image.extend_from_slice(&1u16.to_be_bytes()); // transport stream id
        image.push(0xC0 | (version << 1) | 0x01);
        image.push(number);
        image.push(last);
        image.extend_from_slice(&payload);
        image
    }

    fn read_pat(source: &mut MockSource, options: &ReadOptions) -> Option<Pat> {
        let _ = env_logger::builder().is_test(true).try_init();
        let abort = AtomicBool::new(false);
        read_table::<Pat, _>(source, 0, Duration::from_secs(1), options, &abort).unwrap()
    }

    #[test]
    fn test_single_section_completes() {
        let mut source = MockSource::new();
        source.push_section(0, &pat_section(0, 0, 0, &[(1, 0x20)]));
        // A second cycle sits in the queue; completion must not eat it.
        source.push_section(0, &pat_section(0, 0, 0, &[(1, 0x20)]));

        let pat = read_pat(&mut source, &ReadOptions::default()).unwrap();
        assert_eq!(pat.programs.len(), 1);
        assert_eq!(pat.programs[0].pid, 0x20);
    }

    #[test]
    fn test_two_sections_merge() {
        let mut source = MockSource::new();
        source.push_section(0, &pat_section(0, 0, 1, &[(1, 0x20)]));
        source.push_section(0, &pat_section(0, 1, 1, &[(2, 0x21)]));

        let pat = read_pat(&mut source, &ReadOptions::default()).unwrap();
        assert_eq!(pat.programs.len(), 2);
        assert_eq!(pat.programs[1].pid, 0x21);
    }

    #[test]
    fn test_sections_merge_in_number_order() {
        let mut source = MockSource::new();
        // Joined the cycle midway: section 1 airs before section 0.
        source.push_section(0, &pat_section(0, 1, 1, &[(2, 0x21)]));
        source.push_section(0, &pat_section(0, 0, 1, &[(1, 0x20)]));

        let pat = read_pat(&mut source, &ReadOptions::default()).unwrap();
        assert_eq!(pat.programs.len(), 2);
        assert_eq!(pat.programs[0].service_id, 1);
        assert_eq!(pat.programs[1].service_id, 2);
    }

    fn nit_section(tid: u8, network_id: u16) -> Vec<u8> {
        let payload = [0xF0, 0x00, 0xF0, 0x00]; // empty descriptor and TS loops
        let mut image = vec![tid];
        let section_length = (payload.len() + 5 + 4) as u16;
        image.extend_from_slice(&(0xB000 | section_length).to_be_bytes());
        image.extend_from_slice(&network_id.to_be_bytes());
        image.extend_from_slice(&[0xC1, 0, 0]);
        image.extend_from_slice(&payload);
        image
    }

    #[test]
    fn test_exact_table_id_filter() {
        let mut source = MockSource::new();
        // The other-network NIT cycles first; the decoder accepts both
        // ids, so only the pinned id keeps them apart.
        source.push_section(0x10, &nit_section(table_id::NIT_OTHER, 0x2002));
        source.push_section(0x10, &nit_section(table_id::NIT, 0x2001));

        let options = ReadOptions {
            table_id: Some(table_id::NIT),
            ..ReadOptions::default()
        };
        let abort = AtomicBool::new(false);
        let nit =
            read_table::<Nit, _>(&mut source, 0x10, Duration::from_secs(1), &options, &abort)
                .unwrap()
                .unwrap();
        assert_eq!(nit.header.table_id, table_id::NIT);
        assert_eq!(nit.network_id(), 0x2001);
    }

    #[test]
    fn test_bad_crc_dropped() {
        let mut source = MockSource::new();
        let mut corrupt = pat_section(0, 0, 0, &[(9, 0x99)]);
        corrupt.extend_from_slice(&[0, 0, 0, 0]); // wrong CRC
        source.push_raw(0, &corrupt);
        source.push_section(0, &pat_section(0, 0, 0, &[(1, 0x20)]));

        let pat = read_pat(&mut source, &ReadOptions::default()).unwrap();
        assert_eq!(pat.programs.len(), 1);
        assert_eq!(pat.programs[0].service_id, 1);
    }

    #[test]
    fn test_version_change_restarts() {
        let mut source = MockSource::new();
        source.push_section(0, &pat_section(0, 0, 1, &[(1, 0x20)]));
        source.push_section(0, &pat_section(1, 0, 1, &[(3, 0x30)]));
        source.push_section(0, &pat_section(1, 1, 1, &[(4, 0x31)]));

        let pat = read_pat(&mut source, &ReadOptions::default()).unwrap();
        assert_eq!(pat.header.version, 1);
        assert_eq!(pat.programs.len(), 2);
        assert_eq!(pat.programs[0].service_id, 3);
    }

    #[test]
    fn test_version_change_keep_ignores_new() {
        let mut source = MockSource::new();
        source.push_section(0, &pat_section(0, 0, 1, &[(1, 0x20)]));
        source.push_section(0, &pat_section(1, 0, 1, &[(3, 0x30)]));
        source.push_section(0, &pat_section(0, 1, 1, &[(2, 0x21)]));

        let options = ReadOptions {
            version_policy: VersionChangePolicy::Keep,
            ..ReadOptions::default()
        };
        let pat = read_pat(&mut source, &options).unwrap();
        assert_eq!(pat.header.version, 0);
        assert_eq!(pat.programs.len(), 2);
        assert_eq!(pat.programs[1].service_id, 2);
    }

    #[test]
    fn test_gaps_allowed_stops_on_repeat() {
        let mut source = MockSource::new();
        // Announces six sections but only one ever airs.
        source.push_section(0, &pat_section(0, 0, 5, &[(1, 0x20)]));
        source.push_section(0, &pat_section(0, 0, 5, &[(1, 0x20)]));

        let options = ReadOptions {
            gaps_allowed: true,
            ..ReadOptions::default()
        };
        let pat = read_pat(&mut source, &options).unwrap();
        assert_eq!(pat.programs.len(), 1);
    }

    #[test]
    fn test_timeout_returns_partial() {
        let mut source = MockSource::new();
        source.push_section(0, &pat_section(0, 0, 3, &[(1, 0x20)]));
        // Sections 1..=3 never arrive.

        let pat = read_pat(&mut source, &ReadOptions::default()).unwrap();
        assert_eq!(pat.programs.len(), 1);
    }

    #[test]
    fn test_timeout_with_nothing_is_none() {
        let mut source = MockSource::new();
        assert!(read_pat(&mut source, &ReadOptions::default()).is_none());
    }

    #[test]
    fn test_abort_raises_error() {
        let mut source = MockSource::new();
        source.push_section(0, &pat_section(0, 0, 0, &[(1, 0x20)]));
        let abort = AtomicBool::new(true);
        let result = read_table::<Pat, _>(
            &mut source,
            0,
            Duration::from_secs(1),
            &ReadOptions::default(),
            &abort,
        );
        assert!(matches!(result, Err(ScanError::Aborted)));
    }

    #[test]
    fn test_foreign_table_id_skipped() {
        let mut source = MockSource::new();
        let mut sdt_like = pat_section(0, 0, 0, &[(9, 0x99)]);
        sdt_like[0] = table_id::SDT;
        source.push_section(0, &sdt_like);
        source.push_section(0, &pat_section(0, 0, 0, &[(1, 0x20)]));

        let pat = read_pat(&mut source, &ReadOptions::default()).unwrap();
        assert_eq!(pat.programs[0].service_id, 1);
    }
}
