//! Transponder scan orchestration.
//!
//! One scan tunes a transponder, walks PAT to PMTs, then collects the
//! delivery-system tables: NIT and SDT for the DVB/ISDB family, VCT
//! for ATSC. Table timeouts are not fatal; the scan reports whatever
//! arrived. New transponders announced in the NIT come back deduplicated
//! against the list the caller already knows.

use std::sync::atomic::AtomicBool;

use log::{info, warn};

use dtv_si::descriptors::delivery::bandwidth_hz;
use dtv_si::descriptors::Descriptor;
use dtv_si::section::{pid, table_id};
use dtv_si::tables::{Nit, Pat, Pmt, Sdt, Vct};

use crate::config::ScanConfig;
use crate::error::ScanError;
use crate::frontend::SectionSource;
use crate::section_reader::{read_table, ReadOptions};
use crate::transponder::{DeliverySystem, Polarization, TransponderEntry};

/// Periodic frontend hook, called between scan states. A host UI can
/// report lock status here; returning `false` cancels the scan.
pub type FrontendCheck<'a> = &'a mut dyn FnMut(&TransponderEntry) -> bool;

fn frontend_ok(check: &mut Option<FrontendCheck>, entry: &TransponderEntry) -> bool {
    match check {
        Some(f) => f(entry),
        None => true,
    }
}

/// Everything one transponder scan produced.
#[derive(Debug, Clone)]
pub struct ScanResult {
    /// The entry that was tuned.
    pub entry: TransponderEntry,
    pub pat: Option<Pat>,
    pub pmts: Vec<Pmt>,
    pub nit: Option<Nit>,
    pub sdt: Option<Sdt>,
    /// Other-network NIT, read only when configured.
    pub other_nit: Option<Nit>,
    /// Other-TS SDT, read only when configured.
    pub other_sdt: Option<Sdt>,
    pub vct: Option<Vct>,
    /// Transponders announced in the NIT and absent from the known
    /// list, ready to be appended to the scan queue.
    pub new_transponders: Vec<TransponderEntry>,
}

/// Scan one transponder.
///
/// `known` is the caller's current transponder list, used to suppress
/// NIT announcements of frequencies already covered. A tune failure is
/// fatal for this transponder; table timeouts are not. `check_frontend`
/// is invoked after tuning and before each table read; returning
/// `false` cancels like the abort flag does.
pub fn scan_transponder<S>(
    source: &mut S,
    entry: &TransponderEntry,
    config: &ScanConfig,
    known: &[TransponderEntry],
    abort: &AtomicBool,
    mut check_frontend: Option<FrontendCheck>,
) -> Result<ScanResult, ScanError>
where
    S: SectionSource + ?Sized,
{
    info!(
        "scanning {:?} at {} {}",
        entry.delivery,
        entry.frequency,
        if matches!(
            entry.delivery,
            DeliverySystem::DvbS | DeliverySystem::DvbS2 | DeliverySystem::IsdbS
        ) {
            "kHz"
        } else {
            "Hz"
        }
    );
    source.tune(entry)?;
    if !frontend_ok(&mut check_frontend, entry) {
        return Err(ScanError::Aborted);
    }

    let multiply = config.timeout_multiply;
    let options = ReadOptions {
        gaps_allowed: config.gaps_allowed,
        version_policy: config.version_policy,
        table_id: None,
    };

    let mut result = ScanResult {
        entry: entry.clone(),
        pat: None,
        pmts: Vec::new(),
        nit: None,
        sdt: None,
        other_nit: None,
        other_sdt: None,
        vct: None,
        new_transponders: Vec::new(),
    };

    result.pat = read_table::<Pat, _>(source, pid::PAT, config.pat_timeout * multiply, &options, abort)?;
    let Some(pat) = &result.pat else {
        warn!("no PAT received, stopping this transponder");
        return Ok(result);
    };

    for program in &pat.programs {
        if program.service_id == 0 {
            continue;
        }
        if !frontend_ok(&mut check_frontend, entry) {
            return Err(ScanError::Aborted);
        }
        match read_table::<Pmt, _>(
            source,
            program.pid,
            config.pmt_timeout * multiply,
            &options,
            abort,
        )? {
            Some(pmt) => result.pmts.push(pmt),
            None => warn!(
                "no PMT for service {} on PID 0x{:04x}",
                program.service_id, program.pid
            ),
        }
    }

    if !frontend_ok(&mut check_frontend, entry) {
        return Err(ScanError::Aborted);
    }

    if entry.delivery.is_dvb_si() {
        let nit_timeout = match entry.delivery {
            DeliverySystem::IsdbT => config.nit_timeout_isdbt,
            _ => config.nit_timeout,
        } * multiply;
        let sdt_timeout = config.sdt_timeout * multiply;
        // The NIT PID may be remapped via PAT program 0.
        let nit_pid = pat.nit_pid().unwrap_or(pid::NIT);

        // Own and other tables share the decoder and the PID; only the
        // table id keeps them apart.
        let own_nit = ReadOptions {
            table_id: Some(table_id::NIT),
            ..options
        };
        let own_sdt = ReadOptions {
            table_id: Some(table_id::SDT),
            ..options
        };

        result.nit = read_table::<Nit, _>(source, nit_pid, nit_timeout, &own_nit, abort)?;
        result.sdt = read_table::<Sdt, _>(source, pid::SDT, sdt_timeout, &own_sdt, abort)?;

        if config.other_nit {
            let other_nit = ReadOptions {
                table_id: Some(table_id::NIT_OTHER),
                ..options
            };
            let other_sdt = ReadOptions {
                table_id: Some(table_id::SDT_OTHER),
                ..options
            };
            result.other_nit =
                read_table::<Nit, _>(source, nit_pid, nit_timeout, &other_nit, abort)?;
            result.other_sdt =
                read_table::<Sdt, _>(source, pid::SDT, sdt_timeout, &other_sdt, abort)?;
        }

        // The ISDB-T 1seg service has a fixed PMT PID outside the PAT.
        if entry.delivery == DeliverySystem::IsdbT {
            let has_one_seg = result
                .nit
                .as_ref()
                .is_some_and(|nit| !one_seg_service_ids(nit).is_empty());
            if has_one_seg {
                match read_table::<Pmt, _>(
                    source,
                    pid::ISDBT_1SEG_PMT,
                    config.pmt_timeout * multiply,
                    &options,
                    abort,
                )? {
                    Some(pmt) => result.pmts.push(pmt),
                    None => warn!("partial reception announced but no 1seg PMT"),
                }
            }
        }
    } else {
        result.vct = read_table::<Vct, _>(
            source,
            pid::ATSC_BASE,
            config.vct_timeout * multiply,
            &options,
            abort,
        )?;
    }

    for nit in [&result.nit, &result.other_nit].into_iter().flatten() {
        for candidate in transponders_from_nit(nit, entry) {
            let seen = known
                .iter()
                .chain(std::iter::once(entry))
                .chain(result.new_transponders.iter());
            if candidate.new_entry_is_needed(&seen.cloned().collect::<Vec<_>>()) {
                info!(
                    "NIT announced new {:?} transponder at {}",
                    candidate.delivery, candidate.frequency
                );
                result.new_transponders.push(candidate);
            }
        }
    }

    Ok(result)
}

/// Candidate transponders from one NIT, before deduplication.
///
/// Each delivery descriptor kind maps to entries of its system; the
/// tuned entry supplies context a descriptor lacks (the T2 short form
/// has no frequency of its own).
pub fn transponders_from_nit(nit: &Nit, tuned: &TransponderEntry) -> Vec<TransponderEntry> {
    let mut candidates = Vec::new();

    for transport in &nit.transports {
        for descriptor in &transport.descriptors {
            match descriptor {
                Descriptor::TerrestrialDelivery(t) => {
                    let mut entry =
                        TransponderEntry::new(DeliverySystem::DvbT, t.centre_frequency);
                    entry.bandwidth = bandwidth_hz(t.bandwidth).or(Some(8_000_000));
                    entry.modulation = Some(t.constellation);
                    candidates.push(entry);
                }
                Descriptor::FrequencyList(list) if list.coding_type == 3 => {
                    for &frequency in &list.frequencies {
                        let mut entry = TransponderEntry::new(DeliverySystem::DvbT, frequency);
                        entry.bandwidth = tuned.bandwidth.or(Some(8_000_000));
                        candidates.push(entry);
                    }
                }
                Descriptor::Extension(ext) => {
                    if let dtv_si::descriptors::extension::ExtensionPayload::T2Delivery(t2) =
                        &ext.payload
                    {
                        match &t2.extended {
                            Some(extended) => {
                                for &frequency in &extended.centre_frequencies {
                                    let mut entry = TransponderEntry::new(
                                        DeliverySystem::DvbT2,
                                        frequency,
                                    );
                                    entry.bandwidth =
                                        bandwidth_hz(extended.bandwidth).or(Some(8_000_000));
                                    entry.stream_id = Some(t2.plp_id as u16);
                                    candidates.push(entry);
                                }
                            }
                            None => {
                                // Short form: same frequency, another PLP.
                                let mut entry = TransponderEntry::new(
                                    DeliverySystem::DvbT2,
                                    tuned.frequency,
                                );
                                entry.bandwidth = tuned.bandwidth;
                                entry.stream_id = Some(t2.plp_id as u16);
                                candidates.push(entry);
                            }
                        }
                    }
                }
                Descriptor::CableDelivery(c) => {
                    let mut entry =
                        TransponderEntry::new(DeliverySystem::DvbC, c.frequency as u64);
                    entry.symbol_rate = Some(c.symbol_rate);
                    entry.modulation = Some(c.modulation);
                    candidates.push(entry);
                }
                Descriptor::SatelliteDelivery(s) => {
                    let delivery = if tuned.delivery == DeliverySystem::IsdbS {
                        DeliverySystem::IsdbS
                    } else if s.modulation_system == 1 {
                        DeliverySystem::DvbS2
                    } else {
                        DeliverySystem::DvbS
                    };
                    let mut entry = TransponderEntry::new(delivery, s.frequency as u64);
                    entry.polarization = Some(Polarization::from_code(s.polarization));
                    entry.symbol_rate = Some(s.symbol_rate);
                    entry.roll_off = Some(s.roll_off);
                    // ISDB-S selects the substream by transport id.
                    if delivery == DeliverySystem::IsdbS {
                        entry.stream_id = Some(transport.transport_id);
                    }
                    candidates.push(entry);
                }
                Descriptor::IsdbtDelivery(i) => {
                    for &frequency in &i.frequencies {
                        let entry =
                            TransponderEntry::new(DeliverySystem::IsdbT, frequency as u64);
                        candidates.push(entry);
                    }
                }
                _ => {}
            }
        }
    }

    candidates
}

/// Service ids receivable in the ISDB-T 1seg partial-reception
/// segment, collected over all NIT transports.
pub fn one_seg_service_ids(nit: &Nit) -> Vec<u16> {
    let mut ids = Vec::new();
    for transport in &nit.transports {
        for descriptor in &transport.descriptors {
            if let Descriptor::PartialReception(pr) = descriptor {
                ids.extend_from_slice(&pr.service_ids);
            }
        }
    }
    ids
}
